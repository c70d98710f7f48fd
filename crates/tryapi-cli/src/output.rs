//! Plain-text rendering for the terminal

use std::fmt::Write;
use tryapi_client::ExecutedResponse;
use tryapi_core::{ApiDocument, ExampleSelector, OperationDescriptor, SerializeOptions};
use tryapi_history::HistoryEntry;

const UNTAGGED: &str = "default";

pub fn operations(document: &ApiDocument) -> String {
    let mut out = format!("{} {}\n", document.title, document.version);
    for server in &document.servers {
        let _ = writeln!(out, "server: {}", server);
    }
    for (index, label) in document.security.labels().iter().enumerate() {
        let _ = writeln!(out, "security [{}]: {}", index, label);
    }

    for (tag, operations) in document.operations_by_tag() {
        let _ = writeln!(out, "\n[{}]", tag.unwrap_or(UNTAGGED));
        for operation in operations {
            let _ = write!(
                out,
                "  {:<7} {}  {}",
                operation.method, operation.path, operation.operation_id
            );
            if let Some(summary) = &operation.summary {
                let _ = write!(out, "  {}", summary);
            }
            out.push('\n');
        }
    }
    out
}

pub fn examples(operation: &OperationDescriptor, selector: &ExampleSelector) -> String {
    let mut out = String::new();
    for (media_type, examples) in selector.request_examples(operation) {
        let _ = writeln!(out, "request {}", media_type);
        for (index, example) in examples.iter().enumerate() {
            let _ = writeln!(out, "  [{}] {}", index, example.label(index));
        }
    }
    for response in selector.response_examples(operation).values() {
        if response.only_headers {
            let _ = writeln!(out, "response {} (headers only)", response.status);
            continue;
        }
        for (media_type, examples) in &response.media_types {
            let _ = writeln!(out, "response {} {}", response.status, media_type);
            for (index, example) in examples.iter().enumerate() {
                let _ = writeln!(out, "  [{}] {}", index, example.label(index));
            }
        }
    }
    out
}

pub fn response(response: &ExecutedResponse, options: SerializeOptions) -> String {
    let mut out = format!("{}\n", response.status_line());
    if !response.headers.is_empty() {
        let _ = writeln!(out, "{}", response.headers);
    }
    let body = response.display_body(options);
    if !body.is_empty() {
        let _ = writeln!(out, "\n{}", body);
    }
    out
}

pub fn history(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  ({})\n",
                entry.last_opened.format("%Y-%m-%d %H:%M"),
                entry.key(),
                entry.source.name
            )
        })
        .collect()
}
