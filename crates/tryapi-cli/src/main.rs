//! `tryapi`: a command-line "try it out" console for OpenAPI documents

mod args;
mod output;

use anyhow::{Context, Result, bail};
use args::{Cli, Command, RequestArgs};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use tryapi_client::{Console, ExecutionOutcome, ReqwestTransport, RequestExecutor};
use tryapi_core::config::TryApiConfig;
use tryapi_core::{ApiDocument, AuthorizationInput, DiagnosticSeverity, ExampleSelector};
use tryapi_history::{
    FileHistoryStore, HistoryEntry, InMemoryHistoryStore, SchemaHistoryStore, SchemaSource,
};
use tryapi_openapi::OpenApiParser;
use tryapi_telemetry::{TelemetryOptions, init_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TryApiConfig::load_from(cli.config.as_deref())?;

    init_telemetry(&TelemetryOptions {
        log_filter: config.observability.log_filter.clone(),
        json: cli.json_logs || config.observability.json_logs,
    });

    let history = history_store(&config);

    match cli.command {
        Command::Operations { document } => {
            let document = open(&document, history.as_ref()).await?;
            print!("{}", output::operations(&document));
        }
        Command::Examples {
            document,
            operation,
        } => {
            let document = open(&document, history.as_ref()).await?;
            let operation = document
                .operation(&operation)
                .with_context(|| format!("unknown operation '{}'", operation))?;
            print!("{}", output::examples(operation, &ExampleSelector::new()));
        }
        Command::Curl {
            document,
            operation,
            request,
        } => {
            let document = open(&document, history.as_ref()).await?;
            let console = console(document, &config)?;
            prepare(&console, &operation, &request)?;
            println!("{}", console.curl(&operation)?);
        }
        Command::Exec {
            document,
            operation,
            request,
        } => {
            let document = open(&document, history.as_ref()).await?;
            let console = console(document, &config)?;
            prepare(&console, &operation, &request)?;
            match console.execute(&operation).await? {
                ExecutionOutcome::Completed(response) => {
                    print!("{}", output::response(&response, console.display_options()));
                }
                ExecutionOutcome::Superseded => bail!("request was superseded"),
            }
        }
        Command::History { remove } => {
            if let Some(key) = remove {
                history.remove(&key).await?;
            }
            print!("{}", output::history(&history.list().await?));
        }
    }

    Ok(())
}

fn history_store(config: &TryApiConfig) -> Box<dyn SchemaHistoryStore> {
    if !config.history.enabled {
        return Box::new(InMemoryHistoryStore::new());
    }
    let path = config.history.path.clone().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(".tryapi")
            .join("history.json")
    });
    Box::new(FileHistoryStore::new(path))
}

/// Load a document from a path or URL and remember it in the history.
async fn open(location: &str, history: &dyn SchemaHistoryStore) -> Result<ApiDocument> {
    let is_url = location.starts_with("http://") || location.starts_with("https://");
    let (text, source) = if is_url {
        (OpenApiParser::fetch(location).await?, SchemaSource::url(location))
    } else {
        let text = tokio::fs::read_to_string(location)
            .await
            .with_context(|| format!("failed to read {}", location))?;
        (text, SchemaSource::file(location))
    };

    let mut parser = OpenApiParser::from_str(&text)?;
    if is_url {
        parser = parser.with_source_url(location);
    }
    let document = parser.parse()?;

    let entry = HistoryEntry::new(&document.title, &document.version, source, text);
    if let Err(e) = history.record(entry).await {
        warn!("Failed to record schema history: {}", e);
    }
    Ok(document)
}

fn console(document: ApiDocument, config: &TryApiConfig) -> Result<Console> {
    let executor = RequestExecutor::new(Arc::new(ReqwestTransport::new()?));
    Ok(Console::from_config(document, config, executor)?)
}

/// Apply the command-line request inputs to the operation's form and credentials.
fn prepare(console: &Console, operation_id: &str, request: &RequestArgs) -> Result<()> {
    let operation = console.operation(operation_id)?;

    if let Some(server) = &request.server {
        console.set_target_server(server.as_str());
    }
    let headers = request
        .headers
        .iter()
        .map(|raw| args::parse_header(raw))
        .collect::<Result<Vec<_>>>()?;
    if !headers.is_empty() {
        console.update_global(|global| global.request_headers.extend(headers));
    }
    if request.include_credentials {
        console.set_include_credentials(true)?;
    }

    if let Some(index) = request.example {
        console
            .apply_example(operation_id, None, index)?
            .with_context(|| format!("operation '{}' has no request example {}", operation_id, index))?;
    }
    if let Some(body) = &request.body {
        let value = serde_json::from_str(body).context("--body is not valid JSON")?;
        console.update_body(operation_id, Some(value), None)?;
    }
    for raw in &request.entries {
        let (key, value) = args::parse_param(raw)?;
        console.add_body_entry(operation_id, None, &key, Some(value))?;
    }
    if let Some(content_type) = &request.content_type {
        console.set_content_type(operation_id, Some(content_type.clone()))?;
    }
    for raw in &request.params {
        let (name, value) = args::parse_param(raw)?;
        console.update_parameter(operation_id, &name, Some(value), None)?;
    }

    if !request.auth.is_empty() || request.security.is_some() {
        let mut input = AuthorizationInput::with_alternative(request.security.unwrap_or(0));
        for raw in &request.auth {
            let (scheme, credential) = args::parse_auth(raw)?;
            let kind = operation
                .security
                .alternatives()
                .iter()
                .flatten()
                .find(|candidate| candidate.key == scheme)
                .map(|candidate| &candidate.kind);
            input.set_credential(scheme, args::credential_for(kind, &credential));
        }
        console.set_operation_authorization(operation_id, input)?;
    }

    for diagnostic in console
        .global_diagnostics()
        .into_iter()
        .chain(console.diagnostics(operation_id)?)
    {
        match diagnostic.severity {
            DiagnosticSeverity::Error => eprintln!("error: {}: {}", diagnostic.scheme, diagnostic.message),
            DiagnosticSeverity::Warning => eprintln!("warning: {}: {}", diagnostic.scheme, diagnostic.message),
        }
    }

    debug!(operation = operation_id, "Prepared request inputs");
    Ok(())
}
