//! Shell-safe curl reproduction of a built request.

use crate::headers::HeaderSet;

const TAB: &str = "\t";

/// Escape single quotes so the text can sit inside a single-quoted shell word.
pub fn escape_shell(text: &str) -> String {
    text.replace('\'', r"'\''")
}

/// Render a multi-line `curl` command, one continuation line per option.
pub fn make_curl_command(method: &str, url: &str, headers: &HeaderSet, body: Option<&str>) -> String {
    let mut lines = Vec::with_capacity(headers.len() + 3);
    lines.push(format!("curl -X '{}'", escape_shell(&method.to_ascii_uppercase())));
    lines.push(format!("{TAB}'{}'", escape_shell(url)));
    lines.extend(
        headers
            .iter()
            .map(|(name, value)| format!("{TAB}-H '{}: {}'", escape_shell(name), escape_shell(value))),
    );
    if let Some(body) = body {
        lines.push(format!("{TAB}-d '{}'", escape_shell(body)));
    }
    lines.join(" \\\n")
}
