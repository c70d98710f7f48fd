//! Command-line arguments

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tryapi_core::{Credential, SecuritySchemeKind};

#[derive(Debug, Parser)]
#[command(name = "tryapi", version, about = "Try out the operations of an OpenAPI document")]
pub struct Cli {
    /// Configuration file (defaults to tryapi.toml in this or a parent directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List operations grouped by tag
    Operations {
        /// Path or URL of the document
        document: String,
    },
    /// List request and response examples of an operation
    Examples { document: String, operation: String },
    /// Print the curl command for an operation
    Curl {
        document: String,
        operation: String,
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Send an operation's request and print the response
    Exec {
        document: String,
        operation: String,
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Show recently opened documents
    History {
        /// Forget an entry by its "title version" key
        #[arg(long)]
        remove: Option<String>,
    },
}

/// What to put into the request.
#[derive(Debug, Default, Args)]
pub struct RequestArgs {
    /// Parameter value as name=value; the value is read as JSON when it parses
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Request body as JSON
    #[arg(long, conflicts_with = "example")]
    pub body: Option<String>,

    /// Fill the body from the n-th request example
    #[arg(long, value_name = "N")]
    pub example: Option<usize>,

    /// Add a body entry allowed by the body schema's patternProperties, KEY=VALUE
    #[arg(long = "entry", value_name = "KEY=VALUE")]
    pub entries: Vec<String>,

    /// Content type to send the body as
    #[arg(long)]
    pub content_type: Option<String>,

    /// Extra request header, 'Name: value'
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Credential as scheme=token or scheme=user:password
    #[arg(long = "auth", value_name = "SCHEME=CREDENTIAL")]
    pub auth: Vec<String>,

    /// Security alternative to satisfy (defaults to the first when --auth is given)
    #[arg(long, value_name = "N")]
    pub security: Option<usize>,

    /// Target server instead of the document's first server
    #[arg(long)]
    pub server: Option<String>,

    /// Send cookies with the request
    #[arg(long)]
    pub include_credentials: bool,
}

/// `name=value`, with the value read as JSON when possible.
pub fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    if name.is_empty() {
        bail!("parameter name missing in '{}'", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// `Name: value`
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("expected 'Name: value', got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("header name missing in '{}'", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// `scheme=credential`
pub fn parse_auth(raw: &str) -> Result<(String, String)> {
    let (scheme, credential) = raw
        .split_once('=')
        .with_context(|| format!("expected SCHEME=CREDENTIAL, got '{}'", raw))?;
    Ok((scheme.to_string(), credential.to_string()))
}

/// Interpret a raw credential for a scheme: HTTP Basic takes `user:password`, everything else a token.
pub fn credential_for(kind: Option<&SecuritySchemeKind>, raw: &str) -> Credential {
    match kind {
        Some(SecuritySchemeKind::HttpBasic) => {
            let (username, password) = raw.split_once(':').unwrap_or((raw, ""));
            Credential::basic(username, password)
        }
        _ => Credential::token(raw),
    }
}
