//! # tryapi client
//!
//! Sends the requests built by `tryapi-core` and keeps what came back.
//!
//! - [`HttpTransport`] / [`ReqwestTransport`]: one request in, one fully read response out
//! - [`RequestExecutor`]: at most one pending execution per operation, newest wins
//! - [`Console`]: forms, credentials and responses for every operation of a document
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tryapi_client::{Console, ExecutionOutcome, ReqwestTransport, RequestExecutor};
//! use tryapi_core::config::TryApiConfig;
//!
//! # async fn run(document: tryapi_core::ApiDocument) -> anyhow::Result<()> {
//! let executor = RequestExecutor::new(Arc::new(ReqwestTransport::new()?));
//! let console = Console::from_config(document, &TryApiConfig::default(), executor)?;
//!
//! if let ExecutionOutcome::Completed(response) = console.execute("listPets").await? {
//!     println!("{}", response.status_line());
//! }
//! # Ok(())
//! # }
//! ```

mod console;
mod error;
mod executor;
mod response;
mod transport;

pub use console::Console;
pub use error::{ClientError, Result};
pub use executor::{ExecutionOutcome, RequestExecutor};
pub use response::{ExecutedResponse, ResponseFormat};
pub use transport::{HttpTransport, ReqwestTransport};
