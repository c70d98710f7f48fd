//! # tryapi OpenAPI loader
//!
//! Turns an OpenAPI document into the read-only [`tryapi_core::ApiDocument`]
//! the request engine works on.
//!
//! ## Features
//!
//! - Parse OpenAPI v3.x documents (JSON and YAML), from text, files or URLs
//! - Inline local `$ref`s, leaving recursive references in place
//! - Merge path-level and operation-level parameters
//! - Collect request and response examples per media type
//!
//! ## Example
//!
//! ```no_run
//! use tryapi_openapi::OpenApiParser;
//!
//! # fn main() -> anyhow::Result<()> {
//! let document = OpenApiParser::from_file("./api/openapi.yaml")?.parse()?;
//! for (tag, operations) in document.operations_by_tag() {
//!     println!("{}: {} operations", tag.unwrap_or("default"), operations.len());
//! }
//! # Ok(())
//! # }
//! ```

mod dereference;
mod error;
mod parser;

pub use dereference::inline_local_refs;
pub use error::{OpenApiError, Result};
pub use parser::OpenApiParser;
