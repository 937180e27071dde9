//! Telegraph Converter - HTML to Telegraph content-format engine
//!
//! This library converts arbitrary, possibly messy HTML into the restricted
//! node model used by the Telegraph publishing platform, and reconstructs
//! HTML from stored node records.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `sanitizer`: legacy-tag rewrites, allow-list cleaning, whitespace collapse
//! - `fragment`: sanitized HTML string to an ordered forest under a synthetic root
//! - `normalizer`: ordered tree-rewrite passes enforcing the content model
//! - `serializer`: normalized tree to `{tag, attrs?, children?}` records
//! - `deserializer`: stored records back to an HTML string
//! - `converter`: pipeline orchestration and options
//!
//! # Determinism
//!
//! The forward pipeline (HTML to records) is a pure text/tree transform: it
//! performs no network or filesystem access, and equal inputs always produce
//! equal outputs. It is also total - any input string, including empty or
//! malformed markup, produces a (possibly empty) record list. The reverse
//! pipeline returns `Result` because stored records may be structurally
//! invalid.
//!
//! # Usage
//!
//! ```rust
//! use telegraph_converter::ContentConverter;
//!
//! let converter = ContentConverter::new();
//! let nodes = converter.convert("<h1>Title</h1>");
//! assert_eq!(serde_json::to_string(&nodes).unwrap(),
//!            r#"[{"tag":"h3","children":["Title"]}]"#);
//! ```

// Module declarations
pub mod converter;
pub mod error;
pub mod node;
pub mod sanitizer;

mod deserializer;
mod fragment;
mod normalizer;
mod serializer;
mod tags;
mod tree;
mod whitespace;

// Re-export main types for convenience
pub use converter::{ContentConverter, ConversionOptions};
pub use error::ConversionError;
pub use node::{Node, NodeElement};
