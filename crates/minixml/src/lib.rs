//! Minimal XML parsing into an ordered, queryable tree.
//!
//! This crate scans raw XML text in a single left-to-right pass and builds a
//! [`Document`]: an arena of tagged nodes with attributes, trimmed inner text
//! and ordered children, hanging off a synthetic `ROOT` node. The tree can
//! then be queried by child index, by depth-first tag search, by
//! slash-delimited path, and by attribute key.
//!
//! # Example
//!
//! ```rust
//! use minixml::parse;
//!
//! let doc = parse(r#"<?xml version="1.0" encoding="UTF-8"?>
//! <library>
//!   <book id="1">
//!     <title>The Great Gatsby</title>
//!     <rating value="4.5" />
//!   </book>
//! </library>"#).unwrap();
//!
//! let library = doc.root().child_at(0).unwrap();
//! assert_eq!(library.tag(), "library");
//!
//! let title = doc.root().find_tag("title", true).unwrap();
//! assert_eq!(title.text(), Some("The Great Gatsby"));
//!
//! let rating = doc.root().find_by_path("library/book/rating", true).unwrap();
//! assert_eq!(rating.attribute("value"), Some("4.5"));
//! assert_eq!(doc.declared_encoding(), Some("UTF-8"));
//! ```
//!
//! # What is not supported
//!
//! Namespaces, DTD validation, entity decoding, CDATA sections and streaming
//! are out of scope. Markup that cannot be scanned (unterminated comments,
//! unquoted attribute values, mismatched end tags, ...) is reported as an
//! [`Error`] carrying a [`Location`].

pub mod context;
pub mod diagnostic;
pub mod error;
pub mod location;
pub mod observer;
pub mod options;
pub mod parser;
mod scanner;
pub mod tree;

pub use context::XmlParseContext;
pub use diagnostic::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder, SourceFile};
pub use error::{Construct, Error, ParseResult, Result};
pub use location::Location;
pub use observer::{NoopObserver, ParseEvent, ParseObserver, RecordingObserver, TracingObserver};
pub use options::ParseOptions;
pub use parser::{XmlParser, parse, parse_bytes, parse_file, parse_with_context, parse_with_options};
pub use tree::{Attribute, Descendants, Document, Node, NodeId, NodeRef, ROOT_TAG};
