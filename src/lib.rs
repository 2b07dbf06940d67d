//! # soupkit
//!
//! Error-tolerant HTML and XML parsing into a navigable, searchable, mutable
//! tree. Broken markup never fails to parse: the tree builder recovers the
//! way browsers and scrapers expect, and records what it fixed.
//!
//! ## Quick Start
//!
//! ```
//! use soupkit::{parse_html, Query};
//!
//! let doc = parse_html("<ul><li class='x'>one<li>two</ul>");
//! let items = doc.find_all(doc.root(), &Query::name("li"), true, None);
//! assert_eq!(items.len(), 2);
//! assert_eq!(doc.get_text(items[1], "", false), "two");
//!
//! let first = doc.find(doc.root(), &Query::new().class("x")).unwrap();
//! assert_eq!(first, items[0]);
//! assert_eq!(doc.decode(), "<ul><li class=\"x\">one</li><li>two</li></ul>");
//! ```
//!
//! Byte input goes through encoding detection; the encoding that was used is
//! reported on the document:
//!
//! ```
//! use soupkit::parse_html;
//!
//! let doc = parse_html(b"<meta charset='utf-8'><p>\xc3\xa9</p>");
//! assert_eq!(doc.original_encoding(), Some("UTF-8"));
//! ```

pub mod builder;
pub mod diagnose;
pub mod encoding;
pub mod error;
pub mod navigate;
pub mod parser;
pub mod search;
pub mod serial;
pub mod tokenizer;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use encoding::DetectionSource;
pub use error::{BuildError, EncodeError, FilterError, ParseDiagnostic, TreeError};
pub use navigate::SiblingFilter;
pub use parser::{parse_html, parse_xml, Markup, ParseOptions};
pub use search::{Filter, Query, SelectorCompiler};
pub use serial::FormatOptions;
pub use tree::{AttrValue, Document, NavigableString, NodeId, NodeKind, StringKind, Tag};
