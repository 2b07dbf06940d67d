//! Error types and recovery diagnostics.
//!
//! Malformed markup never produces an error: the tree builder recovers and
//! records a [`ParseDiagnostic`] on the document instead. The error enums
//! here cover the remaining failure classes:
//!
//! - [`BuildError`]: the requested parser configuration cannot be satisfied.
//!   Returned before any input is consumed.
//! - [`FilterError`]: a search filter or selector could not be compiled.
//! - [`TreeError`]: a mutation would break the tree's structural invariants.
//! - [`EncodeError`]: output was requested in an encoding that does not exist.

use std::fmt;

use thiserror::Error;

/// Errors raised while setting up a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No registered backend provides every requested feature.
    #[error("no tree builder supports the requested features: {}", .features.join(", "))]
    BackendUnavailable {
        /// The features that were requested.
        features: Vec<String>,
    },
}

/// Errors raised while compiling a search filter.
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    /// A pattern filter was given a malformed regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as written by the caller.
        pattern: String,
        /// The underlying regex compile error.
        #[source]
        source: regex::Error,
    },
    /// A selector compiler rejected its input.
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector {
        /// The selector as written by the caller.
        selector: String,
        /// Why it was rejected.
        message: String,
    },
}

/// Errors raised by the tree mutation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node would become its own ancestor.
    #[error("cannot insert a node into itself or one of its descendants")]
    WouldCycle,
    /// The document root cannot be moved, replaced, or wrapped.
    #[error("the document root cannot be detached")]
    RootImmovable,
    /// The operation needs a node that is attached to a parent.
    #[error("node has no parent")]
    Detached,
    /// The operation only applies to tags.
    #[error("node is not a tag")]
    NotATag,
    /// The target node cannot hold children.
    #[error("node cannot contain children")]
    NotAContainer,
    /// Insertion index past the end of the child list.
    #[error("child index {index} is out of range (parent has {len} children)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The current number of children.
        len: usize,
    },
}

/// Errors raised when serializing to bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The label does not name an encoding known to `encoding_rs`.
    #[error("unknown encoding label {0:?}")]
    UnknownEncoding(String),
}

/// The category of a recovered markup problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// An end tag with no matching open tag. It was ignored.
    StrayEndTag,
    /// An open tag closed by an end tag for one of its ancestors.
    MisnestedEndTag,
    /// An open tag closed by the start of a tag that implicitly ends it.
    ImplicitClose,
    /// A tag still open at end of input.
    UnclosedTag,
    /// Markup the tokenizer could not make sense of and skipped or kept as text.
    BadMarkup,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrayEndTag => write!(f, "stray end tag"),
            Self::MisnestedEndTag => write!(f, "misnested end tag"),
            Self::ImplicitClose => write!(f, "implicit close"),
            Self::UnclosedTag => write!(f, "unclosed tag"),
            Self::BadMarkup => write!(f, "bad markup"),
        }
    }
}

/// A single recovered problem noticed while building the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub message: String,
}

impl ParseDiagnostic {
    pub(crate) fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
