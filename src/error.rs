//! Error types
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are
//! local to a single call: a failed edit leaves the token table in a state
//! that still satisfies its invariants.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by parsing, querying and editing a linearized document
#[derive(Debug, Error)]
pub enum Error {
    /// Begin and end of a range resolve to different ancestor paths
    #[error("no unique context for range {begin}..{end}")]
    AmbiguousContext { begin: usize, end: usize },

    /// A character position lies outside the document
    #[error("invalid offset {0}")]
    InvalidOffset(usize),

    /// A persisted `path::offset` string could not be parsed
    #[error("invalid pointer format: {0}")]
    InvalidPointerFormat(String),

    /// A referenced target (attribute, standOff, listAnnotation, taxonomy, path) is absent
    #[error("missing target: {0}")]
    MissingTarget(String),

    /// An internal invariant of the token table could not be maintained
    #[error("token table consistency violation: {0}")]
    TableConsistency(String),

    /// Input is not well-formed XML
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// No element establishes a root
    #[error("no root element")]
    NoRootElement,

    /// The element is not referenced by any token
    #[error("element {0} is not part of the token table")]
    UnknownElement(NodeId),

    /// The element is not an `annotation`
    #[error("not an annotation element: <{0}>")]
    NotAnAnnotation(String),

    /// The annotation does not carry exactly one inlinable tag
    #[error("annotation {0} cannot be converted to inline markup")]
    NotInlinable(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid UTF-8: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
