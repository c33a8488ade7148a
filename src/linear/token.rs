//! Token rows
//!
//! A token is one row of the linearized document: an element boundary
//! (Open/Close), a self-contained element (Empty), or a run of text.

use serde::Serialize;

use crate::dom::{Document, NodeId};

/// Kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Open,
    Close,
    Empty,
    Text,
}

impl TokenKind {
    /// Open, Close or Empty
    #[inline]
    pub fn is_structural(self) -> bool {
        self != TokenKind::Text
    }
}

/// One row of the token table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Offset into the plain text, in `char`s
    pub position: usize,
    pub kind: TokenKind,
    /// Element referenced by an Open/Close/Empty token
    pub element: Option<NodeId>,
    pub depth: usize,
    /// Content of a Text token
    pub text: Option<String>,
}

impl Token {
    pub fn open(position: usize, element: NodeId, depth: usize) -> Self {
        Self::structural(TokenKind::Open, position, element, depth)
    }

    pub fn close(position: usize, element: NodeId, depth: usize) -> Self {
        Self::structural(TokenKind::Close, position, element, depth)
    }

    pub fn empty(position: usize, element: NodeId, depth: usize) -> Self {
        Self::structural(TokenKind::Empty, position, element, depth)
    }

    pub fn text(position: usize, text: impl Into<String>, depth: usize) -> Self {
        Token {
            position,
            kind: TokenKind::Text,
            element: None,
            depth,
            text: Some(text.into()),
        }
    }

    pub(crate) fn structural(kind: TokenKind, position: usize, element: NodeId, depth: usize) -> Self {
        Token {
            position,
            kind,
            element: Some(element),
            depth,
            text: None,
        }
    }

    /// Number of characters this token contributes to the plain text
    #[inline]
    pub fn len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty)
    }

    /// Position just after this token's text
    #[inline]
    pub fn end(&self) -> usize {
        self.position + self.len()
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }

    /// Whether this token references `element`
    #[inline]
    pub fn refers_to(&self, element: NodeId) -> bool {
        self.element == Some(element)
    }

    /// JSON-friendly record of this token
    pub fn record<'d>(&'d self, doc: &'d Document) -> TokenRecord<'d> {
        TokenRecord {
            position: self.position,
            kind: self.kind,
            tag: self.element.and_then(|el| doc.node_name(el)),
            depth: self.depth,
            text: self.text.as_deref(),
        }
    }
}

/// Serializable view of a token with its tag name resolved
#[derive(Debug, Clone, Serialize)]
pub struct TokenRecord<'d> {
    pub position: usize,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub tag: Option<&'d str>,
    pub depth: usize,
    pub text: Option<&'d str>,
}
