//! Position Queries
//!
//! Read-only questions about the token table: which elements are open at a
//! character position, which elements lie wholly inside a range, and where
//! markup boundaries fall between two positions.

use std::collections::{BTreeSet, HashMap};

use super::table::TokenTable;
use super::token::TokenKind;
use super::view::TableView;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::pointer::{self, PathExpr, Pointer};

impl TokenTable {
    /// Elements open at `position`, outermost first.
    ///
    /// Every token at or before `position` is replayed: an Open pushes its
    /// element and a Close removes it. An element whose Close sits exactly
    /// at `position` is therefore no longer an ancestor there.
    pub fn ancestors_at(&self, position: usize) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = Vec::new();
        for token in &self.tokens()[..self.run_end(position)] {
            let Some(element) = token.element else {
                continue;
            };
            match token.kind {
                TokenKind::Open => stack.push(element),
                TokenKind::Close => {
                    if let Some(index) = stack.iter().rposition(|&e| e == element) {
                        stack.remove(index);
                    }
                }
                TokenKind::Empty | TokenKind::Text => {}
            }
        }
        stack
    }

    /// Elements whose span contains `position`, including elements closing
    /// exactly there. Outermost first.
    pub fn open_elements_at(&self, position: usize) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = Vec::new();
        for token in &self.tokens()[..self.run_end(position)] {
            let Some(element) = token.element else {
                continue;
            };
            match token.kind {
                TokenKind::Open => stack.push(element),
                TokenKind::Close if token.position < position => {
                    if let Some(index) = stack.iter().rposition(|&e| e == element) {
                        stack.remove(index);
                    }
                }
                _ => {}
            }
        }
        stack
    }

    /// Shared ancestor path of the range `begin..end`.
    ///
    /// The ancestors at `begin` and at the last character of the range are
    /// compared by tag name, optionally cut down to the first `depth`
    /// levels. Differing paths mean the range cannot be wrapped by a single
    /// element.
    ///
    /// A collapsed range at the end of the text, where every element has
    /// already closed, takes the elements closing there as its context.
    pub fn parent_context(&self, doc: &Document, begin: usize, end: usize, depth: Option<usize>) -> Result<Vec<NodeId>> {
        let mut at_begin = self.ancestors_at(begin);
        if at_begin.is_empty() && begin == end {
            at_begin = self.open_elements_at(begin);
        }
        let mut at_end = if begin == end {
            at_begin.clone()
        } else {
            self.ancestors_at(begin.max(end - 1))
        };
        if let Some(depth) = depth {
            at_begin.truncate(depth);
            at_end.truncate(depth);
        }

        if at_begin.is_empty() {
            return Err(Error::InvalidOffset(begin));
        }
        let same_path = at_begin.len() == at_end.len()
            && at_begin
                .iter()
                .zip(&at_end)
                .all(|(&a, &b)| doc.node_name(a) == doc.node_name(b));
        if !same_path {
            return Err(Error::AmbiguousContext { begin, end });
        }
        Ok(at_begin)
    }

    /// Elements lying wholly inside `begin..end` at or below `depth`.
    ///
    /// An element counts when its Open at or after `begin` and its Close at
    /// or before `end` are both seen. Zero-width elements (Empty tokens and
    /// Open/Close pairs at one position) count only strictly inside the
    /// range; at either end they stay outside the wrapping element.
    pub fn descendants(&self, begin: usize, end: usize, depth: usize) -> Vec<NodeId> {
        let start = self.run_start(begin);
        let stop = self.run_end(end).max(start);
        let inside = |position: usize| begin < position && position < end;

        let mut opened = HashMap::new();
        let mut found = Vec::new();
        for token in &self.tokens()[start..stop] {
            let Some(element) = token.element else {
                continue;
            };
            match token.kind {
                TokenKind::Open if token.depth >= depth => {
                    opened.insert(element, token.position);
                }
                TokenKind::Close => {
                    if let Some(&opened_at) = opened.get(&element) {
                        if opened_at < token.position || inside(token.position) {
                            found.push(element);
                        }
                    }
                }
                TokenKind::Empty if token.depth >= depth && inside(token.position) => found.push(element),
                _ => {}
            }
        }
        found
    }

    /// `begin`, `end` and every Open/Close position strictly between them, ascending
    pub fn boundaries(&self, begin: usize, end: usize) -> Vec<usize> {
        let mut set = BTreeSet::from([begin, end]);
        if begin < end {
            for token in &self.tokens()[self.run_end(begin)..self.run_start(end)] {
                if matches!(token.kind, TokenKind::Open | TokenKind::Close) {
                    set.insert(token.position);
                }
            }
        }
        set.into_iter().collect()
    }

    /// Elements named `tag`, in document order
    pub fn find_elements<'a>(&'a self, doc: &'a Document, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.elements().filter(move |&el| doc.node_name(el) == Some(tag))
    }

    /// Element named `tag` carrying `xml:id="id"`
    pub fn element_by_id(&self, doc: &Document, tag: &str, id: &str) -> Option<NodeId> {
        self.find_elements(doc, tag)
            .find(|&el| doc.get_attribute(el, "xml:id") == Some(id))
    }

    /// Pointer addressing `position` from the innermost element containing it
    pub fn pointer_for(&self, doc: &Document, position: usize) -> Result<Pointer> {
        let element = *self
            .open_elements_at(position)
            .last()
            .ok_or(Error::InvalidOffset(position))?;
        let view = TableView::new(self, doc);
        let start = view.position_of(element).ok_or(Error::UnknownElement(element))?;
        Ok(Pointer::new(pointer::path_to(&view, element), position - start))
    }

    /// Character position addressed by `path` plus `offset`.
    ///
    /// The first element in document order matched by `path` anchors the
    /// offset.
    pub fn resolve_pointer(&self, doc: &Document, path: &PathExpr, offset: usize) -> Result<usize> {
        let view = TableView::new(self, doc);
        let element = pointer::select_first(&view, path)
            .ok_or_else(|| Error::MissingTarget(format!("no element matches {path}")))?;
        let start = view.position_of(element).ok_or(Error::UnknownElement(element))?;
        Ok(start + offset)
    }
}
