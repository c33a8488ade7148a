//! Token Table (Position Store)
//!
//! Owns the token sequence and provides the position-aware primitives every
//! edit is built from: text splitting, depth-ordered insertion, element
//! removal with text re-merging, and per-element patches.
//!
//! Tokens are kept sorted by position, so the run of tokens sharing a
//! position is found by binary search.

use std::collections::HashSet;

use tracing::trace;

use super::flatten::flatten;
use super::token::{Token, TokenKind};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

/// Partial update applied to every token of one element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenPatch {
    pub depth: Option<usize>,
    pub position: Option<usize>,
}

impl TokenPatch {
    pub fn depth(depth: usize) -> Self {
        TokenPatch {
            depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn position(position: usize) -> Self {
        TokenPatch {
            position: Some(position),
            ..Default::default()
        }
    }
}

/// Flat, position-ordered token sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    tokens: Vec<Token>,
}

impl TokenTable {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenTable { tokens }
    }

    /// Flatten the subtree rooted at `root`
    pub fn from_tree(doc: &Document, root: NodeId) -> Self {
        Self::new(flatten(doc, root))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Concatenation of all text tokens
    pub fn plain_text(&self) -> String {
        self.tokens.iter().filter_map(|t| t.text.as_deref()).collect()
    }

    /// Length of the plain text, in chars
    pub fn text_len(&self) -> usize {
        self.tokens.iter().rev().find(|t| t.is_text()).map_or(0, Token::end)
    }

    /// Index of the first token at or after `position`
    #[inline]
    pub fn run_start(&self, position: usize) -> usize {
        self.tokens.partition_point(|t| t.position < position)
    }

    /// Index just past the last token at or before `position`
    #[inline]
    pub fn run_end(&self, position: usize) -> usize {
        self.tokens.partition_point(|t| t.position <= position)
    }

    /// Whether any token sits exactly at `position`
    pub fn has_token_at(&self, position: usize) -> bool {
        self.run_start(position) < self.run_end(position)
    }

    /// Index of the token opening `element` (its Open or Empty)
    pub fn open_index(&self, element: NodeId) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.refers_to(element) && t.kind != TokenKind::Close)
    }

    /// Indices of `element`'s Open and Close tokens; an Empty token yields the same index twice
    pub fn span_of(&self, element: NodeId) -> Option<(usize, usize)> {
        let open = self.open_index(element)?;
        if self.tokens[open].kind == TokenKind::Empty {
            return Some((open, open));
        }
        let close = self.tokens[open + 1..]
            .iter()
            .position(|t| t.refers_to(element) && t.kind == TokenKind::Close)?;
        Some((open, open + 1 + close))
    }

    /// All elements referenced by the table, in order of their opening token
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Open | TokenKind::Empty))
            .filter_map(|t| t.element)
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Split the text token covering `position` so that a token starts there.
    ///
    /// Returns whether a split happened. Positions on a token boundary or
    /// outside every text span leave the table unchanged.
    pub fn split_text_at(&mut self, position: usize) -> Result<bool> {
        let upper = self.run_end(position);
        let Some(index) = self.tokens[..upper].iter().rposition(Token::is_text) else {
            return Ok(false);
        };

        let token = &self.tokens[index];
        let offset = position - token.position;
        if offset == 0 || offset >= token.len() {
            return Ok(false);
        }

        let text = token.text.as_deref().unwrap_or_default();
        let byte = text.char_indices().nth(offset).map_or(text.len(), |(b, _)| b);
        let (head, tail) = text.split_at(byte);
        let tail = Token::text(position, tail, token.depth);
        let head = head.to_string();

        self.tokens[index].text = Some(head);
        self.tokens.insert(index + 1, tail);
        trace!(position, index, "split text token");
        Ok(true)
    }

    /// Insert a structural token at `position`.
    ///
    /// Without `explicit_index` the token is placed among the tokens already
    /// at `position`: an Open or Empty goes after closes and shallower-or-equal
    /// opens and before text and deeper opens; a Close goes after deeper
    /// tokens and before text and shallower-or-equal tokens.
    pub fn insert(
        &mut self,
        kind: TokenKind,
        position: usize,
        element: NodeId,
        depth: usize,
        explicit_index: Option<usize>,
    ) -> Result<usize> {
        if kind == TokenKind::Text {
            return Err(Error::TableConsistency("text is inserted with insert_text".into()));
        }

        let index = match explicit_index {
            Some(index) => {
                self.check_slot(index, position)?;
                index
            }
            None => {
                if !self.has_token_at(position) {
                    self.split_text_at(position)?;
                }
                if !self.has_token_at(position) {
                    return Err(Error::TableConsistency(format!("no token at position {position}")));
                }
                self.placement(kind, position, depth)
            }
        };

        self.tokens.insert(index, Token::structural(kind, position, element, depth));
        trace!(?kind, position, depth, index, "inserted token");
        Ok(index)
    }

    /// Insert Open and Close tokens for `element` at explicit indices around nothing
    pub(crate) fn insert_pair_at(&mut self, index: usize, element: NodeId, depth: usize) -> Result<usize> {
        let position = self.slot_position(index);
        self.insert(TokenKind::Open, position, element, depth, Some(index))?;
        self.insert(TokenKind::Close, position, element, depth, Some(index + 1))?;
        Ok(index)
    }

    /// Position a token inserted at `index` must carry
    pub(crate) fn slot_position(&self, index: usize) -> usize {
        match self.tokens.get(index) {
            Some(token) => token.position,
            None => self.tokens.last().map_or(0, Token::end),
        }
    }

    fn check_slot(&self, index: usize, position: usize) -> Result<()> {
        if index > self.tokens.len() {
            return Err(Error::TableConsistency(format!("index {index} out of bounds")));
        }
        let after_prev = index == 0 || self.tokens[index - 1].end() <= position;
        let before_next = self.tokens.get(index).is_none_or(|t| position <= t.position);
        if after_prev && before_next {
            Ok(())
        } else {
            Err(Error::TableConsistency(format!(
                "position {position} does not fit at index {index}"
            )))
        }
    }

    fn placement(&self, kind: TokenKind, position: usize, depth: usize) -> usize {
        let start = self.run_start(position);
        let run = &self.tokens[start..self.run_end(position)];
        let offset = match kind {
            TokenKind::Close => run.iter().position(|t| t.is_text() || t.depth <= depth),
            _ => run.iter().position(|t| match t.kind {
                TokenKind::Text => true,
                TokenKind::Close => false,
                TokenKind::Open | TokenKind::Empty => t.depth > depth,
            }),
        };
        start + offset.unwrap_or(run.len())
    }

    /// Delete every token of `element`, then merge text tokens made adjacent
    pub fn remove_element(&mut self, element: NodeId) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|t| !t.refers_to(element));
        let removed = before - self.tokens.len();
        if removed > 0 {
            self.merge_adjacent_text();
        }
        removed
    }

    /// Join every run of consecutive text tokens into the first of the run
    pub(crate) fn merge_adjacent_text(&mut self) {
        let mut merged: Vec<Token> = Vec::with_capacity(self.tokens.len());
        for token in self.tokens.drain(..) {
            if let (true, Some(last)) = (token.is_text(), merged.last_mut()) {
                if last.is_text() {
                    let tail = token.text.unwrap_or_default();
                    last.text.get_or_insert_with(String::new).push_str(&tail);
                    continue;
                }
            }
            merged.push(token);
        }
        self.tokens = merged;
    }

    /// Apply `patch` to every token referencing `element`
    pub fn update_token(&mut self, element: NodeId, patch: TokenPatch) -> usize {
        let mut count = 0;
        for token in self.tokens.iter_mut().filter(|t| t.refers_to(element)) {
            if let Some(depth) = patch.depth {
                token.depth = depth;
            }
            if let Some(position) = patch.position {
                token.position = position;
            }
            count += 1;
        }
        count
    }

    /// Add `delta` to the position of every token from `from` onwards
    pub fn shift_positions(&mut self, from: usize, delta: isize) {
        for token in self.tokens.iter_mut().skip(from) {
            token.position = token.position.saturating_add_signed(delta);
        }
    }

    /// Insert a text token at `index`, moving every following token along
    pub fn insert_text(&mut self, index: usize, text: &str, depth: usize) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let position = self.slot_position(index);
        self.check_slot(index, position)?;
        let token = Token::text(position, text, depth);
        let len = token.len() as isize;
        self.tokens.insert(index, token);
        self.shift_positions(index + 1, len);
        Ok(())
    }

    /// Splice a flattened subtree in at `index`.
    ///
    /// `tokens` carry positions relative to their own start and depths
    /// relative to `base_depth`. Following tokens move along by the text
    /// the subtree adds.
    pub fn insert_tokens(&mut self, index: usize, tokens: Vec<Token>, base_depth: usize) -> Result<()> {
        let position = self.slot_position(index);
        self.check_slot(index, position)?;
        let count = tokens.len();
        let added: usize = tokens.iter().map(Token::len).sum();
        let placed = tokens.into_iter().map(|mut token| {
            token.position += position;
            token.depth += base_depth;
            token
        });
        self.tokens.splice(index..index, placed);
        self.shift_positions(index + count, added as isize);
        trace!(index, count, added, "spliced tokens");
        Ok(())
    }

    /// Remove the tokens in `start..=end`, moving following tokens back by the removed text length
    pub(crate) fn remove_range(&mut self, start: usize, end: usize) -> usize {
        let removed: usize = self.tokens.drain(start..=end).map(|t| t.len()).sum();
        self.shift_positions(start, -(removed as isize));
        removed
    }

    pub(crate) fn token_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    // ------------------------------------------------------------------
    // Checks and dumps
    // ------------------------------------------------------------------

    /// Verify offsets, nesting, structural depths and element uniqueness
    pub fn check_invariants(&self) -> Result<()> {
        let mut counter = 0;
        let mut stack: Vec<NodeId> = Vec::new();
        let mut seen = HashSet::new();

        for (index, token) in self.tokens.iter().enumerate() {
            if token.position != counter {
                return Err(Error::TableConsistency(format!(
                    "token {index} at position {} but {counter} chars precede it",
                    token.position
                )));
            }
            counter += token.len();

            let Some(element) = token.element else {
                if token.kind.is_structural() {
                    return Err(Error::TableConsistency(format!("token {index} has no element")));
                }
                continue;
            };
            match token.kind {
                TokenKind::Open | TokenKind::Empty => {
                    if !seen.insert(element) {
                        return Err(Error::TableConsistency(format!("element {element} opened twice")));
                    }
                    if token.depth != stack.len() {
                        return Err(Error::TableConsistency(format!(
                            "token {index} has depth {} at nesting level {}",
                            token.depth,
                            stack.len()
                        )));
                    }
                    if token.kind == TokenKind::Open {
                        stack.push(element);
                    }
                }
                TokenKind::Close => {
                    if stack.pop() != Some(element) {
                        return Err(Error::TableConsistency(format!("token {index} closes out of order")));
                    }
                    if token.depth != stack.len() {
                        return Err(Error::TableConsistency(format!(
                            "close token {index} has depth {} at nesting level {}",
                            token.depth,
                            stack.len()
                        )));
                    }
                }
                TokenKind::Text => {}
            }
        }

        if stack.is_empty() {
            Ok(())
        } else {
            Err(Error::TableConsistency(format!("{} element(s) left open", stack.len())))
        }
    }

    /// JSON array of token records with resolved tag names
    pub fn to_json(&self, doc: &Document) -> Result<String> {
        let records: Vec<_> = self.tokens.iter().map(|t| t.record(doc)).collect();
        Ok(serde_json::to_string(&records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `<root>Hello, world!</root>` with hand-made depths
    fn hello() -> (Document, NodeId, TokenTable) {
        let mut doc = Document::new();
        let root = doc.create_element("root", None);
        let table = TokenTable::new(vec![
            Token::open(0, root, 0),
            Token::text(0, "Hello, world!", 0),
            Token::close(13, root, 0),
        ]);
        (doc, root, table)
    }

    #[test]
    fn test_split_interior() {
        let (_, _, mut table) = hello();
        assert!(table.split_text_at(5).unwrap());
        let texts: Vec<_> = table
            .iter()
            .filter(|t| t.is_text())
            .map(|t| (t.position, t.text.as_deref().unwrap(), t.depth))
            .collect();
        assert_eq!(texts, vec![(0, "Hello", 0), (5, ", world!", 0)]);
        assert_eq!(table.plain_text(), "Hello, world!");
    }

    #[test]
    fn test_split_on_boundary_is_noop() {
        let (_, _, mut table) = hello();
        let before = table.clone();
        assert!(!table.split_text_at(0).unwrap());
        assert!(!table.split_text_at(13).unwrap());
        assert!(!table.split_text_at(40).unwrap());
        assert_eq!(table, before);
    }

    #[test]
    fn test_split_multibyte() {
        let mut doc = Document::new();
        let root = doc.create_element("root", None);
        let mut table = TokenTable::new(vec![
            Token::open(0, root, 0),
            Token::text(0, "Washington’s army", 1),
            Token::close(17, root, 0),
        ]);
        assert!(table.split_text_at(12).unwrap());
        assert_eq!(table.get(1).unwrap().text.as_deref(), Some("Washington’s"));
        assert_eq!(table.get(2).unwrap().text.as_deref(), Some(" army"));
    }

    #[test]
    fn test_insert_open_and_close_ordering() {
        let (mut doc, root, mut table) = hello();
        let child = doc.create_element("child", None);
        let open = table.insert(TokenKind::Open, 0, child, 1, None).unwrap();
        assert_eq!(open, 1);
        let close = table.insert(TokenKind::Close, 5, child, 1, None).unwrap();
        assert_eq!(close, 3);
        assert_eq!(table.span_of(child), Some((1, 3)));
        assert_eq!(table.span_of(root), Some((0, 5)));
    }

    #[test]
    fn test_insert_close_after_deeper_closes() {
        let mut doc = Document::new();
        let root = doc.create_element("root", None);
        let hi = doc.create_element("hi", None);
        let outer = doc.create_element("outer", None);
        let mut table = TokenTable::new(vec![
            Token::open(0, root, 0),
            Token::open(0, outer, 1),
            Token::open(0, hi, 2),
            Token::text(0, "ab", 3),
            Token::close(2, hi, 2),
            Token::text(2, "cd", 1),
            Token::close(4, root, 0),
        ]);
        // hand-place the close of `outer` at 2; it must follow the deeper </hi>
        table.remove_element(outer);
        table.insert(TokenKind::Open, 0, outer, 1, Some(1)).unwrap();
        let index = table.insert(TokenKind::Close, 2, outer, 1, None).unwrap();
        assert_eq!(index, 5);
        assert_eq!(table.get(4).unwrap().element, Some(hi));
        table.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_without_anchor_fails() {
        let mut doc = Document::new();
        let root = doc.create_element("root", None);
        let x = doc.create_element("x", None);
        let mut table = TokenTable::new(vec![Token::open(0, root, 0), Token::close(0, root, 0)]);
        assert!(matches!(
            table.insert(TokenKind::Open, 3, x, 1, None),
            Err(Error::TableConsistency(_))
        ));
        assert!(table.insert(TokenKind::Open, 3, x, 1, Some(1)).is_err());
    }

    #[test]
    fn test_remove_element_merges_text() {
        let (mut doc, _, mut table) = hello();
        let child = doc.create_element("child", None);
        table.insert(TokenKind::Open, 0, child, 1, None).unwrap();
        table.insert(TokenKind::Close, 5, child, 1, None).unwrap();
        assert_eq!(table.len(), 6);

        assert_eq!(table.remove_element(child), 2);
        assert_eq!(table, hello().2);
    }

    #[test]
    fn test_update_token() {
        let (_, root, mut table) = hello();
        assert_eq!(table.update_token(root, TokenPatch::depth(3)), 2);
        assert!(table.iter().filter(|t| t.refers_to(root)).all(|t| t.depth == 3));
        assert_eq!(table.update_token(999, TokenPatch::depth(1)), 0);
    }

    #[test]
    fn test_insert_text_shifts() {
        let mut doc = Document::new();
        let root = doc.create_element("root", None);
        let desc = doc.create_element("catDesc", None);
        let mut table = TokenTable::new(vec![
            Token::open(0, root, 0),
            Token::open(0, desc, 1),
            Token::close(0, desc, 1),
            Token::text(0, "body", 1),
            Token::close(4, root, 0),
        ]);
        table.insert_text(2, "Place", 2).unwrap();
        assert_eq!(table.plain_text(), "Placebody");
        assert_eq!(table.get(3).unwrap().position, 5);
        assert_eq!(table.get(4).unwrap().position, 5);
        assert_eq!(table.get(5).unwrap().position, 9);
        table.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_tokens_relocates_subtree() {
        let (mut doc, root, mut table) = hello();
        let note = doc.create_element("note", None);
        let subtree = vec![Token::open(0, note, 0), Token::text(0, "Hi", 1), Token::close(2, note, 0)];
        table.split_text_at(5).unwrap();
        table.insert_tokens(2, subtree, 1).unwrap();

        assert_eq!(table.plain_text(), "HelloHi, world!");
        assert_eq!(table.span_of(note), Some((2, 4)));
        assert_eq!(table.get(3).unwrap().position, 5);
        assert_eq!(table.get(3).unwrap().depth, 2);
        assert_eq!(table.get(5).unwrap().position, 7);
        assert_eq!(table.span_of(root), Some((0, 6)));
        assert_eq!(table.get(6).unwrap().position, 15);
    }

    #[test]
    fn test_check_invariants_from_tree() {
        let doc = Document::parse("<root><p>a<hi>b</hi></p><p/>c</root>").unwrap();
        let table = TokenTable::from_tree(&doc, doc.root_element_id().unwrap());
        table.check_invariants().unwrap();
        assert_eq!(table.text_len(), 3);

        let mut broken = table.clone();
        broken.shift_positions(3, 1);
        assert!(broken.check_invariants().is_err());
    }

    #[test]
    fn test_to_json() {
        let (doc, _, table) = hello();
        let json = table.to_json(&doc).unwrap();
        assert!(json.starts_with(r#"[{"position":0,"type":"open","tag":"root","depth":0,"text":null}"#));
    }
}
