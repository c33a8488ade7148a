//! Inline Edits
//!
//! Wrapping a character range in a new element and unwrapping or deleting an
//! existing one. A range that crosses markup boundaries is wrapped
//! piecewise: one element per segment between consecutive boundaries.

use tracing::debug;

use super::table::{TokenPatch, TokenTable};
use super::token::TokenKind;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

impl TokenTable {
    /// Wrap `begin..end` in new `tag` elements, one per boundary segment.
    ///
    /// Every segment's context is checked before the table is touched, so an
    /// `AmbiguousContext` or `InvalidOffset` error leaves it unchanged. A
    /// collapsed range produces a single Empty token; at the end of the text
    /// it lands inside the innermost element closing there.
    pub fn insert_inline(
        &mut self,
        doc: &mut Document,
        begin: usize,
        end: usize,
        tag: &str,
        attributes: &[(&str, &str)],
        namespace: Option<&str>,
    ) -> Result<Vec<NodeId>> {
        if begin > end {
            return Err(Error::InvalidOffset(begin));
        }
        if end > self.text_len() {
            return Err(Error::InvalidOffset(end));
        }

        let bounds = self.boundaries(begin, end);
        let segments: Vec<(usize, usize)> = match bounds.as_slice() {
            [single] => vec![(*single, *single)],
            _ => bounds.windows(2).map(|w| (w[0], w[1])).collect(),
        };

        let mut planned = Vec::with_capacity(segments.len());
        for (b, e) in segments {
            let context = self.parent_context(doc, b, e, None)?;
            planned.push((b, e, context));
        }

        let mut created = Vec::with_capacity(planned.len());
        for (b, e, context) in planned {
            let element = doc.create_element(tag, namespace);
            for (key, value) in attributes {
                doc.set_attribute(element, key, value);
            }
            self.wrap_segment(b, e, element, &context)?;
            created.push(element);
        }

        debug!(begin, end, tag, segments = created.len(), "inserted inline element");
        Ok(created)
    }

    fn wrap_segment(&mut self, begin: usize, end: usize, element: NodeId, context: &[NodeId]) -> Result<()> {
        let depth = context.len();
        if begin == end {
            // inside a parent that closes right here, go before its Close
            let closing = context
                .last()
                .and_then(|&parent| self.span_of(parent))
                .map(|(_, close)| close)
                .filter(|&close| self.get(close).is_some_and(|t| t.position == begin));
            self.insert(TokenKind::Empty, begin, element, depth, closing)?;
            return Ok(());
        }

        for child in self.descendants(begin, end, depth) {
            if let Some(current) = self.open_index(child).and_then(|i| self.get(i)).map(|t| t.depth) {
                self.update_token(child, TokenPatch::depth(current + 1));
            }
        }

        let open = self.insert(TokenKind::Open, begin, element, depth, None)?;
        let close = self.insert(TokenKind::Close, end, element, depth, None)?;
        for index in open + 1..close {
            if let Some(token) = self.token_mut(index).filter(|t| t.is_text()) {
                token.depth += 1;
            }
        }
        Ok(())
    }

    /// Remove `element` from the table.
    ///
    /// With `keep_contents` only its Open and Close go and everything inside
    /// moves up one level. Without it the enclosed tokens go too, and later
    /// positions move back by the removed text length.
    pub fn remove_inline(&mut self, element: NodeId, keep_contents: bool) -> Result<()> {
        let (open, close) = self.span_of(element).ok_or(Error::UnknownElement(element))?;

        if open == close {
            self.remove_element(element);
        } else if keep_contents {
            for index in open + 1..close {
                if let Some(token) = self.token_mut(index) {
                    token.depth = token.depth.saturating_sub(1);
                }
            }
            self.remove_element(element);
        } else {
            let removed = self.remove_range(open, close);
            self.merge_adjacent_text();
            debug!(element, removed, "removed element with its contents");
            return Ok(());
        }

        debug!(element, keep_contents, "removed inline element");
        Ok(())
    }
}
