//! Structural view of a token table
//!
//! Edits change the token table, not the arena's parent/child links, so
//! tree questions (parent, children, sibling index) are answered from the
//! tokens. Names and attributes still come from the arena.

use std::collections::HashMap;

use super::table::TokenTable;
use super::token::TokenKind;
use crate::dom::{Document, DocumentAccess, NodeId};

/// Element tree derived from one pass over the tokens
pub struct TableView<'a> {
    table: &'a TokenTable,
    doc: &'a Document,
    root: Option<NodeId>,
    parents: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    /// element -> (open index, close index)
    spans: HashMap<NodeId, (usize, usize)>,
}

impl<'a> TableView<'a> {
    pub fn new(table: &'a TokenTable, doc: &'a Document) -> Self {
        let mut view = TableView {
            table,
            doc,
            root: None,
            parents: HashMap::new(),
            children: HashMap::new(),
            spans: HashMap::new(),
        };

        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        for (index, token) in table.iter().enumerate() {
            let Some(element) = token.element else {
                continue;
            };
            match token.kind {
                TokenKind::Open | TokenKind::Empty => {
                    match stack.last() {
                        Some(&(parent, _)) => {
                            view.parents.insert(element, parent);
                            view.children.entry(parent).or_default().push(element);
                        }
                        None => {
                            view.root.get_or_insert(element);
                        }
                    }
                    if token.kind == TokenKind::Open {
                        stack.push((element, index));
                    } else {
                        view.spans.insert(element, (index, index));
                    }
                }
                TokenKind::Close => {
                    if let Some(depth) = stack.iter().rposition(|&(e, _)| e == element) {
                        let (_, open) = stack.remove(depth);
                        view.spans.insert(element, (open, index));
                    }
                }
                TokenKind::Text => {}
            }
        }
        view
    }

    /// Position of the token opening `element`
    pub fn position_of(&self, element: NodeId) -> Option<usize> {
        let (open, _) = self.spans.get(&element)?;
        self.table.get(*open).map(|t| t.position)
    }

    /// Token indices of `element`'s Open and Close
    pub fn span(&self, element: NodeId) -> Option<(usize, usize)> {
        self.spans.get(&element).copied()
    }
}

impl DocumentAccess for TableView<'_> {
    fn root_element_id(&self) -> Option<NodeId> {
        self.root
    }

    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    fn child_elements_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children.get(&id).cloned().unwrap_or_default()
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        self.doc.node_name(id)
    }

    fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.doc.get_attribute(id, name)
    }

    fn text_content(&self, id: NodeId) -> String {
        let Some((open, close)) = self.span(id) else {
            return String::new();
        };
        self.table.tokens()[open..=close]
            .iter()
            .filter_map(|t| t.text.as_deref())
            .collect()
    }
}
