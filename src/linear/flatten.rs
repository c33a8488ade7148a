//! Tree Flattener / Rebuilder
//!
//! `flatten` walks an element tree in document order and emits one token
//! per element boundary and text node. `rebuild` replays a slice of tokens
//! into fresh tree nodes.

use std::collections::HashMap;
use std::ops::Range;

use tracing::warn;

use super::token::{Token, TokenKind};
use crate::dom::document::DOCUMENT_NODE;
use crate::dom::{Document, NodeId, NodeKind};
use crate::error::{Error, Result};

/// Flatten the subtree rooted at `root` into tokens.
///
/// Positions advance only with text; each text node becomes exactly one
/// Text token. Comments and processing instructions carry no text and are
/// not represented.
pub fn flatten(doc: &Document, root: NodeId) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position = 0;
    flatten_node(doc, root, 0, &mut position, &mut tokens);
    tokens
}

fn flatten_node(doc: &Document, id: NodeId, depth: usize, position: &mut usize, out: &mut Vec<Token>) {
    let Some(node) = doc.get_node(id) else {
        return;
    };
    match node.kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                flatten_node(doc, child, depth, position, out);
            }
        }
        NodeKind::Element => {
            out.push(Token::open(*position, id, depth));
            for child in doc.children(id) {
                flatten_node(doc, child, depth + 1, position, out);
            }
            out.push(Token::close(*position, id, depth));
        }
        NodeKind::Text | NodeKind::CData => {
            let text = node.text.as_deref().unwrap_or_default();
            if !text.is_empty() {
                let token = Token::text(*position, text, depth);
                *position = token.end();
                out.push(token);
            }
        }
        NodeKind::Comment | NodeKind::ProcessingInstruction => {}
    }
}

/// Result of replaying tokens into fresh nodes
#[derive(Debug)]
pub struct Rebuilt {
    /// Document owning the regenerated nodes
    pub document: Document,
    /// First element of the slice
    pub root: NodeId,
    /// Table element id -> regenerated node id
    pub elements: HashMap<NodeId, NodeId>,
}

impl Rebuilt {
    pub fn to_xml_string(&self) -> Result<String> {
        self.document.to_xml_string(self.root)
    }
}

/// Rebuild the elements referenced by `tokens[range]` as a new tree.
///
/// Element names, namespaces and attributes are copied from `source`.
/// Consecutive Text tokens are joined into a single text node.
pub fn rebuild(tokens: &[Token], range: Range<usize>, source: &Document) -> Result<Rebuilt> {
    let slice = tokens
        .get(range.clone())
        .ok_or_else(|| Error::TableConsistency(format!("rebuild range {range:?} out of bounds")))?;

    let mut document = Document::new();
    let mut elements = HashMap::new();

    // First pass: one node per distinct element, first occurrence wins
    for element in slice.iter().filter_map(|t| t.element) {
        elements.entry(element).or_insert_with(|| {
            let name = source.node_name(element).unwrap_or_default();
            let node = document.create_element(name, source.namespace_uri(element));
            for (key, value) in source.get_attribute_values(element) {
                document.set_attribute(node, key, value);
            }
            node
        });
    }

    // Second pass: replay structure
    let mut root = None;
    let mut stack: Vec<NodeId> = Vec::new();
    let mut buffer = String::new();

    for token in slice {
        if token.kind == TokenKind::Text {
            if stack.is_empty() {
                warn!(position = token.position, "dropping text outside the rebuilt root");
            } else if let Some(text) = &token.text {
                buffer.push_str(text);
            }
            continue;
        }

        flush_text(&mut document, &stack, &mut buffer);
        let node = token
            .element
            .and_then(|el| elements.get(&el).copied())
            .ok_or_else(|| Error::TableConsistency(format!("structural token at {} has no element", token.position)))?;

        match token.kind {
            TokenKind::Open | TokenKind::Empty => {
                match stack.last() {
                    Some(&parent) => document.append_child(parent, node),
                    None if root.is_none() => {
                        document.append_child(DOCUMENT_NODE, node);
                        root = Some(node);
                    }
                    None => {
                        return Err(Error::TableConsistency(format!(
                            "second top-level element at position {}",
                            token.position
                        )))
                    }
                }
                if token.kind == TokenKind::Open {
                    stack.push(node);
                }
            }
            TokenKind::Close => match stack.pop() {
                Some(open) if open == node => {}
                Some(_) => {
                    return Err(Error::TableConsistency(format!(
                        "close at position {} does not match the open element",
                        token.position
                    )))
                }
                None if root.is_none() => return Err(Error::NoRootElement),
                None => {
                    return Err(Error::TableConsistency(format!(
                        "unmatched close at position {}",
                        token.position
                    )))
                }
            },
            TokenKind::Text => unreachable!("text handled above"),
        }
    }
    flush_text(&mut document, &stack, &mut buffer);

    let root = root.ok_or(Error::NoRootElement)?;
    Ok(Rebuilt {
        document,
        root,
        elements,
    })
}

fn flush_text(document: &mut Document, stack: &[NodeId], buffer: &mut String) {
    if buffer.is_empty() {
        return;
    }
    if let Some(&parent) = stack.last() {
        let text = document.create_text(buffer);
        document.append_child(parent, text);
    }
    buffer.clear();
}
