//! DOM Module - Arena-based XML Document
//!
//! Implements a mutable DOM representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices that stay valid for the document's lifetime
//! - String interning for element/attribute names
//! - Namespace resolution stack
//!
//! Parsing and serialization go through quick-xml (see `parse` and
//! `serialize`).

pub mod document;
pub mod namespace;
pub mod node;
pub mod parse;
pub mod serialize;
pub mod strings;

pub use document::Document;
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use strings::StringPool;

/// Trait for document access - lets pointer paths be evaluated against
/// both the arena tree and the token table's structural view
pub trait DocumentAccess {
    /// Get root element ID
    fn root_element_id(&self) -> Option<NodeId>;

    /// Parent element (None for the root element)
    fn parent_element(&self, id: NodeId) -> Option<NodeId>;

    /// Element children in document order
    fn child_elements_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Get node name as string
    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Get attribute value by name
    fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str>;

    /// Concatenated text of all descendant text nodes
    fn text_content(&self, id: NodeId) -> String;

    /// Element descendants of `id` (excluding `id`) in document order
    fn descendant_elements_vec(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_elements_vec(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.child_elements_vec(current).into_iter().rev());
        }
        out
    }
}
