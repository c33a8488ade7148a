//! XML Document - Arena-based DOM representation
//!
//! Mutable DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for names
//!
//! Nodes are never freed; detaching a node only unlinks it, so ids held
//! elsewhere (e.g. by tokens) remain valid.

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use super::DocumentAccess;
use crate::config::Options;
use crate::error::Result;

/// Id of the document node
pub const DOCUMENT_NODE: NodeId = 0;

/// An XML document stored in arena format
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<XmlNode>,
    strings: StringPool,
    root_element: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        Document {
            nodes: vec![XmlNode::document()],
            strings: StringPool::new(),
            root_element: None,
        }
    }

    /// Parse a document with default options
    pub fn parse(input: &str) -> Result<Self> {
        super::parse::parse(input, &Options::default())
    }

    /// Parse a document with explicit options
    pub fn parse_with(input: &str, options: &Options) -> Result<Self> {
        super::parse::parse(input, options)
    }

    /// Serialize a node and its subtree
    pub fn to_xml_string(&self, id: NodeId) -> Result<String> {
        super::serialize::to_xml_string(self, id)
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get the string pool for direct access
    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    pub(crate) fn strings_mut(&mut self) -> &mut StringPool {
        &mut self.strings
    }

    /// Intern a name in the document's string pool
    pub fn intern(&mut self, s: &str) -> u32 {
        self.strings.intern(s)
    }

    #[inline]
    fn contains(&self, id: NodeId) -> bool {
        (id as usize) < self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Add a detached node to the arena
    pub fn add_node(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId {
        let name_id = self.strings.intern(name);
        let namespace_id = namespace.map(|ns| self.strings.intern(ns)).unwrap_or(0);
        self.add_node(XmlNode::element(name_id, namespace_id))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.add_node(XmlNode::text(text))
    }

    /// Set (or replace) an attribute
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if !self.contains(id) {
            return;
        }
        let name_id = self.strings.intern(name);
        let node = &mut self.nodes[id as usize];
        match node.attributes.iter_mut().find(|a| a.name_id == name_id) {
            Some(attr) => attr.value = value.to_string(),
            None => node.attributes.push(XmlAttribute::new(name_id, value)),
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let name_id = self.strings.lookup(name)?;
        let node = self.nodes.get_mut(id as usize)?;
        let index = node.attributes.iter().position(|a| a.name_id == name_id)?;
        Some(node.attributes.remove(index).value)
    }

    /// Append `child` as the last child of `parent`, detaching it first if needed.
    ///
    /// Appending an element to the document node makes it the root element
    /// when there is none yet.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);

        let prev = self.nodes[parent as usize].last_child;
        {
            let node = &mut self.nodes[child as usize];
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = None;
        }
        match prev {
            Some(prev_id) => self.nodes[prev_id as usize].next_sibling = Some(child),
            None => self.nodes[parent as usize].first_child = Some(child),
        }
        self.nodes[parent as usize].last_child = Some(child);

        if parent == DOCUMENT_NODE && self.root_element.is_none() && self.nodes[child as usize].is_element() {
            self.root_element = Some(child);
        }
    }

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        let (parent, prev, next) = {
            let node = &self.nodes[id as usize];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else {
            return;
        };

        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = next,
            None => self.nodes[parent as usize].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev_sibling = prev,
            None => self.nodes[parent as usize].last_child = prev,
        }

        let node = &mut self.nodes[id as usize];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;

        if self.root_element == Some(id) {
            self.root_element = None;
        }
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Get node kind
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Check whether the node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get_node(id).is_some_and(XmlNode::is_element)
    }

    /// Get node name as string
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Get node local name (without prefix)
    pub fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        Some(super::namespace::split_qname(name).1)
    }

    /// Namespace URI of an element, if any
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.namespace_id == 0 {
            return None;
        }
        self.strings.get_str(node.namespace_id)
    }

    /// Character data of a text, CDATA, comment or PI node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get_node(id)?.text.as_deref()
    }

    /// Concatenated text of a node and all of its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.get_node(id) {
            if node.is_text() {
                out.push_str(node.text.as_deref().unwrap_or_default());
            }
        }
        for desc in self.descendants(id) {
            if let Some(node) = self.get_node(desc) {
                if node.is_text() {
                    out.push_str(node.text.as_deref().unwrap_or_default());
                }
            }
        }
        out
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        self.get_node(id)?
            .attributes
            .iter()
            .find(|a| a.name_id == name_id)
            .map(|a| a.value.as_str())
    }

    /// Check whether the element carries an attribute
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Get all attribute names and values for a node
    pub fn get_attribute_values(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.get_node(id)
            .map(|node| {
                node.attributes
                    .iter()
                    .filter_map(|attr| Some((self.strings.get_str(attr.name_id)?, attr.value.as_str())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parent node (may be the document node)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    /// Parent element (None for the root element and detached nodes)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over element children of a node
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(move |&c| self.is_element(c))
    }

    /// Iterate over all descendants of a node
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        // Initialize stack with all children in reverse order (so first is processed first)
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Add children to stack in reverse order (so first child is processed first)
        if let Some(node) = self.doc.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.doc.get_node(id).and_then(|n| n.prev_sibling);
            }
        }

        Some(current)
    }
}

// =============================================================================
// DocumentAccess trait implementation
// =============================================================================

impl DocumentAccess for Document {
    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        Document::parent_element(self, id)
    }

    fn child_elements_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.child_elements(id).collect()
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        Document::node_name(self, id)
    }

    fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        Document::get_attribute(self, id, name)
    }

    fn text_content(&self, id: NodeId) -> String {
        Document::text_content(self, id)
    }
}
