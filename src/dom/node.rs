//! XML Node representation
//!
//! Uses NodeId (u32) for compact, stable node references. Ids are never
//! reused, so a token holding an id keeps pointing at the same element for
//! the lifetime of the document.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node and detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the qualified name (elements, PIs), or 0
    pub name_id: u32,
    /// Index into string pool for namespace URI, or 0
    pub namespace_id: u32,
    /// Attributes in document order (elements only)
    pub attributes: Vec<XmlAttribute>,
    /// Character data (text, CDATA, comment, PI content)
    pub text: Option<String>,
}

impl XmlNode {
    fn with_kind(kind: NodeKind) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            namespace_id: 0,
            attributes: Vec::new(),
            text: None,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Create a new, detached element node
    pub fn element(name_id: u32, namespace_id: u32) -> Self {
        XmlNode {
            name_id,
            namespace_id,
            ..Self::with_kind(NodeKind::Element)
        }
    }

    /// Create a new, detached text node
    pub fn text(content: impl Into<String>) -> Self {
        XmlNode {
            text: Some(content.into()),
            ..Self::with_kind(NodeKind::Text)
        }
    }

    /// Create a new CDATA node
    pub fn cdata(content: impl Into<String>) -> Self {
        XmlNode {
            text: Some(content.into()),
            ..Self::with_kind(NodeKind::CData)
        }
    }

    /// Create a new comment node
    pub fn comment(content: impl Into<String>) -> Self {
        XmlNode {
            text: Some(content.into()),
            ..Self::with_kind(NodeKind::Comment)
        }
    }

    /// Create a processing instruction node
    pub fn processing_instruction(name_id: u32, content: impl Into<String>) -> Self {
        XmlNode {
            name_id,
            text: Some(content.into()),
            ..Self::with_kind(NodeKind::ProcessingInstruction)
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text or CDATA node
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Index into string pool for the qualified attribute name
    pub name_id: u32,
    /// Decoded attribute value
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name_id: u32, value: impl Into<String>) -> Self {
        XmlAttribute {
            name_id,
            value: value.into(),
        }
    }
}
