//! Linearized Document
//!
//! Owns the arena that holds element names and attributes, the token table
//! that holds structure and text, and the options and path cache shared by
//! every operation. Edits go to the token table; the arena only ever gains
//! nodes, so element ids in the table stay valid.
//!
//! Only elements and text are linearized. Comments and processing
//! instructions inside the root element are not part of the token table
//! and are absent from [`LinearizedDocument::xml_string`].

use tracing::debug;

use crate::config::Options;
use crate::dom::{Document, DocumentAccess, NodeId};
use crate::error::{Error, Result};
use crate::linear::{rebuild, Rebuilt, TableView, Token, TokenTable};
use crate::pointer::{PathCache, Pointer};

/// XML document addressed by plain-text position
#[derive(Debug)]
pub struct LinearizedDocument {
    pub(crate) doc: Document,
    pub(crate) table: TokenTable,
    pub(crate) options: Options,
    paths: PathCache,
}

impl LinearizedDocument {
    /// Parse `xml` with default options
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with(xml, Options::default())
    }

    pub fn parse_with(xml: &str, options: Options) -> Result<Self> {
        let doc = Document::parse_with(xml, &options)?;
        Self::from_document(doc, options)
    }

    /// Flatten the root element of an already parsed document
    pub fn from_document(doc: Document, options: Options) -> Result<Self> {
        let root = doc.root_element_id().ok_or(Error::NoRootElement)?;
        let table = TokenTable::from_tree(&doc, root);
        debug!(tokens = table.len(), text_len = table.text_len(), "linearized document");
        Ok(Self::assemble(doc, table, options))
    }

    /// Adopt a prepared token sequence whose elements live in `doc`
    pub fn from_tokens(doc: Document, tokens: Vec<Token>, options: Options) -> Result<Self> {
        let table = TokenTable::new(tokens);
        table.check_invariants()?;
        if let Some(missing) = table.elements().find(|&el| !doc.is_element(el)) {
            return Err(Error::UnknownElement(missing));
        }
        Ok(Self::assemble(doc, table, options))
    }

    fn assemble(doc: Document, table: TokenTable, options: Options) -> Self {
        let paths = PathCache::new(options.pointer_cache_capacity());
        LinearizedDocument {
            doc,
            table,
            options,
            paths,
        }
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }

    pub fn tokens(&self) -> &[Token] {
        self.table.tokens()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Structure of the current token sequence
    pub fn view(&self) -> TableView<'_> {
        TableView::new(&self.table, &self.doc)
    }

    pub fn plain_text(&self) -> String {
        self.table.plain_text()
    }

    pub fn text_len(&self) -> usize {
        self.table.text_len()
    }

    /// Element opened by the first token
    pub fn root_element(&self) -> Option<NodeId> {
        self.table.elements().next()
    }

    pub fn tag_name(&self, element: NodeId) -> Option<&str> {
        self.doc.node_name(element)
    }

    pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.doc.get_attribute(element, name)
    }

    pub fn find_elements(&self, tag: &str) -> Vec<NodeId> {
        self.table.find_elements(&self.doc, tag).collect()
    }

    /// Element named `tag` with `xml:id="id"`
    pub fn element_by_id(&self, tag: &str, id: &str) -> Option<NodeId> {
        self.table.element_by_id(&self.doc, tag, id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn ancestors_at(&self, position: usize) -> Vec<NodeId> {
        self.table.ancestors_at(position)
    }

    pub fn parent_context(&self, begin: usize, end: usize, depth: Option<usize>) -> Result<Vec<NodeId>> {
        self.table.parent_context(&self.doc, begin, end, depth)
    }

    pub fn pointer_for(&self, position: usize) -> Result<Pointer> {
        self.table.pointer_for(&self.doc, position)
    }

    /// Position addressed by `path` plus `offset`
    pub fn resolve_pointer(&self, path: &str, offset: usize) -> Result<usize> {
        let expr = self.paths.get_or_compile(path)?;
        self.table.resolve_pointer(&self.doc, &expr, offset)
    }

    /// Position addressed by a `path::offset` string
    pub fn character_offset(&self, pointer: &str) -> Result<usize> {
        let pointer: Pointer = pointer.parse()?;
        self.resolve_pointer(&pointer.path, pointer.offset)
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Wrap `begin..end` in `tag` elements; see [`TokenTable::insert_inline`]
    pub fn insert_inline(&mut self, begin: usize, end: usize, tag: &str, attributes: &[(&str, &str)]) -> Result<Vec<NodeId>> {
        let namespace = self.element_namespace();
        self.table
            .insert_inline(&mut self.doc, begin, end, tag, attributes, namespace.as_deref())
    }

    pub fn remove_inline(&mut self, element: NodeId, keep_contents: bool) -> Result<()> {
        self.table.remove_inline(element, keep_contents)
    }

    /// Namespace for new elements: the root's, or the configured one without a root
    pub(crate) fn element_namespace(&self) -> Option<String> {
        match self.root_element() {
            Some(root) => self.doc.namespace_uri(root).map(str::to_string),
            None => self.options.namespace().map(str::to_string),
        }
    }

    pub(crate) fn create_element(&mut self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let namespace = self.element_namespace();
        let element = self.doc.create_element(tag, namespace.as_deref());
        for (key, value) in attributes {
            self.doc.set_attribute(element, key, value);
        }
        element
    }

    /// New element inserted as the last child of `parent`
    pub(crate) fn append_child_element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> Result<NodeId> {
        let (open, close) = self.table.span_of(parent).ok_or(Error::UnknownElement(parent))?;
        if open == close {
            return Err(Error::TableConsistency(format!(
                "<{}> is an empty token and takes no children",
                self.tag_name(parent).unwrap_or_default()
            )));
        }
        let depth = self.table.tokens()[open].depth + 1;
        let element = self.create_element(tag, attributes);
        self.table.insert_pair_at(close, element, depth)?;
        Ok(element)
    }

    /// First child element of `parent` named `tag`, created when missing
    pub(crate) fn ensure_child(&mut self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let existing = {
            let view = self.view();
            view.child_elements_vec(parent)
                .into_iter()
                .find(|&child| self.doc.node_name(child) == Some(tag))
        };
        match existing {
            Some(child) => Ok(child),
            None => self.append_child_element(parent, tag, &[]),
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Rebuild the whole token sequence as a fresh tree
    pub fn rebuild(&self) -> Result<Rebuilt> {
        rebuild(self.table.tokens(), 0..self.table.len(), &self.doc)
    }

    /// Rebuild only the subtree of `element`
    pub fn rebuild_element(&self, element: NodeId) -> Result<Rebuilt> {
        let (open, close) = self.table.span_of(element).ok_or(Error::UnknownElement(element))?;
        rebuild(self.table.tokens(), open..close + 1, &self.doc)
    }

    pub fn xml_string(&self) -> Result<String> {
        self.rebuild()?.to_xml_string()
    }

    /// Token records as a JSON array
    pub fn to_json(&self) -> Result<String> {
        self.table.to_json(&self.doc)
    }
}
