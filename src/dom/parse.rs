//! Arena builder
//!
//! Drives a quick-xml event reader and assembles a [`Document`]. Only the
//! document element and its content are kept; the XML declaration, doctype
//! and whitespace outside the root element are dropped.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use tracing::warn;

use super::document::{Document, DOCUMENT_NODE};
use super::namespace::NamespaceResolver;
use super::node::{NodeId, XmlNode};
use crate::config::Options;
use crate::error::{Error, Result};

/// Parse `input` into a new document
pub fn parse(input: &str, options: &Options) -> Result<Document> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(false);
    reader.check_end_names(options.strict());

    let mut builder = Builder::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let id = builder.open_element(&e)?;
                builder.stack.push(id);
            }
            Event::Empty(e) => {
                builder.open_element(&e)?;
                builder.ns.pop_scope();
            }
            Event::End(_) => {
                if builder.stack.pop().is_some() {
                    builder.ns.pop_scope();
                }
            }
            Event::Text(e) => {
                let text = decode_text(&e, options.strict())?;
                builder.push_text(XmlNode::text(text));
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned())?;
                builder.push_text(XmlNode::cdata(text));
            }
            Event::Comment(e) => {
                let text = std::str::from_utf8(&e)?.to_string();
                builder.push_child(XmlNode::comment(text));
            }
            Event::PI(e) => {
                let raw = std::str::from_utf8(&e)?;
                let (target, data) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
                let name_id = builder.doc.intern(target);
                builder.push_child(XmlNode::processing_instruction(name_id, data.trim_start()));
            }
            Event::Eof => break,
            // declaration and doctype
            _ => {}
        }
    }

    if !builder.stack.is_empty() {
        if options.strict() {
            return Err(Error::Malformed(format!("{} unclosed element(s)", builder.stack.len())));
        }
        warn!(open = builder.stack.len(), "document ended with unclosed elements");
    }
    if builder.doc.root_element_id().is_none() {
        return Err(Error::NoRootElement);
    }
    Ok(builder.doc)
}

fn decode_text(e: &BytesText<'_>, strict: bool) -> Result<String> {
    match e.unescape() {
        Ok(text) => Ok(text.into_owned()),
        Err(err) if !strict => {
            warn!(%err, "keeping undecodable text verbatim");
            Ok(std::str::from_utf8(e)?.to_string())
        }
        Err(err) => Err(err.into()),
    }
}

struct Builder {
    doc: Document,
    ns: NamespaceResolver,
    stack: Vec<NodeId>,
}

impl Builder {
    fn new() -> Self {
        let mut doc = Document::new();
        let ns = NamespaceResolver::new(doc.strings_mut());
        Builder {
            doc,
            ns,
            stack: Vec::with_capacity(32),
        }
    }

    #[inline]
    fn current_parent(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(DOCUMENT_NODE)
    }

    /// Create an element for a start/empty tag and attach it; pushes a namespace scope
    fn open_element(&mut self, e: &BytesStart<'_>) -> Result<NodeId> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();

        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }

        self.ns.push_scope();
        for (key, value) in &attrs {
            self.ns.declare_attribute(self.doc.strings_mut(), key, value);
        }
        let namespace_id = self.ns.resolve_element(self.doc.strings(), &name).unwrap_or(0);

        let name_id = self.doc.intern(&name);
        let id = self.doc.add_node(XmlNode::element(name_id, namespace_id));
        for (key, value) in &attrs {
            self.doc.set_attribute(id, key, value);
        }
        let parent = self.current_parent();
        self.doc.append_child(parent, id);
        Ok(id)
    }

    /// Attach character data; text outside the root element is dropped
    fn push_text(&mut self, node: XmlNode) {
        if self.stack.is_empty() || node.text.as_deref().is_none_or(str::is_empty) {
            return;
        }
        self.push_child(node);
    }

    fn push_child(&mut self, node: XmlNode) {
        if self.stack.is_empty() {
            return;
        }
        let parent = self.current_parent();
        let id = self.doc.add_node(node);
        self.doc.append_child(parent, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse("<root>hello</root>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("root"));
        assert_eq!(doc.text_content(root), "hello");
    }

    #[test]
    fn test_parse_nested() {
        let doc = Document::parse("<a><b><c/></b>tail</a>").unwrap();
        let root = doc.root_element_id().unwrap();
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.node_name(children[0]), Some("b"));
        assert_eq!(doc.kind(children[1]), Some(NodeKind::Text));
    }

    #[test]
    fn test_entities_and_attributes() {
        let doc = Document::parse(r#"<p xml:id="p1" rend="a &amp; b">x &lt; y</p>"#).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.get_attribute(root, "xml:id"), Some("p1"));
        assert_eq!(doc.get_attribute(root, "rend"), Some("a & b"));
        assert_eq!(doc.text_content(root), "x < y");
    }

    #[test]
    fn test_default_namespace() {
        let doc = Document::parse(r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><text/></TEI>"#).unwrap();
        let root = doc.root_element_id().unwrap();
        let text = doc.child_elements(root).next().unwrap();
        assert_eq!(doc.namespace_uri(text), Some("http://www.tei-c.org/ns/1.0"));
        // the declaration itself stays an ordinary attribute
        assert_eq!(doc.get_attribute(root, "xmlns"), Some("http://www.tei-c.org/ns/1.0"));
    }

    #[test]
    fn test_prolog_is_dropped() {
        let doc = Document::parse("<?xml version=\"1.0\"?>\n<!-- c -->\n<root><!-- inner --></root>\n").unwrap();
        let root = doc.root_element_id().unwrap();
        let kinds: Vec<_> = doc.children(root).filter_map(|c| doc.kind(c)).collect();
        assert_eq!(kinds, vec![NodeKind::Comment]);
    }

    #[test]
    fn test_cdata() {
        let doc = Document::parse("<root><![CDATA[a < b]]></root>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.text_content(root), "a < b");
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(Document::parse("<a><b></a></b>").is_err());
        let lenient = Options::default().with_strict(false);
        assert!(Document::parse_with("<a><b></a>", &lenient).is_ok());
    }

    #[test]
    fn test_no_root() {
        assert!(matches!(Document::parse("   "), Err(Error::NoRootElement)));
    }
}
