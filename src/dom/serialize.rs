//! Serializer
//!
//! Writes a node and its subtree through a quick-xml [`Writer`]. Elements
//! without children are written self-closing. A default namespace
//! declaration is emitted only where an element's namespace differs from
//! the one in scope and the element does not declare it itself.

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::document::Document;
use super::namespace::split_qname;
use super::node::{NodeId, NodeKind};
use crate::error::Result;

/// Serialize `id` (element, text, or the document node) to a string
pub fn to_xml_string(doc: &Document, id: NodeId) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_node(doc, id, &mut writer, None)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node(doc: &Document, id: NodeId, writer: &mut Writer<Vec<u8>>, in_scope: Option<&str>) -> Result<()> {
    let Some(node) = doc.get_node(id) else {
        return Ok(());
    };
    let text = node.text.as_deref().unwrap_or_default();

    match node.kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, writer, in_scope)?;
            }
        }
        NodeKind::Element => write_element(doc, id, writer, in_scope)?,
        NodeKind::Text => writer.write_event(Event::Text(BytesText::new(text)))?,
        NodeKind::CData => writer.write_event(Event::CData(BytesCData::new(text)))?,
        NodeKind::Comment => writer.write_event(Event::Comment(BytesText::from_escaped(text)))?,
        NodeKind::ProcessingInstruction => {
            let target = doc.node_name(id).unwrap_or_default();
            let content = if text.is_empty() {
                target.to_string()
            } else {
                format!("{target} {text}")
            };
            writer.write_event(Event::PI(BytesText::from_escaped(content)))?;
        }
    }
    Ok(())
}

fn write_element(doc: &Document, id: NodeId, writer: &mut Writer<Vec<u8>>, in_scope: Option<&str>) -> Result<()> {
    let name = doc.node_name(id).unwrap_or_default();
    let namespace = doc.namespace_uri(id);
    let prefixed = split_qname(name).0.is_some();

    let mut start = BytesStart::new(name);
    for (key, value) in doc.get_attribute_values(id) {
        start.push_attribute((key, value));
    }

    // Default namespace in scope for the children
    let child_scope = match doc.get_attribute(id, "xmlns") {
        Some(declared) => Some(declared).filter(|d| !d.is_empty()),
        None if prefixed => in_scope,
        None => {
            if namespace != in_scope {
                start.push_attribute(("xmlns", namespace.unwrap_or_default()));
            }
            namespace
        }
    };

    if doc.get_node(id).is_some_and(|n| n.has_children()) {
        writer.write_event(Event::Start(start))?;
        for child in doc.children(id) {
            write_node(doc, child, writer, child_scope)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    } else {
        writer.write_event(Event::Empty(start))?;
    }
    Ok(())
}
