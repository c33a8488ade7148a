//! Taxonomies
//!
//! `teiHeader/encodingDesc/classDecl/taxonomy[@xml:id]/category[@xml:id]/catDesc`,
//! created on demand. Ids are looked up before anything is inserted.

use tracing::debug;

use crate::dom::{DocumentAccess, NodeId};
use crate::error::{Error, Result};
use crate::linearized::LinearizedDocument;

impl LinearizedDocument {
    /// Taxonomy with `xml:id="id"`, created with any missing header containers
    pub fn add_taxonomy(&mut self, id: &str) -> Result<NodeId> {
        if let Some(existing) = self.element_by_id("taxonomy", id) {
            return Ok(existing);
        }
        let header = self.ensure_header()?;
        let encoding = self.ensure_child(header, "encodingDesc")?;
        let class_decl = self.ensure_child(encoding, "classDecl")?;
        let taxonomy = self.append_child_element(class_decl, "taxonomy", &[("xml:id", id)])?;
        debug!(id, "added taxonomy");
        Ok(taxonomy)
    }

    /// Category `id` described by `label` in taxonomy `taxonomy_id`.
    ///
    /// The description is document text, so every later position moves by
    /// its length.
    pub fn add_category(&mut self, taxonomy_id: &str, id: &str, label: &str) -> Result<NodeId> {
        let taxonomy = self
            .element_by_id("taxonomy", taxonomy_id)
            .ok_or_else(|| Error::MissingTarget(format!("taxonomy '{taxonomy_id}'")))?;
        if let Some(existing) = self.element_by_id("category", id) {
            return Ok(existing);
        }

        let category = self.append_child_element(taxonomy, "category", &[("xml:id", id)])?;
        let description = self.append_child_element(category, "catDesc", &[])?;
        let (open, close) = self
            .table
            .span_of(description)
            .ok_or(Error::UnknownElement(description))?;
        let depth = self.table.tokens()[open].depth + 1;
        self.table.insert_text(close, label, depth)?;
        debug!(taxonomy = taxonomy_id, id, label, "added category");
        Ok(category)
    }

    /// `teiHeader` of the root, inserted as its first child when missing
    fn ensure_header(&mut self) -> Result<NodeId> {
        let root = self.root_element().ok_or(Error::NoRootElement)?;
        let existing = {
            let view = self.view();
            view.child_elements_vec(root)
                .into_iter()
                .find(|&child| self.doc.node_name(child) == Some("teiHeader"))
        };
        if let Some(header) = existing {
            return Ok(header);
        }

        let (open, close) = self.table.span_of(root).ok_or(Error::UnknownElement(root))?;
        if open == close {
            return Err(Error::TableConsistency("root element is an empty token".into()));
        }
        let depth = self.table.tokens()[open].depth + 1;
        let header = self.create_element("teiHeader", &[]);
        self.table.insert_pair_at(open + 1, header, depth)?;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TEI_NAMESPACE;
    use pretty_assertions::assert_eq;

    fn subtree(doc: &LinearizedDocument, element: NodeId) -> String {
        doc.rebuild_element(element).unwrap().to_xml_string().unwrap()
    }

    #[test]
    fn test_add_taxonomy_creates_header() {
        let mut doc = LinearizedDocument::parse("<TEI><text><p>Paris</p></text></TEI>").unwrap();
        doc.add_taxonomy("taxonomy-1").unwrap();
        doc.table().check_invariants().unwrap();

        let header = doc.find_elements("teiHeader")[0];
        assert_eq!(
            subtree(&doc, header),
            r#"<teiHeader><encodingDesc><classDecl><taxonomy xml:id="taxonomy-1"/></classDecl></encodingDesc></teiHeader>"#
        );
        assert_eq!(
            doc.xml_string().unwrap(),
            r#"<TEI><teiHeader><encodingDesc><classDecl><taxonomy xml:id="taxonomy-1"/></classDecl></encodingDesc></teiHeader><text><p>Paris</p></text></TEI>"#
        );
    }

    #[test]
    fn test_add_taxonomy_is_idempotent() {
        let mut doc = LinearizedDocument::parse("<TEI><teiHeader><fileDesc/></teiHeader><text/></TEI>").unwrap();
        let first = doc.add_taxonomy("t").unwrap();
        let second = doc.add_taxonomy("t").unwrap();
        assert_eq!(first, second);
        doc.add_taxonomy("u").unwrap();
        assert_eq!(doc.find_elements("taxonomy").len(), 2);
        assert_eq!(doc.find_elements("classDecl").len(), 1);
        assert_eq!(doc.find_elements("teiHeader").len(), 1);
        doc.table().check_invariants().unwrap();
    }

    #[test]
    fn test_add_category() {
        let mut doc = LinearizedDocument::parse("<TEI><text><p>Paris</p></text></TEI>").unwrap();
        doc.add_taxonomy("taxonomy-1").unwrap();
        let category = doc.add_category("taxonomy-1", "placeName", "Place").unwrap();
        assert_eq!(doc.add_category("taxonomy-1", "placeName", "Place").unwrap(), category);
        doc.table().check_invariants().unwrap();

        assert_eq!(
            subtree(&doc, category),
            r#"<category xml:id="placeName"><catDesc>Place</catDesc></category>"#
        );
        assert_eq!(doc.plain_text(), "PlaceParis");
        assert_eq!(doc.character_offset("/TEI[1]/text[1]/p[1]::0").unwrap(), 5);

        assert!(matches!(
            doc.add_category("missing", "x", "X"),
            Err(Error::MissingTarget(_))
        ));
    }

    #[test]
    fn test_namespaced_header() {
        let xml = format!(r#"<TEI xmlns="{TEI_NAMESPACE}"><text><p>Paris</p></text></TEI>"#);
        let mut doc = LinearizedDocument::parse(&xml).unwrap();
        doc.add_taxonomy("t").unwrap();
        assert_eq!(
            doc.xml_string().unwrap(),
            format!(
                r#"<TEI xmlns="{TEI_NAMESPACE}"><teiHeader><encodingDesc><classDecl><taxonomy xml:id="t"/></classDecl></encodingDesc></teiHeader><text><p>Paris</p></text></TEI>"#
            )
        );
    }
}
