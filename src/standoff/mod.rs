//! Stand-off Annotation Layer
//!
//! Annotations kept out of line in `standOff/listAnnotation`, addressing the
//! text through pointers instead of wrapping it. They can be converted to
//! inline markup once they are known not to overlap.

pub mod annotation;
pub mod inline;
pub mod taxonomy;

use tracing::debug;
use uuid::Uuid;

use crate::dom::{DocumentAccess, NodeId};
use crate::error::{Error, Result};
use crate::linear::flatten;
use crate::linearized::LinearizedDocument;

pub use annotation::{
    annotation_to_xml, categories, xml_to_annotation, Categories, StandoffAnnotation, Tag, TagSpec, ID_PREFIX,
};
pub use inline::{inlinable_tag_name, is_inlinable};

impl LinearizedDocument {
    /// `standOff[@xml:id]` with an empty `listAnnotation`.
    ///
    /// Placed after the last existing `standOff`, else after the
    /// `teiHeader`, else as the root's first child. An existing block with
    /// the same id is returned as is.
    pub fn add_standoff(&mut self, id: &str) -> Result<NodeId> {
        if let Some(existing) = self.element_by_id("standOff", id) {
            return Ok(existing);
        }
        let root = self.root_element().ok_or(Error::NoRootElement)?;

        let anchor = self
            .find_elements("standOff")
            .pop()
            .or_else(|| self.find_elements("teiHeader").pop());
        let (index, depth) = match anchor {
            Some(sibling) => {
                let (open, close) = self.table.span_of(sibling).ok_or(Error::UnknownElement(sibling))?;
                (close + 1, self.table.tokens()[open].depth)
            }
            None => {
                let (open, close) = self.table.span_of(root).ok_or(Error::UnknownElement(root))?;
                if open == close {
                    return Err(Error::TableConsistency("root element is an empty token".into()));
                }
                (open + 1, self.table.tokens()[open].depth + 1)
            }
        };

        let standoff = self.create_element("standOff", &[("xml:id", id)]);
        let list = self.create_element("listAnnotation", &[]);
        self.table.insert_pair_at(index, standoff, depth)?;
        self.table.insert_pair_at(index + 1, list, depth + 1)?;
        debug!(id, index, "added standOff");
        Ok(standoff)
    }

    /// Append `annotation` to the `listAnnotation` of standOff `standoff_id`
    pub fn add_annotation(&mut self, standoff_id: &str, annotation: &StandoffAnnotation) -> Result<NodeId> {
        let standoff = self
            .element_by_id("standOff", standoff_id)
            .ok_or_else(|| Error::MissingTarget(format!("standOff '{standoff_id}'")))?;
        let list = {
            let view = self.view();
            view.child_elements_vec(standoff)
                .into_iter()
                .find(|&child| self.doc.node_name(child) == Some("listAnnotation"))
        }
        .ok_or_else(|| Error::MissingTarget(format!("listAnnotation in standOff '{standoff_id}'")))?;

        let (open, close) = self.table.span_of(list).ok_or(Error::UnknownElement(list))?;
        if open == close {
            return Err(Error::TableConsistency(format!(
                "listAnnotation in standOff '{standoff_id}' is an empty token"
            )));
        }
        let depth = self.table.tokens()[open].depth + 1;

        let namespace = self.element_namespace();
        let element = annotation_to_xml(&mut self.doc, annotation, namespace.as_deref());
        let tokens = flatten(&self.doc, element);
        self.table.insert_tokens(close, tokens, depth)?;
        debug!(standoff = standoff_id, id = %annotation.id, "added annotation");
        Ok(element)
    }

    /// Annotations of one standOff, or of the whole document
    pub fn annotations(&self, standoff_id: Option<&str>) -> Result<Vec<StandoffAnnotation>> {
        let elements = self.annotation_elements(standoff_id)?;
        let view = self.view();
        let categories = categories(&view);
        elements
            .into_iter()
            .map(|element| xml_to_annotation(&view, element, &categories))
            .collect()
    }

    /// `annotation` elements of one standOff, or of the whole document
    pub fn annotation_elements(&self, standoff_id: Option<&str>) -> Result<Vec<NodeId>> {
        let scope: Vec<NodeId> = match standoff_id {
            Some(id) => {
                let standoff = self
                    .element_by_id("standOff", id)
                    .ok_or_else(|| Error::MissingTarget(format!("standOff '{id}'")))?;
                self.view().descendant_elements_vec(standoff)
            }
            None => self.table.elements().collect(),
        };
        Ok(scope
            .into_iter()
            .filter(|&el| self.doc.node_name(el) == Some("annotation"))
            .collect())
    }

    /// Annotate `begin..end` with one tag.
    ///
    /// Pointers are taken before anything is inserted, since a new category
    /// description moves later positions. A [`TagSpec::Term`] registers its
    /// category in taxonomy `taxonomy-<standoff_id>`.
    pub fn add_standoff_tag(&mut self, standoff_id: &str, begin: usize, end: usize, tag: TagSpec) -> Result<StandoffAnnotation> {
        if begin > end {
            return Err(Error::InvalidOffset(begin));
        }
        if self.element_by_id("standOff", standoff_id).is_none() {
            return Err(Error::MissingTarget(format!("standOff '{standoff_id}'")));
        }
        let start = self.pointer_for(begin)?;
        let end = self.pointer_for(end)?;

        let tag = match tag {
            TagSpec::Label(label) => Tag::label(label),
            TagSpec::Term { label, id } => {
                let taxonomy = format!("taxonomy-{standoff_id}");
                self.add_taxonomy(&taxonomy)?;
                self.add_category(&taxonomy, &id, &label)?;
                Tag::term(label, id)
            }
        };

        let annotation = StandoffAnnotation {
            id: Uuid::new_v4().to_string(),
            start,
            end,
            tags: vec![tag],
        };
        self.add_annotation(standoff_id, &annotation)?;
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, TEI_NAMESPACE};
    use crate::pointer::Pointer;
    use pretty_assertions::assert_eq;

    const TEI: &str = "<TEI><teiHeader><fileDesc/></teiHeader><text><body><p>Paris is lovely.</p></body></text></TEI>";

    #[test]
    fn test_add_standoff_after_header() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        let first = doc.add_standoff("so-1").unwrap();
        assert_eq!(doc.add_standoff("so-1").unwrap(), first);
        doc.add_standoff("so-2").unwrap();
        doc.table().check_invariants().unwrap();
        assert_eq!(
            doc.xml_string().unwrap(),
            concat!(
                "<TEI><teiHeader><fileDesc/></teiHeader>",
                r#"<standOff xml:id="so-1"><listAnnotation/></standOff>"#,
                r#"<standOff xml:id="so-2"><listAnnotation/></standOff>"#,
                "<text><body><p>Paris is lovely.</p></body></text></TEI>"
            )
        );
    }

    #[test]
    fn test_add_standoff_without_header() {
        let mut doc = LinearizedDocument::parse("<TEI><text><p>x</p></text></TEI>").unwrap();
        doc.add_standoff("a").unwrap();
        doc.table().check_invariants().unwrap();
        assert_eq!(
            doc.xml_string().unwrap(),
            r#"<TEI><standOff xml:id="a"><listAnnotation/></standOff><text><p>x</p></text></TEI>"#
        );
    }

    #[test]
    fn test_add_and_read_annotations() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        doc.add_standoff("so-1").unwrap();
        let annotation = StandoffAnnotation {
            id: "a1".into(),
            start: Pointer::new("//p[1]", 2),
            end: Pointer::new("//p[1]", 4),
            tags: vec![Tag::label("tag")],
        };
        let element = doc.add_annotation("so-1", &annotation).unwrap();
        doc.table().check_invariants().unwrap();

        assert_eq!(
            doc.rebuild_element(element).unwrap().to_xml_string().unwrap(),
            r#"<annotation xml:id="a1" target="//p[1]::2 //p[1]::4"><rs ana="tag"/></annotation>"#
        );
        assert_eq!(doc.annotations(Some("so-1")).unwrap(), vec![annotation.clone()]);
        assert_eq!(doc.annotations(None).unwrap(), vec![annotation.clone()]);
        assert_eq!(doc.annotation_elements(None).unwrap(), vec![element]);

        assert!(matches!(doc.add_annotation("nope", &annotation), Err(Error::MissingTarget(_))));
        assert!(matches!(doc.annotations(Some("nope")), Err(Error::MissingTarget(_))));
    }

    #[test]
    fn test_annotations_scoped_to_standoff() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        doc.add_standoff("so-1").unwrap();
        doc.add_standoff("so-2").unwrap();
        let a = doc.add_standoff_tag("so-1", 0, 5, TagSpec::Label("city".into())).unwrap();
        let b = doc.add_standoff_tag("so-2", 9, 15, TagSpec::Label("mood".into())).unwrap();

        assert_eq!(doc.annotations(Some("so-1")).unwrap(), vec![a.clone()]);
        assert_eq!(doc.annotations(Some("so-2")).unwrap(), vec![b.clone()]);
        assert_eq!(doc.annotations(None).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_add_standoff_tag_with_term() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        doc.add_standoff("so-1").unwrap();
        let annotation = doc
            .add_standoff_tag(
                "so-1",
                0,
                5,
                TagSpec::Term {
                    label: "Place".into(),
                    id: "placeName".into(),
                },
            )
            .unwrap();
        doc.table().check_invariants().unwrap();

        assert_eq!(annotation.start, Pointer::new("/TEI[1]/text[1]/body[1]/p[1]", 0));
        assert_eq!(annotation.end, Pointer::new("/TEI[1]/text[1]/body[1]/p[1]", 5));
        assert_eq!(annotation.tags, vec![Tag::term("Place", "placeName")]);
        assert!(Uuid::try_parse(&annotation.id).is_ok());

        let element = doc.annotation_elements(Some("so-1")).unwrap()[0];
        assert_eq!(
            doc.attribute(element, "xml:id").map(str::to_string),
            Some(format!("{ID_PREFIX}{}", annotation.id))
        );
        assert_eq!(doc.annotations(None).unwrap(), vec![annotation]);
        assert_eq!(doc.find_elements("category").len(), 1);
        assert!(doc.element_by_id("taxonomy", "taxonomy-so-1").is_some());
    }

    #[test]
    fn test_add_standoff_tag_errors() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        assert!(matches!(
            doc.add_standoff_tag("so-1", 0, 5, TagSpec::Label("x".into())),
            Err(Error::MissingTarget(_))
        ));
        doc.add_standoff("so-1").unwrap();
        assert!(matches!(
            doc.add_standoff_tag("so-1", 5, 0, TagSpec::Label("x".into())),
            Err(Error::InvalidOffset(5))
        ));
        assert!(matches!(
            doc.add_standoff_tag("so-1", 0, 99, TagSpec::Label("x".into())),
            Err(Error::InvalidOffset(99))
        ));
        assert!(doc.annotations(None).unwrap().is_empty());
    }

    #[test]
    fn test_convert_to_inline() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        doc.add_standoff("so-1").unwrap();
        doc.add_standoff_tag(
            "so-1",
            0,
            5,
            TagSpec::Term {
                label: "Place".into(),
                id: "placeName".into(),
            },
        )
        .unwrap();
        let element = doc.annotation_elements(None).unwrap()[0];

        let created = doc.convert_to_inline(element).unwrap();
        assert_eq!(created.len(), 1);
        doc.table().check_invariants().unwrap();
        assert!(doc.annotations(None).unwrap().is_empty());
        assert_eq!(
            doc.xml_string().unwrap(),
            concat!(
                "<TEI><teiHeader><fileDesc/><encodingDesc><classDecl>",
                r#"<taxonomy xml:id="taxonomy-so-1"><category xml:id="placeName"><catDesc>Place</catDesc></category></taxonomy>"#,
                "</classDecl></encodingDesc></teiHeader>",
                r#"<standOff xml:id="so-1"><listAnnotation/></standOff>"#,
                "<text><body><p><placeName>Paris</placeName> is lovely.</p></body></text></TEI>"
            )
        );
    }

    #[test]
    fn test_convert_to_inline_errors() {
        let mut doc = LinearizedDocument::parse(TEI).unwrap();
        doc.add_standoff("so-1").unwrap();
        doc.add_standoff_tag("so-1", 0, 5, TagSpec::Label("city".into())).unwrap();
        let element = doc.annotation_elements(None).unwrap()[0];
        assert!(matches!(doc.convert_to_inline(element), Err(Error::NotInlinable(_))));

        let p = doc.find_elements("p")[0];
        assert!(matches!(doc.convert_to_inline(p), Err(Error::NotAnAnnotation(name)) if name == "p"));

        // the same annotation converts once the label is allowed
        let options = Options::default().with_inlinable_tags(["city"]);
        let mut doc = LinearizedDocument::parse_with(TEI, options).unwrap();
        doc.add_standoff("so-1").unwrap();
        doc.add_standoff_tag("so-1", 0, 5, TagSpec::Label("city".into())).unwrap();
        let element = doc.annotation_elements(None).unwrap()[0];
        doc.convert_to_inline(element).unwrap();
        assert!(doc.xml_string().unwrap().contains("<p><city>Paris</city> is lovely.</p>"));
    }

    #[test]
    fn test_namespaced_annotation() {
        let xml = format!(r#"<TEI xmlns="{TEI_NAMESPACE}"><text><p>Rome</p></text></TEI>"#);
        let mut doc = LinearizedDocument::parse(&xml).unwrap();
        doc.add_standoff("so").unwrap();
        let annotation = doc.add_standoff_tag("so", 0, 4, TagSpec::Label("city".into())).unwrap();
        let out = doc.xml_string().unwrap();
        assert_eq!(out.matches("xmlns=").count(), 1);
        assert!(out.contains(&format!(
            r#"<annotation xml:id="{ID_PREFIX}{}" target="/TEI[1]/text[1]/p[1]::0 /TEI[1]/text[1]/p[1]::4"><rs ana="city"/></annotation>"#,
            annotation.id
        )));
    }
}
