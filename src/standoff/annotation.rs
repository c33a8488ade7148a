//! Stand-off annotation records and their XML shape
//!
//! ```xml
//! <annotation xml:id="uid-…" target="<start pointer> <end pointer>">
//!   <rs ana="#category-id"/>
//! </annotation>
//! ```

use std::collections::HashMap;

use memchr::memmem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dom::{Document, DocumentAccess, NodeId};
use crate::error::{Error, Result};
use crate::pointer::Pointer;

/// Prefix that keeps generated ids valid as `xml:id`
pub const ID_PREFIX: &str = "uid-";

/// One tag of an annotation: a free label or a taxonomy term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Tag {
    pub fn label(label: impl Into<String>) -> Self {
        Tag {
            label: label.into(),
            id: None,
        }
    }

    pub fn term(label: impl Into<String>, id: impl Into<String>) -> Self {
        Tag {
            label: label.into(),
            id: Some(id.into()),
        }
    }

    /// Value written to `rs/@ana`
    pub fn ana(&self) -> String {
        match self.id.as_deref() {
            Some(id) if is_uri(id) => id.to_string(),
            Some(id) => format!("#{id}"),
            None => self.label.clone(),
        }
    }
}

/// Tag requested by a caller of `add_standoff_tag`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagSpec {
    /// Free-text label, written verbatim
    Label(String),
    /// Taxonomy term; registers a category with this id and label
    Term { label: String, id: String },
}

/// Annotation of the range between two pointers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandoffAnnotation {
    pub id: String,
    pub start: Pointer,
    pub end: Pointer,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Category id -> `catDesc` text
pub type Categories = HashMap<String, String>;

fn is_uri(value: &str) -> bool {
    memmem::find(value.as_bytes(), b"://").is_some()
}

/// `xml:id` for an annotation id; ids starting with a digit or shaped like a
/// hyphenated UUID get [`ID_PREFIX`]
pub fn xml_id(id: &str) -> String {
    let starts_with_digit = id.bytes().next().is_some_and(|b| b.is_ascii_digit());
    let is_uuid = id.len() == 36 && Uuid::try_parse(id).is_ok();
    if starts_with_digit || is_uuid {
        format!("{ID_PREFIX}{id}")
    } else {
        id.to_string()
    }
}

/// Annotation id carried by an `xml:id`
pub fn annotation_id(xml_id: &str) -> &str {
    xml_id.strip_prefix(ID_PREFIX).unwrap_or(xml_id)
}

/// Build the `annotation` element for `annotation` as a detached subtree of `doc`
pub fn annotation_to_xml(doc: &mut Document, annotation: &StandoffAnnotation, namespace: Option<&str>) -> NodeId {
    let element = doc.create_element("annotation", namespace);
    doc.set_attribute(element, "xml:id", &xml_id(&annotation.id));
    doc.set_attribute(element, "target", &format!("{} {}", annotation.start, annotation.end));
    for tag in &annotation.tags {
        let rs = doc.create_element("rs", namespace);
        doc.set_attribute(rs, "ana", &tag.ana());
        doc.append_child(element, rs);
    }
    element
}

/// Read an `annotation` element back into a record.
///
/// `rs/@ana` values naming a known category (with or without `#`) become
/// terms labelled by the category's description; anything else is kept as
/// a plain label.
pub fn xml_to_annotation<D: DocumentAccess>(doc: &D, element: NodeId, categories: &Categories) -> Result<StandoffAnnotation> {
    let id = doc
        .get_attribute(element, "xml:id")
        .ok_or_else(|| Error::MissingTarget("xml:id on annotation".into()))?;
    let target = doc
        .get_attribute(element, "target")
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::MissingTarget(format!("target on annotation '{id}'")))?;
    let (start, end) = Pointer::parse_range(target)?;

    let tags = doc
        .child_elements_vec(element)
        .into_iter()
        .filter(|&child| doc.node_name(child) == Some("rs"))
        .filter_map(|rs| doc.get_attribute(rs, "ana"))
        .map(|ana| {
            let key = ana.strip_prefix('#').unwrap_or(ana);
            match categories.get(key) {
                Some(label) => Tag::term(label.as_str(), key),
                None => Tag::label(ana),
            }
        })
        .filter(|tag| !tag.label.is_empty())
        .collect();

    Ok(StandoffAnnotation {
        id: annotation_id(id).to_string(),
        start,
        end,
        tags,
    })
}

/// Every `category[@xml:id]` with a non-empty `catDesc`, first one winning
pub fn categories<D: DocumentAccess>(doc: &D) -> Categories {
    let mut found = Categories::new();
    let Some(root) = doc.root_element_id() else {
        return found;
    };
    for category in doc.descendant_elements_vec(root) {
        if doc.node_name(category) != Some("category") {
            continue;
        }
        let Some(id) = doc.get_attribute(category, "xml:id") else {
            continue;
        };
        let description = doc
            .child_elements_vec(category)
            .into_iter()
            .find(|&child| doc.node_name(child) == Some("catDesc"))
            .map(|desc| doc.text_content(desc))
            .filter(|text| !text.is_empty());
        if let Some(description) = description {
            found.entry(id.to_string()).or_insert(description);
        }
    }
    found
}
