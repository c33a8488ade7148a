//! Stand-off to inline conversion

use tracing::debug;

use super::annotation::{categories, xml_to_annotation, StandoffAnnotation};
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::linearized::LinearizedDocument;

/// Whether `annotation` carries exactly one tag whose id or label is in `allowed`
pub fn is_inlinable<S: AsRef<str>>(annotation: &StandoffAnnotation, allowed: &[S]) -> bool {
    inlinable_tag_name(annotation, allowed).is_some()
}

/// Element name for the inline form of `annotation`; the tag id wins over its label
pub fn inlinable_tag_name<'a, S: AsRef<str>>(annotation: &'a StandoffAnnotation, allowed: &[S]) -> Option<&'a str> {
    let [tag] = annotation.tags.as_slice() else {
        return None;
    };
    let is_allowed = |name: &str| allowed.iter().any(|a| a.as_ref() == name);
    tag.id
        .as_deref()
        .filter(|id| is_allowed(id))
        .or_else(|| Some(tag.label.as_str()).filter(|label| is_allowed(label)))
}

impl LinearizedDocument {
    /// Replace a stand-off `annotation` element with inline markup.
    ///
    /// Both pointers are resolved against the current table, the range is
    /// wrapped in the annotation's inlinable tag and the annotation element
    /// is removed. Returns the inline elements, one per boundary segment.
    pub fn convert_to_inline(&mut self, element: NodeId) -> Result<Vec<NodeId>> {
        let name = self.tag_name(element).ok_or(Error::UnknownElement(element))?;
        if !name.eq_ignore_ascii_case("annotation") {
            return Err(Error::NotAnAnnotation(name.to_string()));
        }
        if self.table.span_of(element).is_none() {
            return Err(Error::UnknownElement(element));
        }

        let annotation = {
            let view = self.view();
            xml_to_annotation(&view, element, &categories(&view))?
        };
        let tag = inlinable_tag_name(&annotation, self.options.inlinable_tags())
            .ok_or_else(|| Error::NotInlinable(annotation.id.clone()))?
            .to_string();

        let begin = self.resolve_pointer(&annotation.start.path, annotation.start.offset)?;
        let end = self.resolve_pointer(&annotation.end.path, annotation.end.offset)?;
        let created = self.insert_inline(begin, end, &tag, &[])?;
        self.remove_inline(element, false)?;

        debug!(id = %annotation.id, tag = %tag, begin, end, "converted annotation to inline markup");
        Ok(created)
    }
}
