//! Document options
//!
//! Options are plain data with builder-style setters, and can also be
//! deserialized (e.g. from a JSON settings file).

use std::num::NonZeroUsize;

use serde::Deserialize;

/// TEI namespace URI
pub const TEI_NAMESPACE: &str = "http://www.tei-c.org/ns/1.0";

/// Tags that stand-off annotations may be converted into by default
pub const DEFAULT_INLINABLE_TAGS: &[&str] = &["placeName", "persName"];

const DEFAULT_POINTER_CACHE: usize = 64;

/// Options controlling parsing and element creation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Namespace given to created elements when there is no root element to inherit from
    namespace: Option<String>,

    /// Tag names an annotation may be converted into by `convert_to_inline`
    inlinable_tags: Vec<String>,

    /// Number of compiled pointer paths kept in the LRU cache
    pointer_cache_capacity: usize,

    /// Reject mismatched end tags and undecodable entities
    strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            namespace: Some(TEI_NAMESPACE.to_string()),
            inlinable_tags: DEFAULT_INLINABLE_TAGS.iter().map(|t| t.to_string()).collect(),
            pointer_cache_capacity: DEFAULT_POINTER_CACHE,
            strict: true,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON string
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Namespace for created elements (`None` creates them unqualified)
    pub fn with_namespace(mut self, namespace: Option<impl Into<String>>) -> Self {
        self.namespace = namespace.map(Into::into);
        self
    }

    /// Replace the list of inlinable tags
    pub fn with_inlinable_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inlinable_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pointer_cache_capacity(mut self, capacity: usize) -> Self {
        self.pointer_cache_capacity = capacity;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn inlinable_tags(&self) -> &[String] {
        &self.inlinable_tags
    }

    /// Cache capacity, never zero
    pub fn pointer_cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.pointer_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn strict(&self) -> bool {
        self.strict
    }
}
