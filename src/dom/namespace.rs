//! Namespace Resolution
//!
//! Stack-based namespace resolver used while building the arena from
//! reader events.

use super::strings::StringPool;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Split a qualified name into (prefix, local name)
#[inline]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Namespace binding (prefix -> URI)
#[derive(Debug, Clone)]
struct NsBinding {
    /// 0 for the default namespace
    prefix_id: u32,
    /// 0 when the declaration undeclares the default namespace (`xmlns=""`)
    uri_id: u32,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    /// Stack of namespace bindings
    bindings: Vec<NsBinding>,
    /// Current element depth
    depth: u16,
    xml_prefix_id: u32,
    xmlns_prefix_id: u32,
}

impl NamespaceResolver {
    /// Create a new namespace resolver with pre-declared xml and xmlns namespaces
    pub fn new(strings: &mut StringPool) -> Self {
        let xml_prefix_id = strings.intern("xml");
        let xmlns_prefix_id = strings.intern("xmlns");
        let xml_uri_id = strings.intern(ns::XML);
        let xmlns_uri_id = strings.intern(ns::XMLNS);

        NamespaceResolver {
            bindings: vec![
                NsBinding {
                    prefix_id: xml_prefix_id,
                    uri_id: xml_uri_id,
                    depth: 0,
                },
                NsBinding {
                    prefix_id: xmlns_prefix_id,
                    uri_id: xmlns_uri_id,
                    depth: 0,
                },
            ],
            depth: 0,
            xml_prefix_id,
            xmlns_prefix_id,
        }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a namespace binding for the current scope
    pub fn declare(&mut self, prefix_id: u32, uri_id: u32) {
        // Don't allow redeclaring xml or xmlns
        if prefix_id == self.xml_prefix_id || prefix_id == self.xmlns_prefix_id {
            return;
        }

        self.bindings.push(NsBinding {
            prefix_id,
            uri_id,
            depth: self.depth,
        });
    }

    /// Record any `xmlns` / `xmlns:p` declaration carried by an attribute
    pub fn declare_attribute(&mut self, strings: &mut StringPool, name: &str, value: &str) {
        let uri_id = strings.intern(value);
        if name == "xmlns" {
            self.declare(0, uri_id);
        } else if let Some(prefix) = name.strip_prefix("xmlns:") {
            let prefix_id = strings.intern(prefix);
            self.declare(prefix_id, uri_id);
        }
    }

    /// Resolve a prefix to a namespace URI ID
    pub fn resolve(&self, prefix_id: u32) -> Option<u32> {
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix_id == prefix_id)
            .map(|b| b.uri_id)
            .filter(|&uri| uri != 0)
    }

    /// Resolve the default namespace
    pub fn resolve_default(&self) -> Option<u32> {
        self.resolve(0)
    }

    /// Resolve the namespace of an element from its qualified name
    pub fn resolve_element(&self, strings: &StringPool, qname: &str) -> Option<u32> {
        match split_qname(qname) {
            (Some(prefix), _) => strings.lookup(prefix).and_then(|id| self.resolve(id)),
            (None, _) => self.resolve_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces() {
        let mut strings = StringPool::new();
        let resolver = NamespaceResolver::new(&mut strings);

        let xml_id = strings.intern("xml");
        assert_eq!(
            resolver.resolve(xml_id).and_then(|id| strings.get_str(id)),
            Some(ns::XML)
        );
        assert_eq!(resolver.resolve_default(), None);
    }

    #[test]
    fn test_scope_pop() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);

        resolver.push_scope();
        resolver.declare_attribute(&mut strings, "xmlns:foo", "http://example.com/foo");
        let prefix = strings.intern("foo");
        assert!(resolver.resolve(prefix).is_some());

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), None);
    }

    #[test]
    fn test_default_shadowing() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);

        resolver.push_scope();
        resolver.declare_attribute(&mut strings, "xmlns", "http://www.tei-c.org/ns/1.0");
        let tei = resolver.resolve_element(&strings, "TEI");
        assert!(tei.is_some());

        resolver.push_scope();
        resolver.declare_attribute(&mut strings, "xmlns", "");
        assert_eq!(resolver.resolve_element(&strings, "p"), None);

        resolver.pop_scope();
        assert_eq!(resolver.resolve_element(&strings, "p"), tei);
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("xml:id"), (Some("xml"), "id"));
        assert_eq!(split_qname("p"), (None, "p"));
    }
}
