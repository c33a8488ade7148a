//! String Interning Pool
//!
//! Deduplicated storage for element names, attribute names and namespace
//! URIs. Id 0 is reserved for the empty string.
//!
//! Uses hash-based lookup to avoid storing duplicate string data.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Entry for an interned string: (offset_in_pool_data, length)
#[derive(Debug, Clone, Copy)]
struct StringEntry(u32, u32);

/// String interning pool
///
/// Memory layout:
/// - `entries`: one entry per interned string ID
/// - `data`: buffer holding the string bytes
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug, Clone)]
pub struct StringPool {
    /// Entries indexed by string ID
    entries: Vec<StringEntry>,
    /// Buffer for string bytes
    data: String,
    /// Hash of string content -> list of IDs with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for "no string"
        pool.entries.push(StringEntry(0, 0));
        pool
    }

    /// Compute hash of a string
    #[inline]
    fn compute_hash(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);

        // Check for existing entry
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get_str(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);

        let id = self.entries.len() as u32;
        self.entries.push(StringEntry(offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Look up the id of an already interned string without inserting it
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        let ids = self.hash_index.get(&Self::compute_hash(s))?;
        ids.iter().copied().find(|&id| self.get_str(id) == Some(s))
    }

    /// Get a string by ID
    pub fn get_str(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return Some("");
        }
        let StringEntry(offset, len) = *self.entries.get(id as usize)?;
        let start = offset as usize;
        self.data.get(start..start + len as usize)
    }

    /// Get the number of unique strings stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1 // Entry 0 is reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern() {
        let mut pool = StringPool::new();
        let id = pool.intern("hello");
        assert!(id > 0);
        assert_eq!(pool.get_str(id), Some("hello"));
    }

    #[test]
    fn test_intern_duplicate() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("hello");
        let id2 = pool.intern("hello");
        assert_eq!(id1, id2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_intern_different() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("hello");
        let id2 = pool.intern("world");
        assert_ne!(id1, id2);
        assert_eq!(pool.get_str(id2), Some("world"));
    }

    #[test]
    fn test_empty_string() {
        let mut pool = StringPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get_str(0), Some(""));
    }

    #[test]
    fn test_lookup() {
        let mut pool = StringPool::new();
        let id = pool.intern("xml:id");
        assert_eq!(pool.lookup("xml:id"), Some(id));
        assert_eq!(pool.lookup("missing"), None);
        assert_eq!(pool.get_str(999), None);
    }
}
