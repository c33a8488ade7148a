//! Compiled path cache
//!
//! Pointer strings repeat heavily (every annotation of a paragraph shares
//! its path), so compiled paths are kept in a small LRU.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::trace;

use super::parser::{parse_path, PathExpr};
use crate::error::Result;

pub struct PathCache {
    inner: Mutex<LruCache<String, Arc<PathExpr>>>,
}

impl PathCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        PathCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Compiled form of `path`, compiling it on a miss
    pub fn get_or_compile(&self, path: &str) -> Result<Arc<PathExpr>> {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(expr) = cache.get(path) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(parse_path(path)?);
        trace!(path, "compiled pointer path");
        cache.put(path.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_compiled_paths() {
        let cache = PathCache::new(NonZeroUsize::new(2).unwrap());
        let first = cache.get_or_compile("//p[1]").unwrap();
        let again = cache.get_or_compile("//p[1]").unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        cache.get_or_compile("//p[2]").unwrap();
        cache.get_or_compile("//p[3]").unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get_or_compile("p").is_err());
        assert_eq!(cache.len(), 2);
    }
}
