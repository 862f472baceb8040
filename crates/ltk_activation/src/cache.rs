//! In-memory cache of resolved asset paths.
//!
//! Keys are [`SkinChoice::composite_key`](crate::SkinChoice::composite_key)
//! strings, so a chroma or form never reuses the entry of its base skin. The
//! cache lives as long as its [`Orchestrator`](crate::Orchestrator) and is never
//! persisted: paths on disk can disappear when the user clears the mod cache
//! from settings.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ResolvedPathCache {
    entries: HashMap<String, Utf8PathBuf>,
}

impl ResolvedPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Utf8Path> {
        self.entries.get(key).map(Utf8PathBuf::as_path)
    }

    /// Record `path` for `key`, returning the path it replaced.
    pub fn put(&mut self, key: impl Into<String>, path: Utf8PathBuf) -> Option<Utf8PathBuf> {
        self.entries.insert(key.into(), path)
    }

    pub fn remove(&mut self, key: &str) -> Option<Utf8PathBuf> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let mut cache = ResolvedPathCache::new();
        assert!(cache.get("1_101").is_none());

        cache.put("1_101", Utf8PathBuf::from("/cache/1_101"));
        assert_eq!(cache.get("1_101"), Some(Utf8Path::new("/cache/1_101")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn variants_do_not_share_entries() {
        let mut cache = ResolvedPathCache::new();
        cache.put("1_101", Utf8PathBuf::from("/cache/1_101"));

        assert!(cache.get("1_101_chroma_105").is_none());
        assert!(cache.get("1_101_form_107").is_none());
    }

    #[test]
    fn put_replaces_and_clear_empties() {
        let mut cache = ResolvedPathCache::new();
        cache.put("1_101", Utf8PathBuf::from("/old"));
        let previous = cache.put("1_101", Utf8PathBuf::from("/new"));

        assert_eq!(previous, Some(Utf8PathBuf::from("/old")));
        assert_eq!(cache.get("1_101"), Some(Utf8Path::new("/new")));

        cache.clear();
        assert!(cache.is_empty());
    }
}
