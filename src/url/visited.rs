use crate::url::ResolvedUrl;
use std::collections::HashSet;

/// Per-run deduplication state over resolved URLs
///
/// The set only grows. A URL is admitted exactly once: the first
/// [`VisitedSet::insert`] returns `true`, every later one returns `false`.
/// Fragments are ignored, so `/page#a` and `/page#b` count as one URL.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<ResolvedUrl>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited; returns true if it was not seen before
    pub fn insert(&mut self, url: &ResolvedUrl) -> bool {
        self.seen.insert(url.without_fragment())
    }

    /// Returns true if `url` has already been admitted
    pub fn contains(&self, url: &ResolvedUrl) -> bool {
        self.seen.contains(&url.without_fragment())
    }

    /// Number of distinct URLs admitted so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing has been admitted yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::resolve;

    fn url(s: &str) -> ResolvedUrl {
        resolve(s, "https://x.com/").into_resolved().unwrap()
    }

    #[test]
    fn test_insert_once() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(&url("/a")));
        assert!(!visited.insert(&url("/a")));
        assert!(visited.contains(&url("https://x.com/a")));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_fragments_collapse() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(&url("/a#one")));
        assert!(!visited.insert(&url("/a#two")));
        assert!(!visited.insert(&url("/a")));
    }

    #[test]
    fn test_relative_forms_collapse() {
        let mut visited = VisitedSet::new();
        let base = "https://x.com/docs/editor/";
        let a = resolve("../intro", base).into_resolved().unwrap();
        let b = resolve("/docs/intro", base).into_resolved().unwrap();
        assert!(visited.insert(&a));
        assert!(!visited.insert(&b));
    }

    #[test]
    fn test_empty() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(!visited.contains(&url("/a")));
    }
}
