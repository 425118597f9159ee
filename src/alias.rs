//! Path alias resolution with language fallbacks.
//!
//! When no alias exists for the requested language, the languages returned
//! by a [`FallbackCandidates`] source are tried in order and the first hit
//! wins. Hits are memoized for the lifetime of the resolver, which is one
//! request; misses are not, so a repeated miss walks the chain again.

use crate::error::{NegotiationError, NegotiationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Pseudo langcode for content without a language; never a fallback.
pub const LANGCODE_NOT_SPECIFIED: &str = "und";

/// The generic alias storage this resolver wraps.
pub trait AliasLookup: Send + Sync {
    /// System path for an alias in the given language.
    fn path_by_alias(&self, alias: &str, langcode: &str) -> Option<String>;

    /// Alias for a system path in the given language.
    fn alias_by_path(&self, path: &str, langcode: &str) -> Option<String>;
}

/// Source of ordered fallback langcodes for a langcode.
pub trait FallbackCandidates: Send + Sync {
    fn fallback_candidates(&self, langcode: &str) -> Vec<String>;
}

/// A stored alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAlias {
    /// System path, e.g. `/node/5`
    pub path: String,
    /// Pretty path, e.g. `/about-us`
    pub alias: String,
    pub langcode: String,
}

impl PathAlias {
    pub fn new(path: &str, alias: &str, langcode: &str) -> Self {
        Self {
            path: path.to_string(),
            alias: alias.to_string(),
            langcode: langcode.to_string(),
        }
    }
}

/// Alias storage held in memory. Later entries shadow earlier ones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAliasStore {
    aliases: Vec<PathAlias>,
}

impl InMemoryAliasStore {
    pub fn new(aliases: Vec<PathAlias>) -> Self {
        Self { aliases }
    }

    /// Load a JSON array of aliases.
    pub fn from_json_file(path: &Path) -> NegotiationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| NegotiationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let aliases = serde_json::from_str(&content).map_err(|source| NegotiationError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(aliases))
    }

    pub fn insert(&mut self, alias: PathAlias) {
        self.aliases.push(alias);
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl AliasLookup for InMemoryAliasStore {
    fn path_by_alias(&self, alias: &str, langcode: &str) -> Option<String> {
        self.aliases
            .iter()
            .rev()
            .find(|entry| entry.alias == alias && entry.langcode == langcode)
            .map(|entry| entry.path.clone())
    }

    fn alias_by_path(&self, path: &str, langcode: &str) -> Option<String> {
        self.aliases
            .iter()
            .rev()
            .find(|entry| entry.path == path && entry.langcode == langcode)
            .map(|entry| entry.alias.clone())
    }
}

/// Fallback to the site languages in weight order, then `und`.
#[derive(Debug, Clone)]
pub struct SiteLanguageFallbacks {
    langcodes: Vec<String>,
}

impl SiteLanguageFallbacks {
    pub fn new(langcodes: Vec<String>) -> Self {
        Self { langcodes }
    }
}

impl FallbackCandidates for SiteLanguageFallbacks {
    fn fallback_candidates(&self, _langcode: &str) -> Vec<String> {
        let mut candidates = self.langcodes.clone();
        candidates.push(LANGCODE_NOT_SPECIFIED.to_string());
        candidates
    }
}

/// Per-request alias resolver that falls back across languages.
pub struct FallbackAliasResolver<'a> {
    store: &'a dyn AliasLookup,
    candidates: &'a dyn FallbackCandidates,
    use_fallback: bool,
    // langcode -> system path -> alias
    lookup_map: HashMap<String, HashMap<String, String>>,
    // langcode -> alias -> system path
    reverse_map: HashMap<String, HashMap<String, String>>,
}

impl<'a> FallbackAliasResolver<'a> {
    pub fn new(
        store: &'a dyn AliasLookup,
        candidates: &'a dyn FallbackCandidates,
        use_fallback: bool,
    ) -> Self {
        Self {
            store,
            candidates,
            use_fallback,
            lookup_map: HashMap::new(),
            reverse_map: HashMap::new(),
        }
    }

    /// System path for `alias`, or `alias` itself when nothing matches.
    pub fn resolve_path(&mut self, alias: &str, langcode: &str) -> String {
        if let Some(path) = self.memoized_path(alias, langcode) {
            return path;
        }

        if let Some(path) = self.store.path_by_alias(alias, langcode) {
            self.remember(langcode, &path, alias);
            return path;
        }

        if !self.use_fallback {
            return alias.to_string();
        }

        for candidate in self.fallback_langcodes(langcode) {
            if let Some(path) = self.store.path_by_alias(alias, &candidate) {
                debug!(
                    "Resolved alias {} via fallback language {} (requested {})",
                    alias, candidate, langcode
                );
                self.remember(&candidate, &path, alias);
                return path;
            }
        }

        alias.to_string()
    }

    /// Alias for `path`, or `path` itself when nothing matches.
    pub fn resolve_alias(&mut self, path: &str, langcode: &str) -> String {
        if let Some(alias) = self
            .lookup_map
            .get(langcode)
            .and_then(|paths| paths.get(path))
        {
            return alias.clone();
        }

        if let Some(alias) = self.store.alias_by_path(path, langcode) {
            self.remember(langcode, path, &alias);
            return alias;
        }

        if !self.use_fallback {
            return path.to_string();
        }

        for candidate in self.fallback_langcodes(langcode) {
            if let Some(alias) = self.store.alias_by_path(path, &candidate) {
                debug!(
                    "Resolved path {} via fallback language {} (requested {})",
                    path, candidate, langcode
                );
                self.remember(&candidate, path, &alias);
                return alias;
            }
        }

        path.to_string()
    }

    fn fallback_langcodes(&self, langcode: &str) -> Vec<String> {
        self.candidates
            .fallback_candidates(langcode)
            .into_iter()
            .filter(|candidate| candidate != LANGCODE_NOT_SPECIFIED)
            .collect()
    }

    fn memoized_path(&self, alias: &str, langcode: &str) -> Option<String> {
        self.reverse_map
            .get(langcode)
            .and_then(|aliases| aliases.get(alias))
            .cloned()
    }

    fn remember(&mut self, langcode: &str, path: &str, alias: &str) {
        self.lookup_map
            .entry(langcode.to_string())
            .or_default()
            .insert(path.to_string(), alias.to_string());
        self.reverse_map
            .entry(langcode.to_string())
            .or_default()
            .insert(alias.to_string(), path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts backend queries.
    struct CountingStore {
        inner: InMemoryAliasStore,
        queries: AtomicUsize,
    }

    impl CountingStore {
        fn new(aliases: Vec<PathAlias>) -> Self {
            Self {
                inner: InMemoryAliasStore::new(aliases),
                queries: AtomicUsize::new(0),
            }
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::Relaxed)
        }
    }

    impl AliasLookup for CountingStore {
        fn path_by_alias(&self, alias: &str, langcode: &str) -> Option<String> {
            self.queries.fetch_add(1, Ordering::Relaxed);
            self.inner.path_by_alias(alias, langcode)
        }

        fn alias_by_path(&self, path: &str, langcode: &str) -> Option<String> {
            self.queries.fetch_add(1, Ordering::Relaxed);
            self.inner.alias_by_path(path, langcode)
        }
    }

    /// French falls back to German, then English.
    struct FixedFallbacks;

    impl FallbackCandidates for FixedFallbacks {
        fn fallback_candidates(&self, langcode: &str) -> Vec<String> {
            match langcode {
                "fr" => vec!["und".to_string(), "de".to_string(), "en".to_string()],
                _ => vec!["en".to_string()],
            }
        }
    }

    fn aliases() -> Vec<PathAlias> {
        vec![
            PathAlias::new("/node/5", "/de-alias", "de"),
            PathAlias::new("/node/5", "/en-alias", "en"),
            PathAlias::new("/node/6", "/seite", "de"),
            PathAlias::new("/node/7", "/page", "fr"),
        ]
    }

    // ==================== resolve_alias Tests ====================

    #[test]
    fn test_direct_alias_wins() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);
        assert_eq!(resolver.resolve_alias("/node/7", "fr"), "/page");
        assert_eq!(resolver.resolve_alias("/node/5", "en"), "/en-alias");
    }

    #[test]
    fn test_alias_falls_back_in_candidate_order() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);
        assert_eq!(resolver.resolve_alias("/node/5", "fr"), "/de-alias");
    }

    #[test]
    fn test_alias_miss_returns_path() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);
        assert_eq!(resolver.resolve_alias("/node/99", "fr"), "/node/99");
        // German-only alias is not reachable from Dutch, which falls back to English.
        assert_eq!(resolver.resolve_alias("/node/6", "nl"), "/node/6");
    }

    #[test]
    fn test_alias_fallback_disabled() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, false);
        assert_eq!(resolver.resolve_alias("/node/5", "fr"), "/node/5");
        assert_eq!(resolver.resolve_alias("/node/7", "fr"), "/page");
    }

    #[test]
    fn test_not_specified_is_never_queried() {
        let store = InMemoryAliasStore::new(vec![PathAlias::new("/node/8", "/neutral", "und")]);
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);
        assert_eq!(resolver.resolve_alias("/node/8", "fr"), "/node/8");
    }

    // ==================== resolve_path Tests ====================

    #[test]
    fn test_path_falls_back() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);
        assert_eq!(resolver.resolve_path("/seite", "fr"), "/node/6");
        assert_eq!(resolver.resolve_path("/en-alias", "fr"), "/node/5");
    }

    #[test]
    fn test_path_miss_returns_alias() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);
        assert_eq!(resolver.resolve_path("/missing", "fr"), "/missing");
    }

    #[test]
    fn test_path_fallback_disabled() {
        let store = InMemoryAliasStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, false);
        assert_eq!(resolver.resolve_path("/seite", "fr"), "/seite");
    }

    // ==================== Memoization Tests ====================

    #[test]
    fn test_fallback_hit_is_memoized_for_candidate() {
        let store = CountingStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);

        assert_eq!(resolver.resolve_alias("/node/5", "fr"), "/de-alias");
        let after_walk = store.queries();
        assert_eq!(after_walk, 2); // fr, then de

        // The hit was recorded under German, in both directions.
        assert_eq!(resolver.resolve_alias("/node/5", "de"), "/de-alias");
        assert_eq!(resolver.resolve_path("/de-alias", "de"), "/node/5");
        assert_eq!(store.queries(), after_walk);
    }

    #[test]
    fn test_misses_walk_the_chain_again() {
        let store = CountingStore::new(aliases());
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);

        resolver.resolve_alias("/node/99", "fr");
        let first = store.queries();
        resolver.resolve_alias("/node/99", "fr");
        assert_eq!(store.queries(), first * 2);
    }

    #[test]
    fn test_shared_alias_memo_is_deterministic() {
        let store = CountingStore::new(vec![
            PathAlias::new("/node/1", "/shared", "en"),
            PathAlias::new("/node/2", "/shared", "en"),
        ]);
        let mut resolver = FallbackAliasResolver::new(&store, &FixedFallbacks, true);

        assert_eq!(resolver.resolve_alias("/node/1", "en"), "/shared");
        assert_eq!(resolver.resolve_alias("/node/2", "en"), "/shared");
        let queries = store.queries();

        // The most recently recorded path answers, without a backend query.
        for _ in 0..10 {
            assert_eq!(resolver.resolve_path("/shared", "en"), "/node/2");
        }
        assert_eq!(store.queries(), queries);
    }

    // ==================== Store Tests ====================

    #[test]
    fn test_in_memory_store_later_entries_shadow() {
        let mut store = InMemoryAliasStore::new(aliases());
        store.insert(PathAlias::new("/node/5", "/neu", "de"));
        assert_eq!(store.alias_by_path("/node/5", "de").as_deref(), Some("/neu"));
        assert_eq!(store.path_by_alias("/de-alias", "de").as_deref(), Some("/node/5"));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_site_language_fallbacks() {
        let fallbacks = SiteLanguageFallbacks::new(vec!["en".to_string(), "de".to_string()]);
        assert_eq!(fallbacks.fallback_candidates("fr"), vec!["en", "de", "und"]);
    }

    #[test]
    fn test_store_from_json_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"path": "/node/1", "alias": "/home", "langcode": "en"}}]"#)
            .expect("write aliases");
        let store = InMemoryAliasStore::from_json_file(file.path()).expect("load aliases");
        assert_eq!(store.path_by_alias("/home", "en").as_deref(), Some("/node/1"));
    }
}
