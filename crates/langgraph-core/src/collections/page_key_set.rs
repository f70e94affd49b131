//! Deduplicated sets of page keys.
//!
//! A `PageKeySet` only stores identities. Every view that needs page data
//! (validity, wikibase item, revisions) resolves keys through a `PageRegistry`,
//! so two sets mentioning the same article observe the same fetched state.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::collections::RevisionKeys;
use crate::errors::LangGraphResult;
use crate::keys::PageKey;
use crate::page::context::{join_batch, FetchContext};
use crate::page::{Page, PageRegistry, PageSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageKeySet {
    keys: BTreeSet<PageKey>,
}

impl PageKeySet {
    pub fn new() -> Self {
        Self {
            keys: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &PageKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: PageKey) -> bool {
        self.keys.insert(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageKey> {
        self.keys.iter()
    }

    /// Distinct language codes mentioned by the set.
    pub fn languages(&self) -> BTreeSet<String> {
        self.keys.iter().map(|k| k.language.clone()).collect()
    }

    /// Canonical page instances for every key. No network activity.
    pub fn resolve_pages(&self, registry: &PageRegistry) -> Vec<Arc<Page>> {
        self.keys
            .iter()
            .map(|k| registry.current(&k.title, &k.language))
            .collect()
    }

    /// Keep only keys whose language is in `allowed`. An empty allow-list keeps everything.
    pub fn filter_languages<I, S>(&mut self, allowed: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: BTreeSet<String> = allowed
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if allowed.is_empty() {
            return;
        }
        self.keys.retain(|k| allowed.contains(&k.language));
    }

    /// Drop keys whose title contains `avoid` (namespace pages such as "Category:").
    pub fn filter_titles(&mut self, avoid: &str) {
        if avoid.is_empty() {
            return;
        }
        self.keys.retain(|k| !k.title.contains(avoid));
    }

    /// Fetch every resolved page as one joined batch.
    pub async fn fetch_all(&self, ctx: &FetchContext, make_unique: bool) -> LangGraphResult<()> {
        let tasks = self
            .resolve_pages(ctx.registry())
            .into_iter()
            .map(|page| {
                let ctx = ctx.clone();
                async move { page.fetch_page(&ctx, make_unique).await }
            });
        join_batch(tasks).await
    }

    /// Drop keys whose page resolved as nonexistent.
    pub fn remove_nonexistent(&mut self, registry: &PageRegistry) {
        self.keys
            .retain(|k| registry.current(&k.title, &k.language).is_valid());
    }

    /// `(wikibase_item, summary)` for every valid page that has a wikibase item.
    pub fn graph_nodes<'a>(
        &'a self,
        registry: &'a PageRegistry,
    ) -> impl Iterator<Item = (String, PageSummary)> + 'a {
        self.keys
            .iter()
            .map(move |k| registry.current(&k.title, &k.language))
            .filter(|page| page.is_valid())
            .filter_map(|page| page.wikibase_item().map(|item| (item, page.summary())))
    }

    /// `(from_node, wikibase_item)` for every valid page that has a wikibase item.
    pub fn graph_edges<'a>(
        &'a self,
        registry: &'a PageRegistry,
        from_node: &'a str,
    ) -> impl Iterator<Item = (String, String)> + 'a {
        self.graph_nodes(registry)
            .map(move |(item, _)| (from_node.to_string(), item))
    }

    /// Revision history of every resolved page, merged into one timeline.
    pub fn revisions(&self, registry: &PageRegistry) -> RevisionKeys {
        self.resolve_pages(registry)
            .iter()
            .flat_map(|page| page.revisions())
            .collect()
    }
}

impl FromIterator<PageKey> for PageKeySet {
    fn from_iter<I: IntoIterator<Item = PageKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PageKeySet {
    type Item = &'a PageKey;
    type IntoIter = std::collections::btree_set::Iter<'a, PageKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keys: &[(&str, &str)]) -> PageKeySet {
        keys.iter().map(|(t, l)| PageKey::new(*t, *l)).collect()
    }

    #[test]
    fn deduplicates_keys() {
        let s = set(&[("A", "pl"), ("A", "pl"), ("A", "en")]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn filter_languages_keeps_allowed() {
        let mut s = set(&[("A", "pl"), ("B", "en"), ("C", "de")]);
        s.filter_languages(["pl", "de"]);
        assert_eq!(s.languages().into_iter().collect::<Vec<_>>(), vec!["de", "pl"]);
    }

    #[test]
    fn empty_language_filter_is_noop() {
        let mut s = set(&[("A", "pl"), ("B", "en")]);
        s.filter_languages(Vec::<String>::new());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn filter_titles_drops_namespaces() {
        let mut s = set(&[("Kategoria:Bitwy", "pl"), ("Mieszko I", "pl"), ("Szablon:X", "pl")]);
        s.filter_titles(":");
        assert_eq!(s.len(), 1);
        assert!(s.contains(&PageKey::new("Mieszko I", "pl")));
    }

    #[test]
    fn resolve_pages_reuses_registry_instances() {
        let registry = PageRegistry::new();
        let s = set(&[("A", "pl")]);
        let first = s.resolve_pages(&registry);
        let second = s.resolve_pages(&registry);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unfetched_pages_produce_no_nodes() {
        let registry = PageRegistry::new();
        let s = set(&[("A", "pl")]);
        // No wikibase item before fetching.
        assert_eq!(s.graph_nodes(&registry).count(), 0);
    }
}
