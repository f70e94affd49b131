//! Page identity registry.
//!
//! Every `Page` is created through a `PageRegistry`, which hands out exactly one
//! `Arc<Page>` per identity tuple. Redirect aliases are registered here too, so
//! a lookup under an alias title returns the canonical instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use time::OffsetDateTime;

use super::Page;
use crate::keys::{PageKey, RevisionKey};

/// (title, language, revision, timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageIdentity {
    pub title: String,
    pub language: String,
    pub revision: Option<String>,
    pub timestamp: Option<OffsetDateTime>,
}

impl PageIdentity {
    /// The current version of an article.
    pub fn current(title: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language: language.into(),
            revision: None,
            timestamp: None,
        }
    }

    /// One historical revision of an article.
    pub fn historical(rev: &RevisionKey) -> Self {
        Self {
            title: rev.title.clone(),
            language: rev.language.clone(),
            revision: Some(rev.oldid.clone()),
            timestamp: Some(rev.timestamp),
        }
    }

    /// Same language/revision/timestamp under another title.
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    pub fn is_historical(&self) -> bool {
        self.revision.is_some()
    }

    pub fn page_key(&self) -> PageKey {
        PageKey::new(self.title.clone(), self.language.clone())
    }
}

impl fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.language, self.title)?;
        if let Some(rev) = &self.revision {
            write!(f, "@{rev}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: Mutex<HashMap<PageIdentity, Arc<Page>>>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical page for `identity`, created on first reference.
    pub fn page(&self, identity: PageIdentity) -> Arc<Page> {
        let mut pages = self.pages.lock();
        pages
            .entry(identity)
            .or_insert_with_key(|id| Arc::new(Page::new(id.clone())))
            .clone()
    }

    pub fn current(&self, title: &str, language: &str) -> Arc<Page> {
        self.page(PageIdentity::current(title, language))
    }

    pub fn historical(&self, rev: &RevisionKey) -> Arc<Page> {
        self.page(PageIdentity::historical(rev))
    }

    /// Lookup without creating.
    pub fn lookup(&self, identity: &PageIdentity) -> Option<Arc<Page>> {
        self.pages.lock().get(identity).cloned()
    }

    /// Make `alias` resolve to `page` from now on.
    ///
    /// Returns false when the alias already pointed at `page`.
    pub fn register_alias(&self, alias: PageIdentity, page: &Arc<Page>) -> bool {
        let mut pages = self.pages.lock();
        match pages.insert(alias, Arc::clone(page)) {
            Some(previous) => !Arc::ptr_eq(&previous, page),
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn same_identity_same_instance() {
        let reg = PageRegistry::new();
        let a = reg.current("Cedynia", "pl");
        let b = reg.current("Cedynia", "pl");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn revision_is_part_of_identity() {
        let reg = PageRegistry::new();
        let rev = RevisionKey::new("Cedynia", "100", "pl", datetime!(2012-03-04 5:06 UTC));
        let current = reg.current("Cedynia", "pl");
        let old = reg.historical(&rev);
        assert!(!Arc::ptr_eq(&current, &old));
        assert!(Arc::ptr_eq(&old, &reg.historical(&rev)));
    }

    #[test]
    fn aliases_resolve_to_canonical_page() {
        let reg = PageRegistry::new();
        let canonical = reg.current("Bitwa pod Cedynią", "pl");
        let alias = PageIdentity::current("Bitwa cedyńska", "pl");
        assert!(reg.register_alias(alias.clone(), &canonical));
        assert!(!reg.register_alias(alias.clone(), &canonical));
        assert!(Arc::ptr_eq(&reg.page(alias), &canonical));
    }
}
