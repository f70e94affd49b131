//! Identity value types.
//!
//! - `PageKey` names an article inside one language edition, independent of revision.
//! - `RevisionKey` points at one immutable historical version of an article.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A (title, language) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey {
    pub title: String,
    pub language: String,
}

impl PageKey {
    pub fn new(title: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language: language.into(),
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.language, self.title)
    }
}

/// A (title, oldid, language, timestamp) revision pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionKey {
    pub title: String,
    pub oldid: String,
    pub language: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl RevisionKey {
    pub fn new(
        title: impl Into<String>,
        oldid: impl Into<String>,
        language: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            oldid: oldid.into(),
            language: language.into(),
            timestamp,
        }
    }

    pub fn page_key(&self) -> PageKey {
        PageKey::new(self.title.clone(), self.language.clone())
    }
}
