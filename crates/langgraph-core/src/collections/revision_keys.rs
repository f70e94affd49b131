//! Revision timelines.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use crate::keys::RevisionKey;

/// RevisionKeys kept sorted newest-first.
///
/// Every constructor and mutator re-establishes the ordering, so
/// `at_or_before` can stop at the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RevisionKeys {
    keys: Vec<RevisionKey>,
}

impl RevisionKeys {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RevisionKey> {
        self.keys.iter()
    }

    pub fn as_slice(&self) -> &[RevisionKey] {
        &self.keys
    }

    /// Most recent revision.
    pub fn latest(&self) -> Option<&RevisionKey> {
        self.keys.first()
    }

    /// Oldest revision.
    pub fn earliest(&self) -> Option<&RevisionKey> {
        self.keys.last()
    }

    pub fn push(&mut self, key: RevisionKey) {
        let idx = self.keys.partition_point(|k| k.timestamp >= key.timestamp);
        self.keys.insert(idx, key);
    }

    pub fn extend(&mut self, other: &RevisionKeys) {
        self.keys.extend(other.keys.iter().cloned());
        self.sort();
    }

    /// Concatenate two timelines into a new one.
    pub fn concat(&self, other: &RevisionKeys) -> RevisionKeys {
        let mut out = self.clone();
        out.extend(other);
        out
    }

    /// The revision with the greatest timestamp not exceeding `moment`.
    pub fn at_or_before(&self, moment: OffsetDateTime) -> Option<&RevisionKey> {
        self.keys.iter().find(|k| k.timestamp <= moment)
    }

    /// Every revision at or before `moment`, still newest-first.
    pub fn up_to(&self, moment: OffsetDateTime) -> RevisionKeys {
        self.keys
            .iter()
            .filter(|k| k.timestamp <= moment)
            .cloned()
            .collect()
    }

    /// Group revisions by language code.
    pub fn by_language(&self) -> BTreeMap<String, RevisionKeys> {
        let mut out: BTreeMap<String, RevisionKeys> = BTreeMap::new();
        // Already sorted, so appending keeps each group sorted.
        for key in &self.keys {
            out.entry(key.language.clone())
                .or_default()
                .keys
                .push(key.clone());
        }
        out
    }

    fn sort(&mut self) {
        // Stable: equal timestamps keep insertion order.
        self.keys.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}

impl FromIterator<RevisionKey> for RevisionKeys {
    fn from_iter<I: IntoIterator<Item = RevisionKey>>(iter: I) -> Self {
        let mut out = Self {
            keys: iter.into_iter().collect(),
        };
        out.sort();
        out
    }
}

impl IntoIterator for RevisionKeys {
    type Item = RevisionKey;
    type IntoIter = std::vec::IntoIter<RevisionKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a> IntoIterator for &'a RevisionKeys {
    type Item = &'a RevisionKey;
    type IntoIter = std::slice::Iter<'a, RevisionKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::datetime;
    use time::Duration;

    fn rev(oldid: &str, lang: &str, ts: OffsetDateTime) -> RevisionKey {
        RevisionKey::new("Cedynia", oldid, lang, ts)
    }

    #[test]
    fn collect_sorts_newest_first() {
        let keys: RevisionKeys = vec![
            rev("1", "pl", datetime!(2010-01-01 0:00 UTC)),
            rev("3", "pl", datetime!(2020-01-01 0:00 UTC)),
            rev("2", "pl", datetime!(2015-01-01 0:00 UTC)),
        ]
        .into_iter()
        .collect();
        let ids: Vec<_> = keys.iter().map(|k| k.oldid.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert_eq!(keys.latest().unwrap().oldid, "3");
        assert_eq!(keys.earliest().unwrap().oldid, "1");
    }

    #[test]
    fn selects_closest_revision_from_below() {
        let t1 = datetime!(2020-01-01 0:00 UTC);
        let t2 = datetime!(2015-01-01 0:00 UTC);
        let t3 = datetime!(2010-01-01 0:00 UTC);
        let keys: RevisionKeys = vec![rev("1", "pl", t1), rev("2", "pl", t2), rev("3", "pl", t3)]
            .into_iter()
            .collect();

        let m = datetime!(2018-06-01 0:00 UTC);
        assert_eq!(keys.at_or_before(m).unwrap().oldid, "2");
        assert_eq!(keys.at_or_before(t2).unwrap().oldid, "2");
        assert!(keys.at_or_before(datetime!(2000-01-01 0:00 UTC)).is_none());
        assert_eq!(keys.up_to(m).len(), 2);
    }

    #[test]
    fn concat_and_group_by_language() {
        let pl: RevisionKeys = vec![rev("1", "pl", datetime!(2010-01-01 0:00 UTC))]
            .into_iter()
            .collect();
        let mut de = RevisionKeys::new();
        de.push(rev("9", "de", datetime!(2012-01-01 0:00 UTC)));
        de.push(rev("8", "de", datetime!(2008-01-01 0:00 UTC)));

        let all = pl.concat(&de);
        assert_eq!(all.len(), 3);
        assert_eq!(all.latest().unwrap().oldid, "9");

        let grouped = all.by_language();
        assert_eq!(grouped.len(), 2);
        let de_ids: Vec<_> = grouped["de"].iter().map(|k| k.oldid.as_str()).collect();
        assert_eq!(de_ids, vec!["9", "8"]);
    }

    proptest! {
        #[test]
        fn at_or_before_is_max_not_exceeding(
            offsets in proptest::collection::vec(0i64..10_000, 1..40),
            probe in 0i64..10_000,
        ) {
            let base = datetime!(2001-01-15 0:00 UTC);
            let keys: RevisionKeys = offsets
                .iter()
                .enumerate()
                .map(|(i, o)| rev(&i.to_string(), "pl", base + Duration::hours(*o)))
                .collect();
            let moment = base + Duration::hours(probe);
            let expected = keys.iter().map(|k| k.timestamp).filter(|t| *t <= moment).max();
            prop_assert_eq!(keys.at_or_before(moment).map(|k| k.timestamp), expected);
        }
    }
}
