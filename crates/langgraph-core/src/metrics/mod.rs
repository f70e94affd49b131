//! Metrics over an assembled language graph.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

pub mod dissimilarity;

pub use dissimilarity::{calculate_dissimilarity_metrics, dissimilarity};

/// One row of a score table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub lang_1: String,
    pub lang_2: String,
    pub score: f64,
}

/// Scores indexed by (lang_1, lang_2), sorted by pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    scores: BTreeMap<(String, String), f64>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lang_1: &str, lang_2: &str, score: f64) {
        self.scores
            .insert((lang_1.to_string(), lang_2.to_string()), score);
    }

    pub fn get(&self, lang_1: &str, lang_2: &str) -> Option<f64> {
        self.scores
            .get(&(lang_1.to_string(), lang_2.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.scores
            .iter()
            .map(|((a, b), s)| (a.as_str(), b.as_str(), *s))
    }

    pub fn entries(&self) -> Vec<ScoreEntry> {
        self.iter()
            .map(|(a, b, score)| ScoreEntry {
                lang_1: a.to_string(),
                lang_2: b.to_string(),
                score,
            })
            .collect()
    }

    /// The most different pair. Ties go to the first pair in key order.
    pub fn max_pair(&self) -> Option<ScoreEntry> {
        let mut best: Option<ScoreEntry> = None;
        for (a, b, score) in self.iter() {
            if best.as_ref().map_or(true, |cur| score > cur.score) {
                best = Some(ScoreEntry {
                    lang_1: a.to_string(),
                    lang_2: b.to_string(),
                    score,
                });
            }
        }
        best
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ScoreTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_pair_prefers_first_on_ties() {
        let mut t = ScoreTable::new();
        t.insert("pl", "en", 0.4);
        t.insert("en", "pl", 0.4);
        t.insert("de", "pl", 0.1);
        let top = t.max_pair().unwrap();
        assert_eq!((top.lang_1.as_str(), top.lang_2.as_str()), ("en", "pl"));
        assert!(ScoreTable::new().max_pair().is_none());
    }

    #[test]
    fn serializes_as_rows() {
        let mut t = ScoreTable::new();
        t.insert("en", "pl", 0.25);
        let json = t.to_json();
        assert_eq!(json[0]["lang_1"], "en");
        assert_eq!(json[0]["score"], 0.25);
    }
}
