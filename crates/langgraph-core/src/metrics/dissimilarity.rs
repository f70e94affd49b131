//! Pairwise language dissimilarity.
//!
//! For two language roots with neighbor sets `N1`, `N2`:
//!
//! `score = (|N1 ∪ N2| - |N1 ∩ N2|) / right_node_count`
//!
//! The denominator is the number of right nodes in the whole graph, shared by
//! every pair. A graph without right nodes scores every pair 0.

use std::collections::BTreeSet;

use super::ScoreTable;
use crate::graph::{language_of_root, LangGraph};

/// Symmetric difference of two neighbor sets, normalized by `total`.
pub fn dissimilarity(set1: &BTreeSet<String>, set2: &BTreeSet<String>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let differing = set1.symmetric_difference(set2).count();
    differing as f64 / total as f64
}

/// Score every unordered pair of language roots, emitting both orderings.
pub fn calculate_dissimilarity_metrics(graph: &LangGraph) -> ScoreTable {
    let roots: Vec<(&str, &str)> = graph
        .left_nodes()
        .filter_map(|key| language_of_root(key).map(|lang| (key, lang)))
        .collect();
    let total = graph.right_node_count();
    let empty = BTreeSet::new();

    let mut table = ScoreTable::new();
    for (i, (node1, lang1)) in roots.iter().enumerate() {
        for (node2, lang2) in &roots[i + 1..] {
            let n1 = graph.neighbors(node1).unwrap_or(&empty);
            let n2 = graph.neighbors(node2).unwrap_or(&empty);
            let score = dissimilarity(n1, n2, total);
            table.insert(lang1, lang2, score);
            table.insert(lang2, lang1, score);
        }
    }
    tracing::debug!(pairs = table.len(), right_nodes = total, "dissimilarity computed");
    table
}
