//! The language graph.
//!
//! An undirected graph keyed by wikibase item. Nodes carry a `PageSummary`.
//!
//! Partition:
//! - left nodes (language roots) contain `LANGUAGE_SEPARATOR` in their key
//! - right nodes (linked articles) never do
//!
//! Rules:
//! - adding an existing node keeps the first summary
//! - adding an edge creates missing endpoints with an empty summary
//! - self-loops are ignored
//!
//! Ordered maps keep iteration and JSON export deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::page::PageSummary;
use crate::{LANGUAGE_SEPARATOR, TIMESTAMP_SEPARATOR};

pub mod assembly;

pub use assembly::{generate_lang_graph, generate_lang_graph_at};

/// Which side of the bipartite layout a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn of(key: &str) -> Self {
        if is_language_root(key) {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// True when `key` names a language-root node.
pub fn is_language_root(key: &str) -> bool {
    key.contains(LANGUAGE_SEPARATOR)
}

/// Language code of a language-root key: text after the language separator,
/// up to the timestamp separator if one follows.
pub fn language_of_root(key: &str) -> Option<&str> {
    let (_, rest) = key.rsplit_once(LANGUAGE_SEPARATOR)?;
    Some(match rest.split_once(TIMESTAMP_SEPARATOR) {
        Some((lang, _)) => lang,
        None => rest,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LangGraph {
    nodes: BTreeMap<String, PageSummary>,
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl LangGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the node already existed.
    pub fn add_node(&mut self, key: impl Into<String>, summary: PageSummary) -> bool {
        let key = key.into();
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.adjacency.entry(key.clone()).or_default();
        self.nodes.insert(key, summary);
        true
    }

    pub fn add_nodes_from<I, K>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = (K, PageSummary)>,
        K: Into<String>,
    {
        for (key, summary) in nodes {
            self.add_node(key, summary);
        }
    }

    /// Returns false for self-loops and already-present edges.
    pub fn add_edge(&mut self, a: impl Into<String>, b: impl Into<String>) -> bool {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return false;
        }
        self.add_node(a.clone(), PageSummary::default());
        self.add_node(b.clone(), PageSummary::default());
        let fresh = self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
        fresh
    }

    pub fn add_edges_from<I, A, B>(&mut self, edges: I)
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        for (a, b) in edges {
            self.add_edge(a, b);
        }
    }

    pub fn contains_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&PageSummary> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &PageSummary)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every edge once, as `(smaller, larger)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency.iter().flat_map(|(a, nbrs)| {
            nbrs.iter()
                .filter(move |b| a.as_str() < b.as_str())
                .map(move |b| (a.as_str(), b.as_str()))
        })
    }

    pub fn neighbors(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(key)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(b))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn left_nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str).filter(|k| is_language_root(k))
    }

    pub fn right_nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str).filter(|k| !is_language_root(k))
    }

    pub fn right_node_count(&self) -> usize {
        self.right_nodes().count()
    }

    /// Language codes of every language-root node.
    pub fn languages(&self) -> BTreeSet<String> {
        self.left_nodes()
            .filter_map(language_of_root)
            .map(str::to_string)
            .collect()
    }

    /// Subgraph keeping only language roots in `allowed` and the right nodes
    /// they still reach. An empty allow-list keeps everything.
    pub fn restrict_languages<S: AsRef<str>>(&self, allowed: &[S]) -> LangGraph {
        if allowed.is_empty() {
            return self.clone();
        }
        let allowed: BTreeSet<&str> = allowed.iter().map(|s| s.as_ref()).collect();
        let kept_roots: BTreeSet<&str> = self
            .left_nodes()
            .filter(|k| language_of_root(k).is_some_and(|l| allowed.contains(l)))
            .collect();

        let mut out = LangGraph::new();
        for root in &kept_roots {
            out.add_node(*root, self.nodes[*root].clone());
            for nbr in self.adjacency.get(*root).into_iter().flatten() {
                if is_language_root(nbr) && !kept_roots.contains(nbr.as_str()) {
                    continue;
                }
                out.add_node(nbr.clone(), self.nodes[nbr].clone());
                out.add_edge(*root, nbr.clone());
            }
        }
        out
    }

    pub fn to_export(&self) -> GraphExport {
        let nodes = self
            .nodes
            .iter()
            .map(|(id, page)| NodeExport {
                id: id.clone(),
                side: Side::of(id),
                page: page.clone(),
            })
            .collect::<Vec<_>>();
        let left = nodes.iter().filter(|n| n.side == Side::Left).count();
        let counts = GraphCounts {
            nodes: nodes.len(),
            edges: self.edge_count(),
            left,
            right: nodes.len() - left,
        };
        GraphExport {
            nodes,
            edges: self
                .edges()
                .map(|(a, b)| [a.to_string(), b.to_string()])
                .collect(),
            counts,
        }
    }

    /// `{nodes, edges, counts}` document.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.to_export()).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<[String; 2]>,
    pub counts: GraphCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeExport {
    pub id: String,
    pub side: Side,
    pub page: PageSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub edges: usize,
    pub left: usize,
    pub right: usize,
}
