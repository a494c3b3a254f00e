// src/crawl/graph.rs
//! Deduplicating undirected adjacency store.
//!
//! Edges are stored one-directionally under whichever endpoint was
//! inserted first; undirected semantics are enforced by checking both
//! directions before insert, so `{a, b}` and `{b, a}` can never both be
//! stored. Insertion-ordered maps keep the export stable for a given
//! accumulator instance.

use crate::types::BlockId;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// A single exported edge, in the `{source, target}` shape the graph
/// frontend consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub source: BlockId,
    pub target: BlockId,
}

/// Undirected graph over node ids.
///
/// Holding an edge says nothing about whether either endpoint exists as a
/// discovered node; the crawl engine filters dangling endpoints at the
/// end.
#[derive(Debug, Default)]
pub struct UndirectedNodeGraph {
    edges: IndexMap<BlockId, IndexSet<BlockId>>,
}

impl UndirectedNodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edge between two ids unless the unordered pair is
    /// already stored, in either direction.
    pub fn add_edge(&mut self, a: &BlockId, b: &BlockId) {
        if let Some(reverse) = self.edges.get(b) {
            if reverse.contains(a) {
                return;
            }
        }
        self.edges
            .entry(a.clone())
            .or_default()
            .insert(b.clone());
    }

    /// Exports every stored entry as a link. Direction is whichever side
    /// was inserted first — arbitrary, but stable per instance.
    pub fn export_links(&self) -> Vec<GraphLink> {
        self.edges
            .iter()
            .flat_map(|(source, targets)| {
                targets.iter().map(move |target| GraphLink {
                    source: source.clone(),
                    target: target.clone(),
                })
            })
            .collect()
    }
}
