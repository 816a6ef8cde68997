//! Edge-list ingestion into the author graph.
//!
//! Parallel edges between the same ordered pair are summed into one
//! weighted edge. Edges referencing ids outside the author snapshot are
//! dropped and counted, never errored.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use memeradar_common::RelationEdge;

pub struct AuthorGraph {
    pub graph: DiGraph<String, f64>,
    pub index: HashMap<String, NodeIndex>,
    pub dangling_edges: u64,
}

impl AuthorGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Build the directed weighted graph over the author snapshot. Every known
/// author becomes a node, connected or not, so centrality output covers the
/// whole snapshot.
pub fn build(edges: &[RelationEdge], authors: &BTreeSet<String>) -> AuthorGraph {
    let mut graph = DiGraph::new();
    let mut index = HashMap::with_capacity(authors.len());

    // Sorted insertion keeps node indices stable across runs.
    for id in authors {
        let idx = graph.add_node(id.clone());
        index.insert(id.clone(), idx);
    }

    let mut dangling = 0u64;
    let mut merged: BTreeMap<(NodeIndex, NodeIndex), f64> = BTreeMap::new();
    for edge in edges {
        let (Some(&src), Some(&dst)) = (index.get(&edge.src), index.get(&edge.dst)) else {
            dangling += 1;
            continue;
        };
        if src == dst {
            // Self-relations carry no structural signal.
            continue;
        }
        *merged.entry((src, dst)).or_insert(0.0) += edge.weight;
    }

    for ((src, dst), weight) in merged {
        graph.add_edge(src, dst, weight);
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        dangling,
        "Author graph built"
    );

    AuthorGraph {
        graph,
        index,
        dangling_edges: dangling,
    }
}

/// Out-neighbor adjacency with edge weights, indexed by node position.
pub(crate) fn directed_adjacency(graph: &DiGraph<String, f64>) -> Vec<Vec<(usize, f64)>> {
    let mut adj = vec![Vec::new(); graph.node_count()];
    for edge in graph.edge_indices() {
        let (a, b) = graph.edge_endpoints(edge).expect("edge endpoints");
        adj[a.index()].push((b.index(), graph[edge]));
    }
    for list in &mut adj {
        list.sort_by(|x, y| x.0.cmp(&y.0));
    }
    adj
}

/// Undirected projection: weights of opposing directed edges are summed.
pub(crate) fn undirected_adjacency(graph: &DiGraph<String, f64>) -> Vec<Vec<(usize, f64)>> {
    let mut pair: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for edge in graph.edge_indices() {
        let (a, b) = graph.edge_endpoints(edge).expect("edge endpoints");
        let (lo, hi) = if a.index() <= b.index() {
            (a.index(), b.index())
        } else {
            (b.index(), a.index())
        };
        *pair.entry((lo, hi)).or_insert(0.0) += graph[edge];
    }

    let mut adj = vec![Vec::new(); graph.node_count()];
    for ((lo, hi), weight) in pair {
        adj[lo].push((hi, weight));
        adj[hi].push((lo, weight));
    }
    adj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(src: &str, dst: &str, weight: f64) -> RelationEdge {
        RelationEdge {
            src: src.to_string(),
            dst: dst.to_string(),
            weight,
        }
    }

    fn authors(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parallel_edges_are_summed() {
        let g = build(
            &[edge("a", "b", 1.0), edge("a", "b", 2.5)],
            &authors(&["a", "b"]),
        );
        assert_eq!(g.graph.edge_count(), 1);
        let e = g.graph.edge_indices().next().unwrap();
        assert_eq!(g.graph[e], 3.5);
    }

    #[test]
    fn dangling_edges_are_dropped_and_counted() {
        let g = build(
            &[edge("a", "ghost", 1.0), edge("a", "b", 1.0)],
            &authors(&["a", "b"]),
        );
        assert_eq!(g.dangling_edges, 1);
        assert_eq!(g.graph.edge_count(), 1);
    }

    #[test]
    fn isolated_authors_still_become_nodes() {
        let g = build(&[edge("a", "b", 1.0)], &authors(&["a", "b", "c"]));
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn self_loops_are_skipped() {
        let g = build(&[edge("a", "a", 4.0)], &authors(&["a"]));
        assert_eq!(g.graph.edge_count(), 0);
        assert_eq!(g.dangling_edges, 0);
    }

    #[test]
    fn undirected_projection_sums_opposing_directions() {
        let g = build(
            &[edge("a", "b", 1.0), edge("b", "a", 2.0)],
            &authors(&["a", "b"]),
        );
        let adj = undirected_adjacency(&g.graph);
        assert_eq!(adj[0], vec![(1, 3.0)]);
        assert_eq!(adj[1], vec![(0, 3.0)]);
    }
}
