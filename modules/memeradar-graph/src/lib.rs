//! In-memory graph analytics over author relations: centrality measures
//! and community structure, plus the reach signal fed back into KOL
//! scoring.

pub mod build;
mod centrality;
mod community;

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use memeradar_common::{CentralityRecord, Community, GraphSummary, RelationEdge};

pub use build::AuthorGraph;

/// Output of one full graph pass.
pub struct GraphAnalysis {
    pub summary: GraphSummary,
    pub dangling_edges: u64,
}

/// Run the whole graph stage as a single unit: build, centrality,
/// communities. Never fails — undefined metrics surface as `None` and
/// non-convergence falls back to degree centrality with a flag.
pub fn analyze(edges: &[RelationEdge], authors: &BTreeSet<String>, seed: u64) -> GraphAnalysis {
    let author_graph = build::build(edges, authors);
    let graph = &author_graph.graph;
    let n = graph.node_count();

    let directed = build::directed_adjacency(graph);
    let undirected = build::undirected_adjacency(graph);

    let degree = centrality::degree(&directed);
    let closeness = centrality::closeness(&undirected);
    let betweenness = centrality::betweenness(&directed);
    let (mut eigenvector, converged) = centrality::eigenvector(&directed);
    if !converged {
        // Fail-soft: degree stands in when power iteration cannot settle.
        eigenvector = degree.clone();
    }

    let mut records = BTreeMap::new();
    for idx in graph.node_indices() {
        let id = graph[idx].clone();
        let i = idx.index();
        records.insert(
            id.clone(),
            CentralityRecord {
                author_id: id,
                degree: degree[i],
                closeness: closeness[i],
                betweenness: betweenness[i],
                eigenvector: eigenvector[i],
            },
        );
    }

    let partition = community::louvain(&undirected, seed);
    let communities = collect_communities(graph, &partition.assignment);

    info!(
        nodes = n,
        edges = graph.edge_count(),
        communities = communities.len(),
        modularity = partition.modularity,
        eigenvector_converged = converged,
        "Graph analysis complete"
    );

    GraphAnalysis {
        summary: GraphSummary {
            centrality: records,
            communities,
            modularity: partition.modularity,
            eigenvector_converged: converged,
        },
        dangling_edges: author_graph.dangling_edges,
    }
}

/// Reach signal for KOL scoring, in [0, 1]: betweenness when the graph is
/// large enough to define it, degree otherwise. Optional downstream —
/// scoring works without it.
pub fn network_reach(summary: &GraphSummary) -> BTreeMap<String, f64> {
    let use_degree = summary.centrality.len() < 3;
    summary
        .centrality
        .iter()
        .map(|(id, record)| {
            let reach = if use_degree {
                record.degree
            } else {
                record.betweenness
            };
            (id.clone(), reach.clamp(0.0, 1.0))
        })
        .collect()
}

fn collect_communities(
    graph: &petgraph::graph::DiGraph<String, f64>,
    assignment: &[usize],
) -> Vec<Community> {
    let count = assignment.iter().copied().max().map_or(0, |m| m + 1);
    let mut members: Vec<BTreeSet<String>> = vec![BTreeSet::new(); count];
    for idx in graph.node_indices() {
        members[assignment[idx.index()]].insert(graph[idx].clone());
    }
    // Stable ids: communities ordered by their smallest member id.
    let mut ordered: Vec<BTreeSet<String>> = members.into_iter().filter(|m| !m.is_empty()).collect();
    ordered.sort_by(|a, b| a.iter().next().cmp(&b.iter().next()));
    ordered
        .into_iter()
        .enumerate()
        .map(|(id, member_ids)| Community {
            id,
            size: member_ids.len(),
            member_ids,
        })
        .collect()
}
