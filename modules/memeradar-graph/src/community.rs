//! Greedy modularity community detection (Louvain-style) on the
//! undirected projection of the author graph.
//!
//! The only randomized step is the node visit order, drawn once per level
//! from a seeded RNG; moves require strictly positive modularity gain and
//! ties keep the current assignment, so the same edges and seed always
//! reproduce the same partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub(crate) struct Partition {
    /// Final community id per node, contiguous from 0.
    pub assignment: Vec<usize>,
    pub modularity: f64,
}

pub(crate) fn louvain(undirected: &[Vec<(usize, f64)>], seed: u64) -> Partition {
    let n = undirected.len();
    let two_m: f64 = undirected
        .iter()
        .flat_map(|list| list.iter().map(|&(_, w)| w))
        .sum();

    if n == 0 || two_m == 0.0 {
        // No structure to optimize: every node is its own community.
        return Partition {
            assignment: (0..n).collect(),
            modularity: 0.0,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);

    // node -> community on the original graph, refined level by level.
    let mut assignment: Vec<usize> = (0..n).collect();
    let mut level_adj: Vec<Vec<(usize, f64)>> = undirected.to_vec();

    loop {
        let (local, improved) = one_level(&level_adj, two_m, &mut rng);
        if !improved {
            break;
        }
        let (relabeled, count) = compress_labels(&local);
        for community in assignment.iter_mut() {
            *community = relabeled[*community];
        }
        if count == level_adj.len() {
            break;
        }
        level_adj = aggregate(&level_adj, &relabeled, count);
    }

    let (assignment, _) = compress_labels(&assignment);
    let modularity = modularity(undirected, &assignment, two_m);
    Partition {
        assignment,
        modularity,
    }
}

/// One local-moving pass: repeatedly offer each node its best neighboring
/// community until a full sweep makes no move.
fn one_level(adj: &[Vec<(usize, f64)>], two_m: f64, rng: &mut StdRng) -> (Vec<usize>, bool) {
    let n = adj.len();
    let mut community: Vec<usize> = (0..n).collect();
    let degree: Vec<f64> = adj
        .iter()
        .map(|list| list.iter().map(|&(_, w)| w).sum())
        .collect();
    let mut total: Vec<f64> = degree.clone();

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut improved = false;
    loop {
        let mut moved = false;
        for &node in &order {
            let current = community[node];
            total[current] -= degree[node];

            // Weight from this node into each neighboring community.
            let mut links: Vec<(usize, f64)> = Vec::new();
            for &(next, weight) in &adj[node] {
                if next == node {
                    continue;
                }
                let c = community[next];
                match links.iter_mut().find(|(lc, _)| *lc == c) {
                    Some((_, w)) => *w += weight,
                    None => links.push((c, weight)),
                }
            }
            // Deterministic candidate order: lower community id first.
            links.sort_by(|a, b| a.0.cmp(&b.0));

            let gain_of = |c: usize, w_in: f64| w_in - total[c] * degree[node] / two_m;
            let mut best = current;
            let current_gain = links
                .iter()
                .find(|(c, _)| *c == current)
                .map(|&(c, w)| gain_of(c, w))
                .unwrap_or(0.0);
            let mut best_gain = current_gain;
            for &(c, w_in) in &links {
                if c == current {
                    continue;
                }
                let gain = gain_of(c, w_in);
                if gain > best_gain {
                    best = c;
                    best_gain = gain;
                }
            }

            total[best] += degree[node];
            if best != current {
                community[node] = best;
                moved = true;
                improved = true;
            }
        }
        if !moved {
            break;
        }
    }
    (community, improved)
}

/// Relabel arbitrary community ids to 0..count, ordered by first member.
fn compress_labels(assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: Vec<Option<usize>> = vec![None; assignment.len()];
    let mut next = 0usize;
    let mut out = vec![0usize; assignment.len()];
    for (node, &community) in assignment.iter().enumerate() {
        let label = match mapping[community] {
            Some(label) => label,
            None => {
                let label = next;
                mapping[community] = Some(label);
                next += 1;
                label
            }
        };
        out[node] = label;
    }
    (out, next)
}

/// Collapse communities into super-nodes, summing edge weights.
/// Intra-community weight becomes a self-loop on the super-node.
fn aggregate(
    adj: &[Vec<(usize, f64)>],
    assignment: &[usize],
    count: usize,
) -> Vec<Vec<(usize, f64)>> {
    let mut merged: std::collections::BTreeMap<(usize, usize), f64> =
        std::collections::BTreeMap::new();
    for (node, list) in adj.iter().enumerate() {
        for &(next, weight) in list {
            *merged
                .entry((assignment[node], assignment[next]))
                .or_insert(0.0) += weight;
        }
    }
    let mut out = vec![Vec::new(); count];
    for ((a, b), weight) in merged {
        out[a].push((b, weight));
    }
    out
}

/// Q = Σ_c [ Σ_in(c)/2m − (Σ_tot(c)/2m)² ] over the original graph.
fn modularity(adj: &[Vec<(usize, f64)>], assignment: &[usize], two_m: f64) -> f64 {
    let count = assignment.iter().copied().max().map_or(0, |m| m + 1);
    let mut internal = vec![0.0; count];
    let mut total = vec![0.0; count];
    for (node, list) in adj.iter().enumerate() {
        let c = assignment[node];
        for &(next, weight) in list {
            total[c] += weight;
            if assignment[next] == c {
                internal[c] += weight;
            }
        }
    }
    (0..count)
        .map(|c| internal[c] / two_m - (total[c] / two_m).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles joined by one bridge edge.
    fn barbell() -> Vec<Vec<(usize, f64)>> {
        let edges = [
            (0, 1),
            (1, 2),
            (0, 2),
            (3, 4),
            (4, 5),
            (3, 5),
            (2, 3), // bridge
        ];
        let mut adj = vec![Vec::new(); 6];
        for (a, b) in edges {
            adj[a].push((b, 1.0));
            adj[b].push((a, 1.0));
        }
        adj
    }

    #[test]
    fn barbell_splits_into_two_communities() {
        let partition = louvain(&barbell(), 42);
        let a = partition.assignment;
        assert_eq!(a[0], a[1]);
        assert_eq!(a[1], a[2]);
        assert_eq!(a[3], a[4]);
        assert_eq!(a[4], a[5]);
        assert_ne!(a[0], a[3]);
        assert!(partition.modularity > 0.3);
    }

    #[test]
    fn same_seed_reproduces_partition() {
        let first = louvain(&barbell(), 7);
        let second = louvain(&barbell(), 7);
        assert_eq!(first.assignment, second.assignment);
        assert_eq!(first.modularity, second.modularity);
    }

    #[test]
    fn empty_graph_yields_singletons() {
        let adj: Vec<Vec<(usize, f64)>> = vec![vec![], vec![], vec![]];
        let partition = louvain(&adj, 42);
        assert_eq!(partition.assignment, vec![0, 1, 2]);
        assert_eq!(partition.modularity, 0.0);
    }

    #[test]
    fn single_clique_stays_together() {
        let mut adj = vec![Vec::new(); 4];
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    adj[a].push((b, 1.0));
                }
            }
        }
        let partition = louvain(&adj, 42);
        assert!(partition.assignment.iter().all(|&c| c == 0));
    }
}
