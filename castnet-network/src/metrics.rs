//! Summary statistics reported for each snapshot.

use serde::{Deserialize, Serialize};

/// Size and connectivity of a collaboration graph at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Row entities (actors).
    pub rows: usize,
    /// Column entities: actors again for the unipartite graph, directors for the bipartite one.
    pub cols: usize,
    /// Distinct collaborating pairs with positive weight.
    pub edges: usize,
    /// Mean number of distinct collaborators per row entity.
    pub mean_degree: f64,
    /// Share of possible pairs that have collaborated.
    pub density: f64,
}

impl GraphMetrics {
    /// Metrics for a square symmetric graph, where every edge is counted once.
    pub fn unipartite(nodes: usize, edges: usize) -> Self {
        let possible = nodes.saturating_mul(nodes.saturating_sub(1));
        Self {
            rows: nodes,
            cols: nodes,
            edges,
            mean_degree: ratio(2 * edges, nodes),
            density: ratio(2 * edges, possible),
        }
    }

    /// Metrics for a rectangular actor-by-director graph.
    pub fn bipartite(actors: usize, directors: usize, edges: usize) -> Self {
        Self {
            rows: actors,
            cols: directors,
            edges,
            mean_degree: ratio(edges, actors),
            density: ratio(edges, actors.saturating_mul(directors)),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unipartite_triangle() {
        let m = GraphMetrics::unipartite(3, 3);
        assert_eq!(m.mean_degree, 2.0);
        assert_eq!(m.density, 1.0);
    }

    #[test]
    fn test_empty_graphs_have_zero_ratios() {
        assert_eq!(GraphMetrics::unipartite(0, 0).density, 0.0);
        assert_eq!(GraphMetrics::unipartite(1, 0).density, 0.0);
        assert_eq!(GraphMetrics::bipartite(0, 0, 0).mean_degree, 0.0);
    }

    #[test]
    fn test_bipartite_density() {
        let m = GraphMetrics::bipartite(4, 2, 2);
        assert_eq!(m.density, 0.25);
        assert_eq!(m.mean_degree, 0.5);
    }
}
