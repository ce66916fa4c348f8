use super::{CollaborationGraph, GraphParts, GraphView, check_kind, distinct_credits};
use crate::entity::EntityIndex;
use crate::error::{MalformedCredits, NetworkError};
use crate::matrix::DenseMatrix;
use crate::metrics::GraphMetrics;
use crate::records::MovieRecord;
use castnet_core::GraphKind;

/// Unipartite actor-actor graph.
///
/// Cell (i, j) counts the movies actors i and j appeared in together. The
/// matrix is kept symmetric and its diagonal is always zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorGraph {
    actors: EntityIndex,
    weights: DenseMatrix,
}

impl ActorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `key`, growing the matrix if the actor is new.
    pub fn ensure(&mut self, key: &str) -> usize {
        let idx = self.actors.add(key);
        let n = self.actors.size();
        if n > self.weights.rows() {
            self.weights.resize(n, n);
        }
        idx
    }

    /// Increment the symmetric pair (a, b).
    ///
    /// A self-pair is a no-op and returns `false`; the diagonal is never written.
    pub fn record_pair(&mut self, a: usize, b: usize) -> bool {
        if a == b {
            return false;
        }
        self.weights.increment(a, b);
        self.weights.increment(b, a);
        true
    }

    pub fn weight(&self, a: usize, b: usize) -> u32 {
        self.weights.get(a, b)
    }

    /// Weight between two actors by key; 0 if either is unknown.
    pub fn weight_by_key(&self, a: &str, b: &str) -> u32 {
        match (self.actors.lookup(a), self.actors.lookup(b)) {
            (Some(a), Some(b)) => self.weight(a, b),
            _ => 0,
        }
    }

    pub fn size(&self) -> usize {
        self.actors.size()
    }
}

impl CollaborationGraph for ActorGraph {
    const KIND: GraphKind = GraphKind::Actor;

    fn actors(&self) -> &EntityIndex {
        &self.actors
    }

    fn vector(&self, actor: usize) -> &[u32] {
        self.weights.row(actor)
    }

    fn vector_width(&self) -> usize {
        self.weights.cols()
    }

    /// Every unordered pair of distinct cast members, k * (k - 1) / 2 in total.
    ///
    /// Actors are only registered when the movie pairs them with someone, so a
    /// single-actor movie leaves the graph untouched.
    fn process_movie(&mut self, movie: &MovieRecord) -> Result<usize, MalformedCredits> {
        let cast = distinct_credits(movie, Some(&movie.cast), "cast")?;
        if cast.len() < 2 {
            return Ok(0);
        }
        let indices: Vec<usize> = cast.iter().map(|key| self.ensure(key)).collect();
        let mut pairs = 0;
        for (i, &a) in indices.iter().enumerate() {
            for &b in &indices[i + 1..] {
                if self.record_pair(a, b) {
                    pairs += 1;
                }
            }
        }
        Ok(pairs)
    }

    fn metrics(&self) -> GraphMetrics {
        let edges = (0..self.size())
            .map(|i| self.vector(i)[i + 1..].iter().filter(|&&w| w > 0).count())
            .sum();
        GraphMetrics::unipartite(self.size(), edges)
    }

    fn view(&self) -> GraphView<'_> {
        GraphView {
            kind: Self::KIND,
            rows: &self.actors,
            cols: None,
            weights: &self.weights,
        }
    }

    fn from_parts(parts: GraphParts) -> Result<Self, NetworkError> {
        check_kind(Self::KIND, parts.kind)?;
        if parts.cols.is_some() {
            return Err(NetworkError::invalid_input(
                "actor graph must not carry a column index",
            ));
        }
        let n = parts.rows.size();
        if parts.weights.rows() != n || parts.weights.cols() != n {
            return Err(NetworkError::invalid_input(format!(
                "weights are {} x {}, expected {n} x {n}",
                parts.weights.rows(),
                parts.weights.cols()
            )));
        }
        for i in 0..n {
            if parts.weights.get(i, i) != 0 {
                return Err(NetworkError::invalid_input(format!(
                    "non-zero self weight at {i}"
                )));
            }
            for j in i + 1..n {
                if parts.weights.get(i, j) != parts.weights.get(j, i) {
                    return Err(NetworkError::invalid_input(format!(
                        "asymmetric weights at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(Self {
            actors: parts.rows,
            weights: parts.weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_movie() {
        let mut graph = ActorGraph::new();
        let pairs = graph
            .process_movie(&MovieRecord::new("m1", 2001, ["A", "B", "C"]))
            .unwrap();
        assert_eq!(pairs, 3);
        assert_eq!(graph.size(), 3);
        for (a, b) in [("A", "B"), ("A", "C"), ("B", "C")] {
            assert_eq!(graph.weight_by_key(a, b), 1);
            assert_eq!(graph.weight_by_key(b, a), 1);
        }
        assert_eq!(graph.weight_by_key("A", "A"), 0);
    }

    #[test]
    fn test_repeated_movie_accumulates() {
        let mut graph = ActorGraph::new();
        let movie = MovieRecord::new("m1", 2001, ["A", "B"]);
        graph.process_movie(&movie).unwrap();
        graph.process_movie(&movie).unwrap();
        assert_eq!(graph.weight_by_key("A", "B"), 2);
        assert_eq!(graph.degree(0), 1);
    }

    #[test]
    fn test_self_pair_is_noop() {
        let mut graph = ActorGraph::new();
        let a = graph.ensure("A");
        assert!(!graph.record_pair(a, a));
        assert_eq!(graph.weight(a, a), 0);
    }

    #[test]
    fn test_duplicate_cast_members_collapse() {
        let mut graph = ActorGraph::new();
        let pairs = graph
            .process_movie(&MovieRecord::new("m1", 2001, ["A", "B", "A"]))
            .unwrap();
        assert_eq!(pairs, 1);
        assert_eq!(graph.weight_by_key("A", "B"), 1);
        assert_eq!(graph.weight_by_key("A", "A"), 0);
    }

    #[test]
    fn test_single_actor_movie_registers_nobody() {
        let mut graph = ActorGraph::new();
        let pairs = graph
            .process_movie(&MovieRecord::new("m1", 2001, ["A"]))
            .unwrap();
        assert_eq!(pairs, 0);
        assert_eq!(graph.size(), 0);
    }

    #[test]
    fn test_malformed_cast_is_rejected() {
        let mut graph = ActorGraph::new();
        let mut movie = MovieRecord::new("m1", 2001, ["A", "B"]);
        movie.cast = crate::records::CreditList::Malformed("field is empty".into());
        let err = graph.process_movie(&movie).unwrap_err();
        assert_eq!(err.field, "cast");
        assert_eq!(graph.size(), 0);
    }

    #[test]
    fn test_metrics_count_each_edge_once() {
        let mut graph = ActorGraph::new();
        graph
            .process_movie(&MovieRecord::new("m1", 2001, ["A", "B", "C"]))
            .unwrap();
        graph
            .process_movie(&MovieRecord::new("m2", 2001, ["C", "D"]))
            .unwrap();
        let m = graph.metrics();
        assert_eq!(m.rows, 4);
        assert_eq!(m.edges, 4);
        assert_eq!(m.mean_degree, 2.0);
    }

    #[test]
    fn test_from_parts_rejects_asymmetry() {
        let mut weights = DenseMatrix::zeros(2, 2);
        weights.increment(0, 1);
        let parts = GraphParts {
            kind: GraphKind::Actor,
            rows: EntityIndex::from_keys(vec!["A".into(), "B".into()]).unwrap(),
            cols: None,
            weights,
        };
        assert!(ActorGraph::from_parts(parts).is_err());
    }
}
