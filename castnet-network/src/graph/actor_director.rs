use super::{CollaborationGraph, GraphParts, GraphView, check_kind, distinct_credits};
use crate::entity::EntityIndex;
use crate::error::{MalformedCredits, NetworkError};
use crate::matrix::DenseMatrix;
use crate::metrics::GraphMetrics;
use crate::records::MovieRecord;
use castnet_core::GraphKind;

/// Bipartite actor-director graph: actors are rows, directors are columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorDirectorGraph {
    actors: EntityIndex,
    directors: EntityIndex,
    weights: DenseMatrix,
}

impl ActorDirectorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_row(&mut self, actor: &str) -> usize {
        let idx = self.actors.add(actor);
        if self.actors.size() > self.weights.rows() {
            self.weights.resize(self.actors.size(), self.weights.cols());
        }
        idx
    }

    pub fn ensure_col(&mut self, director: &str) -> usize {
        let idx = self.directors.add(director);
        if self.directors.size() > self.weights.cols() {
            self.weights.resize(self.weights.rows(), self.directors.size());
        }
        idx
    }

    pub fn record_pair(&mut self, actor: usize, director: usize) {
        self.weights.increment(actor, director);
    }

    pub fn weight(&self, actor: usize, director: usize) -> u32 {
        self.weights.get(actor, director)
    }

    pub fn weight_by_key(&self, actor: &str, director: &str) -> u32 {
        match (self.actors.lookup(actor), self.directors.lookup(director)) {
            (Some(a), Some(d)) => self.weight(a, d),
            _ => 0,
        }
    }

    pub fn directors(&self) -> &EntityIndex {
        &self.directors
    }
}

impl CollaborationGraph for ActorDirectorGraph {
    const KIND: GraphKind = GraphKind::ActorDirector;

    fn actors(&self) -> &EntityIndex {
        &self.actors
    }

    fn vector(&self, actor: usize) -> &[u32] {
        self.weights.row(actor)
    }

    fn vector_width(&self) -> usize {
        self.weights.cols()
    }

    /// Every (actor, director) pair across the distinct cast and crew.
    ///
    /// Each actor is registered just before its directors, so indices follow
    /// the credit order of the first movie an entity appears in.
    fn process_movie(&mut self, movie: &MovieRecord) -> Result<usize, MalformedCredits> {
        let cast = distinct_credits(movie, Some(&movie.cast), "cast")?;
        let crew = distinct_credits(movie, movie.crew.as_ref(), "crew")?;
        let mut pairs = 0;
        for actor in &cast {
            for director in &crew {
                let a = self.ensure_row(actor);
                let d = self.ensure_col(director);
                self.record_pair(a, d);
                pairs += 1;
            }
        }
        Ok(pairs)
    }

    fn metrics(&self) -> GraphMetrics {
        let edges = self
            .weights
            .iter_rows()
            .map(|row| row.iter().filter(|&&w| w > 0).count())
            .sum();
        GraphMetrics::bipartite(self.actors.size(), self.directors.size(), edges)
    }

    fn view(&self) -> GraphView<'_> {
        GraphView {
            kind: Self::KIND,
            rows: &self.actors,
            cols: Some(&self.directors),
            weights: &self.weights,
        }
    }

    fn from_parts(parts: GraphParts) -> Result<Self, NetworkError> {
        check_kind(Self::KIND, parts.kind)?;
        let directors = parts.cols.ok_or_else(|| {
            NetworkError::invalid_input("actor-director graph needs a director index")
        })?;
        if parts.weights.rows() != parts.rows.size() || parts.weights.cols() != directors.size() {
            return Err(NetworkError::invalid_input(format!(
                "weights are {} x {}, expected {} x {}",
                parts.weights.rows(),
                parts.weights.cols(),
                parts.rows.size(),
                directors.size()
            )));
        }
        Ok(Self {
            actors: parts.rows,
            directors,
            weights: parts.weights,
        })
    }
}
