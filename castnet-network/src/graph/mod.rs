//! Weighted collaboration graphs over [`EntityIndex`] spaces.
//!
//! Two shapes exist: the square, symmetric [`ActorGraph`] and the rectangular
//! [`ActorDirectorGraph`]. Both share the [`CollaborationGraph`] surface that
//! snapshots and feature extraction work against.

mod actor;
mod actor_director;

pub use actor::ActorGraph;
pub use actor_director::ActorDirectorGraph;

use crate::entity::EntityIndex;
use crate::error::{MalformedCredits, NetworkError};
use crate::matrix::DenseMatrix;
use crate::metrics::GraphMetrics;
use crate::records::{CreditList, MovieRecord};
use castnet_core::GraphKind;
use std::collections::HashSet;
use std::fmt;

/// Operations shared by both graph shapes.
pub trait CollaborationGraph: Clone + fmt::Debug + Send + Sync {
    const KIND: GraphKind;

    /// The row entity space. Actors in both shapes.
    fn actors(&self) -> &EntityIndex;

    /// Collaboration signature of an actor: its full logical row.
    fn vector(&self, actor: usize) -> &[u32];

    /// Length of every [`vector`](Self::vector).
    fn vector_width(&self) -> usize;

    /// Number of distinct collaborators with positive weight.
    fn degree(&self, actor: usize) -> usize {
        self.vector(actor).iter().filter(|&&w| w > 0).count()
    }

    /// Record every collaboration in one movie, returning the number of pair
    /// increments applied.
    fn process_movie(&mut self, movie: &MovieRecord) -> Result<usize, MalformedCredits>;

    fn metrics(&self) -> GraphMetrics;

    /// Borrowed view of the state a snapshot persists.
    fn view(&self) -> GraphView<'_>;

    /// Rebuild a graph from persisted parts, validating shape invariants.
    fn from_parts(parts: GraphParts) -> Result<Self, NetworkError>
    where
        Self: Sized;
}

/// Borrowed graph state, ready for serialization.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    pub kind: GraphKind,
    pub rows: &'a EntityIndex,
    pub cols: Option<&'a EntityIndex>,
    pub weights: &'a DenseMatrix,
}

/// Owned graph state as read back from storage.
#[derive(Debug, Clone)]
pub struct GraphParts {
    pub kind: GraphKind,
    pub rows: EntityIndex,
    pub cols: Option<EntityIndex>,
    pub weights: DenseMatrix,
}

/// Keys of a credit list in first-occurrence order, duplicates dropped.
fn distinct_credits<'a>(
    movie: &'a MovieRecord,
    list: Option<&'a CreditList>,
    field: &'static str,
) -> Result<Vec<&'a str>, MalformedCredits> {
    let list = list.ok_or_else(|| MalformedCredits {
        movie_id: movie.id.clone(),
        field,
        reason: "is absent".to_string(),
    })?;
    match list {
        CreditList::Listed(keys) => {
            let mut seen = HashSet::with_capacity(keys.len());
            Ok(keys
                .iter()
                .map(String::as_str)
                .filter(|k| seen.insert(*k))
                .collect())
        }
        CreditList::Malformed(reason) => Err(MalformedCredits {
            movie_id: movie.id.clone(),
            field,
            reason: reason.clone(),
        }),
    }
}

fn check_kind(expected: GraphKind, found: GraphKind) -> Result<(), NetworkError> {
    if expected == found {
        Ok(())
    } else {
        Err(NetworkError::KindMismatch { expected, found })
    }
}
