//! # castnet-network — temporal collaboration networks
//!
//! Builds actor-actor and actor-director collaboration graphs from movie
//! credits one calendar year at a time, freezes the graph at every year
//! boundary into an immutable [`Snapshot`], and scores each movie against the
//! snapshot that closed before its release.
//!
//! ```text
//! credits TSV ──► RecordReader ──► NetworkBuilder ──► SnapshotStore
//!                                                        │
//!                      feature TSV ◄── FeatureExtractor ◄┘
//! ```

pub mod builder;
pub mod entity;
pub mod error;
pub mod features;
pub mod graph;
pub mod matrix;
pub mod metrics;
pub mod records;
pub mod relabel;
pub mod snapshot;

pub use builder::{NetworkBuilder, YearReport};
pub use entity::EntityIndex;
pub use error::{MalformedCredits, NetworkError};
pub use features::{FeatureExtractor, MovieFeatures, cosine_similarity};
pub use graph::{ActorDirectorGraph, ActorGraph, CollaborationGraph};
pub use metrics::GraphMetrics;
pub use records::{CreditList, MovieRecord, RecordReader};
pub use snapshot::{IngestStats, Snapshot, SnapshotLabel, SnapshotManifest, SnapshotStore};
