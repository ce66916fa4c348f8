//! Year-by-year network construction.
//!
//! The builder owns the only mutable graph. Each closed year becomes a new
//! [`Snapshot`] value derived from the previous one; the live graph only
//! advances once that snapshot is safely in the store, so a failed save
//! leaves the builder where it was and the year can be retried.

use crate::error::NetworkError;
use crate::graph::CollaborationGraph;
use crate::metrics::GraphMetrics;
use crate::records::MovieRecord;
use crate::snapshot::{IngestStats, Snapshot, SnapshotLabel, SnapshotStore};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Outcome of closing one label.
#[derive(Debug, Clone, PartialEq)]
pub struct YearReport {
    pub label: SnapshotLabel,
    pub parent: Option<SnapshotLabel>,
    pub stats: IngestStats,
    pub metrics: GraphMetrics,
}

/// Ingests movies in year order and writes one snapshot per closed year.
#[derive(Debug)]
pub struct NetworkBuilder<'s, G> {
    store: &'s SnapshotStore,
    graph: G,
    last: Option<SnapshotLabel>,
}

impl<'s, G: CollaborationGraph + Default> NetworkBuilder<'s, G> {
    /// Start from an empty graph.
    pub fn new(store: &'s SnapshotStore) -> Self {
        Self {
            store,
            graph: G::default(),
            last: None,
        }
    }

    /// Continue from a previously saved snapshot.
    ///
    /// After resuming from year `Y` the next ingested year must be `Y + 1`;
    /// after resuming from `base` any year may follow.
    pub fn resume(store: &'s SnapshotStore, label: SnapshotLabel) -> Result<Self, NetworkError> {
        let snapshot: Snapshot<G> = store.load(label)?;
        tracing::info!(
            %label,
            actors = snapshot.graph().actors().size(),
            "resuming from snapshot"
        );
        Ok(Self {
            store,
            graph: snapshot.into_graph(),
            last: Some(label),
        })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn last_label(&self) -> Option<SnapshotLabel> {
        self.last
    }

    pub fn into_graph(self) -> G {
        self.graph
    }

    /// Apply a historical corpus with no year cutoff and save it as `base`.
    pub fn build_base(&mut self, movies: &[MovieRecord]) -> Result<YearReport, NetworkError> {
        if let Some(last) = self.last {
            return Err(NetworkError::ChainBroken {
                expected: "an empty graph".to_string(),
                found: last.to_string(),
            });
        }
        tracing::info!(movies = movies.len(), "building base network");
        self.close(SnapshotLabel::Base, movies.iter())
    }

    /// Apply every movie released in `year`, in input order, then save snapshot `year`.
    pub fn ingest_year(
        &mut self,
        year: i32,
        movies: &[MovieRecord],
    ) -> Result<YearReport, NetworkError> {
        self.check_continuity(year)?;
        self.close(
            SnapshotLabel::Year(year),
            movies.iter().filter(|m| m.year == Some(year)),
        )
    }

    /// Ingest each year of `years` in order. Years without movies still get a snapshot.
    pub fn run(
        &mut self,
        years: RangeInclusive<i32>,
        movies: &[MovieRecord],
    ) -> Result<Vec<YearReport>, NetworkError> {
        if years.is_empty() {
            return Err(NetworkError::invalid_input(format!(
                "empty year range {}..={}",
                years.start(),
                years.end()
            )));
        }
        self.check_continuity(*years.start())?;

        let mut by_year: BTreeMap<i32, Vec<&MovieRecord>> = BTreeMap::new();
        let mut outside = 0usize;
        for movie in movies {
            match movie.year {
                Some(y) if years.contains(&y) => by_year.entry(y).or_default().push(movie),
                _ => outside += 1,
            }
        }
        if outside > 0 {
            tracing::warn!(
                movies = outside,
                "movies without a release year in range were not ingested"
            );
        }

        let mut reports = Vec::with_capacity(years.clone().count());
        for year in years {
            self.check_continuity(year)?;
            let year_movies = by_year.remove(&year).unwrap_or_default();
            reports.push(self.close(SnapshotLabel::Year(year), year_movies.into_iter())?);
        }
        Ok(reports)
    }

    fn check_continuity(&self, year: i32) -> Result<(), NetworkError> {
        let prev = match self.last {
            None | Some(SnapshotLabel::Base) => return Ok(()),
            Some(SnapshotLabel::Year(prev)) => prev,
        };
        match prev.checked_add(1) {
            Some(next) if next == year => Ok(()),
            next => Err(NetworkError::ChainBroken {
                expected: next.map_or_else(|| format!("no year after {prev}"), |n| n.to_string()),
                found: year.to_string(),
            }),
        }
    }

    fn close<'m>(
        &mut self,
        label: SnapshotLabel,
        movies: impl Iterator<Item = &'m MovieRecord>,
    ) -> Result<YearReport, NetworkError> {
        if self.store.exists(label) {
            return Err(NetworkError::AlreadyExists(label.to_string()));
        }

        let mut next = self.graph.clone();
        let mut stats = IngestStats::default();
        for movie in movies {
            match next.process_movie(movie) {
                Ok(pairs) => {
                    stats.movies_applied += 1;
                    stats.pairs_recorded += pairs;
                }
                Err(malformed) => {
                    tracing::warn!(
                        movie_id = %malformed.movie_id,
                        field = malformed.field,
                        reason = %malformed.reason,
                        "skipping movie with malformed credits"
                    );
                    stats.movies_skipped += 1;
                }
            }
        }

        let snapshot = Snapshot::new(label, self.last, next, stats);
        let manifest = self.store.save(&snapshot)?;
        self.graph = snapshot.into_graph();
        self.last = Some(label);

        let kind = G::KIND;
        tracing::info!(
            %label,
            %kind,
            movies = stats.movies_applied,
            skipped = stats.movies_skipped,
            nodes = manifest.metrics.rows,
            edges = manifest.metrics.edges,
            "snapshot closed"
        );

        Ok(YearReport {
            label,
            parent: manifest.parent,
            stats,
            metrics: manifest.metrics,
        })
    }
}
