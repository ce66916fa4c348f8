//! Leakage-safe per-movie network features.
//!
//! A movie released in year `Y` is scored against the snapshot closed at the
//! end of `Y - 1` (or `base` for the first tracked year), so nothing the movie
//! itself contributed to the network can leak into its features.

use crate::error::NetworkError;
use crate::graph::CollaborationGraph;
use crate::records::{CreditList, MovieRecord};
use crate::snapshot::{Snapshot, SnapshotLabel, SnapshotStore};
use castnet_core::persistence::atomic_write;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::ops::RangeInclusive;
use std::path::Path;

/// Column order of the feature table.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "movie_id",
    "year",
    "average_degree",
    "network_heterogeneity",
    "not_found",
];

/// One row of the feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieFeatures {
    pub movie_id: String,
    pub year: i32,
    pub average_degree: f64,
    pub network_heterogeneity: f64,
    /// Cast members missing from the snapshot, counted by the heterogeneity pass.
    pub not_found: usize,
}

/// Cosine similarity of two weight vectors of equal width.
///
/// Defined as 0.0 when either vector is all zeros. Non-negative weights keep
/// the result within [0, 1].
pub fn cosine_similarity(a: &[u32], b: &[u32]) -> f64 {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot(a, b) as f64 / (na * nb)).min(1.0)
}

fn dot(a: &[u32], b: &[u32]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| u64::from(x) * u64::from(y))
        .sum()
}

fn norm(v: &[u32]) -> f64 {
    (dot(v, v) as f64).sqrt()
}

/// Mean distinct-collaborator count of `cast`; unknown actors count as 0.
pub fn average_degree<G: CollaborationGraph>(graph: &G, cast: &[String]) -> f64 {
    if cast.is_empty() {
        return 0.0;
    }
    let total: usize = cast
        .iter()
        .map(|key| graph.actors().lookup(key).map_or(0, |idx| graph.degree(idx)))
        .sum();
    total as f64 / cast.len() as f64
}

/// Mean pairwise cosine similarity of the cast's collaboration vectors.
///
/// Returns the score and the number of cast members absent from `graph`.
/// Absent actors stand in as zero vectors. Casts of fewer than two give `(0.0, 0)`.
pub fn network_heterogeneity<G: CollaborationGraph>(graph: &G, cast: &[String]) -> (f64, usize) {
    if cast.len() < 2 {
        return (0.0, 0);
    }

    // (vector, norm) per cast member, None for actors the snapshot has never seen.
    let vectors: Vec<Option<(&[u32], f64)>> = cast
        .iter()
        .map(|key| {
            graph.actors().lookup(key).map(|idx| {
                let v = graph.vector(idx);
                (v, norm(v))
            })
        })
        .collect();
    let not_found = vectors.iter().filter(|v| v.is_none()).count();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in vectors.iter().enumerate() {
        for b in &vectors[i + 1..] {
            total += match (a, b) {
                (Some((va, na)), Some((vb, nb))) if *na > 0.0 && *nb > 0.0 => {
                    (dot(va, vb) as f64 / (na * nb)).min(1.0)
                }
                _ => 0.0,
            };
            pairs += 1;
        }
    }
    (total / pairs as f64, not_found)
}

/// Features of one movie against an already-loaded snapshot.
///
/// Fails with [`NetworkError::InvalidInput`] if the snapshot could contain
/// movies from `year`; [`SnapshotLabel::feature_source`] picks a valid one.
pub fn movie_features<G: CollaborationGraph>(
    snapshot: &Snapshot<G>,
    movie: &MovieRecord,
    year: i32,
) -> Result<MovieFeatures, NetworkError> {
    if !snapshot.label().precedes(year) {
        return Err(NetworkError::invalid_input(format!(
            "snapshot {} cannot score movies from {year}",
            snapshot.label()
        )));
    }
    let cast: &[String] = match &movie.cast {
        CreditList::Listed(keys) => keys,
        CreditList::Malformed(reason) => {
            tracing::warn!(movie_id = %movie.id, %reason, "malformed cast, scoring as empty");
            &[]
        }
    };
    let graph = snapshot.graph();
    let (network_heterogeneity, not_found) = network_heterogeneity(graph, cast);
    Ok(MovieFeatures {
        movie_id: movie.id.clone(),
        year,
        average_degree: average_degree(graph, cast),
        network_heterogeneity,
        not_found,
    })
}

/// Computes feature rows year by year from the snapshot store.
#[derive(Debug, Clone)]
pub struct FeatureExtractor<'s> {
    store: &'s SnapshotStore,
    first_year: i32,
    parallel: bool,
}

impl<'s> FeatureExtractor<'s> {
    /// `first_year` is the year scored against `base`.
    pub fn new(store: &'s SnapshotStore, first_year: i32) -> Self {
        Self {
            store,
            first_year,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Score `movies` as released in `year`.
    ///
    /// Fails with [`NetworkError::NotFound`] when the preceding snapshot was never built.
    pub fn extract_year<G: CollaborationGraph>(
        &self,
        year: i32,
        movies: &[&MovieRecord],
    ) -> Result<Vec<MovieFeatures>, NetworkError> {
        let label = SnapshotLabel::feature_source(year, self.first_year)?;
        let snapshot: Snapshot<G> = self.store.load(label)?;
        tracing::info!(year, %label, movies = movies.len(), "computing movie features");

        if self.parallel {
            movies
                .par_iter()
                .map(|m| movie_features(&snapshot, m, year))
                .collect()
        } else {
            movies
                .iter()
                .map(|m| movie_features(&snapshot, m, year))
                .collect()
        }
    }

    /// Score every movie released within `years`, in year order then input order.
    ///
    /// Years with no movies are skipped without touching the store.
    pub fn extract_range<G: CollaborationGraph>(
        &self,
        years: RangeInclusive<i32>,
        movies: &[MovieRecord],
    ) -> Result<Vec<MovieFeatures>, NetworkError> {
        let mut by_year: BTreeMap<i32, Vec<&MovieRecord>> = BTreeMap::new();
        let mut outside = 0usize;
        for movie in movies {
            match movie.year {
                Some(y) if years.contains(&y) => by_year.entry(y).or_default().push(movie),
                _ => outside += 1,
            }
        }
        if outside > 0 {
            tracing::debug!(movies = outside, "movies outside the year range were not scored");
        }

        let mut rows = Vec::new();
        for (year, year_movies) in by_year {
            rows.extend(self.extract_year::<G>(year, &year_movies)?);
        }
        Ok(rows)
    }
}

/// Write rows as a tab-separated table with a header line.
pub fn write_tsv<W: Write>(rows: &[MovieFeatures], mut out: W) -> io::Result<()> {
    writeln!(out, "{}", FEATURE_COLUMNS.join("\t"))?;
    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.movie_id, row.year, row.average_degree, row.network_heterogeneity, row.not_found
        )?;
    }
    out.flush()
}

/// Write the feature table to `path` atomically.
pub fn write_tsv_path(rows: &[MovieFeatures], path: &Path) -> io::Result<()> {
    let mut buf = Vec::new();
    write_tsv(rows, &mut buf)?;
    atomic_write(path, &buf)
}
