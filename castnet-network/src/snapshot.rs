//! Immutable, labeled graph snapshots and their on-disk store.
//!
//! Each label owns one directory under the store root:
//!
//! ```text
//! <root>/<label>/adjacency.bin   dense little-endian u32 weights
//! <root>/<label>/mappings.json   row keys (and column keys) in index order
//! <root>/<label>/manifest.json   kind, shape, parent label, checksum, metrics
//! ```
//!
//! The directory is assembled under a hidden staging name and renamed into
//! place once all three files exist, so a label either loads completely or
//! does not exist at all.

use crate::entity::EntityIndex;
use crate::error::NetworkError;
use crate::graph::{CollaborationGraph, GraphParts};
use crate::matrix::DenseMatrix;
use crate::metrics::GraphMetrics;
use castnet_core::GraphKind;
use castnet_core::persistence::{StagedDir, atomic_write, atomic_write_json, load_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ADJACENCY_FILE: &str = "adjacency.bin";
const MAPPINGS_FILE: &str = "mappings.json";
const MANIFEST_FILE: &str = "manifest.json";

const ADJACENCY_MAGIC: &[u8; 4] = b"CNAD";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 8 + 8;

/// Position of a snapshot in the timeline: the historical base, or the end of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SnapshotLabel {
    Base,
    Year(i32),
}

impl SnapshotLabel {
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Base => None,
            Self::Year(y) => Some(*y),
        }
    }

    /// The snapshot a movie released in `year` is scored against.
    ///
    /// The first tracked year reads `base`; every later year reads the
    /// previous year's snapshot. Nothing labeled `year` or later is ever
    /// returned.
    pub fn feature_source(year: i32, first_year: i32) -> Result<Self, NetworkError> {
        if year < first_year {
            return Err(NetworkError::invalid_input(format!(
                "year {year} precedes the first tracked year {first_year}"
            )));
        }
        if year == first_year {
            Ok(Self::Base)
        } else {
            Ok(Self::Year(year - 1))
        }
    }

    /// True if the graph state under this label cannot contain movies from `year`.
    pub fn precedes(&self, year: i32) -> bool {
        match self {
            Self::Base => true,
            Self::Year(y) => *y < year,
        }
    }
}

impl fmt::Display for SnapshotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Year(y) => write!(f, "{y}"),
        }
    }
}

impl FromStr for SnapshotLabel {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "base" || s == "base_network" {
            return Ok(Self::Base);
        }
        let year = s.strip_prefix("snapshot_").unwrap_or(s);
        year.parse()
            .map(Self::Year)
            .map_err(|_| NetworkError::invalid_input(format!("invalid snapshot label '{s}'")))
    }
}

impl TryFrom<String> for SnapshotLabel {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SnapshotLabel> for String {
    fn from(label: SnapshotLabel) -> Self {
        label.to_string()
    }
}

/// Counters describing how a snapshot's graph was produced from its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub movies_applied: usize,
    pub movies_skipped: usize,
    pub pairs_recorded: usize,
}

/// A frozen graph under a label. Never mutated once built.
#[derive(Debug, Clone)]
pub struct Snapshot<G> {
    label: SnapshotLabel,
    parent: Option<SnapshotLabel>,
    graph: G,
    stats: IngestStats,
}

impl<G: CollaborationGraph> Snapshot<G> {
    pub fn new(
        label: SnapshotLabel,
        parent: Option<SnapshotLabel>,
        graph: G,
        stats: IngestStats,
    ) -> Self {
        Self {
            label,
            parent,
            graph,
            stats,
        }
    }

    pub fn label(&self) -> SnapshotLabel {
        self.label
    }

    pub fn parent(&self) -> Option<SnapshotLabel> {
        self.parent
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Take the graph out, e.g. to continue building on top of it.
    pub fn into_graph(self) -> G {
        self.graph
    }
}

/// Descriptive record written alongside every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub label: SnapshotLabel,
    pub parent: Option<SnapshotLabel>,
    pub kind: GraphKind,
    pub format_version: u32,
    pub rows: usize,
    pub cols: usize,
    pub adjacency_sha256: String,
    pub metrics: GraphMetrics,
    pub ingest: IngestStats,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct MappingsRef<'a> {
    rows: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    cols: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct Mappings {
    rows: Vec<String>,
    #[serde(default)]
    cols: Option<Vec<String>>,
}

/// Write-once store of labeled snapshots for one graph kind.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn label_dir(&self, label: SnapshotLabel) -> PathBuf {
        self.root.join(label.to_string())
    }

    pub fn exists(&self, label: SnapshotLabel) -> bool {
        self.label_dir(label).join(MANIFEST_FILE).exists()
    }

    /// Persist `snapshot` under its label.
    ///
    /// Fails with [`NetworkError::AlreadyExists`] if the label was saved before;
    /// snapshots are never overwritten.
    pub fn save<G: CollaborationGraph>(
        &self,
        snapshot: &Snapshot<G>,
    ) -> Result<SnapshotManifest, NetworkError> {
        let label = snapshot.label();
        let target = self.label_dir(label);
        if target.exists() {
            return Err(NetworkError::AlreadyExists(label.to_string()));
        }

        let view = snapshot.graph().view();
        let adjacency = encode_weights(view.weights);
        let manifest = SnapshotManifest {
            label,
            parent: snapshot.parent(),
            kind: view.kind,
            format_version: FORMAT_VERSION,
            rows: view.weights.rows(),
            cols: view.weights.cols(),
            adjacency_sha256: hash_bytes(&adjacency),
            metrics: snapshot.graph().metrics(),
            ingest: snapshot.stats(),
            created_at: Utc::now(),
        };
        let mappings = MappingsRef {
            rows: view.rows.keys(),
            cols: view.cols.map(EntityIndex::keys),
        };

        // EEXIST also comes back when the root is not a directory; only a
        // present target means the label was taken.
        let write_error = |e: std::io::Error| {
            if target.exists() {
                NetworkError::AlreadyExists(label.to_string())
            } else {
                NetworkError::Io(e)
            }
        };
        let stage = StagedDir::create(&target).map_err(write_error)?;
        atomic_write(&stage.path(ADJACENCY_FILE), &adjacency)?;
        atomic_write_json(&stage.path(MAPPINGS_FILE), &mappings)?;
        // The manifest marks the bundle complete, so it goes in last.
        atomic_write_json(&stage.path(MANIFEST_FILE), &manifest)?;
        stage.publish().map_err(write_error)?;

        tracing::debug!(
            %label,
            kind = %manifest.kind,
            rows = manifest.rows,
            cols = manifest.cols,
            "snapshot saved"
        );
        Ok(manifest)
    }

    pub fn manifest(&self, label: SnapshotLabel) -> Result<SnapshotManifest, NetworkError> {
        let path = self.label_dir(label).join(MANIFEST_FILE);
        load_json(&path)?.ok_or_else(|| {
            NetworkError::not_found(format!("{label} (in {})", self.root.display()))
        })
    }

    /// Restore the snapshot saved under `label`.
    ///
    /// A label that was never saved is [`NetworkError::NotFound`]; an empty
    /// graph is never substituted.
    pub fn load<G: CollaborationGraph>(
        &self,
        label: SnapshotLabel,
    ) -> Result<Snapshot<G>, NetworkError> {
        let manifest = self.manifest(label)?;
        if manifest.kind != G::KIND {
            return Err(NetworkError::KindMismatch {
                expected: G::KIND,
                found: manifest.kind,
            });
        }
        let dir = self.label_dir(label);
        let corrupt = |reason: String| NetworkError::corrupt(label.to_string(), reason);

        let adjacency = std::fs::read(dir.join(ADJACENCY_FILE))?;
        if hash_bytes(&adjacency) != manifest.adjacency_sha256 {
            return Err(corrupt("adjacency checksum mismatch".to_string()));
        }
        let weights = decode_weights(&adjacency).map_err(corrupt)?;
        if weights.rows() != manifest.rows || weights.cols() != manifest.cols {
            return Err(corrupt(format!(
                "adjacency is {} x {}, manifest says {} x {}",
                weights.rows(),
                weights.cols(),
                manifest.rows,
                manifest.cols
            )));
        }

        let mappings: Mappings = load_json(&dir.join(MAPPINGS_FILE))?
            .ok_or_else(|| corrupt("mappings file missing".to_string()))?;
        let rows = EntityIndex::from_keys(mappings.rows).map_err(|e| corrupt(e.to_string()))?;
        let cols = mappings
            .cols
            .map(EntityIndex::from_keys)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;

        let graph = G::from_parts(GraphParts {
            kind: manifest.kind,
            rows,
            cols,
            weights,
        })
        .map_err(|e| corrupt(e.to_string()))?;

        tracing::debug!(%label, rows = manifest.rows, cols = manifest.cols, "snapshot loaded");
        Ok(Snapshot::new(label, manifest.parent, graph, manifest.ingest))
    }

    /// All complete snapshots, `base` first and then years ascending.
    pub fn list(&self) -> Result<Vec<SnapshotLabel>, NetworkError> {
        let mut labels = Vec::new();
        if !self.root.exists() {
            return Ok(labels);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Ok(label) = name.parse::<SnapshotLabel>() {
                if self.exists(label) {
                    labels.push(label);
                }
            }
        }
        labels.sort();
        Ok(labels)
    }

    /// Most recent label in the timeline, if any.
    pub fn latest(&self) -> Result<Option<SnapshotLabel>, NetworkError> {
        Ok(self.list()?.pop())
    }
}

fn encode_weights(weights: &DenseMatrix) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + weights.rows() * weights.cols() * 4);
    out.extend_from_slice(ADJACENCY_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(weights.rows() as u64).to_le_bytes());
    out.extend_from_slice(&(weights.cols() as u64).to_le_bytes());
    for row in weights.iter_rows() {
        for w in row {
            out.extend_from_slice(&w.to_le_bytes());
        }
    }
    out
}

fn decode_weights(bytes: &[u8]) -> Result<DenseMatrix, String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("adjacency file too short ({} bytes)", bytes.len()));
    }
    if &bytes[0..4] != ADJACENCY_MAGIC {
        return Err("bad adjacency magic".to_string());
    }
    let version = le_u32(&bytes[4..8]).ok_or("bad version field")?;
    if version != FORMAT_VERSION {
        return Err(format!("unsupported adjacency format version {version}"));
    }
    let rows = le_u64(&bytes[8..16]).ok_or("bad row count")? as usize;
    let cols = le_u64(&bytes[16..24]).ok_or("bad column count")? as usize;

    let body = &bytes[HEADER_LEN..];
    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(4))
        .ok_or("adjacency shape overflows")?;
    if body.len() != expected {
        return Err(format!(
            "adjacency body is {} bytes, expected {expected}",
            body.len()
        ));
    }
    let cells = body
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    DenseMatrix::from_row_major(rows, cols, cells).ok_or_else(|| "inconsistent shape".to_string())
}

fn le_u32(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn le_u64(bytes: &[u8]) -> Option<u64> {
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

/// Compute SHA-256 hash of arbitrary bytes.
fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
