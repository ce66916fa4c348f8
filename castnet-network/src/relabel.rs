//! Presentation-layer renaming of entity keys.
//!
//! Snapshots always store opaque credit keys. Turning those into display
//! names (e.g. IMDb `nconst` into `primaryName`) happens here, on a copy of
//! the mapping, and never feeds back into a stored snapshot.

use crate::entity::EntityIndex;
use crate::error::NetworkError;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

/// Key-to-name lookup table.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: HashMap<String, String>,
}

impl NameTable {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a tab-separated table with a header, taking two named columns.
    pub fn read_tsv(
        content: &str,
        key_column: &str,
        name_column: &str,
    ) -> Result<Self, NetworkError> {
        let mut lines = content.lines();
        let header: Vec<&str> = lines
            .next()
            .ok_or_else(|| NetworkError::invalid_input("empty name table"))?
            .split('\t')
            .map(str::trim)
            .collect();
        let column = |name: &str| {
            header
                .iter()
                .position(|h| *h == name)
                .ok_or_else(|| NetworkError::invalid_input(format!("missing column '{name}'")))
        };
        let (key_col, name_col) = (column(key_column)?, column(name_column)?);

        let mut names = HashMap::new();
        for line in lines {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if let (Some(key), Some(name)) = (fields.get(key_col), fields.get(name_col)) {
                if !key.is_empty() && !name.is_empty() {
                    names.insert(key.to_string(), name.to_string());
                }
            }
        }
        Ok(Self { names })
    }

    pub fn read_path(
        path: &Path,
        key_column: &str,
        name_column: &str,
    ) -> Result<Self, NetworkError> {
        let content = std::fs::read_to_string(path)?;
        Self::read_tsv(&content, key_column, name_column)
    }

    pub fn name(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One entry of a relabeled mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelabeledEntity {
    pub index: usize,
    pub key: String,
    pub name: String,
}

/// Display names for every entity in index order. Unknown keys keep their key.
pub fn relabel(index: &EntityIndex, names: &NameTable) -> Vec<RelabeledEntity> {
    index
        .iter()
        .map(|(idx, key)| RelabeledEntity {
            index: idx,
            key: key.to_string(),
            name: names.name(key).unwrap_or(key).to_string(),
        })
        .collect()
}

pub fn write_relabel_tsv<W: Write>(rows: &[RelabeledEntity], mut out: W) -> io::Result<()> {
    writeln!(out, "index\tkey\tname")?;
    for row in rows {
        writeln!(out, "{}\t{}\t{}", row.index, row.key, row.name)?;
    }
    out.flush()
}
