//! Configuration system for castnet.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from the platform config directory (`castnet/config.toml`) and/or
//! `.castnet/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastnetConfig {
    /// How movie-credit TSV files are laid out.
    #[serde(default)]
    pub input: InputConfig,
    /// Graph shape, snapshot location, and tracked year range.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Feature extraction settings.
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl CastnetConfig {
    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.network.first_year > self.network.last_year {
            return Err(CoreError::invalid_config(format!(
                "network.first_year ({}) is after network.last_year ({})",
                self.network.first_year, self.network.last_year
            )));
        }
        if self.input.delimiter == self.input.list_separator {
            return Err(CoreError::invalid_config(
                "input.delimiter and input.list_separator must differ",
            ));
        }
        if self.input.id_column.trim().is_empty() || self.input.cast_column.trim().is_empty() {
            return Err(CoreError::invalid_config(
                "input.id_column and input.cast_column must be set",
            ));
        }
        Ok(())
    }
}

/// Shape of the collaboration graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphKind {
    /// Square, symmetric actor-actor graph.
    #[default]
    Actor,
    /// Rectangular actor (rows) by director (columns) graph.
    ActorDirector,
}

impl GraphKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::ActorDirector => "actor-director",
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GraphKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "actor" | "actors" | "unipartite" => Ok(Self::Actor),
            "actor-director" | "actor_director" | "bipartite" => Ok(Self::ActorDirector),
            other => Err(CoreError::invalid_config(format!(
                "unknown graph kind '{other}' (expected 'actor' or 'actor-director')"
            ))),
        }
    }
}

/// Column layout of movie-credit TSV input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Separator between keys inside a credit list field.
    #[serde(default = "default_list_separator")]
    pub list_separator: char,
    /// Column holding the movie identifier.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Column holding the release year as an integer.
    #[serde(default = "default_year_column")]
    pub year_column: String,
    /// Column holding a `YYYY-MM-DD` release date, used when the year column is absent.
    #[serde(default = "default_release_date_column")]
    pub release_date_column: Option<String>,
    /// Column holding the cast list.
    #[serde(default = "default_cast_column")]
    pub cast_column: String,
    /// Column holding the director list (bipartite graphs only).
    #[serde(default = "default_crew_column")]
    pub crew_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            list_separator: default_list_separator(),
            id_column: default_id_column(),
            year_column: default_year_column(),
            release_date_column: default_release_date_column(),
            cast_column: default_cast_column(),
            crew_column: default_crew_column(),
        }
    }
}

fn default_delimiter() -> char {
    '\t'
}

fn default_list_separator() -> char {
    ','
}

fn default_id_column() -> String {
    "tconst".to_string()
}

fn default_year_column() -> String {
    "startYear".to_string()
}

fn default_release_date_column() -> Option<String> {
    Some("release_date".to_string())
}

fn default_cast_column() -> String {
    "actors".to_string()
}

fn default_crew_column() -> String {
    "directors".to_string()
}

/// Network construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub kind: GraphKind,
    /// Root directory for snapshots; each graph kind gets its own subdirectory.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    /// First tracked year. Its features are computed against the `base` snapshot.
    #[serde(default = "default_first_year")]
    pub first_year: i32,
    /// Last tracked year (inclusive).
    #[serde(default = "default_last_year")]
    pub last_year: i32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            kind: GraphKind::default(),
            snapshot_dir: default_snapshot_dir(),
            first_year: default_first_year(),
            last_year: default_last_year(),
        }
    }
}

impl NetworkConfig {
    /// Directory holding the snapshots for `kind`, resolved against `workspace`.
    pub fn snapshot_root(&self, workspace: &Path, kind: GraphKind) -> PathBuf {
        let dir = Path::new(&self.snapshot_dir);
        let base = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            workspace.join(dir)
        };
        base.join(kind.as_str())
    }
}

fn default_snapshot_dir() -> String {
    ".castnet/snapshots".to_string()
}

fn default_first_year() -> i32 {
    2000
}

fn default_last_year() -> i32 {
    2024
}

/// Feature extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Compute rows within a year on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Default output path for the feature table.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "movie_network_features.tsv".to_string()
}

fn default_true() -> bool {
    true
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "castnet", "castnet")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-local config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".castnet").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `CASTNET_`, nested with `__`)
/// 3. Explicit config file, else workspace-local config (`.castnet/config.toml`)
/// 4. User config (`<config dir>/castnet/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&CastnetConfig>,
) -> Result<CastnetConfig, CoreError> {
    let mut figment = Figment::from(Serialized::defaults(CastnetConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    match (config_file, workspace) {
        (Some(file), _) => {
            if !file.exists() {
                return Err(CoreError::invalid_config(format!(
                    "config file not found: {}",
                    file.display()
                )));
            }
            figment = figment.merge(Toml::file(file));
        }
        (None, Some(ws)) => {
            let ws_config = workspace_config_path(ws);
            if ws_config.exists() {
                figment = figment.merge(Toml::file(&ws_config));
            }
        }
        (None, None) => {}
    }

    // CASTNET_NETWORK__KIND, CASTNET_INPUT__CAST_COLUMN, ...
    figment = figment.merge(Env::prefixed("CASTNET_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: CastnetConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    tracing::debug!(kind = %config.network.kind, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CastnetConfig::default();
        assert_eq!(config.input.delimiter, '\t');
        assert_eq!(config.input.list_separator, ',');
        assert_eq!(config.input.id_column, "tconst");
        assert_eq!(config.network.kind, GraphKind::Actor);
        assert_eq!(config.network.first_year, 2000);
        assert!(config.features.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = CastnetConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: CastnetConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: CastnetConfig = toml::from_str(
            r#"
            [network]
            kind = "actor-director"
            first_year = 2017
            "#,
        )
        .unwrap();
        assert_eq!(parsed.network.kind, GraphKind::ActorDirector);
        assert_eq!(parsed.network.first_year, 2017);
        assert_eq!(parsed.network.last_year, 2024);
        assert_eq!(parsed.input.cast_column, "actors");
    }

    #[test]
    fn test_validate_rejects_inverted_years() {
        let mut config = CastnetConfig::default();
        config.network.first_year = 2010;
        config.network.last_year = 2005;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_graph_kind_parse() {
        assert_eq!("actor".parse::<GraphKind>().unwrap(), GraphKind::Actor);
        assert_eq!(
            "Actor-Director".parse::<GraphKind>().unwrap(),
            GraphKind::ActorDirector
        );
        assert_eq!(
            "bipartite".parse::<GraphKind>().unwrap(),
            GraphKind::ActorDirector
        );
        assert!("crew".parse::<GraphKind>().is_err());
    }

    #[test]
    fn test_snapshot_root_per_kind() {
        let config = NetworkConfig::default();
        let root = config.snapshot_root(Path::new("/ws"), GraphKind::ActorDirector);
        assert_eq!(root, PathBuf::from("/ws/.castnet/snapshots/actor-director"));
    }
}
