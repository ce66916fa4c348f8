//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use crate::SnapshotAction;
use anyhow::Context;
use castnet_core::persistence::atomic_write;
use castnet_core::{CastnetConfig, GraphKind};
use castnet_network::features::write_tsv_path;
use castnet_network::relabel::{NameTable, relabel, write_relabel_tsv};
use castnet_network::{
    ActorDirectorGraph, ActorGraph, CollaborationGraph, EntityIndex, FeatureExtractor,
    MovieRecord, NetworkBuilder, RecordReader, Snapshot, SnapshotLabel, SnapshotStore, YearReport,
};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let load = || {
        castnet_core::load_config(Some(workspace), config_file, None)
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
    };

    match command {
        Commands::Config { action } => handle_config(action, workspace, config_file),
        Commands::Build {
            movies,
            base_corpus,
            resume_from,
            start,
            end,
            kind,
        } => {
            let config = load()?;
            let kind = kind.unwrap_or(config.network.kind);
            let plan = BuildPlan {
                movies: read_movies(&config, &movies)?,
                base: base_corpus
                    .map(|path| read_movies(&config, &path))
                    .transpose()?,
                resume_from,
                years: year_range(&config, start, end)?,
            };
            let store = store_for(&config, workspace, kind);
            let reports = match kind {
                GraphKind::Actor => build::<ActorGraph>(&store, &plan)?,
                GraphKind::ActorDirector => build::<ActorDirectorGraph>(&store, &plan)?,
            };
            print_reports(&reports);
            println!(
                "\n{} snapshot(s) written to {}",
                reports.len(),
                store.root().display()
            );
            Ok(())
        }
        Commands::Features {
            movies,
            start,
            end,
            output,
            kind,
            sequential,
        } => {
            let config = load()?;
            let kind = kind.unwrap_or(config.network.kind);
            let movies = read_movies(&config, &movies)?;
            let years = year_range(&config, start, end)?;
            let output = output.unwrap_or_else(|| workspace.join(&config.features.output));
            let store = store_for(&config, workspace, kind);
            let extractor = FeatureExtractor::new(&store, config.network.first_year)
                .with_parallel(config.features.parallel && !sequential);

            let rows = match kind {
                GraphKind::Actor => extractor.extract_range::<ActorGraph>(years, &movies),
                GraphKind::ActorDirector => {
                    extractor.extract_range::<ActorDirectorGraph>(years, &movies)
                }
            }
            .context("feature extraction failed")?;
            write_tsv_path(&rows, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote {} feature rows to {}", rows.len(), output.display());
            Ok(())
        }
        Commands::Snapshots { action } => handle_snapshots(action, &load()?, workspace),
        Commands::Relabel {
            label,
            names,
            output,
            key_column,
            name_column,
            directors,
            kind,
        } => {
            let config = load()?;
            let kind = kind.unwrap_or(config.network.kind);
            let store = store_for(&config, workspace, kind);
            let index = match kind {
                GraphKind::Actor => {
                    if directors {
                        anyhow::bail!("the actor graph has no director index");
                    }
                    let snapshot: Snapshot<ActorGraph> = store.load(label)?;
                    snapshot.graph().actors().clone()
                }
                GraphKind::ActorDirector => {
                    let snapshot: Snapshot<ActorDirectorGraph> = store.load(label)?;
                    if directors {
                        snapshot.graph().directors().clone()
                    } else {
                        snapshot.graph().actors().clone()
                    }
                }
            };
            let table = NameTable::read_path(&names, &key_column, &name_column)
                .with_context(|| format!("failed to read names from {}", names.display()))?;
            let written = write_relabeled(&index, &table, &output)?;
            println!(
                "Relabeled {} entities of snapshot {} ({} names known) -> {}",
                written,
                label,
                table.len(),
                output.display()
            );
            Ok(())
        }
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = castnet_core::config::workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            let toml_str = toml::to_string_pretty(&CastnetConfig::default())?;
            atomic_write(&config_path, toml_str.as_bytes())?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = castnet_core::load_config(Some(workspace), config_file, None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn handle_snapshots(
    action: SnapshotAction,
    config: &CastnetConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match action {
        SnapshotAction::List { kind } => {
            let kind = kind.unwrap_or(config.network.kind);
            let store = store_for(config, workspace, kind);
            let labels = store.list()?;
            if labels.is_empty() {
                println!("No {} snapshots in {}", kind, store.root().display());
                return Ok(());
            }
            println!("{} snapshots ({}):", kind, labels.len());
            println!(
                "  {:<8} {:<8} {:>8} {:>8} {:>10} {:>10}",
                "label", "parent", "rows", "cols", "edges", "movies"
            );
            for label in labels {
                let manifest = store.manifest(label)?;
                println!(
                    "  {:<8} {:<8} {:>8} {:>8} {:>10} {:>10}",
                    label.to_string(),
                    manifest
                        .parent
                        .map_or_else(|| "-".to_string(), |p| p.to_string()),
                    manifest.rows,
                    manifest.cols,
                    manifest.metrics.edges,
                    manifest.ingest.movies_applied
                );
            }
            Ok(())
        }
        SnapshotAction::Show { label, kind } => {
            let kind = kind.unwrap_or(config.network.kind);
            let store = store_for(config, workspace, kind);
            let manifest = store.manifest(label)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(())
        }
    }
}

/// Inputs of one `build` invocation.
struct BuildPlan {
    movies: Vec<MovieRecord>,
    base: Option<Vec<MovieRecord>>,
    resume_from: Option<SnapshotLabel>,
    years: RangeInclusive<i32>,
}

fn build<G: CollaborationGraph + Default>(
    store: &SnapshotStore,
    plan: &BuildPlan,
) -> anyhow::Result<Vec<YearReport>> {
    let mut builder = match plan.resume_from {
        Some(label) => NetworkBuilder::<G>::resume(store, label)
            .with_context(|| format!("cannot resume from snapshot {label}"))?,
        None => NetworkBuilder::<G>::new(store),
    };

    let mut reports = Vec::new();
    if let Some(base) = &plan.base {
        reports.push(builder.build_base(base).context("failed to build base network")?);
    }
    reports.extend(
        builder
            .run(plan.years.clone(), &plan.movies)
            .context("failed to build yearly snapshots")?,
    );
    Ok(reports)
}

fn print_reports(reports: &[YearReport]) {
    println!(
        "  {:<8} {:<8} {:>8} {:>8} {:>10} {:>10} {:>12}",
        "label", "parent", "movies", "skipped", "rows", "edges", "mean degree"
    );
    for report in reports {
        println!(
            "  {:<8} {:<8} {:>8} {:>8} {:>10} {:>10} {:>12.3}",
            report.label.to_string(),
            report
                .parent
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            report.stats.movies_applied,
            report.stats.movies_skipped,
            report.metrics.rows,
            report.metrics.edges,
            report.metrics.mean_degree
        );
    }
}

fn write_relabeled(index: &EntityIndex, names: &NameTable, output: &Path) -> anyhow::Result<usize> {
    let rows = relabel(index, names);
    let mut buf = Vec::new();
    write_relabel_tsv(&rows, &mut buf)?;
    atomic_write(output, &buf).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(rows.len())
}

fn read_movies(config: &CastnetConfig, path: &Path) -> anyhow::Result<Vec<MovieRecord>> {
    let movies = RecordReader::new(config.input.clone())
        .read_path(path)
        .with_context(|| format!("failed to read movies from {}", path.display()))?;
    tracing::info!(path = %path.display(), movies = movies.len(), "movie table loaded");
    Ok(movies)
}

fn year_range(
    config: &CastnetConfig,
    start: Option<i32>,
    end: Option<i32>,
) -> anyhow::Result<RangeInclusive<i32>> {
    let start = start.unwrap_or(config.network.first_year);
    let end = end.unwrap_or(config.network.last_year);
    if start > end {
        anyhow::bail!("start year {} is after end year {}", start, end);
    }
    Ok(start..=end)
}

fn store_for(config: &CastnetConfig, workspace: &Path, kind: GraphKind) -> SnapshotStore {
    let root: PathBuf = config.network.snapshot_root(workspace, kind);
    SnapshotStore::new(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const MOVIES: &str = "tconst\tstartYear\tactors\tdirectors\n\
        tt1\t2000\tnm1,nm2\tdr1\n\
        tt2\t2001\tnm1,nm3\tdr1\n\
        tt3\t2002\tnm2,nm3\tdr2\n";

    fn workspace_with_movies() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let movies = dir.path().join("movies.tsv");
        std::fs::write(&movies, MOVIES).unwrap();
        (dir, movies)
    }

    fn build_command(movies: &Path, kind: GraphKind) -> Commands {
        Commands::Build {
            movies: movies.to_path_buf(),
            base_corpus: None,
            resume_from: None,
            start: Some(1999),
            end: Some(2002),
            kind: Some(kind),
        }
    }

    #[test]
    fn test_build_then_features() {
        let (dir, movies) = workspace_with_movies();
        let ws = dir.path();
        handle_command(build_command(&movies, GraphKind::Actor), ws, None).unwrap();

        let store = SnapshotStore::new(ws.join(".castnet/snapshots/actor"));
        assert_eq!(
            store.list().unwrap(),
            (1999..=2002).map(SnapshotLabel::Year).collect::<Vec<_>>()
        );

        let output = ws.join("features.tsv");
        handle_command(
            Commands::Features {
                movies: movies.clone(),
                start: Some(2000),
                end: Some(2002),
                output: Some(output.clone()),
                kind: Some(GraphKind::Actor),
                sequential: true,
            },
            ws,
            None,
        )
        .unwrap_err();

        // network.first_year defaults to 2000, which reads `base`; point it at 1999.
        std::fs::create_dir_all(ws.join(".castnet")).unwrap();
        std::fs::write(
            ws.join(".castnet/config.toml"),
            "[network]\nfirst_year = 1999\n",
        )
        .unwrap();
        handle_command(
            Commands::Features {
                movies,
                start: Some(2000),
                end: Some(2002),
                output: Some(output.clone()),
                kind: Some(GraphKind::Actor),
                sequential: true,
            },
            ws,
            None,
        )
        .unwrap();
        let table = std::fs::read_to_string(&output).unwrap();
        assert_eq!(table.lines().count(), 4);
        assert!(table.lines().nth(1).unwrap().starts_with("tt1\t2000\t0\t0\t2"));
    }

    #[test]
    fn test_relabel_directors() {
        let (dir, movies) = workspace_with_movies();
        let ws = dir.path();
        handle_command(build_command(&movies, GraphKind::ActorDirector), ws, None).unwrap();

        let names = ws.join("names.tsv");
        std::fs::write(&names, "nconst\tprimaryName\ndr1\tAgnes Varda\n").unwrap();
        let output = ws.join("directors.tsv");
        handle_command(
            Commands::Relabel {
                label: SnapshotLabel::Year(2002),
                names,
                output: output.clone(),
                key_column: "nconst".to_string(),
                name_column: "primaryName".to_string(),
                directors: true,
                kind: Some(GraphKind::ActorDirector),
            },
            ws,
            None,
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "index\tkey\tname\n0\tdr1\tAgnes Varda\n1\tdr2\tdr2\n"
        );
    }

    #[test]
    fn test_rebuild_existing_year_fails() {
        let (dir, movies) = workspace_with_movies();
        let ws = dir.path();
        handle_command(build_command(&movies, GraphKind::Actor), ws, None).unwrap();
        assert!(handle_command(build_command(&movies, GraphKind::Actor), ws, None).is_err());
    }

    #[test]
    fn test_year_range_rejects_inverted() {
        let config = CastnetConfig::default();
        assert!(year_range(&config, Some(2005), Some(2001)).is_err());
        assert_eq!(year_range(&config, None, Some(2001)).unwrap(), 2000..=2001);
    }

    #[test]
    fn test_config_init_writes_workspace_file() {
        let dir = TempDir::new().unwrap();
        handle_config(ConfigAction::Init, dir.path(), None).unwrap();
        let path = castnet_core::config::workspace_config_path(dir.path());
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("[network]"));
    }
}
