//! castnet CLI — build yearly collaboration-network snapshots and score movies against them.

mod commands;

use castnet_core::GraphKind;
use castnet_network::SnapshotLabel;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// castnet: temporal actor collaboration networks
#[derive(Parser, Debug)]
#[command(name = "castnet", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ingest movies year by year and save one snapshot per year
    Build {
        /// Movie credits table (TSV with a header row)
        #[arg(long)]
        movies: PathBuf,
        /// Historical corpus applied without a year cutoff and saved as `base`
        #[arg(long)]
        base_corpus: Option<PathBuf>,
        /// Continue from an existing snapshot (e.g. `base`, `2004`)
        #[arg(long, conflicts_with = "base_corpus")]
        resume_from: Option<SnapshotLabel>,
        /// First year to ingest (defaults to network.first_year)
        #[arg(long)]
        start: Option<i32>,
        /// Last year to ingest, inclusive (defaults to network.last_year)
        #[arg(long)]
        end: Option<i32>,
        /// Graph kind: actor, actor-director
        #[arg(long)]
        kind: Option<GraphKind>,
    },
    /// Compute leakage-safe features for every movie in a year range
    Features {
        /// Movie credits table (TSV with a header row)
        #[arg(long)]
        movies: PathBuf,
        /// First year to score (defaults to network.first_year)
        #[arg(long)]
        start: Option<i32>,
        /// Last year to score, inclusive (defaults to network.last_year)
        #[arg(long)]
        end: Option<i32>,
        /// Output TSV (defaults to features.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Graph kind: actor, actor-director
        #[arg(long)]
        kind: Option<GraphKind>,
        /// Compute rows on a single thread
        #[arg(long)]
        sequential: bool,
    },
    /// Inspect saved snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
    /// Write a snapshot's entity mapping with display names
    Relabel {
        /// Snapshot label (e.g. `base`, `2004`)
        label: SnapshotLabel,
        /// Name table (TSV with a header row)
        #[arg(long)]
        names: PathBuf,
        /// Output TSV
        #[arg(short, long)]
        output: PathBuf,
        /// Key column of the name table
        #[arg(long, default_value = "nconst")]
        key_column: String,
        /// Name column of the name table
        #[arg(long, default_value = "primaryName")]
        name_column: String,
        /// Relabel the director index instead of the actor index (actor-director only)
        #[arg(long)]
        directors: bool,
        /// Graph kind: actor, actor-director
        #[arg(long)]
        kind: Option<GraphKind>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum SnapshotAction {
    /// List saved snapshots in timeline order
    List {
        /// Graph kind: actor, actor-director
        #[arg(long)]
        kind: Option<GraphKind>,
    },
    /// Print a snapshot's manifest as JSON
    Show {
        /// Snapshot label (e.g. `base`, `2004`)
        label: SnapshotLabel,
        /// Graph kind: actor, actor-director
        #[arg(long)]
        kind: Option<GraphKind>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default configuration file in the workspace
    Init,
    /// Show the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Human-readable stderr plus JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "castnet", "castnet")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "castnet.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "castnet",
            "-vv",
            "build",
            "--movies",
            "movies.tsv",
            "--resume-from",
            "snapshot_2004",
            "--start",
            "2005",
            "--end",
            "2006",
            "--kind",
            "actor-director",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build {
                resume_from,
                start,
                kind,
                ..
            } => {
                assert_eq!(resume_from, Some(SnapshotLabel::Year(2004)));
                assert_eq!(start, Some(2005));
                assert_eq!(kind, Some(GraphKind::ActorDirector));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_base_corpus_conflicts_with_resume() {
        let result = Cli::try_parse_from([
            "castnet",
            "build",
            "--movies",
            "m.tsv",
            "--base-corpus",
            "b.tsv",
            "--resume-from",
            "base",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_snapshot_show_base() {
        let cli = Cli::try_parse_from(["castnet", "snapshots", "show", "base_network"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Snapshots {
                action: SnapshotAction::Show {
                    label: SnapshotLabel::Base,
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = Cli::try_parse_from(["castnet", "snapshots", "list", "--kind", "crew"]);
        assert!(result.is_err());
    }
}
