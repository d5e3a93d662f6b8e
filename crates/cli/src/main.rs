//! Shiori CLI - level time estimates and recent-mistake sync.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use shiori_core::{Assignment, ItemId, LevelProgression, SubjectKind, Time};
use shiori_progress::{average_remaining_level_time, ProjectedCompletion, TimeEstimator, WaniKaniSchedule};
use shiori_storage::JsonFileStore;
use shiori_sync::{SyncConfig, SyncCoordinator};

#[derive(Parser)]
#[command(name = "shiori")]
#[command(about = "Level progress estimates and cross-device mistake sync", long_about = None)]
struct Cli {
    /// Local data directory
    #[arg(long, global = true, default_value = ".shiori")]
    data_dir: PathBuf,

    /// Directory shared between devices, standing in for the cloud store
    #[arg(long, global = true, default_value = ".shiori-cloud")]
    cloud_dir: PathBuf,

    /// Prefix for the mistake ledger key
    #[arg(long, global = true)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate when the current level's items reach Guru and when the next
    /// review that counts towards level-up is due
    Estimate {
        /// JSON file holding the current level's assignments
        assignments: PathBuf,
        /// JSON file holding level progression history
        #[arg(long)]
        levels: Option<PathBuf>,
        /// Subject kind that counts towards level-up
        #[arg(long, default_value = "kanji")]
        kind: String,
    },
    /// Record a mistake on an item and sync
    Record {
        /// Subject ID
        item_id: i32,
    },
    /// Sync recent mistakes with the shared store
    Sync,
    /// List items missed in the last 24 hours
    Mistakes,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate { assignments, levels, kind } => {
            let kind = parse_kind(&kind).with_context(|| format!("Unknown subject kind: {kind}"))?;
            let assignments: Vec<Assignment> = read_json(&assignments).await?;
            let levels: Vec<LevelProgression> = match levels {
                Some(path) => read_json(&path).await?,
                None => Vec::new(),
            };

            let now = Utc::now();
            let average = average_remaining_level_time(&levels, now);
            let estimator = TimeEstimator::new().with_kind(kind);

            match estimator.estimate_checked(&assignments, average, &WaniKaniSchedule, now)? {
                Some(projection) => println!("{}", describe(projection, now)),
                None => println!("No projection available"),
            }
            let next_review = estimator.next_level_up_review(&assignments, now);
            println!("{}", describe_next_review(next_review, now));
        }
        Commands::Record { item_id } => {
            let coordinator = open_coordinator(&cli.data_dir, &cli.cloud_dir, cli.prefix).await?;
            coordinator.restore().await?;
            coordinator.record(ItemId(item_id)).await;
            match coordinator.sync().await {
                Ok(ledger) => info!("Synced {} recent mistakes", ledger.len()),
                Err(e) => warn!("Recorded locally, sync failed: {e}"),
            }
            println!("Recorded mistake on {}", item_id);
        }
        Commands::Sync => {
            let coordinator = open_coordinator(&cli.data_dir, &cli.cloud_dir, cli.prefix).await?;
            coordinator.restore().await?;
            match coordinator.sync().await {
                Ok(ledger) => println!("Synced {} recent mistakes", ledger.len()),
                Err(e) => println!("Sync skipped: {e}"),
            }
        }
        Commands::Mistakes => {
            let coordinator = open_coordinator(&cli.data_dir, &cli.cloud_dir, cli.prefix).await?;
            let ledger = coordinator.restore().await?;
            let now = Utc::now();

            println!("Recent mistakes ({})", ledger.len());
            for entry in ledger.iter() {
                println!("  {} | {} ago", entry.item_id, interval_string(now - entry.last_missed_at));
            }
        }
    }

    Ok(())
}

async fn open_coordinator(data_dir: &Path, cloud_dir: &Path, prefix: Option<String>) -> Result<SyncCoordinator> {
    let local = JsonFileStore::new(data_dir).await?;
    let cloud = JsonFileStore::new(cloud_dir).await?;

    let mut config = SyncConfig::default();
    if let Some(prefix) = prefix {
        config = config.with_key_prefix(prefix);
    }

    Ok(SyncCoordinator::new(Arc::new(cloud))
        .with_local_store(Arc::new(local))
        .with_config(config))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_kind(s: &str) -> Option<SubjectKind> {
    match s.to_lowercase().as_str() {
        "radical" => Some(SubjectKind::Radical),
        "kanji" => Some(SubjectKind::Kanji),
        "vocabulary" => Some(SubjectKind::Vocabulary),
        "kana_vocabulary" | "kana-vocabulary" => Some(SubjectKind::KanaVocabulary),
        _ => None,
    }
}

fn describe(projection: ProjectedCompletion, now: Time) -> String {
    let title = if projection.is_estimate() { "Time remaining (estimated)" } else { "Time remaining" };
    let finish = projection.date();
    if finish < now {
        format!("{title}: Now")
    } else {
        format!("{title}: {}", interval_string(finish - now))
    }
}

fn describe_next_review(review: Option<Time>, now: Time) -> String {
    match review {
        None => "Next level-up review: N/A".to_string(),
        Some(at) if at < now => "Next level-up review: Now".to_string(),
        Some(at) => format!("Next level-up review: {}", interval_string(at - now)),
    }
}

/// Days and hours; minutes only once no hours are left.
fn interval_string(interval: Duration) -> String {
    let days = interval.num_days();
    let hours = interval.num_hours() - days * 24;
    let minutes = if hours > 0 { 0 } else { interval.num_minutes() - interval.num_hours() * 60 };

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.join(" ")
}
