use std::path::{Path, PathBuf};
use std::sync::Arc;

use canvas::{CanvasElement, CanvasEngine, ElementId, InputEvent};
use clap::{Parser, Subcommand};
use messages::{
    FileCache, HttpMessageApi, LoadOptions, LoadProgress, LoadSource, MemoryCache, Message, MessageCache, MessageSync, SyncConfig,
    SyncError, load_with_fallback, merge,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON in {}: {source}", .path.display())]
    InvalidJson { path: PathBuf, source: serde_json::Error },
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "replay", about = "Replay Builder message history and canvas tools")]
struct Cli {
    /// Overrides `REPLAY_API_BASE_URL`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a project's full history, reconciled with the local cache.
    Load {
        project: String,
        /// Directory for the file-backed cache; in-memory when omitted.
        #[arg(long, env = "REPLAY_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
        /// Print the messages instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch the most recent page, oldest first.
    Recent {
        project: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Fetch one ascending page starting at `offset`.
    Older {
        project: String,
        #[arg(long)]
        offset: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Merge two JSON message arrays offline (server first).
    Merge { server: PathBuf, local: PathBuf },
    /// Replay a recorded input-event stream against an element list.
    Canvas { elements: PathBuf, events: PathBuf },
}

/// Final state after replaying canvas input.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CanvasReport {
    elements: Vec<CanvasElement>,
    selected: Vec<ElementId>,
    undo_depth: usize,
    redo_depth: usize,
    actions: usize,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_url = cli.base_url.as_deref();
    match cli.command {
        Command::Load { project, cache_dir, json } => run_load(base_url, &project, cache_dir, json).await,
        Command::Recent { project, limit } => {
            let sync = connect(base_url)?;
            print_json(&sync.load_recent(&project, limit).await?)
        }
        Command::Older { project, offset, limit } => {
            let sync = connect(base_url)?;
            print_json(&sync.load_older_page(&project, offset, limit).await?)
        }
        Command::Merge { server, local } => run_merge(&server, &local),
        Command::Canvas { elements, events } => {
            let elements: Vec<CanvasElement> = read_json(&elements)?;
            let events: Vec<InputEvent> = read_json(&events)?;
            print_json(&replay_canvas(elements, &events))
        }
    }
}

fn load_config(base_url: Option<&str>) -> Result<SyncConfig, CliError> {
    let mut config = SyncConfig::from_env()?;
    if let Some(url) = base_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    Ok(config)
}

fn connect(base_url: Option<&str>) -> Result<MessageSync, CliError> {
    let config = load_config(base_url)?;
    let api = HttpMessageApi::from_config(&config)?;
    Ok(MessageSync::new(Arc::new(api)))
}

async fn run_load(base_url: Option<&str>, project: &str, cache_dir: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(base_url)?;
    let sync = MessageSync::new(Arc::new(HttpMessageApi::from_config(&config)?));
    let cache: Box<dyn MessageCache> = match cache_dir {
        Some(dir) => Box::new(FileCache::new(dir)),
        None => Box::new(MemoryCache::new()),
    };

    let result = load_with_fallback(&sync, cache.as_ref(), project, &LoadOptions::from(&config), |p: LoadProgress| {
        if p.is_rate_limited {
            tracing::info!(page = p.page, loaded = p.loaded, "rate limited; backing off");
        } else {
            tracing::info!(page = p.page, loaded = p.loaded, total = ?p.total, complete = p.is_complete, "progress");
        }
    })
    .await?;

    if result.is_partial {
        tracing::warn!(loaded = result.messages.len(), "some history may be missing");
    }
    if json {
        return print_json(&result.messages);
    }
    println!(
        "{project}: {} messages ({} total) from {}; server {}, local {}{}",
        result.messages.len(),
        result.total,
        source_label(result.source),
        result.loaded_from_server,
        result.loaded_from_local,
        if result.is_partial { ", partial" } else { "" },
    );
    Ok(())
}

fn run_merge(server: &Path, local: &Path) -> Result<(), CliError> {
    let server: Vec<Message> = read_json(server)?;
    let local: Vec<Message> = read_json(local)?;
    let outcome = merge(server, local);
    tracing::info!(
        from_server = outcome.from_server,
        local_only = outcome.local_only,
        duplicates_removed = outcome.duplicates_removed,
        "merged"
    );
    print_json(&outcome.messages)
}

fn replay_canvas(elements: Vec<CanvasElement>, events: &[InputEvent]) -> CanvasReport {
    let mut engine = CanvasEngine::new();
    engine.load_elements(elements);
    let actions: usize = events.iter().map(|event| engine.handle_event(event).len()).sum();
    CanvasReport {
        elements: engine.elements.snapshot(),
        selected: engine.selected().to_vec(),
        undo_depth: engine.history.undo_depth(),
        redo_depth: engine.history.redo_depth(),
        actions,
    }
}

fn source_label(source: LoadSource) -> &'static str {
    match source {
        LoadSource::Server => "server",
        LoadSource::Local => "local",
        LoadSource::Merged => "merged",
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| CliError::InvalidJson { path: path.to_path_buf(), source })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
