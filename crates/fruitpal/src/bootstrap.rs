use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Relative location of the bundled data file.
const DEFAULT_DATA_FILE: &str = "Data/fruit_data.txt";

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber on stderr.
///
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(tracing_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

/// Map a `--log-level` name to a tracing filter directive.
fn tracing_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate the trade data file when `--file-path` was not given.
///
/// Checks, in order, and returns the first that exists:
/// 1. `./Data/fruit_data.txt`
/// 2. `~/.fruitpal/fruit_data.txt`
///
/// Falls back to `./Data/fruit_data.txt` so a missing file is reported
/// against the conventional location.
pub fn discover_data_path() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_data_path_in(&cwd, dirs::home_dir().as_deref())
}

fn discover_data_path_in(cwd: &Path, home: Option<&Path>) -> PathBuf {
    let local = cwd.join(DEFAULT_DATA_FILE);
    let mut candidates = vec![local.clone()];
    if let Some(home) = home {
        candidates.push(home.join(".fruitpal").join("fruit_data.txt"));
    }
    candidates.into_iter().find(|p| p.is_file()).unwrap_or(local)
}

/// Directory watched by `fruitpal watch` when `--dir` is not given.
pub fn default_watch_dir(data_path: &Path) -> PathBuf {
    match data_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
