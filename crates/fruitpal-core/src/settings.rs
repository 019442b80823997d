use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::InputFormat;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Determine the cost of fruit trades based on the trading country
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fruitpal",
    about = "Determine the cost of fruit trades based on the trading country",
    version,
    arg_required_else_help = true
)]
pub struct Settings {
    /// Path to the trade data file
    #[arg(long, global = true)]
    pub file_path: Option<PathBuf>,

    /// Input file format
    #[arg(long, global = true, default_value = "auto", value_parser = ["auto", "json", "flat"])]
    pub format: String,

    /// Logging level
    #[arg(long, global = true, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the total cost of a trade with each country for a commodity
    Cost {
        /// The type of fruit being traded
        commodity: String,
        /// The cost per ton of the fruit
        #[arg(allow_negative_numbers = true)]
        price_per_ton: f64,
        /// The total volume of fruit in tons
        #[arg(allow_negative_numbers = true)]
        trade_volume: f64,
    },
    /// List all commodities or countries in the data file
    Show {
        /// commodity or country
        key: String,
    },
    /// Keep an aggregate of the data file up to date as it changes
    Watch {
        /// Directory to watch (defaults to the data file's directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Only changes to files with this suffix trigger a refresh
        #[arg(long, default_value = ".txt")]
        suffix: String,
    },
}

// ── FileConfig ─────────────────────────────────────────────────────────────────

/// Optional defaults read from `~/.fruitpal/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_suffix: Option<String>,
}

impl FileConfig {
    /// Default location of the config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".fruitpal").join("config.json")
    }

    /// Load from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and fill unset options from the config file.
    pub fn load() -> Self {
        Self::load_impl(std::env::args_os().collect(), &FileConfig::config_path())
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);
        let config = FileConfig::load_from(config_path);

        // CLI always wins over the config file.
        if settings.file_path.is_none() {
            settings.file_path = config.file_path;
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = config.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "log_level") {
            if let Some(v) = config.log_level {
                settings.log_level = v;
            }
        }
        if let Command::Watch { dir, suffix } = &mut settings.command {
            let watch_matches = matches.subcommand_matches("watch");
            if dir.is_none() {
                *dir = config.watch_dir;
            }
            let suffix_set = watch_matches
                .map(|m| is_arg_explicitly_set(m, "suffix"))
                .unwrap_or(false);
            if !suffix_set {
                if let Some(v) = config.watch_suffix {
                    *suffix = v;
                }
            }
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// The selected input format.
    pub fn input_format(&self) -> Result<InputFormat> {
        self.format.parse()
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
