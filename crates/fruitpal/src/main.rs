mod bootstrap;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use fruitpal_core::calculations::CostCalculator;
use fruitpal_core::formatting::{format_cost_line, format_listing};
use fruitpal_core::models::InputFormat;
use fruitpal_core::settings::{Command, Settings};
use fruitpal_core::FruitpalError;
use fruitpal_data::aggregator::{ListKey, TradeAggregator};
use fruitpal_data::reader::{load_entries, load_records};
use fruitpal_runtime::orchestrator::WatchOrchestrator;
use fruitpal_runtime::refresh_controller::SnapshotReader;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = Settings::load();

    if let Err(e) = bootstrap::setup_logging(&settings.log_level) {
        eprintln!("Warning: logging unavailable: {e}");
    }

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(settings: Settings) -> Result<()> {
    let format = settings.input_format()?;
    let data_path = settings
        .file_path
        .clone()
        .unwrap_or_else(bootstrap::discover_data_path);

    tracing::info!("Fruitpal v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %data_path.display(), ?format, "resolved data file");

    match settings.command {
        Command::Cost {
            commodity,
            price_per_ton,
            trade_volume,
        } => run_cost(&data_path, format, &commodity, price_per_ton, trade_volume)?,
        Command::Show { key } => run_show(&data_path, format, &key)?,
        Command::Watch { dir, suffix } => run_watch(data_path, format, dir, &suffix).await?,
    }

    Ok(())
}

// ── Commands ───────────────────────────────────────────────────────────────────

fn run_cost(
    data_path: &Path,
    format: InputFormat,
    commodity: &str,
    price_per_ton: f64,
    trade_volume: f64,
) -> fruitpal_core::Result<()> {
    // Reject bad arguments before touching the data file.
    CostCalculator::validate_trade_args(price_per_ton, trade_volume)?;

    let records = load_records(data_path, format)?;
    let lines = CostCalculator::compute_cost(&records, commodity, price_per_ton, trade_volume)?;
    for line in &lines {
        println!("{}", format_cost_line(line));
    }
    Ok(())
}

fn run_show(data_path: &Path, format: InputFormat, key: &str) -> fruitpal_core::Result<()> {
    let key: ListKey = key.parse()?;

    let entries = load_entries(data_path, format)?;
    let snapshot = TradeAggregator::aggregate(&entries);
    let values = TradeAggregator::values_for(&snapshot, key);
    println!("{}", format_listing(key.as_str(), &values));
    Ok(())
}

async fn run_watch(
    data_path: PathBuf,
    format: InputFormat,
    dir: Option<PathBuf>,
    suffix: &str,
) -> Result<()> {
    let watch_dir = dir.unwrap_or_else(|| bootstrap::default_watch_dir(&data_path));
    let (mut reader, handle) = WatchOrchestrator::new(&data_path, format, &watch_dir, suffix)
        .start()
        .await?;

    print_snapshot(&reader)?;
    loop {
        tokio::select! {
            changed = reader.changed() => {
                if !changed {
                    break;
                }
                print_snapshot(&reader)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping watch");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}

fn print_snapshot(reader: &SnapshotReader) -> Result<()> {
    let snapshot = reader.current();
    println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    Ok(())
}

// ── Error reporting ────────────────────────────────────────────────────────────

fn report(err: &anyhow::Error) -> ExitCode {
    let Some(err) = err.downcast_ref::<FruitpalError>() else {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    };

    match err {
        FruitpalError::NotFound(_) => {
            eprintln!("Error: {err}. Please run fruitpal show commodity for valid values")
        }
        FruitpalError::UnknownKey { key, valid } => {
            eprintln!("Error: List of the value {key} is not available.");
            eprintln!("Please choose from these options:");
            for option in valid {
                eprintln!("{option}");
            }
        }
        _ => eprintln!("Error: {err}"),
    }
    ExitCode::from(err.exit_code())
}
