// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use tracing::info;

use cycle_tracker::config::init_tracing;
use cycle_tracker::{load_periods, AppConfig, CyclePredictor, CycleReport, PredictionStrategy, DATE_FORMAT};

const USAGE: &str = "Usage:
  cycle-tracker                         interactive form (TUI)
  cycle-tracker predict <periods.csv> [--as-of YYYY-MM-DD] [--strategy average|last] [--json]";

#[derive(Debug, PartialEq)]
struct PredictArgs {
    csv_path: PathBuf,
    as_of: Option<NaiveDate>,
    strategy: Option<PredictionStrategy>,
    json: bool,
}

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("predict") => run_predict(&config, parse_predict_args(&args[1..])?)?,
        Some("help") | Some("--help") | Some("-h") => println!("{}", USAGE),
        Some(other) => bail!("Unknown command: {}\n{}", other, USAGE),
        None => run_ui_mode(&config)?,
    }

    Ok(())
}

fn parse_predict_args(args: &[String]) -> Result<PredictArgs> {
    let mut csv_path = None;
    let mut as_of = None;
    let mut strategy = None;
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--as-of" => {
                let value = iter.next().context("--as-of needs a date")?;
                as_of = Some(
                    NaiveDate::parse_from_str(value, DATE_FORMAT)
                        .with_context(|| format!("Invalid --as-of date: {}", value))?,
                );
            }
            "--strategy" => {
                let value = iter.next().context("--strategy needs a value")?;
                strategy = Some(value.parse()?);
            }
            "--json" => json = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {}\n{}", flag, USAGE),
            path if csv_path.is_none() => csv_path = Some(PathBuf::from(path)),
            extra => bail!("Unexpected argument: {}\n{}", extra, USAGE),
        }
    }

    Ok(PredictArgs {
        csv_path: csv_path.with_context(|| format!("Missing CSV path\n{}", USAGE))?,
        as_of,
        strategy,
        json,
    })
}

fn run_predict(config: &AppConfig, args: PredictArgs) -> Result<()> {
    let history = load_periods(&args.csv_path)?;
    info!(path = ?args.csv_path, periods = history.len(), "loaded period history");

    let mut predictor = config.prediction.apply(CyclePredictor::from_history(history));
    if let Some(strategy) = args.strategy {
        predictor = predictor.with_strategy(strategy);
    }

    let report = CycleReport::build(&predictor, args.as_of);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🩸 Menstrual Cycle Predictor");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "📂 {} period(s) from {}",
        report.stats.periods_logged,
        args.csv_path.display()
    );
    println!();
    for line in report.to_lines() {
        println!("  {}", line);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    use cycle_tracker::SystemClock;
    use std::sync::Arc;

    let mut app = ui::App::new(&config.prediction, Arc::new(SystemClock));
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: cycle-tracker predict <periods.csv>");
    std::process::exit(1);
}
