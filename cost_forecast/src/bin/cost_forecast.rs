use clap::Parser;
use cost_forecast::{CostTable, ForecastConfig, ForecastEngine, Result};
use std::path::PathBuf;

/// Forecast daily cloud spend from a cleaned cost table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Daily cost CSV (date column, `Total costs($)`, one `<service>($)` column per service)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON configuration; `FORECAST_*` environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the forecast horizon in days
    #[arg(long)]
    horizon: Option<usize>,

    /// Override how many services are forecast individually
    #[arg(long)]
    top_services: Option<usize>,

    /// Evaluate on a single thread
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    log::debug!("Parsed arguments: {:?}", args);

    let mut config = match &args.config {
        Some(path) => ForecastConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ForecastConfig::from_env()?,
    };
    if let Some(days) = args.horizon {
        config = config.with_horizon(days);
    }
    if let Some(count) = args.top_services {
        config = config.with_top_services(count);
    }
    if args.sequential {
        config = config.with_parallel(false);
    }

    let table = CostTable::from_csv(&args.input)?;
    let engine = ForecastEngine::new(config)?;
    let report = engine.forecast_costs(&table);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
