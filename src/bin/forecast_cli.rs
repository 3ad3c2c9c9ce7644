//! Train a model on a CSV price history and print or save the forecast.
//!
//! ```bash
//! forecast_cli --data prices.csv --config model.json --forecast-period 10 --output forecast.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use price_forecast::{DataLoader, ModelConfig};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use stock_forecaster::ForecastJob;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "forecast_cli", version, about = "Recurrent network price forecasts from daily OHLCV data")]
struct Cli {
    /// CSV file with a date column and numeric price columns
    #[arg(long, short = 'd')]
    data: PathBuf,

    /// Model configuration (JSON); defaults are used when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the configured number of forecast rows
    #[arg(long, short = 'n')]
    forecast_period: Option<usize>,

    /// Write the forecast as CSV here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Keep the first row, which equals the last known value
    #[arg(long)]
    keep_join_point: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("stock_forecaster=info,price_forecast=info"))?,
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ModelConfig::from_json_file(path)
            .with_context(|| format!("loading model config {}", path.display()))?,
        None => ModelConfig::default(),
    };
    if let Some(forecast_period) = cli.forecast_period {
        config.forecast_period = forecast_period;
        config.validate().context("invalid forecast period")?;
    }

    let frame = DataLoader::from_csv(&cli.data)
        .with_context(|| format!("loading price data {}", cli.data.display()))?;
    info!(rows = frame.len(), path = %cli.data.display(), "loaded price data");

    let run = ForecastJob::spawn(frame, config)
        .wait()
        .into_result()
        .context("forecast job failed")?;

    if let Some(loss) = run.artifacts.model().history().final_loss() {
        info!(final_loss = loss, "training finished");
    }

    let forecast = if cli.keep_join_point {
        run.forecast
    } else {
        run.forecast.without_join_point()
    };

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            forecast.write_csv(file)?;
            info!(rows = forecast.len(), path = %path.display(), "wrote forecast");
        }
        None => forecast.write_csv(io::stdout().lock())?,
    }

    Ok(())
}
