//! bikeshare-dash - dashboard summary of a generated bike-sharing sample.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use log::debug;

use bikeshare_dash::{sample, ColumnSchema, DashboardSummary, SummaryConfig};

/// Print the dashboard summary of a seeded bike-sharing sample
#[derive(Parser, Debug)]
#[command(name = "bikeshare-dash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed of the sample generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// First day of the sample (YYYY-MM-DD)
    #[arg(long, default_value = "2011-01-01")]
    start: NaiveDate,

    /// Number of days to generate
    #[arg(long, default_value_t = 731, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    days: usize,

    /// Bins of the casual vs registered histogram
    #[arg(long, default_value_t = 20, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    bins: usize,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,

    /// JSON file overriding column names
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = SummaryConfig {
        histogram_bins: cli.bins,
        ..SummaryConfig::default()
    };
    if let Some(path) = &cli.schema {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema {}", path.display()))?;
        config.schema = ColumnSchema::from_json_str(&text).context("parsing schema")?;
        debug!("column schema: {:?}", config.schema);
    }

    let data = sample::generate(cli.seed, cli.start, cli.days, &config.schema);
    let summary = DashboardSummary::build(&data.daily, &data.hourly, &config)
        .context("building dashboard summary")?;

    if cli.json {
        println!("{}", summary.to_json().context("serializing summary")?);
    } else {
        println!("{summary}");
    }
    Ok(())
}
