//! Usage CLI command

use clap::Args;

use super::{build_engine, find_budget, parse_date};
use crate::config::settings::Settings;
use crate::display::format_usage_report;
use crate::engine::PeriodRef;
use crate::error::{EngineError, EngineResult};
use crate::storage::Storage;

/// Arguments for `usage`
#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Budget name or ID
    pub budget: String,

    /// Show the period containing this date (YYYY-MM-DD)
    #[arg(short, long, conflicts_with = "index")]
    pub date: Option<String>,

    /// Show the period with this sequence index (0 = first period)
    #[arg(short, long)]
    pub index: Option<u64>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Handle the usage command
pub fn handle_usage_command(storage: &Storage, settings: &Settings, args: UsageArgs) -> EngineResult<()> {
    let budget = find_budget(storage, &args.budget)?;
    let period = match (args.date.as_deref(), args.index) {
        (Some(date), _) => PeriodRef::Containing(parse_date(date)?),
        (None, Some(index)) => PeriodRef::Index(index),
        (None, None) => PeriodRef::Current,
    };

    let engine = build_engine(storage, settings);
    let report = engine.compute_usage(&budget, period)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
        println!("{}", json);
    } else {
        print!("{}", format_usage_report(&budget, &report));
    }
    Ok(())
}
