//! Statistics CLI command

use clap::Args;

use super::{build_engine, parse_date, parse_id};
use crate::config::settings::Settings;
use crate::display::format_statistics;
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountBookId, DateRange, GroupBy};
use crate::storage::Storage;

/// Arguments for `stats`
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Account book ID (defaults to the configured book)
    #[arg(short, long)]
    pub book: Option<String>,

    /// First day of the window (YYYY-MM-DD)
    #[arg(short, long)]
    pub start: String,

    /// Day after the window ends (YYYY-MM-DD, exclusive)
    #[arg(short, long)]
    pub end: String,

    /// Grouping: category, day, member or all
    #[arg(long = "by", default_value = "category")]
    pub group_by: String,

    /// Show only the N largest expense groups
    #[arg(long)]
    pub top: Option<usize>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

fn resolve_book(settings: &Settings, book: Option<&str>) -> EngineResult<AccountBookId> {
    match book {
        Some(value) => parse_id("account book", value),
        None => settings.default_account_book.ok_or_else(|| {
            EngineError::Validation(
                "No account book given and no default_account_book configured".into(),
            )
        }),
    }
}

/// Handle the stats command
pub fn handle_stats_command(storage: &Storage, settings: &Settings, args: StatsArgs) -> EngineResult<()> {
    let book = resolve_book(settings, args.book.as_deref())?;
    let window = DateRange::new(parse_date(&args.start)?, parse_date(&args.end)?);
    let engine = build_engine(storage, settings);

    if args.group_by.trim().eq_ignore_ascii_case("all") {
        let overview = engine.compute_overview(book, window)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&overview).map_err(EngineError::from)?);
        } else {
            print!("{}", format_statistics(&overview.by_category));
            println!();
            print!("{}", format_statistics(&overview.by_day));
            println!();
            print!("{}", format_statistics(&overview.by_member));
        }
        return Ok(());
    }

    let group_by: GroupBy = args.group_by.parse().map_err(EngineError::Validation)?;
    let mut snapshot = engine.compute_statistics(book, window, group_by)?;
    if let Some(limit) = args.top {
        snapshot.expense = snapshot.top_expenses(limit).into_iter().cloned().collect();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot).map_err(EngineError::from)?);
    } else {
        print!("{}", format_statistics(&snapshot));
    }
    Ok(())
}
