use anyhow::Result;
use clap::{Parser, Subcommand};

use budget_engine::cli::{
    handle_budget_command, handle_stats_command, handle_usage_command, BudgetCommands, StatsArgs,
    UsageArgs,
};
use budget_engine::config::{paths::EnginePaths, settings::Settings};
use budget_engine::logging::init_tracing;
use budget_engine::storage::Storage;

#[derive(Parser)]
#[command(
    name = "budget-engine",
    author = "Kaylee Beyene",
    version,
    about = "Budget usage and spending statistics over a household ledger",
    long_about = "budget-engine computes how much of each budget has been spent in a \
                  period, carries leftovers between periods, and breaks spending down \
                  by category, day and family member."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show spent, remaining and overspend for a budget period
    Usage(UsageArgs),

    /// Show income and expense breakdowns for a window
    #[command(alias = "statistics")]
    Stats(StatsArgs),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Write the settings file with defaults
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = EnginePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings.log_filter);

    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Usage(args)) => handle_usage_command(&storage, &settings, args)?,
        Some(Commands::Stats(args)) => handle_stats_command(&storage, &settings, args)?,
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, cmd)?,
        Some(Commands::Init) => {
            settings.save(&paths)?;
            println!("Initialized budget-engine at: {}", paths.base_dir().display());
        }
        Some(Commands::Config) => {
            println!("budget-engine Configuration");
            println!("===========================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Budgets file:      {}", paths.budgets_file().display());
            println!("Transactions file: {}", paths.transactions_file().display());
            println!("Settings file:     {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Cache enabled:  {}", settings.cache_enabled);
            println!("  Cache capacity: {}", settings.cache_capacity);
            println!(
                "  Ledger retries: {} attempts, {}-{} ms backoff",
                settings.retry.max_attempts,
                settings.retry.initial_backoff_ms,
                settings.retry.max_backoff_ms
            );
            println!("  Log filter:     {}", settings.log_filter);
            match settings.default_account_book {
                Some(book) => println!("  Default book:   {}", book.as_uuid()),
                None => println!("  Default book:   (none)"),
            }
        }
        None => {
            println!("budget-engine - budget usage and spending statistics");
            println!();
            println!("Run 'budget-engine --help' for usage information.");
        }
    }

    Ok(())
}
