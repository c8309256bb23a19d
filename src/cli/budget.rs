//! Budget CLI commands
//!
//! Create, allocate and retire budget definitions, and list their periods.

use clap::Subcommand;

use super::{find_budget, parse_date, parse_id};
use crate::display::format_budget_list;
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountBookId, Budget, CategoryId, Cycle, CycleLength, MemberId, Money, RolloverPolicy};
use crate::services::PeriodResolver;
use crate::storage::{BudgetStore, Storage};

/// Budget subcommands
#[derive(Subcommand, Debug)]
pub enum BudgetCommands {
    /// List all budgets
    #[command(alias = "ls")]
    List,

    /// Create a new budget
    Create {
        /// Budget name
        name: String,
        /// Amount per period (e.g., "500" or "500.00")
        amount: String,
        /// Account book ID
        #[arg(short, long)]
        book: String,
        /// First day of the first period (YYYY-MM-DD)
        #[arg(short, long)]
        anchor: String,
        /// Cycle: weekly, biweekly, monthly, quarterly, yearly, <n>d or <n>m
        #[arg(short, long, default_value = "monthly")]
        cycle: String,
        /// Rollover policy: none, carry-unspent or carry-deficit
        #[arg(short, long, default_value = "none")]
        rollover: String,
        /// Track only this member's spending (personal budget)
        #[arg(short, long)]
        member: Option<String>,
    },

    /// Set the allocation for a category
    Allocate {
        /// Budget name or ID
        budget: String,
        /// Category ID
        category: String,
        /// Amount per period
        amount: String,
    },

    /// Retire a budget, or one of its category allocations
    Retire {
        /// Budget name or ID
        budget: String,
        /// Retire only this category's allocation
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List the periods of a budget intersecting a window
    Periods {
        /// Budget name or ID
        budget: String,
        /// Window start (YYYY-MM-DD, defaults to the anchor)
        #[arg(short, long)]
        from: Option<String>,
        /// Window end (YYYY-MM-DD, exclusive)
        #[arg(short, long)]
        to: String,
    },
}

/// Handle a budget command
pub fn handle_budget_command(storage: &Storage, cmd: BudgetCommands) -> EngineResult<()> {
    match cmd {
        BudgetCommands::List => {
            println!("{}", format_budget_list(&storage.budgets.list()?));
        }

        BudgetCommands::Create {
            name,
            amount,
            book,
            anchor,
            cycle,
            rollover,
            member,
        } => {
            let book: AccountBookId = parse_id("account book", &book)?;
            let amount: Money = amount.parse()?;
            let length: CycleLength = cycle.parse().map_err(EngineError::Validation)?;
            let policy: RolloverPolicy = rollover.parse().map_err(EngineError::Validation)?;
            let cycle = Cycle::new(parse_date(&anchor)?, length);

            let budget = match member {
                Some(member) => {
                    let member: MemberId = parse_id("member", &member)?;
                    Budget::personal(name, book, member, amount, cycle)
                }
                None => Budget::new(name, book, amount, cycle),
            }
            .with_rollover(policy);

            storage.budgets.upsert(budget.clone())?;
            storage.budgets.save()?;
            println!("Created budget: {} ({})", budget.name, budget.id.as_uuid());
        }

        BudgetCommands::Allocate {
            budget,
            category,
            amount,
        } => {
            let mut budget = find_budget(storage, &budget)?;
            let category: CategoryId = parse_id("category", &category)?;
            let amount: Money = amount.parse()?;

            budget.allocate(category, amount)?;
            storage.budgets.upsert(budget.clone())?;
            storage.budgets.save()?;
            println!(
                "Allocated {} to {} in '{}' ({} of {} allocated)",
                amount,
                category,
                budget.name,
                budget.allocated_total(),
                budget.amount
            );
        }

        BudgetCommands::Retire { budget, category } => {
            let mut budget = find_budget(storage, &budget)?;
            match category {
                Some(category) => {
                    let category: CategoryId = parse_id("category", &category)?;
                    if !budget.retire_category(category) {
                        return Err(EngineError::NotFound {
                            entity_type: "Allocation",
                            identifier: category.to_string(),
                        });
                    }
                    println!("Retired allocation {} of '{}'", category, budget.name);
                }
                None => {
                    budget.retire();
                    println!("Retired budget '{}'", budget.name);
                }
            }
            storage.budgets.upsert(budget)?;
            storage.budgets.save()?;
        }

        BudgetCommands::Periods { budget, from, to } => {
            let budget = find_budget(storage, &budget)?;
            let from = match from {
                Some(from) => parse_date(&from)?,
                None => budget.cycle.anchor,
            };
            let periods = PeriodResolver::periods_between(&budget, from, parse_date(&to)?)?;

            println!("Periods of '{}' ({} cycle):", budget.name, budget.cycle.length);
            for period in periods {
                println!("  {}", period);
            }
        }
    }

    Ok(())
}
