//! Budget definition display formatting

use crate::models::Budget;

/// Format a list of budgets as a table
pub fn format_budget_list(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets found.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<14} {:<20} {:>12} {:<12} {:<14} {}\n",
        "ID", "Name", "Amount", "Cycle", "Rollover", "Scope"
    ));
    output.push_str(&"-".repeat(84));
    output.push('\n');

    for budget in budgets {
        let mut scope = budget.scope.to_string();
        if let Some(owner) = budget.member_filter() {
            scope = format!("{} ({})", scope, owner);
        }
        let retired = if budget.is_retired() { " [retired]" } else { "" };
        output.push_str(&format!(
            "{:<14} {:<20} {:>12} {:<12} {:<14} {}{}\n",
            budget.id.to_string(),
            budget.name,
            budget.amount,
            budget.cycle.length.to_string(),
            budget.rollover.to_string(),
            scope,
            retired
        ));
        for allocation in budget.active_allocations() {
            output.push_str(&format!(
                "  └── {:<30} {:>12}\n",
                allocation.category_id.to_string(),
                allocation.amount
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountBookId, CategoryId, Cycle, Money};
    use chrono::NaiveDate;

    #[test]
    fn test_empty_list() {
        assert_eq!(format_budget_list(&[]), "No budgets found.");
    }

    #[test]
    fn test_list_with_allocation() {
        let mut budget = Budget::new(
            "Household",
            AccountBookId::new(),
            Money::from_units(900),
            Cycle::monthly(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        );
        budget.allocate(CategoryId::new(), Money::from_units(250)).unwrap();

        let output = format_budget_list(&[budget]);
        assert!(output.contains("Household"));
        assert!(output.contains("$900.00"));
        assert!(output.contains("$250.00"));
        assert!(output.contains("monthly"));
    }
}
