//! Budget usage display formatting

use super::report::{double_separator, format_bar, format_percentage, separator};
use crate::models::{Budget, BudgetUsage, BudgetUsageReport};

const WIDTH: usize = 72;
const BAR_WIDTH: usize = 20;

fn status(usage: &BudgetUsage) -> &'static str {
    if usage.is_overspent {
        "OVER"
    } else if usage.percentage >= 90.0 {
        "near"
    } else {
        "ok"
    }
}

fn usage_row(label: &str, usage: &BudgetUsage) -> String {
    format!(
        "{:<18} {:>12} {:>12} {:>12} {:>7} {} {}\n",
        label,
        usage.effective_amount(),
        usage.spent,
        usage.remaining,
        format_percentage(usage.percentage),
        format_bar(usage.percentage, 100.0, BAR_WIDTH),
        status(usage)
    )
}

/// Format a usage report for the terminal
pub fn format_usage_report(budget: &Budget, report: &BudgetUsageReport) -> String {
    let total = &report.total;
    let mut output = String::new();

    output.push_str(&format!("Budget: {} ({})\n", budget.name, budget.id));
    output.push_str(&format!(
        "Period {}  [{} cycle, rollover: {}]\n",
        report.period(),
        budget.cycle.length,
        budget.rollover
    ));
    output.push_str(&double_separator(WIDTH));
    output.push('\n');

    output.push_str(&format!("Amount:    {}\n", total.amount));
    if !total.carried_amount.is_zero() {
        output.push_str(&format!("Carried:   {}\n", total.carried_amount));
    }
    output.push_str(&format!("{}\n", total));
    if total.is_overspent {
        output.push_str(&format!("Overspent by {}\n", (-total.remaining).abs()));
    }

    if !report.categories.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "{:<18} {:>12} {:>12} {:>12} {:>7}\n",
            "Category", "Available", "Spent", "Remaining", "Used"
        ));
        output.push_str(&separator(WIDTH));
        output.push('\n');
        for usage in &report.categories {
            let label = usage
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            output.push_str(&usage_row(&label, usage));
        }
        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&usage_row("Total", total));
    }

    output
}
