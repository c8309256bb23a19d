//! Statistics snapshot display formatting

use super::report::{double_separator, format_bar, separator, truncate};
use crate::models::{BreakdownEntry, StatisticsSnapshot};

const WIDTH: usize = 72;

fn breakdown_rows(output: &mut String, title: &str, rows: &[BreakdownEntry]) {
    output.push_str(&format!(
        "\n{:<24} {:>14} {:>7} {:>8}\n",
        title, "Amount", "Count", "%"
    ));
    output.push_str(&separator(WIDTH));
    output.push('\n');

    if rows.is_empty() {
        output.push_str("  (none)\n");
        return;
    }
    for row in rows {
        output.push_str(&format!(
            "{:<24} {:>14} {:>7} {:>7.2}% {}\n",
            truncate(&row.key.to_string(), 24),
            row.amount,
            row.transaction_count,
            row.percentage,
            format_bar(row.percentage, 100.0, 12)
        ));
    }
}

/// Format a statistics snapshot for the terminal
pub fn format_statistics(snapshot: &StatisticsSnapshot) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Statistics for {}: {} (by {})\n",
        snapshot.account_book_id, snapshot.window, snapshot.group_by
    ));
    output.push_str(&double_separator(WIDTH));
    output.push('\n');

    let totals = &snapshot.totals;
    output.push_str(&format!("Income:       {:>14}\n", totals.income));
    output.push_str(&format!("Expense:      {:>14}\n", totals.expense));
    output.push_str(&format!("Net:          {:>14}\n", totals.net));
    output.push_str(&format!("Transactions: {:>14}\n", totals.transaction_count));

    if snapshot.is_empty() {
        output.push_str("\nNo transactions in this window.\n");
        return output;
    }

    breakdown_rows(&mut output, "Expenses", &snapshot.expense);
    breakdown_rows(&mut output, "Income", &snapshot.income);
    output
}
