use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::Report;
use crate::metrics::SpendSummary;
use crate::models::{Expense, Flag, FlagStatus};

/// Render a colored terminal report.
pub fn render(report: &Report<'_>, verbose: bool, quiet: bool) -> Result<()> {
    let summary = report.summary;
    let suspicious = report.count_where(FlagStatus::is_suspicious);
    let normal = report.count_where(|s| {
        matches!(s, FlagStatus::Resolved(r) if r.flag == Flag::Normal)
    });
    let pending = report.count_where(|s| matches!(s, FlagStatus::Pending));
    let unavailable = report.count_where(|s| matches!(s, FlagStatus::Unavailable { .. }));

    if quiet {
        println!(
            "Total: {}  Transactions: {}  Suspicious: {}  Normal: {}  Unflagged: {}",
            money(summary.total_spend),
            summary.transactions,
            suspicious.to_string().red(),
            normal.to_string().green(),
            (pending + unavailable).to_string().yellow(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "expense-checkr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Source: {}\n", report.source);

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Total spend        : {}", money(summary.total_spend))
    );
    println!(
        " │  {:<48} │",
        format!("Transactions       : {}", summary.transactions)
    );
    println!(
        " │  {:<48} │",
        format!(
            "Cashback accrued   : {} ({:.1}%)",
            money(summary.cashback_accrued),
            summary.cashback_rate * 100.0
        )
    );
    println!(
        " │  {:<48} │",
        format!("{}  Suspicious      : {:>4}", "✗".red(), suspicious)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Normal          : {:>4}", "✓".green(), normal)
    );
    if pending + unavailable > 0 {
        println!(
            " │  {:<48} │",
            format!("{}  Not classified  : {:>4}", "⚠".yellow(), pending + unavailable)
        );
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    if let Some(FlagStatus::Unavailable { error }) = report
        .statuses
        .iter()
        .find(|s| matches!(s, FlagStatus::Unavailable { .. }))
    {
        println!(
            " {} Classification unavailable: {}\n",
            "[UNAVAILABLE]".yellow().bold(),
            error
        );
    }

    if !summary.categories.is_empty() {
        println!(" {} Category breakdown:\n", "[SPEND]".cyan().bold());
        render_categories(summary);
        println!();
    }

    let flagged = needs_attention(report);
    if !flagged.is_empty() {
        println!(
            " {} Expenses flagged as suspicious or not classified:\n",
            "[FLAGGED]".red().bold()
        );
        render_expenses(&flagged);
        println!();
    }

    if verbose {
        let all: Vec<(&Expense, &FlagStatus)> = report.entries().collect();
        if !all.is_empty() {
            println!(" {} All expenses:\n", "[ALL]".green().bold());
            render_expenses(&all);
            println!();
        }
    }

    Ok(())
}

/// Listed rows that are suspicious or could not be classified.
fn needs_attention<'a>(report: &Report<'a>) -> Vec<(&'a Expense, &'a FlagStatus)> {
    report
        .entries()
        .filter(|(_, s)| s.is_suspicious() || matches!(s, FlagStatus::Unavailable { .. }))
        .collect()
}

fn render_categories(summary: &SpendSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new("Share").add_attribute(Attribute::Bold),
        ]);

    for cat in &summary.categories {
        let share = if summary.total_spend > 0.0 {
            cat.total / summary.total_spend * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&cat.name),
            Cell::new(money(cat.total)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", share)).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
}

fn render_expenses(rows: &[(&Expense, &FlagStatus)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Merchant").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Amount").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Flag").add_attribute(Attribute::Bold),
            Cell::new("Reason").add_attribute(Attribute::Bold),
        ]);

    for (expense, status) in rows {
        let (flag_str, flag_color) = match status {
            FlagStatus::Resolved(r) if r.flag == Flag::Suspicious => ("✗ suspicious", Color::Red),
            FlagStatus::Resolved(_) => ("✓ normal", Color::Green),
            FlagStatus::Pending => ("… pending", Color::DarkGrey),
            FlagStatus::Unavailable { .. } => ("⚠ unavailable", Color::Yellow),
        };
        let reason = match status {
            FlagStatus::Resolved(r) => r.reason.as_str(),
            _ => "",
        };

        table.add_row(vec![
            Cell::new(expense.date.format("%Y-%m-%d")),
            Cell::new(&expense.merchant),
            Cell::new(&expense.category),
            Cell::new(money(expense.amount)).set_alignment(CellAlignment::Right),
            Cell::new(expense.description.as_deref().unwrap_or("")),
            Cell::new(flag_str).fg(flag_color),
            Cell::new(reason),
        ]);
    }

    println!("{}", table);
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}
