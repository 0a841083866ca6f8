use anyhow::Result;
use serde::Serialize;

use super::Report;
use crate::metrics::SpendSummary;
use crate::models::{Expense, FlagStatus};

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    summary: &'a SpendSummary,
    expenses: Vec<JsonExpense<'a>>,
}

#[derive(Serialize)]
struct JsonExpense<'a> {
    #[serde(flatten)]
    expense: &'a Expense,
    status: &'a FlagStatus,
}

pub fn to_string(report: &Report<'_>) -> Result<String> {
    let doc = JsonReport {
        source: report.source,
        summary: report.summary,
        expenses: report
            .entries()
            .map(|(expense, status)| JsonExpense { expense, status })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn render(report: &Report<'_>) -> Result<()> {
    println!("{}", to_string(report)?);
    Ok(())
}
