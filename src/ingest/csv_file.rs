use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::models::{Expense, UNCATEGORIZED};

/// Ingestor for expense CSV exports.
///
/// Expects the columns `Date`, `Merchant`, `Category`, `Amount` and
/// `Description` (matched case-insensitively, in any order). Rows without a
/// date, a merchant, or a usable amount are skipped.
#[derive(Default)]
pub struct CsvIngestor;

impl CsvIngestor {
    pub fn new() -> Self {
        Self
    }
}

impl super::Ingestor for CsvIngestor {
    fn ingest(&self, path: &Path) -> Result<Vec<Expense>> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        parse_reader(file).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: Option<usize>,
    merchant: Option<usize>,
    category: Option<usize>,
    amount: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        let find = |name: &str| index.get(name).copied();

        Self {
            date: find("date"),
            merchant: find("merchant"),
            category: find("category"),
            amount: find("amount"),
            description: find("description"),
        }
    }
}

pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Expense>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(reader.headers()?);
    if columns.date.is_none() || columns.merchant.is_none() || columns.amount.is_none() {
        warn!("CSV is missing one of the Date, Merchant or Amount columns");
    }

    let mut expenses = Vec::new();
    let mut skipped = 0usize;

    for (row, result) in reader.byte_records().enumerate() {
        let raw = result.with_context(|| format!("Failed to parse CSV line {}", row + 2))?;
        let Ok(record) = StringRecord::from_byte_record(raw) else {
            skipped += 1;
            debug!(line = row + 2, "skipping row with invalid UTF-8");
            continue;
        };
        match to_expense(&record, &columns, row) {
            Some(expense) => expenses.push(expense),
            None => {
                skipped += 1;
                debug!(line = row + 2, "skipping incomplete expense row");
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, kept = expenses.len(), "dropped invalid rows");
    }
    Ok(expenses)
}

fn to_expense(record: &StringRecord, columns: &Columns, row: usize) -> Option<Expense> {
    let field = |col: Option<usize>| col.and_then(|i| record.get(i)).map(str::trim).unwrap_or("");

    let raw_date = field(columns.date);
    let merchant = field(columns.merchant);
    if raw_date.is_empty() || merchant.is_empty() {
        return None;
    }

    let amount = parse_amount(field(columns.amount))?;
    let date = parse_date(raw_date)?;

    let category = match field(columns.category) {
        "" => UNCATEGORIZED.to_string(),
        c => c.to_string(),
    };
    let description = Some(field(columns.description))
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Some(Expense {
        id: format!("{}-{}-{}-{}", row, merchant, raw_date, amount),
        date,
        merchant: merchant.to_string(),
        category,
        amount,
        description,
    })
}

/// Parse `"$1,234.50"`-style amounts. Non-finite and negative values are rejected.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
