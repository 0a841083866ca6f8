use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::Expense;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
}

/// Aggregate spend figures for one expense set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendSummary {
    pub total_spend: f64,
    pub transactions: usize,
    pub cashback_rate: f64,
    pub cashback_accrued: f64,
    /// Largest category first.
    pub categories: Vec<CategoryTotal>,
}

impl SpendSummary {
    pub fn from_expenses(expenses: &[Expense], cashback_rate: f64) -> Self {
        let total_spend: f64 = expenses.iter().map(|e| e.amount).sum();

        let mut by_category: HashMap<&str, f64> = HashMap::new();
        for e in expenses {
            *by_category.entry(e.category.as_str()).or_insert(0.0) += e.amount;
        }

        let mut categories: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(name, total)| CategoryTotal {
                name: name.to_string(),
                total,
            })
            .collect();
        categories.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            total_spend,
            transactions: expenses.len(),
            cashback_rate,
            cashback_accrued: total_spend * cashback_rate,
            categories,
        }
    }
}

/// Sorted, de-duplicated category names.
pub fn distinct_categories(expenses: &[Expense]) -> Vec<String> {
    expenses
        .iter()
        .map(|e| e.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Indices of expenses matching an optional category and an optional
/// case-insensitive search over merchant, description and category, newest first.
pub fn filter_expenses(
    expenses: &[Expense],
    category: Option<&str>,
    search: Option<&str>,
) -> Vec<usize> {
    let query = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matched: Vec<usize> = expenses
        .iter()
        .enumerate()
        .filter(|(_, e)| category.map_or(true, |c| e.category.eq_ignore_ascii_case(c)))
        .filter(|(_, e)| match &query {
            None => true,
            Some(q) => {
                e.merchant.to_lowercase().contains(q)
                    || e.category.to_lowercase().contains(q)
                    || e
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(q))
            }
        })
        .map(|(i, _)| i)
        .collect();

    matched.sort_by(|&a, &b| expenses[b].date.cmp(&expenses[a].date));
    matched
}
