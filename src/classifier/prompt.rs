use serde::Serialize;

use crate::models::Expense;

/// Wire shape of an expense inside the prompt.
#[derive(Serialize)]
struct PromptExpense<'a> {
    id: &'a str,
    date: String,
    merchant: &'a str,
    category: &'a str,
    amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a Expense> for PromptExpense<'a> {
    fn from(e: &'a Expense) -> Self {
        Self {
            id: &e.id,
            date: e.date.format("%Y-%m-%d").to_string(),
            merchant: &e.merchant,
            category: &e.category,
            amount: e.amount,
            description: e.description.as_deref().filter(|d| !d.is_empty()),
        }
    }
}

/// Build the compliance prompt for one batch.
pub fn build_batch_prompt(expenses: &[Expense]) -> serde_json::Result<String> {
    let payload: Vec<PromptExpense<'_>> = expenses.iter().map(PromptExpense::from).collect();
    let expenses_json = serde_json::to_string(&payload)?;

    Ok([
        "You are a finance compliance assistant.",
        "Classify each of the following corporate expenses as either \"Suspicious\" or \"Normal\".",
        "Consider common violations (alcohol/entertainment if restricted, personal items, cash withdrawals, missing receipts), \
         anomalies (unusually large amounts, repeated charges, out-of-hours/weekend, out-of-policy categories), or risky merchants.",
        "Return ONLY a compact JSON object keyed by each expense id, with this exact shape:",
        r#"{"<id>":{"flag":"Suspicious"|"Normal","reason":"short reason"}}"#,
        "Include every id exactly once. Do not include any extra text.",
        "",
        &format!("Expenses: {}", expenses_json),
    ]
    .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_prompt_lists_every_expense() {
        let expenses = vec![
            Expense {
                id: "0-Local Bar-2025-08-07-120".into(),
                date: NaiveDate::from_ymd_opt(2025, 8, 7).unwrap(),
                merchant: "Local Bar".into(),
                category: "Entertainment".into(),
                amount: 120.0,
                description: Some("Team celebration".into()),
            },
            Expense {
                id: "1-ATM-2025-08-09-300".into(),
                date: NaiveDate::from_ymd_opt(2025, 8, 9).unwrap(),
                merchant: "ATM".into(),
                category: "Cash".into(),
                amount: 300.0,
                description: None,
            },
        ];

        let prompt = build_batch_prompt(&expenses).unwrap();
        assert!(prompt.starts_with("You are a finance compliance assistant."));
        assert!(prompt.contains(r#""id":"0-Local Bar-2025-08-07-120""#));
        assert!(prompt.contains(r#""date":"2025-08-09""#));
        assert!(prompt.contains("Team celebration"));
        assert!(!prompt.contains(r#""description":null"#));
    }
}
