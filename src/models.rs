use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single expense row accepted from the input CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Synthetic id, unique within one upload.
    pub id: String,
    pub date: NaiveDate,
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Suspicious,
    Normal,
}

impl Flag {
    /// Accept only the two exact spellings the classifier is told to emit.
    pub fn from_raw(raw: &str) -> Option<Flag> {
        match raw {
            "Suspicious" => Some(Flag::Suspicious),
            "Normal" => Some(Flag::Normal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flag::Suspicious => write!(f, "Suspicious"),
            Flag::Normal => write!(f, "Normal"),
        }
    }
}

/// Normalized classifier verdict for one expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagResult {
    pub flag: Flag,
    pub reason: String,
}

impl FlagResult {
    pub fn new(flag: Flag, reason: impl Into<String>) -> Self {
        Self {
            flag,
            reason: reason.into(),
        }
    }
}

/// Expense id → verdict.
pub type FlagMap = HashMap<String, FlagResult>;

/// What the report layer knows about one expense's classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FlagStatus {
    /// No result yet (or classification was skipped).
    Pending,
    /// The classification pass failed; this is not the same as `Normal`.
    Unavailable { error: String },
    Resolved(FlagResult),
}

impl FlagStatus {
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            FlagStatus::Resolved(FlagResult {
                flag: Flag::Suspicious,
                ..
            })
        )
    }
}

impl std::fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagStatus::Pending => write!(f, "pending"),
            FlagStatus::Unavailable { .. } => write!(f, "unavailable"),
            FlagStatus::Resolved(result) => write!(f, "{}", result.flag),
        }
    }
}

/// Pair every expense with its status, in input order.
///
/// `outcome` is `None` when classification was not run, `Some(Err(msg))` when
/// the whole pass failed.
pub fn resolve_statuses(
    expenses: &[Expense],
    outcome: Option<Result<&FlagMap, &str>>,
) -> Vec<FlagStatus> {
    expenses
        .iter()
        .map(|e| match outcome {
            None => FlagStatus::Pending,
            Some(Err(msg)) => FlagStatus::Unavailable {
                error: msg.to_string(),
            },
            Some(Ok(map)) => map
                .get(&e.id)
                .cloned()
                .map(FlagStatus::Resolved)
                .unwrap_or(FlagStatus::Pending),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(id: &str) -> Expense {
        Expense {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            merchant: "Acme".to_string(),
            category: UNCATEGORIZED.to_string(),
            amount: 10.0,
            description: None,
        }
    }

    #[test]
    fn test_flag_from_raw_is_exact() {
        assert_eq!(Flag::from_raw("Suspicious"), Some(Flag::Suspicious));
        assert_eq!(Flag::from_raw("Normal"), Some(Flag::Normal));
        assert_eq!(Flag::from_raw("suspicious"), None);
        assert_eq!(Flag::from_raw("maybe"), None);
    }

    #[test]
    fn test_resolve_statuses() {
        let expenses = vec![expense("a"), expense("b")];
        let mut map = FlagMap::new();
        map.insert("a".into(), FlagResult::new(Flag::Suspicious, "odd"));

        let statuses = resolve_statuses(&expenses, Some(Ok(&map)));
        assert!(statuses[0].is_suspicious());
        assert_eq!(statuses[1], FlagStatus::Pending);

        let failed = resolve_statuses(&expenses, Some(Err("boom")));
        assert!(failed
            .iter()
            .all(|s| matches!(s, FlagStatus::Unavailable { error } if error == "boom")));

        let skipped = resolve_statuses(&expenses, None);
        assert!(skipped.iter().all(|s| *s == FlagStatus::Pending));
    }
}
