//! Report renderers for expense summaries and flagging results.
//!
//! - [`terminal`]: colored summary box, category breakdown and expense tables;
//!   respects `--verbose` / `--quiet`.
//! - [`json`]: machine-readable dump of the same data.

pub mod json;
pub mod terminal;

use crate::metrics::SpendSummary;
use crate::models::{Expense, FlagStatus};

/// Everything a renderer needs. `rows` holds indices into `expenses` after
/// filtering and sorting.
pub struct Report<'a> {
    pub source: &'a str,
    pub summary: &'a SpendSummary,
    pub expenses: &'a [Expense],
    pub statuses: &'a [FlagStatus],
    pub rows: &'a [usize],
}

impl<'a> Report<'a> {
    /// Filtered rows paired with their status.
    pub fn entries(&self) -> impl Iterator<Item = (&'a Expense, &'a FlagStatus)> + 'a {
        let (rows, expenses, statuses) = (self.rows, self.expenses, self.statuses);
        rows.iter()
            .map(move |&i| (&expenses[i], &statuses[i]))
    }

    pub fn count_where(&self, pred: impl Fn(&FlagStatus) -> bool) -> usize {
        self.statuses.iter().filter(|&s| pred(s)).count()
    }
}
