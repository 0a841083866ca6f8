use std::path::Path;

use anyhow::Result;

use crate::models::Expense;

pub mod csv_file;
pub mod sample;

pub trait Ingestor {
    fn ingest(&self, path: &Path) -> Result<Vec<Expense>>;
}
