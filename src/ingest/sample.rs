use anyhow::Result;

use super::csv_file::parse_reader;
use crate::models::Expense;

pub const SAMPLE_CSV: &str = "\
Date,Merchant,Category,Amount,Description
2025-08-01,Acme Flights,Travel,524.32,NYC client visit
2025-08-02,Urban Eats,Meals,34.80,Lunch with client
2025-08-04,Hotel Plaza,Lodging,612.15,2 nights stay
2025-08-05,Office Depot,Office Supplies,89.44,Printer ink and paper
2025-08-06,Prime Rides,Transport,44.10,Ride to airport
2025-08-07,Local Bar,Entertainment,120.00,Team celebration
";

/// The built-in demo data set.
pub fn sample_expenses() -> Result<Vec<Expense>> {
    parse_reader(SAMPLE_CSV.as_bytes())
}
