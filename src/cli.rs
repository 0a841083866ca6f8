use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "expense-checkr",
    about = "Summarize corporate expenses and flag suspicious spend",
    version
)]
pub struct Cli {
    /// Expense CSV (columns: Date, Merchant, Category, Amount, Description)
    #[arg(required_unless_present = "sample", conflicts_with = "sample")]
    pub csv: Option<PathBuf>,

    /// Use the built-in sample expenses instead of a CSV file
    #[arg(long)]
    pub sample: bool,

    /// Config file [default: ./.expense-checkr/config.toml, fallback ~/.config/expense-checkr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Only list expenses in this category
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,

    /// Only list expenses whose merchant, description or category contains TEXT
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Skip the suspicious-expense classifier
    #[arg(long)]
    pub no_flag: bool,

    /// Exit with code 1 when any expense is flagged as suspicious
    #[arg(long)]
    pub strict: bool,

    /// Show every expense and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
