//! `expense-checkr`: summarize an expense CSV and flag suspicious spend.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install logging ([`logging`]).
//! 2. Load config ([`config::load_config`]).
//! 3. Ingest expenses from CSV or the built-in sample ([`ingest`]).
//! 4. Compute spend metrics ([`metrics`]).
//! 5. Unless `--no-flag`, classify every expense in batches ([`flagging`],
//!    [`classifier`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0`, `1` (`--strict` and something was flagged) or `2` (no expenses).

mod classifier;
mod cli;
mod config;
mod error;
mod flagging;
mod ingest;
mod logging;
mod metrics;
mod models;
mod report;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use classifier::GeminiClassifier;
use cli::{Cli, ReportFormat};
use config::{load_config, ClassifierConfig};
use flagging::FlagOrchestrator;
use ingest::csv_file::CsvIngestor;
use ingest::Ingestor;
use metrics::{distinct_categories, filter_expenses, SpendSummary};
use models::{resolve_statuses, Expense, FlagMap};
use report::Report;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd, cli.config.as_deref())?;

    let (expenses, source) = match &cli.csv {
        Some(path) => (CsvIngestor::new().ingest(path)?, path.display().to_string()),
        None => (ingest::sample::sample_expenses()?, "built-in sample".to_string()),
    };

    if expenses.is_empty() {
        eprintln!("No valid expenses found in {}", source);
        std::process::exit(2);
    }
    info!(count = expenses.len(), source = %source, "loaded expenses");

    let summary = SpendSummary::from_expenses(&expenses, config.report.cashback_rate);

    let outcome = if cli.no_flag {
        None
    } else {
        Some(flag_expenses(&expenses, &config.classifier, cli.quiet).await)
    };
    let statuses = resolve_statuses(
        &expenses,
        outcome
            .as_ref()
            .map(|r| r.as_ref().map_err(String::as_str)),
    );

    if let Some(category) = cli.category.as_deref() {
        let known = distinct_categories(&expenses);
        if !known.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            warn!(category, known = %known.join(", "), "no expenses in category");
        }
    }

    let rows = filter_expenses(&expenses, cli.category.as_deref(), cli.search.as_deref());
    let report = Report {
        source: &source,
        summary: &summary,
        expenses: &expenses,
        statuses: &statuses,
        rows: &rows,
    };

    match cli.report {
        ReportFormat::Terminal => report::terminal::render(&report, cli.verbose, cli.quiet)?,
        ReportFormat::Json => report::json::render(&report)?,
    }

    if cli.strict && statuses.iter().any(|s| s.is_suspicious()) {
        std::process::exit(1);
    }

    Ok(())
}

/// Run one flagging pass. Failures are reported and turned into a message so
/// the report can mark every expense as unavailable.
async fn flag_expenses(
    expenses: &[Expense],
    config: &ClassifierConfig,
    quiet: bool,
) -> std::result::Result<FlagMap, String> {
    let classifier = match GeminiClassifier::from_config(config) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "classifier is not configured");
            return Err(e.to_string());
        }
    };
    let orchestrator = FlagOrchestrator::from_config(classifier, config);

    let spinner = (!quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!(
            "Classifying {} expenses in {} batches...",
            expenses.len(),
            expenses.len().div_ceil(config.batch_size())
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = match expenses {
        [only] => orchestrator
            .classify_one(only)
            .await
            .map(|flag| FlagMap::from([(only.id.clone(), flag)])),
        _ => orchestrator.classify(expenses).await,
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result.map_err(|e| {
        error!(error = %e, "expense classification failed");
        e.to_string()
    })
}
