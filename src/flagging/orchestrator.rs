use std::sync::Arc;

use futures::stream::{FuturesOrdered, StreamExt};
use tracing::{debug, info, warn};

use super::{FlagCache, Fingerprint};
use super::normalize::{normalize_batch, UNPARSEABLE};
use crate::classifier::Classifier;
use crate::config::ClassifierConfig;
use crate::error::FlagError;
use crate::models::{Expense, Flag, FlagMap, FlagResult};

pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Splits an expense set into batches, classifies each one, and caches the
/// merged result per expense-set fingerprint.
///
/// A pass is all-or-nothing: if any batch fails, nothing is returned and
/// nothing is cached. Clones share the classifier and the cache.
pub struct FlagOrchestrator<C: ?Sized> {
    classifier: Arc<C>,
    cache: Arc<FlagCache>,
    batch_size: usize,
    max_in_flight: usize,
}

impl<C: ?Sized> Clone for FlagOrchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            cache: Arc::clone(&self.cache),
            batch_size: self.batch_size,
            max_in_flight: self.max_in_flight,
        }
    }
}

impl<C: Classifier + ?Sized> FlagOrchestrator<C> {
    pub fn new(classifier: Arc<C>, cache: Arc<FlagCache>) -> Self {
        Self {
            classifier,
            cache,
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: 1,
        }
    }

    pub fn from_config(classifier: Arc<C>, config: &ClassifierConfig) -> Self {
        Self::new(classifier, Arc::new(FlagCache::new(config.cache_ttl())))
            .with_batch_size(config.batch_size())
            .with_max_in_flight(config.max_in_flight())
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Allow up to `n` batches outstanding at once. Results are still merged
    /// in batch order and the first failure still aborts the pass.
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n.max(1);
        self
    }

    /// Classify every expense, returning one verdict per expense id.
    pub async fn classify(&self, expenses: &[Expense]) -> Result<FlagMap, FlagError> {
        if expenses.is_empty() {
            return Ok(FlagMap::new());
        }

        let fingerprint = Fingerprint::of(expenses);
        if let Some(hit) = self.cache.get(&fingerprint).await {
            info!(
                fingerprint = fingerprint.short(),
                count = hit.len(),
                "flag cache hit"
            );
            return Ok(hit);
        }

        let total = expenses.len().div_ceil(self.batch_size);
        info!(
            fingerprint = fingerprint.short(),
            expenses = expenses.len(),
            batches = total,
            "classifying expenses"
        );

        let flags = self.run_batches(expenses, total).await?;
        self.cache.insert(fingerprint, flags.clone()).await;
        Ok(flags)
    }

    /// Classify a single expense through the same batched path.
    pub async fn classify_one(&self, expense: &Expense) -> Result<FlagResult, FlagError> {
        let mut flags = self.classify(std::slice::from_ref(expense)).await?;
        Ok(flags
            .remove(&expense.id)
            .unwrap_or_else(|| unreachable_verdict(&expense.id)))
    }

    async fn run_batches(&self, expenses: &[Expense], total: usize) -> Result<FlagMap, FlagError> {
        let mut batches = expenses.chunks(self.batch_size).enumerate();
        let mut in_flight = FuturesOrdered::new();
        let mut merged = FlagMap::with_capacity(expenses.len());

        loop {
            while in_flight.len() < self.max_in_flight {
                match batches.next() {
                    Some((idx, batch)) => in_flight.push_back(self.run_batch(idx + 1, total, batch)),
                    None => break,
                }
            }

            match in_flight.next().await {
                Some(Ok(batch_flags)) => merged.extend(batch_flags),
                Some(Err(err)) => {
                    warn!(error = %err, "flagging pass aborted");
                    return Err(err);
                }
                None => return Ok(merged),
            }
        }
    }

    async fn run_batch(
        &self,
        batch_no: usize,
        total: usize,
        batch: &[Expense],
    ) -> Result<FlagMap, FlagError> {
        debug!(batch = batch_no, total, size = batch.len(), "submitting batch");
        let raw = self
            .classifier
            .classify_batch(batch)
            .await
            .map_err(|source| FlagError::Classifier {
                batch: batch_no,
                total,
                source,
            })?;
        let ids: Vec<&str> = batch.iter().map(|e| e.id.as_str()).collect();
        Ok(normalize_batch(&ids, &raw))
    }
}

// The normalizer returns every expected id, so a lookup miss cannot happen.
fn unreachable_verdict(id: &str) -> FlagResult {
    warn!(id, "normalized batch missing its only id");
    FlagResult::new(Flag::Normal, UNPARSEABLE)
}
