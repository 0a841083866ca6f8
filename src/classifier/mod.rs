//! Remote classifiers that label expenses as suspicious or normal.
//!
//! Implementations send one batch per call and hand back the model's raw
//! text. Interpreting that text is left to [`crate::flagging::normalize`].

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;

use crate::error::ClassifyError;
use crate::models::Expense;

pub use gemini::GeminiClassifier;

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one batch. `Ok` carries the raw model output, which may be
    /// empty or malformed.
    async fn classify_batch(&self, expenses: &[Expense]) -> Result<String, ClassifyError>;
}
