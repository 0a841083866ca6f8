use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::prompt::build_batch_prompt;
use super::Classifier;
use crate::config::ClassifierConfig;
use crate::error::{ClassifyError, FlagError};
use crate::models::Expense;

/// Classifier backed by the Gemini `generateContent` endpoint.
pub struct GeminiClassifier {
    client: Client,
    api_key: String,
    url: String,
}

impl GeminiClassifier {
    /// Build a classifier from config. Fails before any request is made when
    /// no API key is available.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, FlagError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(FlagError::MissingCredentials)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(FlagError::HttpClient)?;

        Ok(Self {
            client,
            api_key,
            url: generate_url(&config.endpoint, &config.model),
        })
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify_batch(&self, expenses: &[Expense]) -> Result<String, ClassifyError> {
        let prompt = build_batch_prompt(expenses)?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        info!(count = expenses.len(), "requesting Gemini classification");
        let response = self
            .client
            .post(&self.url)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = if text.trim().is_empty() {
                "Gemini error".to_string()
            } else {
                text
            };
            return Err(ClassifyError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response.json().await?;
        let text = candidate_text(&data);
        debug!(chars = text.len(), "Gemini returned candidate text");
        Ok(text)
    }
}

fn generate_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model
    )
}

/// First candidate's first text part, or an empty string.
fn candidate_text(data: &Value) -> String {
    data.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string()
}
