use thiserror::Error;

/// Failure of a single classifier call.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a whole flagging pass.
#[derive(Error, Debug)]
pub enum FlagError {
    #[error("missing classifier API key (set GEMINI_API_KEY or classifier.api_key)")]
    MissingCredentials,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("batch {batch}/{total} failed: {source}")]
    Classifier {
        batch: usize,
        total: usize,
        #[source]
        source: ClassifyError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_error_carries_detail() {
        let err = FlagError::Classifier {
            batch: 2,
            total: 3,
            source: ClassifyError::Server {
                status: 500,
                body: "quota exceeded".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("batch 2/3"));
        assert!(msg.contains("quota exceeded"));
    }
}
