use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Root configuration structure, deserialized from `.expense-checkr/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Settings for the remote classifier and the batching around it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Gemini API key. The `GEMINI_API_KEY` environment variable takes precedence.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL up to and including the API version segment.
    pub endpoint: String,
    /// Maximum expenses per classifier call.
    pub batch_size: usize,
    /// Batches allowed in flight at once. `1` keeps submission strictly sequential.
    pub max_in_flight: usize,
    pub cache_ttl_secs: u64,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            batch_size: 25,
            max_in_flight: 1,
            cache_ttl_secs: 60 * 60,
            timeout_secs: 60,
        }
    }
}

impl ClassifierConfig {
    /// API key from the environment, falling back to the config file.
    /// Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.api_key.clone())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.max(1)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Fraction of total spend credited back, e.g. `0.015` for 1.5 %.
    pub cashback_rate: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cashback_rate: 0.015,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.expense-checkr/config.toml`
/// 3. `~/.config/expense-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".expense-checkr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("expense-checkr")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.classifier.batch_size(), 25);
        assert_eq!(cfg.classifier.max_in_flight(), 1);
        assert_eq!(cfg.classifier.cache_ttl(), Duration::from_secs(3600));
        assert!((cfg.report.cashback_rate - 0.015).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[classifier]
batch_size = 10
model = "gemini-1.5-pro"
"#
        )
        .unwrap();

        let cfg = load_config(Path::new("."), Some(file.path())).unwrap();
        assert_eq!(cfg.classifier.batch_size(), 10);
        assert_eq!(cfg.classifier.model, "gemini-1.5-pro");
        assert_eq!(cfg.classifier.cache_ttl_secs, 3600);
        assert!((cfg.report.cashback_rate - 0.015).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let cfg: Config = toml::from_str(
            r#"
[classifier]
batch_size = 0
max_in_flight = 0
"#,
        )
        .unwrap();
        assert_eq!(cfg.classifier.batch_size(), 1);
        assert_eq!(cfg.classifier.max_in_flight(), 1);
    }

    #[test]
    fn test_project_config_is_found() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join(".expense-checkr");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), "[report]\ncashback_rate = 0.02\n").unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert!((cfg.report.cashback_rate - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[classifier\nbatch_size = ").unwrap();
        assert!(load_config(Path::new("."), Some(file.path())).is_err());
    }
}
