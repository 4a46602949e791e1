use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_PRIMARY_MODEL: &str = "models/gemini-2.5-flash";
const DEFAULT_FALLBACK_MODELS: &str = "models/gemini-flash-latest,models/gemini-2.0-flash";
/// 16 MiB upload ceiling.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to the analyzer; nothing reads the environment afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    pub llm_max_retries: u32,
    pub llm_backoff: Duration,
    pub llm_timeout: Duration,
    pub max_upload_bytes: usize,
    pub lexicon_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` is a thin wrapper.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            gemini_api_key: get("GEMINI_API_KEY").with_context(|| {
                "Required environment variable 'GEMINI_API_KEY' is not set".to_string()
            })?,
            primary_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.to_string()),
            fallback_models: parse_model_list(
                &get("GEMINI_FALLBACK_MODELS").unwrap_or_else(|| DEFAULT_FALLBACK_MODELS.to_string()),
            ),
            llm_max_retries: parse_or("LLM_MAX_RETRIES", get("LLM_MAX_RETRIES"), 2)?,
            llm_backoff: Duration::from_millis(parse_or("LLM_BACKOFF_MS", get("LLM_BACKOFF_MS"), 600)?),
            llm_timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 30)?),
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            lexicon_path: get("LEXICON_PATH").map(PathBuf::from),
            port: parse_or("PORT", get("PORT"), 5000)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

/// Splits a comma-separated model list, dropping blanks.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied_when_only_key_set() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.primary_model, "models/gemini-2.5-flash");
        assert_eq!(
            config.fallback_models,
            vec!["models/gemini-flash-latest", "models/gemini-2.0-flash"]
        );
        assert_eq!(config.llm_max_retries, 2);
        assert_eq!(config.llm_backoff, Duration::from_millis(600));
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.port, 5000);
        assert!(config.lexicon_path.is_none());
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        assert!(Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_fallback_models_parsed_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_FALLBACK_MODELS", " a , ,b "),
        ]))
        .unwrap();
        assert_eq!(config.fallback_models, vec!["a", "b"]);
    }
}
