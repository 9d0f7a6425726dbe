//! Gateway construction from configuration

use super::{LlmError, LlmService, LoggingService, OpenAIModel, OpenAIService};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the completion provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint (e.g. `http://localhost:11434/v1`)
    pub base_url: Option<String>,
    pub model: String,
    /// HTTP-level timeout for one request
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o".to_string(),
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// Create the configured gateway, wrapped with request logging
pub fn create_service(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
    // A custom endpoint may not need a key; the public API always does
    let api_key = match (&config.api_key, &config.base_url) {
        (Some(key), _) if !key.is_empty() => key.clone(),
        (_, Some(_)) => "implicit".to_string(),
        _ => {
            return Err(LlmError::auth(
                "No API key configured. Set OPENAI_API_KEY or OPENAI_BASE_URL.",
            ))
        }
    };

    let service = OpenAIService::new(
        api_key,
        OpenAIModel::from_id(&config.model),
        config.base_url.as_deref(),
        config.request_timeout,
    )?;

    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}
