//! Runtime configuration read from the environment

use crate::llm::LlmConfig;
use crate::runtime::LoopOptions;
use crate::state_machine::DEFAULT_MAX_ITERATIONS;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub max_iterations: u32,
    pub llm_timeout: Duration,
    pub max_tokens: u32,
    /// Directory the save tool writes into
    pub workdir: PathBuf,
    pub parallel_tools: bool,
    pub log_json: bool,
}

impl Config {
    /// Load from process environment (call `dotenvy::dotenv()` first to pick up `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_iterations = parse_or(
            "TOOLLOOP_MAX_ITERATIONS",
            get("TOOLLOOP_MAX_ITERATIONS"),
            DEFAULT_MAX_ITERATIONS,
        )?;
        if max_iterations == 0 {
            return Err(invalid("TOOLLOOP_MAX_ITERATIONS", "0", "must be at least 1"));
        }

        let timeout_secs = parse_or(
            "TOOLLOOP_LLM_TIMEOUT_SECS",
            get("TOOLLOOP_LLM_TIMEOUT_SECS"),
            DEFAULT_LLM_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(invalid("TOOLLOOP_LLM_TIMEOUT_SECS", "0", "must be at least 1"));
        }
        let llm_timeout = Duration::from_secs(timeout_secs);

        let llm = LlmConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL"),
            model: get("TOOLLOOP_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: llm_timeout,
        };

        Ok(Self {
            llm,
            max_iterations,
            llm_timeout,
            max_tokens: parse_or(
                "TOOLLOOP_MAX_TOKENS",
                get("TOOLLOOP_MAX_TOKENS"),
                DEFAULT_MAX_TOKENS,
            )?,
            workdir: get("TOOLLOOP_WORKDIR").map_or_else(|| PathBuf::from("."), PathBuf::from),
            parallel_tools: parse_flag("TOOLLOOP_PARALLEL_TOOLS", get("TOOLLOOP_PARALLEL_TOOLS"))?,
            log_json: parse_flag("TOOLLOOP_LOG_JSON", get("TOOLLOOP_LOG_JSON"))?,
        })
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            llm_timeout: self.llm_timeout,
            max_tokens: Some(self.max_tokens),
            parallel_tools: self.parallel_tools,
        }
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| invalid(var, &v, e.to_string())),
    }
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(v) = value else {
        return Ok(false);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, &v, "expected true or false")),
    }
}
