use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub session_cookie: String,
    pub llm: LlmConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub primary: Option<ModelSourceConfig>,
    pub fallback: Option<ModelSourceConfig>,
    pub timeout: Duration,
}

/// One OpenAI-compatible chat endpoint.
#[derive(Clone, Debug)]
pub struct ModelSourceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://school.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let session_cookie = env::var("SESSION_COOKIE").unwrap_or_else(|_| "session".to_string());

        let timeout_secs = parse_var("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?;
        let llm = LlmConfig {
            primary: model_source_from_env("LLM"),
            fallback: model_source_from_env("LLM_FALLBACK"),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_upload_bytes,
            session_cookie,
            llm,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}

// A source is only configured when its API key is present.
fn model_source_from_env(prefix: &str) -> Option<ModelSourceConfig> {
    let api_key = env::var(format!("{}_API_KEY", prefix)).ok()?;
    if api_key.trim().is_empty() {
        return None;
    }
    let base_url = env::var(format!("{}_BASE_URL", prefix))
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let model = env::var(format!("{}_MODEL", prefix)).unwrap_or_else(|_| "gpt-4o-mini".to_string());

    Some(ModelSourceConfig {
        base_url,
        api_key,
        model,
    })
}
