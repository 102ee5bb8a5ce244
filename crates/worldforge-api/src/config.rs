//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use worldforge_generation::application::settings::{GenerationSettings, RetryPolicy};
use worldforge_providers::OpenAiConfig;
use worldforge_providers::openai::DEFAULT_BASE_URL;
use worldforge_tasks::application::queue::DEFAULT_RETENTION;

use crate::error::AppError;

/// Everything `main` needs to assemble the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Generation backend connection.
    pub provider: OpenAiConfig,
    /// Retry policies and model settings.
    pub generation: GenerationSettings,
    /// Terminal tasks kept by `POST /api/v1/tasks/cleanup`.
    pub task_retention: usize,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `GENERATION_API_KEY` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `GENERATION_API_KEY` is missing or a
    /// numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenerationSettings::default();
        let text = defaults.text_policy;
        let image = defaults.image_policy;

        let api_key = lookup("GENERATION_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("GENERATION_API_KEY environment variable must be set".into())
            })?;

        let mut text_model = defaults.text_model.clone();
        if let Some(model) = lookup("TEXT_MODEL") {
            text_model.model = model;
        }

        let generation = GenerationSettings {
            text_policy: RetryPolicy::from_millis(
                parse_or(&lookup, "TEXT_MAX_ATTEMPTS", text.max_attempts)?,
                parse_or(&lookup, "TEXT_BACKOFF_MS", millis(text.base_backoff))?,
                parse_or(&lookup, "TEXT_TIMEOUT_MS", millis(text.timeout))?,
            ),
            image_policy: RetryPolicy::from_millis(
                parse_or(&lookup, "IMAGE_MAX_ATTEMPTS", image.max_attempts)?,
                parse_or(&lookup, "IMAGE_BACKOFF_MS", millis(image.base_backoff))?,
                parse_or(&lookup, "IMAGE_TIMEOUT_MS", millis(image.timeout))?,
            ),
            text_model,
            ..defaults
        };

        let mut provider = OpenAiConfig::new(api_key);
        provider.base_url = lookup("GENERATION_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if let Some(model) = lookup("IMAGE_MODEL") {
            provider.image_model = model;
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            provider,
            generation,
            task_retention: parse_or(&lookup, "TASK_RETENTION", DEFAULT_RETENTION)?,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unparsable host.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
    }
}
