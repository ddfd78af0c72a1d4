//! Run configuration and its defaults.
//!
//! [`FactoryConfig`] gathers the settings a generation run needs and turns
//! them into a ready [`OpenAiClient`] via [`build_client`](FactoryConfig::build_client).

use std::path::PathBuf;

use klarity_factory::api::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, OPENAI_BASE_URL};
use klarity_factory::{ModelError, OpenAiClient};

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Draft file used when `--draft` is not given.
pub const DEFAULT_DRAFT_PATH: &str = "klarity-template.json";

/// Settings for a `klarity generate` run.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    /// Model identifier. Default: `"gpt-4o-mini"`.
    pub model: String,
    /// Sampling temperature. Default: `0.5`.
    pub temperature: f32,
    /// OpenAI-compatible API root. Default: `https://api.openai.com/v1`.
    pub base_url: String,
    /// Where the `.docx` is written. Default: `"."`.
    pub output_dir: PathBuf,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: OPENAI_BASE_URL.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl FactoryConfig {
    /// Build an API client for this configuration.
    pub fn build_client(&self, api_key: impl Into<String>) -> Result<OpenAiClient, ModelError> {
        Ok(OpenAiClient::new(api_key)?
            .with_model(&self.model)
            .with_temperature(self.temperature)
            .with_base_url(&self.base_url))
    }

    /// Read the API key from [`API_KEY_ENV`].
    pub fn api_key_from_env() -> Result<String, String> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(format!("{API_KEY_ENV} environment variable is not set")),
        }
    }
}
