//! AI provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
///
/// A missing API key does not fail validation: the server starts and each
/// completion call then reports the distinct configuration error. This
/// mirrors how the rest of the surface stays usable without a credential.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens the model may generate per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Cost rate in USD per 1K tokens for the configured model
    #[serde(default = "default_cost_per_1k_tokens")]
    pub cost_per_1k_tokens: f64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if a credential is configured
    pub fn has_api_key(&self) -> bool {
        use secrecy::ExposeSecret;
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if self.cost_per_1k_tokens < 0.0 {
            return Err(ValidationError::NegativeCostRate);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            cost_per_1k_tokens: default_cost_per_1k_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_cost_per_1k_tokens() -> f64 {
    0.002
}

fn default_timeout() -> u64 {
    60
}
