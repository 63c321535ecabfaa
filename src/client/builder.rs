use crate::client::core::GeminiClient;
use crate::config::GeminiConfig;
use crate::drivers::GenerationConfig;
use crate::{Error, ErrorContext, Result};
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Starts from [`GeminiConfig::from_env`] unless a config is supplied, so the
/// usual `.env` setup works and individual values can still be overridden.
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    config: Option<GeminiConfig>,
    model: Option<String>,
    access_token: Option<String>,
    timeout: Option<Duration>,
    generation: GenerationConfig,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit config instead of reading the environment.
    pub fn config(mut self, config: GeminiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.generation.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.generation.max_output_tokens = Some(n);
        self
    }

    /// Override the API base URL.
    ///
    /// This is primarily for testing with mock servers.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<GeminiClient> {
        let mut config = match self.config {
            Some(c) => c,
            None => GeminiConfig::from_env()?,
        };
        if let Some(model) = self.model {
            config = config.with_model(model);
        }
        if let Some(token) = self.access_token {
            config = config.with_access_token(token);
        }
        if let Some(base_url) = self.base_url_override {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(Error::configuration_with_context(
                    "timeout must be greater than zero",
                    ErrorContext::new()
                        .with_field_path("timeout")
                        .with_source("client_builder"),
                ));
            }
            config = config.with_timeout(timeout);
        }
        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(Error::validation_with_context(
                    format!("temperature {} is outside 0.0..=2.0", t),
                    ErrorContext::new()
                        .with_field_path("generationConfig.temperature")
                        .with_source("client_builder"),
                ));
            }
        }

        Ok(GeminiClient::new(config)?.with_generation_config(self.generation))
    }
}
