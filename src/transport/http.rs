use crate::config::GeminiConfig;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use keyring::Entry;
use reqwest::Proxy;
use std::time::Duration;

/// Keyring service name used when `GOOGLE_ACCESS_TOKEN` is not set.
pub const KEYRING_SERVICE: &str = "vertex-gemini";

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let base_url = config.endpoint_base();
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid API base URL: {}", e),
                ErrorContext::new()
                    .with_field_path(crate::config::ENV_BASE_URL)
                    .with_details(base_url.clone())
                    .with_source("transport"),
            )
        })?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10).min(config.timeout))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy URL: {}", e),
                    ErrorContext::new()
                        .with_field_path(crate::config::ENV_PROXY_URL)
                        .with_source("transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            project_id: config.project_id.clone(),
            access_token: Self::get_access_token(config),
        })
    }

    fn get_access_token(config: &GeminiConfig) -> Option<String> {
        // 1. Explicit config / GOOGLE_ACCESS_TOKEN
        if let Some(token) = &config.access_token {
            return Some(token.clone());
        }

        // 2. Keyring entry keyed by project
        let entry = Entry::new(KEYRING_SERVICE, &config.project_id).ok()?;
        entry.get_password().ok().filter(|t| !t.trim().is_empty())
    }

    pub fn has_credentials(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `base_url + path` and hand back the raw response,
    /// whatever its status. `sse` asks for an event stream.
    pub async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        client_request_id: &str,
        sse: bool,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .post(&url)
            .json(body)
            .header("x-goog-user-project", &self.project_id)
            // Our own correlation id; the API ignores it, logs use it.
            .header("x-vertex-gemini-request-id", client_request_id);

        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        if sse {
            req = req.header("accept", "text/event-stream");
        }

        req.send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    /// Convert a successful response into a byte stream.
    pub fn into_byte_stream(resp: reqwest::Response) -> BoxStream<'static, Bytes> {
        Box::pin(
            resp.bytes_stream()
                .map_err(|e| Error::Transport(TransportError::Http(e))),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
