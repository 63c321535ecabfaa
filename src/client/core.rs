use crate::config::{GeminiConfig, ENV_ACCESS_TOKEN};
use crate::drivers::{GeminiDriver, GenerationConfig};
use crate::probe::GenerativeModelService;
use crate::transport::HttpTransport;
use crate::types::events::{StreamingEvent, UsageInfo};
use crate::types::message::{Message, Part};
use crate::{BoxStream, Error, ErrorContext, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// Result of a single `generateContent` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Concatenated text of the first candidate; `None` when the model sent no text.
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

impl GenerateResponse {
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Vertex AI Gemini client.
///
/// Cheap to clone: the HTTP connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) driver: GeminiDriver,
    pub(crate) generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
            driver: GeminiDriver::new(),
            generation: GenerationConfig::default(),
        })
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> crate::client::builder::GeminiClientBuilder {
        crate::client::builder::GeminiClientBuilder::new()
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Default model, if one is configured.
    pub fn model(&self) -> Option<&str> {
        self.config.model.as_deref()
    }

    /// Same connection, different default model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.config.model = Some(model.into());
        next
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Request path for `model`, relative to the API base.
    ///
    /// Every segment is percent-encoded, so a model name carrying `/`, `?`
    /// or `#` stays inside its own segment.
    pub fn model_path(&self, model: &str, stream: bool) -> Result<String> {
        let (method, query) = if stream {
            ("streamGenerateContent", Some("alt=sse"))
        } else {
            ("generateContent", None)
        };
        let invalid = |reason: String| {
            Error::validation_with_context(
                format!("cannot build request path: {}", reason),
                ErrorContext::new()
                    .with_field_path("model")
                    .with_details(model.to_string())
                    .with_source("client"),
            )
        };

        let mut url = Url::parse("http://localhost/").map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot carry a path".to_string()))?
            .clear()
            .extend([
                "v1",
                "projects",
                self.config.project_id.as_str(),
                "locations",
                self.config.location.as_str(),
                "publishers",
                "google",
                "models",
                format!("{}:{}", model, method).as_str(),
            ]);
        url.set_query(query);

        Ok(match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        })
    }

    /// One-shot text generation with the default model.
    pub async fn generate_text(&self, prompt: &str) -> Result<GenerateResponse> {
        if prompt.trim().is_empty() {
            return Err(empty_input("prompt"));
        }
        self.generate_content(&[Message::user(prompt)]).await
    }

    /// Describe an image (`gs://` / `https://` URI or local path) with the default model.
    pub async fn analyze_image(&self, image: &str, prompt: &str) -> Result<GenerateResponse> {
        if prompt.trim().is_empty() {
            return Err(empty_input("prompt"));
        }
        let image = Part::image_from_reference(image)?;
        let message = Message::with_parts(
            crate::types::message::MessageRole::User,
            vec![image, Part::text(prompt)],
        );
        self.generate_content(&[message]).await
    }

    pub async fn generate_content(&self, contents: &[Message]) -> Result<GenerateResponse> {
        let model = self.config.require_model()?.to_string();
        self.generate_content_with_model(&model, contents).await
    }

    pub async fn generate_content_with_model(
        &self,
        model: &str,
        contents: &[Message],
    ) -> Result<GenerateResponse> {
        if contents.is_empty() {
            return Err(empty_input("contents"));
        }
        let body = self.driver.build_request(contents, &self.generation);
        let client_request_id = Uuid::new_v4().to_string();
        let path = self.model_path(model, false)?;

        let start = Instant::now();
        let resp = self.send(&path, &body, &client_request_id, false).await?;
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Transport(crate::transport::TransportError::Http(e)))?;
        let parsed = self.driver.parse_response(&json);

        info!(
            model,
            client_request_id = client_request_id.as_str(),
            duration_ms = start.elapsed().as_millis(),
            finish_reason = parsed.finish_reason.as_deref().unwrap_or(""),
            "generateContent completed"
        );

        Ok(GenerateResponse {
            text: parsed.content,
            finish_reason: parsed.finish_reason,
            usage: parsed.usage,
        })
    }

    /// Stream a response from the default model.
    ///
    /// The stream always ends with one `StreamEnd`. Errors the API reports
    /// after streaming started arrive as `StreamError` events.
    pub async fn generate_content_stream(
        &self,
        contents: &[Message],
    ) -> Result<BoxStream<'static, StreamingEvent>> {
        let model = self.config.require_model()?.to_string();
        self.generate_content_stream_with_model(&model, contents)
            .await
    }

    pub async fn generate_content_stream_with_model(
        &self,
        model: &str,
        contents: &[Message],
    ) -> Result<BoxStream<'static, StreamingEvent>> {
        if contents.is_empty() {
            return Err(empty_input("contents"));
        }
        let body = self.driver.build_request(contents, &self.generation);
        let client_request_id = Uuid::new_v4().to_string();
        let path = self.model_path(model, true)?;

        let start = Instant::now();
        let resp = self.send(&path, &body, &client_request_id, true).await?;
        info!(
            model,
            client_request_id = client_request_id.as_str(),
            duration_ms = start.elapsed().as_millis(),
            "streamGenerateContent started streaming"
        );

        let bytes = HttpTransport::into_byte_stream(resp);
        Ok(crate::pipeline::event_stream(bytes, self.driver))
    }

    /// POST and turn a non-2xx status into `Error::Remote`.
    async fn send(
        &self,
        path: &str,
        body: &serde_json::Value,
        client_request_id: &str,
        sse: bool,
    ) -> Result<reqwest::Response> {
        let start = Instant::now();
        let resp = self
            .transport
            .post(path, body, client_request_id, sse)
            .await?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let raw = resp.text().await.unwrap_or_default();
        let message = self.driver.error_message(&raw);
        warn!(
            http_status = status,
            client_request_id,
            endpoint = path,
            duration_ms = start.elapsed().as_millis(),
            "Vertex AI request failed"
        );
        Err(Error::Remote { status, message })
    }
}

fn empty_input(field: &str) -> Error {
    Error::validation_with_context(
        format!("{} must not be empty", field),
        ErrorContext::new()
            .with_field_path(field)
            .with_source("client"),
    )
}

#[async_trait]
impl GenerativeModelService for GeminiClient {
    fn check_ready(&self) -> Result<()> {
        if self.transport.has_credentials() {
            return Ok(());
        }
        Err(Error::configuration_with_context(
            "no access token available",
            ErrorContext::new()
                .with_field_path(ENV_ACCESS_TOKEN)
                .with_details(format!(
                    "set {} (e.g. from `gcloud auth print-access-token`) or store it in the OS keyring",
                    ENV_ACCESS_TOKEN
                ))
                .with_source("client"),
        ))
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Option<String>> {
        let resp = self
            .generate_content_with_model(model, &[Message::user(prompt)])
            .await?;
        Ok(resp.text)
    }
}
