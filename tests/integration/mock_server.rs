//! Mock Vertex AI endpoint for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use tokio::sync::Mutex;
use vertex_gemini::{GeminiClient, GeminiConfig};

pub const PROJECT: &str = "test-project";
pub const LOCATION: &str = "us-central1";
pub const TOKEN: &str = "test-token";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn model_path(model: &str) -> String {
        format!(
            "/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            PROJECT, LOCATION, model
        )
    }

    fn stream_path(model: &str) -> Matcher {
        Matcher::Regex(format!(
            "^/v1/projects/{}/locations/{}/publishers/google/models/{}:streamGenerateContent",
            PROJECT, LOCATION, model
        ))
    }

    /// Client pointed at the mock server, default model `model`.
    pub fn create_test_client(&self, model: &str) -> vertex_gemini::Result<GeminiClient> {
        GeminiClient::builder()
            .config(GeminiConfig::new(PROJECT, LOCATION))
            .access_token(TOKEN)
            .model(model)
            .base_url_override(&self.base_url)
            .build()
    }

    /// `generateContent` answering with `status` and a JSON body.
    pub async fn mock_json_response(&self, model: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", Self::model_path(model).as_str())
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// `generateContent` answering 200 with one text part.
    pub async fn mock_text_reply(&self, model: &str, text: &str) -> Mock {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 1,
                "candidatesTokenCount": 2,
                "totalTokenCount": 3
            }
        });
        self.mock_json_response(model, 200, &body.to_string()).await
    }

    /// Google-style error body for `status`.
    pub async fn mock_error_response(
        &self,
        model: &str,
        status: usize,
        google_status: &str,
        message: &str,
    ) -> Mock {
        let body = serde_json::json!({
            "error": { "code": status, "message": message, "status": google_status }
        });
        self.mock_json_response(model, status, &body.to_string()).await
    }

    /// `streamGenerateContent?alt=sse` answering with the given JSON frames.
    pub async fn mock_sse_stream(&self, model: &str, frames: Vec<serde_json::Value>) -> Mock {
        let mut server = self.server.lock().await;
        let body = frames
            .iter()
            .map(|f| format!("data: {}\r\n\r\n", f))
            .collect::<Vec<_>>()
            .join("");

        server
            .mock("POST", Self::stream_path(model))
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }
}

/// One streamed frame carrying a text delta.
pub fn text_frame(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
}

/// Final streamed frame with finish reason and usage.
pub fn final_frame(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10 }
    })
}
