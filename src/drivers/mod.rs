//! 驱动层 — Gemini 请求/响应格式转换
//!
//! Wire-format adaptation between the crate's unified types and the Vertex AI
//! `generateContent` JSON. Kept free of I/O so it can be tested in isolation;
//! the client layer owns transport.

pub mod gemini;

use crate::types::events::UsageInfo;
use serde_json::Value;

pub use gemini::GeminiDriver;

/// Sampling parameters, sent as `generationConfig`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_output_tokens.is_none()
    }
}

/// Unified non-streaming response.
#[derive(Debug, Clone)]
pub struct DriverResponse {
    /// Concatenated text of the first candidate; `None` when it had no text parts.
    pub content: Option<String>,
    /// Finish reason normalized to lowercase (`stop`, `length`, `content_filter`, ...).
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
    /// Raw provider response for debugging.
    pub raw: Value,
}
