//! Gemini generateContent 驱动 — 实现 Vertex AI 特有的请求/响应格式转换
//!
//! Key differences from chat-completions style APIs:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - Roles: `user` and `model`. System text goes to top-level `systemInstruction`.
//! - `generationConfig` wraps temperature and `maxOutputTokens`.
//! - Response text lives in `candidates[0].content.parts[*].text`.
//! - Streaming (`alt=sse`) sends one full response object per SSE frame.

use serde_json::Value;

use super::{DriverResponse, GenerationConfig};
use crate::types::events::{StreamingEvent, UsageInfo};
use crate::types::message::{Message, MessageRole};

/// Stateless converter for the Vertex AI Gemini wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiDriver;

impl GeminiDriver {
    pub fn new() -> Self {
        Self
    }

    /// Separate system instructions from conversation contents.
    fn split_messages(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
        let mut system_parts: Vec<String> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for m in messages {
            let role = match m.role {
                MessageRole::System => {
                    system_parts.push(m.text());
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Model => "model",
            };
            contents.push(serde_json::json!({
                "role": role,
                "parts": m.parts,
            }));
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(serde_json::json!({
                "parts": [{ "text": system_parts.join("\n\n") }]
            }))
        };

        (system_instruction, contents)
    }

    /// Build the JSON body shared by `generateContent` and `streamGenerateContent`.
    pub fn build_request(&self, messages: &[Message], config: &GenerationConfig) -> Value {
        let (system_instruction, contents) = Self::split_messages(messages);

        let mut body = serde_json::json!({
            "contents": contents,
        });

        if let Some(sys) = system_instruction {
            body["systemInstruction"] = sys;
        }

        if !config.is_empty() {
            let mut gen_config = serde_json::json!({});
            if let Some(t) = config.temperature {
                gen_config["temperature"] = serde_json::json!(t);
            }
            if let Some(mt) = config.max_output_tokens {
                gen_config["maxOutputTokens"] = serde_json::json!(mt);
            }
            body["generationConfig"] = gen_config;
        }

        body
    }

    pub fn parse_response(&self, body: &Value) -> DriverResponse {
        DriverResponse {
            content: candidate_text(body),
            finish_reason: finish_reason(body),
            usage: usage(body),
            raw: body.clone(),
        }
    }

    /// Decode one SSE payload into zero or more events.
    ///
    /// A single frame may carry text, a finish reason and usage at once; each
    /// becomes its own event, text first.
    pub fn parse_stream_event(&self, frame: &Value) -> Vec<StreamingEvent> {
        if let Some(error) = frame.get("error") {
            return vec![StreamingEvent::StreamError {
                error: error.clone(),
            }];
        }

        let mut events = Vec::new();
        if let Some(text) = candidate_text(frame) {
            if !text.is_empty() {
                events.push(StreamingEvent::PartialContentDelta { content: text });
            }
        }

        let finish_reason = finish_reason(frame);
        let usage = usage(frame);
        if finish_reason.is_some() || usage.is_some() {
            events.push(StreamingEvent::Metadata {
                usage,
                finish_reason,
            });
        }
        events
    }

    /// Human-readable message out of a Google API error body.
    ///
    /// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}` becomes
    /// `"... (NOT_FOUND)"`; anything unparseable is returned trimmed as-is.
    pub fn error_message(&self, body: &str) -> String {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed
            .as_ref()
            .and_then(|v| v.get("error").or_else(|| v.pointer("/0/error")));
        let message = error.and_then(|e| e.get("message")).and_then(|m| m.as_str());
        let status = error.and_then(|e| e.get("status")).and_then(|s| s.as_str());
        match (message, status) {
            (Some(m), Some(s)) => format!("{} ({})", m, s),
            (Some(m), None) => m.to_string(),
            _ => body.trim().to_string(),
        }
    }
}

fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

fn finish_reason(body: &Value) -> Option<String> {
    body.pointer("/candidates/0/finishReason")
        .and_then(|v| v.as_str())
        .filter(|r| *r != "FINISH_REASON_UNSPECIFIED")
        .map(|r| match r {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                "content_filter".to_string()
            }
            other => other.to_lowercase(),
        })
}

fn usage(body: &Value) -> Option<UsageInfo> {
    body.get("usageMetadata").map(|u| UsageInfo {
        prompt_tokens: u["promptTokenCount"].as_u64().unwrap_or(0),
        completion_tokens: u["candidatesTokenCount"].as_u64().unwrap_or(0),
        total_tokens: u["totalTokenCount"].as_u64().unwrap_or(0),
    })
}
