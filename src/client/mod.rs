//! 客户端模块：Vertex AI Gemini 的调用入口。
//!
//! - [`GeminiClient`]: one-shot and streaming generation, image analysis
//! - [`GeminiClientBuilder`]: overrides on top of the environment config
//! - [`ChatSession`]: multi-turn history

pub mod builder;
pub mod chat;
pub mod core;

pub use builder::GeminiClientBuilder;
pub use chat::ChatSession;
pub use core::{GenerateResponse, GeminiClient};
