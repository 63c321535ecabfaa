//! # vertex-gemini
//!
//! Vertex AI Gemini 入门工具包：文本生成、流式对话、图像分析与模型可用性探测。
//!
//! Starter kit for Gemini on Vertex AI: one-shot generation, streaming chat,
//! image analysis, and a prober that tells you which models your project can
//! actually call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vertex_gemini::{GeminiClient, GeminiConfig};
//!
//! #[tokio::main]
//! async fn main() -> vertex_gemini::Result<()> {
//!     let client = GeminiClient::new(GeminiConfig::from_env()?)?;
//!     let reply = client
//!         .generate_text("Tell me three things that make programming fun.")
//!         .await?;
//!     println!("{}", reply.text_or_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | `GeminiClient`, builder and `ChatSession` |
//! | [`config`] | Environment and probe configuration |
//! | [`drivers`] | Vertex AI wire format |
//! | [`pipeline`] | SSE decoding into streaming events |
//! | [`probe`] | Model availability probing and recommendation |
//! | [`render`] | Plain-text tables and panels for the CLI |
//! | [`transport`] | HTTP transport and credentials |
//! | [`types`] | Messages, parts and streaming events |

pub mod client;
pub mod config;
pub mod drivers;
pub mod pipeline;
pub mod probe;
pub mod render;
pub mod transport;
pub mod types;

pub use client::{ChatSession, GeminiClient, GeminiClientBuilder, GenerateResponse};
pub use config::{GeminiConfig, ProbeConfig};
pub use probe::{CancelToken, ModelProber, ProbeOutcome, ProbeReport, ProbeStatus};
pub use types::{
    events::StreamingEvent,
    message::{Message, MessageRole, Part},
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for stream items
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
