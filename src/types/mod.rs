//! 类型系统模块：Gemini 请求与流式事件的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of what goes over the wire to Vertex AI.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Conversation turn with role and parts |
//! | [`Part`] | Text, Cloud Storage reference or inline image |
//! | [`StreamingEvent`] | Event decoded from a streamed response |
//!
//! ## Example
//!
//! ```rust
//! use vertex_gemini::types::{Message, MessageRole, Part};
//!
//! let question = Message::with_parts(
//!     MessageRole::User,
//!     vec![
//!         Part::from_uri("gs://my-bucket/cat.jpg", None),
//!         Part::text("What is in this picture?"),
//!     ],
//! );
//! assert!(question.contains_image());
//! ```

pub mod events;
pub mod message;

pub use events::{StreamingEvent, UsageInfo};
pub use message::{FileData, InlineData, Message, MessageRole, Part};
