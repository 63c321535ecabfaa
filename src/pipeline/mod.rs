//! 流式处理模块：将 SSE 字节流转换为统一的流式事件。
//!
//! # Streaming Pipeline
//!
//! ```text
//! Raw Bytes → SseDecoder → GeminiDriver::parse_stream_event → StreamingEvent
//! ```
//!
//! Every stream produced here ends with exactly one
//! [`StreamingEvent::StreamEnd`], carrying the last finish reason seen.

pub mod decode;

pub use decode::SseDecoder;

use crate::drivers::GeminiDriver;
use crate::types::events::StreamingEvent;
use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;

/// Map decoded frames to events and append the terminal `StreamEnd`.
pub fn map_events(
    input: BoxStream<'static, Value>,
    driver: GeminiDriver,
) -> BoxStream<'static, StreamingEvent> {
    let mapped = stream::unfold(
        (input, VecDeque::<StreamingEvent>::new(), None::<String>, false),
        move |(mut input, mut pending, mut last_finish, ended)| async move {
            if ended {
                return None;
            }

            loop {
                if let Some(ev) = pending.pop_front() {
                    if let StreamingEvent::Metadata {
                        finish_reason: Some(reason),
                        ..
                    } = &ev
                    {
                        last_finish = Some(reason.clone());
                    }
                    return Some((Ok(ev), (input, pending, last_finish, false)));
                }

                match input.next().await {
                    Some(Ok(frame)) => {
                        pending.extend(driver.parse_stream_event(&frame));
                    }
                    Some(Err(e)) => return Some((Err(e), (input, pending, last_finish, false))),
                    None => break,
                }
            }

            // EOF: emit StreamEnd exactly once
            let end = StreamingEvent::StreamEnd {
                finish_reason: last_finish.clone(),
            };
            Some((Ok(end), (input, pending, last_finish, true)))
        },
    );

    Box::pin(mapped)
}

/// Full path from an `alt=sse` response body to unified events.
pub fn event_stream(
    bytes: BoxStream<'static, Bytes>,
    driver: GeminiDriver,
) -> BoxStream<'static, StreamingEvent> {
    let frames = SseDecoder::default().decode_stream(bytes);
    map_events(frames, driver)
}
