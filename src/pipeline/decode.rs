//! Streaming decoder (Bytes -> JSON Value) for `alt=sse` responses.

use crate::{BoxStream, PipeResult};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::warn;

/// A minimal SSE decoder:
/// - buffers raw bytes and decodes UTF-8 only per complete frame
/// - splits frames on a blank line, with `\n`, `\r\n` or `\r` line endings
/// - joins the `data:` lines of a frame
/// - ignores comments and other fields (`event:`, `id:`)
/// - stops on the `[DONE]` sentinel if a proxy adds one
#[derive(Debug, Clone)]
pub struct SseDecoder {
    done_signal: String,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SseDecoder {
    pub fn new(done_signal: Option<String>) -> Self {
        Self {
            done_signal: done_signal.unwrap_or_else(|| "[DONE]".to_string()),
        }
    }

    /// Locate the first blank line in `buf`.
    ///
    /// Returns `(frame_len, consumed)`: the frame is `buf[..frame_len]` and
    /// `consumed` also covers the blank line. A trailing `\r` is undecided
    /// until the next byte shows whether it starts a `\r\n`.
    fn find_frame_end(buf: &[u8]) -> Option<(usize, usize)> {
        let mut line_start = 0;
        let mut i = 0;
        while i < buf.len() {
            let eol = match buf[i] {
                b'\n' => 1,
                b'\r' => match buf.get(i + 1) {
                    Some(b'\n') => 2,
                    Some(_) => 1,
                    None => return None,
                },
                _ => {
                    i += 1;
                    continue;
                }
            };
            if i == line_start {
                return Some((line_start, i + eol));
            }
            i += eol;
            line_start = i;
        }
        None
    }

    /// Payload of one frame, `None` for frames that carry no data.
    fn frame_payload(frame: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(frame)
            .replace("\r\n", "\n")
            .replace('\r', "\n");
        let data: Vec<&str> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .collect();
        if data.is_empty() {
            None
        } else {
            Some(data.join("\n"))
        }
    }

    // Parsing lives inside the unfold closure so the returned stream does not borrow `self`.
    pub fn decode_stream(&self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
        let done_signal = self.done_signal.clone();

        // Incrementally buffer bytes and emit full frames split by blank lines.
        let stream = stream::unfold(
            (input, BytesMut::new(), false),
            move |(mut input, mut buf, finished)| {
                let done_signal = done_signal.clone();
                async move {
                    if finished {
                        return None;
                    }

                    // Some(Some(v)) => emit, Some(None) => skip, None => done
                    let parse = |frame: &[u8]| -> Option<Option<Value>> {
                        let payload = Self::frame_payload(frame)?;
                        let payload = payload.trim();
                        if payload == done_signal {
                            return None;
                        }
                        match serde_json::from_str::<Value>(payload) {
                            Ok(v) => Some(Some(v)),
                            Err(e) => {
                                warn!(error = %e, "skipping undecodable SSE frame");
                                Some(None)
                            }
                        }
                    };

                    loop {
                        if let Some((frame_len, consumed)) = Self::find_frame_end(&buf) {
                            let mut frame = buf.split_to(consumed);
                            frame.truncate(frame_len);

                            if frame.iter().all(u8::is_ascii_whitespace) {
                                continue;
                            }
                            match parse(&frame[..]) {
                                Some(Some(v)) => return Some((Ok(v), (input, buf, false))),
                                Some(None) => continue,
                                None => return None,
                            }
                        }

                        // Need more data.
                        match input.next().await {
                            Some(Ok(bytes)) => {
                                buf.extend_from_slice(&bytes);
                                continue;
                            }
                            Some(Err(e)) => {
                                return Some((Err(e), (input, buf, true)));
                            }
                            None => {
                                // EOF: try the unterminated tail once
                                if let Some(Some(v)) = parse(&buf[..]) {
                                    return Some((Ok(v), (input, BytesMut::new(), true)));
                                }
                                return None;
                            }
                        }
                    }
                }
            },
        );

        Box::pin(stream)
    }
}

/// Collect a decoded stream; handy for tests and small responses.
pub async fn collect_values(mut s: BoxStream<'static, Value>) -> PipeResult<Vec<Value>> {
    let mut out = Vec::new();
    while let Some(v) = s.next().await {
        out.push(v?);
    }
    Ok(out)
}
