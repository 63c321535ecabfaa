//! Multi-turn chat on top of [`GeminiClient`].

use crate::client::core::{GenerateResponse, GeminiClient};
use crate::types::events::StreamingEvent;
use crate::types::message::Message;
use crate::{Error, ErrorContext, Result};
use futures::StreamExt;

/// Conversation state: the user and model turns exchanged so far.
///
/// A turn pair is only recorded once the model has answered completely; a
/// failed or abandoned send leaves the history as it was.
pub struct ChatSession {
    client: GeminiClient,
    system_instruction: Option<String>,
    history: Vec<Message>,
}

impl ChatSession {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            system_instruction: None,
            history: Vec::new(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn contents_for(&self, text: &str) -> Result<Vec<Message>> {
        if text.trim().is_empty() {
            return Err(Error::validation_with_context(
                "chat message must not be empty",
                ErrorContext::new()
                    .with_field_path("message")
                    .with_source("chat"),
            ));
        }
        let mut contents = Vec::with_capacity(self.history.len() + 2);
        if let Some(sys) = &self.system_instruction {
            contents.push(Message::system(sys.clone()));
        }
        contents.extend(self.history.iter().cloned());
        contents.push(Message::user(text));
        Ok(contents)
    }

    fn record(&mut self, user: &str, reply: &str) {
        self.history.push(Message::user(user));
        self.history.push(Message::model(reply));
    }

    pub async fn send_message(&mut self, text: &str) -> Result<GenerateResponse> {
        let contents = self.contents_for(text)?;
        let resp = self.client.generate_content(&contents).await?;
        self.record(text, resp.text_or_empty());
        Ok(resp)
    }

    /// Stream the reply, handing each text delta to `on_delta` as it arrives.
    ///
    /// Returns the assembled reply. A `StreamError` event ends the call with
    /// `Error::Stream`.
    pub async fn send_message_stream<F>(
        &mut self,
        text: &str,
        mut on_delta: F,
    ) -> Result<GenerateResponse>
    where
        F: FnMut(&str),
    {
        let contents = self.contents_for(text)?;
        let mut stream = self.client.generate_content_stream(&contents).await?;

        let mut response = GenerateResponse::default();
        let mut full = String::new();
        while let Some(event) = stream.next().await {
            match event? {
                StreamingEvent::PartialContentDelta { content } => {
                    on_delta(&content);
                    full.push_str(&content);
                }
                StreamingEvent::Metadata {
                    usage,
                    finish_reason,
                } => {
                    if usage.is_some() {
                        response.usage = usage;
                    }
                    if finish_reason.is_some() {
                        response.finish_reason = finish_reason;
                    }
                }
                StreamingEvent::StreamError { error } => {
                    let message = error
                        .get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string());
                    return Err(Error::Stream { message });
                }
                StreamingEvent::StreamEnd { .. } => break,
            }
        }

        self.record(text, &full);
        if !full.is_empty() {
            response.text = Some(full);
        }
        Ok(response)
    }
}
