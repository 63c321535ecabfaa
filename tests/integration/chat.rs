//! Chat session history against the mock endpoint

use crate::integration::mock_server::{final_frame, text_frame, MockServerFixture};
use vertex_gemini::{ChatSession, Error, MessageRole};

#[tokio::test]
async fn test_history_grows_by_one_pair_per_reply() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_text_reply("gemini-2.0-flash", "Hi!").await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let mut chat = ChatSession::new(client);
    chat.send_message("Hello").await.unwrap();
    chat.send_message("Again").await.unwrap();

    let history = chat.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].text(), "Hello");
    assert_eq!(history[1].role, MessageRole::Model);
    assert_eq!(history[1].text(), "Hi!");
    assert_eq!(history[2].text(), "Again");
}

#[tokio::test]
async fn test_second_turn_sends_previous_turns() {
    let fixture = MockServerFixture::new().await;
    let first = fixture.mock_text_reply("gemini-2.0-flash", "Nice to meet you.").await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let mut chat = ChatSession::new(client);
    chat.send_message("My name is Sam.").await.unwrap();
    first.remove_async().await;

    let mut server = fixture.server.lock().await;
    let second = server
        .mock(
            "POST",
            MockServerFixture::model_path("gemini-2.0-flash").as_str(),
        )
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "My name is Sam." }] },
                { "role": "model", "parts": [{ "text": "Nice to meet you." }] },
                { "role": "user", "parts": [{ "text": "What is my name?" }] }
            ]
        })))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Sam."}]}}]}"#)
        .create_async()
        .await;
    drop(server);

    let reply = chat.send_message("What is my name?").await.unwrap();
    second.assert_async().await;
    assert_eq!(reply.text_or_empty(), "Sam.");
}

#[tokio::test]
async fn test_failed_send_leaves_history_unchanged() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response("gemini-2.0-flash", 429, "RESOURCE_EXHAUSTED", "Quota exceeded")
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let mut chat = ChatSession::new(client);
    let err = chat.send_message("Hello").await.unwrap_err();
    assert_eq!(err.http_status(), Some(429));
    assert!(chat.history().is_empty());
}

#[tokio::test]
async fn test_streamed_reply_is_recorded_after_completion() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(
            "gemini-2.0-flash",
            vec![text_frame("Stream"), final_frame("ed.")],
        )
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let mut chat = ChatSession::new(client);
    let mut deltas = Vec::new();
    let reply = chat
        .send_message_stream("Go", |d| deltas.push(d.to_string()))
        .await
        .unwrap();

    assert_eq!(deltas, vec!["Stream", "ed."]);
    assert_eq!(reply.text.as_deref(), Some("Streamed."));
    assert_eq!(reply.finish_reason.as_deref(), Some("stop"));
    assert_eq!(chat.history().len(), 2);
    assert_eq!(chat.history()[1].text(), "Streamed.");
}

#[tokio::test]
async fn test_stream_error_event_fails_the_turn() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(
            "gemini-2.0-flash",
            vec![
                text_frame("half"),
                serde_json::json!({"error": {"code": 500, "message": "backend died"}}),
            ],
        )
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let mut chat = ChatSession::new(client);
    let err = chat.send_message_stream("Go", |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::Stream { ref message } if message == "backend died"));
    assert!(chat.history().is_empty());
}
