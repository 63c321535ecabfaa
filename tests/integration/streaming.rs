//! Integration tests for streaming responses

use crate::integration::mock_server::{final_frame, text_frame, MockServerFixture};
use futures::StreamExt;
use vertex_gemini::{Message, StreamingEvent};

#[tokio::test]
async fn test_sse_streaming_response() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(
            "gemini-2.0-flash",
            vec![text_frame("Hello"), text_frame(", "), final_frame("World")],
        )
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let mut stream = client
        .generate_content_stream(&[Message::user("Say hello")])
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.unwrap());
    }
    mock.assert_async().await;

    let content: String = events
        .iter()
        .filter_map(|e| match e {
            StreamingEvent::PartialContentDelta { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(content, "Hello, World");
    assert_eq!(
        events.last(),
        Some(&StreamingEvent::StreamEnd {
            finish_reason: Some("stop".to_string())
        })
    );
    assert!(events.iter().any(|e| matches!(
        e,
        StreamingEvent::Metadata { usage: Some(u), .. } if u.total_tokens == 10
    )));
}

#[tokio::test]
async fn test_stream_error_status_is_reported_before_streaming() {
    let fixture = MockServerFixture::new().await;
    let mut server = fixture.server.lock().await;
    let _mock = server
        .mock(
            "POST",
            mockito::Matcher::Regex("streamGenerateContent".into()),
        )
        .with_status(404)
        .with_body(r#"{"error":{"code":404,"message":"model missing","status":"NOT_FOUND"}}"#)
        .create_async()
        .await;
    drop(server);

    let client = fixture.create_test_client("gemini-0").unwrap();
    let err = client
        .generate_content_stream(&[Message::user("hi")])
        .await
        .err()
        .unwrap();
    assert_eq!(err.http_status(), Some(404));
    assert!(err.to_string().contains("model missing (NOT_FOUND)"));
}

#[tokio::test]
async fn test_mid_stream_error_frame() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_sse_stream(
            "gemini-2.0-flash",
            vec![
                text_frame("partial"),
                serde_json::json!({"error": {"code": 500, "message": "backend died", "status": "INTERNAL"}}),
            ],
        )
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let events: Vec<StreamingEvent> = client
        .generate_content_stream(&[Message::user("hi")])
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(
        events[0],
        StreamingEvent::PartialContentDelta {
            content: "partial".into()
        }
    );
    assert!(matches!(&events[1], StreamingEvent::StreamError { error } if error["status"] == "INTERNAL"));
    assert!(matches!(events[2], StreamingEvent::StreamEnd { .. }));
}
