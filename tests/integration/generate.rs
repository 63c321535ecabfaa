//! Integration tests for one-shot generation and HTTP error mapping

use crate::integration::mock_server::{MockServerFixture, TOKEN};
use vertex_gemini::{Error, Message, MessageRole, Part};

#[tokio::test]
async fn test_generate_content_success() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_text_reply("gemini-2.0-flash", "Rust is fun.").await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let resp = client.generate_text("Why is Rust fun?").await.unwrap();

    mock.assert_async().await;
    assert_eq!(resp.text.as_deref(), Some("Rust is fun."));
    assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    assert_eq!(resp.usage.map(|u| u.total_tokens), Some(3));
}

#[tokio::test]
async fn test_request_body_shape() {
    let fixture = MockServerFixture::new().await;
    let mut server = fixture.server.lock().await;
    let mock = server
        .mock(
            "POST",
            MockServerFixture::model_path("gemini-1.5-flash").as_str(),
        )
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .match_header("x-goog-user-project", "test-project")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "systemInstruction": { "parts": [{ "text": "Answer in English." }] },
            "contents": [{
                "role": "user",
                "parts": [
                    { "fileData": { "mimeType": "image/png", "fileUri": "gs://bucket/cat.png" } },
                    { "text": "What is this?" }
                ]
            }]
        })))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"A cat."}]}}]}"#)
        .create_async()
        .await;
    drop(server);

    let client = fixture.create_test_client("gemini-1.5-flash").unwrap();
    let resp = client
        .generate_content(&[
            Message::system("Answer in English."),
            Message::with_parts(
                MessageRole::User,
                vec![
                    Part::from_uri("gs://bucket/cat.png", None),
                    Part::text("What is this?"),
                ],
            ),
        ])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.text_or_empty(), "A cat.");
}

#[tokio::test]
async fn test_not_found_maps_to_remote_404() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(
            "gemini-9.9-ultra",
            404,
            "NOT_FOUND",
            "Publisher Model `gemini-9.9-ultra` was not found",
        )
        .await;

    let client = fixture.create_test_client("gemini-9.9-ultra").unwrap();
    let err = client.generate_text("hi").await.unwrap_err();
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Publisher Model `gemini-9.9-ultra` was not found (NOT_FOUND)");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_maps_to_remote_403() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(
            "gemini-2.0-flash",
            403,
            "PERMISSION_DENIED",
            "Permission 'aiplatform.endpoints.predict' denied",
        )
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let err = client.generate_text("hi").await.unwrap_err();
    assert_eq!(err.http_status(), Some(403));
    assert!(err.to_string().starts_with("Remote error: HTTP 403: Permission"));
}

#[tokio::test]
async fn test_non_json_error_body_is_kept() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("gemini-2.0-flash", 502, "  upstream unavailable \n")
        .await;

    let client = fixture.create_test_client("gemini-2.0-flash").unwrap();
    let err = client.generate_text("hi").await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: 502, ref message } if message == "upstream unavailable"));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Port 9 (discard) on localhost is normally closed.
    let client = vertex_gemini::GeminiClient::builder()
        .config(vertex_gemini::GeminiConfig::new("p", "us-central1"))
        .access_token("t")
        .model("gemini-2.0-flash")
        .base_url_override("http://127.0.0.1:9")
        .build()
        .unwrap();
    let err = client.generate_text("hi").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err:?}");
}
