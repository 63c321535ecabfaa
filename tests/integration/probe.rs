//! Model prober against the mock endpoint

use crate::integration::mock_server::{MockServerFixture, LOCATION, PROJECT};
use std::time::Duration;
use vertex_gemini::probe::recommend::{PriorityEntry, PriorityTable, RecommendationSource};
use vertex_gemini::{GeminiClient, GeminiConfig, ModelProber, ProbeConfig, ProbeStatus};

fn probe_config(candidates: &[&str]) -> ProbeConfig {
    ProbeConfig {
        candidates: candidates.iter().map(|s| s.to_string()).collect(),
        priority: PriorityTable::new(vec![
            PriorityEntry::new("gemini-2.0-flash", 1).with_note("stable, fast"),
            PriorityEntry::new("gemini-1.5-flash", 2),
        ]),
        timeout: Duration::from_secs(5),
        ..ProbeConfig::default()
    }
}

#[tokio::test]
async fn test_probe_classifies_each_candidate_in_order() {
    let fixture = MockServerFixture::new().await;
    let _a = fixture.mock_text_reply("gemini-1.5-flash", "Hi there").await;
    let _b = fixture
        .mock_error_response(
            "gemini-9-pro",
            404,
            "NOT_FOUND",
            "Publisher Model was not found or your project does not have access to it.",
        )
        .await;
    let _c = fixture
        .mock_error_response(
            "gemini-2.0-flash",
            403,
            "PERMISSION_DENIED",
            "Permission denied on resource project",
        )
        .await;
    let _d = fixture
        .mock_json_response(
            "gemma-3-1b-it",
            200,
            r#"{"candidates":[{"content":{"parts":[]},"finishReason":"SAFETY"}]}"#,
        )
        .await;
    let _e = fixture
        .mock_error_response("gemini-1.5-pro", 500, "INTERNAL", "Internal error encountered.")
        .await;

    let client = fixture.create_test_client("unused").unwrap();
    let config = probe_config(&[
        "gemini-1.5-flash",
        "gemini-9-pro",
        "gemini-2.0-flash",
        "gemma-3-1b-it",
        "gemini-1.5-pro",
    ]);
    let report = ModelProber::from_config(&config)
        .run(&client, &config, None)
        .await
        .unwrap();

    let statuses: Vec<(&str, ProbeStatus)> = report
        .outcomes
        .iter()
        .map(|o| (o.model.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("gemini-1.5-flash", ProbeStatus::Available),
            ("gemini-9-pro", ProbeStatus::NotFound),
            ("gemini-2.0-flash", ProbeStatus::PermissionDenied),
            ("gemma-3-1b-it", ProbeStatus::EmptyResponse),
            ("gemini-1.5-pro", ProbeStatus::OtherError),
        ]
    );
    assert_eq!(report.outcomes[4].detail, "HTTP 500: Internal error encou...");
    assert!(!report.cancelled);

    // gemini-2.0-flash ranks first but is not available.
    let rec = report.recommendation.unwrap();
    assert_eq!(rec.model, "gemini-1.5-flash");
    assert_eq!(rec.source, RecommendationSource::Priority { rank: 2 });
}

#[tokio::test]
async fn test_probe_falls_back_to_first_available() {
    let fixture = MockServerFixture::new().await;
    let _a = fixture.mock_text_reply("gemma-3-4b-it", "Hello!").await;

    let client = fixture.create_test_client("unused").unwrap();
    let config = probe_config(&["gemma-3-4b-it"]);
    let report = ModelProber::from_config(&config)
        .run(&client, &config, None)
        .await
        .unwrap();

    let rec = report.recommendation.unwrap();
    assert_eq!(rec.model, "gemma-3-4b-it");
    assert_eq!(rec.source, RecommendationSource::FirstAvailable);
}

#[tokio::test]
async fn test_probe_without_token_fails_before_any_request() {
    let fixture = MockServerFixture::new().await;
    let mut server = fixture.server.lock().await;
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    drop(server);

    // No token in config; the keyring has no entry for this made-up project.
    let client = GeminiClient::new(
        GeminiConfig::new(format!("{}-no-token-{}", PROJECT, uuid::Uuid::new_v4()), LOCATION)
            .with_base_url(fixture.base_url.clone()),
    )
    .unwrap();
    let config = probe_config(&["gemini-2.0-flash"]);
    let err = ModelProber::from_config(&config)
        .run(&client, &config, None)
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_ignores_request_url() {
    // "404" in the project id must not turn a refused connection into NotFound.
    let client = GeminiClient::builder()
        .config(GeminiConfig::new("shop-404-prod", LOCATION))
        .access_token("test-token")
        .base_url_override("http://127.0.0.1:9")
        .build()
        .unwrap();
    let config = probe_config(&["gemini-2.0-flash"]);
    let report = ModelProber::from_config(&config)
        .run(&client, &config, None)
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, ProbeStatus::OtherError, "{}", outcome.detail);
    assert!(!outcome.detail.contains("shop-404-prod"), "{}", outcome.detail);
    assert!(!outcome.detail.starts_with("HTTP error"), "{}", outcome.detail);
}
