use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use client::api_client::{AnalysisClient, ClientError, ProgressFn};
use client::normalize::GENERIC_UPLOAD_ERROR;
use client::upload::ResumeFile;
use httpmock::prelude::*;
use serde_json::json;

fn test_client(base_url: String) -> AnalysisClient {
    AnalysisClient::new(base_url, Duration::from_secs(5))
}

fn small_resume() -> ResumeFile {
    ResumeFile::from_bytes("resume.pdf", Bytes::from_static(b"%PDF-1.4 fake resume"))
        .expect("valid test file")
}

#[tokio::test]
async fn upload_success_returns_payload_unchanged() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "strengths": ["Quantified impact", "Clean layout"],
                    "weaknesses": ["Missing summary section"],
                    "missingSkills": ["GraphQL"],
                    "summary": "Strong senior backend profile.",
                    "jobFitScore": 84,
                    "processingTime": 1764.0,
                    "cached": false
                }));
        })
        .await;

    let client = test_client(server.base_url());
    let analysis = client
        .upload_resume(&small_resume(), None)
        .await
        .expect("upload should succeed");

    mock.assert_async().await;
    assert_eq!(analysis.strengths.len(), 2);
    assert_eq!(analysis.missing_skills, vec!["GraphQL".to_string()]);
    assert_eq!(analysis.summary, "Strong senior backend profile.");
    assert_eq!(analysis.job_fit_score, 84.0);
    assert_eq!(analysis.processing_time, Some(1764.0));
    assert_eq!(analysis.cached, Some(false));
    assert_eq!(analysis.error, None);
}

#[tokio::test]
async fn malformed_payload_is_replaced_by_fallback() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "strengths": "not an array",
                    "processingTime": 1234.0,
                    "cached": true
                }));
        })
        .await;

    let client = test_client(server.base_url());
    let analysis = client
        .upload_resume(&small_resume(), None)
        .await
        .expect("shape errors are recovered locally, not surfaced");

    assert_eq!(analysis.job_fit_score, 50.0);
    assert_eq!(analysis.strengths[0], "Resume analysis in progress");
    // Metadata passes through into the substitute.
    assert_eq!(analysis.processing_time, Some(1234.0));
    assert_eq!(analysis.cached, Some(true));
    assert_eq!(analysis.error, None);
}

#[tokio::test]
async fn undecodable_body_is_replaced_by_fallback() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(200).body("this is not json");
        })
        .await;

    let client = test_client(server.base_url());
    let analysis = client
        .upload_resume(&small_resume(), None)
        .await
        .expect("an unparseable 2xx body still yields a renderable result");

    assert_eq!(analysis.job_fit_score, 50.0);
    assert_eq!(analysis.cached, Some(false));
}

#[tokio::test]
async fn server_error_message_is_carried_on_rejection() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({ "error": "bad file" }));
        })
        .await;

    let client = test_client(server.base_url());
    let err = client
        .upload_resume(&small_resume(), None)
        .await
        .expect_err("non-2xx must reject");

    match err {
        ClientError::Upload {
            status,
            message,
            body,
        } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "bad file");
            assert_eq!(body.error.as_deref(), Some("bad file"));
            assert_eq!(body.job_fit_score, 0.0);
            assert_eq!(body.strengths[0], "Error processing request");
            assert_eq!(body.cached, Some(false));
        }
        other => panic!("expected ClientError::Upload, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_body_uses_generic_message() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(500);
        })
        .await;

    let client = test_client(server.base_url());
    let err = client
        .upload_resume(&small_resume(), None)
        .await
        .expect_err("5xx must reject");

    match err {
        ClientError::Upload {
            status,
            message,
            body,
        } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, GENERIC_UPLOAD_ERROR);
            assert_eq!(body.error.as_deref(), Some(GENERIC_UPLOAD_ERROR));
        }
        other => panic!("expected ClientError::Upload, got {other:?}"),
    }
}

#[tokio::test]
async fn fresh_upload_targets_the_fresh_endpoint() {
    let server = MockServer::start_async().await;
    let fresh_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload-fresh");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "strengths": [],
                    "weaknesses": [],
                    "missingSkills": [],
                    "summary": "Fresh analysis.",
                    "jobFitScore": 61,
                    "cached": false
                }));
        })
        .await;

    let client = test_client(server.base_url());
    let analysis = client
        .upload_resume_fresh(&small_resume(), None)
        .await
        .expect("fresh upload should succeed");

    fresh_mock.assert_async().await;
    assert_eq!(analysis.summary, "Fresh analysis.");
    assert_eq!(analysis.cached, Some(false));
}

#[tokio::test]
async fn progress_percentages_are_monotonic_and_end_at_100() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "strengths": [],
                    "weaknesses": [],
                    "missingSkills": [],
                    "summary": "",
                    "jobFitScore": 70
                }));
        })
        .await;

    // Several 64 KiB chunks so progress ticks more than once.
    let file = ResumeFile::from_bytes("resume.pdf", Bytes::from(vec![b'x'; 300 * 1024]))
        .expect("valid test file");

    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let on_progress: ProgressFn = Arc::new(move |percent| {
        sink.lock().unwrap().push(percent);
    });

    let client = test_client(server.base_url());
    client
        .upload_resume(&file, Some(on_progress))
        .await
        .expect("upload should succeed");

    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 2, "expected multiple ticks, got {seen:?}");
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {seen:?}");
    assert!(seen.iter().all(|p| *p <= 100));
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test]
async fn second_upload_while_one_is_in_flight_is_rejected() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(200)
                .delay(Duration::from_millis(500))
                .header("content-type", "application/json")
                .json_body(json!({
                    "strengths": [],
                    "weaknesses": [],
                    "missingSkills": [],
                    "summary": "slow",
                    "jobFitScore": 55
                }));
        })
        .await;

    let client = test_client(server.base_url());
    let file = small_resume();

    let slow_client = client.clone();
    let slow_file = file.clone();
    let first = tokio::spawn(async move { slow_client.upload_resume(&slow_file, None).await });

    // Give the first request time to claim the slot.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = client.upload_resume(&file, None).await;
    assert!(matches!(second, Err(ClientError::UploadInFlight)));

    let first = first.await.expect("task should not panic");
    assert!(first.is_ok(), "first upload should complete: {first:?}");

    // The slot is free again once the first upload finished.
    let third = client.upload_resume(&file, None).await;
    assert!(third.is_ok());
}

#[tokio::test]
async fn timeout_is_reported_as_rejection_with_error_placeholder() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload");
            then.status(200)
                .delay(Duration::from_millis(400))
                .header("content-type", "application/json")
                .json_body(json!({
                    "strengths": [],
                    "weaknesses": [],
                    "missingSkills": [],
                    "summary": "too late",
                    "jobFitScore": 90
                }));
        })
        .await;

    let client = AnalysisClient::new(server.base_url(), Duration::from_millis(100));
    let err = client
        .upload_resume(&small_resume(), None)
        .await
        .expect_err("should time out");

    match err {
        ClientError::Upload {
            status,
            message,
            body,
        } => {
            assert_eq!(status, None);
            assert_eq!(message, GENERIC_UPLOAD_ERROR);
            assert_eq!(body.error.as_deref(), Some(GENERIC_UPLOAD_ERROR));
            assert_eq!(body.processing_time, Some(0.0));
        }
        other => panic!("expected ClientError::Upload, got {other:?}"),
    }
}

#[tokio::test]
async fn analytics_passes_server_json_through() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/analytics");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "totalUploads": 12,
                    "averageJobFitScore": 67.5
                }));
        })
        .await;

    let client = test_client(server.base_url());
    let stats = client.analytics().await.expect("analytics should succeed");

    mock.assert_async().await;
    assert_eq!(stats["totalUploads"], 12);
    assert_eq!(stats["averageJobFitScore"], 67.5);
}

#[tokio::test]
async fn analytics_failure_is_a_plain_http_error() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/analytics");
            then.status(503);
        })
        .await;

    let client = test_client(server.base_url());
    let err = client.analytics().await.expect_err("503 must fail");
    assert!(matches!(err, ClientError::Http(_)));
}
