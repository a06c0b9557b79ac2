//! Integration tests for the rate-limit retry executor and the job polling
//! loop, driven through a scripted transport.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use asyncjobs_client::errors::JobsError;
use asyncjobs_client::mocks::{MockResponse, MockTransport};
use asyncjobs_client::transport::HttpMethod;
use asyncjobs_client::{JobsClient, JobStatus, ResultDecoding};

const STATUS_URL: &str = "https://jobs.example.com/api/v2/jobs/job-1/status";

fn client(transport: Arc<MockTransport>) -> JobsClient {
    JobsClient::builder()
        .api_key("test_key")
        .base_url("https://jobs.example.com/api/v2")
        .transport(transport)
        .build()
        .unwrap()
}

fn client_with(
    transport: Arc<MockTransport>,
    configure: impl FnOnce(asyncjobs_client::JobsClientBuilder) -> asyncjobs_client::JobsClientBuilder,
) -> JobsClient {
    configure(
        JobsClient::builder()
            .api_key("test_key")
            .base_url("https://jobs.example.com/api/v2")
            .transport(transport),
    )
    .build()
    .unwrap()
}

fn job_body(status: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": "job-1",
            "attributes": {
                "type": "export",
                "status": status,
                "result": null,
            }
        }
    })
}

fn job_body_with_result(status: &str, result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": "job-1",
            "attributes": {
                "type": "export",
                "status": status,
                "result": result,
            }
        }
    })
}

#[tokio::test]
async fn test_rate_limit_counters_reflect_latest_response() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("success")).with_rate_limit(120, 57));
    let client = client(Arc::clone(&transport));

    // Act
    let response = client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status, 200);
    assert_eq!(client.rate_limit_limit().await, Some(120));
    assert_eq!(client.rate_limit_remaining().await, Some(57));
}

#[tokio::test]
async fn test_missing_headers_leave_counters_unchanged() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("success")).with_rate_limit(120, 57));
    transport.queue(MockResponse::json(&job_body("success")));
    let client = client(Arc::clone(&transport));

    // Act
    client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap();
    client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap();

    // Assert: second response carried no headers, prior values stand
    assert_eq!(client.rate_limit_limit().await, Some(120));
    assert_eq!(client.rate_limit_remaining().await, Some(57));
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_after_three_429s() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    for _ in 0..3 {
        transport.queue(MockResponse::status(429).with_retry_after(1));
    }
    let client = client_with(Arc::clone(&transport), |b| b.max_rate_limit_retries(3));

    // Act
    let error = client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        error,
        JobsError::RateLimitExceeded {
            status_code: 429,
            attempts: 3
        }
    ));
    assert!(error.to_string().contains("3 attempts"));
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_single_attempt_budget_fails_on_first_429() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::status(429));
    let client = client_with(Arc::clone(&transport), |b| b.max_rate_limit_retries(1));

    // Act
    let error = client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap_err();

    // Assert
    assert!(error.to_string().contains("1 attempts"));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_429_then_200_returns_success_and_latest_counters() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(
        MockResponse::status(429)
            .with_retry_after(2)
            .with_rate_limit(60, 0),
    );
    transport.queue(MockResponse::json(&job_body("success")).with_rate_limit(60, 30));
    let client = client(Arc::clone(&transport));

    // Act
    let response = client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap();

    // Assert: the 200 wins, and its headers are the stored state
    assert_eq!(response.status, 200);
    assert_eq!(client.rate_limit_remaining().await, Some(30));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_non_429_error_is_not_retried() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::error(403, "forbidden"));
    let client = client(Arc::clone(&transport));

    // Act
    let error = client
        .jobs()
        .request(HttpMethod::Get, "jobs/job-1", None)
        .await
        .unwrap_err();

    // Assert
    match error {
        JobsError::Api {
            status_code,
            message,
            ..
        } => {
            assert_eq!(status_code, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_zero_wait_budget_times_out_on_first_pending() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("pending")));
    transport.queue(MockResponse::json(&job_body("success")));
    let client = client_with(Arc::clone(&transport), |b| b.polling_wait_secs(0));

    // Act
    let error = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap_err();

    // Assert: timeout fires before the queued success is ever observed
    assert!(matches!(
        error,
        JobsError::PollingTimeout {
            rate_limited: false,
            ..
        }
    ));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_polling_429_then_success_returns_job() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(
        MockResponse::status(429)
            .with_retry_after(1)
            .with_rate_limit(60, 4),
    );
    transport.queue(MockResponse::json(&job_body("success")).with_rate_limit(60, 40));
    let client = client(Arc::clone(&transport));

    // Act
    let job = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap();

    // Assert: job comes from the 200, counters from the latest response
    assert_eq!(job.id, "job-1");
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(client.rate_limit_remaining().await, Some(40));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_polling_walks_pending_to_terminal() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("new")));
    transport.queue(MockResponse::json(&job_body("pending")));
    transport.queue(MockResponse::json(&job_body_with_result(
        "success",
        serde_json::json!({"rows": 3}),
    )));
    let client = client_with(Arc::clone(&transport), |b| b.polling_interval_secs(2));

    // Act
    let job = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap();

    // Assert
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(job.result, Some(serde_json::json!({"rows": 3})));
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_polling_timeout_while_rate_limited() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::status(429).with_retry_after(10));
    let client = client_with(Arc::clone(&transport), |b| b.polling_wait_secs(5));

    // Act
    let error = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        error,
        JobsError::PollingTimeout {
            rate_limited: true,
            ..
        }
    ));
    assert!(error.to_string().contains("while rate limited"));
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_drives_poll_interval() {
    // Arrange: server asks for a 1s revisit, well under the 30s default
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("pending")).with_retry_after(1));
    transport.queue(MockResponse::json(&job_body("success")));
    let client = client_with(Arc::clone(&transport), |b| b.polling_interval_secs(30));

    // Act
    let start = tokio::time::Instant::now();
    client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap();

    // Assert
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_fixed_interval_ignores_retry_after() {
    // Arrange: same server hint, but the fixed-interval flag wins
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("pending")).with_retry_after(1));
    transport.queue(MockResponse::json(&job_body("success")));
    let client = client_with(Arc::clone(&transport), |b| {
        b.polling_interval_secs(5).use_fixed_interval(true)
    });

    // Act
    let start = tokio::time::Instant::now();
    client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap();

    // Assert
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_interval_scales_when_window_runs_low() {
    // Arrange: remaining 3 at the default threshold of 3 doubles the interval
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("pending")).with_rate_limit(60, 3));
    transport.queue(MockResponse::json(&job_body("success")));
    let client = client_with(Arc::clone(&transport), |b| b.polling_interval_secs(4));

    // Act
    let start = tokio::time::Instant::now();
    client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap();

    // Assert
    assert_eq!(start.elapsed(), Duration::from_secs(8));
}

#[tokio::test]
async fn test_unknown_status_is_a_protocol_error() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("cancelled")));
    let client = client(Arc::clone(&transport));

    // Act
    let error = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(error, JobsError::Protocol { .. }));
}

#[tokio::test]
async fn test_server_error_during_polling_propagates() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::error(500, "internal error"));
    let client = client(Arc::clone(&transport));

    // Act
    let error = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::Structured)
        .await
        .unwrap_err();

    // Assert
    assert_eq!(error.status_code(), Some(500));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_double_encoded_result_round_trips() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body_with_result(
        "success",
        serde_json::Value::String("{\"findings\":[\"a\",\"b\"]}".to_string()),
    )));
    let client = client(Arc::clone(&transport));

    // Act
    let job = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::DoubleEncoded)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        job.result,
        Some(serde_json::json!({"findings": ["a", "b"]}))
    );
}

#[tokio::test]
async fn test_double_encoded_mode_rejects_structured_result() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body_with_result(
        "success",
        serde_json::json!({"findings": []}),
    )));
    let client = client(Arc::clone(&transport));

    // Act
    let error = client
        .jobs()
        .fetch_result(STATUS_URL, ResultDecoding::DoubleEncoded)
        .await
        .unwrap_err();

    // Assert: no silent guessing across endpoint shapes
    assert!(matches!(error, JobsError::ResultDecode { .. }));
}

#[tokio::test]
async fn test_submit_reads_location_header() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(
        MockResponse::json(&job_body("new"))
            .with_status(201)
            .with_header("location", STATUS_URL),
    );
    let client = client(Arc::clone(&transport));

    // Act
    let submission = client
        .jobs()
        .submit("jobs", &serde_json::json!({"data": {"type": "export"}}))
        .await
        .unwrap();

    // Assert
    assert_eq!(submission.job_id, "job-1");
    assert_eq!(submission.status_url, STATUS_URL);
    let requests = transport.requests();
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert!(requests[0].headers.contains_key("Authorization"));
}

#[tokio::test]
async fn test_submit_falls_back_to_links_self() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&serde_json::json!({
        "data": {
            "id": "job-1",
            "attributes": {"type": "export", "status": "new", "result": null},
            "links": {"self": STATUS_URL},
        }
    })));
    let client = client(Arc::clone(&transport));

    // Act
    let submission = client
        .jobs()
        .submit("jobs", &serde_json::json!({"data": {"type": "export"}}))
        .await
        .unwrap();

    // Assert
    assert_eq!(submission.status_url, STATUS_URL);
}

#[tokio::test]
async fn test_status_returns_single_check() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::json(&job_body("pending")));
    let client = client(Arc::clone(&transport));

    // Act
    let status = client.jobs().status(STATUS_URL).await.unwrap();

    // Assert
    assert_eq!(status, JobStatus::Pending);
    assert_eq!(transport.request_count(), 1);
}
