//! Jobs API Client Library
//!
//! A production-ready Rust client for remote job-based HTTP APIs: callers
//! submit work, receive a status URL, and poll it until the job reaches a
//! terminal state. Every call is resilient to server-imposed rate limiting.
//!
//! # Features
//!
//! - **Rate-Limit Aware**: Tracks `X-RateLimit-Limit` / `X-RateLimit-Remaining`
//!   across calls and honors `Retry-After` on HTTP 429
//! - **Bounded Retries**: 429 responses are retried up to a configurable
//!   attempt budget; nothing else is ever retried
//! - **Adaptive Polling**: Poll intervals stretch deterministically as the
//!   rate limit window runs low, inside a wall-clock wait budget
//! - **Type Safety**: Closed job status set; explicit result decoding modes
//! - **Async/Await**: Built on Tokio; every wait is a cancellable suspension
//!   point
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use asyncjobs_client::{JobsClient, ResultDecoding};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JobsClient::builder()
//!         .api_key("your_api_key")
//!         .base_url("https://jobs.example.com/api/v2")
//!         .build()?;
//!
//!     let submission = client
//!         .jobs()
//!         .submit("jobs", &serde_json::json!({"data": {"type": "export"}}))
//!         .await?;
//!
//!     let job = client
//!         .jobs()
//!         .fetch_result(&submission.status_url, ResultDecoding::Structured)
//!         .await?;
//!
//!     println!("job {} finished: {}", job.id, job.status);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod mocks;
pub mod resilience;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{JobsClient, JobsClientBuilder};
pub use config::JobsConfig;
pub use errors::{JobsError, JobsResult};

// Type re-exports
pub use types::{Job, JobStatus, JobSubmission, ResultDecoding};
