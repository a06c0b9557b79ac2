//! Job types and the wire envelope returned by status endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{JobsError, JobsResult};

/// Job lifecycle status.
///
/// A closed set: the server sending anything else is a protocol error, not a
/// new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job accepted, not yet started.
    New,
    /// Job is running.
    Pending,
    /// Job finished unsuccessfully.
    Failed,
    /// Job finished successfully.
    Success,
}

impl JobStatus {
    /// Returns true for the statuses that end the polling loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Success)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::New => "new",
            JobStatus::Pending => "pending",
            JobStatus::Failed => "failed",
            JobStatus::Success => "success",
        };
        f.write_str(s)
    }
}

/// How the job `result` field is encoded by the endpoint being polled.
///
/// Some endpoint families return the result as structured JSON, others as a
/// JSON document encoded again into a string. The mode is an explicit
/// per-call choice; the client never guesses from the URL shape, and a
/// mismatch is a [`JobsError::ResultDecode`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultDecoding {
    /// The result field is structured JSON, used as-is.
    #[default]
    Structured,
    /// The result field is a JSON-encoded string that must be decoded again.
    DoubleEncoded,
}

/// A completed job.
///
/// Only constructed from a terminal status response; polling never surfaces
/// a job that is still `new` or `pending`.
#[derive(Debug, Clone)]
pub struct Job {
    /// Job identifier.
    pub id: String,
    /// Job type as reported by the API.
    pub job_type: String,
    /// Terminal status (`failed` or `success`).
    pub status: JobStatus,
    /// Decoded result payload, if the job produced one.
    pub result: Option<Value>,
}

impl Job {
    /// Builds a job from a wire envelope, decoding the result field under
    /// the requested mode.
    pub(crate) fn from_envelope(envelope: JobEnvelope, decoding: ResultDecoding) -> JobsResult<Self> {
        let JobData {
            id, attributes, ..
        } = envelope.data;

        let result = match (decoding, attributes.result) {
            (_, None) | (_, Some(Value::Null)) => None,
            (ResultDecoding::Structured, Some(value)) => Some(value),
            (ResultDecoding::DoubleEncoded, Some(Value::String(inner))) => {
                let decoded = serde_json::from_str(&inner).map_err(|e| JobsError::ResultDecode {
                    message: format!("inner result document does not parse: {e}"),
                })?;
                Some(decoded)
            }
            (ResultDecoding::DoubleEncoded, Some(other)) => {
                return Err(JobsError::ResultDecode {
                    message: format!(
                        "expected a JSON-encoded string result, got {}",
                        json_type_name(&other)
                    ),
                });
            }
        };

        Ok(Self {
            id,
            job_type: attributes.job_type,
            status: attributes.status,
            result,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Wire envelope returned by job status endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEnvelope {
    /// The job resource.
    pub data: JobData,
}

/// Job resource object.
#[derive(Debug, Clone, Deserialize)]
pub struct JobData {
    /// Job identifier.
    pub id: String,
    /// Job attributes.
    pub attributes: JobAttributes,
    /// Resource links.
    #[serde(default)]
    pub links: Option<JobLinks>,
}

/// Job attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct JobAttributes {
    /// Job type.
    #[serde(rename = "type")]
    pub job_type: String,
    /// Current status.
    pub status: JobStatus,
    /// Result payload; `null` or absent until the job completes.
    #[serde(default)]
    pub result: Option<Value>,
}

/// Resource links on a job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobLinks {
    /// URL of the job itself, used as the status URL.
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
}

/// A freshly submitted job and where to poll it.
#[derive(Debug, Clone)]
pub struct JobSubmission {
    /// Identifier of the submitted job.
    pub job_id: String,
    /// URL to poll for the job result.
    pub status_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(status: &str, result: Value) -> JobEnvelope {
        serde_json::from_value(serde_json::json!({
            "data": {
                "id": "job-1",
                "attributes": {
                    "type": "export",
                    "status": status,
                    "result": result,
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_status_closed_set() {
        assert!(serde_json::from_str::<JobStatus>("\"success\"").is_ok());
        assert!(serde_json::from_str::<JobStatus>("\"pending\"").is_ok());
        assert!(serde_json::from_str::<JobStatus>("\"cancelled\"").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::New.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn test_structured_result_used_as_is() {
        let job = Job::from_envelope(
            envelope("success", serde_json::json!({"rows": 3})),
            ResultDecoding::Structured,
        )
        .unwrap();

        assert_eq!(job.id, "job-1");
        assert_eq!(job.job_type, "export");
        assert_eq!(job.result, Some(serde_json::json!({"rows": 3})));
    }

    #[test]
    fn test_double_encoded_result_is_decoded() {
        let job = Job::from_envelope(
            envelope("success", Value::String("{\"rows\":3}".to_string())),
            ResultDecoding::DoubleEncoded,
        )
        .unwrap();

        assert_eq!(job.result, Some(serde_json::json!({"rows": 3})));
    }

    #[test]
    fn test_double_encoded_rejects_non_string() {
        let error = Job::from_envelope(
            envelope("success", serde_json::json!({"rows": 3})),
            ResultDecoding::DoubleEncoded,
        )
        .unwrap_err();

        assert!(matches!(error, JobsError::ResultDecode { .. }));
    }

    #[test]
    fn test_null_result_maps_to_none() {
        let job = Job::from_envelope(envelope("failed", Value::Null), ResultDecoding::Structured)
            .unwrap();
        assert_eq!(job.result, None);
        assert_eq!(job.status, JobStatus::Failed);
    }
}
