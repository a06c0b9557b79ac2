//! Type definitions for the jobs API.

mod jobs;

pub use jobs::{
    Job, JobAttributes, JobData, JobEnvelope, JobLinks, JobStatus, JobSubmission, ResultDecoding,
};
