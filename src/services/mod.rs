//! Service implementations for the jobs API.

mod jobs;

pub use jobs::JobsService;
