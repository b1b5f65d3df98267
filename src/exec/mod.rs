/// Submits a job and reports its id
mod submitter;
pub use submitter::{parse_job_id, SubmissionResult, Submitter};

/// Run a subprocess, capturing its combined output
mod run_cmd;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Submission failed: '{program}' {reason}")]
    SubmissionFailed { program: String, reason: String },
    #[error("Unable to find a job id in scheduler output: {0:?}")]
    UnparsableResponse(String),
}
