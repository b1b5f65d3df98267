/// Turns a job descriptor plus its dependencies into an `sbatch` invocation.
mod submission_builder;
pub use submission_builder::{SubmissionBuilder, SubmissionRequest};
