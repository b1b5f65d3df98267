use anyhow::{Context, Result};

use jobscript::JobDescriptor;

use crate::prep::SubmissionRequest;
use crate::ui::Ui;

use super::{run_cmd::run_cmd, Error};

/// What the scheduler told us about a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionResult {
    pub job_id: u64,
}

/// `Submitter` hands a built request to the scheduler and reports the outcome.
///
/// Submission is attempted exactly once. Any failure, including output we can't
/// find a job id in, is returned to the caller rather than retried, since the
/// workflow engine can only track jobs whose id it receives intact.
pub struct Submitter<'a> {
    /// where the summary and the job id are reported
    ui: &'a mut Ui,
}

impl<'a> Submitter<'a> {
    pub fn new(ui: &'a mut Ui) -> Self {
        Self { ui }
    }

    pub fn submit(
        &mut self,
        job: &JobDescriptor,
        request: &SubmissionRequest,
    ) -> Result<SubmissionResult> {
        self.ui.submission_summary(job, request)?;

        let output = run_cmd(request.command()).map_err(|e| Error::SubmissionFailed {
            program: request.program().to_owned(),
            reason: format!("could not be run: {e}"),
        })?;

        if !output.status.success() {
            return Err(Error::SubmissionFailed {
                program: request.program().to_owned(),
                reason: format!("exited with {}:\n{}", output.status, output.text.trim_end()),
            }
            .into());
        }
        log::debug!("scheduler replied: {:?}", output.text);

        let job_id = parse_job_id(&output.text)?;
        self.ui.submitted(job_id)?;
        self.ui
            .job_id(job_id)
            .context("while reporting job id to workflow engine")?;

        Ok(SubmissionResult { job_id })
    }
}

/// The job id is the last whitespace-delimited token of the scheduler's output,
/// e.g. `Submitted batch job 4821`. `--parsable` output (`4821;cluster`) is accepted too.
pub fn parse_job_id(output: &str) -> Result<u64, Error> {
    output
        .split_whitespace()
        .last()
        .and_then(|token| token.split(';').next())
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|id| id.parse::<u64>().ok())
        .ok_or_else(|| Error::UnparsableResponse(output.to_owned()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_job_id() {
        assert_eq!(4821, parse_job_id("Submitted batch job 4821\n").unwrap());
        assert_eq!(
            77,
            parse_job_id("sbatch: warning: memory is low\nSubmitted batch job 77").unwrap()
        );
        assert_eq!(12, parse_job_id("12;cluster-a\n").unwrap());
        assert_eq!(12, parse_job_id("12").unwrap());
    }

    #[test]
    fn test_unparsable() {
        for output in [
            "error: invalid partition\n",
            "",
            "   \n",
            "Submitted batch job -4",
            "Submitted batch job +4821",
            "+12;cluster-a",
            "Submitted batch job 4821.0",
            ";cluster",
        ] {
            assert!(
                matches!(parse_job_id(output), Err(Error::UnparsableResponse(_))),
                "{output:?} should not parse"
            );
        }
    }
}
