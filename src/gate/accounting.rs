use std::process::Command;

use util::HashMap;

use crate::deps::{DependencySet, JobId};

use super::Error;

/// State `sacct` reports for a job that finished successfully.
const COMPLETED: &str = "COMPLETED";

/// Anything that can report the final states of finished jobs.
pub trait Accounting {
    /// Raw `JobID|State` records for the given jobs.
    fn job_states(&mut self, ids: &DependencySet) -> Result<String, Error>;
}

/// Looks up job states with `sacct`.
#[derive(Debug)]
pub struct Sacct {
    program: String,
}

impl Sacct {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_owned(),
        }
    }

    fn command(&self, ids: &DependencySet) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--noheader", "--parsable2", "--format=JobID,State", "--jobs"])
            .arg(ids.joined());
        cmd
    }
}

impl Accounting for Sacct {
    fn job_states(&mut self, ids: &DependencySet) -> Result<String, Error> {
        let output = self.command(ids).output().map_err(|e| {
            Error::DependencyQueryFailed(format!("could not run '{}': {e}", self.program))
        })?;
        if !output.status.success() {
            return Err(Error::DependencyQueryFailed(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Check that every dependency (including all of its array tasks) ended `COMPLETED`.
///
/// Job steps (`123.batch`, `123.0`) are ignored; only allocations count.
/// A dependency with no accounting record at all is reported as failed,
/// since we can't tell how it ended.
pub fn check_completed(records: &str, deps: &DependencySet) -> Result<(), Error> {
    let mut states: HashMap<&str, Vec<&str>> = HashMap::default();
    for (job, state) in records.lines().filter_map(|line| line.trim().split_once('|')) {
        if job.contains('.') {
            continue;
        }
        let base = job.split(['_', '+']).next().unwrap_or(job);
        // "CANCELLED by 1234" -> "CANCELLED"
        let state = state.split_whitespace().next().unwrap_or(state);
        states.entry(base).or_default().push(state);
    }

    let failed: Vec<String> = deps
        .iter()
        .filter_map(|id| describe_failure(id, states.get(id.as_str())))
        .collect();

    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::DependencyFailed(failed.join(", ")))
    }
}

fn describe_failure(id: &JobId, states: Option<&Vec<&str>>) -> Option<String> {
    match states {
        None => Some(format!("{id} (no accounting record)")),
        Some(states) => states
            .iter()
            .find(|&&state| state != COMPLETED)
            .map(|state| format!("{id} ({state})")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn deps(ids: &[&str]) -> DependencySet {
        ids.iter().collect()
    }

    #[test]
    fn test_all_completed() {
        let records = "101|COMPLETED\n101.batch|COMPLETED\n102_1|COMPLETED\n102_2|COMPLETED\n";
        assert!(check_completed(records, &deps(&["101", "102"])).is_ok());
    }

    #[test]
    fn test_failed_dependencies() {
        let records = "101|FAILED\n101.batch|FAILED\n102_1|COMPLETED\n102_2|CANCELLED by 500\n";
        match check_completed(records, &deps(&["101", "102", "103"])) {
            Err(Error::DependencyFailed(msg)) => {
                assert_eq!(
                    "101 (FAILED), 102 (CANCELLED), 103 (no accounting record)",
                    msg
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_sacct_command() {
        let cmd = Sacct::new("sacct").command(&deps(&["2", "1"]));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(
            args,
            ["--noheader", "--parsable2", "--format=JobID,State", "--jobs", "1,2"]
        );
    }
}
