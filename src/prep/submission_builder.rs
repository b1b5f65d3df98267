use std::fmt;
use std::process::Command;

use jobscript::JobDescriptor;
use util::PathEncodingError;

use crate::deps::DependencySet;

/// Qualifier for "start only after this job completed successfully".
const AFTER_OK: &str = "afterok:";

/// A fully-built scheduler invocation: program plus ordered argument vector.
///
/// Never passed through a shell; `Display` is for humans only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    program: String,
    args: Vec<String>,
}

impl SubmissionRequest {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Create a `Command` that will run this request.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for SubmissionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Builds `SubmissionRequest`s. Building is pure: equal inputs give equal requests.
///
/// Argument order is fixed:
/// job name, tasks per node, memory, dependency clause (if any), extra args, script.
#[derive(Debug)]
pub struct SubmissionBuilder<'a> {
    /// scheduler submission binary
    program: &'a str,
    /// passed through verbatim, just before the script path
    extra_args: &'a [String],
}

impl<'a> SubmissionBuilder<'a> {
    pub fn new(program: &'a str, extra_args: &'a [String]) -> Self {
        Self {
            program,
            extra_args,
        }
    }
}

impl SubmissionBuilder<'_> {
    pub fn build(
        &self,
        job: &JobDescriptor,
        dependencies: &DependencySet,
    ) -> Result<SubmissionRequest, PathEncodingError> {
        let script = job.script.to_str().ok_or(PathEncodingError)?;

        let mut args = Vec::with_capacity(9 + self.extra_args.len());
        args.push("--job-name".to_owned());
        args.push(job.name.clone());
        args.push("--tasks-per-node".to_owned());
        args.push(job.threads.to_string());
        args.push("--mem".to_owned());
        args.push(job.memory.to_string());

        if let Some(clause) = dependency_clause(dependencies) {
            args.push("--dependency".to_owned());
            args.push(clause);
        }

        args.extend(self.extra_args.iter().cloned());
        args.push(script.to_owned());

        Ok(SubmissionRequest {
            program: self.program.to_owned(),
            args,
        })
    }
}

/// `afterok:1,afterok:2,...`, or nothing if there are no dependencies.
fn dependency_clause(dependencies: &DependencySet) -> Option<String> {
    if dependencies.is_empty() {
        return None;
    }
    let clauses: Vec<String> = dependencies
        .iter()
        .map(|id| format!("{AFTER_OK}{id}"))
        .collect();
    Some(clauses.join(","))
}
