use std::path::PathBuf;
use std::time::Duration;

use crate::args::Args;
use crate::deps::DependencySet;
use crate::gate::GatePolicy;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no job script given (expected: [DEPENDENCY...] JOBSCRIPT)")]
    NoJobScript,
    #[error("invalid terminal rule name '{0}'")]
    InvalidTerminalRule(String),
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. the job script is split off from its dependencies.
#[derive(Debug)]
pub struct Settings {
    pub jobscript: PathBuf,
    pub dependencies: DependencySet,

    pub sbatch: String,
    pub squeue: String,
    pub sacct: String,
    pub sbatch_args: Vec<String>,

    pub terminal_rule: String,
    pub gate: GatePolicy,
    pub queue_user: Option<String>,
    pub check_completion: bool,

    pub dry_run: bool,
    pub verbose: u8,
}

impl Settings {
    /// Whether a job with this name aggregates the whole workflow,
    /// and so has to be held back until its dependencies are gone.
    pub fn is_terminal(&self, job_name: &str) -> bool {
        job_name == self.terminal_rule
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(mut args: Args) -> Result<Self, Self::Error> {
        // the workflow engine always appends the job script last:
        let jobscript = args.jobs.pop().ok_or(Error::NoJobScript)?;
        let dependencies: DependencySet = args.jobs.iter().collect();

        let terminal_rule = args.terminal_rule.trim().to_owned();
        if terminal_rule.is_empty() {
            return Err(Error::InvalidTerminalRule(args.terminal_rule).into());
        }

        let gate = GatePolicy {
            poll_interval: Duration::from_secs(args.poll_interval),
            max_wait: args.max_wait.map(Duration::from_secs),
        };

        Ok(Self {
            jobscript: PathBuf::from(jobscript),
            dependencies,

            sbatch: args.sbatch,
            squeue: args.squeue,
            sacct: args.sacct,
            sbatch_args: args.sbatch_args,

            terminal_rule,
            gate,
            queue_user: args.queue_user,
            check_completion: args.check_completion,

            dry_run: args.dry_run,
            verbose: args.verbose,
        })
    }
}
