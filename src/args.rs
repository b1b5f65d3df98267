use clap::{ArgAction, Parser};

const CMD_NAME: &str = "sbatch-submit";
const DEFAULT_SBATCH: &str = "sbatch";
const DEFAULT_SQUEUE: &str = "squeue";
const DEFAULT_SACCT: &str = "sacct";
const DEFAULT_TERMINAL_RULE: &str = "all";
const DEFAULT_POLL_INTERVAL: &str = "10";

/// Stores our command-line args format.
///
/// Meant to be used as a workflow engine's cluster submission command, e.g.
/// `snakemake --immediate-submit --cluster 'sbatch-submit {dependencies}'`.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Scheduler ids of jobs to depend on, followed by the job script
    #[arg(value_name = "DEPENDENCY... JOBSCRIPT", required = true, num_args = 1..)]
    pub jobs: Vec<String>,

    /// Job submission command
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SBATCH)]
    #[arg(env = "SBATCH_SUBMIT_SBATCH")]
    pub sbatch: String,

    /// Queue listing command, used while holding a terminal job
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SQUEUE)]
    #[arg(env = "SBATCH_SUBMIT_SQUEUE")]
    pub squeue: String,

    /// Accounting command, used by --check-completion
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SACCT)]
    #[arg(env = "SBATCH_SUBMIT_SACCT")]
    pub sacct: String,

    /// Extra argument passed to the submission command (repeatable)
    #[arg(long = "sbatch-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub sbatch_args: Vec<String>,

    /// Name of the rule that aggregates the whole workflow
    #[arg(long, value_name = "RULE", default_value = DEFAULT_TERMINAL_RULE)]
    #[arg(env = "SBATCH_SUBMIT_TERMINAL_RULE")]
    pub terminal_rule: String,

    /// Seconds between queue polls while holding the terminal job
    #[arg(long, value_name = "SECS", default_value = DEFAULT_POLL_INTERVAL)]
    #[arg(env = "SBATCH_SUBMIT_POLL_INTERVAL")]
    pub poll_interval: u64,

    /// Give up holding the terminal job after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    #[arg(env = "SBATCH_SUBMIT_MAX_WAIT")]
    pub max_wait: Option<u64>,

    /// Only consider this user's jobs when polling the queue
    #[arg(long, value_name = "USER")]
    #[arg(env = "SBATCH_SUBMIT_QUEUE_USER")]
    pub queue_user: Option<String>,

    /// Fail the terminal job unless accounting shows all dependencies COMPLETED
    #[arg(long)]
    #[arg(env = "SBATCH_SUBMIT_CHECK_COMPLETION")]
    pub check_completion: bool,

    /// Dry run; print the submission command but don't submit.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_positional_jobs() -> Result<()> {
        let args = Args::try_parse_from(["sbatch-submit", "101", "102", "/tmp/job.sh"])?;
        assert_eq!(args.jobs, ["101", "102", "/tmp/job.sh"]);
        assert_eq!(DEFAULT_TERMINAL_RULE, args.terminal_rule);
        assert_eq!(10, args.poll_interval);
        assert_eq!(None, args.max_wait);
        assert_eq!(0, args.verbose);

        let args = Args::try_parse_from([
            "sbatch-submit",
            "-vv",
            "--max-wait",
            "3600",
            "--sbatch-arg",
            "--partition=long",
            "/tmp/job.sh",
        ])?;
        assert_eq!(args.jobs, ["/tmp/job.sh"]);
        assert_eq!(Some(3600), args.max_wait);
        assert_eq!(args.sbatch_args, ["--partition=long"]);
        assert_eq!(2, args.verbose);
        Ok(())
    }

    #[test]
    fn test_requires_jobscript() {
        assert!(Args::try_parse_from(["sbatch-submit"]).is_err());
    }
}
