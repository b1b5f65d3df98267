use std::io::{self, Write};

use colored::Colorize;

use jobscript::JobDescriptor;
use util::{Clock, Timer};

use crate::deps::DependencySet;
use crate::prep::SubmissionRequest;
use crate::settings::Settings;

/// All user-facing output goes through this struct.
///
/// `out` carries nothing but the job id, since the workflow engine parses it verbatim.
/// Everything else goes to `err`.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// machine-readable output (stdout)
    out: Box<dyn Write>,
    /// human-readable output (stderr)
    err: Box<dyn Write>,
    /// keeps track of time spent in long operations
    timer: Timer,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self::with_writers(
            settings.verbose > 0,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    /// Create a `Ui` that writes somewhere other than stdout/stderr.
    pub fn with_writers(verbose: bool, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            verbose,
            out,
            err,
            timer: Timer::now(),
        }
    }

    /// Report the submitted job's id. This must be the only thing ever written to `out`.
    pub fn job_id(&mut self, id: u64) -> io::Result<()> {
        writeln!(self.out, "{id}")?;
        self.out.flush()
    }

    /// Describe the job we're about to submit.
    pub fn submission_summary(
        &mut self,
        job: &JobDescriptor,
        request: &SubmissionRequest,
    ) -> io::Result<()> {
        writeln!(self.err, "{}", "Submit job with parameters:".magenta())?;
        writeln!(self.err, "  name: {}", job.name)?;
        writeln!(self.err, "  threads: {}", job.threads)?;
        writeln!(self.err, "  mem(mb): {}", job.memory)?;
        writeln!(self.err, "  {} command: {request}", request.program())
    }

    pub fn submitted(&mut self, id: u64) -> io::Result<()> {
        writeln!(self.err, "{} job {id}.", "Submitted".green())
    }

    pub fn dry_run(&mut self) -> io::Result<()> {
        writeln!(self.err, "{}", "Dry run; not submitting.".yellow())
    }

    /// Tell the user which dependencies a terminal job is still waiting on.
    pub fn waiting_for(&mut self, job: &str, pending: &DependencySet) -> io::Result<()> {
        writeln!(
            self.err,
            "{} {job} until {} leave the queue: {}",
            "Holding".yellow(),
            pluralize(pending.len(), "dependency", "dependencies"),
            pending.joined(),
        )
    }

    pub fn start_timer(&mut self) {
        if self.verbose {
            self.timer.reset();
        }
    }

    pub fn print_elapsed(&mut self, task: &str) -> io::Result<()> {
        if self.verbose {
            writeln!(self.err, "{} took {:?}", task, self.timer.elapsed())?;
        }
        Ok(())
    }

    pub fn verbose_msg(&mut self, msg: &str) -> io::Result<()> {
        if self.verbose {
            writeln!(self.err, "{}", msg)?;
        }
        Ok(())
    }

    pub fn verbose_progress(&mut self, msg: &str) -> io::Result<()> {
        if self.verbose {
            write!(self.err, "{}... ", msg.magenta())?;
            self.err.flush()?;
        }
        Ok(())
    }

    pub fn done(&mut self) -> io::Result<()> {
        if self.verbose {
            writeln!(self.err, "{}.", "done".green())?;
        }
        Ok(())
    }

    /// Ends a `verbose_progress` line whose step didn't finish.
    pub fn failed(&mut self) -> io::Result<()> {
        if self.verbose {
            writeln!(self.err, "{}.", "failed".red())?;
        }
        Ok(())
    }
}

fn pluralize<'a>(n: usize, one: &'a str, many: &'a str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}
