use anyhow::{Context, Result};

use jobscript::JobDescriptor;
use util::{Clock, Timer};

use crate::deps::DependencySet;
use crate::exec::{SubmissionResult, Submitter};
use crate::gate::{self, Accounting, DependencyGate, Sacct, Squeue};
use crate::prep::SubmissionBuilder;
use crate::settings::Settings;
use crate::ui::Ui;

/// Number of times the accounting lookup is tried before giving up.
const ACCOUNTING_ATTEMPTS: usize = 3;

/// This struct actually runs the command-line app:
/// read the job script, build the submission, hold it back if it's the
/// terminal job, then submit and report the job id.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App` reporting to stdout/stderr.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self { settings, ui }
    }

    /// Create a new `App` with a custom `Ui`.
    pub fn with_ui(settings: Settings, ui: Ui) -> Self {
        Self { settings, ui }
    }

    /// Run the app. Returns `None` on a dry run.
    pub fn run(mut self) -> Result<Option<SubmissionResult>> {
        self.ui.verbose_progress("Reading job script")?;
        let job = match JobDescriptor::read(&self.settings.jobscript) {
            Ok(job) => job,
            Err(e) => {
                self.ui.failed()?;
                return Err(e).with_context(|| {
                    format!("while reading job script {:?}", self.settings.jobscript)
                });
            }
        };
        self.ui.done()?;
        log::debug!("{job:?}");
        if !self.settings.dependencies.is_empty() {
            self.ui
                .verbose_msg(&format!("Depends on jobs {}", self.settings.dependencies.joined()))?;
        }

        let held = self.settings.is_terminal(&job.name) && !self.settings.dependencies.is_empty();

        // a held job is only submitted once its dependencies are gone,
        // so it gets no dependency clause of its own:
        let no_deps = DependencySet::default();
        let clause_deps = if held {
            &no_deps
        } else {
            &self.settings.dependencies
        };
        let request = SubmissionBuilder::new(&self.settings.sbatch, &self.settings.sbatch_args)
            .build(&job, clause_deps)
            .context("while building submission command")?;

        if self.settings.dry_run {
            self.ui.submission_summary(&job, &request)?;
            self.ui.dry_run()?;
            return Ok(None);
        }

        if held {
            self.hold_terminal_job(&job.name)?;
        }

        let result = Submitter::new(&mut self.ui)
            .submit(&job, &request)
            .context("while submitting job")?;

        Ok(Some(result))
    }

    fn hold_terminal_job(&mut self, name: &str) -> Result<()> {
        let deps = &self.settings.dependencies;
        log::info!("{name} is the terminal job; waiting for {} to leave the queue", deps.joined());

        self.ui.start_timer();
        let queue = Squeue::new(&self.settings.squeue, self.settings.queue_user.as_deref());
        DependencyGate::new(deps, queue, Timer::now(), self.settings.gate)
            .wait(name, &mut self.ui)
            .context("while holding terminal job")?;
        self.ui.print_elapsed("Waiting for dependencies")?;

        if self.settings.check_completion {
            let mut sacct = Sacct::new(&self.settings.sacct);
            let records = lookup_states(&mut sacct, deps, &mut Timer::now(), &self.settings)?;
            gate::check_completed(&records, deps).context("while checking dependency results")?;
        }

        Ok(())
    }
}

// accounting can lag behind the queue, so failed lookups are retried a few times.
fn lookup_states<A: Accounting, C: Clock>(
    acct: &mut A,
    deps: &DependencySet,
    clock: &mut C,
    settings: &Settings,
) -> Result<String> {
    let mut attempt = 1;
    loop {
        match acct.job_states(deps) {
            Ok(records) => return Ok(records),
            Err(e) if attempt < ACCOUNTING_ATTEMPTS => {
                log::warn!("{e}; retrying ({attempt}/{ACCOUNTING_ATTEMPTS})");
                clock.sleep(settings.gate.poll_interval);
                attempt += 1;
            }
            Err(e) => return Err(e).context("while looking up dependency results"),
        }
    }
}
