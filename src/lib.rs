/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Scheduler job ids and dependency sets
mod deps;
/// Submitting jobs to the scheduler
mod exec;
/// Holding back the terminal job until its dependencies are done
mod gate;
/// Building the submission command
mod prep;
/// Interpreted command-line settings
mod settings;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::Args;
pub use deps::{DependencySet, JobId};
pub use jobscript::{JobDescriptor, MalformedDescriptor, MemoryMb};
pub use exec::{parse_job_id, Error as SubmitError, SubmissionResult, Submitter};
pub use gate::{
    check_completed, Accounting, DependencyGate, Error as GateError, GatePolicy, GateState,
    JobQueue, QueueSnapshot, Sacct, Squeue,
};
pub use prep::{SubmissionBuilder, SubmissionRequest};
pub use settings::Settings;
pub use ui::Ui;

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;
    simple_logging::log_to_stderr(settings.log_level());

    // RUN THE THING /////////////////
    let app = App::new(settings);
    app.run()?;

    Ok(())
}
