use std::time::Duration;

use anyhow::Result;

use util::Clock;

use crate::deps::DependencySet;
use crate::ui::Ui;

/// Listing the scheduler's active queue
mod queue;
pub use queue::{JobQueue, QueueSnapshot, Squeue};

/// Asking the scheduler how finished jobs ended
mod accounting;
pub use accounting::{check_completed, Accounting, Sacct};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to query scheduler: {0}")]
    DependencyQueryFailed(String),
    #[error("Gave up after {elapsed:?} waiting for dependencies to leave the queue: {pending}")]
    DependencyTimeout { elapsed: Duration, pending: String },
    #[error("Dependencies did not complete successfully: {0}")]
    DependencyFailed(String),
}

/// How long to wait between queue polls, and for how long in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub max_wait: Option<Duration>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_wait: None,
        }
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// These dependencies are still in the queue (or we couldn't tell).
    Waiting { pending: DependencySet },
    /// No dependency is left in the queue.
    Ready,
}

/// Holds back a terminal job until none of its dependencies are in the active queue.
///
/// A dependency that is absent from the queue counts as finished, whether it
/// completed long before the first poll or never showed up at all. Failing to
/// query the queue counts as "everything still pending", so a single bad query
/// can never release the job early. The wait is a plain sleep loop on the
/// given `Clock`; the optional bound is checked between polls.
pub struct DependencyGate<'a, Q, C> {
    deps: &'a DependencySet,
    queue: Q,
    clock: C,
    policy: GatePolicy,
    polls: usize,
    state: GateState,
}

impl<'a, Q: JobQueue, C: Clock> DependencyGate<'a, Q, C> {
    pub fn new(deps: &'a DependencySet, queue: Q, clock: C, policy: GatePolicy) -> Self {
        Self {
            deps,
            queue,
            clock,
            policy,
            polls: 0,
            state: GateState::Waiting {
                pending: deps.clone(),
            },
        }
    }

    /// Number of queue polls performed so far.
    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Query the queue once and report whether we may proceed.
    /// Once `Ready`, the gate stays open and the queue is not queried again.
    pub fn poll(&mut self) -> GateState {
        if self.state == GateState::Ready {
            return GateState::Ready;
        }
        self.polls += 1;
        let pending: DependencySet = match self.queue.active_jobs() {
            Ok(snapshot) => {
                log::trace!("poll {}: {} jobs in queue", self.polls, snapshot.len());
                self.deps.iter().filter(|id| snapshot.contains(id)).collect()
            }
            Err(e) => {
                log::warn!("{e}; assuming all dependencies are still queued");
                self.deps.clone()
            }
        };

        self.state = if pending.is_empty() {
            GateState::Ready
        } else {
            GateState::Waiting { pending }
        };
        self.state.clone()
    }

    /// Poll until `Ready`, sleeping between polls. Fails once `max_wait` has elapsed.
    pub fn wait(&mut self, job: &str, ui: &mut Ui) -> Result<()> {
        let mut last_pending: Option<DependencySet> = None;
        loop {
            let pending = match self.poll() {
                GateState::Ready => {
                    log::info!("dependencies of {job} left the queue after {} polls", self.polls);
                    return Ok(());
                }
                GateState::Waiting { pending } => pending,
            };

            let elapsed = self.clock.elapsed();
            let mut sleep_for = self.policy.poll_interval;
            if let Some(max_wait) = self.policy.max_wait {
                if elapsed >= max_wait {
                    return Err(Error::DependencyTimeout {
                        elapsed,
                        pending: pending.joined(),
                    }
                    .into());
                }
                sleep_for = sleep_for.min(max_wait - elapsed);
            }

            if last_pending.as_ref() != Some(&pending) {
                ui.waiting_for(job, &pending)?;
                last_pending = Some(pending);
            }
            log::debug!("sleeping {sleep_for:?} before next queue poll");
            self.clock.sleep(sleep_for);
        }
    }
}
