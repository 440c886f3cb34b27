//! Session wrapper around the queue engine.
//!
//! Holds the engine for the lifetime of the process and turns each
//! `CliAction` into engine calls.

use serde::Serialize;
use stratq_core::{Job, JobId, JobState, QueueResult};
use stratq_engine::{QueueEngine, QueueStats, RecoveryReport};

use crate::parse::CliAction;

/// Payloads submitted by `demo`.
pub const DEMO_PAYLOADS: [&str; 3] = ["task-1", "task-2", "task-3"];

/// Result of one executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Output {
    Submitted { ids: Vec<JobId> },
    Dispatched { job: Job },
    Acknowledged { id: JobId },
    Status { stats: QueueStats },
    Jobs { jobs: Vec<Job> },
    Worked { processed: Vec<Job> },
    Demo { submitted: Vec<JobId>, processed: Vec<Job> },
}

/// Wraps the engine handle.
pub struct SessionState {
    engine: QueueEngine,
}

impl SessionState {
    pub fn new(engine: QueueEngine) -> Self {
        Self { engine }
    }

    /// Execute one action against the engine.
    pub fn execute(&mut self, action: CliAction) -> QueueResult<Output> {
        match action {
            CliAction::Submit(payloads) => Ok(Output::Submitted {
                ids: self.submit_all(payloads)?,
            }),
            CliAction::Dispatch => Ok(Output::Dispatched {
                job: self.engine.dispatch()?,
            }),
            CliAction::Ack(id) => {
                self.engine.acknowledge(&id)?;
                Ok(Output::Acknowledged { id: JobId::from(id) })
            }
            CliAction::Status => Ok(Output::Status {
                stats: self.engine.stats(),
            }),
            CliAction::List => Ok(Output::Jobs {
                jobs: self.engine.jobs(),
            }),
            CliAction::Work => Ok(Output::Worked {
                processed: self.work()?,
            }),
            CliAction::Demo => {
                let submitted = self.submit_all(DEMO_PAYLOADS.iter().map(|p| p.to_string()))?;
                let processed = self.work()?;
                Ok(Output::Demo {
                    submitted,
                    processed,
                })
            }
        }
    }

    /// What recovery found when the engine was opened.
    pub fn recovery_report(&self) -> &RecoveryReport {
        self.engine.recovery_report()
    }

    /// Close the engine, flushing the log.
    pub fn close(self) -> QueueResult<()> {
        self.engine.close()
    }

    fn submit_all<I>(&self, payloads: I) -> QueueResult<Vec<JobId>>
    where
        I: IntoIterator<Item = String>,
    {
        payloads
            .into_iter()
            .map(|payload| self.engine.submit(payload))
            .collect()
    }

    /// Dispatch and acknowledge until the queue is empty.
    ///
    /// Returned jobs carry the attempt count of this delivery.
    fn work(&self) -> QueueResult<Vec<Job>> {
        let mut processed = Vec::new();
        loop {
            let mut job = match self.engine.dispatch() {
                Ok(job) => job,
                Err(e) if e.is_retryable() => break,
                Err(e) => return Err(e),
            };
            self.engine.acknowledge(&job.id)?;
            job.state = JobState::Acknowledged;
            processed.push(job);
        }
        Ok(processed)
    }
}
