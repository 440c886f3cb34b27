//! Model Properties
//!
//! Random operation sequences run against a real queue and a plain
//! in-memory model. After every step the queue must agree with the model:
//! - Dispatch always returns the oldest pending job
//! - Acknowledged jobs are never dispatched again
//! - A restart requeues exactly the unacknowledged dispatches, in
//!   submission position, and loses or duplicates nothing

use crate::test_utils::*;
use proptest::prelude::*;
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Dispatch,
    /// Acknowledge the n-th currently dispatched job (modulo count)
    Ack(usize),
    Restart,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[a-z]{0,8}".prop_map(Op::Submit),
        3 => Just(Op::Dispatch),
        2 => any::<usize>().prop_map(Op::Ack),
        1 => Just(Op::Restart),
    ]
}

/// Reference model: jobs in creation order
#[derive(Default)]
struct Model {
    jobs: Vec<Job>,
}

impl Model {
    fn submit(&mut self, id: JobId, payload: String) {
        self.jobs.push(Job::new(id, payload));
    }

    fn dispatch(&mut self) -> Option<Job> {
        let job = self.jobs.iter_mut().find(|job| job.is_pending())?;
        job.mark_dispatched();
        Some(job.clone())
    }

    fn dispatched(&self) -> Vec<JobId> {
        self.jobs
            .iter()
            .filter(|job| job.state == JobState::Dispatched)
            .map(|job| job.id.clone())
            .collect()
    }

    fn acknowledge(&mut self, id: &JobId) {
        if let Some(job) = self.jobs.iter_mut().find(|job| &job.id == id) {
            job.mark_acknowledged();
        }
    }

    fn restart(&mut self) {
        self.jobs = after_restart(&self.jobs);
    }
}

fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("queue.log");
    let mut engine = open_queue(&path);
    let mut model = Model::default();

    for op in ops {
        match op {
            Op::Submit(payload) => {
                let id = engine.submit(payload.clone()).unwrap();
                model.submit(id, payload);
            }
            Op::Dispatch => match (engine.dispatch(), model.dispatch()) {
                (Ok(got), Some(expected)) => prop_assert_eq!(got, expected),
                (Err(QueueError::QueueEmpty), None) => {}
                (got, expected) => {
                    return Err(TestCaseError::fail(format!(
                        "dispatch mismatch: engine {:?}, model {:?}",
                        got, expected
                    )))
                }
            },
            Op::Ack(n) => {
                let dispatched = model.dispatched();
                if dispatched.is_empty() {
                    continue;
                }
                let id = &dispatched[n % dispatched.len()];
                engine.acknowledge(id).unwrap();
                model.acknowledge(id);
            }
            Op::Restart => {
                drop(engine);
                engine = open_queue(&path);
                model.restart();
            }
        }

        prop_assert_eq!(engine.jobs(), model.jobs.clone());
        prop_assert_eq!(engine.pending_ids(), pending_in_creation_order(&model.jobs));
        prop_assert!(engine.check_invariants().is_ok());
    }

    // Final restart must reproduce the model exactly
    drop(engine);
    let engine = open_queue(&path);
    model.restart();
    prop_assert_eq!(engine.jobs(), model.jobs);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_queue_matches_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_fifo_without_restarts(payloads in prop::collection::vec("[a-z]{1,6}", 1..20)) {
        let temp_dir = TempDir::new().unwrap();
        let engine = open_queue(&temp_dir.path().join("queue.log"));

        let ids: Vec<JobId> = payloads
            .iter()
            .map(|p| engine.submit(p.as_str()).unwrap())
            .collect();

        for (id, payload) in ids.iter().zip(&payloads) {
            let job = engine.dispatch().unwrap();
            prop_assert_eq!(&job.id, id);
            prop_assert_eq!(&job.payload, payload);
            prop_assert_eq!(job.attempts, 1);
        }
        prop_assert!(matches!(engine.dispatch(), Err(QueueError::QueueEmpty)));
    }

    #[test]
    fn prop_recovery_is_idempotent(
        submits in 1usize..12,
        dispatches in 0usize..12,
        acks in 0usize..12,
    ) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queue.log");
        {
            let engine = open_queue(&path);
            for i in 0..submits {
                engine.submit(format!("job-{}", i)).unwrap();
            }
            let mut claimed = Vec::new();
            for _ in 0..dispatches.min(submits) {
                claimed.push(engine.dispatch().unwrap().id);
            }
            for id in claimed.iter().take(acks) {
                engine.acknowledge(id).unwrap();
            }
        }

        let first = open_queue(&path);
        let (jobs, pending) = (first.jobs(), first.pending_ids());
        drop(first);

        let second = open_queue(&path);
        prop_assert_eq!(second.jobs(), jobs);
        prop_assert_eq!(second.pending_ids(), pending);
        assert_consistent(&second);
    }
}
