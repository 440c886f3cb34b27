//! In-memory job table and pending order
//!
//! The table holds every job ever seen (jobs are never removed) and the FIFO
//! sequence of ids awaiting dispatch.
//!
//! Invariant: every id in the pending order refers to a job in the table
//! whose state is `Pending`, and each pending job appears exactly once.
//!
//! The table does no locking or logging of its own. The engine mutates it
//! only while holding its exclusive lock and only after the log accepted the
//! corresponding record.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use stratq_core::{Job, JobId, JobState};

/// Job table plus pending order
#[derive(Debug, Clone, Default)]
pub struct JobTable {
    jobs: FxHashMap<JobId, Job>,
    /// Ids in creation order
    created: Vec<JobId>,
    pending: VecDeque<JobId>,
}

impl JobTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pending job at the back of the pending order
    ///
    /// Returns `false` and changes nothing if a job with this id exists.
    pub fn insert_pending(&mut self, id: JobId, payload: String) -> bool {
        if self.jobs.contains_key(&id) {
            return false;
        }
        self.jobs.insert(id.clone(), Job::new(id.clone(), payload));
        self.created.push(id.clone());
        self.pending.push_back(id);
        true
    }

    /// Remove and return the head of the pending order
    pub fn pop_pending(&mut self) -> Option<JobId> {
        self.pending.pop_front()
    }

    /// Put an id back at the head of the pending order
    pub fn push_front_pending(&mut self, id: JobId) {
        self.pending.push_front(id);
    }

    /// Look up a job
    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Look up a job for mutation
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    /// Requeue every dispatched job, then rebuild the pending order
    ///
    /// The rebuilt order keeps the existing pending order filtered to jobs
    /// whose state is `Pending`. Requeued jobs were already in that order
    /// (recovery never removes ids on Dispatch), so they keep their
    /// original submission position. Returns the ids that were requeued,
    /// in creation order.
    pub fn requeue_dispatched(&mut self) -> Vec<JobId> {
        let mut requeued = Vec::new();
        for id in &self.created {
            if let Some(job) = self.jobs.get_mut(id) {
                if job.state == JobState::Dispatched {
                    job.requeue();
                    requeued.push(id.clone());
                }
            }
        }

        let jobs = &self.jobs;
        self.pending
            .retain(|id| jobs.get(id).map(Job::is_pending).unwrap_or(false));

        requeued
    }

    /// Number of known jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job is known
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of ids awaiting dispatch
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending ids, head first
    pub fn pending_ids(&self) -> impl Iterator<Item = &JobId> {
        self.pending.iter()
    }

    /// All jobs in creation order
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.created.iter().filter_map(|id| self.jobs.get(id))
    }

    /// Count jobs in a given state
    pub fn count_in_state(&self, state: JobState) -> usize {
        self.jobs.values().filter(|job| job.state == state).count()
    }

    /// Check the pending-order invariant
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = rustc_hash::FxHashSet::default();
        for id in &self.pending {
            if !seen.insert(id) {
                return Err(format!("{} appears twice in pending order", id));
            }
            match self.jobs.get(id) {
                None => return Err(format!("pending id {} has no job", id)),
                Some(job) if job.state != JobState::Pending => {
                    return Err(format!("pending id {} is {}", id, job.state))
                }
                Some(_) => {}
            }
        }
        let pending_jobs = self.count_in_state(JobState::Pending);
        if pending_jobs != self.pending.len() {
            return Err(format!(
                "{} pending jobs but {} pending ids",
                pending_jobs,
                self.pending.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(table: &JobTable) -> Vec<&str> {
        table.pending_ids().map(JobId::as_str).collect()
    }

    #[test]
    fn test_insert_is_fifo() {
        let mut table = JobTable::new();
        assert!(table.insert_pending(JobId::new("a"), "1".into()));
        assert!(table.insert_pending(JobId::new("b"), "2".into()));

        assert_eq!(ids(&table), vec!["a", "b"]);
        assert_eq!(table.pop_pending().unwrap().as_str(), "a");
        assert_eq!(table.pop_pending().unwrap().as_str(), "b");
        assert!(table.pop_pending().is_none());
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let mut table = JobTable::new();
        assert!(table.insert_pending(JobId::new("a"), "first".into()));
        assert!(!table.insert_pending(JobId::new("a"), "second".into()));

        assert_eq!(table.len(), 1);
        assert_eq!(table.pending_len(), 1);
        assert_eq!(table.get("a").unwrap().payload, "first");
    }

    #[test]
    fn test_push_front_restores_head() {
        let mut table = JobTable::new();
        table.insert_pending(JobId::new("a"), String::new());
        table.insert_pending(JobId::new("b"), String::new());

        let head = table.pop_pending().unwrap();
        table.push_front_pending(head);
        assert_eq!(ids(&table), vec!["a", "b"]);
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn test_requeue_keeps_submission_order() {
        let mut table = JobTable::new();
        for id in ["a", "b", "c"] {
            table.insert_pending(JobId::new(id), String::new());
        }
        // Replay shape: a dispatched, b acknowledged, ids left in place
        table.get_mut("a").unwrap().mark_dispatched();
        table.get_mut("b").unwrap().mark_dispatched();
        table.get_mut("b").unwrap().mark_acknowledged();

        let requeued = table.requeue_dispatched();
        assert_eq!(requeued, vec![JobId::new("a")]);
        assert_eq!(ids(&table), vec!["a", "c"]);
        assert_eq!(table.get("a").unwrap().state, JobState::Pending);
        assert_eq!(table.get("a").unwrap().attempts, 1);
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn test_jobs_in_creation_order() {
        let mut table = JobTable::new();
        for id in ["z", "m", "a"] {
            table.insert_pending(JobId::new(id), String::new());
        }
        let order: Vec<&str> = table.jobs().map(|job| job.id.as_str()).collect();
        assert_eq!(order, vec!["z", "m", "a"]);
    }

    #[test]
    fn test_invariant_violation_detected() {
        let mut table = JobTable::new();
        table.insert_pending(JobId::new("a"), String::new());
        table.get_mut("a").unwrap().mark_dispatched();

        assert!(table.check_invariants().is_err());
    }

    #[test]
    fn test_count_in_state() {
        let mut table = JobTable::new();
        table.insert_pending(JobId::new("a"), String::new());
        table.insert_pending(JobId::new("b"), String::new());
        table.pop_pending();
        table.get_mut("a").unwrap().mark_dispatched();

        assert_eq!(table.count_in_state(JobState::Pending), 1);
        assert_eq!(table.count_in_state(JobState::Dispatched), 1);
        assert_eq!(table.count_in_state(JobState::Acknowledged), 0);
        assert!(!table.is_empty());
    }
}
