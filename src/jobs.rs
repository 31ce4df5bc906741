use tracing::debug;

use crate::error::ShellError;
use crate::job_control::Pid;

/// Default number of background jobs the table can track at once.
pub const DEFAULT_CAPACITY: usize = 64;

/// Job ids wrap back to 1 after this value.
pub const MAX_JOB_ID: usize = 9999;

/// A tracked background process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub pid: Pid,
    pub label: String,
}

/// Fixed-capacity registry of background jobs, owned by whoever drives the
/// shell and passed to the executor, reaper and shutdown code explicitly.
///
/// Ids are display handles: unique among active jobs only, and reused once
/// the counter wraps at [`MAX_JOB_ID`].
#[derive(Debug)]
pub struct JobTable {
    slots: Vec<Option<Job>>,
    next_id: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.min(MAX_JOB_ID)).map(|_| None).collect(),
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Register a running background process. Returns the assigned job id,
    /// or [`ShellError::TableFull`] when every slot is taken. A pid that is
    /// already tracked keeps its id and gets the new label.
    pub fn insert(&mut self, pid: Pid, label: String) -> Result<usize, ShellError> {
        if let Some(job) = self.slots.iter_mut().flatten().find(|j| j.pid == pid) {
            job.label = label;
            return Ok(job.id);
        }

        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return Err(ShellError::TableFull {
                capacity: self.capacity(),
            });
        };

        let id = self.allocate_id();
        debug!(id, pid, %label, "registered job");
        self.slots[slot] = Some(Job { id, pid, label });
        Ok(id)
    }

    /// Drop the job tracking `pid`. Returns its id, or `None` if `pid` is not
    /// tracked (including a second call for the same pid).
    pub fn remove_by_pid(&mut self, pid: Pid) -> Option<usize> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(j) if j.pid == pid))?;
        let job = slot.take()?;
        debug!(id = job.id, pid, "removed job");
        Some(job.id)
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<usize> {
        self.iter().find(|j| j.pid == pid).map(|j| j.id)
    }

    /// `(job_id, pid)` for every active job.
    pub fn all_active(&self) -> Vec<(usize, Pid)> {
        self.iter().map(|j| (j.id, j.pid)).collect()
    }

    /// All active jobs sorted by job id (ascending).
    pub fn jobs_sorted(&self) -> Vec<&Job> {
        let mut list: Vec<&Job> = self.iter().collect();
        list.sort_by_key(|j| j.id);
        list
    }

    fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    // Only called with a free slot available, and capacity never exceeds
    // MAX_JOB_ID, so an unused id always exists.
    fn allocate_id(&mut self) -> usize {
        loop {
            let id = self.next_id;
            self.next_id = if id >= MAX_JOB_ID { 1 } else { id + 1 };
            if !self.iter().any(|j| j.id == id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut table = JobTable::with_capacity(4);
        assert_eq!(table.insert(100, "sleep 5".into()).unwrap(), 1);
        assert_eq!(table.insert(101, "sleep 6".into()).unwrap(), 2);
        assert_eq!(table.find_by_pid(101), Some(2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn ids_keep_increasing_after_removal() {
        let mut table = JobTable::with_capacity(4);
        table.insert(100, "a".into()).unwrap();
        assert_eq!(table.remove_by_pid(100), Some(1));
        assert_eq!(table.insert(101, "b".into()).unwrap(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut table = JobTable::with_capacity(2);
        table.insert(42, "true".into()).unwrap();
        assert_eq!(table.remove_by_pid(42), Some(1));
        assert_eq!(table.remove_by_pid(42), None);
        assert_eq!(table.find_by_pid(42), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn full_table_rejects_insert() {
        let mut table = JobTable::with_capacity(2);
        table.insert(1, "a".into()).unwrap();
        table.insert(2, "b".into()).unwrap();
        let err = table.insert(3, "c".into()).unwrap_err();
        assert!(matches!(err, ShellError::TableFull { capacity: 2 }));
        assert_eq!(table.find_by_pid(3), None);

        // A freed slot is usable again.
        table.remove_by_pid(1);
        assert!(table.insert(3, "c".into()).is_ok());
    }

    #[test]
    fn zero_capacity_table_is_always_full() {
        let mut table = JobTable::with_capacity(0);
        assert!(matches!(
            table.insert(7, "x".into()),
            Err(ShellError::TableFull { capacity: 0 })
        ));
    }

    #[test]
    fn same_pid_is_tracked_once() {
        let mut table = JobTable::with_capacity(4);
        let first = table.insert(9, "old".into()).unwrap();
        let second = table.insert(9, "new".into()).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.jobs_sorted()[0].label, "new");
    }

    #[test]
    fn ids_wrap_and_skip_active_ones() {
        let mut table = JobTable::with_capacity(3);
        table.next_id = MAX_JOB_ID;
        assert_eq!(table.insert(1, "a".into()).unwrap(), MAX_JOB_ID);
        assert_eq!(table.insert(2, "b".into()).unwrap(), 1);
        table.remove_by_pid(1);
        // Counter is at 2 now; id 2 is free so it is taken next.
        assert_eq!(table.insert(3, "c".into()).unwrap(), 2);

        table.remove_by_pid(3);
        table.next_id = 1;
        // Id 1 is still held by pid 2, so the next free id is used.
        assert_eq!(table.insert(4, "d".into()).unwrap(), 2);
    }

    #[test]
    fn all_active_lists_every_job() {
        let mut table = JobTable::with_capacity(4);
        table.insert(10, "a".into()).unwrap();
        table.insert(11, "b".into()).unwrap();
        table.insert(12, "c".into()).unwrap();
        table.remove_by_pid(11);

        let mut active = table.all_active();
        active.sort();
        assert_eq!(active, vec![(1, 10), (3, 12)]);
    }

    #[test]
    fn jobs_sorted_orders_by_id_not_slot() {
        let mut table = JobTable::with_capacity(2);
        table.insert(10, "a".into()).unwrap();
        table.insert(11, "b".into()).unwrap();
        table.remove_by_pid(10);
        // Lands in slot 0 with id 3.
        table.insert(12, "c".into()).unwrap();

        let ids: Vec<usize> = table.jobs_sorted().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
