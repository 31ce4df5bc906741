use std::io::Write;

use tracing::{debug, warn};

use crate::job_control;
use crate::jobs::JobTable;
use crate::reaper::report_completion;

/// Terminate every tracked job and wait until no children remain.
///
/// Tracked jobs get SIGTERM; the drain then waits for *any* child, so
/// untracked ones are collected too. Blocks until the shell has no live
/// children. Returns how many children were collected.
pub fn shutdown(job_table: &mut JobTable, stdout: &mut dyn Write) -> usize {
    let active = job_table.all_active();
    debug!(jobs = active.len(), "shutting down");

    for (id, pid) in &active {
        if let Err(e) = job_control::terminate(*pid) {
            warn!(id, pid, "failed to signal job: {e}");
        }
    }

    let mut drained = 0;
    loop {
        match job_control::wait_any() {
            Ok(Some((pid, outcome))) => {
                drained += 1;
                if let Some(id) = job_table.remove_by_pid(pid) {
                    report_completion(id, pid, outcome, stdout);
                } else {
                    debug!(pid, %outcome, "drained untracked child");
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("waitpid failed during shutdown: {e}");
                break;
            }
        }
    }

    // No children are left to wait for; anything still listed is stale.
    for (id, pid) in job_table.all_active() {
        debug!(id, pid, "dropping stale job entry");
        job_table.remove_by_pid(pid);
    }

    drained
}
