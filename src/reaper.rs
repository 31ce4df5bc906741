use std::io::Write;

use tracing::{debug, warn};

use crate::job_control::{self, Pid};
use crate::jobs::JobTable;
use crate::status::ExitOutcome;

/// Collect every child that has already terminated, without blocking.
///
/// Tracked jobs get a completion line and are removed from the table;
/// untracked children (e.g. ones started while the table was full) are
/// reclaimed silently. Returns how many children were collected.
pub fn reap(job_table: &mut JobTable, stdout: &mut dyn Write) -> usize {
    let mut reaped = 0;

    loop {
        match job_control::try_wait_any() {
            Ok(Some((pid, outcome))) => {
                reaped += 1;
                match job_table.find_by_pid(pid) {
                    Some(id) => {
                        report_completion(id, pid, outcome, stdout);
                        job_table.remove_by_pid(pid);
                    }
                    None => debug!(pid, %outcome, "reclaimed untracked child"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("waitpid failed while reaping: {e}");
                break;
            }
        }
    }

    if reaped > 0 {
        debug!(reaped, tracked = job_table.len(), "reap sweep finished");
    }
    reaped
}

/// `[id] Done: PID pid exited with code` or
/// `[id] Killed: PID pid terminated by signal sig`.
pub fn completion_line(id: usize, pid: Pid, outcome: ExitOutcome) -> String {
    match outcome {
        ExitOutcome::Exited(_) => format!("[{id}] Done: PID {pid} {outcome}"),
        ExitOutcome::Signaled(_) => format!("[{id}] Killed: PID {pid} {outcome}"),
    }
}

pub(crate) fn report_completion(id: usize, pid: Pid, outcome: ExitOutcome, stdout: &mut dyn Write) {
    let _ = writeln!(stdout, "{}", completion_line(id, pid, outcome));
    let _ = stdout.flush();
}
