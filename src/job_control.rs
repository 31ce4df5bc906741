use std::io;

use crate::status::ExitOutcome;

/// OS process identifier.
pub type Pid = libc::pid_t;

/// Block until `pid` terminates. Interrupted waits (e.g. Ctrl-C reaching the
/// shell) are retried; they never abandon the child.
pub(crate) fn wait_for_pid(pid: Pid) -> io::Result<ExitOutcome> {
    let mut raw_status: libc::c_int = 0;

    loop {
        let rc = unsafe { libc::waitpid(pid, &mut raw_status, 0) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }

        if let Some(outcome) = ExitOutcome::from_wait_status(raw_status) {
            return Ok(outcome);
        }
    }
}

/// Collect one terminated child without blocking. `Ok(None)` means no child
/// has finished yet, or there are no children at all.
pub(crate) fn try_wait_any() -> io::Result<Option<(Pid, ExitOutcome)>> {
    wait_any_with(libc::WNOHANG)
}

/// Block until any child terminates. `Ok(None)` means no children remain.
pub(crate) fn wait_any() -> io::Result<Option<(Pid, ExitOutcome)>> {
    wait_any_with(0)
}

fn wait_any_with(options: libc::c_int) -> io::Result<Option<(Pid, ExitOutcome)>> {
    let mut raw_status: libc::c_int = 0;

    loop {
        let rc = unsafe { libc::waitpid(-1, &mut raw_status, options) };
        if rc == 0 {
            return Ok(None);
        }
        if rc < 0 {
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(code) if code == libc::EINTR => continue,
                Some(code) if code == libc::ECHILD => return Ok(None),
                _ => return Err(err),
            }
        }

        if let Some(outcome) = ExitOutcome::from_wait_status(raw_status) {
            return Ok(Some((rc, outcome)));
        }
    }
}

/// Ask `pid` to terminate with SIGTERM. A process that is already gone is
/// not an error.
pub(crate) fn terminate(pid: Pid) -> io::Result<()> {
    if pid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process id",
        ));
    }

    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Ok(());
    }
    Err(err)
}
