use std::fmt;

/// How a child process ended, decoded from a raw `waitpid` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal termination with the given exit code.
    Exited(i32),
    /// Terminated by the given signal number.
    Signaled(i32),
}

impl ExitOutcome {
    /// Decode a raw wait status. Returns `None` for stop/continue reports,
    /// which are not terminal.
    pub fn from_wait_status(raw_status: libc::c_int) -> Option<Self> {
        if libc::WIFEXITED(raw_status) {
            return Some(Self::Exited(libc::WEXITSTATUS(raw_status)));
        }

        if libc::WIFSIGNALED(raw_status) {
            return Some(Self::Signaled(libc::WTERMSIG(raw_status)));
        }

        None
    }

    /// Shell-style status: the exit code, or `128 + signal` when killed.
    pub fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with {code}"),
            Self::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Linux/BSD encoding: exit code in bits 8..16, signal in the low 7 bits.
    fn exited(code: i32) -> libc::c_int {
        (code & 0xff) << 8
    }

    #[test]
    fn decodes_normal_exit() {
        assert_eq!(ExitOutcome::from_wait_status(exited(0)), Some(ExitOutcome::Exited(0)));
        assert_eq!(ExitOutcome::from_wait_status(exited(127)), Some(ExitOutcome::Exited(127)));
    }

    #[test]
    fn decodes_signal_termination() {
        let outcome = ExitOutcome::from_wait_status(libc::SIGTERM).unwrap();
        assert_eq!(outcome, ExitOutcome::Signaled(libc::SIGTERM));
        assert_eq!(outcome.code(), 128 + libc::SIGTERM);
    }

    #[test]
    fn stopped_status_is_not_terminal() {
        let stopped = (libc::SIGTSTP << 8) | 0x7f;
        assert_eq!(ExitOutcome::from_wait_status(stopped), None);
    }

    #[test]
    fn display_matches_completion_lines() {
        assert_eq!(ExitOutcome::Exited(3).to_string(), "exited with 3");
        assert_eq!(ExitOutcome::Signaled(9).to_string(), "terminated by signal 9");
    }
}
