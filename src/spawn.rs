use std::ffi::CString;
use std::io;
use std::ptr;

use tracing::debug;

use crate::error::ShellError;
use crate::job_control::Pid;
use crate::parser::Command;
use crate::redirect::RedirectPlan;

/// Child exit status when redirection or other pre-exec setup fails.
pub const EXIT_SETUP_FAILURE: i32 = 1;

/// Child exit status when the program cannot be found or executed.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Everything the child needs, converted before `fork` so the child side
/// performs no allocation.
#[derive(Debug)]
pub struct LaunchPlan {
    program: CString,
    // Owns the strings `argv_ptrs` points into.
    _argv: Vec<CString>,
    argv_ptrs: Vec<*const libc::c_char>,
    redirects: RedirectPlan,
}

/// Parent-side handle to a freshly started child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedProcess {
    pub pid: Pid,
}

impl LaunchPlan {
    pub fn prepare(program: &str, cmd: &Command) -> Result<Self, ShellError> {
        let program_c = to_cstring(program)?;
        let argv = cmd
            .argv
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(ptr::null());

        let redirects = RedirectPlan::prepare(cmd.input.as_deref(), cmd.output.as_ref())?;

        Ok(Self {
            program: program_c,
            _argv: argv,
            argv_ptrs,
            redirects,
        })
    }

    /// Child side of the fork: rebind streams, then replace the process
    /// image. Never returns; on any failure the child exits with
    /// [`EXIT_SETUP_FAILURE`] or [`EXIT_NOT_FOUND`].
    fn launch_child_image(&self) -> ! {
        unsafe {
            // The shell ignores SIGPIPE; programs expect the default.
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        if let Err(target) = self.redirects.apply() {
            write_stderr(target.diagnostic());
            unsafe { libc::_exit(EXIT_SETUP_FAILURE) };
        }

        unsafe {
            libc::execvp(self.program.as_ptr(), self.argv_ptrs.as_ptr());
            libc::_exit(EXIT_NOT_FOUND)
        }
    }
}

/// Start a new process for `plan`. Returns only in the parent.
pub fn spawn(plan: &LaunchPlan) -> Result<SpawnedProcess, ShellError> {
    match unsafe { libc::fork() } {
        -1 => Err(ShellError::Spawn(io::Error::last_os_error())),
        0 => plan.launch_child_image(),
        pid => {
            debug!(pid, program = ?plan.program, "spawned child");
            Ok(SpawnedProcess { pid })
        }
    }
}

fn to_cstring(arg: &str) -> Result<CString, ShellError> {
    CString::new(arg).map_err(|_| ShellError::InvalidArgument(arg.to_string()))
}

fn write_stderr(bytes: &[u8]) {
    let mut rest = bytes;
    while !rest.is_empty() {
        let rc = unsafe { libc::write(libc::STDERR_FILENO, rest.as_ptr().cast(), rest.len()) };
        if rc <= 0 {
            return;
        }
        rest = &rest[rc as usize..];
    }
}
