use std::io::Write;

use tracing::{debug, warn};

use crate::builtins::{self, Builtin, BuiltinAction};
use crate::error::ShellError;
use crate::job_control;
use crate::jobs::JobTable;
use crate::parser::Command;
use crate::redirect;
use crate::shutdown;
use crate::spawn::{self, EXIT_NOT_FOUND, LaunchPlan};
use crate::status::ExitOutcome;

/// Status reported when a process could not be started at all.
pub const EXIT_SPAWN_FAILURE: i32 = 126;

/// What the driving loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(i32),
    /// Shutdown has already run; the interpreter should exit with this status.
    Exit(i32),
}

/// Execute a parsed command: run a builtin in-process, or spawn the program
/// and either wait for it (foreground) or register it as a job (background).
pub fn execute(
    cmd: Command,
    job_table: &mut JobTable,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Flow {
    let Some(program) = cmd.program.clone() else {
        return Flow::Continue(0);
    };

    match Builtin::lookup(&program) {
        Some(builtin) => run_builtin(builtin, &cmd, job_table, stdout, stderr),
        None => Flow::Continue(run_external(&program, cmd, job_table, stdout, stderr)),
    }
}

fn run_builtin(
    builtin: Builtin,
    cmd: &Command,
    job_table: &mut JobTable,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Flow {
    if cmd.background {
        debug!(?builtin, "ignoring '&' for builtin");
    }

    let action = match &cmd.output {
        Some(target) => match redirect::open_output(target) {
            Ok(mut file) => builtins::execute(builtin, cmd.args(), &mut file, stderr, job_table),
            Err(e) => {
                let _ = writeln!(stderr, "mysh: {e}");
                BuiltinAction::Continue(1)
            }
        },
        None => builtins::execute(builtin, cmd.args(), stdout, stderr, job_table),
    };

    match action {
        BuiltinAction::Continue(code) => Flow::Continue(code),
        BuiltinAction::Exit(code) => {
            shutdown::shutdown(job_table, stdout);
            Flow::Exit(code)
        }
    }
}

fn run_external(
    program: &str,
    cmd: Command,
    job_table: &mut JobTable,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let plan = match LaunchPlan::prepare(program, &cmd) {
        Ok(plan) => plan,
        Err(e) => {
            let _ = writeln!(stderr, "mysh: {e}");
            return EXIT_SPAWN_FAILURE;
        }
    };

    // Keep our own output ordered before anything the child writes.
    let _ = stdout.flush();
    let _ = stderr.flush();

    let child = match spawn::spawn(&plan) {
        Ok(child) => child,
        Err(e) => {
            let _ = writeln!(stderr, "mysh: {program}: {e}");
            return EXIT_SPAWN_FAILURE;
        }
    };

    if cmd.background {
        register_background(child.pid, cmd.label(), job_table, stdout, stderr);
        return 0;
    }

    match job_control::wait_for_pid(child.pid) {
        Ok(outcome) => classify(program, outcome, stderr),
        Err(e) => {
            warn!(pid = child.pid, "foreground wait failed: {e}");
            let _ = writeln!(stderr, "mysh: {program}: {}", ShellError::Wait(e));
            1
        }
    }
}

fn register_background(
    pid: job_control::Pid,
    label: String,
    job_table: &mut JobTable,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) {
    match job_table.insert(pid, label.clone()) {
        Ok(id) => {
            let _ = writeln!(stdout, "[{id}] Started: {label} (PID: {pid})");
            let _ = stdout.flush();
        }
        Err(e) => {
            // The process keeps running; it is still reclaimed by the reaper.
            let _ = writeln!(
                stderr,
                "mysh: {e}; {label} (PID: {pid}) is running but will not be tracked"
            );
        }
    }
}

/// Report a foreground result and turn it into the shell status.
fn classify(program: &str, outcome: ExitOutcome, stderr: &mut dyn Write) -> i32 {
    match outcome {
        ExitOutcome::Exited(0) => {}
        ExitOutcome::Exited(EXIT_NOT_FOUND) => {
            let _ = writeln!(stderr, "mysh: command not found: {program}");
        }
        ExitOutcome::Exited(code) => {
            let _ = writeln!(stderr, "mysh: {program}: exited with code {code}");
        }
        ExitOutcome::Signaled(signal) => {
            let _ = writeln!(stderr, "mysh: {program}: terminated by signal {signal}");
        }
    }
    outcome.code()
}
