use std::io::Write;
use std::path::PathBuf;

use crate::error::ShellError;
use crate::jobs::JobTable;

/// Commands the shell runs itself instead of spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
    Exit,
    Jobs,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BuiltinAction {
    Continue(i32),
    Exit(i32),
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Self::Cd),
            "pwd" => Some(Self::Pwd),
            "exit" => Some(Self::Exit),
            "jobs" => Some(Self::Jobs),
            _ => None,
        }
    }
}

/// Execute a builtin command, writing output to the provided streams.
pub fn execute(
    builtin: Builtin,
    args: &[String],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    job_table: &JobTable,
) -> BuiltinAction {
    let result = match builtin {
        Builtin::Cd => builtin_cd(args, stdout),
        Builtin::Pwd => builtin_pwd(stdout),
        Builtin::Jobs => builtin_jobs(job_table, stdout),
        Builtin::Exit => return builtin_exit(args, stderr),
    };

    match result {
        Ok(()) => BuiltinAction::Continue(0),
        Err(e) => {
            let _ = writeln!(stderr, "mysh: {e}");
            BuiltinAction::Continue(1)
        }
    }
}

fn builtin_cd(args: &[String], stdout: &mut dyn Write) -> Result<(), ShellError> {
    let (target, announce) = match args.first() {
        // cd - : go to previous directory
        Some(dir) if dir == "-" => (env_dir("OLDPWD")?, true),
        Some(dir) => (PathBuf::from(dir), false),
        None => (env_dir("HOME")?, false),
    };

    let previous = std::env::current_dir().ok();

    std::env::set_current_dir(&target).map_err(|source| ShellError::Directory {
        command: "cd",
        target: target.display().to_string(),
        source,
    })?;

    // SAFETY: env vars are only mutated on the main thread; the Ctrl-C
    // handler thread never touches the environment.
    if let Some(prev) = previous {
        unsafe { std::env::set_var("OLDPWD", prev) };
    }
    if let Ok(now) = std::env::current_dir() {
        unsafe { std::env::set_var("PWD", now) };
    }

    if announce {
        let _ = writeln!(stdout, "{}", target.display());
    }
    Ok(())
}

fn env_dir(var: &'static str) -> Result<PathBuf, ShellError> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(ShellError::VariableUnset(var))
}

fn builtin_pwd(stdout: &mut dyn Write) -> Result<(), ShellError> {
    let path = std::env::current_dir().map_err(|source| ShellError::Directory {
        command: "pwd",
        target: ".".to_string(),
        source,
    })?;
    let _ = writeln!(stdout, "{}", path.display());
    Ok(())
}

/// List tracked jobs, oldest id first.
fn builtin_jobs(job_table: &JobTable, stdout: &mut dyn Write) -> Result<(), ShellError> {
    for job in job_table.jobs_sorted() {
        let _ = writeln!(stdout, "[{}] Running: {} (PID: {})", job.id, job.label, job.pid);
    }
    Ok(())
}

fn builtin_exit(args: &[String], stderr: &mut dyn Write) -> BuiltinAction {
    match args.first() {
        None => BuiltinAction::Exit(0),
        Some(s) => match s.parse::<i32>() {
            Ok(code) => BuiltinAction::Exit(code),
            Err(_) => {
                let _ = writeln!(stderr, "mysh: exit: {s}: numeric argument required");
                BuiltinAction::Exit(2)
            }
        },
    }
}
