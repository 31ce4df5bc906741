use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the execution subsystem. None of them is fatal to the
/// interpreter itself; the caller reports them and keeps reading input.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("{0}: argument contains an interior NUL byte")]
    InvalidArgument(String),

    #[error("{}: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start process: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    #[error("job table full ({capacity} jobs)")]
    TableFull { capacity: usize },

    #[error("{command}: {target}: {source}")]
    Directory {
        command: &'static str,
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("cd: {0} not set")]
    VariableUnset(&'static str),
}
