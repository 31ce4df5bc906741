use std::path::PathBuf;

use clap::Parser;

use crate::jobs::DEFAULT_CAPACITY;

/// Upper bound accepted for `--max-jobs`.
pub const MAX_JOBS_LIMIT: usize = 1024;

/// A small interactive shell with background job tracking.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Run a single command line, then exit
    #[arg(short, long)]
    pub command: Option<String>,

    /// Number of background jobs that can be tracked at once
    #[arg(long, default_value_t = DEFAULT_CAPACITY, value_parser = parse_max_jobs)]
    pub max_jobs: usize,

    /// Prompt printed before each input line
    #[arg(long, default_value = "mysh> ")]
    pub prompt: String,

    /// Write diagnostic logs to this file instead of stderr (filter with MYSH_LOG)
    #[arg(long, env = "MYSH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

fn parse_max_jobs(value: &str) -> Result<usize, String> {
    let n: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (1..=MAX_JOBS_LIMIT).contains(&n) {
        Ok(n)
    } else {
        Err(format!("must be between 1 and {MAX_JOBS_LIMIT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["mysh"]).unwrap();
        assert_eq!(config.command, None);
        assert_eq!(config.max_jobs, DEFAULT_CAPACITY);
        assert_eq!(config.prompt, "mysh> ");
    }

    #[test]
    fn one_shot_command_and_capacity() {
        let config =
            Config::try_parse_from(["mysh", "-c", "sleep 1 &", "--max-jobs", "2"]).unwrap();
        assert_eq!(config.command.as_deref(), Some("sleep 1 &"));
        assert_eq!(config.max_jobs, 2);
    }

    #[test]
    fn capacity_out_of_range_is_rejected() {
        assert!(Config::try_parse_from(["mysh", "--max-jobs", "0"]).is_err());
        assert!(Config::try_parse_from(["mysh", "--max-jobs", "5000"]).is_err());
        assert!(Config::try_parse_from(["mysh", "--max-jobs", "many"]).is_err());
    }
}
