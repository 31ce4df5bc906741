#[cfg(not(unix))]
compile_error!("mysh requires a Unix-like operating system");

mod builtins;
mod config;
mod error;
mod executor;
mod job_control;
mod jobs;
mod parser;
mod reaper;
mod redirect;
mod shutdown;
mod spawn;
mod status;

use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::executor::Flow;
use crate::jobs::JobTable;

/// Status for a line that failed to parse.
const EXIT_SYNTAX_ERROR: i32 = 2;

fn main() {
    let config = Config::parse();

    if let Err(err) = init_tracing(&config) {
        eprintln!("mysh: failed to initialize logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = ctrlc::set_handler(|| {
        println!();
        let _ = io::stdout().flush();
    }) {
        warn!("failed to set Ctrl-C handler: {err}");
    }

    let mut job_table = JobTable::with_capacity(config.max_jobs);
    debug!(capacity = job_table.capacity(), "shell starting");

    let code = match config.command.as_deref() {
        Some(line) => run_once(line, &mut job_table),
        None => run_interactive(&config.prompt, &mut job_table),
    };

    std::process::exit(code);
}

fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_env("MYSH_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true);

    match &config.log_file {
        Some(path) => {
            let log_file = Arc::new(std::fs::File::create(path)?);
            builder.with_ansi(false).with_writer(log_file).try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    }
}

/// Parse and execute one line. Parse errors are reported, not fatal.
fn run_line(line: &str, job_table: &mut JobTable) -> Flow {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    match parser::parse(line) {
        Ok(cmd) => executor::execute(cmd, job_table, &mut stdout, &mut stderr),
        Err(e) => {
            let _ = writeln!(stderr, "mysh: {e}");
            Flow::Continue(EXIT_SYNTAX_ERROR)
        }
    }
}

/// `-c` mode: run the line, then drain any remaining children.
fn run_once(line: &str, job_table: &mut JobTable) -> i32 {
    match run_line(line, job_table) {
        Flow::Exit(code) => code,
        Flow::Continue(code) => {
            shutdown::shutdown(job_table, &mut io::stdout());
            code
        }
    }
}

fn run_interactive(prompt: &str, job_table: &mut JobTable) -> i32 {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut last_exit_code: i32 = 0;

    loop {
        reaper::reap(job_table, &mut stdout);

        print!("{prompt}");
        if stdout.flush().is_err() {
            break;
        }

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match run_line(trimmed, job_table) {
                    Flow::Continue(code) => last_exit_code = code,
                    Flow::Exit(code) => return code,
                }
            }
            Err(error) => {
                eprintln!("mysh: error reading input: {error}");
                break;
            }
        }
    }

    shutdown::shutdown(job_table, &mut stdout);
    last_exit_code
}
