//! stratq CLI: driver for the durable job queue.
//!
//! Three modes:
//! - **Shell mode**: `stratq [flags] COMMAND` runs one command and exits
//! - **REPL mode**: `stratq [flags]` opens an interactive prompt (stdin is a TTY)
//! - **Pipe mode**: `echo "submit x" | stratq` runs stdin line by line
//!
//! The data directory (default `data/`) holds the log and `stratq.toml`.
//! Both are created on first start.

mod commands;
mod format;
mod parse;
mod repl;
mod state;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use stratq_engine::{QueueConfig, QueueEngine, CONFIG_FILE_NAME};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_output, format_recovery, OutputMode};
use parse::matches_to_action;
use state::SessionState;

const DEFAULT_DATA_DIR: &str = "data";
const HISTORY_FILE_NAME: &str = ".stratq_history";
const DEFAULT_LOG_LEVEL: &str = "warn";

fn main() {
    let cli = build_cli();
    let matches = cli.get_matches();

    init_tracing(matches.get_one::<String>("log-level").map(String::as_str));

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let data_dir = matches
        .get_one::<String>("data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let mut state = match open_session(&data_dir) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let exit_code = if matches.subcommand().is_some() {
        run_shell_mode(&matches, &mut state, output_mode)
    } else if std::io::stdin().is_terminal() {
        eprintln!("{}", format_recovery(state.recovery_report()));
        eprintln!("Type 'help' for commands, 'quit' to leave.");
        repl::run_repl(&mut state, output_mode, Some(data_dir.join(HISTORY_FILE_NAME)));
        0
    } else {
        repl::run_pipe(&mut state, output_mode)
    };

    if let Err(e) = state.close() {
        eprintln!("{}", format_error(&e, output_mode));
        process::exit(1);
    }
    process::exit(exit_code);
}

/// Install the stderr subscriber.
///
/// `--log-level` wins over `RUST_LOG`; the default is `warn`.
fn init_tracing(level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level))
        .with_writer(std::io::stderr)
        .init();
}

/// Filter from `--log-level`, else `RUST_LOG`, else `warn`.
///
/// An unparsable directive falls back to `warn`.
fn log_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Prepare the data directory, load the config and recover the queue.
fn open_session(data_dir: &Path) -> Result<SessionState, String> {
    std::fs::create_dir_all(data_dir).map_err(|e| {
        format!(
            "Failed to create data directory '{}': {}",
            data_dir.display(),
            e
        )
    })?;

    let config_path = data_dir.join(CONFIG_FILE_NAME);
    QueueConfig::write_default_if_missing(&config_path).map_err(|e| e.to_string())?;
    let config = QueueConfig::from_file(&config_path).map_err(|e| e.to_string())?;

    let log_path = data_dir.join(&config.log_file);
    let engine = QueueEngine::open_with_config(&log_path, config)
        .map_err(|e| format!("Failed to open queue '{}': {}", log_path.display(), e))?;

    let report = engine.recovery_report();
    info!(
        path = %log_path.display(),
        jobs = report.jobs_recovered,
        requeued = report.requeued.len(),
        "Queue ready"
    );

    Ok(SessionState::new(engine))
}

fn run_shell_mode(matches: &clap::ArgMatches, state: &mut SessionState, mode: OutputMode) -> i32 {
    let action = match matches_to_action(matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            return 1;
        }
    };

    match state.execute(action) {
        Ok(output) => {
            let formatted = format_output(&output, mode);
            if !formatted.is_empty() {
                println!("{}", formatted);
            }
            0
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            1
        }
    }
}
