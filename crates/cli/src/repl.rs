//! REPL loop with rustyline.
//!
//! Interactive mode: prompt, meta-commands, history, TAB completion.
//! Pipe mode: read lines from stdin, execute each.

use std::io::{self, BufRead};
use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};

use crate::commands::build_repl_cmd;
use crate::format::{format_error, format_output, OutputMode};
use crate::parse::{check_meta_command, matches_to_action, MetaCommand};
use crate::state::SessionState;

const PROMPT: &str = "stratq> ";

const TOP_LEVEL_COMMANDS: &[&str] = &[
    "submit", "dispatch", "ack", "status", "list", "work", "demo", "help", "clear", "quit",
    "exit",
];

/// Run the interactive REPL.
pub fn run_repl(state: &mut SessionState, mode: OutputMode, history_path: Option<PathBuf>) {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let mut rl: Editor<StratqHelper, DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("(error) Failed to start line editor: {}", e);
            return;
        }
    };
    rl.set_helper(Some(StratqHelper));

    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                if let Some(meta) = check_meta_command(trimmed) {
                    match meta {
                        MetaCommand::Quit => break,
                        MetaCommand::Clear => {
                            // ANSI clear screen
                            print!("\x1B[2J\x1B[1;1H");
                        }
                        MetaCommand::Help => print_help(),
                    }
                    continue;
                }

                execute_line(trimmed, state, mode);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C: show a new prompt
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("(error) {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
}

/// Run in pipe mode: read lines from stdin, execute each.
///
/// Returns 1 if any line failed, 0 otherwise.
pub fn run_pipe(state: &mut SessionState, mode: OutputMode) -> i32 {
    let stdin = io::stdin();
    let mut exit_code = 0;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match check_meta_command(trimmed) {
            Some(MetaCommand::Quit) => break,
            Some(_) => continue,
            None => {}
        }

        if !execute_line(trimmed, state, mode) {
            exit_code = 1;
        }
    }

    exit_code
}

/// Tokenize, parse and execute one line. Returns true on success.
fn execute_line(line: &str, state: &mut SessionState, mode: OutputMode) -> bool {
    // Tokenize with shlex (respects quotes)
    let tokens = match shlex::split(line) {
        Some(t) if !t.is_empty() => t,
        Some(_) => return true,
        None => {
            eprintln!("(error) Invalid quoting: {}", line);
            return false;
        }
    };

    let matches = match build_repl_cmd().try_get_matches_from(tokens) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            return false;
        }
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            return false;
        }
    };

    match state.execute(action) {
        Ok(output) => {
            let formatted = format_output(&output, mode);
            if !formatted.is_empty() {
                println!("{}", formatted);
            }
            true
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            false
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  submit <payload>...    Submit one job per payload");
    println!("  dispatch               Claim the oldest pending job");
    println!("  ack <id>               Acknowledge a dispatched job");
    println!("  status                 Show job counts by state");
    println!("  list                   List every job");
    println!("  work                   Dispatch and acknowledge every pending job");
    println!("  demo                   Submit task-1..3, then work");
    println!();
    println!("  help                   Show this help");
    println!("  clear                  Clear the screen");
    println!("  quit, exit             Leave the shell");
}

struct StratqHelper;

impl Helper for StratqHelper {}
impl Validator for StratqHelper {}
impl Highlighter for StratqHelper {}
impl Hinter for StratqHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Completer for StratqHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_pos = &line[..pos];
        let parts: Vec<&str> = line_to_pos.split_whitespace().collect();
        let trailing_space = line_to_pos.ends_with(' ');

        // Only the command word completes; arguments are free text
        if parts.len() > 1 || (parts.len() == 1 && trailing_space) {
            return Ok((pos, vec![]));
        }

        let prefix = parts.first().copied().unwrap_or("");
        let start = pos - prefix.len();
        let candidates = TOP_LEVEL_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}
