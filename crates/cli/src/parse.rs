//! ArgMatches → CliAction conversion, plus REPL meta-commands.

use clap::ArgMatches;

/// The result of parsing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Submit one job per payload.
    Submit(Vec<String>),
    /// Claim the oldest pending job.
    Dispatch,
    /// Acknowledge a dispatched job.
    Ack(String),
    /// Job counts by state.
    Status,
    /// Every job in creation order.
    List,
    /// Dispatch and acknowledge until the queue is empty.
    Work,
    /// Submit `task-1..3`, then work.
    Demo,
}

/// REPL-only commands that never reach clap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Quit,
    Help,
    Clear,
}

/// Convert parsed matches into an action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| "No command given".to_string())?;

    match name {
        "submit" => {
            let payloads: Vec<String> = sub
                .get_many::<String>("payload")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            if payloads.is_empty() {
                return Err("submit requires at least one payload".to_string());
            }
            Ok(CliAction::Submit(payloads))
        }
        "dispatch" => Ok(CliAction::Dispatch),
        "ack" => {
            let id = sub
                .get_one::<String>("id")
                .cloned()
                .ok_or_else(|| "ack requires a job id".to_string())?;
            Ok(CliAction::Ack(id))
        }
        "status" => Ok(CliAction::Status),
        "list" => Ok(CliAction::List),
        "work" => Ok(CliAction::Work),
        "demo" => Ok(CliAction::Demo),
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Recognize a meta-command line.
pub fn check_meta_command(line: &str) -> Option<MetaCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "quit" | "exit" => Some(MetaCommand::Quit),
        "help" | "?" => Some(MetaCommand::Help),
        "clear" => Some(MetaCommand::Clear),
        _ => None,
    }
}
