//! Clap command tree definition.
//!
//! Builds the `clap::Command` tree used by both shell mode (directly)
//! and REPL/pipe mode (via `try_get_matches_from`).

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree, global flags included.
pub fn build_cli() -> Command {
    let cmd = Command::new("stratq")
        .about("Durable FIFO job queue backed by an append-only log")
        .subcommand_required(false)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory holding the log and stratq.toml (default: data)")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log filter, e.g. warn, info, stratq_engine=debug (default: RUST_LOG or warn)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        );
    add_queue_commands(cmd)
}

/// Build a command tree for REPL and pipe mode (no global flags).
pub fn build_repl_cmd() -> Command {
    let cmd = Command::new("repl")
        .multicall(true)
        .subcommand_required(true);
    add_queue_commands(cmd)
}

fn add_queue_commands(cmd: Command) -> Command {
    cmd.subcommand(build_submit())
        .subcommand(build_dispatch())
        .subcommand(build_ack())
        .subcommand(Command::new("status").about("Show job counts by state"))
        .subcommand(Command::new("list").about("List every job in creation order"))
        .subcommand(
            Command::new("work").about("Dispatch and acknowledge every pending job, printing each"),
        )
        .subcommand(Command::new("demo").about("Submit task-1, task-2 and task-3, then work"))
}

fn build_submit() -> Command {
    Command::new("submit")
        .about("Submit one job per payload")
        .arg(
            Arg::new("payload")
                .required(true)
                .num_args(1..)
                .help("Job payload"),
        )
}

fn build_dispatch() -> Command {
    Command::new("dispatch").about("Claim the oldest pending job")
}

fn build_ack() -> Command {
    Command::new("ack")
        .about("Acknowledge a dispatched job")
        .arg(Arg::new("id").required(true).help("Job id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        build_cli().debug_assert();
        build_repl_cmd().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["stratq", "status", "--data-dir", "/tmp/q", "--json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("data-dir").map(String::as_str),
            Some("/tmp/q")
        );
        assert!(matches.get_flag("json"));
    }

    #[test]
    fn submit_requires_payload() {
        assert!(build_repl_cmd()
            .try_get_matches_from(["submit"])
            .is_err());
    }

    #[test]
    fn repl_rejects_global_flags() {
        assert!(build_repl_cmd()
            .try_get_matches_from(["status", "--data-dir", "x"])
            .is_err());
    }
}
