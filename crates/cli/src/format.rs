//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): one line per event, e.g. `Enqueued job <id>`
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use stratq_core::{Job, JobId, QueueError};
use stratq_engine::{QueueStats, RecoveryReport};

use crate::state::Output;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format a successful output.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(output),
        OutputMode::Human => format_human(output),
    }
}

/// Format an error.
pub fn format_error(err: &QueueError, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(&serde_json::json!({
            "error": err.to_string()
        }))
        .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err)),
        OutputMode::Human => format!("(error) {}", err),
    }
}

/// Startup summary, printed to stderr in human mode.
pub fn format_recovery(report: &RecoveryReport) -> String {
    let mut line = format!(
        "Recovered {} jobs from {} records",
        report.jobs_recovered, report.records_replayed
    );
    if !report.requeued.is_empty() {
        line.push_str(&format!(", requeued {}", report.requeued.len()));
    }
    if report.truncated_tail_bytes > 0 {
        line.push_str(&format!(
            ", discarded {} trailing bytes; queue is read-only",
            report.truncated_tail_bytes
        ));
    }
    line
}

fn format_json(output: &Output) -> String {
    serde_json::to_string_pretty(output).unwrap_or_else(|e| {
        serde_json::json!({ "error": e.to_string() }).to_string()
    })
}

fn format_human(output: &Output) -> String {
    match output {
        Output::Submitted { ids } => format_submitted(ids),
        Output::Dispatched { job } => format!(
            "Dispatched job {} (payload = {}, attempt = {})",
            job.id, job.payload, job.attempts
        ),
        Output::Acknowledged { id } => format!("Acknowledged job {}", id),
        Output::Status { stats } => format_stats(stats),
        Output::Jobs { jobs } => format_jobs(jobs),
        Output::Worked { processed } => format_processed(processed),
        Output::Demo {
            submitted,
            processed,
        } => format!(
            "{}\n{}",
            format_submitted(submitted),
            format_processed(processed)
        ),
    }
}

fn format_submitted(ids: &[JobId]) -> String {
    ids.iter()
        .map(|id| format!("Enqueued job {}", id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_processed(jobs: &[Job]) -> String {
    let mut lines = Vec::with_capacity(jobs.len() * 2 + 1);
    for job in jobs {
        lines.push(format!(
            "Processing job {} (payload = {}, attempt = {})",
            job.id, job.payload, job.attempts
        ));
        lines.push(format!("Acknowledged job {}", job.id));
    }
    lines.push("No more jobs to process".to_string());
    lines.join("\n")
}

fn format_stats(stats: &QueueStats) -> String {
    format!(
        "total:        {}\npending:      {}\ndispatched:   {}\nacknowledged: {}",
        stats.total, stats.pending, stats.dispatched, stats.acknowledged
    )
}

fn format_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "(empty)".to_string();
    }
    jobs.iter()
        .map(|job| {
            format!(
                "{}  {:<12}  attempts={}  {}",
                job.id,
                job.state.as_str(),
                job.attempts,
                job.payload
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
