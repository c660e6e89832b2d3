//! Session listing command: `redline sessions`.

use anyhow::Result;
use redline::config::RedlineConfig;
use redline::store::{FindingsStore, SessionStatus};

use super::open_store;

pub fn cmd_sessions(config: &RedlineConfig, limit: usize, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let sessions = store.recent_sessions(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    println!();
    if sessions.is_empty() {
        println!("No review sessions yet. Run 'redline review <FILE>' to start one.");
        println!();
        return Ok(());
    }

    println!(
        "{:<6} {:<11} {:<20} {:>8}  Document",
        "ID", "Status", "Created", "Time"
    );
    println!(
        "{:<6} {:<11} {:<20} {:>8}  --------",
        "------", "-----------", "--------------------", "--------"
    );
    for session in &sessions {
        let status = format!("{:<11}", session.status);
        let status = match session.status {
            SessionStatus::Completed => console::style(status).green(),
            SessionStatus::Partial => console::style(status).yellow(),
            SessionStatus::Failed => console::style(status).red(),
            SessionStatus::Pending | SessionStatus::Processing => console::style(status).dim(),
        };
        println!(
            "{:<6} {} {:<20} {:>7.2}s  {}",
            session.id,
            status,
            session.created_at.format("%Y-%m-%d %H:%M:%S"),
            session.total_processing_time,
            session.document_filename
        );
    }
    println!();
    Ok(())
}
