//! Stored findings command: `redline findings`.

use anyhow::Result;
use redline::config::RedlineConfig;
use redline::store::FindingsStore;

use super::{build_orchestrator, open_store, print_report};

pub fn cmd_findings(config: &RedlineConfig, session_id: i64, json: bool) -> Result<()> {
    let store = open_store(config)?;

    if json {
        let findings = store.get_session_findings(session_id)?;
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }

    let orchestrator = build_orchestrator(config, store, None);
    match orchestrator.get_review_by_session(session_id)? {
        Some(result) => print_report(&result),
        None => {
            println!();
            println!("No findings recorded for session {}.", session_id);
            println!();
        }
    }
    Ok(())
}
