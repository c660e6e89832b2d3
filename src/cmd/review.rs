//! Document review command: `redline review`.

use anyhow::{Context, Result};
use redline::config::RedlineConfig;
use redline::review::findings::{DocumentInfo, ReviewContext};
use redline::store::{FindingsStore, NewSession, SessionStatus};
use std::path::Path;

use super::{build_gateway, build_orchestrator, open_store, print_report};

pub async fn cmd_review(
    config: &RedlineConfig,
    file: &Path,
    agents: Option<Vec<String>>,
    session_id: Option<i64>,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read document: {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let store = open_store(config)?;
    let session_id = match session_id {
        Some(id) => {
            if store.get_session(id)?.is_none() {
                anyhow::bail!("Review session {} not found", id);
            }
            id
        }
        None => store.create_session(
            &NewSession::new(&filename)
                .with_path(file.display().to_string())
                .with_processing_method("text"),
        )?,
    };
    store.update_session_status(session_id, SessionStatus::Processing, 0.0, None)?;

    let context = ReviewContext::new(text)
        .with_session(session_id)
        .with_document_info(DocumentInfo {
            processing_method: Some("text".to_string()),
            ..DocumentInfo::new(&filename)
        });

    let orchestrator = build_orchestrator(config, store.clone(), build_gateway(config));
    let requested = agents.or_else(|| config.default_agents());

    tracing::debug!(session_id, path = %file.display(), bytes = context.document_text.len(), "Document loaded");
    let result = orchestrator
        .start_review(&context, requested.as_deref())
        .await?;

    store.update_session_status(
        session_id,
        result.status.into(),
        result.total_processing_time,
        result.summary.as_deref(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}
