//! CLI command implementations.
//!
//! | Module      | Commands handled      |
//! |-------------|-----------------------|
//! | `review`    | `Review`              |
//! | `findings`  | `Findings`            |
//! | `sessions`  | `Sessions`            |
//! | `agents`    | `Agents`              |
//! | `providers` | `Providers`           |
//! | `config`    | `Config`              |

pub mod agents;
pub mod config;
pub mod findings;
pub mod providers;
pub mod review;
pub mod sessions;

pub use agents::cmd_agents;
pub use config::{cmd_config, cmd_config_init};
pub use findings::cmd_findings;
pub use providers::cmd_providers;
pub use review::cmd_review;
pub use sessions::cmd_sessions;

use anyhow::{Context, Result};
use redline::config::RedlineConfig;
use redline::llm::LlmGateway;
use redline::review::findings::{Finding, ReviewResult, Severity};
use redline::review::ReviewOrchestrator;
use redline::store::{FindingsStore, SqliteStore};
use std::sync::Arc;

/// Open the findings database, creating the data directory on first use.
pub(crate) fn open_store(config: &RedlineConfig) -> Result<Arc<SqliteStore>> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let db_path = config.db_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open findings database: {}", db_path.display()))?;
    Ok(Arc::new(store))
}

/// The gateway, or `None` when no provider has an API key.
pub(crate) fn build_gateway(config: &RedlineConfig) -> Option<Arc<LlmGateway>> {
    let gateway = LlmGateway::from_config(config);
    if gateway.available_providers().is_empty() {
        tracing::warn!("No LLM providers configured; agents will run rule checks only");
        None
    } else {
        Some(Arc::new(gateway))
    }
}

pub(crate) fn build_orchestrator(
    config: &RedlineConfig,
    store: Arc<dyn FindingsStore>,
    gateway: Option<Arc<LlmGateway>>,
) -> ReviewOrchestrator {
    let orchestrator = ReviewOrchestrator::with_default_agents(store, gateway);
    match config.agent_timeout() {
        Some(timeout) => orchestrator.with_agent_timeout(timeout),
        None => orchestrator,
    }
}

fn styled_severity(severity: Severity) -> console::StyledObject<String> {
    let label = format!("{:<7}", severity.to_string().to_uppercase());
    match severity {
        Severity::Error => console::style(label).red().bold(),
        Severity::Warning => console::style(label).yellow(),
        Severity::Info => console::style(label).cyan(),
    }
}

pub(crate) fn print_finding(finding: &Finding) {
    println!(
        "  {} [{}] {}: {}",
        styled_severity(finding.severity()),
        finding.category(),
        console::style(finding.location()).dim(),
        finding.description()
    );
    if let Some(suggestion) = finding.suggestion() {
        println!("          {} {}", console::style("→").green(), suggestion);
    }
}

/// Coloured report grouped by agent.
pub(crate) fn print_report(result: &ReviewResult) {
    println!();
    println!(
        "{} Review session {} {} ({:.2}s)",
        result.status.emoji(),
        result.session_id,
        console::style(result.status).bold(),
        result.total_processing_time
    );
    println!();

    for agent in &result.agent_results {
        println!(
            "{} ({} finding{})",
            console::style(&agent.agent_name).bold().underlined(),
            agent.findings.len(),
            if agent.findings.len() == 1 { "" } else { "s" }
        );
        if agent.findings.is_empty() {
            println!("  {}", console::style("no findings").dim());
        }
        for finding in &agent.findings {
            print_finding(finding);
        }
        println!();
    }

    if let Some(summary) = &result.summary {
        println!("{}", summary);
        println!();
    }
}
