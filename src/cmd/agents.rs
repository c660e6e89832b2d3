//! Agent listing and self-test: `redline agents`.

use anyhow::Result;
use redline::config::RedlineConfig;
use redline::store::InMemoryStore;
use std::sync::Arc;

use super::{build_gateway, build_orchestrator};

pub async fn cmd_agents(config: &RedlineConfig, test: bool) -> Result<()> {
    // Self-tests never persist, so nothing needs the database here
    let orchestrator = build_orchestrator(
        config,
        Arc::new(InMemoryStore::new()),
        if test { build_gateway(config) } else { None },
    );

    if !test {
        println!();
        println!("Review Agents");
        println!("=============");
        println!();
        for agent in orchestrator.available_agents() {
            println!(
                "  {:<12} (min confidence {:.2}) {}",
                console::style(&agent.name).bold(),
                agent.confidence_threshold,
                agent.description
            );
        }
        println!();
        return Ok(());
    }

    println!();
    println!("Testing agents...");
    println!();
    let reports = orchestrator.test_agents().await;
    let mut failed = 0;
    for report in &reports {
        if report.passed {
            println!(
                "  {} {:<12} {} finding(s)",
                console::style("✓").green(),
                report.name,
                report.findings
            );
        } else {
            failed += 1;
            println!(
                "  {} {:<12} {}",
                console::style("✗").red(),
                report.name,
                report.error.as_deref().unwrap_or("failed")
            );
        }
    }
    println!();

    if failed > 0 {
        anyhow::bail!("{} of {} agent(s) failed the self-test", failed, reports.len());
    }
    println!("All {} agents passed.", reports.len());
    println!();
    Ok(())
}
