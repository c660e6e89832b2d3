//! LLM provider listing and connectivity check: `redline providers`.

use anyhow::Result;
use redline::config::RedlineConfig;
use redline::llm::LlmGateway;

pub async fn cmd_providers(config: &RedlineConfig, test: bool) -> Result<()> {
    let gateway = LlmGateway::from_config(config);
    let providers = gateway.available_providers();

    println!();
    if providers.is_empty() {
        println!("No LLM providers configured.");
        println!("Set GROQ_API_KEY or GEMINI_API_KEY to enable AI review.");
        println!();
        return Ok(());
    }

    println!("LLM Providers");
    println!("=============");
    println!();
    for name in &providers {
        let role = if *name == gateway.default_provider() {
            " (default)"
        } else if Some(*name) == gateway.fallback_provider() {
            " (fallback)"
        } else {
            ""
        };
        println!("  {}{}", console::style(name).bold(), role);
    }
    println!();

    if test {
        println!("Testing connections...");
        println!();
        for (name, ok) in gateway.test_connection().await {
            let mark = if ok {
                console::style("✓").green()
            } else {
                console::style("✗").red()
            };
            println!("  {} {}", mark, name);
        }
        println!();
    }
    Ok(())
}
