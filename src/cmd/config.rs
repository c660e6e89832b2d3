//! Configuration view, validation and init commands: `redline config`.

use anyhow::{Context, Result};
use redline::config::{RedlineConfig, init_config};
use std::path::Path;

use super::super::ConfigCommands;

fn key_status(key: Option<String>) -> console::StyledObject<&'static str> {
    match key {
        Some(_) => console::style("set").green(),
        None => console::style("not set").dim(),
    }
}

pub fn cmd_config(config: &RedlineConfig, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Redline Configuration");
            println!("=====================");
            println!();

            let config_file = config.config_file();
            if config_file.exists() {
                println!("Config file: {}", config_file.display());
            } else {
                println!("No redline.toml found at {}", config_file.display());
                println!("Using default configuration.");
            }
            println!();

            let rendered = toml::to_string_pretty(&config.toml)
                .context("Failed to render configuration")?;
            for line in rendered.lines() {
                println!("  {}", line);
            }
            println!();

            let logging = config.logging();
            println!("Effective values (with env/CLI overrides):");
            println!("  default_provider = \"{}\"", config.default_provider());
            match config.fallback_provider() {
                Some(fallback) => println!("  fallback_provider = \"{}\"", fallback),
                None => println!("  fallback_provider = (none)"),
            }
            println!("  max_tokens = {}", config.max_tokens());
            println!("  database = {}", config.db_path().display());
            println!("  logs_dir = {}", logging.logs_dir.display());
            println!("  log level = \"{}\", format = \"{}\"", logging.level, logging.format);
            println!("  GROQ_API_KEY: {}", key_status(config.groq_api_key()));
            println!("  GEMINI_API_KEY: {}", key_status(config.gemini_api_key()));
            println!();

            if !config_file.exists() {
                println!("Run 'redline config init' to create a redline.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init { force }) => {
            cmd_config_init(&config.project_dir, force)?;
        }
    }

    Ok(())
}

pub fn cmd_config_init(project_dir: &Path, force: bool) -> Result<()> {
    let path = init_config(project_dir, force)?;

    println!("Created redline.toml at {}", path.display());
    println!();
    println!("You can now customize:");
    println!("  - [llm] default_provider, fallback_provider, max_tokens, timeout_secs");
    println!("  - [llm.groq] / [llm.gemini] model and base_url");
    println!("  - [review] default_agents, agent_timeout_secs");
    println!("  - [storage] and [logging] locations");
    println!();
    println!("API keys are read from GROQ_API_KEY and GEMINI_API_KEY (or a .env file).");
    println!();
    Ok(())
}
