use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redline::config::RedlineConfig;
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "redline")]
#[command(version, about = "Multi-agent review for technical installation documents")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors to stderr
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Path to a redline.toml to use instead of .redline/redline.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Review a plain-text document
    Review {
        /// Path to the extracted document text
        file: PathBuf,

        /// Agents to run (comma-separated). Defaults to every agent.
        #[arg(long, value_delimiter = ',')]
        agents: Option<Vec<String>>,

        /// LLM provider to try first
        #[arg(long)]
        provider: Option<String>,

        /// Attach findings to an existing session instead of creating one
        #[arg(long)]
        session_id: Option<i64>,

        /// Print the review result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show stored findings for a review session
    Findings {
        session_id: i64,

        #[arg(long)]
        json: bool,
    },
    /// List recent review sessions
    Sessions {
        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
    /// List review agents
    Agents {
        /// Run each agent against a sample document
        #[arg(long)]
        test: bool,
    },
    /// List configured LLM providers
    Providers {
        /// Check connectivity to each provider
        #[arg(long)]
        test: bool,
    },
    /// View, validate or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default redline.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // `config init` must work before any config exists or when the current one is broken
    if let Commands::Config {
        command: Some(ConfigCommands::Init { force }),
    } = &cli.command
    {
        return cmd::cmd_config_init(&project_dir, *force);
    }

    let provider = match &cli.command {
        Commands::Review { provider, .. } => provider.clone(),
        _ => None,
    };
    let config = RedlineConfig::load(project_dir, cli.config.as_deref())?
        .with_cli_args(cli.verbose, provider);

    let write_log_file = !matches!(cli.command, Commands::Config { .. });
    let _logging = redline::logging::init_logging(
        &config.logging(),
        cli.quiet,
        cli.verbose,
        write_log_file,
    )?;

    match cli.command {
        Commands::Review {
            file,
            agents,
            session_id,
            json,
            ..
        } => cmd::cmd_review(&config, &file, agents, session_id, json).await?,
        Commands::Findings { session_id, json } => cmd::cmd_findings(&config, session_id, json)?,
        Commands::Sessions { limit, json } => cmd::cmd_sessions(&config, limit, json)?,
        Commands::Agents { test } => cmd::cmd_agents(&config, test).await?,
        Commands::Providers { test } => cmd::cmd_providers(&config, test).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
