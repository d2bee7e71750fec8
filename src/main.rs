//! hub - command line front end for community-hub
//!
//! Inspect and change the persisted impersonation override, watch badge
//! counters and invoke backend functions.

#![allow(missing_docs)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use community_hub::utils::logging::init_logging;
use community_hub::{Config, Hub, UserRole};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_stream::StreamExt;

#[derive(Debug, Parser)]
#[command(name = "hub", version, about = "Community hub session and badge tooling")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, env = "HUB_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Role and impersonation state
    #[command(subcommand)]
    Role(RoleCommand),
    /// Badge counters for a session
    Counters {
        /// Role stored on the user's profile
        #[arg(long)]
        actual: UserRole,
        /// Keep running and print every change until Ctrl-C
        #[arg(long)]
        watch: bool,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Invoke a serverless function
    Invoke {
        function: String,
        /// JSON request body
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// Configuration helpers
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum RoleCommand {
    /// Show the resolved session
    Show {
        #[arg(long)]
        actual: Option<UserRole>,
    },
    /// View the app as another role
    Impersonate { role: UserRole },
    /// Drop the impersonation override
    Stop,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Load and validate the configuration
    Check,
    /// Print the effective configuration as YAML
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())
        .await
        .context("failed to load configuration")?;
    init_logging(&config.logging)?;

    match cli.command {
        Command::Config(ConfigCommand::Check) => {
            println!(
                "Configuration OK ({} counter(s), backend {})",
                config.counters.len(),
                if config.backend.is_configured() { "configured" } else { "not configured" }
            );
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        Command::Role(command) => role(Hub::open(config)?, command),
        Command::Counters {
            actual,
            watch,
            json,
        } => counters(Hub::open(config)?, actual, watch, json).await,
        Command::Invoke { function, payload } => {
            let payload: Value =
                serde_json::from_str(&payload).context("--payload is not valid JSON")?;
            let hub = Hub::open(config)?;
            let response: Value = hub.invoke(&function, &payload).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

fn role(hub: Hub, command: RoleCommand) -> anyhow::Result<()> {
    match command {
        RoleCommand::Show { actual } => {
            let session = hub.session(actual);
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        RoleCommand::Impersonate { role } => {
            hub.resolver().start_impersonation(role)?;
            println!("Impersonating {} (applies to admin and owner sessions)", role);
        }
        RoleCommand::Stop => {
            if hub.resolver().impersonated_role().is_none() {
                println!("Not impersonating");
            } else {
                hub.resolver().stop_impersonation()?;
                println!("Impersonation stopped");
            }
        }
    }
    Ok(())
}

async fn counters(hub: Hub, actual: UserRole, watch: bool, json: bool) -> anyhow::Result<()> {
    let session = hub.session(Some(actual));

    let badges = hub.start_badges(&session).await?;
    badges.ready().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&badges.snapshot())?);
    } else {
        for badge in badges.snapshot() {
            let marker = if badge.active { "" } else { " (not visible)" };
            println!("{:<24} {}{}", badge.name, badge.count, marker);
        }
        println!("{:<24} {}", "total", badges.total());
    }

    if watch {
        let mut updates = badges.updates();
        loop {
            tokio::select! {
                update = updates.next() => match update {
                    Some((name, state)) if state.is_ready() => {
                        println!("{:<24} {} (total {})", name, state.count(), badges.total());
                    }
                    Some(_) => {}
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    badges.stop().await;
    Ok(())
}
