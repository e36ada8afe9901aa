mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use devstats_catalog::{CatalogClient, CatalogConfig};
use devstats_core::{Command, Dispatcher, Requirement, Settings};
use devstats_github::{GitHubClient, GitHubConfig};
use output::{summary_line, TableReporter};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "devstats")]
#[command(about = "Copy GitHub membership and contribution dates onto catalog users", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Record when each organization member was added, from the enterprise audit log
    GetMemberJoinDates,
    /// Record each member's first commit and first merged pull request
    GetDeveloperStats,
}

impl Commands {
    fn requirement(self) -> Requirement {
        match self {
            Commands::GetMemberJoinDates => Requirement::JoinDates,
            Commands::GetDeveloperStats => Requirement::DeveloperStats,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    run_with(&settings, command).await
}

/// Names of required variables that are unset, or `None` when the command
/// can run.
fn preflight(settings: &Settings, command: Commands) -> Option<Vec<&'static str>> {
    let missing = settings.missing_for(command.requirement());
    (!missing.is_empty()).then_some(missing)
}

async fn run_with(settings: &Settings, command: Commands) -> Result<()> {
    if let Some(missing) = preflight(settings, command) {
        println!(
            "{} missing required environment variables: {}. Nothing to do.",
            "Skipping:".yellow().bold(),
            missing.join(", ")
        );
        return Ok(());
    }

    let org = required(&settings.github.org, "github.org")?;
    let token = required(&settings.github.token, "github.token")?;
    let client_id = required(&settings.catalog.client_id, "catalog.client_id")?;
    let client_secret = required(&settings.catalog.client_secret, "catalog.client_secret")?;

    let github = GitHubClient::new(GitHubConfig::from_settings(token, &settings.github))
        .context("Failed to create GitHub client")?;
    let catalog = CatalogClient::new(CatalogConfig::from_settings(
        client_id,
        client_secret,
        &settings.catalog,
    ))
    .context("Failed to create catalog client")?;

    let command = match command {
        Commands::GetMemberJoinDates => Command::MemberJoinDates {
            enterprise: required(&settings.github.enterprise, "github.enterprise")?,
        },
        Commands::GetDeveloperStats => Command::DeveloperStats,
    };

    let dispatcher = Dispatcher::new(&github, &catalog, &org, &settings.catalog.blueprint);
    let report = dispatcher
        .run(&command, &TableReporter)
        .await
        .with_context(|| format!("{} failed", command.name()))?;

    let write = report.write();
    let line = summary_line(command.name(), write);
    if write.failed.is_empty() {
        println!("{}", line.green());
    } else {
        println!("{}", line.yellow());
        println!("Failed users: {}", write.failed.join(", "));
    }
    info!("{} finished", command.name());
    Ok(())
}

fn required<T: Clone>(value: &Option<T>, key: &str) -> Result<T> {
    value
        .clone()
        .with_context(|| format!("{} is not configured", key))
}
