//! Conveyor
//!
//! Promotes changes through the acceptance, union, rehearsal and delivered
//! environments of a Chef server and runs push jobs against the nodes that
//! consume them.
//!
//! Architecture:
//! - Configuration: Load settings from environment, overridden by flags
//! - Repositories: HTTP adapters for the Chef server and Delivery API
//! - Services: Business logic (stage promotion, deploys)
//! - Scheduler: Push job dispatch and status polling

mod config;
mod error;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conveyor_client::{ChefServerClient, DeliveryClient};
use conveyor_core::domain::change::{Change, CookbookPin, Stage};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{HttpBlockGate, HttpEnvironmentStore, HttpNodeResolver, HttpPushJobApi};
use crate::scheduler::JobPoller;
use crate::service::{DeployOutcome, DeployService, PromotionOutcome, PromotionService};

/// Log directives used when RUST_LOG is unset
///
/// The binary's own targets live under `conveyor`, the bin target name.
const DEFAULT_LOG_FILTER: &str = "conveyor=info,conveyor_client=info";

#[derive(Parser)]
#[command(name = "conveyor")]
#[command(about = "Chef environment promotion and push job driver", long_about = None)]
struct Cli {
    /// Chef server organization URL
    #[arg(long, global = true, env = "CHEF_SERVER_URL")]
    chef_server_url: Option<String>,

    /// Delivery API URL
    #[arg(long, global = true, env = "DELIVERY_API_URL")]
    delivery_api_url: Option<String>,

    /// Delivery enterprise
    #[arg(long, global = true, env = "DELIVERY_ENTERPRISE")]
    enterprise: Option<String>,

    /// Delivery user
    #[arg(long, global = true, env = "DELIVERY_USER")]
    user: Option<String>,

    /// Delivery token
    #[arg(long, global = true, env = "DELIVERY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Promote a change into a stage's environment
    Promote {
        /// Stage to promote into: acceptance, union, rehearsal or delivered
        stage: Stage,

        #[arg(long)]
        project: String,

        #[arg(long)]
        change_id: String,

        #[arg(long)]
        organization: String,

        #[arg(long, default_value = "master")]
        pipeline: String,

        /// Cookbook pin for acceptance, as name=version (repeatable)
        #[arg(long = "cookbook")]
        cookbooks: Vec<CookbookPin>,

        /// Cookbooks the project declares, comma separated
        #[arg(long, value_delimiter = ',')]
        project_cookbooks: Option<Vec<String>>,

        /// Applications the project declares, comma separated
        #[arg(long = "project-apps", value_delimiter = ',')]
        project_applications: Option<Vec<String>>,
    },
    /// Run the deploy command on an environment's nodes
    Deploy {
        #[arg(long)]
        environment: String,

        /// Cookbook whose recipes select the targets (repeatable)
        #[arg(long = "cookbook")]
        cookbooks: Vec<String>,

        /// Command to run instead of the configured deploy command
        #[arg(long)]
        command: Option<String>,

        /// Job timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Run an arbitrary command on a set of nodes
    Job {
        /// Target node (repeatable)
        #[arg(long = "node", required = true)]
        nodes: Vec<String>,

        /// Job timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        command: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(
        "Loaded configuration: chef_server_url={}, enterprise={}",
        config.chef_server_url, config.enterprise
    );

    match cli.command {
        Commands::Promote {
            stage,
            project,
            change_id,
            organization,
            pipeline,
            cookbooks,
            project_cookbooks,
            project_applications,
        } => {
            let change = Change {
                change_id,
                enterprise: config.enterprise.clone(),
                organization,
                project,
                pipeline,
                project_cookbooks,
                project_applications,
                new_cookbook_pins: cookbooks,
            };
            promote(&config, stage, &change).await
        }
        Commands::Deploy {
            environment,
            cookbooks,
            command,
            timeout,
        } => {
            let command = command.unwrap_or_else(|| config.deploy_command.clone());
            deploy(&config, &environment, &cookbooks, &command, timeout).await
        }
        Commands::Job {
            nodes,
            timeout,
            command,
        } => run_job(&config, nodes.into_iter().collect(), &command, timeout).await,
    }
}

/// Loads configuration from the environment and applies flag overrides
///
/// The connection flags fall back to the same variables `Config::from_env`
/// reads, so an explicit flag always wins.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env();

    let overrides = [
        (&cli.chef_server_url, &mut config.chef_server_url),
        (&cli.delivery_api_url, &mut config.delivery_api_url),
        (&cli.enterprise, &mut config.enterprise),
        (&cli.user, &mut config.delivery_user),
        (&cli.token, &mut config.delivery_token),
    ];
    for (flag, field) in overrides {
        if let Some(value) = flag {
            *field = value.clone();
        }
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn chef_client(config: &Config) -> ChefServerClient {
    ChefServerClient::new(config.chef_server_url.clone())
}

fn poller(config: &Config) -> JobPoller {
    JobPoller::new(
        Arc::new(HttpPushJobApi::new(chef_client(config))),
        config.poll_interval,
    )
}

fn job_timeout(config: &Config, timeout: Option<u64>) -> Duration {
    timeout.map(Duration::from_secs).unwrap_or(config.job_timeout)
}

async fn promote(config: &Config, stage: Stage, change: &Change) -> Result<()> {
    let store = Arc::new(HttpEnvironmentStore::new(chef_client(config)));
    let gate = Arc::new(HttpBlockGate::new(DeliveryClient::new(
        config.delivery_api_url.clone(),
        config.enterprise.clone(),
        config.delivery_user.clone(),
        config.delivery_token.clone(),
    )));

    let outcome = PromotionService::new(store, gate)
        .promote(stage, change)
        .await
        .with_context(|| format!("Failed to promote change {} to {}", change.change_id, stage))?;

    let name = &outcome.environment().name;
    match outcome {
        PromotionOutcome::Saved(_) => {
            info!("Promotion of {} into {} complete", change.change_id, name)
        }
        PromotionOutcome::Skipped(_) => info!("Change already in {}, nothing to do", name),
    }
    Ok(())
}

async fn deploy(
    config: &Config,
    environment: &str,
    cookbooks: &[String],
    command: &str,
    timeout: Option<u64>,
) -> Result<()> {
    let service = DeployService::new(
        Arc::new(HttpNodeResolver::new(chef_client(config))),
        poller(config),
        config.deployment_search_query.clone(),
    );

    let outcome = service
        .deploy(environment, cookbooks, command, job_timeout(config, timeout))
        .await
        .with_context(|| format!("Deploy to {} failed", environment))?;

    match outcome {
        DeployOutcome::Completed(job) => info!("Deploy job {} completed", job.id()),
        DeployOutcome::NoNodes { query } => warn!("Nothing deployed, no nodes for {}", query),
    }
    Ok(())
}

async fn run_job(
    config: &Config,
    nodes: BTreeSet<String>,
    command: &str,
    timeout: Option<u64>,
) -> Result<()> {
    let job = poller(config)
        .run(command, nodes, job_timeout(config, timeout))
        .await
        .with_context(|| format!("Push job '{}' failed", command))?;

    info!("Push job {} completed: {}", job.id(), job.node_summary());
    Ok(())
}
