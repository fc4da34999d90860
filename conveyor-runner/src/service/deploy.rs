//! Deploy service
//!
//! Resolves the nodes of an environment that run any of the given cookbooks
//! and dispatches a command to them through the push job poller.

use conveyor_core::domain::push_job::RemoteJob;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::DeployError;
use crate::repository::NodeResolver;
use crate::scheduler::JobPoller;

/// Builds the node search query for a deploy
///
/// `(recipes:a* OR recipes:b*) AND chef_environment:<env> AND <extra>`; the
/// recipe clause is omitted without cookbooks and the extra clause when it
/// is blank.
pub fn deploy_query(cookbooks: &[String], environment: &str, deployment_query: &str) -> String {
    let mut clauses = Vec::new();

    if !cookbooks.is_empty() {
        let recipes: Vec<String> = cookbooks
            .iter()
            .map(|cookbook| format!("recipes:{}*", cookbook))
            .collect();
        clauses.push(format!("({})", recipes.join(" OR ")));
    }

    clauses.push(format!("chef_environment:{}", environment));

    let extra = deployment_query.trim();
    if !extra.is_empty() {
        clauses.push(extra.to_string());
    }

    clauses.join(" AND ")
}

#[derive(Debug)]
pub enum DeployOutcome {
    /// The search matched no nodes; nothing was dispatched
    NoNodes { query: String },
    /// The command ran on every matched node
    Completed(RemoteJob),
}

pub struct DeployService {
    nodes: Arc<dyn NodeResolver>,
    poller: JobPoller,
    deployment_query: String,
}

impl DeployService {
    pub fn new(nodes: Arc<dyn NodeResolver>, poller: JobPoller, deployment_query: String) -> Self {
        Self {
            nodes,
            poller,
            deployment_query,
        }
    }

    /// Runs `command` on every node of `environment` carrying one of `cookbooks`
    pub async fn deploy(
        &self,
        environment: &str,
        cookbooks: &[String],
        command: &str,
        timeout: Duration,
    ) -> Result<DeployOutcome, DeployError> {
        let query = deploy_query(cookbooks, environment, &self.deployment_query);
        info!("Searching deploy targets: {}", query);

        let found = self
            .nodes
            .resolve(&query)
            .await
            .map_err(|source| DeployError::Search {
                query: query.clone(),
                source,
            })?;

        let nodes: BTreeSet<String> = found.into_iter().collect();
        if nodes.is_empty() {
            warn!("No nodes matched '{}', skipping deploy", query);
            return Ok(DeployOutcome::NoNodes { query });
        }

        info!("Deploying to {} node(s) in {}", nodes.len(), environment);
        let job = self.poller.run(command, nodes, timeout).await?;
        Ok(DeployOutcome::Completed(job))
    }
}
