//! Runner configuration
//!
//! Defines the connection settings for the Chef server and Delivery API and
//! the tunables of the push job poller and deploy search.

use std::time::Duration;

/// Default seconds between push job status polls
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Default seconds a push job may run before it counts as timed out
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 30 * 60;
/// Default extra clause restricting deploy targets to push-jobs capable nodes
const DEFAULT_DEPLOYMENT_SEARCH_QUERY: &str = "recipes:push-jobs*";
/// Default command run on deploy targets
const DEFAULT_DEPLOY_COMMAND: &str = "chef-client";

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chef server organization URL (e.g., "https://chef.example.com/organizations/acme")
    pub chef_server_url: String,

    /// Delivery API base URL (e.g., "https://delivery.example.com")
    pub delivery_api_url: String,

    /// Delivery enterprise the pipeline runs in
    pub enterprise: String,

    /// Delivery API user name
    pub delivery_user: String,

    /// Delivery API token
    pub delivery_token: String,

    /// How often to poll a push job for its status
    pub poll_interval: Duration,

    /// Maximum time a push job can run before timing out
    pub job_timeout: Duration,

    /// Extra search clause ANDed into the deploy node query
    pub deployment_search_query: String,

    /// Command dispatched to deploy targets
    pub deploy_command: String,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(
        chef_server_url: String,
        delivery_api_url: String,
        enterprise: String,
        delivery_user: String,
        delivery_token: String,
    ) -> Self {
        Self {
            chef_server_url,
            delivery_api_url,
            enterprise,
            delivery_user,
            delivery_token,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            deployment_search_query: DEFAULT_DEPLOYMENT_SEARCH_QUERY.to_string(),
            deploy_command: DEFAULT_DEPLOY_COMMAND.to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CHEF_SERVER_URL
    /// - DELIVERY_API_URL
    /// - DELIVERY_ENTERPRISE
    /// - DELIVERY_USER
    /// - DELIVERY_TOKEN
    /// - PUSH_JOB_POLL_INTERVAL (optional, seconds, default: 5)
    /// - PUSH_JOB_TIMEOUT (optional, seconds, default: 1800)
    /// - DEPLOYMENT_SEARCH_QUERY (optional, default: recipes:push-jobs*)
    /// - DEPLOY_COMMAND (optional, default: chef-client)
    ///
    /// Missing values are left empty for command-line flags to fill in;
    /// [`Config::validate`] rejects whatever is still missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).unwrap_or_default();
        let secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(default))
        };

        let mut config = Self::new(
            var("CHEF_SERVER_URL"),
            var("DELIVERY_API_URL"),
            var("DELIVERY_ENTERPRISE"),
            var("DELIVERY_USER"),
            var("DELIVERY_TOKEN"),
        );

        config.poll_interval = secs("PUSH_JOB_POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS);
        config.job_timeout = secs("PUSH_JOB_TIMEOUT", DEFAULT_JOB_TIMEOUT_SECS);

        if let Some(query) = lookup("DEPLOYMENT_SEARCH_QUERY").filter(|q| !q.is_empty()) {
            config.deployment_search_query = query;
        }
        if let Some(command) = lookup("DEPLOY_COMMAND").filter(|c| !c.is_empty()) {
            config.deploy_command = command;
        }

        config
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_url("chef_server_url", &self.chef_server_url)?;
        validate_url("delivery_api_url", &self.delivery_api_url)?;

        if self.enterprise.is_empty() {
            anyhow::bail!("enterprise cannot be empty");
        }

        if self.delivery_user.is_empty() {
            anyhow::bail!("delivery_user cannot be empty");
        }

        if self.delivery_token.is_empty() {
            anyhow::bail!("delivery_token cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.job_timeout.is_zero() {
            anyhow::bail!("job_timeout must be greater than 0");
        }

        if self.deploy_command.trim().is_empty() {
            anyhow::bail!("deploy_command cannot be empty");
        }

        Ok(())
    }
}

fn validate_url(field: &str, url: &str) -> anyhow::Result<()> {
    if url.is_empty() {
        anyhow::bail!("{} cannot be empty", field);
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", field);
    }

    Ok(())
}
