//! Push job API endpoints

use crate::error::{ClientError, Result};
use crate::{ChefServerClient, handle_response};
use conveyor_core::domain::push_job::PushJobRecord;
use conveyor_core::dto::push_job::{CreatePushJob, PushJobLocator};
use tracing::debug;

impl ChefServerClient {
    // =============================================================================
    // Push Jobs
    // =============================================================================

    /// Start a push job
    ///
    /// # Returns
    /// The job URI to poll
    ///
    /// # Example
    /// ```no_run
    /// # use conveyor_client::ChefServerClient;
    /// # use conveyor_core::dto::push_job::CreatePushJob;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ChefServerClient::new("https://chef.example.com/organizations/acme");
    /// let uri = client.start_push_job(&CreatePushJob {
    ///     command: "chef-client".to_string(),
    ///     nodes: vec!["web1".to_string(), "web2".to_string()],
    ///     run_timeout: 1800,
    /// }).await?;
    /// println!("job at {}", uri);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_push_job(&self, req: &CreatePushJob) -> Result<String> {
        let url = format!("{}/pushy/jobs", self.base_url);
        debug!("POST {} ({} nodes)", url, req.nodes.len());
        let response = self.client.post(&url).json(req).send().await?;

        let locator: PushJobLocator = handle_response(response).await?;
        locator
            .uri
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| ClientError::ParseError("push job response carried no uri".to_string()))
    }

    /// Get the current state of a push job
    ///
    /// # Arguments
    /// * `uri` - The absolute job URI returned by [`start_push_job`](Self::start_push_job)
    pub async fn get_push_job(&self, uri: &str) -> Result<PushJobRecord> {
        debug!("GET {}", uri);
        let response = self.client.get(uri).send().await?;

        handle_response(response).await
    }
}
