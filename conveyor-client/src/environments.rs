//! Environment API endpoints

use crate::error::Result;
use crate::{ChefServerClient, handle_response};
use conveyor_core::domain::environment::Environment;
use tracing::debug;

impl ChefServerClient {
    // =============================================================================
    // Environments
    // =============================================================================

    /// Get an environment by name
    ///
    /// A missing environment comes back as an `ApiError` with status 404;
    /// check it with [`ClientError::is_not_found`](crate::ClientError::is_not_found).
    ///
    /// # Example
    /// ```no_run
    /// # use conveyor_client::ChefServerClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ChefServerClient::new("https://chef.example.com/organizations/acme");
    /// match client.get_environment("rehearsal").await {
    ///     Ok(env) => println!("{} pins", env.cookbook_versions.len()),
    ///     Err(e) if e.is_not_found() => println!("not created yet"),
    ///     Err(e) => return Err(e.into()),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_environment(&self, name: &str) -> Result<Environment> {
        let url = format!("{}/environments/{}", self.base_url, name);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// Create an environment
    ///
    /// # Returns
    /// The environment as sent; the server only answers with its URI
    pub async fn create_environment(&self, env: &Environment) -> Result<Environment> {
        let url = format!("{}/environments", self.base_url);
        debug!("POST {} ({})", url, env.name);
        let response = self.client.post(&url).json(env).send().await?;

        let _created: serde_json::Value = handle_response(response).await?;
        Ok(env.clone())
    }

    /// Replace an environment
    ///
    /// # Returns
    /// The environment as stored by the server
    pub async fn update_environment(&self, env: &Environment) -> Result<Environment> {
        let url = format!("{}/environments/{}", self.base_url, env.name);
        debug!("PUT {}", url);
        let response = self.client.put(&url).json(env).send().await?;

        handle_response(response).await
    }
}
