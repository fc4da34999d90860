//! Environments repository
//!
//! Load, create and save named environment records.
//!
//! The store offers no locking or conditional writes. Two pipeline runs
//! promoting into the same environment race on read-modify-write and the
//! last save wins.

use async_trait::async_trait;
use conveyor_client::{ChefServerClient, Result};
use conveyor_core::domain::environment::Environment;
use tracing::info;

/// Repository trait for environment records
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Loads an environment
    ///
    /// A missing environment is an error for which
    /// [`ClientError::is_not_found`](conveyor_client::ClientError::is_not_found) holds.
    async fn load(&self, name: &str) -> Result<Environment>;

    /// Creates an empty environment
    async fn create(&self, name: &str) -> Result<Environment>;

    /// Saves an environment, replacing the stored record
    async fn save(&self, env: &Environment) -> Result<Environment>;

    /// Loads an environment, creating it if it does not exist yet
    async fn load_or_create(&self, name: &str) -> Result<Environment> {
        match self.load(name).await {
            Ok(env) => Ok(env),
            Err(e) if e.is_not_found() => {
                info!("Environment '{}' not found, creating it", name);
                self.create(name).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Chef server implementation of EnvironmentStore
pub struct HttpEnvironmentStore {
    client: ChefServerClient,
}

impl HttpEnvironmentStore {
    pub fn new(client: ChefServerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnvironmentStore for HttpEnvironmentStore {
    async fn load(&self, name: &str) -> Result<Environment> {
        self.client.get_environment(name).await
    }

    async fn create(&self, name: &str) -> Result<Environment> {
        self.client.create_environment(&Environment::new(name)).await
    }

    async fn save(&self, env: &Environment) -> Result<Environment> {
        self.client.update_environment(env).await
    }
}
