//! Node resolution repository

use async_trait::async_trait;
use conveyor_client::{ChefServerClient, Result};

/// Repository trait for turning a search query into node names
#[async_trait]
pub trait NodeResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Vec<String>>;
}

/// Chef search implementation of NodeResolver
pub struct HttpNodeResolver {
    client: ChefServerClient,
}

impl HttpNodeResolver {
    pub fn new(client: ChefServerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeResolver for HttpNodeResolver {
    async fn resolve(&self, query: &str) -> Result<Vec<String>> {
        self.client.search_nodes(query).await
    }
}
