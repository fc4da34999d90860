//! Blocked projects repository

use async_trait::async_trait;
use conveyor_client::{DeliveryClient, Result};

/// Repository trait for the blocked projects policy
#[async_trait]
pub trait BlockGate: Send + Sync {
    /// Names of the projects currently excluded from promotion
    async fn blocked_projects(&self) -> Result<Vec<String>>;
}

/// Delivery API implementation of BlockGate
pub struct HttpBlockGate {
    client: DeliveryClient,
}

impl HttpBlockGate {
    pub fn new(client: DeliveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlockGate for HttpBlockGate {
    async fn blocked_projects(&self) -> Result<Vec<String>> {
        self.client.blocked_projects().await
    }
}
