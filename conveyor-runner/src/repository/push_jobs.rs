//! Push jobs repository

use async_trait::async_trait;
use conveyor_client::{ChefServerClient, Result};
use conveyor_core::domain::push_job::PushJobRecord;
use conveyor_core::dto::push_job::CreatePushJob;

/// Repository trait for the push jobs API
#[async_trait]
pub trait PushJobApi: Send + Sync {
    /// Starts a job and returns its URI
    async fn start(&self, req: &CreatePushJob) -> Result<String>;

    /// Fetches the current job record
    async fn fetch(&self, uri: &str) -> Result<PushJobRecord>;
}

/// Chef server implementation of PushJobApi
pub struct HttpPushJobApi {
    client: ChefServerClient,
}

impl HttpPushJobApi {
    pub fn new(client: ChefServerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushJobApi for HttpPushJobApi {
    async fn start(&self, req: &CreatePushJob) -> Result<String> {
        self.client.start_push_job(req).await
    }

    async fn fetch(&self, uri: &str) -> Result<PushJobRecord> {
        self.client.get_push_job(uri).await
    }
}
