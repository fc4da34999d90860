//! Delivery API client
//!
//! Only the blocked projects query lives here. The Delivery API
//! authenticates with a user name and token sent as request headers.

use crate::error::{ClientError, Result};
use conveyor_core::dto::blocked_projects::BlockedProjectsResponse;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

/// Header carrying the Delivery API token
pub const TOKEN_HEADER: &str = "chef-delivery-token";
/// Header carrying the Delivery API user
pub const USER_HEADER: &str = "chef-delivery-user";

/// HTTP client for the Delivery API of one enterprise
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    base_url: String,
    enterprise: String,
    user: String,
    token: String,
    client: Client,
}

impl DeliveryClient {
    /// Create a new Delivery API client
    ///
    /// # Example
    /// ```
    /// use conveyor_client::DeliveryClient;
    ///
    /// let client = DeliveryClient::new("https://delivery.example.com", "acme", "builder", "s3cret");
    /// assert_eq!(client.blocked_projects_url(), "https://delivery.example.com/api/v0/e/acme/blocked_projects");
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        enterprise: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::with_client(base_url, enterprise, user, token, Client::new())
    }

    /// Create a new Delivery API client with a custom HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        enterprise: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            enterprise: enterprise.into(),
            user: user.into(),
            token: token.into(),
            client,
        }
    }

    pub fn blocked_projects_url(&self) -> String {
        format!(
            "{}/api/v0/e/{}/blocked_projects",
            self.base_url, self.enterprise
        )
    }

    /// List the projects currently blocked from promotion
    ///
    /// A 404 means the server predates blocking and yields an empty list.
    /// Any other non-200 status is a [`ClientError::BadApiResponse`].
    pub async fn blocked_projects(&self) -> Result<Vec<String>> {
        let url = self.blocked_projects_url();
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .header(USER_HEADER, &self.user)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        blocked_projects_from(status, &url, body)
    }
}

/// Map a blocked projects response onto the project list
fn blocked_projects_from(status: StatusCode, url: &str, body: String) -> Result<Vec<String>> {
    match status {
        StatusCode::OK => {
            let parsed: BlockedProjectsResponse = serde_json::from_str(&body).map_err(|e| {
                ClientError::ParseError(format!("Failed to parse blocked projects: {}", e))
            })?;
            Ok(parsed.blocked_projects)
        }
        StatusCode::NOT_FOUND => {
            info!("Blocked projects endpoint not available, assuming none are blocked");
            Ok(Vec::new())
        }
        status => {
            error!("Unexpected response {} from {}: {}", status, url, body);
            Err(ClientError::BadApiResponse {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            })
        }
    }
}
