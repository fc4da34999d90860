//! Conveyor HTTP Clients
//!
//! Type-safe HTTP clients for the two services the delivery pipeline talks to:
//!
//! - [`ChefServerClient`]: environments, push jobs and node search on a Chef
//!   server organization
//! - [`DeliveryClient`]: the Delivery API's blocked projects query
//!
//! # Example
//!
//! ```no_run
//! use conveyor_client::ChefServerClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ChefServerClient::new("https://chef.example.com/organizations/acme");
//!
//!     let union = client.get_environment("union").await?;
//!     println!("union pins {} cookbooks", union.cookbook_versions.len());
//!     Ok(())
//! }
//! ```

mod delivery;
mod environments;
pub mod error;
mod push_jobs;
mod search;

// Re-export commonly used types
pub use delivery::DeliveryClient;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for a Chef server organization
///
/// Endpoints are grouped by concern:
/// - Environment load, create and save
/// - Push job dispatch and status
/// - Node search
///
/// Requests are sent as built. Chef request signing, when required, is the
/// job of the `reqwest::Client` handed to [`ChefServerClient::with_client`]
/// (default headers) or of a signing proxy in front of the server.
#[derive(Debug, Clone)]
pub struct ChefServerClient {
    /// Organization base URL (e.g., "https://chef.example.com/organizations/acme")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ChefServerClient {
    /// Create a new Chef server client
    ///
    /// # Arguments
    /// * `base_url` - The organization URL of the Chef server
    ///
    /// # Example
    /// ```
    /// use conveyor_client::ChefServerClient;
    ///
    /// let client = ChefServerClient::new("https://chef.example.com/organizations/acme");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new Chef server client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, default headers, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use conveyor_client::ChefServerClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ChefServerClient::with_client("https://chef.example.com/organizations/acme", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the organization base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// This checks the status code and returns an appropriate error if the
/// request failed, or deserializes the response body if successful.
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}
