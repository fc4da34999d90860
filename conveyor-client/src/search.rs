//! Search API endpoints

use crate::error::Result;
use crate::{ChefServerClient, handle_response};
use conveyor_core::dto::search::NodeSearchPage;
use tracing::debug;

/// Rows requested per search page
const PAGE_SIZE: usize = 1000;

impl ChefServerClient {
    // =============================================================================
    // Node Search
    // =============================================================================

    /// Find node names matching a search query
    ///
    /// Follows pagination until every row has been read.
    ///
    /// # Example
    /// ```no_run
    /// # use conveyor_client::ChefServerClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ChefServerClient::new("https://chef.example.com/organizations/acme");
    /// let nodes = client
    ///     .search_nodes("recipes:web* AND chef_environment:rehearsal")
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_nodes(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}/search/node", self.base_url);
        let mut names = Vec::new();
        let mut start = 0;

        loop {
            debug!("GET {} q={} start={}", url, query, start);
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("q", query.to_string()),
                    ("start", start.to_string()),
                    ("rows", PAGE_SIZE.to_string()),
                ])
                .send()
                .await?;

            let page: NodeSearchPage = handle_response(response).await?;
            let fetched = page.rows.len();
            names.extend(page.rows.into_iter().map(|row| row.name));
            start += fetched;

            if fetched == 0 || start >= page.total {
                break;
            }
        }

        Ok(names)
    }
}
