//! Blocked projects DTOs

use serde::{Deserialize, Serialize};

/// Body of `GET /api/v0/e/{enterprise}/blocked_projects`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockedProjectsResponse {
    #[serde(default)]
    pub blocked_projects: Vec<String>,
}
