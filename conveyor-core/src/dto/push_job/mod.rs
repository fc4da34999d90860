//! Push job DTOs

use serde::{Deserialize, Serialize};

/// Body of `POST /pushy/jobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePushJob {
    pub command: String,
    pub nodes: Vec<String>,
    /// Seconds the server lets the command run before timing the job out
    pub run_timeout: u64,
}

/// Response of `POST /pushy/jobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushJobLocator {
    #[serde(default)]
    pub uri: Option<String>,
}
