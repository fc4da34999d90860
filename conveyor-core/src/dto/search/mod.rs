//! Node search DTOs

use serde::{Deserialize, Serialize};

/// One page of `GET /search/node`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSearchPage {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub rows: Vec<NodeRow>,
}

/// A search row; only the node name is read, the rest of the node is ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRow {
    pub name: String,
}
