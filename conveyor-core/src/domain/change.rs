//! Change and stage domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the shared environment a change is merged into after approval
pub const UNION_ENVIRONMENT: &str = "union";
/// Name of the environment that tracks union minus blocked projects
pub const REHEARSAL_ENVIRONMENT: &str = "rehearsal";
/// Name of the environment that tracks what was last delivered
pub const DELIVERED_ENVIRONMENT: &str = "delivered";

/// Pipeline stage a promotion runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Acceptance,
    Union,
    Rehearsal,
    Delivered,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Acceptance => "acceptance",
            Stage::Union => "union",
            Stage::Rehearsal => "rehearsal",
            Stage::Delivered => "delivered",
        }
    }

    /// Name of the environment this stage writes to
    pub fn target_environment(&self, change: &Change) -> String {
        match self {
            Stage::Acceptance => change.acceptance_environment(),
            Stage::Union => UNION_ENVIRONMENT.to_string(),
            Stage::Rehearsal => REHEARSAL_ENVIRONMENT.to_string(),
            Stage::Delivered => DELIVERED_ENVIRONMENT.to_string(),
        }
    }

    /// Name of the environment this stage reads pins from
    pub fn source_environment(&self, change: &Change) -> String {
        match self {
            Stage::Acceptance => UNION_ENVIRONMENT.to_string(),
            Stage::Union => change.acceptance_environment(),
            Stage::Rehearsal => UNION_ENVIRONMENT.to_string(),
            Stage::Delivered => REHEARSAL_ENVIRONMENT.to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "acceptance" => Ok(Stage::Acceptance),
            "union" => Ok(Stage::Union),
            "rehearsal" => Ok(Stage::Rehearsal),
            "delivered" => Ok(Stage::Delivered),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

/// A cookbook version produced by the change under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookbookPin {
    pub name: String,
    pub version: String,
}

impl CookbookPin {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl FromStr for CookbookPin {
    type Err = String;

    /// Parses `name=version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, version)) if !name.trim().is_empty() && !version.trim().is_empty() => {
                Ok(Self::new(name.trim(), version.trim()))
            }
            _ => Err(format!("expected name=version, got '{}'", s)),
        }
    }
}

/// The change being moved through the pipeline
///
/// Supplied by the pipeline driver. `project_cookbooks` and
/// `project_applications` are the artifact lists declared for the project;
/// `None` means the project did not declare any and the cached catalog or
/// the project-named default applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub change_id: String,
    pub enterprise: String,
    pub organization: String,
    pub project: String,
    pub pipeline: String,
    #[serde(default)]
    pub project_cookbooks: Option<Vec<String>>,
    #[serde(default)]
    pub project_applications: Option<Vec<String>>,
    #[serde(default)]
    pub new_cookbook_pins: Vec<CookbookPin>,
}

impl Change {
    /// Per-project acceptance environment name
    pub fn acceptance_environment(&self) -> String {
        format!(
            "acceptance-{}-{}-{}-{}",
            self.enterprise, self.organization, self.project, self.pipeline
        )
    }
}
