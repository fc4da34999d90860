//! Environment domain types
//!
//! An environment is the remotely stored record of one pipeline stage's
//! deployed state: cookbook pins plus two attribute trees. The attribute
//! trees are free-form JSON; the sub-trees the pipeline owns are reached
//! through the typed accessors below, and everything else round-trips
//! untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute key holding the pipeline's own sub-tree in `default_attributes`
const DELIVERY_KEY: &str = "delivery";
/// Key under `delivery` holding the per-project artifact catalog
const PROJECT_ARTIFACTS_KEY: &str = "project_artifacts";
/// Key under `delivery` holding change ids already merged into union
const UNION_CHANGES_KEY: &str = "union_changes";
/// Key in `override_attributes` holding application version pins
const APPLICATIONS_KEY: &str = "applications";

/// A named environment record as stored on the Chef server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cookbook_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub default_attributes: Map<String, Value>,
    #[serde(default)]
    pub override_attributes: Map<String, Value>,
    #[serde(default = "default_json_class")]
    pub json_class: String,
    #[serde(default = "default_chef_type")]
    pub chef_type: String,
}

fn default_json_class() -> String {
    "Chef::Environment".to_string()
}

fn default_chef_type() -> String {
    "environment".to_string()
}

/// Cookbooks and applications owned by one project
///
/// Both lists are always present once a record is written; records missing
/// either key read back as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectArtifacts {
    #[serde(default)]
    pub cookbooks: Vec<String>,
    #[serde(default)]
    pub applications: Vec<String>,
}

impl ProjectArtifacts {
    pub fn new(cookbooks: Vec<String>, applications: Vec<String>) -> Self {
        Self {
            cookbooks,
            applications,
        }
    }
}

impl Environment {
    /// Creates an empty environment with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("Conveyor managed environment {}", name),
            name,
            cookbook_versions: BTreeMap::new(),
            default_attributes: Map::new(),
            override_attributes: Map::new(),
            json_class: default_json_class(),
            chef_type: default_chef_type(),
        }
    }

    // =============================================================================
    // Cookbook Pins
    // =============================================================================

    pub fn cookbook_version(&self, cookbook: &str) -> Option<&str> {
        self.cookbook_versions.get(cookbook).map(String::as_str)
    }

    pub fn pin_cookbook(&mut self, cookbook: impl Into<String>, version: impl Into<String>) {
        self.cookbook_versions.insert(cookbook.into(), version.into());
    }

    // =============================================================================
    // Application Pins
    // =============================================================================

    pub fn application_version(&self, application: &str) -> Option<&str> {
        self.override_attributes
            .get(APPLICATIONS_KEY)
            .and_then(|apps| apps.get(application))
            .and_then(Value::as_str)
    }

    pub fn pin_application(&mut self, application: impl Into<String>, version: impl Into<String>) {
        if let Some(apps) = object_entry(&mut self.override_attributes, APPLICATIONS_KEY) {
            apps.insert(application.into(), Value::String(version.into()));
        }
    }

    /// Merges another environment's application pins into this one
    ///
    /// The other environment wins on collision; pins only present here stay.
    pub fn merge_applications_from(&mut self, other: &Environment) {
        let Some(source) = other
            .override_attributes
            .get(APPLICATIONS_KEY)
            .and_then(Value::as_object)
        else {
            return;
        };

        if let Some(apps) = object_entry(&mut self.override_attributes, APPLICATIONS_KEY) {
            for (name, version) in source {
                apps.insert(name.clone(), version.clone());
            }
        }
    }

    // =============================================================================
    // Attribute Trees
    // =============================================================================

    /// One-level merge of both attribute trees from `source`
    ///
    /// Top-level keys from `source` replace the same keys here wholesale;
    /// top-level keys only present here are kept.
    pub fn merge_attributes_from(&mut self, source: &Environment) {
        for (key, value) in &source.default_attributes {
            self.default_attributes.insert(key.clone(), value.clone());
        }
        for (key, value) in &source.override_attributes {
            self.override_attributes.insert(key.clone(), value.clone());
        }
    }

    // =============================================================================
    // Project Artifact Catalog
    // =============================================================================

    /// All project records under `delivery.project_artifacts`
    ///
    /// Records that cannot be read as a [`ProjectArtifacts`] are skipped.
    pub fn project_artifacts(&self) -> BTreeMap<String, ProjectArtifacts> {
        self.delivery()
            .and_then(|delivery| delivery.get(PROJECT_ARTIFACTS_KEY))
            .and_then(Value::as_object)
            .map(|projects| {
                projects
                    .iter()
                    .filter_map(|(project, record)| {
                        serde_json::from_value::<ProjectArtifacts>(record.clone())
                            .ok()
                            .map(|artifacts| (project.clone(), artifacts))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn project_record(&self, project: &str) -> Option<ProjectArtifacts> {
        self.delivery()
            .and_then(|delivery| delivery.get(PROJECT_ARTIFACTS_KEY))
            .and_then(|projects| projects.get(project))
            .and_then(|record| serde_json::from_value(record.clone()).ok())
    }

    pub fn set_project_record(&mut self, project: impl Into<String>, artifacts: &ProjectArtifacts) {
        let projects = object_entry(&mut self.default_attributes, DELIVERY_KEY)
            .and_then(|delivery| object_entry(delivery, PROJECT_ARTIFACTS_KEY));
        if let Some(projects) = projects {
            projects.insert(
                project.into(),
                serde_json::json!({
                    "cookbooks": artifacts.cookbooks,
                    "applications": artifacts.applications,
                }),
            );
        }
    }

    // =============================================================================
    // Union Change Guard
    // =============================================================================

    /// Change ids recorded in `delivery.union_changes`
    pub fn union_changes(&self) -> Vec<String> {
        self.delivery()
            .and_then(|delivery| delivery.get(UNION_CHANGES_KEY))
            .and_then(Value::as_array)
            .map(|changes| {
                changes
                    .iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_union_change(&self, change_id: &str) -> bool {
        self.union_changes().iter().any(|c| c == change_id)
    }

    /// Records a change id, returning `false` if it was already present
    pub fn record_union_change(&mut self, change_id: &str) -> bool {
        if self.has_union_change(change_id) {
            return false;
        }

        let changes = object_entry(&mut self.default_attributes, DELIVERY_KEY)
            .and_then(|delivery| array_entry(delivery, UNION_CHANGES_KEY));
        match changes {
            Some(changes) => {
                changes.push(Value::String(change_id.to_string()));
                true
            }
            None => false,
        }
    }

    /// Removes a change id, returning `true` if it was present
    pub fn remove_union_change(&mut self, change_id: &str) -> bool {
        if !self.has_union_change(change_id) {
            return false;
        }

        let changes = object_entry(&mut self.default_attributes, DELIVERY_KEY)
            .and_then(|delivery| array_entry(delivery, UNION_CHANGES_KEY));
        if let Some(changes) = changes {
            changes.retain(|c| c.as_str() != Some(change_id));
        }
        true
    }

    fn delivery(&self) -> Option<&Map<String, Value>> {
        self.default_attributes
            .get(DELIVERY_KEY)
            .and_then(Value::as_object)
    }
}

/// Returns the object stored under `key`, replacing any non-object value
fn object_entry<'a>(
    tree: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let slot = tree
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
}

/// Returns the array stored under `key`, replacing any non-array value
fn array_entry<'a>(tree: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Vec<Value>> {
    let slot = tree
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut()
}
