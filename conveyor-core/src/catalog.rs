//! Project artifact catalog
//!
//! The union environment caches, per project, the cookbooks and applications
//! the project last promoted. Acceptance uses it to know which pins belong to
//! the project under test when the project declares none, and rehearsal uses
//! it to decide which pins a blocked project keeps.

use std::collections::{BTreeMap, HashSet};

use crate::domain::change::Change;
use crate::domain::environment::{Environment, ProjectArtifacts};

/// Artifacts a project declared for itself
///
/// Cookbooks default to a single cookbook named after the project,
/// applications default to none.
pub fn declared_artifacts(change: &Change) -> ProjectArtifacts {
    ProjectArtifacts::new(
        change
            .project_cookbooks
            .clone()
            .unwrap_or_else(|| vec![change.project.clone()]),
        change.project_applications.clone().unwrap_or_default(),
    )
}

/// Read view over the catalog cached in an environment
#[derive(Debug, Clone, Copy)]
pub struct ArtifactCatalog<'a> {
    env: &'a Environment,
}

impl<'a> ArtifactCatalog<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    pub fn projects(&self) -> BTreeMap<String, ProjectArtifacts> {
        self.env.project_artifacts()
    }

    pub fn lookup(&self, project: &str) -> Option<ProjectArtifacts> {
        self.env.project_record(project)
    }

    /// Artifacts owned by the change's project
    ///
    /// Each list is resolved on its own: the declared list wins, otherwise
    /// the cached record's list, otherwise the project-named default.
    pub fn resolve(&self, change: &Change) -> ProjectArtifacts {
        let cached = self.lookup(&change.project);

        let cookbooks = change
            .project_cookbooks
            .clone()
            .or_else(|| cached.as_ref().map(|record| record.cookbooks.clone()))
            .unwrap_or_else(|| vec![change.project.clone()]);
        let applications = change
            .project_applications
            .clone()
            .or_else(|| cached.map(|record| record.applications))
            .unwrap_or_default();

        ProjectArtifacts::new(cookbooks, applications)
    }

    /// Splits cached projects into those eligible for promotion and those blocked
    pub fn partition(&self, blocked: &[String]) -> (BTreeMap<String, ProjectArtifacts>, Vec<String>) {
        let blocked: HashSet<&str> = blocked.iter().map(String::as_str).collect();
        let mut eligible = BTreeMap::new();
        let mut skipped = Vec::new();

        for (project, artifacts) in self.projects() {
            if blocked.contains(project.as_str()) {
                skipped.push(project);
            } else {
                eligible.insert(project, artifacts);
            }
        }

        (eligible, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(cookbooks: Option<&[&str]>, apps: Option<&[&str]>) -> Change {
        Change {
            change_id: "c1".to_string(),
            enterprise: "ent".to_string(),
            organization: "org".to_string(),
            project: "web".to_string(),
            pipeline: "master".to_string(),
            project_cookbooks: cookbooks.map(|c| c.iter().map(|s| s.to_string()).collect()),
            project_applications: apps.map(|a| a.iter().map(|s| s.to_string()).collect()),
            new_cookbook_pins: vec![],
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_declared_defaults_to_project_cookbook() {
        let artifacts = declared_artifacts(&change(None, None));
        assert_eq!(artifacts.cookbooks, strings(&["web"]));
        assert!(artifacts.applications.is_empty());
    }

    #[test]
    fn test_declared_empty_list_is_kept() {
        let artifacts = declared_artifacts(&change(Some(&[]), None));
        assert!(artifacts.cookbooks.is_empty());
    }

    #[test]
    fn test_resolve_prefers_declared_over_cache() {
        let mut union = Environment::new("union");
        union.set_project_record("web", &ProjectArtifacts::new(strings(&["old"]), vec![]));
        let catalog = ArtifactCatalog::new(&union);

        let artifacts = catalog.resolve(&change(Some(&["apache2", "web"]), Some(&["site"])));
        assert_eq!(artifacts.cookbooks, strings(&["apache2", "web"]));
        assert_eq!(artifacts.applications, strings(&["site"]));
    }

    #[test]
    fn test_resolve_falls_back_to_cache_then_default() {
        let mut union = Environment::new("union");
        union.set_project_record(
            "web",
            &ProjectArtifacts::new(strings(&["apache2"]), strings(&["site"])),
        );

        let cached = ArtifactCatalog::new(&union).resolve(&change(None, None));
        assert_eq!(cached.cookbooks, strings(&["apache2"]));
        assert_eq!(cached.applications, strings(&["site"]));

        let empty = Environment::new("union");
        let fallback = ArtifactCatalog::new(&empty).resolve(&change(None, None));
        assert_eq!(fallback.cookbooks, strings(&["web"]));
    }

    #[test]
    fn test_resolve_falls_back_per_list() {
        let mut union = Environment::new("union");
        union.set_project_record(
            "web",
            &ProjectArtifacts::new(strings(&["apache2"]), strings(&["site"])),
        );
        let catalog = ArtifactCatalog::new(&union);

        let only_cookbooks = catalog.resolve(&change(Some(&["nginx"]), None));
        assert_eq!(only_cookbooks.cookbooks, strings(&["nginx"]));
        assert_eq!(only_cookbooks.applications, strings(&["site"]));

        let only_apps = catalog.resolve(&change(None, Some(&[])));
        assert_eq!(only_apps.cookbooks, strings(&["apache2"]));
        assert!(only_apps.applications.is_empty());

        let empty = Environment::new("union");
        let uncached = ArtifactCatalog::new(&empty).resolve(&change(None, Some(&["site"])));
        assert_eq!(uncached.cookbooks, strings(&["web"]));
        assert_eq!(uncached.applications, strings(&["site"]));
    }

    #[test]
    fn test_partition_skips_blocked_projects() {
        let mut union = Environment::new("union");
        union.set_project_record("web", &ProjectArtifacts::new(strings(&["c1"]), vec![]));
        union.set_project_record("db", &ProjectArtifacts::new(strings(&["c2"]), vec![]));

        let (eligible, skipped) = ArtifactCatalog::new(&union).partition(&strings(&["web", "ghost"]));

        assert_eq!(eligible.keys().collect::<Vec<_>>(), vec!["db"]);
        assert_eq!(skipped, strings(&["web"]));
    }
}
