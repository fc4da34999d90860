//! Stage-to-stage promotion transitions
//!
//! Each function takes the environment a stage writes to plus the
//! environments it reads from and moves the target to its next state in
//! place. Nothing here touches the network; loading and saving is the
//! runner's job.

use crate::catalog::ArtifactCatalog;
use crate::domain::change::CookbookPin;
use crate::domain::environment::{Environment, ProjectArtifacts};

/// Result of promoting a change into union
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionPromotion {
    /// The change id was already recorded; union was left untouched
    AlreadyPromoted,
    /// The change was merged; holds the artifacts that were found in acceptance
    Promoted(ProjectArtifacts),
}

/// What a rehearsal promotion did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RehearsalReport {
    /// No project was blocked, so rehearsal was fast-forwarded to union
    pub fast_forwarded: bool,
    /// Projects whose pins were copied individually
    pub promoted: Vec<String>,
    /// Blocked projects whose rehearsal pins were left alone
    pub skipped: Vec<String>,
}

/// Makes acceptance look like union, except for the project under test
///
/// The project's own pins are snapshotted from acceptance before the copy
/// and restored afterwards, then the change's freshly built cookbook pins
/// are applied on top.
pub fn acceptance(
    acceptance: &mut Environment,
    union: &Environment,
    project: &ProjectArtifacts,
    new_pins: &[CookbookPin],
) {
    let cookbook_snapshot: Vec<(String, String)> = project
        .cookbooks
        .iter()
        .filter_map(|cb| {
            acceptance
                .cookbook_version(cb)
                .map(|version| (cb.clone(), version.to_string()))
        })
        .collect();
    let application_snapshot: Vec<(String, String)> = project
        .applications
        .iter()
        .filter_map(|app| {
            acceptance
                .application_version(app)
                .map(|version| (app.clone(), version.to_string()))
        })
        .collect();

    acceptance.cookbook_versions = union.cookbook_versions.clone();
    acceptance.merge_applications_from(union);

    for (cookbook, version) in cookbook_snapshot {
        acceptance.pin_cookbook(cookbook, version);
    }
    for (application, version) in application_snapshot {
        acceptance.pin_application(application, version);
    }

    for pin in new_pins {
        acceptance.pin_cookbook(pin.name.clone(), pin.version.clone());
    }
}

/// Promotes a project's pins from acceptance into union, once per change
pub fn union(
    union: &mut Environment,
    acceptance: &Environment,
    change_id: &str,
    project: &str,
    artifacts: &ProjectArtifacts,
) -> UnionPromotion {
    if !union.record_union_change(change_id) {
        return UnionPromotion::AlreadyPromoted;
    }

    let found = copy_pins(union, acceptance, artifacts);
    union.set_project_record(project, &found);

    UnionPromotion::Promoted(found)
}

/// Forgets a change id once it has moved past union
///
/// Returns `true` if the id was recorded.
pub fn cleanup_union(union: &mut Environment, change_id: &str) -> bool {
    union.remove_union_change(change_id)
}

/// Moves rehearsal towards union, leaving blocked projects where they are
pub fn rehearsal(
    rehearsal: &mut Environment,
    union: &Environment,
    blocked: &[String],
) -> RehearsalReport {
    if blocked.is_empty() {
        fast_forward(rehearsal, union);
        return RehearsalReport {
            fast_forwarded: true,
            ..Default::default()
        };
    }

    let (eligible, skipped) = ArtifactCatalog::new(union).partition(blocked);
    let mut promoted = Vec::with_capacity(eligible.len());

    for (project, artifacts) in eligible {
        copy_pins(rehearsal, union, &artifacts);
        rehearsal.set_project_record(project.clone(), &artifacts);
        promoted.push(project);
    }

    RehearsalReport {
        fast_forwarded: false,
        promoted,
        skipped,
    }
}

/// Unconditionally promotes everything in rehearsal to delivered
pub fn delivered(delivered: &mut Environment, rehearsal: &Environment) {
    fast_forward(delivered, rehearsal);
}

/// Replaces cookbook pins and one-level merges both attribute trees
fn fast_forward(target: &mut Environment, source: &Environment) {
    target.cookbook_versions = source.cookbook_versions.clone();
    target.merge_attributes_from(source);
}

/// Copies the listed pins that exist in `source`, returning those it found
fn copy_pins(target: &mut Environment, source: &Environment, artifacts: &ProjectArtifacts) -> ProjectArtifacts {
    let mut found = ProjectArtifacts::default();

    for cookbook in &artifacts.cookbooks {
        if let Some(version) = source.cookbook_version(cookbook) {
            target.pin_cookbook(cookbook.clone(), version);
            found.cookbooks.push(cookbook.clone());
        }
    }

    for application in &artifacts.applications {
        if let Some(version) = source.application_version(application) {
            target.pin_application(application.clone(), version);
            found.applications.push(application.clone());
        }
    }

    found
}
