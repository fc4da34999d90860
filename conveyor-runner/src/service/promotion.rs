//! Promotion service
//!
//! Loads the environments a stage needs, applies the stage's transition
//! from `conveyor_core::promotion`, and saves the result. The save is always
//! the last call of a path, so a failure earlier leaves nothing persisted.
//!
//! Rehearsal performs two independent saves (union cleanup, then
//! rehearsal). A crash between them is harmless: the next run recomputes
//! from whatever is stored.

use conveyor_client::ClientError;
use conveyor_core::catalog::{ArtifactCatalog, declared_artifacts};
use conveyor_core::domain::change::{Change, Stage};
use conveyor_core::domain::environment::Environment;
use conveyor_core::promotion::{self, UnionPromotion};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::PromotionError;
use crate::repository::{BlockGate, EnvironmentStore};

/// What a promotion did to its target environment
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    /// The target was recomputed and saved
    Saved(Environment),
    /// The change was already promoted; the target was returned unmodified
    Skipped(Environment),
}

impl PromotionOutcome {
    pub fn environment(&self) -> &Environment {
        match self {
            PromotionOutcome::Saved(env) | PromotionOutcome::Skipped(env) => env,
        }
    }
}

/// Runs stage promotions against the environment store
pub struct PromotionService {
    store: Arc<dyn EnvironmentStore>,
    gate: Arc<dyn BlockGate>,
}

impl PromotionService {
    pub fn new(store: Arc<dyn EnvironmentStore>, gate: Arc<dyn BlockGate>) -> Self {
        Self { store, gate }
    }

    /// Promotes `change` into the environment owned by `stage`
    pub async fn promote(&self, stage: Stage, change: &Change) -> Result<PromotionOutcome, PromotionError> {
        info!(
            "Promoting {} for change {} ({} -> {})",
            stage,
            change.change_id,
            stage.source_environment(change),
            stage.target_environment(change)
        );

        match stage {
            Stage::Acceptance => self.promote_acceptance(change).await,
            Stage::Union => self.promote_union(change).await,
            Stage::Rehearsal => self.promote_rehearsal(change).await,
            Stage::Delivered => self.promote_delivered(change).await,
        }
    }

    async fn promote_acceptance(&self, change: &Change) -> Result<PromotionOutcome, PromotionError> {
        let stage = Stage::Acceptance;
        let union = self.load(stage, &stage.source_environment(change)).await?;
        let mut acceptance = self.load(stage, &stage.target_environment(change)).await?;

        let artifacts = ArtifactCatalog::new(&union).resolve(change);
        debug!(
            "Project {} owns cookbooks {:?} and applications {:?}",
            change.project, artifacts.cookbooks, artifacts.applications
        );

        promotion::acceptance(&mut acceptance, &union, &artifacts, &change.new_cookbook_pins);

        self.save(stage, &acceptance).await
    }

    async fn promote_union(&self, change: &Change) -> Result<PromotionOutcome, PromotionError> {
        let stage = Stage::Union;
        let mut union = self.load(stage, &stage.target_environment(change)).await?;

        if union.has_union_change(&change.change_id) {
            info!(
                "Change {} was already promoted to union, leaving it untouched",
                change.change_id
            );
            return Ok(PromotionOutcome::Skipped(union));
        }

        let acceptance = self.load(stage, &stage.source_environment(change)).await?;
        let artifacts = declared_artifacts(change);

        match promotion::union(&mut union, &acceptance, &change.change_id, &change.project, &artifacts) {
            UnionPromotion::AlreadyPromoted => Ok(PromotionOutcome::Skipped(union)),
            UnionPromotion::Promoted(found) => {
                info!(
                    "Promoted {} cookbook(s) and {} application(s) of {} to union",
                    found.cookbooks.len(),
                    found.applications.len(),
                    change.project
                );
                self.save(stage, &union).await
            }
        }
    }

    async fn promote_rehearsal(&self, change: &Change) -> Result<PromotionOutcome, PromotionError> {
        let stage = Stage::Rehearsal;
        let mut union = self.load(stage, &stage.source_environment(change)).await?;

        if promotion::cleanup_union(&mut union, &change.change_id) {
            debug!("Removing change {} from union changes", change.change_id);
            self.save(stage, &union).await?;
        }

        let blocked = self
            .gate
            .blocked_projects()
            .await
            .map_err(|source| {
                error!("{}: blocked projects query failed: {}", stage, source);
                PromotionError::BlockGate { stage, source }
            })?;

        let mut rehearsal = self.load(stage, &stage.target_environment(change)).await?;
        let report = promotion::rehearsal(&mut rehearsal, &union, &blocked);

        if report.fast_forwarded {
            info!("No projects blocked, fast-forwarding rehearsal to union");
        }
        for project in &report.skipped {
            warn!("Project {} is blocked, keeping its rehearsal pins", project);
        }
        for project in &report.promoted {
            debug!("Promoted {} from union to rehearsal", project);
        }

        self.save(stage, &rehearsal).await
    }

    async fn promote_delivered(&self, change: &Change) -> Result<PromotionOutcome, PromotionError> {
        let stage = Stage::Delivered;
        let rehearsal = self.load(stage, &stage.source_environment(change)).await?;
        let mut delivered = self.load(stage, &stage.target_environment(change)).await?;

        promotion::delivered(&mut delivered, &rehearsal);

        self.save(stage, &delivered).await
    }

    // =============================================================================
    // Store Helpers
    // =============================================================================

    async fn load(&self, stage: Stage, name: &str) -> Result<Environment, PromotionError> {
        self.store
            .load_or_create(name)
            .await
            .map_err(|source| store_error(stage, name, source))
    }

    async fn save(&self, stage: Stage, env: &Environment) -> Result<PromotionOutcome, PromotionError> {
        let saved = self
            .store
            .save(env)
            .await
            .map_err(|source| store_error(stage, &env.name, source))?;

        info!("Saved environment {}", saved.name);
        Ok(PromotionOutcome::Saved(saved))
    }
}

fn store_error(stage: Stage, environment: &str, source: ClientError) -> PromotionError {
    error!("{}: environment store failed on '{}': {}", stage, environment, source);
    PromotionError::Store {
        stage,
        environment: environment.to_string(),
        source,
    }
}
