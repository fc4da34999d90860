//! Service layer
//!
//! Services contain the runner's business logic. They orchestrate
//! operations using repositories: promoting changes between stage
//! environments and deploying to the nodes of an environment.

mod deploy;
mod promotion;

pub use deploy::{DeployOutcome, DeployService};
pub use promotion::{PromotionOutcome, PromotionService};
