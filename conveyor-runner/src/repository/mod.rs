//! Repository layer
//!
//! Repositories are thin adapters over the remote services the pipeline
//! depends on: the environment store, the blocked projects gate, the push
//! job API and node search. They carry no business logic.
//!
//! All repositories are trait-based so services can be tested against
//! in-memory implementations.

mod blocked;
mod environments;
#[cfg(test)]
pub mod memory;
mod nodes;
mod push_jobs;

// Re-export traits
pub use blocked::BlockGate;
pub use environments::EnvironmentStore;
pub use nodes::NodeResolver;
pub use push_jobs::PushJobApi;

// Re-export implementations
pub use blocked::HttpBlockGate;
pub use environments::HttpEnvironmentStore;
pub use nodes::HttpNodeResolver;
pub use push_jobs::HttpPushJobApi;
