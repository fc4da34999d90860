//! Scheduler layer for the runner
//!
//! This layer drives remote push jobs: it dispatches a command to a node set
//! and polls the Chef server until the job succeeds, fails or runs past its
//! deadline.

pub mod poller;

pub use poller::JobPoller;
