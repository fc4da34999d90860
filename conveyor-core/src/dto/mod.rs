//! Data Transfer Objects for the remote services
//!
//! Request and response bodies for the Chef server (push jobs, node search)
//! and the Delivery API (blocked projects). Environments travel as their
//! domain type.

pub mod blocked_projects;
pub mod push_job;
pub mod search;
