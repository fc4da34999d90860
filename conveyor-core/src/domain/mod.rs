//! Core domain types
//!
//! This module contains the domain structures shared by the client (which
//! moves them over the wire) and the runner (which promotes and deploys them).

pub mod change;
pub mod environment;
pub mod push_job;
