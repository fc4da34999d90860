//! Conveyor Core
//!
//! Core types and pure logic for the Conveyor delivery pipeline.
//!
//! This crate contains:
//! - Domain types: Environments, project artifact records, changes and push jobs
//! - DTOs: Wire payloads exchanged with the Chef server and the Delivery API
//! - Catalog: Resolution of which artifacts belong to a project
//! - Promotion: Stage-to-stage environment transitions (no I/O)

pub mod catalog;
pub mod domain;
pub mod dto;
pub mod promotion;
