//! # cc-protocol
//!
//! Core protocol definitions and data models for craftctl.
//!
//! This crate defines all shared data structures used for:
//! - Launch descriptors and shutdown protocols for managed servers
//! - Runtime server state and liveness snapshots
//! - Inter-component communication between front-ends and Core
//!
//! ## Modules
//!
//! - [`launch_models`]: How a server is spawned and asked to stop
//! - [`server_models`]: Lifecycle states and status snapshots
//! - [`provision_models`]: Missing on-disk prerequisites
//! - [`ipc`]: Operations and Events for front-end/Core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other craftctl crates

pub mod ipc;
pub mod launch_models;
pub mod provision_models;
pub mod server_models;

// Re-export all public types for convenience
pub use ipc::*;
pub use launch_models::*;
pub use provision_models::*;
pub use server_models::*;
