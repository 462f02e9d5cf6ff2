//! # cc-core
//!
//! Process supervision and server management for craftctl.
//!
//! This crate provides:
//! - A process supervisor with graceful and forced stop
//! - The on-disk server layout (one proxy, N backends)
//! - Persistent settings
//! - Jar downloads and start script provisioning
//! - A control service that executes front-end operations
//!
//! ## Modules
//!
//! - [`supervisor`]: Process registry and lifecycle operations
//! - [`layout`]: Server names, directories, ports and shutdown commands
//! - [`settings`]: JSON settings store
//! - [`fetch`]: Version catalog and artifact downloads
//! - [`provision`]: Directory setup, file checks and repair
//! - [`service`]: Op/Event control service

pub mod fetch;
pub mod layout;
pub mod provision;
pub mod service;
pub mod settings;
pub mod supervisor;
