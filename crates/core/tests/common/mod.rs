//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Fixtures (throwaway server scripts, scaffolded layouts, fast configs)
//! - Event assertions
//! - A mock artifact source and a recording signaller

pub mod assertions;
pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mocks::*;
