//! Test harness for scripted editor sessions.
//!
//! Drives the real scene, picking and targeting stack against the arena
//! kernel so multi-step interactions can be checked at every step.
//!
//! # Key Components
//!
//! - [`Workbench`] - Fluent API over a scene with named parts
//! - [`helpers`] - Error type, ray and point constructors
//! - [`assertions`] - Assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod workflow;

pub use helpers::HarnessError;
pub use workflow::Workbench;
