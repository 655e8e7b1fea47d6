//! Resolves a pointer ray into a 3D target point.
//!
//! The finder holds the active [`Constraint`] and the preferred snap lines
//! and points derived from it. Resolution walks a fixed precedence: snapped
//! points, then snapped lines, then a picked face, then a fallback plane or
//! line.

pub mod config;
pub mod constraint;
pub mod finder;
pub mod preferred;

pub use config::SnapConfig;
pub use constraint::Constraint;
pub use finder::{Target, TargetFinder};
