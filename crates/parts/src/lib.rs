//! Editable joinery parts and the interactions that change them.
//!
//! A [`Part`] is a rectangular board owning its kernel box and indexed
//! geometry. Movers translate or stretch a part under a constraint derived
//! from the grabbed entity; a [`DragSession`] feeds them targets resolved by
//! the target finder. The [`Scene`] ties parts, picking, targeting and frame
//! scheduling together.

pub mod camera;
pub mod config;
pub mod drag;
pub mod drawing;
pub mod error;
pub mod movers;
pub mod part;
pub mod scene;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::{Camera, Projection};
pub use config::EditorConfig;
pub use drag::DragSession;
pub use drawing::{CollectorState, PointCollector};
pub use error::PartError;
pub use movers::{Grab, GrabbedEntity, MovementConstraint, Mover, PlainMover, StretchMode, Stretcher};
pub use part::{Part, PartId, PartSnapshot, PartVertex};
pub use scene::{DragKind, Frame, FrameScheduler, Scene};
