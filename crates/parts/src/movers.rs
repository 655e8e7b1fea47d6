//! Movers turn drag deltas into part edits.
//!
//! Every mover snapshots the part when it is created and recomputes the part
//! from that snapshot and the accumulated displacement on each step, so
//! clamping never drifts and `cancel` is exact.

use serde::{Deserialize, Serialize};
use tracing::debug;

use joinery_kernel::{Line, Plane, Point3, Vector3};
use target_finder::Constraint;
use topo_index::{EntityRef, HitGeometry, Intersection};

use crate::error::PartError;
use crate::part::{Part, PartSnapshot};

// ─── Grabs ───────────────────────────────────────────────────────────────────

/// The kind of entity under the pointer when a drag started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GrabbedEntity {
    Face { normal: Vector3 },
    Edge { direction: Vector3 },
    Vertex,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grab {
    pub entity: GrabbedEntity,
    /// World point where the drag started.
    pub point: Point3,
}

impl Grab {
    /// Grab for a pick result. `None` for degenerate primitives.
    pub fn from_hit<K>(hit: &Intersection<K>) -> Option<Self> {
        let entity = match (hit.entity, hit.geometry) {
            (EntityRef::Face(_), geometry) => GrabbedEntity::Face {
                normal: geometry.plane()?.normal,
            },
            (EntityRef::Edge(_), geometry) => GrabbedEntity::Edge {
                direction: geometry.line()?.direction,
            },
            (EntityRef::Vertex(_), _) => GrabbedEntity::Vertex,
        };
        let point = match hit.geometry {
            HitGeometry::Point(p) => p,
            _ => hit.point,
        };
        Some(Self { entity, point })
    }
}

// ─── Constraints ─────────────────────────────────────────────────────────────

/// Where a mover lets the grab point travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementConstraint {
    None,
    Line(Line),
    Plane(Plane),
}

impl MovementConstraint {
    /// The target-finder constraint for this movement, anchored at the grab
    /// point.
    pub fn to_target_constraint(&self, anchor: Point3) -> Constraint {
        match self {
            MovementConstraint::None => Constraint::NearPoint(anchor),
            MovementConstraint::Line(line) => Constraint::OnLine { line: *line, anchor },
            MovementConstraint::Plane(plane) => Constraint::OnPlane { plane: *plane, anchor },
        }
    }
}

/// A drag behaviour over one part.
pub trait Mover {
    fn grab(&self) -> &Grab;

    fn movement_constraint(&self) -> MovementConstraint;

    /// Move the grab point by `delta`, on top of all previous deltas.
    fn apply(&mut self, part: &mut Part, delta: &Vector3) -> Result<(), PartError>;

    /// Put the part back exactly as it was when the mover was created.
    fn cancel(&mut self, part: &mut Part) -> Result<(), PartError>;
}

// ─── Plain Move ──────────────────────────────────────────────────────────────

/// Translates the whole part.
#[derive(Debug, Clone)]
pub struct PlainMover {
    grab: Grab,
    snapshot: PartSnapshot,
    total: Vector3,
}

impl PlainMover {
    pub fn new(part: &Part, grab: Grab) -> Self {
        Self {
            grab,
            snapshot: part.snapshot(),
            total: Vector3::zeros(),
        }
    }
}

impl Mover for PlainMover {
    fn grab(&self) -> &Grab {
        &self.grab
    }

    fn movement_constraint(&self) -> MovementConstraint {
        match self.grab.entity {
            GrabbedEntity::Face { normal } => Plane::new(self.grab.point, normal)
                .map_or(MovementConstraint::None, MovementConstraint::Plane),
            GrabbedEntity::Edge { .. } | GrabbedEntity::Vertex => MovementConstraint::None,
        }
    }

    fn apply(&mut self, part: &mut Part, delta: &Vector3) -> Result<(), PartError> {
        self.total += delta;
        part.set_position(self.snapshot.position + self.total);
        Ok(())
    }

    fn cancel(&mut self, part: &mut Part) -> Result<(), PartError> {
        self.total = Vector3::zeros();
        part.restore(&self.snapshot)
    }
}

// ─── Stretch ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StretchMode {
    /// The side opposite the grab stays in place.
    #[default]
    OppositeFixed,
    /// Both sides move so the centre stays in place.
    Symmetric,
}

/// Local axis most aligned with `v`.
fn dominant_axis(v: &Vector3) -> usize {
    v.iamax()
}

/// Resizes the part along the axes the grabbed entity faces.
#[derive(Debug, Clone)]
pub struct Stretcher {
    grab: Grab,
    mode: StretchMode,
    snapshot: PartSnapshot,
    /// +1 where the grab sits on the max side of an axis, -1 otherwise.
    sign: Vector3,
    active: [bool; 3],
    total: Vector3,
}

impl Stretcher {
    pub fn new(part: &Part, grab: Grab, mode: StretchMode) -> Self {
        let snapshot = part.snapshot();
        let local = part.to_local(&grab.point);
        let sign = Vector3::from_fn(|i, _| if local[i] >= snapshot.size[i] / 2.0 { 1.0 } else { -1.0 });
        let active = match grab.entity {
            GrabbedEntity::Face { normal } => {
                let axis = dominant_axis(&part.to_local_vector(&normal));
                std::array::from_fn(|i| i == axis)
            }
            GrabbedEntity::Edge { direction } => {
                let axis = dominant_axis(&part.to_local_vector(&direction));
                std::array::from_fn(|i| i != axis)
            }
            GrabbedEntity::Vertex => [true; 3],
        };
        debug!(?sign, ?active, ?mode, "stretch started");
        Self {
            grab,
            mode,
            snapshot,
            sign,
            active,
            total: Vector3::zeros(),
        }
    }

    pub fn mode(&self) -> StretchMode {
        self.mode
    }

    pub fn sign_mask(&self) -> Vector3 {
        self.sign
    }
}

impl Mover for Stretcher {
    fn grab(&self) -> &Grab {
        &self.grab
    }

    fn movement_constraint(&self) -> MovementConstraint {
        match self.grab.entity {
            GrabbedEntity::Face { normal } => Line::new(self.grab.point, normal)
                .map_or(MovementConstraint::None, MovementConstraint::Line),
            GrabbedEntity::Edge { direction } => Plane::new(self.grab.point, direction)
                .map_or(MovementConstraint::None, MovementConstraint::Plane),
            GrabbedEntity::Vertex => MovementConstraint::None,
        }
    }

    fn apply(&mut self, part: &mut Part, delta: &Vector3) -> Result<(), PartError> {
        self.total += delta;
        let local = self.snapshot.orientation.inverse_transform_vector(&self.total);
        let mut size = self.snapshot.size;
        let mut shift = Vector3::zeros();
        for i in (0..3).filter(|&i| self.active[i]) {
            let outward = self.sign[i] * local[i];
            let old = self.snapshot.size[i];
            match self.mode {
                StretchMode::OppositeFixed => {
                    size[i] = (old + outward).max(0.0);
                    if self.sign[i] < 0.0 {
                        shift[i] = old - size[i];
                    }
                }
                StretchMode::Symmetric => {
                    size[i] = (old + 2.0 * outward).max(0.0);
                    shift[i] = (old - size[i]) / 2.0;
                }
            }
        }
        part.set_size(size)?;
        part.set_position(self.snapshot.position + self.snapshot.orientation * shift);
        Ok(())
    }

    fn cancel(&mut self, part: &mut Part) -> Result<(), PartError> {
        self.total = Vector3::zeros();
        part.restore(&self.snapshot)
    }
}
