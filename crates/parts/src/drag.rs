use tracing::{debug, info};

use joinery_kernel::{Point3, Ray};
use target_finder::{Constraint, Target, TargetFinder};
use topo_index::Intersection;

use crate::error::PartError;
use crate::movers::Mover;
use crate::part::Part;

/// One drag gesture: a mover fed with targets resolved under the mover's
/// constraint.
///
/// Beginning a session installs the mover's constraint in the finder;
/// finishing or cancelling puts the previous constraint back.
pub struct DragSession {
    mover: Box<dyn Mover>,
    last_point: Point3,
    previous: Constraint,
}

impl DragSession {
    pub fn begin(mover: Box<dyn Mover>, finder: &mut TargetFinder) -> Self {
        let anchor = mover.grab().point;
        let constraint = mover.movement_constraint().to_target_constraint(anchor);
        info!(?constraint, "drag started");
        let previous = finder.set_constraint(constraint);
        Self {
            mover,
            last_point: anchor,
            previous,
        }
    }

    pub fn last_point(&self) -> Point3 {
        self.last_point
    }

    pub fn mover(&self) -> &dyn Mover {
        self.mover.as_ref()
    }

    /// Resolve the pointer ray and move the part by the step since the last
    /// resolved point. Returns `None`, leaving the part untouched, when no
    /// target could be resolved.
    pub fn update<K>(
        &mut self,
        part: &mut Part,
        finder: &TargetFinder,
        ray: &Ray,
        pixel_size: f64,
        picked: Option<&Intersection<K>>,
    ) -> Result<Option<Target>, PartError> {
        let Some(target) = finder.find_target(ray, pixel_size, picked) else {
            debug!("no drag target");
            return Ok(None);
        };
        let delta = target.point - self.last_point;
        self.mover.apply(part, &delta)?;
        self.last_point = target.point;
        Ok(Some(target))
    }

    /// Keep the edit.
    pub fn finish(self, finder: &mut TargetFinder) {
        finder.set_constraint(self.previous);
        info!("drag finished");
    }

    /// Undo the whole gesture.
    pub fn cancel(mut self, part: &mut Part, finder: &mut TargetFinder) -> Result<(), PartError> {
        finder.set_constraint(self.previous);
        self.mover.cancel(part)?;
        info!("drag cancelled");
        Ok(())
    }
}

impl std::fmt::Debug for DragSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragSession")
            .field("grab", self.mover.grab())
            .field("last_point", &self.last_point)
            .field("previous", &self.previous)
            .finish()
    }
}
