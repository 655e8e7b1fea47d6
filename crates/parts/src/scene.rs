//! Parts, picking, targeting and frame scheduling in one place.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use joinery_kernel::{Point3, Ray, Vector3};
use kernel_bridge::BrepKernel;
use target_finder::{Target, TargetFinder};
use topo_index::{Geometries, Intersection, Raycaster};

use crate::config::EditorConfig;
use crate::drag::DragSession;
use crate::error::PartError;
use crate::movers::{Grab, Mover, PlainMover, StretchMode, Stretcher};
use crate::part::{Part, PartId};

// ─── Frame Scheduling ────────────────────────────────────────────────────────

/// Work for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Parts rebuilt this frame, each at most once.
    pub rebuilt: Vec<PartId>,
    /// Bundles to draw; `None` when nothing changed since the last frame.
    pub draw: Option<Vec<(PartId, Arc<Geometries>)>>,
}

/// Coalesces invalidations and redraw requests between frames.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    dirty: BTreeSet<PartId>,
    redraw: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a part for rebuild; implies a redraw.
    pub fn invalidate(&mut self, id: PartId) {
        self.dirty.insert(id);
        self.redraw = true;
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    pub fn needs_frame(&self) -> bool {
        self.redraw || !self.dirty.is_empty()
    }

    /// Take the pending work, leaving the scheduler idle.
    pub fn take(&mut self) -> (Vec<PartId>, bool) {
        let dirty = std::mem::take(&mut self.dirty).into_iter().collect();
        (dirty, std::mem::replace(&mut self.redraw, false))
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Stretch(StretchMode),
}

#[derive(Debug)]
struct ActiveDrag {
    part: PartId,
    session: DragSession,
}

/// The editor's parts and interaction state.
///
/// The kernel is passed into every call that builds or frees geometry.
/// Picking only sees geometry built by a previous [`Scene::frame`].
#[derive(Debug)]
pub struct Scene {
    config: EditorConfig,
    parts: BTreeMap<PartId, Part>,
    raycaster: Raycaster,
    finder: TargetFinder,
    scheduler: FrameScheduler,
    drag: Option<ActiveDrag>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Scene {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            parts: BTreeMap::new(),
            raycaster: Raycaster::new(config.pick),
            finder: TargetFinder::new(config.snap),
            scheduler: FrameScheduler::new(),
            drag: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn finder(&self) -> &TargetFinder {
        &self.finder
    }

    pub fn finder_mut(&mut self) -> &mut TargetFinder {
        &mut self.finder
    }

    pub fn needs_frame(&self) -> bool {
        self.scheduler.needs_frame()
    }

    // ── Parts ──

    pub fn add_part(
        &mut self,
        kernel: &mut dyn BrepKernel,
        name: &str,
        position: Point3,
        size: Vector3,
    ) -> Result<PartId, PartError> {
        let part = Part::new(kernel, name, position, size)?;
        let id = part.id();
        self.parts.insert(id, part);
        self.scheduler.invalidate(id);
        Ok(id)
    }

    pub fn remove_part(&mut self, kernel: &mut dyn BrepKernel, id: PartId) -> Result<(), PartError> {
        if self.drag.as_ref().is_some_and(|d| d.part == id) {
            self.cancel_drag()?;
        }
        let part = self.parts.remove(&id).ok_or(PartError::UnknownPart { id })?;
        part.release(kernel)?;
        self.scheduler.request_redraw();
        info!(%id, "removed part");
        Ok(())
    }

    pub fn part(&self, id: PartId) -> Result<&Part, PartError> {
        self.parts.get(&id).ok_or(PartError::UnknownPart { id })
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// Edit a part through `edit`; the part is rebuilt on the next frame.
    pub fn edit_part<T>(&mut self, id: PartId, edit: impl FnOnce(&mut Part) -> T) -> Result<T, PartError> {
        let part = self.parts.get_mut(&id).ok_or(PartError::UnknownPart { id })?;
        let result = edit(part);
        self.scheduler.invalidate(id);
        Ok(result)
    }

    // ── Frames ──

    /// Rebuild every part invalidated since the last frame, then hand out
    /// the bundles to draw.
    #[instrument(skip_all)]
    pub fn frame(&mut self, kernel: &mut dyn BrepKernel) -> Result<Frame, PartError> {
        let (dirty, redraw) = self.scheduler.take();
        let mut rebuilt = Vec::with_capacity(dirty.len());
        let mut pending = dirty.into_iter();
        while let Some(id) = pending.next() {
            // Parts removed after being invalidated have nothing to rebuild.
            let Some(part) = self.parts.get_mut(&id) else {
                continue;
            };
            if let Err(err) = part.geometries(kernel, &self.config.index) {
                warn!(part = %id, error = %err, "part rebuild failed");
                // The failed part and everything after it stay queued.
                for id in std::iter::once(id).chain(pending.by_ref()) {
                    self.scheduler.invalidate(id);
                }
                if redraw {
                    self.scheduler.request_redraw();
                }
                return Err(err);
            }
            rebuilt.push(id);
        }
        let draw = redraw.then(|| {
            self.parts
                .iter()
                .filter_map(|(id, part)| part.cached_geometries().map(|g| (*id, Arc::clone(g))))
                .collect()
        });
        if !rebuilt.is_empty() {
            info!(rebuilt = rebuilt.len(), "rebuilt part geometry");
        }
        Ok(Frame { rebuilt, draw })
    }

    // ── Picking and targeting ──

    /// Nearest hit under the ray, upgraded to vertices and visible edges.
    pub fn pick(&self, ray: &Ray, pixel_size: f64) -> Option<Intersection<PartId>> {
        self.raycaster
            .pick_with_snap(ray, pixel_size, pickable(&self.parts, None))
    }

    /// Target under the ray, taking the current pick into account.
    pub fn resolve_target(&self, ray: &Ray, pixel_size: f64) -> Option<Target> {
        let picked = self.pick(ray, pixel_size);
        self.finder.find_target(ray, pixel_size, picked.as_ref())
    }

    // ── Dragging ──

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start dragging the part under `hit`.
    pub fn begin_drag(&mut self, hit: &Intersection<PartId>, kind: DragKind) -> Result<(), PartError> {
        if self.drag.is_some() {
            self.cancel_drag()?;
        }
        let part = self.part(hit.object)?;
        let Some(grab) = Grab::from_hit(hit) else {
            debug!("degenerate grab, drag ignored");
            return Ok(());
        };
        let mover: Box<dyn Mover> = match kind {
            DragKind::Move => Box::new(PlainMover::new(part, grab)),
            DragKind::Stretch(mode) => Box::new(Stretcher::new(part, grab, mode)),
        };
        let session = DragSession::begin(mover, &mut self.finder);
        self.drag = Some(ActiveDrag {
            part: hit.object,
            session,
        });
        Ok(())
    }

    /// Follow the pointer. The dragged part is left out of picking so the
    /// target never lands on the part being moved.
    pub fn drag_to(&mut self, ray: &Ray, pixel_size: f64) -> Result<Option<Target>, PartError> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(None);
        };
        let picked = self
            .raycaster
            .pick_with_snap(ray, pixel_size, pickable(&self.parts, Some(drag.part)));
        let part = self
            .parts
            .get_mut(&drag.part)
            .ok_or(PartError::UnknownPart { id: drag.part })?;
        let target = drag
            .session
            .update(part, &self.finder, ray, pixel_size, picked.as_ref())?;
        if target.is_some() {
            self.scheduler.invalidate(drag.part);
        }
        Ok(target)
    }

    pub fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            drag.session.finish(&mut self.finder);
        }
    }

    pub fn cancel_drag(&mut self) -> Result<(), PartError> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        let part = self
            .parts
            .get_mut(&drag.part)
            .ok_or(PartError::UnknownPart { id: drag.part })?;
        drag.session.cancel(part, &mut self.finder)?;
        self.scheduler.invalidate(drag.part);
        Ok(())
    }
}

/// Built parts other than `exclude`.
fn pickable(parts: &BTreeMap<PartId, Part>, exclude: Option<PartId>) -> impl Iterator<Item = (PartId, &Geometries)> {
    parts
        .iter()
        .filter(move |(id, _)| Some(**id) != exclude)
        .filter_map(|(id, part)| part.cached_geometries().map(|g| (*id, g.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_bridge::ArenaKernel;

    use crate::testing::FaultyKernel;

    #[test]
    fn test_scheduler_coalesces() {
        let mut scheduler = FrameScheduler::new();
        let id = PartId::new();
        scheduler.invalidate(id);
        scheduler.invalidate(id);
        scheduler.request_redraw();
        let (dirty, redraw) = scheduler.take();
        assert_eq!(dirty, vec![id]);
        assert!(redraw);
        assert!(!scheduler.needs_frame());
    }

    #[test]
    fn test_frame_rebuilds_each_part_once() {
        let mut kernel = ArenaKernel::new();
        let mut scene = Scene::default();
        let a = scene
            .add_part(&mut kernel, "a", Point3::origin(), Vector3::new(1.0, 1.0, 1.0))
            .unwrap();
        scene
            .edit_part(a, |p| p.set_position(Point3::new(2.0, 0.0, 0.0)))
            .unwrap();
        scene
            .edit_part(a, |p| p.set_position(Point3::new(3.0, 0.0, 0.0)))
            .unwrap();
        let frame = scene.frame(&mut kernel).unwrap();
        assert_eq!(frame.rebuilt, vec![a]);
        assert_eq!(frame.draw.as_ref().map(Vec::len), Some(1));

        let idle = scene.frame(&mut kernel).unwrap();
        assert!(idle.rebuilt.is_empty());
        assert!(idle.draw.is_none());
    }

    #[test]
    fn test_unknown_part() {
        let mut kernel = ArenaKernel::new();
        let mut scene = Scene::default();
        let ghost = PartId::new();
        assert!(matches!(scene.part(ghost), Err(PartError::UnknownPart { .. })));
        assert!(matches!(
            scene.remove_part(&mut kernel, ghost),
            Err(PartError::UnknownPart { .. })
        ));
    }

    #[test]
    fn test_pick_sees_only_built_parts() {
        let mut kernel = ArenaKernel::new();
        let mut scene = Scene::default();
        scene
            .add_part(&mut kernel, "a", Point3::origin(), Vector3::new(1.0, 1.0, 1.0))
            .unwrap();
        let ray = Ray::new(Point3::new(0.5, 10.0, 0.5), -Vector3::y()).unwrap();
        assert!(scene.pick(&ray, 0.001).is_none());
        scene.frame(&mut kernel).unwrap();
        assert!(scene.pick(&ray, 0.001).is_some());
    }

    #[test]
    fn test_drag_move_and_cancel() {
        let mut kernel = ArenaKernel::new();
        let mut scene = Scene::default();
        let id = scene
            .add_part(&mut kernel, "a", Point3::origin(), Vector3::new(1.0, 1.0, 1.0))
            .unwrap();
        scene.frame(&mut kernel).unwrap();

        let ray = Ray::new(Point3::new(0.4, 10.0, 0.6), -Vector3::y()).unwrap();
        let hit = scene.pick(&ray, 0.001).unwrap();
        scene.begin_drag(&hit, DragKind::Move).unwrap();
        assert!(scene.is_dragging());

        // Top-face grab: the part slides in the plane y = 1.
        let ray = Ray::new(Point3::new(3.4, 10.0, 0.6), -Vector3::y()).unwrap();
        let target = scene.drag_to(&ray, 0.001).unwrap().unwrap();
        assert!((target.point.y - 1.0).abs() < 1e-6);
        assert!((scene.part(id).unwrap().position().x - 3.0).abs() < 1e-6);
        assert!(scene.needs_frame());

        scene.cancel_drag().unwrap();
        assert_eq!(scene.part(id).unwrap().position(), Point3::origin());
        assert!(!scene.is_dragging());
    }

    #[test]
    fn test_remove_part_frees_kernel_shape() {
        let mut kernel = ArenaKernel::new();
        let mut scene = Scene::default();
        let id = scene
            .add_part(&mut kernel, "a", Point3::origin(), Vector3::new(1.0, 1.0, 1.0))
            .unwrap();
        scene.frame(&mut kernel).unwrap();
        scene.remove_part(&mut kernel, id).unwrap();
        assert_eq!(kernel.node_count(), 0);
        let frame = scene.frame(&mut kernel).unwrap();
        assert_eq!(frame.draw, Some(vec![]));
    }

    #[test]
    fn test_failed_frame_keeps_parts_dirty() {
        let mut kernel = FaultyKernel::new();
        let mut scene = Scene::default();
        let a = scene
            .add_part(&mut kernel, "a", Point3::origin(), Vector3::new(1.0, 1.0, 1.0))
            .unwrap();
        let b = scene
            .add_part(&mut kernel, "b", Point3::new(3.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0))
            .unwrap();
        scene.frame(&mut kernel).unwrap();

        for id in [a, b] {
            scene.edit_part(id, |p| p.set_size(Vector3::new(2.0, 1.0, 1.0))).unwrap().unwrap();
        }
        kernel.fail_make_box = true;
        assert!(matches!(scene.frame(&mut kernel), Err(PartError::Kernel(_))));
        assert!(scene.needs_frame());

        kernel.fail_make_box = false;
        let frame = scene.frame(&mut kernel).unwrap();
        let mut rebuilt = frame.rebuilt.clone();
        rebuilt.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(rebuilt, expected);
        assert_eq!(frame.draw.as_ref().map(Vec::len), Some(2));
        assert!(!scene.needs_frame());
    }
}

