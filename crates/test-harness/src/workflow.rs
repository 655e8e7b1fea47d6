//! Workbench: fluent API for scripting editor sessions in tests.
//!
//! Wraps a real [`Scene`] and [`ArenaKernel`] so the picking, targeting and
//! dragging paths under test are the ones the editor runs. Parts are
//! addressed by name instead of id for readability.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use joinery_kernel::{Point3, Ray};
use joinery_parts::{Camera, CollectorState, DragKind, EditorConfig, Frame, Part, PartId, PointCollector, Scene};
use kernel_bridge::ArenaKernel;
use target_finder::Target;
use topo_index::{Geometries, Intersection};

use crate::assertions;
use crate::helpers::*;

/// One scripted step, kept for failure diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub action: String,
    pub detail: String,
}

/// A fluent driver for scripted editor sessions.
pub struct Workbench {
    kernel: ArenaKernel,
    scene: Scene,
    camera: Option<Camera>,
    named_parts: HashMap<String, PartId>,
    history: Vec<Step>,
    auto_frame: bool,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbench {
    /// Create a workbench with the default editor configuration.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            kernel: ArenaKernel::new(),
            scene: Scene::new(config),
            camera: None,
            named_parts: HashMap::new(),
            history: Vec::new(),
            auto_frame: false,
        }
    }

    /// Create a workbench from a partial JSON editor configuration.
    pub fn with_config_json(json: &str) -> Result<Self, HarnessError> {
        Ok(Self::with_config(EditorConfig::from_json(json)?))
    }

    /// Enable auto-framing: after every edit, run a frame so picking sees
    /// the current geometry.
    pub fn with_auto_frame(mut self) -> Self {
        self.auto_frame = true;
        self
    }

    /// Use `camera` for pointer rays.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    fn record(&mut self, action: &str, detail: String) {
        debug!(action, %detail, "workbench step");
        self.history.push(Step {
            action: action.to_string(),
            detail,
        });
    }

    fn after_edit(&mut self) -> Result<(), HarnessError> {
        if self.auto_frame {
            self.frame()?;
        }
        Ok(())
    }

    // ── Parts ───────────────────────────────────────────────────────────

    /// Add a box-shaped part with its minimum corner at `position`.
    pub fn board(&mut self, name: &str, position: [f64; 3], size: [f64; 3]) -> Result<PartId, HarnessError> {
        if self.named_parts.contains_key(name) {
            return Err(HarnessError::DuplicateName { name: name.to_string() });
        }
        let id = self
            .scene
            .add_part(&mut self.kernel, name, point(position), vector(size))?;
        self.named_parts.insert(name.to_string(), id);
        self.record("board", format!("{name} at {position:?} size {size:?}"));
        self.after_edit()?;
        Ok(id)
    }

    /// Add a box centered on `center`.
    pub fn centered_board(&mut self, name: &str, center: [f64; 3], size: [f64; 3]) -> Result<PartId, HarnessError> {
        let corner = [0, 1, 2].map(|i| center[i] - size[i] / 2.0);
        self.board(name, corner, size)
    }

    pub fn remove(&mut self, name: &str) -> Result<&mut Self, HarnessError> {
        let id = self.part_id(name)?;
        self.scene.remove_part(&mut self.kernel, id)?;
        self.named_parts.remove(name);
        self.record("remove", name.to_string());
        self.after_edit()?;
        Ok(self)
    }

    /// Edit a named part in place; it is rebuilt on the next frame.
    pub fn edit<T>(&mut self, name: &str, edit: impl FnOnce(&mut Part) -> T) -> Result<T, HarnessError> {
        let id = self.part_id(name)?;
        let result = self.scene.edit_part(id, edit)?;
        self.record("edit", name.to_string());
        self.after_edit()?;
        Ok(result)
    }

    pub fn part_id(&self, name: &str) -> Result<PartId, HarnessError> {
        self.named_parts
            .get(name)
            .copied()
            .ok_or_else(|| HarnessError::PartNotFound { name: name.to_string() })
    }

    pub fn part(&self, name: &str) -> Result<&Part, HarnessError> {
        Ok(self.scene.part(self.part_id(name)?)?)
    }

    pub fn part_count(&self) -> usize {
        self.scene.parts().count()
    }

    /// Geometry of a named part as of the last frame.
    pub fn geometries(&self, name: &str) -> Result<Arc<Geometries>, HarnessError> {
        self.part(name)?
            .cached_geometries()
            .cloned()
            .ok_or_else(|| HarnessError::AssertionFailed {
                detail: format!("{name} has not been built"),
            })
    }

    // ── Frames ──────────────────────────────────────────────────────────

    pub fn frame(&mut self) -> Result<Frame, HarnessError> {
        let frame = self.scene.frame(&mut self.kernel)?;
        let rebuilt = frame.rebuilt.len();
        self.record("frame", format!("rebuilt {rebuilt}"));
        Ok(frame)
    }

    // ── Pointer ─────────────────────────────────────────────────────────

    /// Ray and pixel size under the pointer at `(x, y)`.
    pub fn pointer(&self, x: f64, y: f64) -> Result<(Ray, f64), HarnessError> {
        let camera = self.camera.as_ref().ok_or_else(|| HarnessError::DegenerateRay {
            context: "no camera".to_string(),
        })?;
        let ray = camera.ray(x, y).ok_or_else(|| HarnessError::DegenerateRay {
            context: format!("pointer ({x}, {y})"),
        })?;
        Ok((ray, camera.focus_pixel_size()))
    }

    pub fn try_pick(&self, ray: &Ray, pixel_size: f64) -> Option<Intersection<PartId>> {
        self.scene.pick(ray, pixel_size)
    }

    pub fn pick(&self, ray: &Ray, pixel_size: f64) -> Result<Intersection<PartId>, HarnessError> {
        self.try_pick(ray, pixel_size).ok_or_else(|| HarnessError::NothingPicked {
            context: format!("ray from {:?}", ray.origin),
        })
    }

    pub fn target(&self, ray: &Ray, pixel_size: f64) -> Result<Target, HarnessError> {
        self.scene
            .resolve_target(ray, pixel_size)
            .ok_or_else(|| HarnessError::NoTarget {
                context: format!("ray from {:?}", ray.origin),
            })
    }

    // ── Dragging ────────────────────────────────────────────────────────

    /// Pick under `ray` and start dragging the picked part.
    pub fn grab(&mut self, ray: &Ray, pixel_size: f64, kind: DragKind) -> Result<Intersection<PartId>, HarnessError> {
        let hit = self.pick(ray, pixel_size)?;
        self.scene.begin_drag(&hit, kind)?;
        self.record("grab", format!("{} {:?} ({kind:?})", hit_kind(&hit), hit.point));
        Ok(hit)
    }

    pub fn drag_to(&mut self, ray: &Ray, pixel_size: f64) -> Result<Target, HarnessError> {
        let target = self
            .scene
            .drag_to(ray, pixel_size)?
            .ok_or_else(|| HarnessError::NoTarget {
                context: format!("drag ray from {:?}", ray.origin),
            })?;
        self.record("drag", format!("{:?}", target.point));
        Ok(target)
    }

    /// Finish the drag, keeping the edit.
    pub fn release(&mut self) -> Result<&mut Self, HarnessError> {
        self.scene.end_drag();
        self.record("release", String::new());
        self.after_edit()?;
        Ok(self)
    }

    pub fn cancel_drag(&mut self) -> Result<&mut Self, HarnessError> {
        self.scene.cancel_drag()?;
        self.record("cancel", String::new());
        self.after_edit()?;
        Ok(self)
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    /// Collect one target per ray with a point collector, as a drawing
    /// tool would.
    pub fn collect_points(&mut self, rays: &[Ray], pixel_size: f64) -> Result<Vec<Point3>, HarnessError> {
        let mut collector = PointCollector::new(rays.len());
        for ray in rays {
            let target = self.target(ray, pixel_size)?;
            collector.push(&target, self.scene.finder_mut());
        }
        if collector.state() != CollectorState::Complete {
            return Err(HarnessError::AssertionFailed {
                detail: format!("collector ended in {:?}", collector.state()),
            });
        }
        self.record("collect", format!("{} points", rays.len()));
        Ok(collector.points().to_vec())
    }

    // ── Inline Assertions ───────────────────────────────────────────────

    pub fn assert_size(&self, name: &str, expected: [f64; 3], tol: f64) -> Result<&Self, HarnessError> {
        let size = self.part(name)?.size();
        assertions::assert_vector_near(&size, &vector(expected), tol, &format!("size of {name}"))?;
        Ok(self)
    }

    pub fn assert_position(&self, name: &str, expected: [f64; 3], tol: f64) -> Result<&Self, HarnessError> {
        let position = self.part(name)?.position();
        assertions::assert_point_near(&position, &point(expected), tol, &format!("position of {name}"))?;
        Ok(self)
    }

    /// Assert a built part carries the topology of a box.
    pub fn assert_box_topology(&self, name: &str) -> Result<&Self, HarnessError> {
        let geometries = self.geometries(name)?;
        assertions::assert_entity_counts(&geometries, 6, 12, 8, name)?;
        Ok(self)
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn kernel(&self) -> &ArenaKernel {
        &self.kernel
    }

    pub fn history(&self) -> &[Step] {
        &self.history
    }

    /// The step history as JSON, for attaching to failure output.
    pub fn history_json(&self) -> String {
        serde_json::to_string_pretty(&self.history).unwrap_or_default()
    }
}
