use tracing::debug;

use joinery_kernel::Point3;
use target_finder::{Constraint, Target, TargetFinder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Collecting,
    Complete,
    Cancelled,
}

/// Collects a fixed number of target points for a drawing tool.
///
/// After each accepted point the finder snaps relative to that point. The
/// constraint active before the first point is restored once the collector
/// completes or is cancelled.
#[derive(Debug, Clone)]
pub struct PointCollector {
    required: usize,
    points: Vec<Point3>,
    previous: Option<Constraint>,
    state: CollectorState,
}

impl PointCollector {
    pub fn new(required: usize) -> Self {
        Self {
            required,
            points: Vec::with_capacity(required),
            previous: None,
            state: if required == 0 {
                CollectorState::Complete
            } else {
                CollectorState::Collecting
            },
        }
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn remaining(&self) -> usize {
        self.required - self.points.len()
    }

    /// Accepted points followed by the hovered target, for rubber-band
    /// feedback.
    pub fn preview(&self, hover: &Target) -> Vec<Point3> {
        let mut points = self.points.clone();
        if self.state == CollectorState::Collecting {
            points.push(hover.point);
        }
        points
    }

    /// Accept `target` as the next point.
    pub fn push(&mut self, target: &Target, finder: &mut TargetFinder) -> CollectorState {
        if self.state != CollectorState::Collecting {
            return self.state;
        }
        self.points.push(target.point);
        let previous = finder.set_constraint(Constraint::NearPoint(target.point));
        self.previous.get_or_insert(previous);
        debug!(collected = self.points.len(), required = self.required, "collected point");

        if self.points.len() == self.required {
            self.restore(finder);
            self.state = CollectorState::Complete;
        }
        self.state
    }

    pub fn cancel(&mut self, finder: &mut TargetFinder) {
        if self.state == CollectorState::Collecting {
            self.restore(finder);
            self.points.clear();
            self.state = CollectorState::Cancelled;
        }
    }

    fn restore(&mut self, finder: &mut TargetFinder) {
        if let Some(previous) = self.previous.take() {
            finder.set_constraint(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_kernel::{Ray, Vector3};

    fn target_at(finder: &TargetFinder, x: f64, z: f64) -> Target {
        let ray = Ray::new(Point3::new(x, 10.0, z), -Vector3::y()).unwrap();
        finder.find_target::<()>(&ray, 1e-4, None).unwrap()
    }

    #[test]
    fn test_collects_required_points() {
        let mut finder = TargetFinder::default();
        let mut collector = PointCollector::new(2);
        let first = target_at(&finder, 1.3, 2.7);
        assert_eq!(collector.push(&first, &mut finder), CollectorState::Collecting);
        assert_eq!(*finder.constraint(), Constraint::NearPoint(first.point));

        // Axes through the first point are now snap lines.
        let second = target_at(&finder, 4.0, 2.70001);
        assert!(second.snapped_line.is_some());
        assert!((second.point.z - 2.7).abs() < 1e-9);
        assert_eq!(collector.push(&second, &mut finder), CollectorState::Complete);
        assert_eq!(collector.points().len(), 2);
        assert_eq!(*finder.constraint(), Constraint::None);
    }

    #[test]
    fn test_cancel_restores_constraint() {
        let mut finder = TargetFinder::default();
        let outer = Constraint::NearPoint(Point3::new(9.0, 0.0, 9.0));
        finder.set_constraint(outer);
        let mut collector = PointCollector::new(3);
        let first = target_at(&finder, 1.3, 2.7);
        collector.push(&first, &mut finder);
        assert_eq!(collector.preview(&first).len(), 2);
        collector.cancel(&mut finder);
        assert_eq!(collector.state(), CollectorState::Cancelled);
        assert!(collector.points().is_empty());
        assert_eq!(*finder.constraint(), outer);
        // Further points are ignored.
        assert_eq!(collector.push(&first, &mut finder), CollectorState::Cancelled);
    }
}
