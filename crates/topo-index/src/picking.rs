//! Ray picking against geometries bundles.

use std::cmp::Ordering;

use tracing::debug;

use joinery_kernel::geometry::intersection::{ray_segment_closest, ray_triangle};
use joinery_kernel::geometry::within_threshold;
use joinery_kernel::{Line, Plane, Point3, Ray};

use crate::config::PickConfig;
use crate::geometries::Geometries;
use crate::topology::EntityRef;

/// Geometry of the render primitive that was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitGeometry {
    Point(Point3),
    Segment([Point3; 2]),
    Triangle([Point3; 3]),
}

impl HitGeometry {
    /// Carrier line of a segment hit.
    pub fn line(&self) -> Option<Line> {
        match self {
            HitGeometry::Segment([a, b]) => Line::through(*a, *b),
            _ => None,
        }
    }

    /// Carrier plane of a triangle hit, normal following the winding.
    pub fn plane(&self) -> Option<Plane> {
        match self {
            HitGeometry::Triangle([a, b, c]) => Plane::from_points(a, b, c),
            _ => None,
        }
    }
}

/// One ray hit on an object's render primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection<K> {
    pub object: K,
    pub entity: EntityRef,
    /// Triangle, segment or point index inside the object's buffers.
    pub primitive: usize,
    pub point: Point3,
    /// Distance along the ray to the hit.
    pub distance: f64,
    pub geometry: HitGeometry,
}

impl<K> Intersection<K> {
    pub fn is_face(&self) -> bool {
        matches!(self.entity, EntityRef::Face(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.entity, EntityRef::Edge(_))
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self.entity, EntityRef::Vertex(_))
    }
}

fn by_distance<K>(a: &Intersection<K>, b: &Intersection<K>) -> Ordering {
    a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal)
}

/// Casts rays against triangles, segments and points with pixel thresholds.
#[derive(Debug, Clone, Default)]
pub struct Raycaster {
    config: PickConfig,
}

impl Raycaster {
    pub fn new(config: PickConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PickConfig {
        &self.config
    }

    /// Every hit on `objects`, nearest first.
    ///
    /// `pixel_size` converts the pixel thresholds into world units.
    pub fn intersect_all<'a, K, I>(&self, ray: &Ray, pixel_size: f64, objects: I) -> Vec<Intersection<K>>
    where
        K: Copy,
        I: IntoIterator<Item = (K, &'a Geometries)>,
    {
        let line_threshold = self.config.line_threshold_pixels * pixel_size;
        let point_threshold = self.config.point_threshold_pixels * pixel_size;
        let mut hits = Vec::new();

        for (object, geometries) in objects {
            let faces = &geometries.faces;
            for i in 0..faces.triangle_count() {
                let (Some(tri), Some(face)) = (faces.triangle(i), faces.face_of(i)) else {
                    continue;
                };
                if let Some(t) = ray_triangle(ray, &tri) {
                    hits.push(Intersection {
                        object,
                        entity: EntityRef::Face(face),
                        primitive: i,
                        point: ray.at(t),
                        distance: t,
                        geometry: HitGeometry::Triangle(tri),
                    });
                }
            }

            let edges = &geometries.edges;
            for i in 0..edges.segment_count() {
                let (Some([a, b]), Some(edge)) = (edges.segment(i), edges.edge_of(i)) else {
                    continue;
                };
                let closest = ray_segment_closest(ray, &a, &b);
                if within_threshold(closest.distance, line_threshold) {
                    hits.push(Intersection {
                        object,
                        entity: EntityRef::Edge(edge),
                        primitive: i,
                        point: closest.on_segment,
                        distance: closest.ray_t,
                        geometry: HitGeometry::Segment([a, b]),
                    });
                }
            }

            let vertices = &geometries.vertices;
            for i in 0..vertices.point_count() {
                let (Some(p), Some(vertex)) = (vertices.point(i), vertices.vertex_of(i)) else {
                    continue;
                };
                let (_, t) = ray.closest_point(&p);
                if within_threshold(ray.distance_to_point(&p), point_threshold) {
                    hits.push(Intersection {
                        object,
                        entity: EntityRef::Vertex(vertex),
                        primitive: i,
                        point: p,
                        distance: t,
                        geometry: HitGeometry::Point(p),
                    });
                }
            }
        }

        hits.sort_by(by_distance);
        hits
    }

    /// The nearest hit, if any.
    pub fn pick<'a, K, I>(&self, ray: &Ray, pixel_size: f64, objects: I) -> Option<Intersection<K>>
    where
        K: Copy,
        I: IntoIterator<Item = (K, &'a Geometries)>,
    {
        self.intersect_all(ray, pixel_size, objects).into_iter().next()
    }

    /// The nearest hit, upgraded to a vertex or visible edge lying within the
    /// snap tolerance behind it.
    ///
    /// Vertices win over everything. When the nearest hit is a face, the
    /// nearest edge that no face occludes replaces it. A face hit occludes
    /// an edge when it lies in front of the edge by more than the line
    /// threshold and its plane does not carry the edge, so the faces meeting
    /// at an edge never hide it.
    pub fn pick_with_snap<'a, K, I>(&self, ray: &Ray, pixel_size: f64, objects: I) -> Option<Intersection<K>>
    where
        K: Copy,
        I: IntoIterator<Item = (K, &'a Geometries)>,
    {
        let hits = self.intersect_all(ray, pixel_size, objects);
        let closest = *hits.first()?;
        let tolerance = self.config.snap_tolerance_pixels * pixel_size;
        let corner = self.config.line_threshold_pixels * pixel_size;
        let candidates = hits.iter().take_while(|h| h.distance <= closest.distance + tolerance);

        let mut first_edge = None;
        for hit in candidates {
            if hit.is_vertex() {
                debug!(primitive = hit.primitive, "snapped pick to vertex");
                return Some(*hit);
            }
            if first_edge.is_none() && hit.is_edge() && closest.is_face() && edge_visible(hit, &hits, corner) {
                first_edge = Some(*hit);
            }
        }
        if let Some(edge) = first_edge {
            debug!(primitive = edge.primitive, "snapped pick to edge");
            return Some(edge);
        }
        Some(closest)
    }
}

/// No face hit lies clearly in front of `edge`. Faces whose plane carries
/// the edge border it and are skipped.
fn edge_visible<K>(edge: &Intersection<K>, hits: &[Intersection<K>], corner: f64) -> bool {
    let HitGeometry::Segment([a, b]) = edge.geometry else {
        return false;
    };
    !hits.iter().any(|h| {
        if !h.is_face() || h.distance >= edge.distance - corner {
            return false;
        }
        let borders = h
            .geometry
            .plane()
            .is_some_and(|plane| plane.contains_point(&a, corner) && plane.contains_point(&b, corner));
        !borders
    })
}
