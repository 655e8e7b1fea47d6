use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use super::TopologyError;
use crate::geometry::{Isometry3, Plane, Point3, UnitQuaternion, Vector3};

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    /// Key of any node in the topology arena.
    pub struct NodeId;
}

// ─── Kinds and Orientation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopoKind {
    Vertex,
    Edge,
    Wire,
    Face,
    Shell,
    Solid,
    Compound,
}

/// Orientation of a sub-shape relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Forward,
    Reversed,
}

impl Orientation {
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
        }
    }

    /// Orientation of a child seen through a parent with orientation `self`.
    pub fn compose(self, child: Orientation) -> Self {
        if self == child {
            Orientation::Forward
        } else {
            Orientation::Reversed
        }
    }
}

// ─── Topological Entities ───────────────────────────────────────────────────

/// Underlying curve of an edge, running from its start to its end vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EdgeCurve {
    Line,
    /// Circular arc turning counter-clockwise about `normal` around `center`.
    Arc { center: Point3, normal: Vector3 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopoNode {
    Vertex { point: Point3 },
    Edge { start: NodeId, end: NodeId, curve: EdgeCurve },
    /// An ordered chain of oriented edges.
    Wire { edges: Vec<(NodeId, Orientation)> },
    /// A planar face bounded by a single outer wire.
    Face { plane: Plane, outer: NodeId },
    Shell { faces: Vec<(NodeId, Orientation)> },
    Solid { shells: Vec<NodeId> },
    Compound { children: Vec<NodeId> },
}

impl TopoNode {
    pub fn kind(&self) -> TopoKind {
        match self {
            TopoNode::Vertex { .. } => TopoKind::Vertex,
            TopoNode::Edge { .. } => TopoKind::Edge,
            TopoNode::Wire { .. } => TopoKind::Wire,
            TopoNode::Face { .. } => TopoKind::Face,
            TopoNode::Shell { .. } => TopoKind::Shell,
            TopoNode::Solid { .. } => TopoKind::Solid,
            TopoNode::Compound { .. } => TopoKind::Compound,
        }
    }
}

/// One occurrence of a node found while exploring a shape: the node plus the
/// orientation and placement accumulated on the way down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    pub node: NodeId,
    pub orientation: Orientation,
    pub location: Isometry3,
}

// ─── Entity Store ───────────────────────────────────────────────────────────

/// Arena owning every topological node. Nodes may carry a placement that
/// applies to themselves and everything below them.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    nodes: SlotMap<NodeId, TopoNode>,
    locations: SecondaryMap<NodeId, Isometry3>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: TopoNode) -> NodeId {
        self.nodes.insert(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&TopoNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&TopoNode, TopologyError> {
        self.nodes.get(id).ok_or(TopologyError::NodeNotFound { node: id })
    }

    pub fn kind(&self, id: NodeId) -> Result<TopoKind, TopologyError> {
        self.node(id).map(TopoNode::kind)
    }

    /// Placement carried by `id` itself (identity when none was set).
    pub fn location(&self, id: NodeId) -> Isometry3 {
        self.locations.get(id).copied().unwrap_or_else(Isometry3::identity)
    }

    pub fn set_location(&mut self, id: NodeId, location: Isometry3) -> Result<(), TopologyError> {
        if !self.nodes.contains_key(id) {
            return Err(TopologyError::NodeNotFound { node: id });
        }
        self.locations.insert(id, location);
        Ok(())
    }

    /// Replace the placement of `id` with a translation/rotation pair.
    pub fn place(&mut self, id: NodeId, translation: Vector3, rotation: UnitQuaternion) -> Result<(), TopologyError> {
        self.set_location(id, Isometry3::from_parts(translation.into(), rotation))
    }

    pub fn vertex_point(&self, id: NodeId) -> Result<Point3, TopologyError> {
        match self.node(id)? {
            TopoNode::Vertex { point } => Ok(*point),
            other => Err(TopologyError::WrongKind {
                expected: TopoKind::Vertex,
                found: other.kind(),
            }),
        }
    }

    /// Start/end points and curve of an edge, in the edge's own frame.
    pub fn edge_geometry(&self, id: NodeId) -> Result<(Point3, Point3, EdgeCurve), TopologyError> {
        match self.node(id)? {
            TopoNode::Edge { start, end, curve } => {
                Ok((self.vertex_point(*start)?, self.vertex_point(*end)?, *curve))
            }
            other => Err(TopologyError::WrongKind {
                expected: TopoKind::Edge,
                found: other.kind(),
            }),
        }
    }

    /// Direct children with their orientation relative to `id`.
    ///
    /// An edge yields its start vertex forward and its end vertex reversed,
    /// so a closed edge lists the same vertex twice.
    pub fn children(&self, id: NodeId) -> Result<Vec<(NodeId, Orientation)>, TopologyError> {
        let fwd = |ids: &[NodeId]| ids.iter().map(|&c| (c, Orientation::Forward)).collect();
        Ok(match self.node(id)? {
            TopoNode::Vertex { .. } => Vec::new(),
            TopoNode::Edge { start, end, .. } => {
                vec![(*start, Orientation::Forward), (*end, Orientation::Reversed)]
            }
            TopoNode::Wire { edges } => edges.clone(),
            TopoNode::Face { outer, .. } => vec![(*outer, Orientation::Forward)],
            TopoNode::Shell { faces } => faces.clone(),
            TopoNode::Solid { shells } => fwd(shells),
            TopoNode::Compound { children } => fwd(children),
        })
    }

    /// Every occurrence of `kind` under `root`, depth first, in child order.
    ///
    /// Shared sub-shapes are reported once per path that reaches them, so a
    /// box yields 24 edge occurrences. The search does not descend below a
    /// match, and the root itself is reported when it has the wanted kind.
    pub fn explore(&self, root: NodeId, kind: TopoKind) -> Result<Vec<Occurrence>, TopologyError> {
        self.explore_from(root, Orientation::Forward, self.location(root), kind)
    }

    /// Like [`explore`](Self::explore), with `orientation` and `location`
    /// giving the full placement of `root` (its own placement included).
    pub fn explore_from(
        &self,
        root: NodeId,
        orientation: Orientation,
        location: Isometry3,
        kind: TopoKind,
    ) -> Result<Vec<Occurrence>, TopologyError> {
        let mut found = Vec::new();
        let mut stack = vec![(root, orientation, location)];
        while let Some((id, orientation, location)) = stack.pop() {
            if self.node(id)?.kind() == kind {
                found.push(Occurrence {
                    node: id,
                    orientation,
                    location,
                });
                continue;
            }
            // Reverse push keeps child order in the output.
            for (child, child_orientation) in self.children(id)?.into_iter().rev() {
                let child_location = match self.locations.get(child) {
                    Some(own) => location * own,
                    None => location,
                };
                stack.push((child, orientation.compose(child_orientation), child_location));
            }
        }
        Ok(found)
    }

    /// Remove `root` and every node below it.
    pub fn remove_tree(&mut self, root: NodeId) -> Result<usize, TopologyError> {
        let mut pending = vec![root];
        let mut removed = 0;
        while let Some(id) = pending.pop() {
            if !self.nodes.contains_key(id) {
                // Already removed through another path.
                continue;
            }
            pending.extend(self.children(id)?.into_iter().map(|(c, _)| c));
            self.nodes.remove(id);
            self.locations.remove(id);
            removed += 1;
        }
        Ok(removed)
    }
}
