//! Scene membership and per-frame draw data.
//!
//! The [`Scene`] is the set of renderable nodes currently eligible for
//! rendering. Effects allocate their node ids once and insert or remove them
//! when toggled; the renderable data itself stays inside the effect.
//!
//! Each frame the driver asks every effect whose nodes are in the scene to
//! append primitives to a [`DrawList`], which is what a
//! [`Renderer`](crate::renderer::Renderer) consumes.

use std::collections::{BTreeMap, BTreeSet};

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::effects::raytrace::RayUniforms;
use crate::effects::volumetric::VolumeUniforms;

/// Handle of one renderable object owned by an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw numeric id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The render graph: which allocated nodes are currently visible.
#[derive(Debug, Default)]
pub struct Scene {
    next_id: u64,
    owners: BTreeMap<NodeId, String>,
    members: BTreeSet<NodeId>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new node for `owner`. The node starts outside the scene.
    pub fn allocate(&mut self, owner: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.owners.insert(id, owner.to_string());
        id
    }

    /// Forget an allocated node, removing it from the scene if present.
    pub fn release(&mut self, id: NodeId) {
        self.members.remove(&id);
        self.owners.remove(&id);
    }

    /// Make `id` visible. Returns `false` if it already was, or if it was never
    /// allocated.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if !self.owners.contains_key(&id) {
            return false;
        }
        self.members.insert(id)
    }

    /// Hide `id`. Returns `false` if it was not visible.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.members.remove(&id)
    }

    /// Whether `id` is currently visible.
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Owner name of an allocated node.
    pub fn owner(&self, id: NodeId) -> Option<&str> {
        self.owners.get(&id).map(String::as_str)
    }

    /// Number of visible nodes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of allocated nodes, visible or not.
    pub fn allocated(&self) -> usize {
        self.owners.len()
    }

    /// Visible nodes in allocation order.
    pub fn visible(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied()
    }

    /// Visible nodes belonging to `owner`.
    pub fn visible_for<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.members
            .iter()
            .copied()
            .filter(move |id| self.owner(*id) == Some(owner))
    }
}

/// One billboard point.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    /// World-space radius.
    pub size: f32,
    /// Linear RGB plus alpha.
    pub color: [f32; 4],
}

impl PointInstance {
    pub fn new(position: Vec3, size: f32, color: Vec3, alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            size,
            color: color.extend(alpha).to_array(),
        }
    }
}

/// One end of a line segment. Lines are emitted as vertex pairs.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// A full-screen shading pass with its uniforms for this frame.
#[derive(Clone, Copy, Debug)]
pub enum FullscreenPass {
    /// Ray-marched volumetric cloud.
    Volumetric(VolumeUniforms),
    /// Sphere-traced reflective scene.
    RayTraced(RayUniforms),
}

/// Everything the renderer needs for one frame.
///
/// Cleared (not reallocated) between frames so steady-state frames do not
/// allocate.
#[derive(Debug, Default)]
pub struct DrawList {
    pub points: Vec<PointInstance>,
    pub lines: Vec<LineVertex>,
    pub passes: Vec<FullscreenPass>,
    /// Nodes that contributed to this frame.
    pub nodes: Vec<NodeId>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop contents, keeping capacity.
    pub fn clear(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.passes.clear();
        self.nodes.clear();
    }

    pub fn push_point(&mut self, position: Vec3, size: f32, color: Vec3, alpha: f32) {
        self.points
            .push(PointInstance::new(position, size, color, alpha));
    }

    pub fn push_line(&mut self, a: Vec3, b: Vec3, color: Vec4) {
        let color = color.to_array();
        self.lines.push(LineVertex {
            position: a.to_array(),
            color,
        });
        self.lines.push(LineVertex {
            position: b.to_array(),
            color,
        });
    }

    pub fn push_pass(&mut self, pass: FullscreenPass) {
        self.passes.push(pass);
    }

    /// Number of line segments.
    pub fn line_count(&self) -> usize {
        self.lines.len() / 2
    }

    /// Whether nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty() && self.passes.is_empty()
    }
}
