//! Neural network visualization.
//!
//! A layered graph whose nodes pulse with a per-node phase, fully connected
//! between adjacent layers, plus an independent cloud of "data flow" particles
//! bouncing around inside a box. Nothing is learned; it only looks busy.
//!
//! Time policy: the graph is a pure function of elapsed time. The flow cloud
//! integrates delta; the two share no state and are separate scene nodes.

use glam::{Vec3, Vec4};

use crate::effect::Effect;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, NodeId, Scene};
use crate::spawn::Spawner;
use crate::time::FrameTime;
use crate::visuals::rgb_hex;

pub const NAME: &str = "neural";

/// Default layer sizes, input to output.
pub const DEFAULT_LAYERS: [usize; 5] = [4, 8, 8, 6, 3];
/// Half extents of the flow cloud box.
pub const FLOW_BOX: Vec3 = Vec3::new(5.0, 3.0, 2.0);

const LAYER_SPACING: f32 = 2.0;
const NODE_SPACING: f32 = 0.8;
const BOB: f32 = 0.05;

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new("pulse_speed", "Pulse speed", 0.1, 10.0, 0.1, 2.0),
        ParamSpec::integer("flow_count", "Flow particles", 0.0, 5000.0, 50.0, 300.0),
        ParamSpec::new("flow_speed", "Flow speed", 0.0, 5.0, 0.1, 1.0),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub layer: usize,
    /// Rest position.
    pub base: Vec3,
    pub phase: f32,
    /// Current activity in `[0, 1]`.
    pub activity: f32,
    /// Current (bobbing) position.
    pub position: Vec3,
}

impl GraphNode {
    /// Emissive strength derived from activity.
    pub fn emissive(&self) -> f32 {
        0.2 + 0.8 * self.activity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub phase: f32,
    pub opacity: f32,
}

/// Node activity at time `t`: `(sin(speed·t + phase) + 1) / 2`.
#[inline]
pub fn activity(t: f32, speed: f32, phase: f32) -> f32 {
    ((speed * t + phase).sin() + 1.0) * 0.5
}

/// Edge opacity at time `t`, in `[0.1, 0.6]`.
#[inline]
pub fn edge_opacity(t: f32, phase: f32) -> f32 {
    0.1 + 0.5 * ((2.0 * t + phase).sin() + 1.0) * 0.5
}

/// The neural graph effect.
pub struct NeuralGraph {
    lifecycle: Lifecycle,
    params: ParamSet,
    spawner: Spawner,
    layers: Vec<usize>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    flow_positions: Vec<Vec3>,
    flow_velocities: Vec<Vec3>,
    node_color: Vec3,
    edge_color: Vec3,
    flow_color: Vec3,
}

impl NeuralGraph {
    pub fn new(scene: &mut Scene) -> Self {
        Self::with_spawner(scene, Spawner::default())
    }

    pub fn with_spawner(scene: &mut Scene, spawner: Spawner) -> Self {
        Self::with_layers(scene, spawner, &DEFAULT_LAYERS)
    }

    /// A graph with custom layer sizes.
    pub fn with_layers(scene: &mut Scene, spawner: Spawner, layers: &[usize]) -> Self {
        let mut graph = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            spawner,
            layers: layers.to_vec(),
            nodes: Vec::new(),
            edges: Vec::new(),
            flow_positions: Vec::new(),
            flow_velocities: Vec::new(),
            node_color: rgb_hex(0x00d4ff),
            edge_color: rgb_hex(0x667eea),
            flow_color: rgb_hex(0xff6bcb),
        };
        graph.build_topology();
        graph.seed_flow();
        let nodes = vec![scene.allocate(NAME), scene.allocate(NAME)];
        graph.lifecycle.attach(nodes);
        graph
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn flow_positions(&self) -> &[Vec3] {
        &self.flow_positions
    }

    /// Scene node holding the graph.
    pub fn graph_node(&self) -> Option<NodeId> {
        self.lifecycle.nodes().first().copied()
    }

    /// Scene node holding the flow cloud.
    pub fn flow_node(&self) -> Option<NodeId> {
        self.lifecycle.nodes().get(1).copied()
    }

    fn build_topology(&mut self) {
        let width = (self.layers.len().saturating_sub(1)) as f32 * LAYER_SPACING;
        let mut first_of_layer = Vec::with_capacity(self.layers.len());

        for (layer, &size) in self.layers.iter().enumerate() {
            first_of_layer.push(self.nodes.len());
            let height = (size.saturating_sub(1)) as f32 * NODE_SPACING;
            for i in 0..size {
                let base = Vec3::new(
                    layer as f32 * LAYER_SPACING - width * 0.5,
                    i as f32 * NODE_SPACING - height * 0.5,
                    self.spawner.centered(0.5),
                );
                self.nodes.push(GraphNode {
                    layer,
                    base,
                    phase: self.spawner.phase(),
                    activity: 0.0,
                    position: base,
                });
            }
        }

        for layer in 0..self.layers.len().saturating_sub(1) {
            let (a, b) = (first_of_layer[layer], first_of_layer[layer + 1]);
            for from in a..a + self.layers[layer] {
                for to in b..b + self.layers[layer + 1] {
                    let phase = self.spawner.phase();
                    self.edges.push(GraphEdge {
                        from,
                        to,
                        phase,
                        opacity: edge_opacity(0.0, phase),
                    });
                }
            }
        }
    }

    fn seed_flow(&mut self) {
        let count = self.params.value("flow_count") as usize;
        let spawner = &mut self.spawner;
        self.flow_positions = (0..count).map(|_| spawner.in_box(-FLOW_BOX, FLOW_BOX)).collect();
        self.flow_velocities = (0..count).map(|_| spawner.jitter(0.5)).collect();
    }
}

impl Effect for NeuralGraph {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn simulate(&mut self, time: &FrameTime) {
        let t = time.elapsed;
        let speed = self.params.value("pulse_speed");

        for node in &mut self.nodes {
            node.activity = activity(t, speed, node.phase);
            node.position = node.base + Vec3::Y * BOB * (t + node.phase).sin();
        }
        for edge in &mut self.edges {
            edge.opacity = edge_opacity(t, edge.phase);
        }

        let dt = time.delta * self.params.value("flow_speed");
        for (p, v) in self.flow_positions.iter_mut().zip(self.flow_velocities.iter_mut()) {
            *p += *v * dt;
            for axis in 0..3 {
                if p[axis].abs() > FLOW_BOX[axis] {
                    p[axis] = FLOW_BOX[axis].copysign(p[axis]);
                    v[axis] = -v[axis];
                }
            }
        }
    }

    fn draw(&self, node: NodeId, out: &mut DrawList) {
        if Some(node) == self.graph_node() {
            for n in &self.nodes {
                out.push_point(n.position, 0.12, self.node_color * n.emissive(), 1.0);
            }
            for e in &self.edges {
                let color = Vec4::from((self.edge_color, e.opacity));
                out.push_line(self.nodes[e.from].position, self.nodes[e.to].position, color);
            }
        } else if Some(node) == self.flow_node() {
            for p in &self.flow_positions {
                out.push_point(*p, 0.03, self.flow_color, 0.8);
            }
        }
    }

    fn apply(&mut self, param: &str, _value: f32, scene: &mut Scene) {
        if param == "flow_count" {
            self.seed_flow();
            let nodes = vec![scene.allocate(NAME), scene.allocate(NAME)];
            self.lifecycle.replace_nodes(scene, nodes);
            log::info!(
                "'{}' reinitialized with {} flow particles",
                NAME,
                self.flow_positions.len()
            );
        }
    }

    fn release(&mut self) {
        self.nodes = Vec::new();
        self.edges = Vec::new();
        self.flow_positions = Vec::new();
        self.flow_velocities = Vec::new();
    }
}
