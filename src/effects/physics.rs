//! Falling rigid bodies.
//!
//! Semi-implicit Euler with ad-hoc restitution: gravity, a ground plane,
//! four side walls, and a kill plane that teleports lost bodies back to the
//! spawn region. Bodies do not collide with each other.
//!
//! Each body is its own scene node.
//!
//! Time policy: delta.

use glam::{EulerRot, Quat, Vec3, Vec4};

use crate::effect::Effect;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, NodeId, Scene};
use crate::spawn::Spawner;
use crate::time::FrameTime;

pub const NAME: &str = "physics";

/// Height of the ground contact plane.
pub const GROUND_Y: f32 = -1.9;
/// Side walls at `|x| = WALL` and `|z| = WALL`.
pub const WALL: f32 = 10.0;
/// Bodies below this are teleported back to the spawn region.
pub const KILL_Y: f32 = -10.0;
/// Half-extent of the spawn region in X and Z.
pub const SPAWN_HALF_WIDTH: f32 = 2.5;

const LATERAL_SPEED: f32 = 3.0;
const MAX_SPIN: f32 = 6.0;
const HALF_EXTENT: f32 = 0.1;

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::integer("count", "Body count", 0.0, 64.0, 1.0, 10.0),
        ParamSpec::new("gravity", "Gravity", 0.0, 36.0, 0.1, 3.6),
        ParamSpec::new("restitution", "Restitution", 0.0, 1.0, 0.05, 0.8),
        ParamSpec::new("friction", "Ground friction", 0.5, 1.0, 0.01, 0.99),
    ]
}

/// One falling cube.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Euler angles (XYZ), radians.
    pub rotation: Vec3,
    pub angular_velocity: Vec3,
    pub half_extent: f32,
    pub color: Vec3,
}

impl RigidBody {
    /// Orientation as a quaternion.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// The 8 world-space cube corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let q = self.orientation();
        let h = self.half_extent;
        let mut out = [Vec3::ZERO; 8];
        for (i, c) in out.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { -h } else { h },
                if i & 2 == 0 { -h } else { h },
                if i & 4 == 0 { -h } else { h },
            );
            *c = self.position + q * local;
        }
        out
    }
}

/// Collision constants shared by every body in one step.
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
}

/// The rigid-body effect.
pub struct Physics {
    lifecycle: Lifecycle,
    params: ParamSet,
    spawner: Spawner,
    bodies: Vec<RigidBody>,
}

impl Physics {
    pub fn new(scene: &mut Scene) -> Self {
        Self::with_spawner(scene, Spawner::default())
    }

    pub fn with_spawner(scene: &mut Scene, spawner: Spawner) -> Self {
        let mut physics = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            spawner,
            bodies: Vec::new(),
        };
        physics.seed();
        let nodes = physics.allocate_nodes(scene);
        physics.lifecycle.attach(nodes);
        physics
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// Mutable access, mostly for placing bodies in tests and demos.
    pub fn bodies_mut(&mut self) -> &mut [RigidBody] {
        &mut self.bodies
    }

    fn step_params(&self) -> StepParams {
        StepParams {
            gravity: self.params.value("gravity"),
            restitution: self.params.value("restitution"),
            friction: self.params.value("friction"),
        }
    }

    fn allocate_nodes(&self, scene: &mut Scene) -> Vec<NodeId> {
        (0..self.bodies.len()).map(|_| scene.allocate(NAME)).collect()
    }

    fn seed(&mut self) {
        let count = self.params.value("count") as usize;
        let spawner = &mut self.spawner;
        self.bodies = (0..count)
            .map(|_| {
                let position = Vec3::new(
                    spawner.centered(SPAWN_HALF_WIDTH),
                    spawner.range(5.0, 15.0),
                    spawner.centered(SPAWN_HALF_WIDTH),
                );
                RigidBody {
                    position,
                    velocity: lateral_velocity(spawner),
                    rotation: Vec3::ZERO,
                    angular_velocity: Vec3::new(
                        spawner.range(0.0, MAX_SPIN),
                        spawner.range(0.0, MAX_SPIN),
                        spawner.range(0.0, MAX_SPIN),
                    ),
                    half_extent: HALF_EXTENT,
                    color: spawner.hue_band(0.0, 1.0, 0.8, 0.6),
                }
            })
            .collect();
    }
}

fn lateral_velocity(spawner: &mut Spawner) -> Vec3 {
    Vec3::new(
        spawner.centered(LATERAL_SPEED * 0.5),
        0.0,
        spawner.centered(LATERAL_SPEED * 0.5),
    )
}

/// Advance one body by `dt`. Returns `true` if it fell through the kill plane
/// and needs to be respawned.
pub fn step_body(body: &mut RigidBody, dt: f32, params: &StepParams) -> bool {
    body.velocity.y -= params.gravity * dt;
    body.position += body.velocity * dt;
    body.rotation += body.angular_velocity * dt;

    if body.position.y < GROUND_Y {
        body.position.y = GROUND_Y;
        body.velocity.y = -body.velocity.y * params.restitution;
        body.velocity.x *= params.friction;
        body.velocity.z *= params.friction;
    }

    if body.position.x.abs() > WALL {
        body.velocity.x = -body.velocity.x * params.restitution;
        body.position.x = WALL.copysign(body.position.x);
    }
    if body.position.z.abs() > WALL {
        body.velocity.z = -body.velocity.z * params.restitution;
        body.position.z = WALL.copysign(body.position.z);
    }

    body.position.y < KILL_Y
}

impl Effect for Physics {
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
        let params = self.step_params();
        for body in &mut self.bodies {
            if step_body(body, time.delta, &params) {
                body.position = Vec3::new(
                    self.spawner.centered(SPAWN_HALF_WIDTH),
                    self.spawner.range(10.0, 15.0),
                    self.spawner.centered(SPAWN_HALF_WIDTH),
                );
                body.velocity = lateral_velocity(&mut self.spawner);
            }
        }
    }

    fn draw(&self, node: NodeId, out: &mut DrawList) {
        let Some(index) = self.lifecycle.nodes().iter().position(|&n| n == node) else {
            return;
        };
        let Some(body) = self.bodies.get(index) else {
            return;
        };

        const EDGES: [(usize, usize); 12] = [
            (0, 1), (2, 3), (4, 5), (6, 7),
            (0, 2), (1, 3), (4, 6), (5, 7),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        let corners = body.corners();
        let color = Vec4::from((body.color, 1.0));
        for (a, b) in EDGES {
            out.push_line(corners[a], corners[b], color);
        }
    }

    fn apply(&mut self, param: &str, _value: f32, scene: &mut Scene) {
        if param == "count" {
            self.seed();
            let nodes = self.allocate_nodes(scene);
            self.lifecycle.replace_nodes(scene, nodes);
            log::info!("'{}' reinitialized with {} bodies", NAME, self.bodies.len());
        }
    }

    fn release(&mut self) {
        self.bodies = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StepParams {
        StepParams {
            gravity: 3.6,
            restitution: 0.8,
            friction: 0.99,
        }
    }

    fn body_at(position: Vec3, velocity: Vec3) -> RigidBody {
        RigidBody {
            position,
            velocity,
            rotation: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            half_extent: HALF_EXTENT,
            color: Vec3::ONE,
        }
    }

    #[test]
    fn test_one_node_per_body() {
        let mut scene = Scene::new();
        let mut physics = Physics::with_spawner(&mut scene, Spawner::seeded(3));
        assert_eq!(physics.bodies().len(), 10);
        assert_eq!(physics.lifecycle().nodes().len(), 10);

        physics.start(&mut scene);
        assert_eq!(scene.len(), 10);
    }

    #[test]
    fn test_ground_clamp_and_bounce() {
        let mut body = body_at(Vec3::new(0.0, -1.85, 0.0), Vec3::new(1.0, -5.0, 1.0));
        step_body(&mut body, 0.1, &params());
        assert_eq!(body.position.y, GROUND_Y);
        assert!(body.velocity.y > 0.0);
        assert!((body.velocity.y - (5.0 + 0.36) * 0.8).abs() < 1e-4);
        assert!((body.velocity.x - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_never_ends_frame_below_ground() {
        let mut body = body_at(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, -200.0, 0.0));
        for _ in 0..100 {
            let respawn = step_body(&mut body, 0.1, &params());
            assert!(!respawn);
            assert!(body.position.y >= GROUND_Y);
        }
    }

    #[test]
    fn test_walls_reflect() {
        let mut body = body_at(Vec3::new(9.95, 5.0, -9.95), Vec3::new(2.0, 0.0, -2.0));
        step_body(&mut body, 0.1, &params());
        assert_eq!(body.position.x, WALL);
        assert_eq!(body.position.z, -WALL);
        assert!(body.velocity.x < 0.0 && body.velocity.z > 0.0);
    }

    #[test]
    fn test_ground_resolves_before_kill_plane() {
        let mut body = body_at(Vec3::new(0.0, -50.0, 0.0), Vec3::ZERO);
        assert!(!step_body(&mut body, 0.016, &params()));
        assert_eq!(body.position.y, GROUND_Y);
    }

    #[test]
    fn test_bodies_move_when_active() {
        let mut scene = Scene::new();
        let mut physics = Physics::with_spawner(&mut scene, Spawner::seeded(5));
        let before = physics.bodies().to_vec();

        physics.update(&FrameTime::new(0.016, 0.016, 0));
        assert_eq!(physics.bodies(), before.as_slice());

        physics.start(&mut scene);
        physics.update(&FrameTime::new(0.016, 0.032, 1));
        assert!(physics
            .bodies()
            .iter()
            .zip(&before)
            .all(|(a, b)| a.position != b.position));
    }

    #[test]
    fn test_resize_replaces_every_node() {
        let mut scene = Scene::new();
        let mut physics = Physics::with_spawner(&mut scene, Spawner::seeded(6));
        physics.start(&mut scene);
        let old = physics.lifecycle().nodes().to_vec();

        physics.configure("count", 20.0, &mut scene).unwrap();
        assert_eq!(physics.bodies().len(), 20);
        assert_eq!(scene.len(), 20);
        assert!(old.iter().all(|n| !scene.contains(*n)));

        let stored = physics.configure("count", 100.0, &mut scene).unwrap();
        assert_eq!(stored, 64.0);
        assert_eq!(scene.len(), 64);
    }

    #[test]
    fn test_draw_one_cube_per_node() {
        let mut scene = Scene::new();
        let physics = Physics::with_spawner(&mut scene, Spawner::seeded(7));
        let mut list = DrawList::new();
        for &node in physics.lifecycle().nodes() {
            physics.draw(node, &mut list);
        }
        assert_eq!(list.line_count(), 12 * 10);
    }
}
