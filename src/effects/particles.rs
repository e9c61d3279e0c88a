//! Recycling particle emitter.
//!
//! A fixed-size point cloud seeded in a ball around the origin. Particles fall
//! under gravity and are recycled back to the emitter when they leave the
//! active region, so the count only changes through `configure("count", ..)`.
//!
//! Time policy: delta. Velocities are in world units per second.
//!
//! ```
//! use vfxe::effect::Effect;
//! use vfxe::effects::Particles;
//! use vfxe::scene::Scene;
//!
//! let mut scene = Scene::new();
//! let mut particles = Particles::new(&mut scene);
//! particles.configure("count", 1000.0, &mut scene).unwrap();
//! assert_eq!(particles.count(), 1000);
//! ```

use glam::{Quat, Vec3};

use crate::effect::Effect;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, NodeId, Scene};
use crate::spawn::Spawner;
use crate::time::FrameTime;

pub const NAME: &str = "particles";

/// Particles farther than this from the origin are recycled.
pub const OUTER_BOUND: f32 = 10.0;
/// Particles below this height are recycled.
pub const FLOOR: f32 = -5.0;
/// Half-extent of the emitter jitter for recycled particles.
pub const EMITTER_JITTER: f32 = 0.05;

const VELOCITY_JITTER: f32 = 0.6;
const RESPAWN_LIFT: (f32, f32) = (1.2, 4.2);

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::integer("count", "Particle count", 0.0, 500_000.0, 1000.0, 50_000.0),
        ParamSpec::new("size", "Particle size", 0.01, 0.1, 0.01, 0.02),
        ParamSpec::new("opacity", "Opacity", 0.1, 1.0, 0.1, 0.8),
        ParamSpec::new("gravity", "Gravity", 0.0, 5.0, 0.01, 0.36),
        ParamSpec::new("spin", "Spin (rad/s)", 0.0, 2.0, 0.01, 0.12),
        ParamSpec::new("emission_radius", "Emission radius", 0.5, 10.0, 0.5, 5.0),
    ]
}

/// The particle effect.
pub struct Particles {
    lifecycle: Lifecycle,
    params: ParamSet,
    spawner: Spawner,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Vec<Vec3>,
    /// Aggregate rotation about Y, radians.
    rotation: f32,
}

impl Particles {
    pub fn new(scene: &mut Scene) -> Self {
        Self::with_spawner(scene, Spawner::default())
    }

    pub fn with_spawner(scene: &mut Scene, spawner: Spawner) -> Self {
        let mut particles = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            spawner,
            positions: Vec::new(),
            velocities: Vec::new(),
            colors: Vec::new(),
            rotation: 0.0,
        };
        particles.seed();
        let node = scene.allocate(NAME);
        particles.lifecycle.attach(vec![node]);
        particles
    }

    /// Number of live particles.
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// Positions in emitter space (before the aggregate rotation).
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Aggregate rotation about Y in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Reallocate every buffer at the configured count and reseed it.
    fn seed(&mut self) {
        let count = self.params.value("count") as usize;
        let radius = self.params.value("emission_radius");

        self.positions = Vec::with_capacity(count);
        self.velocities = Vec::with_capacity(count);
        self.colors = Vec::with_capacity(count);

        for _ in 0..count {
            self.positions.push(self.spawner.in_ball(radius));
            self.velocities.push(self.spawner.jitter(VELOCITY_JITTER));
            // Blue-violet band
            self.colors.push(self.spawner.hue_band(0.5, 0.3, 0.8, 0.6));
        }
        self.rotation = 0.0;
    }

    fn respawn(spawner: &mut Spawner, position: &mut Vec3, velocity: &mut Vec3) {
        *position = Vec3::new(
            spawner.centered(EMITTER_JITTER),
            spawner.range(0.0, EMITTER_JITTER * 2.0),
            spawner.centered(EMITTER_JITTER),
        );
        *velocity = Vec3::new(
            spawner.centered(VELOCITY_JITTER),
            spawner.range(RESPAWN_LIFT.0, RESPAWN_LIFT.1),
            spawner.centered(VELOCITY_JITTER),
        );
    }
}

impl Effect for Particles {
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
        if self.positions.is_empty() {
            return;
        }
        let dt = time.delta;
        let gravity = self.params.value("gravity");

        for (p, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            *p += *v * dt;
            v.y -= gravity * dt;

            if p.length() > OUTER_BOUND || p.y < FLOOR {
                Self::respawn(&mut self.spawner, p, v);
            }
        }

        self.rotation = (self.rotation + self.params.value("spin") * dt) % std::f32::consts::TAU;
    }

    fn draw(&self, _node: NodeId, out: &mut DrawList) {
        let spin = Quat::from_rotation_y(self.rotation);
        let size = self.params.value("size");
        let opacity = self.params.value("opacity");

        out.points.reserve(self.positions.len());
        for (p, c) in self.positions.iter().zip(&self.colors) {
            out.push_point(spin * *p, size, *c, opacity);
        }
    }

    fn apply(&mut self, param: &str, _value: f32, scene: &mut Scene) {
        if param == "count" || param == "emission_radius" {
            self.seed();
            let node = scene.allocate(NAME);
            self.lifecycle.replace_nodes(scene, vec![node]);
            log::info!("'{}' reinitialized with {} particles", NAME, self.count());
        }
    }

    fn release(&mut self) {
        self.positions = Vec::new();
        self.velocities = Vec::new();
        self.colors = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles(scene: &mut Scene, count: f32) -> Particles {
        let mut p = Particles::with_spawner(scene, Spawner::seeded(7));
        p.configure("count", count, scene).unwrap();
        p
    }

    #[test]
    fn test_init_within_radius() {
        let mut scene = Scene::new();
        let p = particles(&mut scene, 2000.0);
        assert_eq!(p.count(), 2000);
        assert!(p.positions().iter().all(|x| x.length() <= 5.0 + 1e-4));
    }

    #[test]
    fn test_default_count() {
        let mut scene = Scene::new();
        let p = Particles::with_spawner(&mut scene, Spawner::seeded(1));
        assert_eq!(p.count(), 50_000);
    }

    #[test]
    fn test_zero_count_update_is_noop() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 0.0);
        p.start(&mut scene);
        p.update(&FrameTime::new(0.016, 0.016, 0));
        assert_eq!(p.count(), 0);
        let mut list = DrawList::new();
        p.draw(p.lifecycle().nodes()[0], &mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn test_integrates_and_falls() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 10.0);
        p.params_mut().set("gravity", 1.0);
        p.start(&mut scene);

        let before = p.velocities().to_vec();
        p.update(&FrameTime::new(0.1, 0.1, 0));
        for (b, a) in before.iter().zip(p.velocities()) {
            // Either fell by g·dt or was recycled with an upward kick
            assert!((a.y - (b.y - 0.1)).abs() < 1e-5 || a.y >= RESPAWN_LIFT.0);
        }
    }

    #[test]
    fn test_escaped_particles_recycle() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 100.0);
        p.start(&mut scene);
        p.positions[0] = Vec3::new(20.0, 0.0, 0.0);
        p.positions[1] = Vec3::new(0.0, -6.0, 0.0);

        p.update(&FrameTime::new(0.0, 0.0, 0));

        for i in 0..2 {
            let pos = p.positions()[i];
            assert!(pos.x.abs() <= EMITTER_JITTER && pos.z.abs() <= EMITTER_JITTER);
            assert!((0.0..0.1).contains(&pos.y));
            assert!(p.velocities()[i].y >= RESPAWN_LIFT.0);
        }
    }

    #[test]
    fn test_count_stays_constant() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 500.0);
        p.start(&mut scene);
        for i in 0..300 {
            p.update(&FrameTime::new(0.05, i as f32 * 0.05, i));
        }
        assert_eq!(p.count(), 500);
        assert!(p
            .positions()
            .iter()
            .all(|x| x.length() <= OUTER_BOUND + 1.0 && x.y >= FLOOR - 1.0));
    }

    #[test]
    fn test_resize_swaps_node_while_active() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 100.0);
        p.start(&mut scene);
        let old = p.lifecycle().nodes()[0];

        p.configure("count", 300.0, &mut scene).unwrap();

        let new = p.lifecycle().nodes()[0];
        assert_ne!(old, new);
        assert!(!scene.contains(old));
        assert!(scene.contains(new));
        assert_eq!(scene.len(), 1);
        assert_eq!(p.count(), 300);
    }

    #[test]
    fn test_count_clamped_to_bound() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 0.0);
        let stored = p.configure("count", 1e9, &mut scene).unwrap();
        assert_eq!(stored, 500_000.0);
    }

    #[test]
    fn test_draw_uses_size_and_opacity() {
        let mut scene = Scene::new();
        let mut p = particles(&mut scene, 3.0);
        p.configure("size", 0.05, &mut scene).unwrap();
        p.configure("opacity", 0.5, &mut scene).unwrap();

        let mut list = DrawList::new();
        p.draw(p.lifecycle().nodes()[0], &mut list);
        assert_eq!(list.points.len(), 3);
        assert!(list.points.iter().all(|pt| pt.size == 0.05 && pt.color[3] == 0.5));
    }
}
