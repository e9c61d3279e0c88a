//! Orbiting light rig.
//!
//! Six colored point lights circle a radius-10 ring while bobbing vertically
//! and pulsing in intensity, plus a spot light whose target sweeps a radius-5
//! circle. Ambient and directional levels are exposed as parameters. The rig
//! draws itself as glowing markers so the motion is visible.
//!
//! Time policy: delta, accumulated into the rig's own clock.

use std::f32::consts::FRAC_PI_3;

use glam::{Vec3, Vec4};

use crate::effect::Effect;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, NodeId, Scene};
use crate::time::FrameTime;
use crate::visuals::rgb_hex;

pub const NAME: &str = "lighting";

pub const RING_RADIUS: f32 = 10.0;
pub const SPOT_RADIUS: f32 = 5.0;
/// Height of the spot light above the origin.
pub const SPOT_HEIGHT: f32 = 20.0;

const COLORS: [u32; 6] = [0xff0040, 0x0040ff, 0x40ff00, 0xff4000, 0x4000ff, 0x00ff40];

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new("ambient", "Ambient intensity", 0.0, 2.0, 0.1, 0.4),
        ParamSpec::new("directional", "Directional intensity", 0.0, 3.0, 0.1, 1.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// Pose of light `i` at rig time `t`.
pub fn ring_light(i: usize, t: f32) -> (Vec3, f32) {
    let fi = i as f32;
    let angle = t * 0.5 + fi * FRAC_PI_3;
    let position = Vec3::new(
        angle.cos() * RING_RADIUS,
        (t * 0.3 + fi).sin() * 5.0 + 5.0,
        angle.sin() * RING_RADIUS,
    );
    (position, 1.0 + (t * 2.0 + fi).sin() * 0.5)
}

/// Spot target at rig time `t`.
pub fn spot_target(t: f32) -> Vec3 {
    Vec3::new((t * 0.3).cos() * SPOT_RADIUS, 0.0, (t * 0.3).sin() * SPOT_RADIUS)
}

/// The light rig effect.
pub struct LightRig {
    lifecycle: Lifecycle,
    params: ParamSet,
    time: f32,
    lights: [PointLight; 6],
    spot_target: Vec3,
}

impl LightRig {
    pub fn new(scene: &mut Scene) -> Self {
        let mut lights = [PointLight {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 2.0,
        }; 6];
        for (i, light) in lights.iter_mut().enumerate() {
            let (position, _) = ring_light(i, 0.0);
            light.position = position;
            light.color = rgb_hex(COLORS[i]);
        }

        let mut rig = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            time: 0.0,
            lights,
            spot_target: spot_target(0.0),
        };
        let node = scene.allocate(NAME);
        rig.lifecycle.attach(vec![node]);
        rig
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn spot_target(&self) -> Vec3 {
        self.spot_target
    }

    /// Accumulated rig time.
    pub fn time(&self) -> f32 {
        self.time
    }
}

impl Effect for LightRig {
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
        self.time += time.delta;
        for (i, light) in self.lights.iter_mut().enumerate() {
            let (position, intensity) = ring_light(i, self.time);
            light.position = position;
            light.intensity = intensity;
        }
        self.spot_target = spot_target(self.time);
    }

    fn draw(&self, _node: NodeId, out: &mut DrawList) {
        let ambient = self.params.value("ambient");
        for light in &self.lights {
            let glow = light.color * (light.intensity + ambient);
            out.push_point(light.position, 0.25 * light.intensity, glow, 1.0);
        }

        let spot = Vec3::new(0.0, SPOT_HEIGHT, 0.0);
        let beam = Vec4::new(1.0, 1.0, 1.0, 0.2 * self.params.value("directional"));
        out.push_line(spot, self.spot_target, beam);
        out.push_point(self.spot_target, 0.15, Vec3::ONE, 0.6);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lights_on_ring() {
        for i in 0..6 {
            for step in 0..50 {
                let (p, intensity) = ring_light(i, step as f32 * 0.37);
                let r = (p.x * p.x + p.z * p.z).sqrt();
                assert!((r - RING_RADIUS).abs() < 1e-3);
                assert!((0.0..=10.0).contains(&p.y));
                assert!((0.5..=1.5).contains(&intensity));
            }
        }
    }

    #[test]
    fn test_time_accumulates_delta() {
        let mut scene = Scene::new();
        let mut rig = LightRig::new(&mut scene);
        rig.start(&mut scene);
        rig.update(&FrameTime::new(0.25, 100.0, 0));
        rig.update(&FrameTime::new(0.25, 200.0, 1));
        assert!((rig.time() - 0.5).abs() < 1e-6);
        assert_eq!(rig.lights()[0].position, ring_light(0, 0.5).0);
    }

    #[test]
    fn test_spot_target_circle() {
        let target = spot_target(3.0);
        assert!((target.length() - SPOT_RADIUS).abs() < 1e-4);
        assert_eq!(target.y, 0.0);
    }

    #[test]
    fn test_draw_markers() {
        let mut scene = Scene::new();
        let rig = LightRig::new(&mut scene);
        let mut list = DrawList::new();
        rig.draw(rig.lifecycle().nodes()[0], &mut list);
        assert_eq!(list.points.len(), 7);
        assert_eq!(list.line_count(), 1);
    }
}
