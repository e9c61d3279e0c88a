//! Ray-marched volumetric cloud.
//!
//! The cloud is a density field inside a bounding sphere:
//!
//! ```text
//! d(p, t) = clamp(fbm(p·scale + wind·t) − coverage, 0, 1) · density · edge(p)
//! ```
//!
//! where `edge` fades the last quarter of the radius to zero. Rendering marches
//! a ray through the sphere in `steps` fixed steps, compositing front to back
//! with `α = 1 − exp(−absorption·d·step)` and stopping once the accumulated
//! opacity reaches 0.99.
//!
//! The GPU draws the cloud with `gpu/shaders/volumetric.wgsl`; [`Cloud`] is
//! the CPU reference used by snapshots and tests.
//!
//! Time policy: absolute.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::effect::Effect;
use crate::field::fbm;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, FullscreenPass, NodeId, Scene};
use crate::time::FrameTime;

pub const NAME: &str = "volumetric";

/// Accumulated opacity at which a march stops.
pub const OPACITY_CUTOFF: f32 = 0.99;

const NOISE_SCALE: f32 = 0.6;
const CLOUD_RADIUS: f32 = 4.0;
const CLOUD_CENTER: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const LIT_COLOR: Vec3 = Vec3::new(1.0, 0.97, 0.92);
const SHADOW_COLOR: Vec3 = Vec3::new(0.35, 0.38, 0.5);

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new("density", "Density", 0.1, 5.0, 0.1, 1.5),
        ParamSpec::new("absorption", "Absorption", 0.1, 10.0, 0.1, 3.0),
        ParamSpec::new("coverage", "Coverage", 0.0, 1.0, 0.05, 0.35),
        ParamSpec::integer("steps", "March steps", 8.0, 256.0, 8.0, 64.0),
        ParamSpec::integer("octaves", "Noise octaves", 1.0, 8.0, 1.0, 5.0),
        ParamSpec::new("wind", "Wind speed", 0.0, 2.0, 0.05, 0.3),
    ]
}

/// Uniform block of `volumetric.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct VolumeUniforms {
    pub center: [f32; 3],
    pub radius: f32,
    pub wind: [f32; 3],
    pub time: f32,
    pub color: [f32; 3],
    pub density: f32,
    pub absorption: f32,
    pub coverage: f32,
    pub scale: f32,
    pub steps: u32,
    pub octaves: u32,
    pub _pad: [u32; 3],
}

/// CPU description of the cloud at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cloud {
    pub center: Vec3,
    pub radius: f32,
    /// Noise-space drift per second.
    pub wind: Vec3,
    pub time: f32,
    pub color: Vec3,
    pub density: f32,
    pub absorption: f32,
    pub coverage: f32,
    pub scale: f32,
    pub steps: u32,
    pub octaves: u32,
}

impl Default for Cloud {
    fn default() -> Self {
        Self {
            center: CLOUD_CENTER,
            radius: CLOUD_RADIUS,
            wind: Vec3::new(0.3, 0.0, 0.1),
            time: 0.0,
            color: LIT_COLOR,
            density: 1.5,
            absorption: 3.0,
            coverage: 0.35,
            scale: NOISE_SCALE,
            steps: 64,
            octaves: 5,
        }
    }
}

impl Cloud {
    /// Density at world position `p`. Zero outside the bounding sphere.
    pub fn density_at(&self, p: Vec3) -> f32 {
        let dist = p.distance(self.center);
        if dist >= self.radius {
            return 0.0;
        }
        let edge = ((self.radius - dist) / (self.radius * 0.25)).clamp(0.0, 1.0);
        let q = p * self.scale + self.wind * self.time;
        (fbm(q, self.octaves) - self.coverage).clamp(0.0, 1.0) * self.density * edge
    }

    /// Entry and exit distances of a ray through the bounding sphere.
    pub fn bounds(&self, origin: Vec3, dir: Vec3) -> Option<(f32, f32)> {
        let oc = origin - self.center;
        let b = oc.dot(dir);
        let c = oc.length_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let far = -b + root;
        if far <= 0.0 {
            return None;
        }
        Some(((-b - root).max(0.0), far))
    }

    /// Step through the cloud along a ray. `dir` must be normalized.
    ///
    /// Yields one [`MarchSample`] per step with the running composite. Stops
    /// after `steps` samples or once opacity reaches [`OPACITY_CUTOFF`].
    pub fn march(&self, origin: Vec3, dir: Vec3) -> RayMarch<'_> {
        let (start, end, remaining) = match self.bounds(origin, dir) {
            Some((near, far)) => (near, far, self.steps),
            None => (0.0, 0.0, 0),
        };
        let step = if remaining > 0 {
            (end - start) / remaining as f32
        } else {
            0.0
        };
        RayMarch {
            cloud: self,
            origin,
            dir,
            t: start + step * 0.5,
            step,
            remaining,
            color: Vec3::ZERO,
            opacity: 0.0,
        }
    }

    /// Premultiplied color and opacity along a ray.
    pub fn integrate(&self, origin: Vec3, dir: Vec3) -> (Vec3, f32) {
        self.march(origin, dir)
            .last()
            .map(|s| (s.color, s.opacity))
            .unwrap_or((Vec3::ZERO, 0.0))
    }

    /// Self-shadowing approximation: brighter toward the top of the sphere.
    fn shade(&self, p: Vec3) -> Vec3 {
        let h = ((p.y - self.center.y) / self.radius * 0.5 + 0.5).clamp(0.0, 1.0);
        SHADOW_COLOR.lerp(self.color, h)
    }

    pub fn uniforms(&self) -> VolumeUniforms {
        VolumeUniforms {
            center: self.center.to_array(),
            radius: self.radius,
            wind: self.wind.to_array(),
            time: self.time,
            color: self.color.to_array(),
            density: self.density,
            absorption: self.absorption,
            coverage: self.coverage,
            scale: self.scale,
            steps: self.steps,
            octaves: self.octaves,
            _pad: [0; 3],
        }
    }
}

impl From<&VolumeUniforms> for Cloud {
    fn from(u: &VolumeUniforms) -> Self {
        Self {
            center: Vec3::from_array(u.center),
            radius: u.radius,
            wind: Vec3::from_array(u.wind),
            time: u.time,
            color: Vec3::from_array(u.color),
            density: u.density,
            absorption: u.absorption,
            coverage: u.coverage,
            scale: u.scale,
            steps: u.steps,
            octaves: u.octaves,
        }
    }
}

/// One step of a march, with the composite accumulated so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchSample {
    pub position: Vec3,
    pub density: f32,
    /// Opacity contributed by this step alone.
    pub alpha: f32,
    /// Premultiplied color so far.
    pub color: Vec3,
    /// Accumulated opacity so far.
    pub opacity: f32,
}

/// Iterator returned by [`Cloud::march`].
pub struct RayMarch<'a> {
    cloud: &'a Cloud,
    origin: Vec3,
    dir: Vec3,
    t: f32,
    step: f32,
    remaining: u32,
    color: Vec3,
    opacity: f32,
}

impl Iterator for RayMarch<'_> {
    type Item = MarchSample;

    fn next(&mut self) -> Option<MarchSample> {
        if self.remaining == 0 || self.opacity >= OPACITY_CUTOFF {
            return None;
        }
        self.remaining -= 1;

        let position = self.origin + self.dir * self.t;
        self.t += self.step;

        let density = self.cloud.density_at(position);
        let alpha = 1.0 - (-self.cloud.absorption * density * self.step).exp();
        let weight = (1.0 - self.opacity) * alpha;
        self.color += self.cloud.shade(position) * weight;
        self.opacity = (self.opacity + weight).min(1.0);

        Some(MarchSample {
            position,
            density,
            alpha,
            color: self.color,
            opacity: self.opacity,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// The volumetric cloud effect.
pub struct Volumetric {
    lifecycle: Lifecycle,
    params: ParamSet,
    time: f32,
}

impl Volumetric {
    pub fn new(scene: &mut Scene) -> Self {
        let mut volumetric = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            time: 0.0,
        };
        let node = scene.allocate(NAME);
        volumetric.lifecycle.attach(vec![node]);
        volumetric
    }

    /// The cloud as of the last update.
    pub fn cloud(&self) -> Cloud {
        let wind = self.params.value("wind");
        Cloud {
            wind: Vec3::new(wind, 0.0, wind * 0.3),
            time: self.time,
            density: self.params.value("density"),
            absorption: self.params.value("absorption"),
            coverage: self.params.value("coverage"),
            steps: self.params.value("steps") as u32,
            octaves: self.params.value("octaves") as u32,
            ..Cloud::default()
        }
    }
}

impl Effect for Volumetric {
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
        self.time = time.elapsed;
    }

    fn draw(&self, _node: NodeId, out: &mut DrawList) {
        out.push_pass(FullscreenPass::Volumetric(self.cloud().uniforms()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense() -> Cloud {
        Cloud {
            density: 5.0,
            absorption: 10.0,
            coverage: 0.0,
            ..Cloud::default()
        }
    }

    #[test]
    fn test_opacity_monotone_and_bounded() {
        let cloud = Cloud::default();
        let origin = Vec3::new(0.0, 1.0, 10.0);
        for i in 0..20 {
            let dir = (Vec3::new(i as f32 * 0.1 - 1.0, 0.0, 0.0) - origin).normalize();
            let mut last = 0.0;
            for s in cloud.march(origin, dir) {
                assert!(s.opacity >= last);
                assert!(s.opacity <= 1.0);
                assert!((0.0..=1.0).contains(&s.alpha));
                last = s.opacity;
            }
        }
    }

    #[test]
    fn test_march_respects_step_budget() {
        let cloud = Cloud {
            steps: 16,
            ..Cloud::default()
        };
        let n = cloud.march(Vec3::new(0.0, 1.0, 10.0), Vec3::NEG_Z).count();
        assert!(n <= 16);
    }

    #[test]
    fn test_dense_cloud_exits_early() {
        let cloud = Cloud {
            steps: 256,
            ..dense()
        };
        let samples: Vec<_> = cloud.march(Vec3::new(0.0, 1.0, 10.0), Vec3::NEG_Z).collect();
        assert!(samples.len() < 256);
        assert!(samples.last().unwrap().opacity >= OPACITY_CUTOFF);
    }

    #[test]
    fn test_ray_missing_sphere() {
        let cloud = Cloud::default();
        assert_eq!(cloud.march(Vec3::new(0.0, 20.0, 10.0), Vec3::NEG_Z).count(), 0);
        assert_eq!(cloud.integrate(Vec3::new(0.0, 20.0, 10.0), Vec3::NEG_Z).1, 0.0);
        // Sphere behind the ray origin
        assert!(cloud.bounds(Vec3::new(0.0, 1.0, 10.0), Vec3::Z).is_none());
    }

    #[test]
    fn test_density_zero_outside_sphere() {
        let cloud = dense();
        assert_eq!(cloud.density_at(Vec3::new(0.0, 1.0, 4.5)), 0.0);
        assert!(cloud.density_at(cloud.center) >= 0.0);
    }

    #[test]
    fn test_field_is_pure() {
        let cloud = Cloud {
            time: 3.0,
            ..Cloud::default()
        };
        let p = Vec3::new(0.5, 1.2, -0.7);
        assert_eq!(cloud.density_at(p), cloud.density_at(p));
    }

    #[test]
    fn test_uniform_round_trip_preserves_march() {
        let cloud = Cloud {
            time: 2.0,
            ..Cloud::default()
        };
        let back = Cloud::from(&cloud.uniforms());
        assert_eq!(back, cloud);
        assert_eq!(std::mem::size_of::<VolumeUniforms>(), 80);
    }

    #[test]
    fn test_effect_emits_pass_with_params() {
        let mut scene = Scene::new();
        let mut v = Volumetric::new(&mut scene);
        v.configure("steps", 300.0, &mut scene).unwrap();
        v.start(&mut scene);
        v.update(&FrameTime::new(0.016, 7.0, 0));

        let mut list = DrawList::new();
        v.draw(v.lifecycle().nodes()[0], &mut list);
        match list.passes.as_slice() {
            [FullscreenPass::Volumetric(u)] => {
                assert_eq!(u.steps, 256);
                assert_eq!(u.time, 7.0);
            }
            other => panic!("unexpected passes {:?}", other),
        }
    }
}
