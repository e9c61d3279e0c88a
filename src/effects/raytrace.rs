//! Sphere-traced reflective scene.
//!
//! Up to four spheres over a checkered ground plane, lit by one point light
//! orbiting at `(4cos ωt, 4, 4sin ωt)`. Reflections recurse to a bounded
//! depth; a ray that exhausts the depth budget, or misses everything, returns
//! the sky gradient. The final color is tone mapped (`c / (c + 1)`) and gamma
//! corrected (`c^(1/2.2)`).
//!
//! [`shade_pixel`] depends only on its arguments, so an image can be shaded
//! in any order. `gpu/shaders/raytrace.wgsl` runs the same math per fragment
//! with the recursion unrolled into a bounded loop.
//!
//! Time policy: absolute.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::camera::Camera;
use crate::effect::Effect;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, FullscreenPass, NodeId, Scene};
use crate::time::FrameTime;
use crate::visuals::{gamma_correct, tone_map};

pub const NAME: &str = "raytrace";

/// Maximum number of spheres the uniform block holds.
pub const MAX_SPHERES: usize = 4;
/// Height of the ground plane.
pub const PLANE_Y: f32 = -1.0;
/// Minimum hit distance; also the offset for secondary rays.
pub const EPSILON: f32 = 1e-3;

const HORIZON: Vec3 = Vec3::new(0.9, 0.85, 0.8);
const ZENITH: Vec3 = Vec3::new(0.25, 0.45, 0.85);
const LIGHT_ORBIT: f32 = 4.0;
const LIGHT_COLOR: Vec3 = Vec3::new(1.0, 0.95, 0.9);
const AMBIENT: f32 = 0.08;

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::integer("depth", "Reflection depth", 1.0, 8.0, 1.0, 5.0),
        ParamSpec::new("light_speed", "Light speed", 0.0, 5.0, 0.1, 0.5),
        ParamSpec::new("exposure", "Exposure", 0.1, 5.0, 0.1, 1.0),
    ]
}

/// A sphere and its surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub albedo: Vec3,
    /// `(reflectance, roughness, specular, emissive)`.
    pub material: Vec4,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, albedo: Vec3, material: Vec4) -> Self {
        Self {
            center,
            radius,
            albedo,
            material,
        }
    }
}

/// Nearest positive root of the ray–sphere quadratic. `dir` must be
/// normalized.
pub fn intersect_sphere(origin: Vec3, dir: Vec3, sphere: &Sphere) -> Option<f32> {
    let oc = origin - sphere.center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - sphere.radius * sphere.radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    if near > EPSILON {
        return Some(near);
    }
    let far = -b + root;
    (far > EPSILON).then_some(far)
}

/// Distance along the ray to the horizontal plane at `height`.
pub fn intersect_plane(origin: Vec3, dir: Vec3, height: f32) -> Option<f32> {
    if dir.y.abs() < 1e-6 {
        return None;
    }
    let t = (height - origin.y) / dir.y;
    (t > EPSILON).then_some(t)
}

/// Background for rays that escape: `mix(horizon, zenith, 0.5·(dir.y + 1))`.
pub fn sky(dir: Vec3) -> Vec3 {
    HORIZON.lerp(ZENITH, 0.5 * (dir.y + 1.0))
}

/// What a ray hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Sphere(usize),
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: Surface,
}

/// The traced scene at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RayScene {
    pub spheres: Vec<Sphere>,
    pub plane_y: f32,
    pub light: Vec3,
    pub depth: u32,
    pub exposure: f32,
}

impl Default for RayScene {
    fn default() -> Self {
        Self {
            spheres: default_spheres(),
            plane_y: PLANE_Y,
            light: light_position(0.0, 0.5),
            depth: 5,
            exposure: 1.0,
        }
    }
}

fn default_spheres() -> Vec<Sphere> {
    vec![
        Sphere::new(Vec3::ZERO, 1.0, Vec3::new(0.9, 0.2, 0.25), Vec4::new(0.5, 0.1, 0.8, 0.0)),
        Sphere::new(
            Vec3::new(-2.2, -0.3, 0.5),
            0.7,
            Vec3::new(0.2, 0.4, 0.95),
            Vec4::new(0.3, 0.3, 0.5, 0.0),
        ),
        Sphere::new(
            Vec3::new(2.2, -0.4, -0.3),
            0.6,
            Vec3::new(1.0, 0.8, 0.35),
            Vec4::new(0.8, 0.05, 1.0, 0.0),
        ),
        Sphere::new(
            Vec3::new(0.0, -0.7, 2.0),
            0.3,
            Vec3::new(0.4, 1.0, 0.6),
            Vec4::new(0.0, 0.5, 0.2, 1.5),
        ),
    ]
}

/// Orbiting light position at time `t` and angular speed `speed`.
pub fn light_position(t: f32, speed: f32) -> Vec3 {
    let a = speed * t;
    Vec3::new(LIGHT_ORBIT * a.cos(), LIGHT_ORBIT, LIGHT_ORBIT * a.sin())
}

impl RayScene {
    /// Nearest intersection along a ray.
    pub fn hit(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        let mut best: Option<(f32, Surface)> = None;
        for (i, sphere) in self.spheres.iter().take(MAX_SPHERES).enumerate() {
            if let Some(t) = intersect_sphere(origin, dir, sphere) {
                if best.map_or(true, |(b, _)| t < b) {
                    best = Some((t, Surface::Sphere(i)));
                }
            }
        }
        if let Some(t) = intersect_plane(origin, dir, self.plane_y) {
            if best.map_or(true, |(b, _)| t < b) {
                best = Some((t, Surface::Ground));
            }
        }

        best.map(|(distance, surface)| {
            let point = origin + dir * distance;
            let normal = match surface {
                Surface::Sphere(i) => (point - self.spheres[i].center).normalize(),
                Surface::Ground => Vec3::Y,
            };
            Hit {
                distance,
                point,
                normal,
                surface,
            }
        })
    }

    fn surface(&self, hit: &Hit) -> (Vec3, Vec4) {
        match hit.surface {
            Surface::Sphere(i) => (self.spheres[i].albedo, self.spheres[i].material),
            Surface::Ground => {
                let checker = (hit.point.x.floor() + hit.point.z.floor()).rem_euclid(2.0);
                let albedo = if checker < 1.0 {
                    Vec3::splat(0.8)
                } else {
                    Vec3::splat(0.3)
                };
                (albedo, Vec4::new(0.2, 0.5, 0.1, 0.0))
            }
        }
    }

    /// Direct lighting at a hit: ambient, shadowed Lambert + Blinn-Phong,
    /// and emission.
    fn direct(&self, hit: &Hit, view: Vec3, albedo: Vec3, material: Vec4) -> Vec3 {
        let to_light = self.light - hit.point;
        let light_dist = to_light.length();
        let l = to_light / light_dist;

        let origin = hit.point + hit.normal * EPSILON;
        let shadowed = self
            .hit(origin, l)
            .is_some_and(|h| h.distance < light_dist);

        let mut color = albedo * AMBIENT + albedo * material.w;
        if !shadowed {
            let diffuse = hit.normal.dot(l).max(0.0);
            let half = (l - view).normalize();
            let shininess = 4.0 + (1.0 - material.y) * 124.0;
            let spec = hit.normal.dot(half).max(0.0).powf(shininess) * material.z;
            color += (albedo * diffuse + Vec3::splat(spec)) * LIGHT_COLOR;
        }
        color
    }

    /// Linear radiance along a ray with `depth` bounces left.
    pub fn radiance(&self, origin: Vec3, dir: Vec3, depth: u32) -> Vec3 {
        if depth == 0 {
            return sky(dir);
        }
        let Some(hit) = self.hit(origin, dir) else {
            return sky(dir);
        };

        let (albedo, material) = self.surface(&hit);
        let local = self.direct(&hit, dir, albedo, material);
        let reflectance = material.x;
        if reflectance <= 0.0 {
            return local;
        }

        let reflected = dir - 2.0 * dir.dot(hit.normal) * hit.normal;
        let bounce = self.radiance(hit.point + hit.normal * EPSILON, reflected, depth - 1);
        local * (1.0 - reflectance) + bounce * reflectance
    }

    /// Display color along a ray: exposure, tone map, gamma.
    pub fn shade(&self, origin: Vec3, dir: Vec3) -> Vec3 {
        let c = self.radiance(origin, dir, self.depth) * self.exposure;
        gamma_correct(tone_map(c))
    }

    pub fn uniforms(&self, time: f32) -> RayUniforms {
        let mut spheres = [GpuSphere::zeroed(); MAX_SPHERES];
        for (slot, s) in spheres.iter_mut().zip(&self.spheres) {
            *slot = GpuSphere {
                center: s.center.to_array(),
                radius: s.radius,
                albedo: s.albedo.extend(1.0).to_array(),
                material: s.material.to_array(),
            };
        }
        RayUniforms {
            spheres,
            sphere_count: self.spheres.len().min(MAX_SPHERES) as u32,
            depth: self.depth,
            exposure: self.exposure,
            time,
            light: self.light.to_array(),
            plane_y: self.plane_y,
        }
    }
}

impl From<&RayUniforms> for RayScene {
    fn from(u: &RayUniforms) -> Self {
        let spheres = u.spheres[..(u.sphere_count as usize).min(MAX_SPHERES)]
            .iter()
            .map(|s| Sphere {
                center: Vec3::from_array(s.center),
                radius: s.radius,
                albedo: Vec4::from_array(s.albedo).truncate(),
                material: Vec4::from_array(s.material),
            })
            .collect();
        Self {
            spheres,
            plane_y: u.plane_y,
            light: Vec3::from_array(u.light),
            depth: u.depth,
            exposure: u.exposure,
        }
    }
}

/// Display color of pixel `(x, y)` in a `width × height` image.
pub fn shade_pixel(scene: &RayScene, camera: &Camera, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    let aspect = width as f32 / height.max(1) as f32;
    let ndc_x = (x as f32 + 0.5) / width.max(1) as f32 * 2.0 - 1.0;
    let ndc_y = 1.0 - (y as f32 + 0.5) / height.max(1) as f32 * 2.0;
    let (origin, dir) = camera.ray(ndc_x, ndc_y, aspect);
    scene.shade(origin, dir)
}

/// GPU layout of one sphere.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub albedo: [f32; 4],
    pub material: [f32; 4],
}

/// Uniform block of `raytrace.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RayUniforms {
    pub spheres: [GpuSphere; MAX_SPHERES],
    pub sphere_count: u32,
    pub depth: u32,
    pub exposure: f32,
    pub time: f32,
    pub light: [f32; 3],
    pub plane_y: f32,
}

/// The ray-traced scene effect.
pub struct RayTracer {
    lifecycle: Lifecycle,
    params: ParamSet,
    spheres: Vec<Sphere>,
    time: f32,
}

impl RayTracer {
    pub fn new(scene: &mut Scene) -> Self {
        let mut tracer = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            spheres: default_spheres(),
            time: 0.0,
        };
        let node = scene.allocate(NAME);
        tracer.lifecycle.attach(vec![node]);
        tracer
    }

    /// Replace the spheres. Anything past [`MAX_SPHERES`] is dropped.
    pub fn set_spheres(&mut self, mut spheres: Vec<Sphere>) {
        if spheres.len() > MAX_SPHERES {
            log::warn!(
                "'{}' holds at most {} spheres, dropping {}",
                NAME,
                MAX_SPHERES,
                spheres.len() - MAX_SPHERES
            );
            spheres.truncate(MAX_SPHERES);
        }
        self.spheres = spheres;
    }

    /// The scene as of the last update.
    pub fn scene(&self) -> RayScene {
        RayScene {
            spheres: self.spheres.clone(),
            plane_y: PLANE_Y,
            light: light_position(self.time, self.params.value("light_speed")),
            depth: self.params.value("depth") as u32,
            exposure: self.params.value("exposure"),
        }
    }
}

impl Effect for RayTracer {
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
        out.push_pass(FullscreenPass::RayTraced(self.scene().uniforms(self.time)));
    }
}
