//! CPU snapshots of the fullscreen effects.
//!
//! The ray-traced and volumetric effects each have a CPU reference next to
//! their WGSL shader. A snapshot asks an effect to draw itself, takes the
//! [`FullscreenPass`] it emits, and shades every pixel on the CPU, so it
//! works on machines without a GPU and gives the shaders something to be
//! compared against.

use std::path::Path;

use glam::Vec3;
use image::{Rgb, RgbImage};

use crate::camera::Camera;
use crate::effects::raytrace::{shade_pixel, RayScene};
use crate::effects::volumetric::Cloud;
use crate::error::SnapshotError;
use crate::registry::Registry;
use crate::scene::{DrawList, FullscreenPass};
use crate::visuals::{gamma_correct, tone_map, ColorGrading};

const SPACE_LOW: Vec3 = Vec3::new(0.02, 0.02, 0.05);
const SPACE_HIGH: Vec3 = Vec3::new(0.1, 0.15, 0.3);

/// Background behind the cloud.
pub fn volume_background(dir: Vec3) -> Vec3 {
    SPACE_LOW.lerp(SPACE_HIGH, 0.5 * (dir.y + 1.0))
}

/// Display color of one pixel of a fullscreen pass, before grading.
pub fn shade(pass: &FullscreenPass, camera: &Camera, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    match pass {
        FullscreenPass::RayTraced(uniforms) => {
            shade_pixel(&RayScene::from(uniforms), camera, x, y, width, height)
        }
        FullscreenPass::Volumetric(uniforms) => {
            let cloud = Cloud::from(uniforms);
            let aspect = width as f32 / height.max(1) as f32;
            let ndc_x = (x as f32 + 0.5) / width.max(1) as f32 * 2.0 - 1.0;
            let ndc_y = 1.0 - (y as f32 + 0.5) / height.max(1) as f32 * 2.0;
            let (origin, dir) = camera.ray(ndc_x, ndc_y, aspect);
            let (color, opacity) = cloud.integrate(origin, dir);
            let c = color + volume_background(dir) * (1.0 - opacity);
            gamma_correct(tone_map(c))
        }
    }
}

/// Shade a whole image for one pass.
pub fn render_pass(
    pass: &FullscreenPass,
    camera: &Camera,
    width: u32,
    height: u32,
    grading: &ColorGrading,
) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let c = shade(pass, camera, x, y, width, height);
        let c = if grading.is_identity() { c } else { grading.grade(c) };
        to_rgb8(c)
    })
}

/// Snapshot the effect called `name` as it currently stands.
///
/// The effect does not need to be active. Fails with
/// [`SnapshotError::Unsupported`] for effects that do not draw a fullscreen
/// pass.
pub fn render_effect(
    registry: &Registry,
    name: &str,
    camera: &Camera,
    width: u32,
    height: u32,
    grading: &ColorGrading,
) -> Result<RgbImage, SnapshotError> {
    let effect = registry
        .get(name)
        .ok_or_else(|| SnapshotError::Unsupported(name.to_string()))?;

    let mut list = DrawList::new();
    for &node in effect.lifecycle().nodes() {
        effect.draw(node, &mut list);
    }
    let pass = list
        .passes
        .first()
        .ok_or_else(|| SnapshotError::Unsupported(name.to_string()))?;

    log::info!("rendering '{}' snapshot at {}x{}", name, width, height);
    Ok(render_pass(pass, camera, width, height, grading))
}

/// Write an image; the format follows the file extension.
pub fn save(image: &RgbImage, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    image.save(path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn to_rgb8(c: Vec3) -> Rgb<u8> {
    let c = (c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    Rgb([c.x as u8, c.y as u8, c.z as u8])
}
