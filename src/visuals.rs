//! Color utilities shared by effects and the renderer.
//!
//! Covers palette sampling, HSL/HSV conversion, the final tone-map / gamma
//! step, and the CPU mirror of the color-grading pass (`grade.wgsl`).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Pre-defined color palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Inferno - perceptually uniform (black to yellow through red/orange).
    #[default]
    Inferno,

    /// Ocean - cool blues and teals.
    Ocean,

    /// Sunset - warm oranges and pinks.
    Sunset,

    /// Neon - vibrant cyberpunk colors (pink, cyan, purple).
    Neon,

    /// Grayscale - black to white.
    Grayscale,
}

impl Palette {
    /// Get the color stops for this palette (5 colors).
    pub fn colors(&self) -> [Vec3; 5] {
        match self {
            Palette::Inferno => [
                Vec3::new(0.001, 0.0, 0.014),   // Black
                Vec3::new(0.341, 0.063, 0.429), // Purple
                Vec3::new(0.735, 0.216, 0.330), // Red
                Vec3::new(0.988, 0.645, 0.198), // Orange
                Vec3::new(0.988, 1.0, 0.644),   // Light yellow
            ],
            Palette::Ocean => [
                Vec3::new(0.0, 0.05, 0.15), // Deep blue
                Vec3::new(0.0, 0.2, 0.4),   // Dark blue
                Vec3::new(0.0, 0.4, 0.6),   // Blue
                Vec3::new(0.2, 0.6, 0.8),   // Light blue
                Vec3::new(0.6, 0.9, 1.0),   // Cyan
            ],
            Palette::Sunset => [
                Vec3::new(0.1, 0.0, 0.2), // Dark purple
                Vec3::new(0.5, 0.0, 0.5), // Purple
                Vec3::new(1.0, 0.2, 0.4), // Pink
                Vec3::new(1.0, 0.5, 0.2), // Orange
                Vec3::new(1.0, 0.9, 0.4), // Yellow
            ],
            Palette::Neon => [
                Vec3::new(1.0, 0.0, 0.5), // Pink
                Vec3::new(0.5, 0.0, 1.0), // Purple
                Vec3::new(0.0, 0.5, 1.0), // Blue
                Vec3::new(0.0, 1.0, 1.0), // Cyan
                Vec3::new(0.5, 1.0, 0.5), // Green
            ],
            Palette::Grayscale => [
                Vec3::new(0.0, 0.0, 0.0), // Black
                Vec3::new(0.25, 0.25, 0.25),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.75, 0.75, 0.75),
                Vec3::new(1.0, 1.0, 1.0), // White
            ],
        }
    }

    /// Piecewise-linear lookup, `t` clamped to [0, 1].
    pub fn sample(&self, t: f32) -> Vec3 {
        let stops = self.colors();
        let t = t.clamp(0.0, 1.0) * 4.0;
        let i = (t.floor() as usize).min(3);
        stops[i].lerp(stops[i + 1], t - i as f32)
    }
}

/// Convert HSL to RGB.
///
/// * `h` - hue, 0.0 to 1.0 (wraps)
/// * `s` - saturation, 0.0 to 1.0
/// * `l` - lightness, 0.0 to 1.0
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Convert HSV to RGB.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let c = v * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h * 6.0) as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Vec3::new(r + m, g + m, b + m)
}

/// `0xRRGGBB` to linear-ish RGB in [0, 1].
pub fn rgb_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Reinhard tone map, `c / (c + 1)` per channel.
#[inline]
pub fn tone_map(c: Vec3) -> Vec3 {
    c / (c + Vec3::ONE)
}

/// Display gamma, `c^(1/2.2)` per channel.
#[inline]
pub fn gamma_correct(c: Vec3) -> Vec3 {
    c.max(Vec3::ZERO).powf(1.0 / 2.2)
}

/// Final-pass color grading settings.
///
/// Mirrors `grade.wgsl`; the GPU renderer uploads these as uniforms and
/// [`ColorGrading::grade`] is the CPU reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGrading {
    pub exposure: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Hue rotation in radians.
    pub hue: f32,
    pub gamma: f32,
}

impl Default for ColorGrading {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            hue: 0.0,
            gamma: 1.0,
        }
    }
}

impl ColorGrading {
    /// The punchier look the demo ships with.
    pub fn vivid() -> Self {
        Self {
            brightness: 0.1,
            contrast: 1.1,
            saturation: 1.2,
            ..Self::default()
        }
    }

    /// Whether grading would leave colors unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Grade one color.
    pub fn grade(&self, color: Vec3) -> Vec3 {
        let mut c = color * self.exposure;
        c += Vec3::splat(self.brightness);
        c = (c - Vec3::splat(0.5)) * self.contrast + Vec3::splat(0.5);

        let gray = Vec3::splat(c.dot(Vec3::new(0.299, 0.587, 0.114)));
        c = gray.lerp(c, self.saturation);

        if self.hue != 0.0 {
            // Rodrigues rotation about the gray axis
            let k = Vec3::splat(0.577_350_3);
            let (sin, cos) = self.hue.sin_cos();
            c = c * cos + k.cross(c) * sin + k * k.dot(c) * (1.0 - cos);
        }

        c.max(Vec3::ZERO).powf(1.0 / self.gamma.max(0.01))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_hsl_gray() {
        assert!(close(hsl_to_rgb(0.3, 0.0, 0.25), Vec3::splat(0.25)));
    }

    #[test]
    fn test_hsv_to_rgb() {
        let red = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!(close(red, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_rgb_hex() {
        assert!(close(rgb_hex(0xff8000), Vec3::new(1.0, 128.0 / 255.0, 0.0)));
    }

    #[test]
    fn test_palette_endpoints() {
        let p = Palette::Grayscale;
        assert!(close(p.sample(0.0), Vec3::ZERO));
        assert!(close(p.sample(1.0), Vec3::ONE));
        assert!(close(p.sample(0.5), Vec3::splat(0.5)));
        assert!(close(p.sample(7.0), Vec3::ONE));
    }

    #[test]
    fn test_tone_map_and_gamma() {
        assert!(close(tone_map(Vec3::ONE), Vec3::splat(0.5)));
        let g = gamma_correct(Vec3::splat(0.5));
        assert!((g.x - 0.5f32.powf(1.0 / 2.2)).abs() < 1e-5);
        // Tone mapped values stay below 1
        assert!(tone_map(Vec3::splat(1e6)).max_element() < 1.0);
    }

    #[test]
    fn test_identity_grading() {
        let grading = ColorGrading::default();
        assert!(grading.is_identity());
        let c = Vec3::new(0.2, 0.4, 0.6);
        assert!(close(grading.grade(c), c));
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        let grading = ColorGrading {
            saturation: 0.0,
            ..ColorGrading::default()
        };
        let c = grading.grade(Vec3::new(1.0, 0.0, 0.0));
        assert!((c.x - c.y).abs() < 1e-4 && (c.y - c.z).abs() < 1e-4);
    }

    #[test]
    fn test_full_hue_turn_is_identity() {
        let grading = ColorGrading {
            hue: std::f32::consts::TAU,
            ..ColorGrading::default()
        };
        let c = Vec3::new(0.3, 0.5, 0.7);
        assert!(close(grading.grade(c), c));
    }
}
