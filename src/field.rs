//! Procedural scalar fields.
//!
//! Every function here is a pure function of position, time and parameters,
//! with no hidden state, so each sample can be evaluated independently. The
//! WGSL in `gpu/shaders` implements the same formulas per vertex / per pixel;
//! keep the two in sync.
//!
//! | Field | Used by |
//! |-------|---------|
//! | [`WaveField`] | fluid surface |
//! | [`value_noise`], [`fbm`] | volumetric cloud density |

use glam::{IVec3, Vec3};

/// Sum-of-sinusoids height field for a water-like surface.
///
/// ```text
/// h(x, z, t) = A · (0.10·sin(3x + t) + 0.10·sin(2z + 1.5t) + 0.05·sin(8x + 2t))
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveField {
    /// Amplitude multiplier `A`.
    pub intensity: f32,
}

impl WaveField {
    /// Peak absolute height for intensity 1.
    pub const MAX_UNIT_HEIGHT: f32 = 0.25;

    pub fn new(intensity: f32) -> Self {
        Self { intensity }
    }

    /// Surface elevation at `(x, z)` and time `t`.
    #[inline]
    pub fn height(&self, x: f32, z: f32, t: f32) -> f32 {
        let h = (x * 3.0 + t).sin() * 0.1
            + (z * 2.0 + t * 1.5).sin() * 0.1
            + (x * 8.0 + t * 2.0).sin() * 0.05;
        h * self.intensity
    }

    /// Upper bound of `|height|` for this intensity.
    pub fn max_height(&self) -> f32 {
        Self::MAX_UNIT_HEIGHT * self.intensity.abs()
    }
}

impl Default for WaveField {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Lattice hash in `[0, 1)`.
#[inline]
fn hash(cell: IVec3) -> f32 {
    let mut h = (cell.x as u32).wrapping_mul(0x8da6_b343)
        ^ (cell.y as u32).wrapping_mul(0xd816_3841)
        ^ (cell.z as u32).wrapping_mul(0xcb1a_b31f);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h & 0x00ff_ffff) as f32 / 16_777_216.0
}

/// Smooth value noise in `[0, 1)`.
///
/// Trilinear interpolation of hashed lattice values with a smoothstep fade.
pub fn value_noise(p: Vec3) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);
    let i = cell.as_ivec3();

    let c000 = hash(i);
    let c100 = hash(i + IVec3::new(1, 0, 0));
    let c010 = hash(i + IVec3::new(0, 1, 0));
    let c110 = hash(i + IVec3::new(1, 1, 0));
    let c001 = hash(i + IVec3::new(0, 0, 1));
    let c101 = hash(i + IVec3::new(1, 0, 1));
    let c011 = hash(i + IVec3::new(0, 1, 1));
    let c111 = hash(i + IVec3::new(1, 1, 1));

    let x00 = lerp(c000, c100, u.x);
    let x10 = lerp(c010, c110, u.x);
    let x01 = lerp(c001, c101, u.x);
    let x11 = lerp(c011, c111, u.x);
    let y0 = lerp(x00, x10, u.y);
    let y1 = lerp(x01, x11, u.y);
    lerp(y0, y1, u.z)
}

/// Fractal Brownian motion: `octaves` layers of [`value_noise`], each with half
/// the amplitude and double the frequency of the previous one. Normalized to
/// `[0, 1)`.
pub fn fbm(p: Vec3, octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = 0.5;
    let mut total = 0.0;
    let mut q = p;
    for _ in 0..octaves.max(1) {
        sum += amplitude * value_noise(q);
        total += amplitude;
        amplitude *= 0.5;
        q *= 2.0;
    }
    sum / total
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_height_bounded() {
        let field = WaveField::new(2.0);
        for i in 0..200 {
            let x = i as f32 * 0.137 - 10.0;
            let z = i as f32 * 0.071 - 7.0;
            let h = field.height(x, z, i as f32 * 0.05);
            assert!(h.abs() <= field.max_height() + 1e-5);
        }
    }

    #[test]
    fn test_wave_is_pure() {
        let field = WaveField::default();
        let a = field.height(1.5, -2.0, 3.25);
        let b = field.height(1.5, -2.0, 3.25);
        assert_eq!(a, b);
        assert_ne!(a, field.height(1.5, -2.0, 3.5));
    }

    #[test]
    fn test_zero_intensity_is_flat() {
        let field = WaveField::new(0.0);
        assert_eq!(field.height(0.3, 0.7, 1.0), 0.0);
    }

    #[test]
    fn test_noise_range() {
        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.31, i as f32 * -0.17, i as f32 * 0.07);
            let n = value_noise(p);
            assert!((0.0..1.0).contains(&n), "noise {} out of range", n);
        }
    }

    #[test]
    fn test_noise_matches_lattice_at_integers() {
        let p = IVec3::new(3, -2, 7);
        assert!((value_noise(p.as_vec3()) - hash(p)).abs() < 1e-6);
    }

    #[test]
    fn test_noise_is_continuous() {
        let p = Vec3::new(1.25, 0.5, -3.75);
        let a = value_noise(p);
        let b = value_noise(p + Vec3::splat(1e-4));
        assert!((a - b).abs() < 1e-2);
    }

    #[test]
    fn test_fbm_range() {
        for octaves in 1..=8 {
            for i in 0..100 {
                let p = Vec3::new(i as f32 * 0.13, 1.7, i as f32 * 0.29);
                let v = fbm(p, octaves);
                assert!((0.0..1.0).contains(&v));
            }
        }
    }
}
