//! Camera for 3D orbit view.

use glam::{Mat4, Vec3};

/// Orbit camera submitted to the renderer each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    /// Default framing: looking at the origin from `(0, 5, 10)`-ish.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.46,
            distance: 11.2,
            target: Vec3::ZERO,
            fov_y: 75.0_f32.to_radians(),
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 1000.0)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Orbit by mouse drag deltas (pixels).
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-1.5, 1.5);
    }

    /// Dolly in/out by scroll lines.
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance - lines * 0.5).clamp(2.0, 50.0);
    }

    /// World-space ray through normalized device coordinates `(x, y)` in
    /// `[-1, 1]`. Returns `(origin, direction)`.
    pub fn ray(&self, ndc_x: f32, ndc_y: f32, aspect: f32) -> (Vec3, Vec3) {
        let origin = self.position();
        let forward = (self.target - origin).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        let half = (self.fov_y * 0.5).tan();
        let dir = (forward + right * ndc_x * half * aspect + up * ndc_y * half).normalize();
        (origin, dir)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_hits_target_direction() {
        let cam = Camera::new();
        let (origin, dir) = cam.ray(0.0, 0.0, 16.0 / 9.0);
        let to_target = (cam.target - origin).normalize();
        assert!(dir.dot(to_target) > 0.9999);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut cam = Camera::new();
        cam.zoom(1000.0);
        assert_eq!(cam.distance, 2.0);
        cam.zoom(-1000.0);
        assert_eq!(cam.distance, 50.0);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut cam = Camera::new();
        cam.orbit(0.0, 10_000.0);
        assert_eq!(cam.pitch, 1.5);
    }
}
