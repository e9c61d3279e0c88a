//! The boundary between the engine and whatever draws its output.
//!
//! The engine hands a [`DrawList`] and a [`Camera`] to a [`Renderer`] once per
//! frame and never looks at GPU state. [`GpuRenderer`](crate::gpu::GpuRenderer)
//! draws with wgpu; [`HeadlessRenderer`] only records what it was given, which
//! is what headless runs and tests use.

use crate::camera::Camera;
use crate::error::RenderError;
use crate::scene::DrawList;

/// Consumes one frame of draw data.
pub trait Renderer {
    /// Draw a frame.
    fn render(&mut self, frame: &DrawList, camera: &Camera) -> Result<(), RenderError>;

    /// The output surface changed size.
    fn resize(&mut self, width: u32, height: u32);
}

/// Counts of what one frame contained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub points: usize,
    pub lines: usize,
    pub passes: usize,
    pub nodes: usize,
}

impl FrameStats {
    pub fn of(frame: &DrawList) -> Self {
        Self {
            points: frame.points.len(),
            lines: frame.line_count(),
            passes: frame.passes.len(),
            nodes: frame.nodes.len(),
        }
    }
}

/// A renderer with no output device.
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    frames: u64,
    last: FrameStats,
}

impl HeadlessRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: 0,
            last: FrameStats::default(),
        }
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Contents of the most recent frame.
    pub fn last_frame(&self) -> FrameStats {
        self.last
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, frame: &DrawList, _camera: &Camera) -> Result<(), RenderError> {
        self.last = FrameStats::of(frame);
        self.frames += 1;
        log::trace!("headless frame {}: {:?}", self.frames, self.last);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn test_headless_records_stats() {
        let mut renderer = HeadlessRenderer::default();
        let mut list = DrawList::new();
        list.push_point(Vec3::ZERO, 0.1, Vec3::ONE, 1.0);
        list.push_line(Vec3::ZERO, Vec3::X, Vec4::ONE);

        renderer.render(&list, &Camera::new()).unwrap();
        assert_eq!(renderer.frames(), 1);
        assert_eq!(
            renderer.last_frame(),
            FrameStats {
                points: 1,
                lines: 1,
                passes: 0,
                nodes: 0
            }
        );
    }

    #[test]
    fn test_resize() {
        let mut renderer = HeadlessRenderer::new(10, 10);
        renderer.resize(640, 480);
        assert_eq!(renderer.size(), (640, 480));
    }
}
