//! One pass of the engine per displayed frame.
//!
//! [`FrameDriver::frame`] is the whole per-frame pipeline:
//!
//! 1. tick the [`Clock`] (exactly once),
//! 2. update every active effect with that same [`FrameTime`],
//! 3. rebuild the [`DrawList`] from the nodes currently in the scene,
//! 4. hand it to the [`Renderer`],
//! 5. bump the shared [`FrameCounter`].
//!
//! Render errors are logged and the loop keeps going.

use crate::camera::Camera;
use crate::effect::Command;
use crate::perf::FrameCounter;
use crate::registry::Registry;
use crate::renderer::Renderer;
use crate::scene::{DrawList, Scene};
use crate::time::{Clock, FrameTime};

/// Owns the engine state and runs it frame by frame.
pub struct FrameDriver {
    pub clock: Clock,
    pub registry: Registry,
    pub scene: Scene,
    pub camera: Camera,
    counter: FrameCounter,
    draw_list: DrawList,
    running: bool,
}

impl FrameDriver {
    /// A driver over an already-populated registry and scene.
    pub fn new(registry: Registry, scene: Scene) -> Self {
        Self {
            clock: Clock::new(),
            registry,
            scene,
            camera: Camera::new(),
            counter: FrameCounter::new(),
            draw_list: DrawList::new(),
            running: true,
        }
    }

    /// A driver with every built-in effect, `default_effect` started.
    pub fn with_defaults(default_effect: &str) -> Self {
        let mut scene = Scene::new();
        let registry = Registry::with_defaults(&mut scene, default_effect);
        Self::new(registry, scene)
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Handle to the frame counter, for a [`PerformanceMonitor`](crate::perf::PerformanceMonitor).
    pub fn counter(&self) -> FrameCounter {
        self.counter.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The draw list submitted by the last frame.
    pub fn last_frame(&self) -> &DrawList {
        &self.draw_list
    }

    /// Run one frame on the wall clock. Returns `None` after shutdown.
    pub fn frame(&mut self, renderer: &mut dyn Renderer) -> Option<FrameTime> {
        if !self.running {
            return None;
        }
        let time = self.clock.tick();
        self.run(time, renderer);
        Some(time)
    }

    /// Run one frame with an explicit delta.
    pub fn frame_with_delta(&mut self, delta: f32, renderer: &mut dyn Renderer) -> Option<FrameTime> {
        if !self.running {
            return None;
        }
        let time = self.clock.advance(delta);
        self.run(time, renderer);
        Some(time)
    }

    fn run(&mut self, time: FrameTime, renderer: &mut dyn Renderer) {
        self.registry.update_active(&time);

        self.draw_list.clear();
        self.registry.draw_into(&self.scene, &mut self.draw_list);

        if let Err(e) = renderer.render(&self.draw_list, &self.camera) {
            log::error!("frame {}: render failed: {}", time.index, e);
        }
        self.counter.increment();
    }

    /// Forward a UI command to the registry.
    pub fn dispatch(&mut self, command: Command) {
        if !self.running {
            log::warn!("command {:?} after shutdown", command);
            return;
        }
        self.registry.dispatch(command, &mut self.scene);
    }

    /// Destroy every effect and stop accepting frames. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.registry.destroy_all(&mut self.scene);
        self.running = false;
        log::info!("engine shut down after {} frames", self.counter.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::renderer::HeadlessRenderer;

    struct Failing;

    impl Renderer for Failing {
        fn render(&mut self, _: &DrawList, _: &Camera) -> Result<(), RenderError> {
            Err(RenderError::NoAdapter)
        }

        fn resize(&mut self, _: u32, _: u32) {}
    }

    fn driver() -> FrameDriver {
        let mut driver = FrameDriver::with_defaults("fluid");
        driver.dispatch(Command::configure("particles", "count", 10.0));
        driver
    }

    #[test]
    fn test_frame_advances_clock_once() {
        let mut driver = driver();
        let mut renderer = HeadlessRenderer::default();
        let t = driver.frame_with_delta(0.25, &mut renderer).unwrap();
        assert_eq!(t.index, 1);
        assert_eq!(t.elapsed, 0.25);
        assert_eq!(driver.counter().get(), 1);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn test_frame_draws_active_effects() {
        let mut driver = driver();
        let mut renderer = HeadlessRenderer::default();
        driver.frame_with_delta(0.016, &mut renderer);
        // Fluid is a wireframe only
        assert!(renderer.last_frame().lines > 0);
        assert_eq!(renderer.last_frame().points, 0);
        assert_eq!(renderer.last_frame().nodes, 1);
    }

    #[test]
    fn test_render_errors_do_not_stop_loop() {
        let mut driver = driver();
        for _ in 0..3 {
            assert!(driver.frame_with_delta(0.016, &mut Failing).is_some());
        }
        assert_eq!(driver.counter().get(), 3);
    }

    #[test]
    fn test_shutdown() {
        let mut driver = driver();
        let mut renderer = HeadlessRenderer::default();
        driver.shutdown();
        driver.shutdown();
        assert!(!driver.is_running());
        assert!(driver.scene.is_empty());
        assert!(driver.frame(&mut renderer).is_none());
        assert_eq!(renderer.frames(), 0);
    }
}
