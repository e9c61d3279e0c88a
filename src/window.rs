//! The windowed application.
//!
//! [`App`] owns the [`FrameDriver`] and plugs it into winit's event loop.
//! Each redraw drains keyboard and mouse input into engine commands and
//! camera moves, runs one engine frame and samples the frame rate.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::AppConfig;
use crate::driver::FrameDriver;
use crate::error::AppError;
use crate::gpu::GpuRenderer;
use crate::input::{Action, Controls, Input, MouseButton};
use crate::perf::PerformanceMonitor;
use crate::renderer::{HeadlessRenderer, Renderer};

/// Open a window and run until it is closed.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    app.driver.shutdown();
    Ok(())
}

/// Application state driven by the event loop.
pub struct App {
    config: AppConfig,
    pub driver: FrameDriver,
    input: Input,
    controls: Controls,
    monitor: PerformanceMonitor,
    window: Option<Arc<Window>>,
    renderer: Option<Box<dyn Renderer>>,
    status: String,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let driver = config.build_driver();
        let monitor = PerformanceMonitor::new(driver.counter());
        let controls = Controls::new();
        let status = controls.status(&driver.registry);
        Self {
            config,
            driver,
            input: Input::new(),
            controls,
            monitor,
            window: None,
            renderer: None,
            status,
        }
    }

    /// Status line for the focused effect parameter.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Feed a window event to the input tracker.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        self.input.handle_event(event);
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    /// Turn this frame's input into commands and camera moves.
    ///
    /// Returns `false` once the user asked to quit.
    pub fn apply_input(&mut self) -> bool {
        let mut keep_running = true;

        for &key in self.input.keys_pressed() {
            let Some(action) = self.controls.handle_key(key, &self.driver.registry) else {
                continue;
            };
            match action {
                Action::Engine(command) => {
                    self.driver.dispatch(command);
                    self.status = self.controls.status(&self.driver.registry);
                }
                Action::TogglePause => {
                    self.driver.clock.toggle_pause();
                    log::info!(
                        "clock {}",
                        if self.driver.clock.is_paused() { "paused" } else { "resumed" }
                    );
                }
                Action::Focus(status) => self.status = status,
                Action::Quit => keep_running = false,
            }
        }

        let drag = self.input.drag_delta();
        if self.input.mouse_held(MouseButton::Left) && drag != glam::Vec2::ZERO {
            self.driver.camera.orbit(drag.x, drag.y);
        }
        let scroll = self.input.scroll_delta();
        if scroll != 0.0 {
            self.driver.camera.zoom(scroll);
        }

        self.input.end_frame();
        keep_running
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.apply_input() {
            self.driver.shutdown();
            event_loop.exit();
            return;
        }

        if let Some(renderer) = self.renderer.as_deref_mut() {
            self.driver.frame(renderer);
        }

        if let Some(fps) = self.monitor.poll() {
            log::debug!("{:.1} fps, {} frames", fps, self.monitor.frames());
            if let Some(window) = &self.window {
                window.set_title(&format!(
                    "{} | {:.0} fps | {}",
                    self.config.window.title, fps, self.status
                ));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let renderer: Box<dyn Renderer> = match pollster::block_on(GpuRenderer::new(
            window.clone(),
            self.config.window.vsync,
            &self.config.grading,
        )) {
            Ok(renderer) => Box::new(renderer),
            Err(e) => {
                log::error!("{}; running without output", e);
                let size = window.inner_size();
                Box::new(HeadlessRenderer::new(size.width, size.height))
            }
        };

        self.renderer = Some(renderer);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.driver.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_deref_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.driver.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;
    use winit::event::ElementState;

    fn press(app: &mut App, key: KeyCode) {
        app.input_mut().key_event(key, ElementState::Pressed);
        app.input_mut().key_event(key, ElementState::Released);
    }

    #[test]
    fn test_digit_toggles_effect() {
        let mut app = App::new(AppConfig::default());
        assert!(!app.driver.registry.is_active("fluid"));
        press(&mut app, KeyCode::Digit(2));
        assert!(app.apply_input());
        assert!(app.driver.registry.is_active("fluid"));
    }

    #[test]
    fn test_pause_key() {
        let mut app = App::new(AppConfig::default());
        press(&mut app, KeyCode::P);
        app.apply_input();
        assert!(app.driver.clock.is_paused());
    }

    #[test]
    fn test_escape_quits() {
        let mut app = App::new(AppConfig::default());
        press(&mut app, KeyCode::Escape);
        assert!(!app.apply_input());
    }

    #[test]
    fn test_step_updates_status() {
        let mut app = App::new(AppConfig::default());
        // particles / count
        press(&mut app, KeyCode::Equal);
        app.apply_input();
        assert_eq!(
            app.driver.registry.describe("particles").unwrap()[0].value,
            51000.0
        );
        assert!(app.status().contains("51000"));
    }
}
