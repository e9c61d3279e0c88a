//! # vfxe - Visual Effects Engine
//!
//! A set of independent, swappable real-time effects driven by one shared
//! frame clock.
//!
//! Every effect implements the same [`Effect`] contract (start, stop, update,
//! configure, describe_config, destroy) and lives in a [`Registry`]. A
//! [`FrameDriver`] ticks the [`Clock`] once per frame, updates the active
//! effects, collects what they draw into a [`DrawList`] and hands it to a
//! [`Renderer`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use vfxe::prelude::*;
//!
//! let mut driver = FrameDriver::with_defaults("particles");
//! driver.dispatch(Command::toggle("physics"));
//! driver.dispatch(Command::configure("particles", "count", 100_000.0));
//!
//! let mut renderer = HeadlessRenderer::default();
//! for _ in 0..60 {
//!     driver.frame_with_delta(1.0 / 60.0, &mut renderer);
//! }
//! driver.shutdown();
//! ```
//!
//! ## Built-in effects
//!
//! | Name | What it shows |
//! |------|---------------|
//! | `particles` | Rotating cloud of point particles under gravity |
//! | `fluid` | Wireframe water surface from a sum of sinusoids |
//! | `volumetric` | Ray-marched fBm cloud |
//! | `physics` | Bouncing rigid cubes |
//! | `neural` | Pulsing layered graph with a particle flow |
//! | `raytrace` | Reflective spheres over a checkered plane |
//! | `lighting` | Six orbiting colored lights and a spotlight |
//!
//! ## Time
//!
//! Effects never read the wall clock. *Delta* effects integrate
//! [`FrameTime::delta`]; *absolute* effects are pure functions of
//! [`FrameTime::elapsed`]. Pausing the clock freezes both.
//!
//! ## Rendering
//!
//! [`gpu::GpuRenderer`] draws with wgpu. Without a GPU the engine runs against
//! [`HeadlessRenderer`], and the fullscreen effects can still be rendered to
//! PNG on the CPU with [`snapshot`].

pub mod camera;
pub mod config;
pub mod driver;
pub mod effect;
pub mod effects;
pub mod error;
pub mod field;
pub mod gpu;
pub mod input;
pub mod lifecycle;
pub mod params;
pub mod perf;
pub mod registry;
pub mod renderer;
pub mod scene;
pub mod snapshot;
pub mod spawn;
pub mod time;
pub mod visuals;
pub mod window;

pub use camera::Camera;
pub use config::AppConfig;
pub use driver::FrameDriver;
pub use effect::{Command, Effect};
pub use error::{AppError, ConfigError, EngineError, RenderError, SnapshotError};
pub use glam::{Vec2, Vec3, Vec4};
pub use lifecycle::{EffectState, Lifecycle};
pub use params::{ParamDescriptor, ParamSet, ParamSpec};
pub use perf::{FrameCounter, PerformanceMonitor};
pub use registry::Registry;
pub use renderer::{FrameStats, HeadlessRenderer, Renderer};
pub use scene::{DrawList, FullscreenPass, NodeId, Scene};
pub use spawn::Spawner;
pub use time::{Clock, FrameTime};
pub use visuals::{ColorGrading, Palette};

/// Convenience re-exports for common usage.
///
/// ```ignore
/// use vfxe::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::config::AppConfig;
    pub use crate::driver::FrameDriver;
    pub use crate::effect::{Command, Effect};
    pub use crate::effects::{Fluid, LightRig, NeuralGraph, Particles, Physics, RayTracer, Volumetric};
    pub use crate::lifecycle::Lifecycle;
    pub use crate::params::{ParamSet, ParamSpec};
    pub use crate::registry::Registry;
    pub use crate::renderer::{HeadlessRenderer, Renderer};
    pub use crate::scene::{DrawList, NodeId, Scene};
    pub use crate::spawn::Spawner;
    pub use crate::time::{Clock, FrameTime};
    pub use crate::visuals::ColorGrading;
    pub use glam::{Vec2, Vec3, Vec4};
}
