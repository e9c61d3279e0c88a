//! Built-in effects.
//!
//! | Key | Effect | Time policy | Nodes |
//! |-----|--------|-------------|-------|
//! | 1 | [`particles`] | delta | 1 point cloud |
//! | 2 | [`fluid`] | absolute | 1 surface |
//! | 3 | [`volumetric`] | absolute | 1 fullscreen pass |
//! | 4 | [`physics`] | delta | 1 per body |
//! | 5 | [`neural`] | absolute (graph), delta (flow) | graph + flow cloud |
//! | 6 | [`raytrace`] | absolute | 1 fullscreen pass |
//! | 7 | [`lighting`] | delta (accumulated) | 1 light rig |
//!
//! *Delta* effects integrate `FrameTime::delta`; *absolute* effects are pure
//! functions of `FrameTime::elapsed`.

pub mod fluid;
pub mod lighting;
pub mod neural;
pub mod particles;
pub mod physics;
pub mod raytrace;
pub mod volumetric;

pub use fluid::Fluid;
pub use lighting::LightRig;
pub use neural::NeuralGraph;
pub use particles::Particles;
pub use physics::Physics;
pub use raytrace::RayTracer;
pub use volumetric::Volumetric;

use crate::effect::Effect;
use crate::scene::Scene;
use crate::spawn::Spawner;

/// Every built-in effect, in registry and key-binding order.
pub const BUILT_IN: [&str; 7] = [
    particles::NAME,
    fluid::NAME,
    volumetric::NAME,
    physics::NAME,
    neural::NAME,
    raytrace::NAME,
    lighting::NAME,
];

/// Construct a built-in effect by name, or `None` if the name is unknown.
///
/// Effects without random state ignore `spawner`.
pub fn build(name: &str, scene: &mut Scene, spawner: Spawner) -> Option<Box<dyn Effect>> {
    let effect: Box<dyn Effect> = match name {
        particles::NAME => Box::new(Particles::with_spawner(scene, spawner)),
        fluid::NAME => Box::new(Fluid::new(scene)),
        volumetric::NAME => Box::new(Volumetric::new(scene)),
        physics::NAME => Box::new(Physics::with_spawner(scene, spawner)),
        neural::NAME => Box::new(NeuralGraph::with_spawner(scene, spawner)),
        raytrace::NAME => Box::new(RayTracer::new(scene)),
        lighting::NAME => Box::new(LightRig::new(scene)),
        _ => return None,
    };
    Some(effect)
}
