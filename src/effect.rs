//! The effect contract.
//!
//! An effect is one self-contained simulation plus its renderable
//! representation. All effects implement [`Effect`]; the registry dispatches
//! through `Box<dyn Effect>` and never probes for optional behaviour.
//!
//! Implementors provide the simulation step ([`Effect::simulate`]), their
//! parameter set, and drawing. The lifecycle methods (`start`, `stop`,
//! `update`, `configure`, `destroy`) have shared implementations on top of the
//! embedded [`Lifecycle`] and only need overriding hooks:
//! [`Effect::apply`] for parameter side effects and [`Effect::release`] for
//! freeing buffers.

use crate::error::EngineError;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamDescriptor, ParamSet};
use crate::scene::{DrawList, NodeId, Scene};
use crate::time::FrameTime;

/// A swappable, stateful visual effect.
pub trait Effect {
    /// Lifecycle state and owned scene nodes.
    fn lifecycle(&self) -> &Lifecycle;

    /// Mutable lifecycle access.
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Current parameter values.
    fn params(&self) -> &ParamSet;

    /// Mutable parameter access. Prefer [`Effect::configure`], which also
    /// applies side effects.
    fn params_mut(&mut self) -> &mut ParamSet;

    /// Advance the simulation by one frame. Only called while active.
    fn simulate(&mut self, time: &FrameTime);

    /// Append primitives for `node` (one of this effect's nodes).
    fn draw(&self, node: NodeId, out: &mut DrawList);

    /// React to a stored parameter change. Resize parameters rebuild buffers
    /// and swap nodes through [`Lifecycle::replace_nodes`].
    fn apply(&mut self, _param: &str, _value: f32, _scene: &mut Scene) {}

    /// Free simulation buffers. Called once, from [`Effect::destroy`].
    fn release(&mut self) {}

    /// Unique name within a registry.
    fn name(&self) -> &str {
        self.lifecycle().name()
    }

    fn is_active(&self) -> bool {
        self.lifecycle().is_active()
    }

    /// Insert into the scene. Idempotent.
    fn start(&mut self, scene: &mut Scene) -> bool {
        self.lifecycle_mut().start(scene)
    }

    /// Remove from the scene, keeping buffers. Idempotent.
    fn stop(&mut self, scene: &mut Scene) -> bool {
        self.lifecycle_mut().stop(scene)
    }

    /// Advance the simulation if active; no-op otherwise.
    fn update(&mut self, time: &FrameTime) {
        if self.lifecycle().ensure_alive().is_err() {
            return;
        }
        if self.lifecycle().is_active() {
            self.simulate(time);
        }
    }

    /// Clamp, store and apply a parameter. Returns the value actually stored.
    fn configure(&mut self, param: &str, value: f32, scene: &mut Scene) -> Result<f32, EngineError> {
        self.lifecycle().ensure_alive()?;
        let stored = match self.params_mut().set(param, value) {
            Some(stored) => stored,
            None => {
                return Err(EngineError::UnknownParameter {
                    effect: self.name().to_string(),
                    param: param.to_string(),
                })
            }
        };
        if stored != value {
            log::debug!(
                "'{}': {} = {} clamped to {}",
                self.name(),
                param,
                value,
                stored
            );
        }
        self.apply(param, stored, scene);
        Ok(stored)
    }

    /// The configuration surface for UI generation.
    fn describe_config(&self) -> Vec<ParamDescriptor> {
        if self.lifecycle().ensure_alive().is_err() {
            return Vec::new();
        }
        self.params().describe()
    }

    /// Release scene nodes and buffers. Only the first call has an effect.
    fn destroy(&mut self, scene: &mut Scene) {
        if self.lifecycle_mut().destroy(scene) {
            self.release();
        }
    }
}

/// A request from the UI layer (keys, CLI, tests) to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start if stopped, stop if active.
    Toggle(String),
    /// Start (no-op when active).
    Start(String),
    /// Stop (no-op when stopped).
    Stop(String),
    /// Set one parameter.
    Configure {
        effect: String,
        param: String,
        value: f32,
    },
}

impl Command {
    pub fn toggle(effect: impl Into<String>) -> Self {
        Command::Toggle(effect.into())
    }

    pub fn configure(effect: impl Into<String>, param: impl Into<String>, value: f32) -> Self {
        Command::Configure {
            effect: effect.into(),
            param: param.into(),
            value,
        }
    }

    /// The effect this command addresses.
    pub fn effect(&self) -> &str {
        match self {
            Command::Toggle(name) | Command::Start(name) | Command::Stop(name) => name,
            Command::Configure { effect, .. } => effect,
        }
    }
}
