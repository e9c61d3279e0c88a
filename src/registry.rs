//! Name → effect table.
//!
//! The registry owns every effect for the lifetime of the app. Effects are
//! built eagerly at startup and kept in insertion order, which is also the
//! order they are updated and drawn in.
//!
//! ```
//! use vfxe::registry::Registry;
//! use vfxe::scene::Scene;
//!
//! let mut scene = Scene::new();
//! let mut registry = Registry::with_defaults(&mut scene, "particles");
//! assert!(registry.is_active("particles"));
//!
//! registry.toggle("physics", &mut scene).unwrap();
//! assert!(registry.is_active("physics"));
//! ```

use crate::effect::{Command, Effect};
use crate::effects::{self, BUILT_IN};
use crate::error::EngineError;
use crate::params::ParamDescriptor;
use crate::scene::{DrawList, Scene};
use crate::spawn::Spawner;
use crate::time::FrameTime;

/// Ordered collection of named effects.
#[derive(Default)]
pub struct Registry {
    effects: Vec<Box<dyn Effect>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in effect, stopped except `default_effect`.
    pub fn with_defaults(scene: &mut Scene, default_effect: &str) -> Self {
        let mut registry = Self::new();
        for name in BUILT_IN {
            if let Some(effect) = effects::build(name, scene, Spawner::default()) {
                registry.register(effect, scene);
            }
        }
        if let Err(e) = registry.start(default_effect, scene) {
            log::warn!("default effect not started: {}", e);
        }
        registry
    }

    /// Add an effect. An existing effect with the same name is destroyed and
    /// replaced in place.
    pub fn register(&mut self, effect: Box<dyn Effect>, scene: &mut Scene) {
        match self.position(effect.name()) {
            Some(i) => {
                log::warn!("replacing effect '{}'", effect.name());
                self.effects[i].destroy(scene);
                self.effects[i] = effect;
            }
            None => {
                log::debug!("registered effect '{}'", effect.name());
                self.effects.push(effect);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Effect> {
        self.effects
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Effect + 'static)> {
        self.effects
            .iter_mut()
            .find(|e| e.name() == name)
            .map(|e| e.as_mut())
    }

    /// Effect names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.effects.iter().map(|e| e.name())
    }

    /// Names of the currently active effects, in registry order.
    pub fn active_names(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.name())
            .collect()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.is_active())
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Flip an effect on or off. Returns whether it is now active.
    pub fn toggle(&mut self, name: &str, scene: &mut Scene) -> Result<bool, EngineError> {
        let effect = self.lookup(name)?;
        effect.lifecycle().ensure_alive()?;
        if effect.is_active() {
            effect.stop(scene);
        } else {
            effect.start(scene);
        }
        Ok(effect.is_active())
    }

    /// Start an effect. Returns `true` if it was not already running.
    pub fn start(&mut self, name: &str, scene: &mut Scene) -> Result<bool, EngineError> {
        let effect = self.lookup(name)?;
        effect.lifecycle().ensure_alive()?;
        Ok(effect.start(scene))
    }

    /// Stop an effect. Returns `true` if it was running.
    pub fn stop(&mut self, name: &str, scene: &mut Scene) -> Result<bool, EngineError> {
        let effect = self.lookup(name)?;
        effect.lifecycle().ensure_alive()?;
        Ok(effect.stop(scene))
    }

    /// Set one parameter. Returns the clamped value actually stored.
    pub fn configure(
        &mut self,
        name: &str,
        param: &str,
        value: f32,
        scene: &mut Scene,
    ) -> Result<f32, EngineError> {
        self.lookup(name)?.configure(param, value, scene)
    }

    /// Configuration surface of one effect.
    pub fn describe(&self, name: &str) -> Result<Vec<ParamDescriptor>, EngineError> {
        self.get(name)
            .map(|e| e.describe_config())
            .ok_or_else(|| EngineError::UnknownEffect(name.to_string()))
    }

    /// Execute a command from the UI layer. Failures are logged, not returned.
    pub fn dispatch(&mut self, command: Command, scene: &mut Scene) {
        let result = match &command {
            Command::Toggle(name) => self.toggle(name, scene).map(|_| ()),
            Command::Start(name) => self.start(name, scene).map(|_| ()),
            Command::Stop(name) => self.stop(name, scene).map(|_| ()),
            Command::Configure {
                effect,
                param,
                value,
            } => self.configure(effect, param, *value, scene).map(|stored| {
                log::info!("{}.{} = {}", effect, param, stored);
            }),
        };
        if let Err(e) = result {
            log::warn!("ignored command for '{}': {}", command.effect(), e);
        }
    }

    /// Advance every active effect with the same frame time.
    pub fn update_active(&mut self, time: &FrameTime) {
        for effect in &mut self.effects {
            effect.update(time);
        }
    }

    /// Collect primitives for every visible node, in registry order.
    pub fn draw_into(&self, scene: &Scene, out: &mut DrawList) {
        for effect in &self.effects {
            for &node in effect.lifecycle().nodes() {
                if scene.contains(node) {
                    effect.draw(node, out);
                    out.nodes.push(node);
                }
            }
        }
    }

    /// Destroy every effect. The registry keeps the (destroyed) entries so
    /// names still resolve, but nothing can be started again.
    pub fn destroy_all(&mut self, scene: &mut Scene) {
        for effect in &mut self.effects {
            effect.destroy(scene);
        }
        log::info!("destroyed {} effects", self.effects.len());
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.effects.iter().position(|e| e.name() == name)
    }

    fn lookup(&mut self, name: &str) -> Result<&mut Box<dyn Effect>, EngineError> {
        self.effects
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| EngineError::UnknownEffect(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Fluid, Particles, Physics};
    use crate::lifecycle::EffectState;

    fn small(scene: &mut Scene) -> Registry {
        let mut registry = Registry::new();
        let mut particles = Particles::with_spawner(scene, Spawner::seeded(1));
        particles.configure("count", 100.0, scene).unwrap();
        registry.register(Box::new(particles), scene);
        registry.register(Box::new(Fluid::new(scene)), scene);
        registry.register(
            Box::new(Physics::with_spawner(scene, Spawner::seeded(2))),
            scene,
        );
        registry
    }

    #[test]
    fn test_insertion_order() {
        let mut scene = Scene::new();
        let registry = small(&mut scene);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["particles", "fluid", "physics"]);
    }

    #[test]
    fn test_toggle() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        assert_eq!(registry.toggle("fluid", &mut scene), Ok(true));
        assert_eq!(scene.len(), 1);
        assert_eq!(registry.toggle("fluid", &mut scene), Ok(false));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_unknown_effect() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        assert_eq!(
            registry.toggle("sparkles", &mut scene),
            Err(EngineError::UnknownEffect("sparkles".into()))
        );
        // Swallowed by dispatch
        registry.dispatch(Command::toggle("sparkles"), &mut scene);
        assert!(registry.active_names().is_empty());
    }

    #[test]
    fn test_unknown_parameter() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        let err = registry.configure("fluid", "viscosity", 1.0, &mut scene);
        assert!(matches!(err, Err(EngineError::UnknownParameter { .. })));
    }

    #[test]
    fn test_dispatch_configure() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.dispatch(Command::configure("fluid", "opacity", 5.0), &mut scene);
        let rows = registry.describe("fluid").unwrap();
        let opacity = rows.iter().find(|r| r.name == "opacity").unwrap();
        assert_eq!(opacity.value, 1.0);
    }

    #[test]
    fn test_draw_only_visible() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.start("particles", &mut scene).unwrap();

        let mut list = DrawList::new();
        registry.draw_into(&scene, &mut list);
        assert_eq!(list.points.len(), 100);
        assert!(list.lines.is_empty());
        assert_eq!(list.nodes.len(), 1);
    }

    #[test]
    fn test_register_duplicate_replaces() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.start("fluid", &mut scene).unwrap();
        registry.register(Box::new(Fluid::new(&mut scene)), &mut scene);

        assert_eq!(registry.len(), 3);
        assert!(!registry.is_active("fluid"));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_destroy_all() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.start("particles", &mut scene).unwrap();
        registry.destroy_all(&mut scene);

        assert!(scene.is_empty());
        assert_eq!(scene.allocated(), 0);
        for name in ["particles", "fluid", "physics"] {
            assert_eq!(
                registry.get(name).unwrap().lifecycle().state(),
                EffectState::Destroyed
            );
        }
    }

    #[test]
    fn test_get_mut_configure() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        let fluid = registry.get_mut("fluid").unwrap();
        assert_eq!(fluid.configure("intensity", 9.0, &mut scene), Ok(2.0));
        assert!(registry.get_mut("sparkles").is_none());

        let rows = registry.describe("fluid").unwrap();
        let intensity = rows.iter().find(|r| r.name == "intensity").unwrap();
        assert_eq!(intensity.value, 2.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used after destroy")]
    fn test_update_after_destroy_panics_in_debug() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.start("fluid", &mut scene).unwrap();
        registry.destroy_all(&mut scene);
        registry
            .get_mut("fluid")
            .unwrap()
            .update(&FrameTime::new(0.016, 5.0, 1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used after destroy")]
    fn test_describe_after_destroy_panics_in_debug() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.destroy_all(&mut scene);
        let _ = registry.describe("fluid");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used after destroy")]
    fn test_toggle_after_destroy_panics_in_debug() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.destroy_all(&mut scene);
        let _ = registry.toggle("physics", &mut scene);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_use_after_destroy_reports_in_release() {
        let mut scene = Scene::new();
        let mut registry = small(&mut scene);
        registry.start("fluid", &mut scene).unwrap();
        registry.destroy_all(&mut scene);

        assert_eq!(
            registry.toggle("physics", &mut scene),
            Err(EngineError::Destroyed("physics".into()))
        );
        assert!(registry.describe("fluid").unwrap().is_empty());

        let fluid = registry.get_mut("fluid").unwrap();
        let before = fluid.params().describe();
        fluid.update(&FrameTime::new(0.016, 5.0, 1));
        assert_eq!(fluid.params().describe(), before);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_with_defaults() {
        let mut scene = Scene::new();
        let registry = Registry::with_defaults(&mut scene, "particles");
        assert_eq!(registry.len(), BUILT_IN.len());
        assert_eq!(registry.active_names(), vec!["particles"]);
    }
}
