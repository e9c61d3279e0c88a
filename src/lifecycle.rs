//! Effect lifecycle management.
//!
//! Every effect embeds a [`Lifecycle`], which owns the effect's scene node
//! handles and enforces the state machine:
//!
//! ```text
//! Uninitialized ──attach──▶ Stopped ⇄ Active
//!                              │         │
//!                              └─destroy─┴──▶ Destroyed (terminal)
//! ```
//!
//! The scene invariant lives here: an effect's nodes are in the [`Scene`]
//! exactly when its state is [`EffectState::Active`].
//!
//! Using an effect after [`Lifecycle::destroy`] is a programming error. Debug
//! builds panic; release builds log and ignore the call.

use crate::error::EngineError;
use crate::scene::{NodeId, Scene};

/// Where an effect is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Constructed, buffers not yet attached to nodes.
    Uninitialized,
    /// Ready but not in the scene.
    Stopped,
    /// In the scene and updated every frame.
    Active,
    /// Resources released. Terminal.
    Destroyed,
}

/// State machine plus node ownership for one effect.
#[derive(Debug)]
pub struct Lifecycle {
    name: String,
    state: EffectState,
    nodes: Vec<NodeId>,
}

impl Lifecycle {
    /// A fresh, uninitialized lifecycle for the effect called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: EffectState::Uninitialized,
            nodes: Vec::new(),
        }
    }

    /// Take ownership of freshly allocated nodes. Uninitialized → Stopped.
    pub fn attach(&mut self, nodes: Vec<NodeId>) {
        debug_assert_eq!(
            self.state,
            EffectState::Uninitialized,
            "attach called twice on '{}'",
            self.name
        );
        self.nodes = nodes;
        self.state = EffectState::Stopped;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == EffectState::Active
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.state == EffectState::Destroyed
    }

    /// Nodes owned by this effect.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether `node` belongs to this effect.
    pub fn owns(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Fail loudly in debug builds, report in release builds.
    pub fn ensure_alive(&self) -> Result<(), EngineError> {
        debug_assert!(
            !self.is_destroyed(),
            "effect '{}' used after destroy",
            self.name
        );
        if self.is_destroyed() {
            log::error!("effect '{}' used after destroy", self.name);
            return Err(EngineError::Destroyed(self.name.clone()));
        }
        Ok(())
    }

    /// Insert every node into the scene. No-op if already active.
    ///
    /// Returns `true` if the state changed.
    pub fn start(&mut self, scene: &mut Scene) -> bool {
        if self.ensure_alive().is_err() {
            return false;
        }
        match self.state {
            EffectState::Active => false,
            EffectState::Uninitialized => {
                log::warn!("'{}' started before it was initialized", self.name);
                false
            }
            _ => {
                for &node in &self.nodes {
                    scene.insert(node);
                }
                self.state = EffectState::Active;
                log::info!("started effect '{}'", self.name);
                true
            }
        }
    }

    /// Remove every node from the scene. No-op if not active. Buffers are kept.
    ///
    /// Returns `true` if the state changed.
    pub fn stop(&mut self, scene: &mut Scene) -> bool {
        if self.ensure_alive().is_err() || self.state != EffectState::Active {
            return false;
        }
        for &node in &self.nodes {
            scene.remove(node);
        }
        self.state = EffectState::Stopped;
        log::info!("stopped effect '{}'", self.name);
        true
    }

    /// Swap the owned nodes for new ones after a buffer re-initialization.
    ///
    /// Old nodes are released; when active, the new nodes are inserted in the
    /// same call so the scene never observes the effect half-present.
    pub fn replace_nodes(&mut self, scene: &mut Scene, nodes: Vec<NodeId>) {
        if self.ensure_alive().is_err() {
            return;
        }
        for &old in &self.nodes {
            scene.release(old);
        }
        if self.is_active() {
            for &node in &nodes {
                scene.insert(node);
            }
        }
        self.nodes = nodes;
    }

    /// Remove and release every node. Safe to call more than once; only the
    /// first call does anything.
    ///
    /// Returns `true` if this call destroyed the effect.
    pub fn destroy(&mut self, scene: &mut Scene) -> bool {
        if self.is_destroyed() {
            return false;
        }
        for node in self.nodes.drain(..) {
            scene.release(node);
        }
        self.state = EffectState::Destroyed;
        log::debug!("destroyed effect '{}'", self.name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(scene: &mut Scene) -> Lifecycle {
        let mut lc = Lifecycle::new("test");
        let nodes = vec![scene.allocate("test"), scene.allocate("test")];
        lc.attach(nodes);
        lc
    }

    #[test]
    fn test_new_is_uninitialized() {
        let lc = Lifecycle::new("test");
        assert_eq!(lc.state(), EffectState::Uninitialized);
        assert!(lc.nodes().is_empty());
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut scene = Scene::new();
        let mut lc = attached(&mut scene);
        assert_eq!(lc.state(), EffectState::Stopped);

        assert!(lc.start(&mut scene));
        assert!(!lc.start(&mut scene));
        assert_eq!(scene.len(), 2);

        assert!(lc.stop(&mut scene));
        assert!(!lc.stop(&mut scene));
        assert!(scene.is_empty());
        assert_eq!(lc.state(), EffectState::Stopped);
    }

    #[test]
    fn test_replace_nodes_while_active() {
        let mut scene = Scene::new();
        let mut lc = attached(&mut scene);
        lc.start(&mut scene);
        let old = lc.nodes().to_vec();

        let new = vec![scene.allocate("test")];
        lc.replace_nodes(&mut scene, new.clone());

        assert!(scene.contains(new[0]));
        assert!(old.iter().all(|n| !scene.contains(*n)));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.allocated(), 1);
    }

    #[test]
    fn test_replace_nodes_while_stopped() {
        let mut scene = Scene::new();
        let mut lc = attached(&mut scene);
        let new = vec![scene.allocate("test")];
        lc.replace_nodes(&mut scene, new.clone());
        assert!(!scene.contains(new[0]));
        assert!(lc.owns(new[0]));
    }

    #[test]
    fn test_destroy_releases_nodes() {
        let mut scene = Scene::new();
        let mut lc = attached(&mut scene);
        lc.start(&mut scene);

        assert!(lc.destroy(&mut scene));
        assert!(!lc.destroy(&mut scene));
        assert!(scene.is_empty());
        assert_eq!(scene.allocated(), 0);
        assert!(lc.is_destroyed());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "used after destroy")]
    fn test_start_after_destroy_panics_in_debug() {
        let mut scene = Scene::new();
        let mut lc = attached(&mut scene);
        lc.destroy(&mut scene);
        lc.start(&mut scene);
    }
}
