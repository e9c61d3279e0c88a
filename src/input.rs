//! Keyboard and mouse input.
//!
//! [`Input`] tracks raw window events: keys pressed this frame, mouse drag and
//! scroll. [`Controls`] turns key presses into engine [`Command`]s using the
//! registry's configuration surface, so every effect parameter is reachable
//! from the keyboard without per-effect UI code.
//!
//! | Key | Action |
//! |-----|--------|
//! | `1`–`7` | toggle the n-th effect |
//! | `Tab` | focus the next effect |
//! | `[` / `]` | previous / next parameter of the focused effect |
//! | `-` / `=` | step the focused parameter down / up |
//! | `P` | pause / resume the clock |
//! | `Esc` | quit |

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::effect::Command;
use crate::registry::Registry;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// The keys the app reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Number row, `Digit(1)` is the `1` key.
    Digit(u8),
    Tab,
    BracketLeft,
    BracketRight,
    Minus,
    Equal,
    P,
    Escape,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Digit0 => KeyCode::Digit(0),
            WinitKeyCode::Digit1 => KeyCode::Digit(1),
            WinitKeyCode::Digit2 => KeyCode::Digit(2),
            WinitKeyCode::Digit3 => KeyCode::Digit(3),
            WinitKeyCode::Digit4 => KeyCode::Digit(4),
            WinitKeyCode::Digit5 => KeyCode::Digit(5),
            WinitKeyCode::Digit6 => KeyCode::Digit(6),
            WinitKeyCode::Digit7 => KeyCode::Digit(7),
            WinitKeyCode::Digit8 => KeyCode::Digit(8),
            WinitKeyCode::Digit9 => KeyCode::Digit(9),
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::BracketLeft => KeyCode::BracketLeft,
            WinitKeyCode::BracketRight => KeyCode::BracketRight,
            WinitKeyCode::Minus => KeyCode::Minus,
            WinitKeyCode::Equal => KeyCode::Equal,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: Vec<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_position: Vec2,
    /// Cursor movement while a button is held, this frame.
    drag_delta: Vec2,
    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that went down this frame, in press order. Auto-repeat is ignored.
    pub fn keys_pressed(&self) -> &[KeyCode] {
        &self.keys_pressed
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Cursor movement in pixels while any button was held.
    pub fn drag_delta(&self) -> Vec2 {
        self.drag_delta
    }

    /// Scroll wheel lines this frame; positive is away from the user.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Clear per-frame state. Call after the frame consumed it.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.drag_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Record a key transition.
    pub fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key) {
                    self.keys_pressed.push(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_event(KeyCode::from(code), event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                match state {
                    ElementState::Pressed => {
                        self.mouse_held.insert(btn);
                    }
                    ElementState::Released => {
                        self.mouse_held.remove(&btn);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                if !self.mouse_held.is_empty() {
                    self.drag_delta += new_pos - self.mouse_position;
                }
                self.mouse_position = new_pos;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            _ => {}
        }
    }
}

/// What a key press asks the app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Forward to the registry.
    Engine(Command),
    TogglePause,
    Quit,
    /// Focus moved; nothing to execute. Carries a status line for the title.
    Focus(String),
}

/// Keyboard focus over the registry: one effect and one of its parameters.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    effect: usize,
    param: usize,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the focused effect.
    pub fn focused_effect<'a>(&self, registry: &'a Registry) -> Option<&'a str> {
        registry.names().nth(self.effect)
    }

    /// Name of the focused parameter.
    pub fn focused_param(&self, registry: &Registry) -> Option<&'static str> {
        let effect = self.focused_effect(registry)?;
        let rows = registry.describe(effect).ok()?;
        rows.get(self.param).map(|r| r.name)
    }

    /// Status line for the focused effect and parameter.
    pub fn status(&self, registry: &Registry) -> String {
        let Some(effect) = self.focused_effect(registry) else {
            return String::new();
        };
        let row = registry
            .describe(effect)
            .ok()
            .and_then(|rows| rows.get(self.param).cloned());
        match row {
            Some(r) => format!("{} / {} = {}", effect, r.label, r.value),
            None => effect.to_string(),
        }
    }

    /// Map one key press to an action.
    pub fn handle_key(&mut self, key: KeyCode, registry: &Registry) -> Option<Action> {
        match key {
            KeyCode::Digit(n @ 1..=9) => {
                let name = registry.names().nth(n as usize - 1)?;
                Some(Action::Engine(Command::toggle(name)))
            }
            KeyCode::Tab => {
                if registry.is_empty() {
                    return None;
                }
                self.effect = (self.effect + 1) % registry.len();
                self.param = 0;
                Some(Action::Focus(self.status(registry)))
            }
            KeyCode::BracketLeft | KeyCode::BracketRight => {
                let count = self.param_count(registry);
                if count == 0 {
                    return None;
                }
                self.param = if key == KeyCode::BracketRight {
                    (self.param + 1) % count
                } else {
                    (self.param + count - 1) % count
                };
                Some(Action::Focus(self.status(registry)))
            }
            KeyCode::Minus | KeyCode::Equal => {
                let effect = self.focused_effect(registry)?;
                let rows = registry.describe(effect).ok()?;
                let row = rows.get(self.param)?;
                let step = if key == KeyCode::Equal { row.step } else { -row.step };
                Some(Action::Engine(Command::configure(effect, row.name, row.value + step)))
            }
            KeyCode::P => Some(Action::TogglePause),
            KeyCode::Escape => Some(Action::Quit),
            _ => None,
        }
    }

    fn param_count(&self, registry: &Registry) -> usize {
        self.focused_effect(registry)
            .and_then(|e| registry.describe(e).ok())
            .map_or(0, |rows| rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    fn registry() -> (Registry, Scene) {
        let mut scene = Scene::new();
        let registry = Registry::with_defaults(&mut scene, "particles");
        (registry, scene)
    }

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        input.key_event(KeyCode::P, ElementState::Pressed);
        // Repeat while held does not fire again
        input.key_event(KeyCode::P, ElementState::Pressed);
        assert_eq!(input.keys_pressed(), &[KeyCode::P]);
        assert!(input.key_held(KeyCode::P));

        input.end_frame();
        assert!(input.keys_pressed().is_empty());
        assert!(input.key_held(KeyCode::P));

        input.key_event(KeyCode::P, ElementState::Released);
        assert!(!input.key_held(KeyCode::P));
    }

    #[test]
    fn test_digit_toggles() {
        let (registry, _scene) = registry();
        let mut controls = Controls::new();
        assert_eq!(
            controls.handle_key(KeyCode::Digit(4), &registry),
            Some(Action::Engine(Command::toggle("physics")))
        );
        assert_eq!(controls.handle_key(KeyCode::Digit(9), &registry), None);
        assert_eq!(controls.handle_key(KeyCode::Digit(0), &registry), None);
    }

    #[test]
    fn test_focus_and_step() {
        let (registry, _scene) = registry();
        let mut controls = Controls::new();
        assert_eq!(controls.focused_effect(&registry), Some("particles"));

        controls.handle_key(KeyCode::Tab, &registry);
        assert_eq!(controls.focused_effect(&registry), Some("fluid"));
        assert_eq!(controls.focused_param(&registry), Some("intensity"));

        controls.handle_key(KeyCode::BracketLeft, &registry);
        assert_eq!(controls.focused_param(&registry), Some("opacity"));

        let action = controls.handle_key(KeyCode::Minus, &registry);
        match action {
            Some(Action::Engine(Command::Configure {
                effect,
                param,
                value,
            })) => {
                assert_eq!(effect, "fluid");
                assert_eq!(param, "opacity");
                assert!((value - 0.7).abs() < 1e-6);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_tab_wraps() {
        let (registry, _scene) = registry();
        let mut controls = Controls::new();
        for _ in 0..registry.len() {
            controls.handle_key(KeyCode::Tab, &registry);
        }
        assert_eq!(controls.focused_effect(&registry), Some("particles"));
    }

    #[test]
    fn test_pause_and_quit() {
        let (registry, _scene) = registry();
        let mut controls = Controls::new();
        assert_eq!(controls.handle_key(KeyCode::P, &registry), Some(Action::TogglePause));
        assert_eq!(controls.handle_key(KeyCode::Escape, &registry), Some(Action::Quit));
        assert_eq!(controls.handle_key(KeyCode::Other(0), &registry), None);
    }
}
