//! Input merge
//!
//! Keyboard keys and on-screen touch buttons are merged into one
//! [`Controls`] value per frame. Key names follow the DOM `KeyboardEvent.key`
//! convention; single-character keys match case-insensitively.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::consts::INTERACT_PULSE_MS;

/// The four booleans physics reads each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub interact: bool,
}

/// On-screen buttons shown on touch devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchButton {
    Left,
    Right,
    Jump,
    Interact,
}

/// Key names bound to each control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub jump: Vec<String>,
    pub interact: Vec<String>,
    /// Keys that advance an open dialogue
    pub advance: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        fn keys(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            left: keys(&["ArrowLeft", "a"]),
            right: keys(&["ArrowRight", "d"]),
            jump: keys(&[" ", "ArrowUp", "w"]),
            interact: keys(&["e"]),
            advance: keys(&["e", "Enter"]),
        }
    }
}

/// Single-character keys are case-insensitive, named keys are not
fn normalize(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_string(),
    }
}

/// Held keys, held touch buttons and the pending advance signal
#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: KeyBindings,
    held: BTreeSet<String>,
    touch: BTreeSet<TouchButton>,
    /// Remaining time of a tapped interact
    interact_pulse_ms: f32,
    advance: bool,
    /// Whether touch buttons were ever used (host shows them from then on)
    pub using_touch: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    fn bound(&self, keys: &[String]) -> bool {
        keys.iter().any(|k| self.held.contains(&normalize(k)))
    }

    pub fn key_down(&mut self, key: &str) {
        let key = normalize(key);
        if self.bindings.advance.iter().any(|k| normalize(k) == key) {
            self.advance = true;
        }
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(&normalize(key));
    }

    /// Press or release an on-screen button
    pub fn touch(&mut self, button: TouchButton, pressed: bool) {
        self.using_touch = true;
        if button == TouchButton::Interact {
            // The interact button is a tap, not a hold
            if pressed {
                self.tap_interact();
            }
            return;
        }
        if pressed {
            self.touch.insert(button);
        } else {
            self.touch.remove(&button);
        }
    }

    /// Hold interact for a short pulse
    pub fn tap_interact(&mut self) {
        self.interact_pulse_ms = INTERACT_PULSE_MS;
    }

    /// Click on the dialogue box
    pub fn click(&mut self) {
        self.advance = true;
    }

    /// Count down the interact pulse
    pub fn update(&mut self, dt_ms: f32) {
        self.interact_pulse_ms = (self.interact_pulse_ms - dt_ms).max(0.0);
    }

    /// Merge keyboard and touch into this frame's controls
    pub fn controls(&self) -> Controls {
        Controls {
            move_left: self.bound(&self.bindings.left) || self.touch.contains(&TouchButton::Left),
            move_right: self.bound(&self.bindings.right)
                || self.touch.contains(&TouchButton::Right),
            jump: self.bound(&self.bindings.jump) || self.touch.contains(&TouchButton::Jump),
            interact: self.bound(&self.bindings.interact) || self.interact_pulse_ms > 0.0,
        }
    }

    /// Consume the pending dialogue advance signal
    pub fn take_advance(&mut self) -> bool {
        std::mem::take(&mut self.advance)
    }

    /// Drop everything held (window lost focus)
    pub fn release_all(&mut self) {
        self.held.clear();
        self.touch.clear();
        self.interact_pulse_ms = 0.0;
        self.advance = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_keys_ignore_case() {
        let mut input = InputState::new();
        input.key_down("D");
        assert!(input.controls().move_right);
        input.key_up("d");
        assert!(!input.controls().move_right);
    }

    #[test]
    fn test_named_keys_and_space() {
        let mut input = InputState::new();
        input.key_down("ArrowLeft");
        input.key_down(" ");
        let c = input.controls();
        assert!(c.move_left && c.jump);
        assert!(!c.move_right && !c.interact);
    }

    #[test]
    fn test_touch_merges_with_keyboard() {
        let mut input = InputState::new();
        input.touch(TouchButton::Right, true);
        input.key_down("w");
        let c = input.controls();
        assert!(c.move_right && c.jump);
        assert!(input.using_touch);
        input.touch(TouchButton::Right, false);
        assert!(!input.controls().move_right);
    }

    #[test]
    fn test_interact_tap_is_a_pulse() {
        let mut input = InputState::new();
        input.touch(TouchButton::Interact, true);
        assert!(input.controls().interact);
        input.update(60.0);
        assert!(input.controls().interact);
        input.update(40.0);
        assert!(!input.controls().interact);
    }

    #[test]
    fn test_advance_is_latched_once() {
        let mut input = InputState::new();
        assert!(!input.take_advance());
        input.key_down("Enter");
        assert!(input.take_advance());
        assert!(!input.take_advance());

        // E both interacts and advances
        input.key_down("E");
        assert!(input.controls().interact);
        assert!(input.take_advance());

        input.click();
        assert!(input.take_advance());
    }

    #[test]
    fn test_custom_bindings() {
        let bindings = KeyBindings {
            jump: vec!["k".into()],
            ..KeyBindings::default()
        };
        let mut input = InputState::with_bindings(bindings);
        input.key_down(" ");
        assert!(!input.controls().jump);
        input.key_down("K");
        assert!(input.controls().jump);
        input.release_all();
        assert_eq!(input.controls(), Controls::default());
    }
}
