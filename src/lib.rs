//! Cube Trail - a side-scrolling narrative platformer core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world generation, physics, events, dialogue)
//! - `level`: Data-driven level configuration and the built-in levels
//! - `input`: Keyboard/touch merge into a single control vector
//! - `render`: Read-only per-frame snapshot for an external renderer
//! - `audio`: Audio sink abstraction and command dispatch
//! - `settings`: Player preferences

pub mod audio;
pub mod error;
pub mod input;
pub mod level;
pub mod render;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{AudioError, ConfigError};
pub use level::LevelConfig;
pub use settings::{Settings, TextSpeed};
pub use sim::{Command, Controls, LevelSession, tick};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration (60 Hz display refresh)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Upper bound on a single frame's timer advance (tab switches, stalls)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Default viewport
    pub const VIEWPORT_WIDTH: f32 = 1280.0;
    pub const VIEWPORT_HEIGHT: f32 = 720.0;

    /// Per-character reveal interval of the typewriter
    pub const DIALOGUE_CHAR_MS: u32 = 50;
    /// How long a touch tap holds the interact signal
    pub const INTERACT_PULSE_MS: f32 = 100.0;

    /// Slack added to the swept platform check
    pub const PLATFORM_SWEEP_EPSILON: f32 = 5.0;

    /// Volume below which a fading track is considered silent
    pub const SILENCE_THRESHOLD: f32 = 0.05;
}

/// Axis-aligned rectangle in world space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Square box around a circle
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Grow the rectangle by `margin` on every side
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2.0,
            self.h + margin * 2.0,
        )
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Move `current` toward `target` by at most `max_step`
#[inline]
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step * delta.signum()
    }
}
