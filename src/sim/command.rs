//! Side-effect commands emitted by the simulation
//!
//! The core never touches audio, DOM or navigation directly. Physics and
//! cues append commands here; the host drains and executes them.

use serde::{Deserialize, Serialize};

/// Full-screen overlay layers the renderer composites over the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayLayer {
    /// Intro artwork shown before gameplay
    Intro,
    /// Backdrop behind the dialogue box
    Dialogue,
    /// Dimming layer used during cutscenes
    Black,
    /// Lightning flash
    White,
    /// End-of-level fade
    Fade,
}

/// A single command for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Play a one-shot effect, restarted from time 0
    PlaySound { name: String },
    /// Start (or resume) a looping track
    PlayTrack {
        name: String,
        volume: f32,
        restart: bool,
    },
    PauseTrack { name: String },
    SetTrackVolume { name: String, volume: f32 },
    /// Transition an overlay to `opacity` over `fade_ms` (0 = instant)
    Overlay {
        layer: OverlayLayer,
        opacity: f32,
        fade_ms: u32,
    },
    ShowImage { name: String },
    HideImage,
    /// Floating caption next to the player (`None` hides it)
    Speech { text: Option<String> },
    ShowControls,
    HideControls,
    /// Leave this level for the named one
    Navigate { level: String },
    /// The session was rebuilt from scratch
    Restart,
}

impl Command {
    /// Commands handled by the audio subsystem
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            Command::PlaySound { .. }
                | Command::PlayTrack { .. }
                | Command::PauseTrack { .. }
                | Command::SetTrackVolume { .. }
        )
    }
}
