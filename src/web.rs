//! Browser facade
//!
//! The page owns the canvas, the DOM overlays and the `<audio>` elements. It
//! forwards key and touch events here, calls [`Game::frame`] from
//! `requestAnimationFrame` and executes the returned command list. Audio
//! commands come back with settings already applied.

use wasm_bindgen::prelude::*;

use crate::audio::{AudioDispatcher, AudioSink};
use crate::error::AudioError;
use crate::input::{InputState, TouchButton};
use crate::settings::Settings;
use crate::sim::{Command, LevelSession, tick};
use crate::LevelConfig;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("Cube Trail (web) starting...");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Collects scaled audio calls back into commands for the page
#[derive(Default)]
struct QueueSink {
    out: Vec<Command>,
}

impl AudioSink for QueueSink {
    fn play_sound(&mut self, name: &str, _volume: f32) -> Result<(), AudioError> {
        self.out.push(Command::PlaySound { name: name.into() });
        Ok(())
    }

    fn play_track(&mut self, name: &str, volume: f32, restart: bool) -> Result<(), AudioError> {
        self.out.push(Command::PlayTrack {
            name: name.into(),
            volume,
            restart,
        });
        Ok(())
    }

    fn pause_track(&mut self, name: &str) -> Result<(), AudioError> {
        self.out.push(Command::PauseTrack { name: name.into() });
        Ok(())
    }

    fn set_track_volume(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
        self.out.push(Command::SetTrackVolume {
            name: name.into(),
            volume,
        });
        Ok(())
    }
}

#[wasm_bindgen]
pub struct Game {
    session: LevelSession,
    input: InputState,
    audio: AudioDispatcher,
    sink: QueueSink,
    /// Rescaled volumes waiting for the next frame
    pending: Vec<Command>,
}

#[wasm_bindgen]
impl Game {
    /// Start a built-in level by name
    #[wasm_bindgen(constructor)]
    pub fn new(level: &str, seed: u64) -> Result<Game, JsValue> {
        let config = LevelConfig::builtin(level).map_err(js_error)?;
        Self::with_config(config, seed)
    }

    /// Start a level from its JSON description
    pub fn from_json(json: &str, seed: u64) -> Result<Game, JsValue> {
        let config = LevelConfig::from_json(json).map_err(js_error)?;
        Self::with_config(config, seed)
    }

    fn with_config(config: LevelConfig, seed: u64) -> Result<Game, JsValue> {
        Ok(Self {
            session: LevelSession::new(config, seed).map_err(js_error)?,
            input: InputState::new(),
            audio: AudioDispatcher::default(),
            sink: QueueSink::default(),
            pending: Vec::new(),
        })
    }

    /// Advance one display frame; returns the commands to execute as JSON
    pub fn frame(&mut self, dt_ms: f32) -> Result<String, JsValue> {
        if self.input.take_advance() {
            self.session.advance_dialogue();
        }
        self.input.update(dt_ms);
        let controls = self.input.controls();
        tick(&mut self.session, &controls, dt_ms);

        let mut out = std::mem::take(&mut self.pending);
        for command in self.session.drain_commands() {
            if command.is_audio() {
                self.audio.dispatch(&command, &mut self.sink);
                out.append(&mut self.sink.out);
            } else {
                out.push(command);
            }
        }
        serde_json::to_string(&out).map_err(js_error)
    }

    /// Current frame for the renderer, as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.session.snapshot().to_json().map_err(js_error)
    }

    pub fn key_down(&mut self, key: &str) {
        self.input.key_down(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    /// `button` is one of "left", "right", "jump", "interact"
    pub fn touch(&mut self, button: &str, pressed: bool) {
        let button = match button {
            "left" => TouchButton::Left,
            "right" => TouchButton::Right,
            "jump" => TouchButton::Jump,
            "interact" => {
                // No interact taps once the ending runs
                if self.session.is_ending() {
                    return;
                }
                TouchButton::Interact
            }
            other => {
                log::warn!("Unknown touch button '{}'", other);
                return;
            }
        };
        self.input.touch(button, pressed);
    }

    /// Click on the dialogue box
    pub fn click(&mut self) {
        self.input.click();
    }

    /// Window lost focus
    pub fn blur(&mut self) {
        self.input.release_all();
        self.audio.set_focused(false, &mut self.sink);
        self.pending.append(&mut self.sink.out);
    }

    /// Window regained focus
    pub fn focus(&mut self) {
        self.audio.set_focused(true, &mut self.sink);
        self.pending.append(&mut self.sink.out);
    }

    /// Apply settings JSON (as kept in LocalStorage)
    pub fn set_settings(&mut self, json: &str) -> Result<(), JsValue> {
        let settings = Settings::from_json(json).map_err(js_error)?;
        self.session.set_char_ms(settings.char_ms_override());
        self.audio.set_settings(settings, &mut self.sink);
        self.pending.append(&mut self.sink.out);
        Ok(())
    }

    pub fn settings(&self) -> Result<String, JsValue> {
        self.audio.settings().to_json().map_err(js_error)
    }

    pub fn using_touch(&self) -> bool {
        self.input.using_touch
    }
}
