//! Audio command dispatch
//!
//! The simulation only emits audio [`Command`]s. The host provides an
//! [`AudioSink`] that actually plays assets; the [`AudioDispatcher`] scales
//! volumes by the player's [`Settings`] and never lets a playback failure
//! reach gameplay: errors are logged and dropped.

use std::collections::BTreeMap;

use crate::error::AudioError;
use crate::settings::Settings;
use crate::sim::Command;

/// Host-side playback of named assets. Volumes are already scaled.
pub trait AudioSink {
    /// Play a one-shot effect from the start
    fn play_sound(&mut self, name: &str, volume: f32) -> Result<(), AudioError>;
    /// Start or resume a looping track; `restart` rewinds it first
    fn play_track(&mut self, name: &str, volume: f32, restart: bool) -> Result<(), AudioError>;
    fn pause_track(&mut self, name: &str) -> Result<(), AudioError>;
    fn set_track_volume(&mut self, name: &str, volume: f32) -> Result<(), AudioError>;
}

/// Sink that only logs; used by the headless runner
#[derive(Debug, Default)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn play_sound(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
        log::debug!("sfx {} @ {:.2}", name, volume);
        Ok(())
    }

    fn play_track(&mut self, name: &str, volume: f32, restart: bool) -> Result<(), AudioError> {
        log::debug!("track {} @ {:.2} (restart: {})", name, volume, restart);
        Ok(())
    }

    fn pause_track(&mut self, name: &str) -> Result<(), AudioError> {
        log::debug!("track {} paused", name);
        Ok(())
    }

    fn set_track_volume(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
        log::trace!("track {} volume {:.2}", name, volume);
        Ok(())
    }
}

/// Applies settings to audio commands and forwards them to a sink
#[derive(Debug, Default)]
pub struct AudioDispatcher {
    settings: Settings,
    /// Unscaled volume of every playing track
    playing: BTreeMap<String, f32>,
    /// Window lost focus
    blurred: bool,
}

impl AudioDispatcher {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            playing: BTreeMap::new(),
            blurred: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap settings and rescale the tracks already playing
    pub fn set_settings(&mut self, settings: Settings, sink: &mut dyn AudioSink) {
        self.settings = settings;
        self.rescale(sink);
    }

    /// Track window focus; with `mute_on_blur` a blurred window is silent
    pub fn set_focused(&mut self, focused: bool, sink: &mut dyn AudioSink) {
        if self.blurred == !focused {
            return;
        }
        self.blurred = !focused;
        if self.settings.mute_on_blur {
            self.rescale(sink);
        }
    }

    fn silenced(&self) -> bool {
        self.blurred && self.settings.mute_on_blur
    }

    fn music_volume(&self) -> f32 {
        if self.silenced() {
            0.0
        } else {
            self.settings.effective_music_volume()
        }
    }

    fn sfx_volume(&self) -> f32 {
        if self.silenced() {
            0.0
        } else {
            self.settings.effective_sfx_volume()
        }
    }

    fn rescale(&self, sink: &mut dyn AudioSink) {
        let music = self.music_volume();
        for (name, volume) in &self.playing {
            report(name, sink.set_track_volume(name, volume * music));
        }
    }

    /// Forward one command; returns false for non-audio commands
    pub fn dispatch(&mut self, command: &Command, sink: &mut dyn AudioSink) -> bool {
        let music = self.music_volume();
        match command {
            Command::PlaySound { name } => {
                let volume = self.sfx_volume();
                if volume > 0.0 {
                    report(name, sink.play_sound(name, volume));
                }
            }
            Command::PlayTrack {
                name,
                volume,
                restart,
            } => {
                self.playing.insert(name.clone(), *volume);
                report(name, sink.play_track(name, volume * music, *restart));
            }
            Command::PauseTrack { name } => {
                self.playing.remove(name);
                report(name, sink.pause_track(name));
            }
            Command::SetTrackVolume { name, volume } => {
                if let Some(current) = self.playing.get_mut(name) {
                    *current = *volume;
                }
                report(name, sink.set_track_volume(name, volume * music));
            }
            _ => return false,
        }
        true
    }

    /// Forward every audio command in `commands`, skipping the rest
    pub fn dispatch_all<'a>(
        &mut self,
        commands: impl IntoIterator<Item = &'a Command>,
        sink: &mut dyn AudioSink,
    ) {
        for command in commands {
            self.dispatch(command, sink);
        }
    }

    /// Tracks currently playing
    pub fn playing(&self) -> impl Iterator<Item = &str> {
        self.playing.keys().map(String::as_str)
    }
}

fn report(name: &str, result: Result<(), AudioError>) {
    if let Err(e) = result {
        log::warn!("Audio '{}' failed: {}", name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        refuse: bool,
    }

    impl Recorder {
        fn record(&mut self, call: String) -> Result<(), AudioError> {
            self.calls.push(call);
            if self.refuse {
                Err(AudioError::Refused {
                    name: "any".into(),
                    reason: "autoplay blocked".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl AudioSink for Recorder {
        fn play_sound(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
            self.record(format!("sound {name} {volume}"))
        }
        fn play_track(&mut self, name: &str, volume: f32, restart: bool) -> Result<(), AudioError> {
            self.record(format!("track {name} {volume} {restart}"))
        }
        fn pause_track(&mut self, name: &str) -> Result<(), AudioError> {
            self.record(format!("pause {name}"))
        }
        fn set_track_volume(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
            self.record(format!("volume {name} {volume}"))
        }
    }

    fn settings(master: f32, music: f32, sfx: f32) -> Settings {
        Settings {
            master_volume: master,
            music_volume: music,
            sfx_volume: sfx,
            ..Settings::default()
        }
    }

    #[test]
    fn test_volumes_are_scaled() {
        let mut sink = Recorder::default();
        let mut audio = AudioDispatcher::new(settings(0.5, 0.5, 1.0));
        audio.dispatch_all(
            &[
                Command::PlaySound {
                    name: "jump".into(),
                },
                Command::PlayTrack {
                    name: "bgm".into(),
                    volume: 0.5,
                    restart: false,
                },
            ],
            &mut sink,
        );
        assert_eq!(sink.calls, vec!["sound jump 0.5", "track bgm 0.125 false"]);
    }

    #[test]
    fn test_non_audio_commands_are_skipped() {
        let mut sink = Recorder::default();
        let mut audio = AudioDispatcher::default();
        assert!(!audio.dispatch(&Command::HideImage, &mut sink));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_mute_drops_effects() {
        let mut sink = Recorder::default();
        let mut audio = AudioDispatcher::new(Settings {
            muted: true,
            ..Settings::default()
        });
        audio.dispatch(
            &Command::PlaySound {
                name: "haha".into(),
            },
            &mut sink,
        );
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mut sink = Recorder {
            refuse: true,
            ..Default::default()
        };
        let mut audio = AudioDispatcher::default();
        assert!(audio.dispatch(
            &Command::PlayTrack {
                name: "chase".into(),
                volume: 0.7,
                restart: true,
            },
            &mut sink
        ));
        assert_eq!(sink.calls.len(), 1);
        assert_eq!(audio.playing().collect::<Vec<_>>(), vec!["chase"]);
    }

    #[test]
    fn test_settings_change_rescales_playing_tracks() {
        let mut sink = Recorder::default();
        let mut audio = AudioDispatcher::default();
        audio.dispatch(
            &Command::PlayTrack {
                name: "night".into(),
                volume: 0.5,
                restart: false,
            },
            &mut sink,
        );
        audio.dispatch(&Command::PauseTrack { name: "bgm".into() }, &mut sink);
        sink.calls.clear();

        audio.set_settings(settings(1.0, 0.5, 1.0), &mut sink);
        assert_eq!(sink.calls, vec!["volume night 0.25"]);
    }

    #[test]
    fn test_blur_mutes_until_focus_returns() {
        let mut sink = Recorder::default();
        let mut audio = AudioDispatcher::default();
        audio.dispatch(
            &Command::PlayTrack {
                name: "bgm".into(),
                volume: 0.5,
                restart: false,
            },
            &mut sink,
        );
        sink.calls.clear();

        audio.set_focused(false, &mut sink);
        audio.set_focused(false, &mut sink);
        audio.dispatch(
            &Command::PlaySound {
                name: "jump".into(),
            },
            &mut sink,
        );
        assert_eq!(sink.calls, vec!["volume bgm 0"]);

        sink.calls.clear();
        audio.set_focused(true, &mut sink);
        assert_eq!(sink.calls, vec!["volume bgm 0.5"]);
    }

    #[test]
    fn test_blur_keeps_playing_without_mute_on_blur() {
        let mut sink = Recorder::default();
        let mut audio = AudioDispatcher::new(Settings {
            mute_on_blur: false,
            ..Settings::default()
        });
        audio.set_focused(false, &mut sink);
        audio.dispatch(
            &Command::PlaySound {
                name: "jump".into(),
            },
            &mut sink,
        );
        assert_eq!(sink.calls, vec!["sound jump 1"]);
    }
}
