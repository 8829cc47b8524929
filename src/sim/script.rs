//! Timed cutscene steps
//!
//! A cue is a flat list of `{action, after_ms}` steps run on the logical
//! millisecond clock: each action fires, then the cue waits `after_ms`
//! before the next one. Dialogue steps block the cue until the dialogue
//! closes, so the steps after a dialogue act as its completion callback.
//! Cues keep running while physics is paused and may overlap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::command::{Command, OverlayLayer};
use super::dialogue::DialogueStyle;
use super::state::{Collectible, CollectibleKind, LevelSession, OverlayState, TrackState};
use crate::consts::SILENCE_THRESHOLD;

/// A single scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Suspend physics
    Pause,
    /// Let physics run again
    Resume,
    PlaySound {
        name: String,
    },
    PlayTrack {
        name: String,
        volume: f32,
        #[serde(default)]
        restart: bool,
    },
    PauseTrack {
        name: String,
    },
    SetTrackVolume {
        name: String,
        volume: f32,
    },
    /// Ramp a track toward `to` by `delta` every `interval_ms`, running
    /// alongside the rest of the cue; a ramp to silence pauses the track
    FadeTrack {
        name: String,
        to: f32,
        delta: f32,
        interval_ms: u32,
    },
    Overlay {
        layer: OverlayLayer,
        opacity: f32,
        #[serde(default)]
        fade_ms: u32,
    },
    ShowImage {
        name: String,
    },
    HideImage,
    Speech {
        text: Option<String>,
    },
    ShowControls,
    HideControls,
    /// Open a dialogue and wait for it to close
    Dialogue {
        id: String,
        #[serde(default)]
        style: DialogueStyle,
    },
    /// Activate the pursuer at its spawn offset from the player
    SpawnEnemy,
    /// Drop a collectible `ahead` of the player, `lift` above the ground
    SpawnCollectible {
        kind: CollectibleKind,
        ahead: f32,
        lift: f32,
    },
    SetFlag {
        name: String,
    },
    /// Emit the navigation to the next level
    CompleteLevel,
    /// Rebuild the session from scratch
    Restart,
}

/// One step of a cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Wait after the action before the next step
    #[serde(default)]
    pub after_ms: u32,
}

impl Step {
    pub fn now(action: Action) -> Self {
        Self { action, after_ms: 0 }
    }

    pub fn then(action: Action, after_ms: u32) -> Self {
        Self { action, after_ms }
    }
}

/// What running an action means for the cue that ran it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// Blocked until this dialogue session closes
    AwaitDialogue(u64),
    /// The dialogue box is taken; retry the same step later
    Retry,
    /// Stop the cue (session is being rebuilt)
    Halt,
}

/// A running step list
#[derive(Debug, Clone)]
pub struct Cue {
    steps: Vec<Step>,
    next: usize,
    wait_ms: f32,
    budget_ms: f32,
    blocked_on: Option<u64>,
}

impl Cue {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            next: 0,
            wait_ms: 0.0,
            budget_ms: 0.0,
            blocked_on: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len() && self.blocked_on.is_none()
    }

    /// Run every step whose start time falls within the elapsed budget
    pub(crate) fn advance(&mut self, session: &mut LevelSession, dt_ms: f32) {
        self.budget_ms += dt_ms;
        loop {
            if let Some(id) = self.blocked_on {
                if session.dialogue.is_running(id) {
                    self.budget_ms = 0.0;
                    return;
                }
                self.blocked_on = None;
            }
            if self.next >= self.steps.len() || self.budget_ms < self.wait_ms {
                return;
            }
            self.budget_ms -= self.wait_ms;
            self.wait_ms = 0.0;

            let step = &self.steps[self.next];
            let after_ms = step.after_ms as f32;
            match session.run_action(&step.action) {
                Flow::Continue => {}
                Flow::AwaitDialogue(id) => self.blocked_on = Some(id),
                Flow::Retry => {
                    self.budget_ms = 0.0;
                    return;
                }
                Flow::Halt => {
                    self.next = self.steps.len();
                    return;
                }
            }
            self.wait_ms = after_ms;
            self.next += 1;
        }
    }
}

/// Advance every running cue by `dt_ms`
pub(crate) fn advance_cues(session: &mut LevelSession, dt_ms: f32) {
    let mut cues = std::mem::take(&mut session.cues);
    for cue in cues.iter_mut() {
        if session.restart_requested {
            break;
        }
        cue.advance(session, dt_ms);
    }
    cues.retain(|c| !c.is_finished());
    // Cues forked while the others ran were pushed to the session
    let forked = std::mem::replace(&mut session.cues, cues);
    session.cues.extend(forked);
}

/// Steps that ramp `from` toward `to` by `delta` every `interval_ms`
fn ramp_steps(name: &str, from: f32, to: f32, delta: f32, interval_ms: u32) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut volume = from;
    while (volume - to).abs() > SILENCE_THRESHOLD {
        volume = if volume > to {
            (volume - delta).max(to)
        } else {
            (volume + delta).min(to)
        };
        steps.push(Step::then(
            Action::SetTrackVolume {
                name: name.to_string(),
                volume,
            },
            interval_ms,
        ));
    }
    steps.push(Step::now(Action::SetTrackVolume {
        name: name.to_string(),
        volume: to,
    }));
    if to <= 0.0 {
        steps.push(Step::now(Action::PauseTrack {
            name: name.to_string(),
        }));
    }
    steps
}

impl LevelSession {
    /// Start a cue, running its immediate steps right away
    pub fn start_cue(&mut self, steps: Vec<Step>) {
        if steps.is_empty() {
            return;
        }
        let mut cue = Cue::new(steps);
        cue.advance(self, 0.0);
        if !cue.is_finished() && !self.restart_requested {
            self.cues.push(cue);
        }
    }

    /// Cues still running
    pub fn active_cues(&self) -> usize {
        self.cues.len()
    }

    pub(crate) fn run_action(&mut self, action: &Action) -> Flow {
        match action {
            Action::Pause => self.paused = true,
            Action::Resume => self.paused = false,
            Action::PlaySound { name } => {
                self.push_command(Command::PlaySound { name: name.clone() });
            }
            Action::PlayTrack {
                name,
                volume,
                restart,
            } => {
                self.tracks.insert(
                    name.clone(),
                    TrackState {
                        volume: *volume,
                        playing: true,
                    },
                );
                self.push_command(Command::PlayTrack {
                    name: name.clone(),
                    volume: *volume,
                    restart: *restart,
                });
            }
            Action::PauseTrack { name } => {
                self.tracks.entry(name.clone()).or_default().playing = false;
                self.push_command(Command::PauseTrack { name: name.clone() });
            }
            Action::SetTrackVolume { name, volume } => {
                self.tracks.entry(name.clone()).or_default().volume = *volume;
                self.push_command(Command::SetTrackVolume {
                    name: name.clone(),
                    volume: *volume,
                });
            }
            Action::FadeTrack {
                name,
                to,
                delta,
                interval_ms,
            } => {
                let from = self.tracks.get(name).map_or(0.0, |t| t.volume);
                let steps = ramp_steps(name, from, *to, *delta, *interval_ms);
                self.start_cue(steps);
            }
            Action::Overlay {
                layer,
                opacity,
                fade_ms,
            } => {
                self.overlays.insert(
                    *layer,
                    OverlayState {
                        opacity: *opacity,
                        fade_ms: *fade_ms,
                    },
                );
                self.push_command(Command::Overlay {
                    layer: *layer,
                    opacity: *opacity,
                    fade_ms: *fade_ms,
                });
            }
            Action::ShowImage { name } => {
                self.image = Some(name.clone());
                self.push_command(Command::ShowImage { name: name.clone() });
            }
            Action::HideImage => {
                self.image = None;
                self.push_command(Command::HideImage);
            }
            Action::Speech { text } => {
                self.speech = text.clone();
                self.push_command(Command::Speech { text: text.clone() });
            }
            Action::ShowControls => {
                self.controls_visible = true;
                self.push_command(Command::ShowControls);
            }
            Action::HideControls => {
                self.controls_visible = false;
                self.push_command(Command::HideControls);
            }
            Action::Dialogue { id, style } => {
                if self.dialogue.is_active() {
                    return Flow::Retry;
                }
                let Some(lines) = self.config.dialogues.get(id) else {
                    log::warn!("Dialogue '{}' not found, skipping", id);
                    return Flow::Continue;
                };
                let mut timing = self.config.dialogue;
                if let Some(char_ms) = self.char_ms_override {
                    timing.char_ms = char_ms;
                }
                log::info!("Dialogue '{}' opened ({} lines)", id, lines.len());
                let lines = lines.clone();
                let session_id = self.dialogue.start(lines, *style, timing);
                return Flow::AwaitDialogue(session_id);
            }
            Action::SpawnEnemy => {
                let x = self.player.pos.x + self.config.enemy.map_or(0.0, |e| e.spawn_offset);
                let ground = self.ground_top(x);
                if let Some(enemy) = self.enemy.as_mut() {
                    enemy.pos.x = x;
                    if let Some(top) = ground {
                        enemy.pos.y = top - enemy.radius;
                    }
                    enemy.active = true;
                    log::info!("Pursuer spawned at x={:.0}", x);
                } else {
                    log::warn!("SpawnEnemy in a level without a pursuer");
                }
            }
            Action::SpawnCollectible { kind, ahead, lift } => {
                let x = self.player.pos.x + ahead;
                let top = self.ground_top(x).unwrap_or(self.config.ground_top());
                let id = self.next_entity_id();
                self.world.collectibles.push(Collectible {
                    id,
                    kind: *kind,
                    pos: Vec2::new(x, top - lift),
                    collected: false,
                    hue: 0.0,
                    rotation: 0.0,
                });
                log::debug!("Spawned {:?} #{} at x={:.0}", kind, id, x);
            }
            Action::SetFlag { name } => {
                self.flags.set(name);
            }
            Action::CompleteLevel => {
                log::info!("Navigating to '{}'", self.config.next_level);
                self.push_command(Command::Navigate {
                    level: self.config.next_level.clone(),
                });
            }
            Action::Restart => {
                self.restart_requested = true;
                return Flow::Halt;
            }
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelConfig;

    fn session() -> LevelSession {
        let mut config = LevelConfig::meadow();
        config.intro.clear();
        LevelSession::new(config, 11).unwrap()
    }

    #[test]
    fn test_steps_fire_on_cumulative_time() {
        let mut s = session();
        s.start_cue(vec![
            Step::then(Action::ShowImage { name: "a".into() }, 1000),
            Step::then(Action::HideImage, 500),
            Step::now(Action::Speech {
                text: Some("done".into()),
            }),
        ]);
        assert_eq!(s.image.as_deref(), Some("a"));

        advance_cues(&mut s, 999.0);
        assert_eq!(s.image.as_deref(), Some("a"));
        advance_cues(&mut s, 1.0);
        assert_eq!(s.image, None);
        assert_eq!(s.speech, None);
        advance_cues(&mut s, 500.0);
        assert_eq!(s.speech.as_deref(), Some("done"));
        assert_eq!(s.active_cues(), 0);
    }

    #[test]
    fn test_large_dt_runs_several_steps() {
        let mut s = session();
        s.start_cue(vec![
            Step::then(Action::Pause, 100),
            Step::then(Action::Resume, 100),
            Step::now(Action::ShowControls),
        ]);
        assert!(s.is_paused());
        advance_cues(&mut s, 250.0);
        assert!(!s.is_paused());
        assert!(s.controls_visible);
    }

    #[test]
    fn test_dialogue_blocks_rest_of_cue() {
        let mut s = session();
        s.start_cue(vec![
            Step::now(Action::Dialogue {
                id: "first_lollipop".into(),
                style: DialogueStyle::Normal,
            }),
            Step::now(Action::ShowControls),
        ]);
        assert!(s.dialogue.is_active());
        advance_cues(&mut s, 60_000.0);
        assert!(!s.controls_visible);

        while s.dialogue.is_active() {
            s.advance_dialogue();
        }
        advance_cues(&mut s, 0.0);
        assert!(s.controls_visible);
    }

    #[test]
    fn test_fade_track_ramps_to_silence() {
        let mut s = session();
        s.start_cue(vec![Step::now(Action::PlayTrack {
            name: "bgm".into(),
            volume: 0.5,
            restart: false,
        })]);
        s.start_cue(vec![Step::now(Action::FadeTrack {
            name: "bgm".into(),
            to: 0.0,
            delta: 0.05,
            interval_ms: 50,
        })]);
        // First decrement is immediate
        assert!((s.tracks["bgm"].volume - 0.45).abs() < 1e-4);
        for _ in 0..20 {
            advance_cues(&mut s, 50.0);
        }
        assert_eq!(s.tracks["bgm"].volume, 0.0);
        assert!(!s.tracks["bgm"].playing);
        assert!(
            s.commands()
                .contains(&Command::PauseTrack { name: "bgm".into() })
        );
    }

    #[test]
    fn test_ramp_steps_rising() {
        let steps = ramp_steps("bgm", 0.0, 0.3, 0.1, 10);
        let last = steps.last().unwrap();
        assert_eq!(
            last.action,
            Action::SetTrackVolume {
                name: "bgm".into(),
                volume: 0.3
            }
        );
        assert!(
            !steps
                .iter()
                .any(|s| matches!(s.action, Action::PauseTrack { .. }))
        );
    }

    #[test]
    fn test_restart_halts_cue() {
        let mut s = session();
        s.start_cue(vec![
            Step::now(Action::Restart),
            Step::now(Action::ShowControls),
        ]);
        assert!(s.restart_requested);
        assert!(!s.controls_visible);
        assert_eq!(s.active_cues(), 0);
    }

    #[test]
    fn test_step_json_shape() {
        let json = r#"{"action":"overlay","layer":"black","opacity":0.5,"after_ms":200}"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.after_ms, 200);
        assert_eq!(
            step.action,
            Action::Overlay {
                layer: OverlayLayer::Black,
                opacity: 0.5,
                fade_ms: 0
            }
        );
    }
}
