//! The two shipped levels
//!
//! Both are plain `LevelConfig` values; a host can just as well load the same
//! shape from JSON with [`LevelConfig::load`].

use std::collections::BTreeMap;

use glam::Vec2;

use super::config::*;
use crate::error::ConfigError;
use crate::sim::CollectibleKind;
use crate::sim::command::OverlayLayer;
use crate::sim::dialogue::DialogueStyle;
use crate::sim::script::{Action, Step};
use crate::sim::timeline::{Anchor, Guard, Trigger};

/// Names accepted by [`LevelConfig::builtin`], in play order
pub const BUILTIN_LEVELS: [&str; 2] = ["meadow", "city"];

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn overlay(layer: OverlayLayer, opacity: f32, fade_ms: u32) -> Action {
    Action::Overlay {
        layer,
        opacity,
        fade_ms,
    }
}

fn track(name: &str, volume: f32, restart: bool) -> Action {
    Action::PlayTrack {
        name: name.into(),
        volume,
        restart,
    }
}

fn sound(name: &str) -> Action {
    Action::PlaySound { name: name.into() }
}

fn image(name: &str) -> Action {
    Action::ShowImage { name: name.into() }
}

fn dialogue(id: &str, style: DialogueStyle) -> Action {
    Action::Dialogue {
        id: id.into(),
        style,
    }
}

fn speech(text: Option<&str>) -> Action {
    Action::Speech {
        text: text.map(str::to_string),
    }
}

/// Shared jump-scare sequence of the city's ending and defeat
fn jump_scare(tracks: &[&str]) -> Vec<Step> {
    let mut steps = vec![Step::now(Action::Pause), Step::now(Action::HideControls)];
    steps.extend(tracks.iter().map(|name| {
        Step::now(Action::PauseTrack {
            name: name.to_string(),
        })
    }));
    steps.extend([
        Step::now(sound("scare")),
        Step::then(image("scare"), 2000),
        Step::now(overlay(OverlayLayer::Black, 1.0, 0)),
        Step::then(Action::HideImage, 3000),
    ]);
    steps
}

impl LevelConfig {
    /// Look up a shipped level by name
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        match name {
            "meadow" => Ok(Self::meadow()),
            "city" => Ok(Self::city()),
            other => Err(ConfigError::UnknownLevel(other.to_string())),
        }
    }

    /// Daytime meadow: candy, a lollipop monologue and mom calling
    pub fn meadow() -> Self {
        let mut dialogues = BTreeMap::new();
        dialogues.insert(
            "first_lollipop".to_string(),
            lines(&[
                "...",
                "Leaving home is part of life...",
                "But I forgot to say goodbye to my parents...",
                "Well...",
                "by now...",
                "I can't even see my house...",
                "No point in moping about it...",
                "...",
                "This world is really pretty...",
                "I wonder what it has in store for me?",
                "I think...",
                "I see a friendly house up ahead...",
            ]),
        );

        let mut pickups = BTreeMap::new();
        pickups.insert(CollectibleKind::Lollipop, "laugh".to_string());
        pickups.insert(CollectibleKind::Candy, "candy_laugh".to_string());

        Self {
            name: "meadow".into(),
            next_level: "city".into(),
            length: 15000.0,
            viewport: Viewport::default(),
            terrain: TerrainConfig::Flat {
                ground_height: 100.0,
                chunk: 500.0,
            },
            platforms: Some(PlatformConfig {
                start: 400.0,
                end_margin: 500.0,
                gap: Spread::new(50.0, 200.0),
                width: Spread::new(100.0, 300.0),
                tiers: vec![450.0, 350.0],
                thickness: 20.0,
                skip_chance: 0.3,
                lollipop_chance: 0.6,
                candy_chance: 0.6,
            }),
            ground_collectibles: Some(GroundCollectibleConfig {
                start: 500.0,
                spacing: 600.0,
                end_margin: 500.0,
                lollipop_chance: 0.4,
                candy_chance: 0.3,
            }),
            decorations: vec![
                DecorLayer {
                    kind: DecorKind::Cloud,
                    placement: Placement::Walk {
                        start: 0.0,
                        step: Spread::new(200.0, 600.0),
                        overshoot: 0.0,
                        keep_chance: 1.0,
                    },
                },
                DecorLayer {
                    kind: DecorKind::Tree,
                    placement: Placement::Walk {
                        start: 0.0,
                        step: Spread::new(100.0, 400.0),
                        overshoot: 0.0,
                        keep_chance: 1.0,
                    },
                },
                DecorLayer {
                    kind: DecorKind::Flower,
                    placement: Placement::Walk {
                        start: 0.0,
                        step: Spread::new(20.0, 70.0),
                        overshoot: 0.0,
                        keep_chance: 1.0,
                    },
                },
                DecorLayer {
                    kind: DecorKind::Butterfly,
                    placement: Placement::Scatter {
                        count: 1500,
                        width: None,
                    },
                },
            ],
            player: PlayerTuning {
                start: Vec2::new(100.0, 500.0),
                radius: 30.0,
                speed: 7.0,
                jump_impulse: -16.0,
                turn_rate: 0.15,
                gravity: 0.8,
            },
            enemy: None,
            camera_lead: 400.0,
            door: DoorConfig {
                from_end: 270.0,
                width: 40.0,
                height: 132.0,
                margin: 0.0,
            },
            dialogue: DialogueTiming::default(),
            dialogues,
            sounds: SoundConfig {
                jump: "jump".into(),
                pickups,
            },
            intro: vec![
                Step::now(Action::Pause),
                Step::now(overlay(OverlayLayer::Intro, 1.0, 0)),
                Step::then(image("intro"), 3000),
                Step::now(Action::HideImage),
                Step::now(overlay(OverlayLayer::Intro, 0.0, 1000)),
                Step::now(track("bgm", 0.5, false)),
                Step::now(Action::ShowControls),
                Step::now(Action::Resume),
            ],
            ending: vec![
                Step::now(Action::HideControls),
                Step::now(overlay(OverlayLayer::Fade, 1.0, 3000)),
                Step::then(
                    Action::FadeTrack {
                        name: "bgm".into(),
                        to: 0.0,
                        delta: 0.02,
                        interval_ms: 100,
                    },
                    3500,
                ),
                Step::now(Action::CompleteLevel),
            ],
            defeat: vec![Step::now(Action::Restart)],
            triggers: vec![
                Trigger {
                    name: "first_lollipop".into(),
                    guard: Guard::Collected {
                        kind: CollectibleKind::Lollipop,
                    },
                    steps: vec![
                        Step::now(Action::Pause),
                        Step::now(Action::FadeTrack {
                            name: "bgm".into(),
                            to: 0.0,
                            delta: 0.05,
                            interval_ms: 50,
                        }),
                        Step::now(overlay(OverlayLayer::Dialogue, 1.0, 500)),
                        Step::now(dialogue("first_lollipop", DialogueStyle::Normal)),
                        Step::then(overlay(OverlayLayer::Dialogue, 0.0, 1000), 1000),
                        Step::now(track("bgm", 0.5, false)),
                        Step::now(Action::Resume),
                    ],
                },
                Trigger {
                    name: "mother_call".into(),
                    guard: Guard::PlayerPast {
                        past: Anchor::LevelFraction(0.5),
                    },
                    steps: vec![
                        Step::then(sound("mom"), 500),
                        Step::then(speech(Some("Coming, Mom!")), 4000),
                        Step::now(speech(None)),
                    ],
                },
            ],
        }
    }

    /// Night city: the lightning heart, the threat and the chase
    pub fn city() -> Self {
        let mut dialogues = BTreeMap::new();
        dialogues.insert(
            "first_thoughts".to_string(),
            lines(&[
                "I missed the bus...",
                "And it got dark so fast...",
                "Great!",
                "...",
                "This job is killing me...",
                "I wonder how my parents are doing?",
                "...",
                "Whatever.",
                "...",
            ]),
        );
        dialogues.insert(
            "heart".to_string(),
            lines(&[
                "A heart...",
                "Did someone lose it?",
                "Either way...",
                "it's already gone...",
                "...",
                "Just like...",
                "...",
                "Strange...",
                "...",
                "Was it a good idea...",
                "Leaving home...?",
                "...",
                "Out of spite...?",
                "...",
                "Er...",
                "It keeps getting darker...",
                "I can't keep thinking or I'll end up sleeping on the street.",
            ]),
        );
        dialogues.insert(
            "threat".to_string(),
            lines(&[
                "Hey.",
                "You shouldn't be here...",
                "...",
                "Hahahahahahahhahahahhaha",
            ]),
        );

        Self {
            name: "city".into(),
            next_level: "end".into(),
            length: 15000.0,
            viewport: Viewport::default(),
            terrain: TerrainConfig::Stepped {
                ground_height: 120.0,
                step_length: 200.0,
                step_height: 20.0,
                min_elevation: 0.0,
                max_elevation: 100.0,
            },
            platforms: None,
            ground_collectibles: None,
            decorations: vec![
                DecorLayer {
                    kind: DecorKind::Star,
                    placement: Placement::Scatter {
                        count: 100,
                        width: Some(1280.0),
                    },
                },
                DecorLayer {
                    kind: DecorKind::Building,
                    placement: Placement::Walk {
                        start: 0.0,
                        step: Spread::new(100.0, 300.0),
                        overshoot: 1000.0,
                        keep_chance: 1.0,
                    },
                },
                DecorLayer {
                    kind: DecorKind::StreetLamp,
                    placement: Placement::Walk {
                        start: 200.0,
                        step: Spread::fixed(600.0),
                        overshoot: 0.0,
                        keep_chance: 1.0,
                    },
                },
                DecorLayer {
                    kind: DecorKind::Bench,
                    placement: Placement::Walk {
                        start: 400.0,
                        step: Spread::fixed(900.0),
                        overshoot: 0.0,
                        keep_chance: 0.7,
                    },
                },
            ],
            player: PlayerTuning {
                start: Vec2::new(100.0, 550.0),
                radius: 25.0,
                speed: 6.0,
                jump_impulse: -15.0,
                turn_rate: 0.2,
                gravity: 0.8,
            },
            enemy: Some(EnemyTuning {
                radius: 25.0,
                speed: 5.5,
                spin: 0.3,
                spawn_offset: -600.0,
            }),
            camera_lead: 300.0,
            door: DoorConfig {
                from_end: 200.0,
                width: 80.0,
                height: 120.0,
                margin: 0.0,
            },
            dialogue: DialogueTiming {
                char_ms: 50,
                line_delay_ms: 200,
            },
            dialogues,
            sounds: SoundConfig {
                jump: "jump".into(),
                pickups: BTreeMap::new(),
            },
            intro: vec![
                Step::now(track("bgm", 0.5, false)),
                Step::now(Action::ShowControls),
            ],
            ending: {
                let mut steps = jump_scare(&["bgm", "night", "chase"]);
                steps.extend([
                    Step::then(overlay(OverlayLayer::White, 1.0, 3000), 3000),
                    Step::now(Action::CompleteLevel),
                ]);
                steps
            },
            defeat: {
                let mut steps = jump_scare(&["chase"]);
                steps.push(Step::now(Action::Restart));
                steps
            },
            triggers: vec![
                Trigger {
                    name: "first_thoughts".into(),
                    guard: Guard::PlayerPast {
                        past: Anchor::X(500.0),
                    },
                    steps: vec![
                        Step::now(overlay(OverlayLayer::Black, 0.5, 500)),
                        Step::now(dialogue("first_thoughts", DialogueStyle::Normal)),
                        Step::now(overlay(OverlayLayer::Black, 0.0, 500)),
                    ],
                },
                Trigger {
                    name: "lightning".into(),
                    guard: Guard::PlayerPast {
                        past: Anchor::X(4000.0),
                    },
                    steps: vec![
                        Step::now(Action::PauseTrack { name: "bgm".into() }),
                        Step::now(sound("thunder")),
                        Step::now(overlay(OverlayLayer::White, 1.0, 0)),
                        Step::then(
                            Action::SpawnCollectible {
                                kind: CollectibleKind::Heart,
                                ahead: 400.0,
                                lift: 60.0,
                            },
                            50,
                        ),
                        Step::now(overlay(OverlayLayer::White, 0.0, 5000)),
                    ],
                },
                Trigger {
                    name: "heart".into(),
                    guard: Guard::Collected {
                        kind: CollectibleKind::Heart,
                    },
                    steps: vec![
                        Step::now(Action::Pause),
                        Step::then(overlay(OverlayLayer::Black, 1.0, 0), 1000),
                        Step::then(image("heart"), 2000),
                        Step::now(Action::HideImage),
                        Step::now(overlay(OverlayLayer::Black, 0.5, 500)),
                        Step::now(dialogue("heart", DialogueStyle::Normal)),
                        Step::now(overlay(OverlayLayer::Black, 0.0, 500)),
                        Step::now(track("night", 0.6, false)),
                        Step::now(Action::Resume),
                    ],
                },
                Trigger {
                    name: "threat".into(),
                    guard: Guard::All {
                        all: vec![
                            Guard::Flag {
                                name: "heart".into(),
                            },
                            Guard::PlayerPast {
                                past: Anchor::X(8000.0),
                            },
                        ],
                    },
                    steps: vec![
                        Step::now(Action::PauseTrack {
                            name: "night".into(),
                        }),
                        Step::now(overlay(OverlayLayer::Black, 0.7, 500)),
                        Step::now(dialogue("threat", DialogueStyle::Threat)),
                        Step::now(overlay(OverlayLayer::Black, 0.0, 500)),
                        Step::now(Action::SpawnEnemy),
                        Step::now(track("chase", 0.7, true)),
                    ],
                },
                Trigger {
                    name: "laughter".into(),
                    guard: Guard::PlayerPast {
                        past: Anchor::BeforeDoor(1500.0),
                    },
                    steps: vec![
                        Step::now(sound("haha")),
                        Step::now(speech(Some("AHAHAHHAHA"))),
                    ],
                },
            ],
        }
    }
}
