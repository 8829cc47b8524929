//! One-shot event triggers
//!
//! Evaluated after every physics frame, in config order. A trigger fires when
//! its flag (the trigger's name) is still unset and its guard holds; firing
//! sets the flag first, so no trigger can fire twice in a session.

use serde::{Deserialize, Serialize};

use super::script::Step;
use super::state::{CollectibleKind, LevelSession};

/// A horizontal position in the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Absolute world x
    X(f32),
    /// Fraction of the level length
    LevelFraction(f32),
    /// Distance before the door's left edge
    BeforeDoor(f32),
}

impl Anchor {
    pub fn resolve(&self, session: &LevelSession) -> f32 {
        match *self {
            Anchor::X(x) => x,
            Anchor::LevelFraction(f) => session.config.length * f,
            Anchor::BeforeDoor(d) => session.world.door.rect.x - d,
        }
    }
}

/// Condition over the session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Guard {
    /// Player center strictly right of the anchor
    PlayerPast { past: Anchor },
    Flag { name: String },
    /// At least one collectible of this kind was picked up
    Collected { kind: CollectibleKind },
    All { all: Vec<Guard> },
}

impl Guard {
    pub fn holds(&self, session: &LevelSession) -> bool {
        match self {
            Guard::PlayerPast { past } => session.player.pos.x > past.resolve(session),
            Guard::Flag { name } => session.flags.is_set(name),
            Guard::Collected { kind } => session
                .world
                .collectibles
                .iter()
                .any(|c| c.kind == *kind && c.collected),
            Guard::All { all } => all.iter().all(|g| g.holds(session)),
        }
    }
}

/// A named one-shot trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub guard: Guard,
    pub steps: Vec<Step>,
}

/// Fire every trigger whose guard holds and whose flag is unset
pub fn evaluate(session: &mut LevelSession) {
    let config = std::sync::Arc::clone(&session.config);
    for trigger in &config.triggers {
        if session.flags.is_set(&trigger.name) || !trigger.guard.holds(session) {
            continue;
        }
        session.flags.set(&trigger.name);
        log::info!(
            "Trigger '{}' fired at x={:.0}",
            trigger.name,
            session.player.pos.x
        );
        session.start_cue(trigger.steps.clone());
        if session.restart_requested {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelConfig;
    use crate::sim::script::Action;

    fn bare_city() -> LevelSession {
        let mut config = LevelConfig::city();
        config.intro.clear();
        config.triggers = vec![
            Trigger {
                name: "a".into(),
                guard: Guard::PlayerPast {
                    past: Anchor::X(500.0),
                },
                steps: vec![Step::now(Action::Speech {
                    text: Some("a".into()),
                })],
            },
            Trigger {
                name: "b".into(),
                guard: Guard::All {
                    all: vec![
                        Guard::Flag { name: "a".into() },
                        Guard::PlayerPast {
                            past: Anchor::LevelFraction(0.5),
                        },
                    ],
                },
                steps: vec![Step::now(Action::ShowControls)],
            },
        ];
        LevelSession::new(config, 5).unwrap()
    }

    #[test]
    fn test_trigger_fires_once() {
        let mut s = bare_city();
        s.player.pos.x = 499.0;
        evaluate(&mut s);
        assert!(!s.flags.is_set("a"));

        s.player.pos.x = 501.0;
        evaluate(&mut s);
        assert!(s.flags.is_set("a"));
        let emitted = s.drain_commands().len();
        assert_eq!(emitted, 1);

        // Walking back and forth never re-fires
        s.player.pos.x = 100.0;
        evaluate(&mut s);
        s.player.pos.x = 900.0;
        evaluate(&mut s);
        assert!(s.drain_commands().is_empty());
    }

    #[test]
    fn test_composite_guard_needs_every_part() {
        let mut s = bare_city();
        s.player.pos.x = s.config.length * 0.6;
        // "a" fires first in the same pass, which unlocks "b"
        evaluate(&mut s);
        assert!(s.flags.is_set("a"));
        assert!(s.flags.is_set("b"));
        assert!(s.controls_visible);
    }

    #[test]
    fn test_anchor_before_door() {
        let s = bare_city();
        let x = Anchor::BeforeDoor(1500.0).resolve(&s);
        assert_eq!(x, s.world.door.rect.x - 1500.0);
    }

    #[test]
    fn test_collected_guard() {
        let mut s = LevelSession::new(LevelConfig::meadow(), 9).unwrap();
        let guard = Guard::Collected {
            kind: CollectibleKind::Lollipop,
        };
        assert!(!guard.holds(&s));
        if let Some(c) = s
            .world
            .collectibles
            .iter_mut()
            .find(|c| c.kind == CollectibleKind::Lollipop)
        {
            c.collected = true;
            assert!(guard.holds(&s));
        }
    }
}
