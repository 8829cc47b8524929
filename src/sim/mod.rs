//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Physics velocities in px/frame, timers on the logical millisecond clock
//! - Seeded RNG only, drawn during generation
//! - Stable iteration order (config order for triggers, insertion order for entities)
//! - No rendering, audio or platform dependencies; side effects leave as [`Command`]s

pub mod collision;
pub mod command;
pub mod dialogue;
pub mod physics;
pub mod script;
pub mod state;
pub mod tick;
pub mod timeline;
pub mod world;

pub use crate::input::Controls;
pub use collision::{Platform, TerrainSegment};
pub use command::{Command, OverlayLayer};
pub use dialogue::{Advance, DialogueMachine, DialogueState, DialogueStyle, DialogueView};
pub use physics::StepOutcome;
pub use script::{Action, Step};
pub use state::{
    Camera, Collectible, CollectibleKind, Enemy, EventFlags, LevelSession, OverlayState,
    PickupRule, Player, TrackState,
};
pub use tick::tick;
pub use timeline::{Anchor, Guard, Trigger};
pub use world::{Decoration, Door, World};
