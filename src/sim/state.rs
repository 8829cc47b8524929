//! Level session state and core entity types
//!
//! Everything one play-through of a level owns lives in [`LevelSession`].
//! Nothing outlives a session; a restart rebuilds it from the config.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::command::{Command, OverlayLayer};
use super::dialogue::DialogueMachine;
use super::script::Cue;
use super::world::{self, World};
use crate::error::ConfigError;
use crate::level::{EnemyTuning, LevelConfig, PlayerTuning};

/// The player character (a rolling cube)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision circle radius
    pub radius: f32,
    /// Cosmetic roll angle (radians)
    pub angle: f32,
    pub on_ground: bool,
}

impl Player {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            pos: tuning.start,
            vel: Vec2::ZERO,
            radius: tuning.radius,
            angle: 0.0,
            on_ground: false,
        }
    }

    /// Lower edge of the collision circle
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }
}

/// Horizontal scroll position, derived from the player every frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
}

impl Camera {
    /// Follow `target_x` with a fixed lead, clamped to the level
    pub fn follow(&mut self, target_x: f32, lead: f32, level_length: f32, viewport_width: f32) {
        let max_x = (level_length - viewport_width).max(0.0);
        self.x = (target_x - lead).clamp(0.0, max_x);
    }
}

/// The shadow pursuer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    /// Cosmetic rotation per frame
    pub spin: f32,
    pub angle: f32,
    pub active: bool,
}

impl Enemy {
    pub fn new(tuning: &EnemyTuning) -> Self {
        Self {
            pos: Vec2::new(-200.0, 0.0),
            radius: tuning.radius,
            speed: tuning.speed,
            spin: tuning.spin,
            angle: 0.0,
            active: false,
        }
    }
}

/// Collectible kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Lollipop,
    Candy,
    /// Story item, needs the interact signal
    Heart,
}

/// How a collectible is picked up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickupRule {
    /// Center distance below `player.radius + reach`
    Touch { reach: f32 },
    /// Interact held while the horizontal distance is below `reach`
    Interact { reach: f32 },
}

impl CollectibleKind {
    pub fn pickup_rule(self) -> PickupRule {
        match self {
            CollectibleKind::Lollipop => PickupRule::Touch { reach: 20.0 },
            CollectibleKind::Candy => PickupRule::Touch { reach: 15.0 },
            CollectibleKind::Heart => PickupRule::Interact { reach: 50.0 },
        }
    }

    /// Height of the item's center above a platform top
    pub fn platform_lift(self) -> f32 {
        match self {
            CollectibleKind::Lollipop => 30.0,
            CollectibleKind::Candy => 15.0,
            CollectibleKind::Heart => 60.0,
        }
    }

    /// Height of the item's center above open ground
    pub fn ground_lift(self) -> f32 {
        match self {
            CollectibleKind::Lollipop => 40.0,
            CollectibleKind::Candy => 20.0,
            CollectibleKind::Heart => 60.0,
        }
    }
}

/// A collectible entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: CollectibleKind,
    pub pos: Vec2,
    /// Goes false -> true exactly once
    pub collected: bool,
    /// Cosmetic hue (degrees)
    pub hue: f32,
    /// Cosmetic rotation (radians)
    pub rotation: f32,
}

/// One-shot event flags. Set-only: nothing ever clears a flag mid-session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFlags {
    set: BTreeSet<String>,
}

impl EventFlags {
    /// Set a flag. Returns true if it was not already set.
    pub fn set(&mut self, name: &str) -> bool {
        if self.set.contains(name) {
            return false;
        }
        self.set.insert(name.to_string())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(String::as_str)
    }
}

/// Current opacity of an overlay layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayState {
    pub opacity: f32,
    /// Transition length requested with the last change
    pub fade_ms: u32,
}

/// Looping track bookkeeping (needed to ramp volumes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    pub volume: f32,
    pub playing: bool,
}

/// One play-through of a level
#[derive(Debug)]
pub struct LevelSession {
    pub(crate) config: Arc<LevelConfig>,
    /// Seed the world was generated from
    pub seed: u64,
    /// How many times the session was rebuilt after a defeat
    pub restarts: u32,
    /// Frames ticked
    pub frame: u64,
    /// Logical time elapsed (ms)
    pub elapsed_ms: f64,
    pub player: Player,
    pub camera: Camera,
    pub world: World,
    pub enemy: Option<Enemy>,
    pub flags: EventFlags,
    pub dialogue: DialogueMachine,
    pub overlays: BTreeMap<OverlayLayer, OverlayState>,
    pub tracks: BTreeMap<String, TrackState>,
    /// Full-screen image currently shown
    pub image: Option<String>,
    /// Caption floating next to the player
    pub speech: Option<String>,
    pub controls_visible: bool,
    /// Player overlaps the (inflated) door box
    pub near_door: bool,
    pub(crate) paused: bool,
    pub(crate) ending: bool,
    pub(crate) defeated: bool,
    pub(crate) restart_requested: bool,
    pub(crate) cues: Vec<Cue>,
    pub(crate) commands: Vec<Command>,
    /// Per-character reveal override from settings
    pub(crate) char_ms_override: Option<u32>,
    next_id: u32,
}

impl LevelSession {
    /// Validate `config` and start a session generated from `seed`
    pub fn new(config: LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!("Level '{}' starting with seed {}", config.name, seed);
        Ok(Self::build(Arc::new(config), seed, 0))
    }

    fn build(config: Arc<LevelConfig>, seed: u64, restarts: u32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let world = world::generate(&config, &mut rng);
        let next_id = world.collectibles.iter().map(|c| c.id).max().unwrap_or(0) + 1;

        let mut session = Self {
            seed,
            restarts,
            frame: 0,
            elapsed_ms: 0.0,
            player: Player::new(&config.player),
            camera: Camera::default(),
            world,
            enemy: config.enemy.as_ref().map(Enemy::new),
            flags: EventFlags::default(),
            dialogue: DialogueMachine::new(),
            overlays: BTreeMap::new(),
            tracks: BTreeMap::new(),
            image: None,
            speech: None,
            controls_visible: false,
            near_door: false,
            paused: false,
            ending: false,
            defeated: false,
            restart_requested: false,
            cues: Vec::new(),
            commands: Vec::new(),
            char_ms_override: None,
            next_id,
            config,
        };

        session.camera.follow(
            session.player.pos.x,
            session.config.camera_lead,
            session.config.length,
            session.config.viewport.width,
        );

        let intro = session.config.intro.clone();
        session.start_cue(intro);
        session
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Physics is suspended by a cue or an open dialogue
    pub fn is_paused(&self) -> bool {
        self.paused || self.dialogue.is_active()
    }

    /// The end-of-level sequence has begun
    pub fn is_ending(&self) -> bool {
        self.ending
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Whether PhysicsStep runs this frame
    pub fn is_simulating(&self) -> bool {
        !self.is_paused() && !self.ending && !self.defeated
    }

    /// Override the typewriter speed for dialogues started from now on
    pub fn set_char_ms(&mut self, char_ms: Option<u32>) {
        self.char_ms_override = char_ms;
    }

    /// Queue a command for the host
    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Take every command emitted since the last drain
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Pending commands without draining them
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Feed the external advance signal (click / Enter / E) to the dialogue
    pub fn advance_dialogue(&mut self) -> super::dialogue::Advance {
        let result = self.dialogue.advance();
        log::debug!("Dialogue advance: {:?}", result);
        result
    }

    /// Terrain surface under `x`
    pub fn ground_top(&self, x: f32) -> Option<f32> {
        super::collision::ground_top(&self.world.terrain, x)
    }

    /// Door reached with interact: start the end-of-level sequence
    pub(crate) fn begin_ending(&mut self) {
        if self.ending {
            return;
        }
        self.ending = true;
        log::info!("Level '{}' complete, running ending", self.config.name);
        let steps = self.config.ending.clone();
        self.start_cue(steps);
    }

    /// Caught by the pursuer: run the defeat sequence
    pub(crate) fn begin_defeat(&mut self) {
        if self.ending || self.defeated {
            return;
        }
        self.defeated = true;
        log::info!("Player caught at x={:.0}", self.player.pos.x);
        let steps = self.config.defeat.clone();
        self.start_cue(steps);
    }

    /// Rebuild the session from its config, keeping undelivered commands
    pub(crate) fn restart(&mut self) {
        let mut carried = std::mem::take(&mut self.commands);
        carried.push(Command::Restart);

        let seed = self.seed.wrapping_add(1);
        log::info!(
            "Restarting level '{}' (restart #{})",
            self.config.name,
            self.restarts + 1
        );
        let char_ms = self.char_ms_override;
        let mut fresh = Self::build(Arc::clone(&self.config), seed, self.restarts + 1);
        fresh.char_ms_override = char_ms;
        carried.append(&mut fresh.commands);
        fresh.commands = carried;
        *self = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_set_once() {
        let mut flags = EventFlags::default();
        assert!(flags.set("lightning"));
        assert!(!flags.set("lightning"));
        assert!(flags.is_set("lightning"));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn test_camera_clamps_both_ends() {
        let mut camera = Camera::default();
        camera.follow(100.0, 400.0, 15000.0, 1280.0);
        assert_eq!(camera.x, 0.0);
        camera.follow(5000.0, 400.0, 15000.0, 1280.0);
        assert_eq!(camera.x, 4600.0);
        camera.follow(14990.0, 400.0, 15000.0, 1280.0);
        assert_eq!(camera.x, 15000.0 - 1280.0);
    }

    #[test]
    fn test_camera_short_level() {
        let mut camera = Camera::default();
        camera.follow(900.0, 300.0, 800.0, 1280.0);
        assert_eq!(camera.x, 0.0);
    }

    #[test]
    fn test_session_starts_from_config() {
        let session = LevelSession::new(LevelConfig::meadow(), 7).unwrap();
        assert_eq!(session.player.pos, LevelConfig::meadow().player.start);
        assert!(session.enemy.is_none());
        assert!(!session.is_ending());
        // The meadow intro pauses until the intro art is gone
        assert!(session.is_paused());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = LevelConfig::meadow();
        config.length = 0.0;
        assert!(LevelSession::new(config, 1).is_err());
    }

    #[test]
    fn test_restart_rebuilds_session() {
        let mut session = LevelSession::new(LevelConfig::city(), 3).unwrap();
        session.player.pos.x = 9000.0;
        session.flags.set("first_thoughts");
        session.drain_commands();

        session.restart();
        assert_eq!(session.restarts, 1);
        assert_eq!(session.seed, 4);
        assert!(session.flags.is_empty());
        assert_eq!(session.player.pos, LevelConfig::city().player.start);
        assert_eq!(session.commands().first(), Some(&Command::Restart));
    }
}
