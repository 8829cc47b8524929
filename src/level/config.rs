//! Data-driven level description
//!
//! One `LevelConfig` drives generation, tuning and scripting of a level, so
//! every level shares the same session code.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{DIALOGUE_CHAR_MS, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::error::ConfigError;
use crate::sim::CollectibleKind;
use crate::sim::script::{Action, Step};
use crate::sim::timeline::{Guard, Trigger};

/// Most items a single generator walk may produce
const MAX_GENERATED: f32 = 100_000.0;

/// Uniform range `[min, max)` sampled with the level RNG
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub min: f32,
    pub max: f32,
}

impl Spread {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        self.min + rng.random::<f32>() * (self.max - self.min)
    }

    fn check(&self, field: &str, positive: bool) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(ConfigError::invalid(field, "expected finite min <= max"));
        }
        if positive && self.min <= 0.0 {
            return Err(ConfigError::invalid(field, "must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

/// Ground profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainConfig {
    /// Level ground cut into equal chunks
    Flat { ground_height: f32, chunk: f32 },
    /// Repeating 4 rises, 4 falls, 1 flat; elevation clamped to
    /// `[min_elevation, max_elevation]` above `ground_height`
    Stepped {
        ground_height: f32,
        step_length: f32,
        step_height: f32,
        min_elevation: f32,
        max_elevation: f32,
    },
}

impl TerrainConfig {
    pub fn ground_height(&self) -> f32 {
        match *self {
            TerrainConfig::Flat { ground_height, .. } => ground_height,
            TerrainConfig::Stepped { ground_height, .. } => ground_height,
        }
    }
}

/// Sparse floating platforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub start: f32,
    /// Stop placing this far before the level end
    pub end_margin: f32,
    pub gap: Spread,
    pub width: Spread,
    /// Candidate platform tops, picked uniformly
    pub tiers: Vec<f32>,
    pub thickness: f32,
    /// Probability a slot stays empty
    pub skip_chance: f32,
    /// Probability a placed platform carries a lollipop
    pub lollipop_chance: f32,
    /// Probability it carries a candy when the lollipop roll fails
    pub candy_chance: f32,
}

/// Collectibles on open ground at fixed spacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundCollectibleConfig {
    pub start: f32,
    pub spacing: f32,
    pub end_margin: f32,
    pub lollipop_chance: f32,
    pub candy_chance: f32,
}

/// Decoration kinds (cosmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorKind {
    Cloud,
    Tree,
    Flower,
    Butterfly,
    Star,
    Building,
    StreetLamp,
    Bench,
}

impl DecorKind {
    /// Horizontal scroll factor relative to the camera
    pub fn parallax(self) -> f32 {
        match self {
            DecorKind::Cloud | DecorKind::Building => 0.5,
            DecorKind::Star => 0.0,
            _ => 1.0,
        }
    }
}

/// How a decoration layer is laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Cursor walk from `start` by a random `step` until past the level end
    /// plus `overshoot`; each stop is kept with probability `keep_chance`
    Walk {
        start: f32,
        step: Spread,
        #[serde(default)]
        overshoot: f32,
        #[serde(default = "one")]
        keep_chance: f32,
    },
    /// `count` items at uniform random x over `width` (level length if None)
    Scatter { count: u32, width: Option<f32> },
}

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorLayer {
    pub kind: DecorKind,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerTuning {
    pub start: Vec2,
    pub radius: f32,
    /// Horizontal speed (px/frame)
    pub speed: f32,
    /// Vertical velocity set on jump (negative = up)
    pub jump_impulse: f32,
    /// Cosmetic roll per frame while moving
    pub turn_rate: f32,
    /// Added to vy every frame
    pub gravity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyTuning {
    pub radius: f32,
    pub speed: f32,
    pub spin: f32,
    /// Spawn position relative to the player
    pub spawn_offset: f32,
}

/// Exit door placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorConfig {
    /// Distance of the door's left edge from the level end
    pub from_end: f32,
    pub width: f32,
    pub height: f32,
    /// Inflation of the door box for the "near" test
    #[serde(default)]
    pub margin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialogueTiming {
    pub char_ms: u32,
    /// Pause before typing each line after the first
    pub line_delay_ms: u32,
}

impl Default for DialogueTiming {
    fn default() -> Self {
        Self {
            char_ms: DIALOGUE_CHAR_MS,
            line_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SoundConfig {
    pub jump: String,
    /// One-shot played when a collectible of this kind is picked up
    #[serde(default)]
    pub pickups: BTreeMap<CollectibleKind, String>,
}

/// Complete description of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Target emitted with `Command::Navigate` on completion
    pub next_level: String,
    pub length: f32,
    #[serde(default)]
    pub viewport: Viewport,
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub platforms: Option<PlatformConfig>,
    #[serde(default)]
    pub ground_collectibles: Option<GroundCollectibleConfig>,
    #[serde(default)]
    pub decorations: Vec<DecorLayer>,
    pub player: PlayerTuning,
    #[serde(default)]
    pub enemy: Option<EnemyTuning>,
    /// Camera keeps the player this far from the left edge
    pub camera_lead: f32,
    pub door: DoorConfig,
    #[serde(default)]
    pub dialogue: DialogueTiming,
    #[serde(default)]
    pub dialogues: BTreeMap<String, Vec<String>>,
    pub sounds: SoundConfig,
    /// Cue started when the session is built
    #[serde(default)]
    pub intro: Vec<Step>,
    /// Cue started when the door is used
    #[serde(default)]
    pub ending: Vec<Step>,
    /// Cue started when the pursuer catches the player
    #[serde(default)]
    pub defeat: Vec<Step>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl LevelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a level file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Surface y of flat ground (before any elevation)
    pub fn ground_top(&self) -> f32 {
        self.viewport.height - self.terrain.ground_height()
    }

    /// Reject configs the generator or the scripts cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite_positive("length", self.length)?;
        finite_positive("viewport.width", self.viewport.width)?;
        finite_positive("viewport.height", self.viewport.height)?;

        match self.terrain {
            TerrainConfig::Flat { ground_height, chunk } => {
                finite_positive("terrain.ground_height", ground_height)?;
                finite_positive("terrain.chunk", chunk)?;
                bounded("terrain.chunk", self.length, chunk)?;
            }
            TerrainConfig::Stepped {
                ground_height,
                step_length,
                step_height,
                min_elevation,
                max_elevation,
            } => {
                finite_positive("terrain.ground_height", ground_height)?;
                finite_positive("terrain.step_length", step_length)?;
                bounded("terrain.step_length", self.length, step_length)?;
                if !step_height.is_finite() || step_height < 0.0 {
                    return Err(ConfigError::invalid("terrain.step_height", "must be >= 0"));
                }
                if min_elevation > max_elevation {
                    return Err(ConfigError::invalid(
                        "terrain.min_elevation",
                        "exceeds max_elevation",
                    ));
                }
            }
        }

        if let Some(platforms) = &self.platforms {
            platforms.gap.check("platforms.gap", false)?;
            platforms.width.check("platforms.width", true)?;
            if platforms.gap.min < 0.0 {
                return Err(ConfigError::invalid("platforms.gap", "must be >= 0"));
            }
            if platforms.tiers.is_empty() {
                return Err(ConfigError::invalid("platforms.tiers", "needs at least one tier"));
            }
            finite_positive("platforms.thickness", platforms.thickness)?;
            chance("platforms.skip_chance", platforms.skip_chance)?;
            chance("platforms.lollipop_chance", platforms.lollipop_chance)?;
            chance("platforms.candy_chance", platforms.candy_chance)?;
            bounded(
                "platforms",
                self.length - platforms.end_margin - platforms.start,
                platforms.width.min + platforms.gap.min,
            )?;
        }

        if let Some(ground) = &self.ground_collectibles {
            finite_positive("ground_collectibles.spacing", ground.spacing)?;
            bounded(
                "ground_collectibles.spacing",
                self.length - ground.end_margin - ground.start,
                ground.spacing,
            )?;
            chance("ground_collectibles.lollipop_chance", ground.lollipop_chance)?;
            chance("ground_collectibles.candy_chance", ground.candy_chance)?;
            if ground.lollipop_chance + ground.candy_chance > 1.0 {
                return Err(ConfigError::invalid(
                    "ground_collectibles",
                    "chances add up to more than 1",
                ));
            }
        }

        for (i, layer) in self.decorations.iter().enumerate() {
            match layer.placement {
                Placement::Walk {
                    start,
                    step,
                    overshoot,
                    keep_chance,
                } => {
                    let field = format!("decorations[{i}].step");
                    step.check(&field, true)?;
                    bounded(&field, self.length + overshoot - start, step.min)?;
                    chance(&format!("decorations[{i}].keep_chance"), keep_chance)?;
                }
                Placement::Scatter { count, width } => {
                    if count as f32 > MAX_GENERATED {
                        return Err(ConfigError::invalid(
                            format!("decorations[{i}].count"),
                            "too many items",
                        ));
                    }
                    if width.is_some_and(|w| !w.is_finite() || w < 0.0) {
                        return Err(ConfigError::invalid(
                            format!("decorations[{i}].width"),
                            "must be >= 0",
                        ));
                    }
                }
            }
        }

        finite_positive("player.radius", self.player.radius)?;
        if !self.player.speed.is_finite() || !self.player.gravity.is_finite() {
            return Err(ConfigError::invalid("player", "non-finite tuning"));
        }

        if self.door.from_end > self.length || self.door.from_end < self.door.width {
            return Err(ConfigError::invalid(
                "door.from_end",
                "door must fit inside the level",
            ));
        }

        if self.dialogue.char_ms == 0 {
            return Err(ConfigError::invalid("dialogue.char_ms", "must be positive"));
        }
        for (id, lines) in &self.dialogues {
            if lines.is_empty() {
                return Err(ConfigError::invalid(format!("dialogues.{id}"), "no lines"));
            }
        }

        let mut names = BTreeSet::new();
        for trigger in &self.triggers {
            if !names.insert(trigger.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("triggers.{}", trigger.name),
                    "duplicate trigger name",
                ));
            }
        }
        // Flags come from trigger names or explicit SetFlag steps
        let mut flags = names.clone();
        for steps in self.all_steps() {
            for step in steps {
                if let Action::SetFlag { name } = &step.action {
                    flags.insert(name.as_str());
                }
            }
        }
        for trigger in &self.triggers {
            let field = format!("triggers.{}", trigger.name);
            check_guard(&field, &trigger.guard, &flags)?;
            self.check_steps(&field, &trigger.steps)?;
        }
        self.check_steps("intro", &self.intro)?;
        self.check_steps("ending", &self.ending)?;
        self.check_steps("defeat", &self.defeat)?;

        Ok(())
    }

    pub(crate) fn all_steps(&self) -> impl Iterator<Item = &[Step]> {
        [&self.intro[..], &self.ending[..], &self.defeat[..]]
            .into_iter()
            .chain(self.triggers.iter().map(|t| &t.steps[..]))
    }

    fn check_steps(&self, field: &str, steps: &[Step]) -> Result<(), ConfigError> {
        for step in steps {
            match &step.action {
                Action::Dialogue { id, .. } if !self.dialogues.contains_key(id) => {
                    return Err(ConfigError::invalid(field, format!("unknown dialogue '{id}'")));
                }
                Action::SpawnEnemy if self.enemy.is_none() => {
                    return Err(ConfigError::invalid(field, "spawns an enemy without enemy tuning"));
                }
                Action::FadeTrack { delta, .. } if delta.is_nan() || *delta <= 0.0 => {
                    return Err(ConfigError::invalid(field, "fade delta must be positive"));
                }
                Action::PlayTrack { volume, .. }
                | Action::SetTrackVolume { volume, .. }
                | Action::FadeTrack { to: volume, .. }
                    if !(0.0..=1.0).contains(volume) =>
                {
                    return Err(ConfigError::invalid(field, "track volume outside [0, 1]"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn check_guard(field: &str, guard: &Guard, flags: &BTreeSet<&str>) -> Result<(), ConfigError> {
    match guard {
        Guard::Flag { name } if !flags.contains(name.as_str()) => Err(ConfigError::invalid(
            field,
            format!("guard waits on flag '{name}' that nothing sets"),
        )),
        Guard::All { all } => all.iter().try_for_each(|g| check_guard(field, g, flags)),
        _ => Ok(()),
    }
}

fn finite_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a positive number"))
    }
}

/// Reject walks over `span` whose `step` would produce too many items or
/// stop advancing in f32
fn bounded(field: &str, span: f32, step: f32) -> Result<(), ConfigError> {
    if !span.is_finite() {
        return Err(ConfigError::invalid(field, "span must be finite"));
    }
    if span > 0.0 && span / step > MAX_GENERATED {
        return Err(ConfigError::invalid(field, "step too small for the level length"));
    }
    Ok(())
}

fn chance(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "probability outside [0, 1]"))
    }
}
