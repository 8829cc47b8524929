//! Procedural level generation
//!
//! Shape is fixed by the level config; placement is randomized with the
//! session's seeded RNG. Every layer is a cursor walk along x, so generation
//! is linear in the level length.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Platform, TerrainSegment, ground_top};
use super::state::{Collectible, CollectibleKind};
use crate::Rect;
use crate::level::{DecorKind, DecorLayer, LevelConfig, Placement, TerrainConfig};

/// Stepped terrain cycle: 4 rises, 4 falls, 1 flat
const STEP_CYCLE: [i8; 9] = [1, 1, 1, 1, -1, -1, -1, -1, 0];

/// A purely cosmetic scenery item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    /// Color hue (degrees)
    pub hue: f32,
    /// Kind-specific look (foliage type, wing phase, ...)
    pub variant: f32,
    /// Lit windows as offsets inside a building
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<Vec2>,
}

/// The exit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub rect: Rect,
    /// Inflation applied for the "near" test
    pub margin: f32,
}

impl Door {
    pub fn hit_box(&self) -> Rect {
        self.rect.inflate(self.margin)
    }
}

/// Static level geometry plus the collectible list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub length: f32,
    pub terrain: Vec<TerrainSegment>,
    pub platforms: Vec<Platform>,
    pub collectibles: Vec<Collectible>,
    pub decorations: Vec<Decoration>,
    pub door: Door,
}

/// Build the level described by `config`
pub fn generate(config: &LevelConfig, rng: &mut Pcg32) -> World {
    let terrain = generate_terrain(config);
    let mut collectibles = Vec::new();
    let platforms = generate_platforms(config, &terrain, rng, &mut collectibles);
    generate_ground_collectibles(config, &terrain, rng, &mut collectibles);

    let mut decorations = Vec::new();
    for layer in &config.decorations {
        generate_layer(config, layer, &terrain, rng, &mut decorations);
    }

    let door = place_door(config, &terrain);

    log::info!(
        "Generated '{}': {} terrain segments, {} platforms, {} collectibles, {} decorations",
        config.name,
        terrain.len(),
        platforms.len(),
        collectibles.len(),
        decorations.len()
    );

    World {
        length: config.length,
        terrain,
        platforms,
        collectibles,
        decorations,
        door,
    }
}

/// Contiguous segments covering `[0, length)` in increasing x
pub fn generate_terrain(config: &LevelConfig) -> Vec<TerrainSegment> {
    let floor = config.viewport.height;
    let length = config.length;
    let mut segments = Vec::new();

    match config.terrain {
        TerrainConfig::Flat {
            ground_height,
            chunk,
        } => {
            let top = floor - ground_height;
            let mut x = 0.0;
            while x < length {
                let width = chunk.min(length - x);
                segments.push(TerrainSegment {
                    x,
                    width,
                    top,
                    height: ground_height,
                });
                x += width;
            }
        }
        TerrainConfig::Stepped {
            ground_height,
            step_length,
            step_height,
            min_elevation,
            max_elevation,
        } => {
            let mut elevation = min_elevation;
            let mut x = 0.0;
            let mut phase = 0;
            while x < length {
                let width = step_length.min(length - x);
                let height = ground_height + elevation;
                segments.push(TerrainSegment {
                    x,
                    width,
                    top: floor - height,
                    height,
                });
                x += width;
                elevation = (elevation + f32::from(STEP_CYCLE[phase]) * step_height)
                    .clamp(min_elevation, max_elevation);
                phase = (phase + 1) % STEP_CYCLE.len();
            }
        }
    }

    segments
}

fn generate_platforms(
    config: &LevelConfig,
    terrain: &[TerrainSegment],
    rng: &mut Pcg32,
    collectibles: &mut Vec<Collectible>,
) -> Vec<Platform> {
    let Some(cfg) = &config.platforms else {
        return Vec::new();
    };

    let mut platforms = Vec::new();
    let mut cursor = cfg.start;
    while cursor < config.length - cfg.end_margin {
        let gap = cfg.gap.sample(rng);
        let width = cfg.width.sample(rng);
        let tier = cfg.tiers[rng.random_range(0..cfg.tiers.len())];
        // Stepped ground may rise toward a tier; keep the platform above it
        let ground = ground_top(terrain, cursor + width / 2.0).unwrap_or(f32::INFINITY);
        let top = tier.min(ground - cfg.thickness * 4.0);

        if rng.random::<f32>() >= cfg.skip_chance {
            platforms.push(Platform {
                x: cursor,
                width,
                top,
                height: cfg.thickness,
            });

            let center = cursor + width / 2.0;
            let kind = if rng.random::<f32>() < cfg.lollipop_chance {
                Some(CollectibleKind::Lollipop)
            } else if rng.random::<f32>() < cfg.candy_chance {
                Some(CollectibleKind::Candy)
            } else {
                None
            };
            if let Some(kind) = kind {
                let y = top - kind.platform_lift();
                push_collectible(collectibles, kind, Vec2::new(center, y), rng);
            }
        }
        cursor += width + gap;
    }
    platforms
}

fn generate_ground_collectibles(
    config: &LevelConfig,
    terrain: &[TerrainSegment],
    rng: &mut Pcg32,
    collectibles: &mut Vec<Collectible>,
) {
    let Some(cfg) = &config.ground_collectibles else {
        return;
    };

    let mut x = cfg.start;
    while x < config.length - cfg.end_margin {
        let roll = rng.random::<f32>();
        let kind = if roll < cfg.lollipop_chance {
            Some(CollectibleKind::Lollipop)
        } else if roll < cfg.lollipop_chance + cfg.candy_chance {
            Some(CollectibleKind::Candy)
        } else {
            None
        };
        if let Some(kind) = kind {
            let top = ground_top(terrain, x).unwrap_or(config.ground_top());
            push_collectible(collectibles, kind, Vec2::new(x, top - kind.ground_lift()), rng);
        }
        x += cfg.spacing;
    }
}

fn push_collectible(
    collectibles: &mut Vec<Collectible>,
    kind: CollectibleKind,
    pos: Vec2,
    rng: &mut Pcg32,
) {
    collectibles.push(Collectible {
        id: collectibles.len() as u32 + 1,
        kind,
        pos,
        collected: false,
        hue: rng.random::<f32>() * 360.0,
        rotation: rng.random::<f32>() * std::f32::consts::PI,
    });
}

fn generate_layer(
    config: &LevelConfig,
    layer: &DecorLayer,
    terrain: &[TerrainSegment],
    rng: &mut Pcg32,
    out: &mut Vec<Decoration>,
) {
    match layer.placement {
        Placement::Walk {
            start,
            step,
            overshoot,
            keep_chance,
        } => {
            let end = config.length + overshoot;
            let mut x = start;
            while x < end {
                if keep_chance >= 1.0 || rng.random::<f32>() < keep_chance {
                    out.push(decoration(config, layer.kind, x, terrain, rng));
                }
                x += step.sample(rng);
            }
        }
        Placement::Scatter { count, width } => {
            let span = width.unwrap_or(config.length);
            for _ in 0..count {
                let x = rng.random::<f32>() * span;
                out.push(decoration(config, layer.kind, x, terrain, rng));
            }
        }
    }
}

/// Per-kind cosmetic attributes
fn decoration(
    config: &LevelConfig,
    kind: DecorKind,
    x: f32,
    terrain: &[TerrainSegment],
    rng: &mut Pcg32,
) -> Decoration {
    let ground = ground_top(terrain, x).unwrap_or(config.ground_top());
    let mut d = Decoration {
        kind,
        x,
        y: ground,
        width: 0.0,
        height: 0.0,
        scale: 1.0,
        hue: 0.0,
        variant: 0.0,
        windows: Vec::new(),
    };

    match kind {
        DecorKind::Cloud => {
            d.y = rng.random::<f32>() * 200.0 + 50.0;
            d.scale = rng.random::<f32>() * 0.5 + 0.5;
        }
        DecorKind::Tree => {
            d.height = rng.random::<f32>() * 50.0 + 80.0;
            d.variant = rng.random::<f32>();
        }
        DecorKind::Flower => {
            d.hue = rng.random::<f32>() * 360.0;
            d.scale = rng.random::<f32>() * 0.5 + 0.5;
        }
        DecorKind::Butterfly => {
            d.y = rng.random::<f32>() * (config.viewport.height - 150.0) + 100.0;
            d.hue = rng.random::<f32>() * 360.0;
            // Drift speed
            d.scale = rng.random::<f32>() + 0.5;
            d.variant = rng.random::<f32>() * 100.0;
        }
        DecorKind::Star => {
            d.y = rng.random::<f32>() * 400.0;
            d.scale = rng.random::<f32>() * 2.0;
        }
        DecorKind::Building => {
            d.width = rng.random::<f32>() * 150.0 + 80.0;
            d.height = rng.random::<f32>() * 300.0 + 100.0;
            let mut wx = 10.0;
            while wx < d.width - 20.0 {
                let mut wy = 10.0;
                while wy < d.height - 20.0 {
                    if rng.random::<f32>() > 0.6 {
                        d.windows.push(Vec2::new(wx, wy));
                    }
                    wy += 40.0;
                }
                wx += 30.0;
            }
        }
        DecorKind::StreetLamp => {
            d.height = 250.0;
        }
        DecorKind::Bench => {
            d.width = 60.0;
            d.height = 20.0;
        }
    }
    d
}

fn place_door(config: &LevelConfig, terrain: &[TerrainSegment]) -> Door {
    let x = config.length - config.door.from_end;
    let ground = ground_top(terrain, x + config.door.width / 2.0).unwrap_or(config.ground_top());
    Door {
        rect: Rect::new(x, ground - config.door.height, config.door.width, config.door.height),
        margin: config.door.margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn assert_contiguous(terrain: &[TerrainSegment], length: f32) {
        assert_eq!(terrain.first().map(|s| s.x), Some(0.0));
        for pair in terrain.windows(2) {
            assert_eq!(pair[0].x + pair[0].width, pair[1].x);
        }
        let last = terrain.last().unwrap();
        assert!((last.right() - length).abs() < 1e-3);
    }

    #[test]
    fn test_flat_terrain_covers_level() {
        let config = LevelConfig::meadow();
        let terrain = generate_terrain(&config);
        assert_contiguous(&terrain, config.length);
        assert!(terrain.iter().all(|s| s.top == config.ground_top()));
    }

    #[test]
    fn test_stepped_terrain_cycle() {
        let mut config = LevelConfig::city();
        config.terrain = TerrainConfig::Stepped {
            ground_height: 120.0,
            step_length: 100.0,
            step_height: 10.0,
            min_elevation: 0.0,
            max_elevation: 100.0,
        };
        config.length = 2000.0;
        let terrain = generate_terrain(&config);
        assert_contiguous(&terrain, config.length);

        let elevations: Vec<f32> = terrain.iter().map(|s| s.height - 120.0).collect();
        assert_eq!(
            &elevations[..10],
            &[0.0, 10.0, 20.0, 30.0, 40.0, 30.0, 20.0, 10.0, 0.0, 0.0]
        );
        // Floor clamp
        assert!(elevations.iter().all(|&e| e >= 0.0));
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let config = LevelConfig::meadow();
        let a = generate(&config, &mut Pcg32::seed_from_u64(42));
        let b = generate(&config, &mut Pcg32::seed_from_u64(42));
        assert_eq!(a.platforms, b.platforms);
        assert_eq!(a.collectibles.len(), b.collectibles.len());
        assert_eq!(a.decorations.len(), b.decorations.len());
    }

    #[test]
    fn test_platform_collectibles_sit_on_platforms() {
        let config = LevelConfig::meadow();
        let world = generate(&config, &mut Pcg32::seed_from_u64(3));
        assert!(!world.platforms.is_empty());
        for p in &world.platforms {
            let center = p.x + p.width / 2.0;
            let on_top: Vec<_> = world
                .collectibles
                .iter()
                .filter(|c| c.pos.x == center && c.pos.y < p.top)
                .collect();
            assert!(on_top.len() <= 1);
        }
    }

    #[test]
    fn test_collectible_ids_unique() {
        let world = generate(&LevelConfig::meadow(), &mut Pcg32::seed_from_u64(8));
        let mut ids: Vec<u32> = world.collectibles.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), world.collectibles.len());
    }

    #[test]
    fn test_door_near_level_end() {
        let config = LevelConfig::city();
        let world = generate(&config, &mut Pcg32::seed_from_u64(1));
        assert_eq!(world.door.rect.x, config.length - config.door.from_end);
        let ground = ground_top(&world.terrain, world.door.rect.x + world.door.rect.w / 2.0);
        assert_eq!(Some(world.door.rect.bottom()), ground);
    }

    #[test]
    fn test_walk_layers_stop_past_level_end() {
        let config = LevelConfig::city();
        let world = generate(&config, &mut Pcg32::seed_from_u64(2));
        let buildings = world
            .decorations
            .iter()
            .filter(|d| d.kind == DecorKind::Building);
        assert!(buildings.clone().count() > 0);
        assert!(buildings.into_iter().all(|d| d.x < config.length + 1000.0));
    }

    proptest! {
        #[test]
        fn prop_terrain_contiguous(
            length in 500.0f32..20000.0,
            step_length in 50.0f32..800.0,
            step_height in 0.0f32..40.0,
        ) {
            let mut config = LevelConfig::city();
            config.length = length;
            config.door.from_end = 200.0;
            config.terrain = TerrainConfig::Stepped {
                ground_height: 120.0,
                step_length,
                step_height,
                min_elevation: 0.0,
                max_elevation: 200.0,
            };
            let terrain = generate_terrain(&config);
            prop_assert_eq!(terrain[0].x, 0.0);
            for pair in terrain.windows(2) {
                prop_assert_eq!(pair[0].x + pair[0].width, pair[1].x);
                prop_assert!(pair[0].height >= 120.0);
            }
        }
    }
}
