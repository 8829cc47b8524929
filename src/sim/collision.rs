//! Collision queries against level geometry
//!
//! Terrain is a contiguous strip of segments ordered by x, so "what is under
//! the player" is a linear scan where the first containing segment wins.
//! Platforms are thin floating boxes that are only solid from above.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;
use crate::consts::PLATFORM_SWEEP_EPSILON;

/// A slice of ground; `top` is the walkable surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainSegment {
    pub x: f32,
    pub width: f32,
    pub top: f32,
    pub height: f32,
}

impl TerrainSegment {
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Half-open horizontal span `[x, x + width)`
    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.right()
    }
}

/// A floating platform, solid from above only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    pub width: f32,
    pub top: f32,
    pub height: f32,
}

impl Platform {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.top, self.width, self.height)
    }
}

/// Surface height under `x`.
///
/// Outside the generated span the nearest end segment extends outward, so a
/// player who walks off either edge keeps standing on level ground. Only an
/// empty terrain yields `None` (no support: the player keeps falling).
pub fn ground_top(terrain: &[TerrainSegment], x: f32) -> Option<f32> {
    if let Some(segment) = terrain.iter().find(|s| s.contains_x(x)) {
        return Some(segment.top);
    }
    let first = terrain.first()?;
    let last = terrain.last()?;
    if x < first.x { Some(first.top) } else { Some(last.top) }
}

/// Swept landing test for a falling circle against a platform top.
///
/// `vy` is this frame's vertical velocity (already applied to `center`).
/// The lower edge must be inside the band the circle could have crossed
/// this frame, and the circle must be moving down or resting.
pub fn lands_on_platform(center: Vec2, radius: f32, vy: f32, platform: &Platform) -> bool {
    let overlaps_x =
        center.x + radius > platform.x && center.x - radius < platform.x + platform.width;
    if !overlaps_x {
        return false;
    }
    let bottom = center.y + radius;
    bottom > platform.top
        && bottom < platform.top + platform.height + vy + PLATFORM_SWEEP_EPSILON
        && vy >= 0.0
}

/// Two circles overlap (strictly)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> Vec<TerrainSegment> {
        vec![
            TerrainSegment {
                x: 0.0,
                width: 100.0,
                top: 600.0,
                height: 120.0,
            },
            TerrainSegment {
                x: 100.0,
                width: 100.0,
                top: 580.0,
                height: 140.0,
            },
            TerrainSegment {
                x: 200.0,
                width: 100.0,
                top: 560.0,
                height: 160.0,
            },
        ]
    }

    #[test]
    fn test_ground_top_first_match() {
        let terrain = strip();
        assert_eq!(ground_top(&terrain, 0.0), Some(600.0));
        assert_eq!(ground_top(&terrain, 99.9), Some(600.0));
        // Boundaries belong to the segment on the right
        assert_eq!(ground_top(&terrain, 100.0), Some(580.0));
        assert_eq!(ground_top(&terrain, 250.0), Some(560.0));
    }

    #[test]
    fn test_ground_top_edge_extension() {
        let terrain = strip();
        assert_eq!(ground_top(&terrain, -50.0), Some(600.0));
        assert_eq!(ground_top(&terrain, 300.0), Some(560.0));
        assert_eq!(ground_top(&[], 10.0), None);
    }

    #[test]
    fn test_platform_landing_swept() {
        let p = Platform {
            x: 100.0,
            width: 200.0,
            top: 450.0,
            height: 20.0,
        };
        // Falling fast: lower edge 30px below the top, inside the swept band
        assert!(lands_on_platform(Vec2::new(150.0, 450.0), 30.0, 12.0, &p));
        // Rising through the platform does not land
        assert!(!lands_on_platform(Vec2::new(150.0, 450.0), 30.0, -12.0, &p));
        // Far below the band
        assert!(!lands_on_platform(Vec2::new(150.0, 520.0), 30.0, 1.0, &p));
        // No horizontal overlap
        assert!(!lands_on_platform(Vec2::new(40.0, 450.0), 30.0, 5.0, &p));
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 25.0, Vec2::new(49.0, 0.0), 25.0));
        assert!(!circles_overlap(Vec2::ZERO, 25.0, Vec2::new(50.0, 0.0), 25.0));
    }
}
