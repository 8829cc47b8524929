//! Read-only frame snapshot for an external renderer
//!
//! The core does no drawing. A renderer (canvas, wgpu, a test) reads one
//! [`RenderSnapshot`] per frame; only what falls inside the viewport is
//! included, with decorations culled at their parallax-adjusted position.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sim::collision::{Platform, TerrainSegment};
use crate::sim::command::OverlayLayer;
use crate::sim::dialogue::DialogueView;
use crate::sim::state::{Collectible, Enemy, LevelSession, OverlayState, Player};
use crate::sim::world::{Decoration, Door};

/// Extra width kept on both sides of the viewport
const CULL_MARGIN: f32 = 200.0;

#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot<'a> {
    pub level: &'a str,
    pub camera_x: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub player: &'a Player,
    pub terrain: Vec<&'a TerrainSegment>,
    pub platforms: Vec<&'a Platform>,
    /// Uncollected items only
    pub collectibles: Vec<&'a Collectible>,
    pub decorations: Vec<&'a Decoration>,
    /// Present only while the pursuer is active
    pub enemy: Option<&'a Enemy>,
    pub door: &'a Door,
    pub near_door: bool,
    pub dialogue: Option<DialogueView<'a>>,
    pub overlays: &'a BTreeMap<OverlayLayer, OverlayState>,
    pub image: Option<&'a str>,
    pub speech: Option<&'a str>,
    pub controls_visible: bool,
}

impl RenderSnapshot<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl LevelSession {
    /// Everything needed to draw the current frame
    pub fn snapshot(&self) -> RenderSnapshot<'_> {
        let config = self.config();
        let left = self.camera.x - CULL_MARGIN;
        let right = self.camera.x + config.viewport.width + CULL_MARGIN;
        let visible = |x: f32, w: f32| x + w >= left && x <= right;

        RenderSnapshot {
            level: &config.name,
            camera_x: self.camera.x,
            viewport_width: config.viewport.width,
            viewport_height: config.viewport.height,
            player: &self.player,
            terrain: self
                .world
                .terrain
                .iter()
                .filter(|s| visible(s.x, s.width))
                .collect(),
            platforms: self
                .world
                .platforms
                .iter()
                .filter(|p| visible(p.x, p.width))
                .collect(),
            collectibles: self
                .world
                .collectibles
                .iter()
                .filter(|c| !c.collected && visible(c.pos.x, 0.0))
                .collect(),
            decorations: self
                .world
                .decorations
                .iter()
                .filter(|d| {
                    // Scrolls at `parallax` times the camera speed
                    let shift = self.camera.x * (1.0 - d.kind.parallax());
                    visible(d.x + shift, d.width)
                })
                .collect(),
            enemy: self.enemy.as_ref().filter(|e| e.active),
            door: &self.world.door,
            near_door: self.near_door,
            dialogue: self.dialogue.view(),
            overlays: &self.overlays,
            image: self.image.as_deref(),
            speech: self.speech.as_deref(),
            controls_visible: self.controls_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::level::{DecorKind, LevelConfig};
    use crate::sim::LevelSession;

    #[test]
    fn test_snapshot_culls_to_viewport() {
        let mut s = LevelSession::new(LevelConfig::meadow(), 4).unwrap();
        s.camera.x = 5000.0;
        let snap = s.snapshot();
        assert!(!snap.terrain.is_empty());
        assert!(snap.terrain.len() < s.world.terrain.len());
        assert!(
            snap.terrain
                .iter()
                .all(|seg| seg.x + seg.width >= 4800.0 && seg.x <= 6480.0)
        );
        assert!(
            snap.decorations
                .iter()
                .filter(|d| d.kind == DecorKind::Flower)
                .all(|d| d.x >= 4800.0 - d.width && d.x <= 6480.0)
        );
    }

    #[test]
    fn test_snapshot_hides_collected_and_inactive() {
        let mut s = LevelSession::new(LevelConfig::city(), 4).unwrap();
        assert!(s.snapshot().enemy.is_none());
        if let Some(enemy) = s.enemy.as_mut() {
            enemy.active = true;
        }
        assert!(s.snapshot().enemy.is_some());

        let mut m = LevelSession::new(LevelConfig::meadow(), 4).unwrap();
        let before = m.snapshot().collectibles.len();
        m.camera.x = 0.0;
        for c in m.world.collectibles.iter_mut() {
            c.collected = true;
        }
        assert!(m.snapshot().collectibles.is_empty());
        assert!(before <= m.world.collectibles.len());
    }

    #[test]
    fn test_snapshot_serializes() {
        let s = LevelSession::new(LevelConfig::meadow(), 4).unwrap();
        let json = s.snapshot().to_json().unwrap();
        assert!(json.contains("\"level\":\"meadow\""));
        assert!(json.contains("\"image\":\"intro\""));
    }
}
