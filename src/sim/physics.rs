//! Per-frame kinematics and collision resolution
//!
//! Velocities are in px/frame: there is no dt here. Order matters and is
//! fixed: horizontal move, jump, gravity, ground, platforms (last match
//! wins), pickups, pursuer, camera, door.

use super::collision::{circles_overlap, ground_top, lands_on_platform};
use super::command::Command;
use super::state::{LevelSession, PickupRule};
use crate::Rect;
use crate::approach;
use crate::input::Controls;

/// What the frame ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Ordinary frame
    Moved,
    /// Interact pressed next to the door
    ReachedDoor,
    /// The pursuer touched the player; the rest of the frame was skipped
    Defeated,
}

/// Advance player, pursuer and camera by one frame
pub fn step(session: &mut LevelSession, controls: &Controls) -> StepOutcome {
    let tuning = session.config.player;
    let player = &mut session.player;

    // Right wins when both directions are held
    if controls.move_right {
        player.vel.x = tuning.speed;
        player.angle += tuning.turn_rate;
    } else if controls.move_left {
        player.vel.x = -tuning.speed;
        player.angle -= tuning.turn_rate;
    } else {
        player.vel.x = 0.0;
    }
    player.pos.x += player.vel.x;

    if controls.jump && player.on_ground {
        player.vel.y = tuning.jump_impulse;
        player.on_ground = false;
        session.commands.push(Command::PlaySound {
            name: session.config.sounds.jump.clone(),
        });
        log::debug!("Jump at x={:.0}", player.pos.x);
    }

    player.vel.y += tuning.gravity;
    player.pos.y += player.vel.y;
    player.on_ground = false;

    // Without any terrain the player keeps falling
    if let Some(top) = ground_top(&session.world.terrain, player.pos.x) {
        if player.bottom() > top {
            player.pos.y = top - player.radius;
            player.vel.y = 0.0;
            player.on_ground = true;
        }
    }

    // Every platform is checked; the last match overwrites earlier ones
    for platform in &session.world.platforms {
        if lands_on_platform(player.pos, player.radius, player.vel.y, platform) {
            player.pos.y = platform.top - player.radius;
            player.vel.y = 0.0;
            player.on_ground = true;
        }
    }

    for collectible in session.world.collectibles.iter_mut() {
        if collectible.collected {
            continue;
        }
        let picked = match collectible.kind.pickup_rule() {
            PickupRule::Touch { reach } => {
                player.pos.distance(collectible.pos) < player.radius + reach
            }
            PickupRule::Interact { reach } => {
                controls.interact && (player.pos.x - collectible.pos.x).abs() < reach
            }
        };
        if picked {
            collectible.collected = true;
            log::debug!("Picked up {:?} #{}", collectible.kind, collectible.id);
            if let Some(sound) = session.config.sounds.pickups.get(&collectible.kind) {
                session.commands.push(Command::PlaySound {
                    name: sound.clone(),
                });
            }
        }
    }

    if let Some(enemy) = session.enemy.as_mut().filter(|e| e.active) {
        enemy.pos.x = approach(enemy.pos.x, player.pos.x, enemy.speed);
        enemy.angle += enemy.spin;
        if let Some(top) = ground_top(&session.world.terrain, enemy.pos.x) {
            enemy.pos.y = top - enemy.radius;
        }
        if !session.ending
            && circles_overlap(player.pos, player.radius, enemy.pos, enemy.radius)
        {
            return StepOutcome::Defeated;
        }
    }

    session.camera.follow(
        player.pos.x,
        session.config.camera_lead,
        session.config.length,
        session.config.viewport.width,
    );

    let player_box = Rect::around_circle(player.pos, player.radius);
    session.near_door = player_box.overlaps(&session.world.door.hit_box());
    if session.near_door && controls.interact && !session.ending {
        return StepOutcome::ReachedDoor;
    }

    StepOutcome::Moved
}
