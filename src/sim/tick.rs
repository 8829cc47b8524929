//! Per-frame session update
//!
//! Order within a frame: dialogue timer, cues, physics (when not paused,
//! ending or defeated), event triggers, then the ending/defeat transitions.
//! A restart requested by any of these rebuilds the session before returning.

use super::physics::{self, StepOutcome};
use super::script::advance_cues;
use super::state::LevelSession;
use super::timeline;
use crate::consts::MAX_FRAME_MS;
use crate::input::Controls;

/// Advance the session by one frame of `dt_ms` logical milliseconds
pub fn tick(session: &mut LevelSession, controls: &Controls, dt_ms: f32) {
    let dt = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_FRAME_MS)
    } else {
        0.0
    };
    session.frame += 1;
    session.elapsed_ms += f64::from(dt);

    session.dialogue.update(dt);
    advance_cues(session, dt);
    if session.restart_requested {
        session.restart();
        return;
    }

    if session.is_simulating() {
        match physics::step(session, controls) {
            StepOutcome::Moved => timeline::evaluate(session),
            StepOutcome::ReachedDoor => {
                timeline::evaluate(session);
                session.begin_ending();
            }
            StepOutcome::Defeated => session.begin_defeat(),
        }
    }

    if session.restart_requested {
        session.restart();
    }
}
