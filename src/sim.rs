//! Deterministic countdown simulation for the two-light intersection.
//!
//! The whole transition system is one unit-step primitive, [`step_once`].
//! [`advance`] computes "the answer" by looping it over a fixed horizon; the
//! animation sequencer replays the same primitive per rendered step, so the
//! clip and the final still can never disagree on the switch rule.

use crate::error::SignalgenResult;
use crate::model::{LightId, LightState, Scene};

/// Advance `scene` by one whole time unit.
///
/// Every counting light is decremented by 1. A light whose countdown crosses
/// from positive to exactly 0 in this unit has "just expired" and triggers
/// the switching rule: both lights swap color and the sibling's running
/// countdown is canceled to 0. A flip can only trigger on the positive-to-0
/// edge, never on a light already sitting at 0.
///
/// The red light's expiry is checked before the green light's, so when both
/// expire in the same unit the red expiry is the one honored. Returns the
/// next scene and which light's expiry fired, if any.
pub fn step_once(scene: Scene) -> (Scene, Option<LightId>) {
    let mut next = scene;
    if next.light_a.countdown > 0 {
        next.light_a.countdown -= 1;
    }
    if next.light_b.countdown > 0 {
        next.light_b.countdown -= 1;
    }

    let expired = |id: LightId| scene.light(id).countdown > 0 && next.light(id).countdown == 0;

    let red = if next.light_a.state == LightState::Red {
        LightId::A
    } else {
        LightId::B
    };
    let switch = if expired(red) {
        Some(red)
    } else if expired(red.sibling()) {
        Some(red.sibling())
    } else {
        None
    };

    if switch.is_some() {
        next.light_a.state = next.light_a.state.flipped();
        next.light_b.state = next.light_b.state.flipped();
        // The switch cancels whatever the sibling still had left.
        next.light_a.countdown = 0;
        next.light_b.countdown = 0;
    }

    (next, switch)
}

/// Time units until the first expiry among counting lights; 0 when neither
/// light is counting.
pub fn auto_horizon(scene: Scene) -> u32 {
    match (scene.light_a.is_counting(), scene.light_b.is_counting()) {
        (true, true) => scene.light_a.countdown.min(scene.light_b.countdown),
        (true, false) => scene.light_a.countdown,
        (false, true) => scene.light_b.countdown,
        (false, false) => 0,
    }
}

/// Advance `scene` by `elapsed` whole time units, or by [`auto_horizon`]
/// when `elapsed` is `None`.
///
/// Pure: same inputs always produce the same scene, and the input is never
/// mutated. Stops early once the scene is steady (both countdowns at 0).
/// A scene violating the intersection rule is rejected.
pub fn advance(scene: Scene, elapsed: Option<u32>) -> SignalgenResult<Scene> {
    scene.validate()?;

    let horizon = elapsed.unwrap_or_else(|| auto_horizon(scene));
    let mut current = scene;
    for _ in 0..horizon {
        if current.is_steady() {
            break;
        }
        current = step_once(current).0;
    }
    Ok(current)
}
