//! Frame sequencing: a scene walk rendered into an ordered frame list.
//!
//! The walk reuses the simulator's `step_once`, so the video of an answer and
//! the answer itself can never drift apart.

use tracing::error;

use crate::core::FrameRgba;
use crate::error::{SignalgenError, SignalgenResult};
use crate::model::Scene;
use crate::render::RenderScene;
use crate::sim::step_once;

/// Upper bound on simulated steps in one walk. Sampler profiles keep real
/// walks far below it; reaching the cap means the caller's final scene is not
/// on the initial scene's trajectory.
pub const WALK_SAFETY_CAP: u32 = 30;

#[derive(Clone, Copy, Debug)]
pub struct SequenceParams {
    /// Copies of the initial and final stills at each end of the sequence.
    pub hold_count: u32,
    /// Copies of each intermediate render.
    pub frames_per_step: u32,
}

impl Default for SequenceParams {
    fn default() -> Self {
        Self {
            hold_count: 5,
            frames_per_step: 2,
        }
    }
}

impl SequenceParams {
    pub fn validate(&self) -> SignalgenResult<()> {
        if self.hold_count == 0 {
            return Err(SignalgenError::validation("hold_count must be at least 1"));
        }
        if self.frames_per_step == 0 {
            return Err(SignalgenError::validation(
                "frames_per_step must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Render the walk from `initial` to `final_scene` as a frame sequence.
///
/// The first `hold_count` frames are bit-identical to the initial still and
/// the last `hold_count` to the final still. Intermediate states appear
/// `frames_per_step` times each; the final state is not double-shown by the
/// walk before its hold. A scene with no running countdown degenerates to the
/// two holds back to back.
pub fn sequence<R: RenderScene>(
    renderer: &R,
    initial: Scene,
    final_scene: Scene,
    params: SequenceParams,
) -> SignalgenResult<Vec<FrameRgba>> {
    params.validate()?;
    initial.validate()?;
    final_scene.validate()?;

    let first = renderer.render(initial)?;
    let last = renderer.render(final_scene)?;

    let hold = params.hold_count as usize;
    let per_step = params.frames_per_step as usize;

    let mut frames: Vec<FrameRgba> = Vec::with_capacity(2 * hold);
    for _ in 0..hold {
        frames.push(first.clone());
    }

    if !initial.is_steady() {
        let mut current = initial;
        let mut walked = 0u32;
        loop {
            if walked >= WALK_SAFETY_CAP {
                error!(
                    walked,
                    "scene walk hit the safety cap without reaching the final scene"
                );
                return Err(SignalgenError::animation(format!(
                    "scene walk did not reach the final scene within {WALK_SAFETY_CAP} steps"
                )));
            }
            current = step_once(current).0;
            walked += 1;

            let frame = renderer.render(current)?;
            for _ in 0..per_step {
                frames.push(frame.clone());
            }
            if current == final_scene {
                break;
            }
        }
        // The walk just rendered the final state itself; the hold below is
        // its one intended showing.
        frames.truncate(frames.len() - per_step);
    }

    for _ in 0..hold {
        frames.push(last.clone());
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Light, LightState};
    use crate::sim::advance;

    /// 2x1 stub frame encoding the scene in the first pixel.
    struct StubRenderer;

    impl RenderScene for StubRenderer {
        fn render(&self, scene: Scene) -> SignalgenResult<FrameRgba> {
            let states = match (scene.light_a.state, scene.light_b.state) {
                (LightState::Red, _) => 1u8,
                (LightState::Green, _) => 2u8,
            };
            Ok(FrameRgba {
                width: 2,
                height: 1,
                data: vec![
                    scene.light_a.countdown as u8,
                    scene.light_b.countdown as u8,
                    states,
                    255,
                    0,
                    0,
                    0,
                    255,
                ],
                premultiplied: true,
            })
        }
    }

    fn scene(a: (LightState, u32), b: (LightState, u32)) -> Scene {
        Scene::new(Light::new(a.0, a.1), Light::new(b.0, b.1))
    }

    fn params(hold: u32, per_step: u32) -> SequenceParams {
        SequenceParams {
            hold_count: hold,
            frames_per_step: per_step,
        }
    }

    #[test]
    fn holds_bracket_the_walk() {
        let initial = scene((LightState::Red, 5), (LightState::Green, 0));
        let final_scene = advance(initial, None).unwrap();
        let frames = sequence(&StubRenderer, initial, final_scene, params(5, 2)).unwrap();

        let first = StubRenderer.render(initial).unwrap();
        let last = StubRenderer.render(final_scene).unwrap();
        assert!(frames[..5].iter().all(|f| *f == first));
        assert!(frames[frames.len() - 5..].iter().all(|f| *f == last));
        // 5 walked steps, the last one folded into the final hold.
        assert_eq!(frames.len(), 2 * 5 + 2 * (5 - 1));
    }

    #[test]
    fn steady_scene_degenerates_to_two_holds() {
        let initial = scene((LightState::Green, 0), (LightState::Red, 0));
        let frames = sequence(&StubRenderer, initial, initial, params(5, 2)).unwrap();
        assert_eq!(frames.len(), 10);
        let still = StubRenderer.render(initial).unwrap();
        assert!(frames.iter().all(|f| *f == still));
    }

    #[test]
    fn final_state_not_shown_by_the_walk() {
        let initial = scene((LightState::Red, 2), (LightState::Green, 0));
        let final_scene = advance(initial, None).unwrap();
        let frames = sequence(&StubRenderer, initial, final_scene, params(5, 2)).unwrap();

        let last = StubRenderer.render(final_scene).unwrap();
        let middle = &frames[5..frames.len() - 5];
        assert!(middle.iter().all(|f| *f != last));
    }

    #[test]
    fn frame_count_is_deterministic() {
        let initial = scene((LightState::Red, 4), (LightState::Green, 0));
        let final_scene = advance(initial, None).unwrap();
        let frames = sequence(&StubRenderer, initial, final_scene, params(3, 2)).unwrap();
        assert_eq!(frames.len(), 2 * 3 + 2 * (4 - 1));
    }

    #[test]
    fn unreachable_final_scene_errors_at_the_cap() {
        let initial = scene((LightState::Red, 3), (LightState::Green, 0));
        let unreachable = scene((LightState::Red, 9), (LightState::Green, 9));
        let err = sequence(&StubRenderer, initial, unreachable, params(5, 2)).unwrap_err();
        assert!(matches!(err, SignalgenError::Animation(_)));
    }

    #[test]
    fn zero_params_are_rejected() {
        let initial = scene((LightState::Red, 1), (LightState::Green, 0));
        assert!(sequence(&StubRenderer, initial, initial, params(0, 2)).is_err());
        assert!(sequence(&StubRenderer, initial, initial, params(5, 0)).is_err());
    }
}
