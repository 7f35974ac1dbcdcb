use std::path::PathBuf;

use crate::{
    core::FrameRgba,
    error::{SignalgenError, SignalgenResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    Red,
    Green,
}

impl LightState {
    pub fn flipped(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }
}

/// Names one of the two lights at the intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LightId {
    A,
    B,
}

impl LightId {
    pub fn sibling(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Light {
    pub state: LightState,
    /// Whole time units left. 0 means "not counting" or "just expired";
    /// only the previous value distinguishes the two.
    pub countdown: u32,
}

impl Light {
    pub fn new(state: LightState, countdown: u32) -> Self {
        Self { state, countdown }
    }

    pub fn is_counting(self) -> bool {
        self.countdown > 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub light_a: Light,
    pub light_b: Light,
}

impl Scene {
    pub fn new(light_a: Light, light_b: Light) -> Self {
        Self { light_a, light_b }
    }

    /// Intersection rule: exactly one light red, the other green.
    pub fn validate(&self) -> SignalgenResult<()> {
        if self.light_a.state == self.light_b.state {
            return Err(SignalgenError::validation(
                "scene must have exactly one red and one green light",
            ));
        }
        Ok(())
    }

    pub fn light(&self, id: LightId) -> Light {
        match id {
            LightId::A => self.light_a,
            LightId::B => self.light_b,
        }
    }

    /// Neither countdown is running; no further transition can occur.
    pub fn is_steady(&self) -> bool {
        !self.light_a.is_counting() && !self.light_b.is_counting()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TaskType {
    /// Single short countdown on the red light.
    Basic,
    /// Single countdown from the longer band.
    Extended,
    /// Both lights counting, green strictly below red.
    DualCountdown,
    /// Both counting plus an explicit elapsed time beyond both.
    ExplicitHorizon,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Basic,
        TaskType::Extended,
        TaskType::DualCountdown,
        TaskType::ExplicitHorizon,
    ];

    /// 1-based index used on the CLI and in dataset metadata.
    pub fn index(self) -> u8 {
        match self {
            Self::Basic => 1,
            Self::Extended => 2,
            Self::DualCountdown => 3,
            Self::ExplicitHorizon => 4,
        }
    }

    pub fn from_index(index: u8) -> SignalgenResult<Self> {
        match index {
            1 => Ok(Self::Basic),
            2 => Ok(Self::Extended),
            3 => Ok(Self::DualCountdown),
            4 => Ok(Self::ExplicitHorizon),
            other => Err(SignalgenError::validation(format!(
                "unknown task type {other} (expected 1-4)"
            ))),
        }
    }
}

/// One assembled evaluation sample, immutable after construction.
#[derive(Clone, Debug)]
pub struct TaskSample {
    pub id: String,
    pub domain: String,
    pub task_type: TaskType,
    pub prompt: String,
    pub first_frame: FrameRgba,
    pub final_frame: FrameRgba,
    /// Ground-truth clip on disk, when encoding was available.
    pub video: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_validate_rejects_matching_states() {
        let bad = Scene::new(
            Light::new(LightState::Red, 5),
            Light::new(LightState::Red, 0),
        );
        assert!(bad.validate().is_err());

        let ok = Scene::new(
            Light::new(LightState::Red, 5),
            Light::new(LightState::Green, 0),
        );
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn steady_means_no_countdowns() {
        let steady = Scene::new(
            Light::new(LightState::Green, 0),
            Light::new(LightState::Red, 0),
        );
        assert!(steady.is_steady());

        let counting = Scene::new(
            Light::new(LightState::Red, 2),
            Light::new(LightState::Green, 0),
        );
        assert!(!counting.is_steady());
    }

    #[test]
    fn task_type_index_round_trips() {
        for ty in TaskType::ALL {
            assert_eq!(TaskType::from_index(ty.index()).unwrap(), ty);
        }
        assert!(TaskType::from_index(0).is_err());
        assert!(TaskType::from_index(5).is_err());
    }

    #[test]
    fn light_state_serializes_lowercase() {
        let json = serde_json::to_string(&LightState::Red).unwrap();
        assert_eq!(json, "\"red\"");
    }
}
