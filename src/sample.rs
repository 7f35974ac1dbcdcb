//! Scenario sampling: the task-type profile table and the weighted type mix.
//!
//! Every draw goes through an explicitly passed [`SmallRng`], so a seed fully
//! determines the sequence of sampled scenes. Draw order per sample is fixed:
//! red countdown, then green countdown (when the profile has one), then the
//! explicit elapsed (when the profile has one).

use rand::Rng;
use rand::rngs::SmallRng;

use crate::error::{SignalgenError, SignalgenResult};
use crate::model::{Light, LightState, Scene, TaskType};

/// Inclusive integer range for countdown draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CountdownRange {
    pub lo: u32,
    pub hi: u32,
}

impl CountdownRange {
    pub fn new(lo: u32, hi: u32) -> SignalgenResult<Self> {
        if lo == 0 {
            return Err(SignalgenError::validation(
                "countdown range must start at 1 or above",
            ));
        }
        if hi < lo {
            return Err(SignalgenError::validation(format!(
                "countdown range {lo}..={hi} is empty"
            )));
        }
        Ok(Self { lo, hi })
    }

    fn draw(self, rng: &mut SmallRng) -> u32 {
        rng.random_range(self.lo..=self.hi)
    }
}

/// Sampling profile for one task type.
#[derive(Clone, Copy, Debug)]
pub struct TypeProfile {
    /// Range for the red light's countdown.
    pub red: CountdownRange,
    /// Range for the green light's countdown; `None` leaves it at 0.
    pub green: Option<CountdownRange>,
    /// Cap the green draw strictly below the red draw.
    pub green_below_red: bool,
    /// Offsets added to max(red, green) for the explicit elapsed draw.
    pub elapsed_offset: Option<(u32, u32)>,
}

/// Normalized categorical distribution over task types.
#[derive(Clone, Debug)]
pub struct TypeMix {
    // Sorted by task type index, weights normalized to sum 1.
    weights: Vec<(TaskType, f64)>,
}

impl TypeMix {
    pub fn new(weights: &[(TaskType, f64)]) -> SignalgenResult<Self> {
        if weights.is_empty() {
            return Err(SignalgenError::validation(
                "task type distribution must not be empty",
            ));
        }
        let mut sorted = weights.to_vec();
        sorted.sort_by_key(|(ty, _)| ty.index());
        for pair in sorted.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(SignalgenError::validation(format!(
                    "duplicate task type {} in distribution",
                    pair[0].0.index()
                )));
            }
        }
        for (ty, w) in &sorted {
            if !w.is_finite() || *w <= 0.0 {
                return Err(SignalgenError::validation(format!(
                    "task type {} has non-positive weight {w}",
                    ty.index()
                )));
            }
        }
        let total: f64 = sorted.iter().map(|(_, w)| w).sum();
        for (_, w) in &mut sorted {
            *w /= total;
        }
        Ok(Self { weights: sorted })
    }

    /// Uniform weights over the requested subset.
    pub fn uniform(types: &[TaskType]) -> SignalgenResult<Self> {
        let weights: Vec<_> = types.iter().map(|ty| (*ty, 1.0)).collect();
        Self::new(&weights)
    }

    pub fn weights(&self) -> &[(TaskType, f64)] {
        &self.weights
    }

    /// Select one type by cumulative weight scan.
    pub fn select(&self, rng: &mut SmallRng) -> TaskType {
        let r: f64 = rng.random();
        let mut cumulative = 0.0;
        for (ty, w) in &self.weights {
            cumulative += w;
            if r <= cumulative {
                return *ty;
            }
        }
        // Float rounding can leave the last cumulative a hair below 1.
        self.weights[self.weights.len() - 1].0
    }
}

impl Default for TypeMix {
    fn default() -> Self {
        Self {
            weights: vec![
                (TaskType::Basic, 0.35),
                (TaskType::Extended, 0.30),
                (TaskType::DualCountdown, 0.20),
                (TaskType::ExplicitHorizon, 0.15),
            ],
        }
    }
}

/// One sampled task: the initial scene plus the optional explicit horizon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sampled {
    pub task_type: TaskType,
    pub scene: Scene,
    pub elapsed: Option<u32>,
}

pub struct Sampler {
    mix: TypeMix,
    profiles: [TypeProfile; 4],
}

impl Sampler {
    /// Build a sampler; the type-1/type-2 ranges are configurable, the
    /// dual-countdown and explicit-horizon profiles are fixed.
    pub fn new(
        mix: TypeMix,
        basic_range: CountdownRange,
        extended_range: CountdownRange,
    ) -> SignalgenResult<Self> {
        let profiles = [
            TypeProfile {
                red: basic_range,
                green: None,
                green_below_red: false,
                elapsed_offset: None,
            },
            TypeProfile {
                red: extended_range,
                green: None,
                green_below_red: false,
                elapsed_offset: None,
            },
            TypeProfile {
                red: CountdownRange::new(8, 15)?,
                green: Some(CountdownRange::new(3, 7)?),
                green_below_red: true,
                elapsed_offset: None,
            },
            TypeProfile {
                red: CountdownRange::new(5, 10)?,
                green: Some(CountdownRange::new(3, 7)?),
                green_below_red: false,
                elapsed_offset: Some((2, 8)),
            },
        ];

        for profile in &profiles {
            if profile.green_below_red {
                let green = profile
                    .green
                    .ok_or_else(|| SignalgenError::validation("capped profile needs a range"))?;
                if profile.red.lo <= green.lo {
                    return Err(SignalgenError::validation(
                        "green countdown range cannot fit strictly below the red range",
                    ));
                }
            }
        }

        Ok(Self { mix, profiles })
    }

    pub fn mix(&self) -> &TypeMix {
        &self.mix
    }

    /// Select a type from the mix and sample a scene for it.
    pub fn sample(&self, rng: &mut SmallRng) -> Sampled {
        let task_type = self.mix.select(rng);
        self.sample_type(task_type, rng)
    }

    /// Sample an initial scene (and explicit elapsed, when the profile has
    /// one) for the given type. Red always starts on light A.
    pub fn sample_type(&self, task_type: TaskType, rng: &mut SmallRng) -> Sampled {
        let profile = &self.profiles[(task_type.index() - 1) as usize];

        let red = profile.red.draw(rng);
        let green = match profile.green {
            Some(range) => {
                let hi = if profile.green_below_red {
                    range.hi.min(red - 1)
                } else {
                    range.hi
                };
                rng.random_range(range.lo..=hi)
            }
            None => 0,
        };

        let scene = Scene::new(
            Light::new(LightState::Red, red),
            Light::new(LightState::Green, green),
        );

        let elapsed = profile.elapsed_offset.map(|(lo, hi)| {
            let base = red.max(green);
            rng.random_range(base + lo..=base + hi)
        });

        Sampled {
            task_type,
            scene,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn sampler() -> Sampler {
        Sampler::new(
            TypeMix::default(),
            CountdownRange::new(2, 10).unwrap(),
            CountdownRange::new(8, 20).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn range_rejects_empty_and_zero() {
        assert!(CountdownRange::new(5, 4).is_err());
        assert!(CountdownRange::new(0, 4).is_err());
        assert!(CountdownRange::new(4, 4).is_ok());
    }

    #[test]
    fn mix_normalizes_weights() {
        let mix = TypeMix::new(&[(TaskType::Basic, 2.0), (TaskType::Extended, 2.0)]).unwrap();
        for (_, w) in mix.weights() {
            assert!((w - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn mix_rejects_bad_weights() {
        assert!(TypeMix::new(&[]).is_err());
        assert!(TypeMix::new(&[(TaskType::Basic, 0.0)]).is_err());
        assert!(TypeMix::new(&[(TaskType::Basic, -1.0)]).is_err());
        assert!(TypeMix::new(&[(TaskType::Basic, 1.0), (TaskType::Basic, 1.0)]).is_err());
    }

    #[test]
    fn mix_subset_stays_in_subset() {
        let mix = TypeMix::uniform(&[TaskType::DualCountdown, TaskType::ExplicitHorizon]).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let ty = mix.select(&mut rng);
            assert!(matches!(
                ty,
                TaskType::DualCountdown | TaskType::ExplicitHorizon
            ));
        }
    }

    #[test]
    fn dual_countdown_keeps_green_below_red() {
        let sampler = sampler();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let sampled = sampler.sample_type(TaskType::DualCountdown, &mut rng);
            let a = sampled.scene.light_a;
            let b = sampled.scene.light_b;
            assert!((8..=15).contains(&a.countdown));
            assert!((3..=7).contains(&b.countdown));
            assert!(b.countdown < a.countdown);
            assert!(sampled.elapsed.is_none());
        }
    }

    #[test]
    fn explicit_horizon_exceeds_both_countdowns() {
        let sampler = sampler();
        let mut rng = SmallRng::seed_from_u64(13);
        for _ in 0..200 {
            let sampled = sampler.sample_type(TaskType::ExplicitHorizon, &mut rng);
            let a = sampled.scene.light_a.countdown;
            let b = sampled.scene.light_b.countdown;
            let elapsed = sampled.elapsed.unwrap();
            assert!(elapsed >= a.max(b) + 2);
            assert!(elapsed <= a.max(b) + 8);
        }
    }

    #[test]
    fn single_countdown_types_leave_green_idle() {
        let sampler = sampler();
        let mut rng = SmallRng::seed_from_u64(17);
        for ty in [TaskType::Basic, TaskType::Extended] {
            let sampled = sampler.sample_type(ty, &mut rng);
            assert_eq!(sampled.scene.light_b.countdown, 0);
            assert_eq!(sampled.scene.light_a.state, LightState::Red);
            assert!(sampled.scene.validate().is_ok());
        }
    }

    #[test]
    fn same_seed_reproduces_sequence() {
        let sampler = sampler();
        let mut a = SmallRng::seed_from_u64(42);
        let mut b = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(sampler.sample(&mut a), sampler.sample(&mut b));
        }
    }
}
