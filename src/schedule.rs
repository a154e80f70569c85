//! Learning rate schedules
use linfa::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Offset of the harmonic rate `1 / (WHITENING_OFFSET + t)` used by the whitening stage
pub const WHITENING_OFFSET: usize = 100;

/// Decaying learning rate `eta0 / (1 + decay * t)`
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LearningRate<F> {
    eta0: F,
    decay: F,
}

impl<F: Float> LearningRate<F> {
    pub fn new(eta0: F, decay: F) -> Self {
        LearningRate { eta0, decay }
    }

    pub fn eta0(&self) -> F {
        self.eta0
    }

    pub fn decay(&self) -> F {
        self.decay
    }

    /// Step size at time `t`
    pub fn step(&self, t: usize) -> F {
        self.eta0 / (F::one() + self.decay * F::cast(t))
    }
}

/// Step size `1 / (100 + t)` of the whitening stage synapses
pub fn whitening_rate<F: Float>(t: usize) -> F {
    F::one() / F::cast(WHITENING_OFFSET + t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn step_starts_at_eta0_and_decays() {
        let rate = LearningRate::new(0.1, 0.001);
        assert_abs_diff_eq!(rate.step(0), 0.1);
        assert_abs_diff_eq!(rate.step(1000), 0.05);
        assert!(rate.step(10) > rate.step(11));
    }

    #[test]
    fn zero_decay_keeps_rate_constant() {
        let rate = LearningRate::new(0.3f32, 0.0);
        assert_abs_diff_eq!(rate.step(0), rate.step(1_000_000));
    }

    #[test]
    fn whitening_rate_is_offset_harmonic() {
        assert_abs_diff_eq!(whitening_rate::<f64>(0), 0.01);
        assert_abs_diff_eq!(whitening_rate::<f64>(100), 0.005);
    }
}
