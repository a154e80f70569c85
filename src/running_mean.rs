//! Incremental mean estimators used to center the Hebbian terms
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1, Zip};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Window of the fixed-window running means
pub const FIXED_WINDOW: usize = 100;

/// Weighting applied to a new sample
///
/// The two policies lead to different learning dynamics and are not interchangeable.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeanPolicy {
    /// `mean += (sample - mean) / (t + 1)`, the exact mean over all samples seen so far
    FullHistory,
    /// `mean += (sample - mean) / window`, an exponential average with a constant weight
    FixedWindow(usize),
}

/// Running mean of a stream of vectors
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct RunningMean<F> {
    mean: Array1<F>,
    policy: MeanPolicy,
    count: usize,
}

impl<F: Float> RunningMean<F> {
    /// Create a zero-initialised mean of dimension `dim`
    pub fn new(dim: usize, policy: MeanPolicy) -> Self {
        RunningMean {
            mean: Array1::zeros(dim),
            policy,
            count: 0,
        }
    }

    pub fn full_history(dim: usize) -> Self {
        Self::new(dim, MeanPolicy::FullHistory)
    }

    pub fn fixed_window(dim: usize) -> Self {
        Self::new(dim, MeanPolicy::FixedWindow(FIXED_WINDOW))
    }

    /// Fold `sample` into the estimate
    ///
    /// `sample` must have the dimension of the mean.
    pub fn update<D: Data<Elem = F>>(&mut self, sample: &ArrayBase<D, Ix1>) {
        let weight = self.weight();
        Zip::from(&mut self.mean)
            .and(sample)
            .for_each(|m, &s| *m += (s - *m) * weight);
        self.count += 1;
    }

    /// `sample - mean`
    pub fn centered<D: Data<Elem = F>>(&self, sample: &ArrayBase<D, Ix1>) -> Array1<F> {
        Zip::from(sample)
            .and(&self.mean)
            .map_collect(|&s, &m| s - m)
    }

    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    pub fn policy(&self) -> MeanPolicy {
        self.policy
    }

    /// Number of samples folded in so far
    pub fn count(&self) -> usize {
        self.count
    }

    fn weight(&self) -> F {
        match self.policy {
            MeanPolicy::FullHistory => F::one() / F::cast(self.count + 1),
            MeanPolicy::FixedWindow(window) => F::one() / F::cast(window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn full_history_of_constant_stream_is_the_constant() {
        let x0 = array![0.5, -2.0, 3.25];
        let mut mean = RunningMean::full_history(3);
        for n in 1..=20 {
            mean.update(&x0);
            assert_eq!(mean.count(), n);
            assert_abs_diff_eq!(mean.mean(), &x0, epsilon = 1e-12);
        }
    }

    #[test]
    fn full_history_is_arithmetic_mean() {
        let mut mean = RunningMean::full_history(2);
        mean.update(&array![1.0, 0.0]);
        mean.update(&array![3.0, 2.0]);
        mean.update(&array![5.0, 4.0]);
        assert_abs_diff_eq!(mean.mean(), &array![3.0, 2.0], epsilon = 1e-12);
    }

    #[test]
    fn fixed_window_moves_by_one_hundredth() {
        let mut mean = RunningMean::fixed_window(2);
        assert_eq!(mean.policy(), MeanPolicy::FixedWindow(100));
        mean.update(&array![1.0, -1.0]);
        assert_abs_diff_eq!(mean.mean(), &array![0.01, -0.01], epsilon = 1e-12);
        mean.update(&array![1.0, -1.0]);
        assert_abs_diff_eq!(mean.mean(), &array![0.0199, -0.0199], epsilon = 1e-12);
    }

    #[test]
    fn centered_subtracts_current_estimate() {
        let mut mean = RunningMean::full_history(2);
        mean.update(&array![2.0, 4.0]);
        assert_abs_diff_eq!(mean.centered(&array![3.0, 3.0]), array![1.0, -1.0]);
    }
}
