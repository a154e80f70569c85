//! Degeneracy guard for lateral weight matrices
use linfa::Float;
use ndarray::{ArrayBase, DataMut, Ix2};
use tracing::debug;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::linalg::determinant;

/// Determinant below which a lateral matrix is considered degenerate
pub const DEGENERACY_THRESHOLD: f64 = 1e-4;
/// Multiple of the identity added to a degenerate lateral matrix
pub const RIDGE: f64 = 0.1;

/// Keeps a lateral matrix invertible so that the next equilibrium solve stays well-posed
///
/// When the determinant of the matrix drops below the threshold, a multiple of the identity
/// is added once. This trades a small bias in the lateral weights for a well-conditioned
/// quadratic program; it is not an error condition.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightStabilizer<F> {
    threshold: F,
    ridge: F,
}

impl<F: Float> Default for WeightStabilizer<F> {
    fn default() -> Self {
        WeightStabilizer::new(F::cast(DEGENERACY_THRESHOLD), F::cast(RIDGE))
    }
}

impl<F: Float> WeightStabilizer<F> {
    pub fn new(threshold: F, ridge: F) -> Self {
        WeightStabilizer { threshold, ridge }
    }

    pub fn threshold(&self) -> F {
        self.threshold
    }

    pub fn ridge(&self) -> F {
        self.ridge
    }

    /// Adds `ridge * I` to `lateral` if its determinant is below the threshold
    ///
    /// Returns whether the matrix was regularised.
    pub fn stabilize<S: DataMut<Elem = F>>(&self, lateral: &mut ArrayBase<S, Ix2>) -> bool {
        let det = determinant(lateral);
        if det < self.threshold {
            debug!(
                determinant = ?det,
                ridge = ?self.ridge,
                "lateral matrix close to degenerate, adding ridge"
            );
            let ridge = self.ridge;
            lateral.diag_mut().mapv_inplace(|v| v + ridge);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::determinant;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn well_conditioned_matrix_is_untouched() {
        let mut m = array![[1.0, 0.2], [0.2, 0.5]];
        let before = m.clone();
        assert!(!WeightStabilizer::default().stabilize(&mut m));
        assert_eq!(m, before);
    }

    #[test]
    fn near_singular_matrix_gets_ridge_once() {
        let mut m = array![[1.0, 1.0], [1.0, 1.00001]];
        let before = m.clone();
        let det_before = determinant(&before);
        assert!(det_before < DEGENERACY_THRESHOLD);

        assert!(WeightStabilizer::default().stabilize(&mut m));
        assert_abs_diff_eq!(m, before + Array2::<f64>::eye(2) * 0.1, epsilon = 1e-15);
        assert!(determinant(&m) > det_before);
    }

    #[test]
    fn negative_determinant_is_degenerate() {
        let mut m = array![[0.0, 1.0], [1.0, 0.0]];
        assert!(WeightStabilizer::default().stabilize(&mut m));
        assert_abs_diff_eq!(m, array![[0.1, 1.0], [1.0, 0.1]]);
    }

    #[test]
    fn custom_threshold_and_ridge() {
        let stabilizer = WeightStabilizer::new(0.5f32, 1.0);
        let mut m = Array2::<f32>::eye(3) * 0.5;
        assert!(stabilizer.stabilize(&mut m));
        assert_abs_diff_eq!(m, Array2::eye(3) * 1.5);
    }
}
