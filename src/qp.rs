//! Quadratic programming over the nonnegative orthant
//!
//! Solves
//! ```ignore
//! min_y 1/2 yᵗ Q y - cᵗ y   subject to   y >= 0
//! ```
//! for a positive definite `Q` with a primal active-set method. Variables are split into a
//! passive set, where the bound is inactive and the gradient vanishes, and an active set
//! pinned at zero. Each outer iteration frees the variable that violates the optimality
//! conditions most, each inner iteration solves the unconstrained problem restricted to the
//! passive set and steps back onto the feasible region if that solution leaves it. The
//! scheme is the one of Lawson and Hanson for nonnegative least squares with `AᵗA` replaced
//! by `Q` and `Aᵗb` by `c`; it terminates after finitely many steps.
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

use crate::error::{NicaError, Result};
use crate::linalg::inverse_spd;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Active-set solver for nonnegatively constrained quadratic programs
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct NonnegativeQp<F> {
    tolerance: F,
    max_iterations: usize,
}

impl<F: Float> Default for NonnegativeQp<F> {
    fn default() -> Self {
        NonnegativeQp {
            tolerance: num_traits::Float::sqrt(F::epsilon()),
            max_iterations: 500,
        }
    }
}

impl<F: Float> NonnegativeQp<F> {
    /// Set the tolerance on the optimality conditions, relative to the largest coefficient of
    /// the linear term
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximal number of restricted solves
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Minimise `1/2 yᵗ Q y - cᵗ y` subject to `y >= 0`
    ///
    /// Only the symmetric part of `quadratic` enters the objective.
    ///
    /// # Errors
    ///
    /// Returns [`NicaError::Shape`] if `quadratic` is not a square matrix matching `linear`,
    /// and [`NicaError::Solver`] if the coefficients are not finite, if the quadratic term is
    /// not positive definite on the passive set or if the iteration budget is exhausted.
    pub fn solve<Sq, Sc>(
        &self,
        quadratic: &ArrayBase<Sq, Ix2>,
        linear: &ArrayBase<Sc, Ix1>,
    ) -> Result<Array1<F>>
    where
        Sq: Data<Elem = F>,
        Sc: Data<Elem = F>,
    {
        let n = linear.len();
        if quadratic.dim() != (n, n) {
            return Err(NicaError::shape(
                "quadratic term",
                &[n, n],
                quadratic.shape(),
            ));
        }
        if !quadratic.iter().chain(linear.iter()).all(|v| v.is_finite()) {
            return Err(NicaError::Solver(
                "quadratic program has non-finite coefficients".to_string(),
            ));
        }

        let half = F::cast(0.5);
        let q = (quadratic + &quadratic.t()).mapv(|v| v * half);
        let scale = linear
            .iter()
            .fold(F::one(), |acc, &v| F::max(acc, num_traits::Float::abs(v)));
        let tol = self.tolerance * scale;

        let mut y = Array1::<F>::zeros(n);
        let mut passive = vec![false; n];
        let mut iterations = 0;

        loop {
            // negative gradient, positive entries may still decrease the objective
            let residual = linear - &q.dot(&y);
            let candidate = (0..n)
                .filter(|&j| !passive[j] && residual[j] > tol)
                .max_by(|&i, &j| {
                    residual[i]
                        .partial_cmp(&residual[j])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            let entering = match candidate {
                Some(j) => j,
                None => break,
            };
            passive[entering] = true;

            loop {
                iterations += 1;
                if iterations > self.max_iterations {
                    return Err(NicaError::Solver(format!(
                        "active-set method did not terminate within {} iterations",
                        self.max_iterations
                    )));
                }

                let z = solve_restricted(&q, linear, &passive)?;
                if passive[entering] && z[entering] <= F::zero() && y[entering] == F::zero() {
                    // freeing the entering variable cannot make progress in finite precision
                    return Ok(y.mapv(|v| F::max(v, F::zero())));
                }

                let ratios: Vec<(usize, F)> = (0..n)
                    .filter(|&i| passive[i] && z[i] <= F::zero())
                    .map(|i| (i, y[i] / (y[i] - z[i])))
                    .collect();
                if ratios.is_empty() {
                    y = z;
                    break;
                }

                let alpha = ratios
                    .iter()
                    .fold(F::one(), |acc, &(_, ratio)| F::min(acc, ratio));
                y = &y + &((&z - &y) * alpha);
                for &(i, ratio) in &ratios {
                    if ratio <= alpha {
                        passive[i] = false;
                        y[i] = F::zero();
                    }
                }
                for i in 0..n {
                    if passive[i] && y[i] <= F::zero() {
                        passive[i] = false;
                        y[i] = F::zero();
                    }
                }
            }
        }

        Ok(y.mapv(|v| F::max(v, F::zero())))
    }
}

/// Solves `Q_PP z_P = c_P` on the passive set `P`, with `z` zero elsewhere
fn solve_restricted<F: Float, Sc: Data<Elem = F>>(
    q: &Array2<F>,
    linear: &ArrayBase<Sc, Ix1>,
    passive: &[bool],
) -> Result<Array1<F>> {
    let indices: Vec<usize> = (0..passive.len()).filter(|&i| passive[i]).collect();
    let q_pp = q.select(Axis(0), &indices).select(Axis(1), &indices);
    let c_p = linear.select(Axis(0), &indices);

    let inverse = inverse_spd(&q_pp).map_err(|err| {
        NicaError::Solver(format!(
            "quadratic term is not positive definite on the free variables ({})",
            err
        ))
    })?;
    let z_p = inverse.dot(&c_p);

    let mut z = Array1::zeros(passive.len());
    for (&i, &v) in indices.iter().zip(z_p.iter()) {
        z[i] = v;
    }
    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use ndarray_rand::{rand_distr::Uniform, RandomExt};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn assert_kkt(q: &Array2<f64>, c: &Array1<f64>, y: &Array1<f64>) {
        let gradient = q.dot(y) - c;
        for i in 0..y.len() {
            assert!(y[i] >= 0.0);
            assert!(gradient[i] >= -1e-6, "gradient {} at {}", gradient[i], i);
            assert!((y[i] * gradient[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn interior_solution_is_unconstrained_minimiser() {
        let q = array![[2.0, 0.5], [0.5, 1.0]];
        let c = array![1.0, 1.0];
        let y = NonnegativeQp::default().solve(&q, &c).unwrap();
        let expected = inverse_spd(&q).unwrap().dot(&c);
        assert!(expected.iter().all(|&v| v > 0.0));
        assert_abs_diff_eq!(y, expected, epsilon = 1e-10);
    }

    #[test]
    fn identity_quadratic_rectifies() {
        let q = Array2::<f64>::eye(3);
        let c = array![1.5, -2.0, 0.25];
        let y = NonnegativeQp::default().solve(&q, &c).unwrap();
        assert_abs_diff_eq!(y, array![1.5, 0.0, 0.25], epsilon = 1e-12);
    }

    #[test]
    fn negative_linear_term_gives_zero() {
        let q = array![[1.0, 0.2], [0.2, 1.0]];
        let y = NonnegativeQp::default().solve(&q, &array![-1.0, -0.1]).unwrap();
        assert_abs_diff_eq!(y, array![0.0, 0.0]);
    }

    #[test]
    fn coupled_bound_becomes_active() {
        // unconstrained minimiser is (2, -1), the optimum pins the second coordinate
        let q = array![[1.0, 1.0], [1.0, 2.0]];
        let c = array![1.0, 0.0];
        let y = NonnegativeQp::default().solve(&q, &c).unwrap();
        assert_abs_diff_eq!(y, array![1.0, 0.0], epsilon = 1e-12);
        assert_kkt(&q, &c, &y);
    }

    #[test]
    fn random_problems_satisfy_optimality_conditions() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let solver = NonnegativeQp::default();
        for n in 1..8 {
            let a = Array2::random_using((n, n), Uniform::new(-1.0, 1.0), &mut rng);
            let q = a.t().dot(&a) + Array2::<f64>::eye(n) * 0.1;
            let c = Array1::random_using(n, Uniform::new(-1.0, 1.0), &mut rng);
            let y = solver.solve(&q, &c).unwrap();
            assert_kkt(&q, &c, &y);
        }
    }

    #[test]
    fn only_symmetric_part_matters() {
        let q = array![[2.0, 1.0], [0.0, 2.0]];
        let sym = array![[2.0, 0.5], [0.5, 2.0]];
        let c = array![1.0, -0.5];
        let solver = NonnegativeQp::default();
        assert_abs_diff_eq!(
            solver.solve(&q, &c).unwrap(),
            solver.solve(&sym, &c).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn indefinite_quadratic_is_a_solver_error() {
        let q = array![[-1.0, 0.0], [0.0, 1.0]];
        let err = NonnegativeQp::default()
            .solve(&q, &array![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, NicaError::Solver(_)));
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        let q = Array2::<f64>::eye(2);
        let err = NonnegativeQp::default()
            .solve(&q, &array![f64::NAN, 1.0])
            .unwrap_err();
        assert!(matches!(err, NicaError::Solver(_)));
    }

    #[test]
    fn mismatched_dimensions_are_a_shape_error() {
        let err = NonnegativeQp::default()
            .solve(&Array2::<f64>::eye(3), &array![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, NicaError::Shape { .. }));
    }
}
