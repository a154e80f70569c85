use linfa::dataset::DatasetBase;
use linfa::traits::FitWith;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rand::Rng;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{BioNicaParams, BioNicaValidParams};
use crate::equilibrium::EquilibriumStage;
use crate::error::{NicaError, Result};
use crate::linalg::{outer, random_unit_rows};
use crate::running_mean::RunningMean;
use crate::schedule::LearningRate;
use crate::separator::{check_input, negate_row, OnlineSeparator};
use crate::stabilizer::WeightStabilizer;

/// Bio-NICA, a single-layer network for nonnegative independent component analysis
///
/// The network projects a mixture `x` with its forward weights `W` and lets the output units
/// settle into the nonnegative minimiser of `1/2 yᵗ M y - (W x)ᵗ y`, where `M` are the
/// lateral weights. The forward weights then follow a Hebbian rule centered by running means
/// of the input and of the projection, the lateral weights track the output covariance.
///
/// Reference: D. Lipshutz and D. B. Chklovskii, "Bio-NICA: A biologically inspired
/// single-layer network for Nonnegative Independent Component Analysis" (2020)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct BioNica<F> {
    rate: LearningRate<F>,
    tau: F,
    forward: Array2<F>,
    lateral: Array2<F>,
    input_mean: RunningMean<F>,
    projection_mean: RunningMean<F>,
    equilibrium: EquilibriumStage<F>,
    stabilizer: WeightStabilizer<F>,
    t: usize,
}

impl<F: Float> BioNica<F> {
    /// Create default hyperparameters for `n_sources` sources and `n_mixtures` mixtures
    pub fn params(
        n_sources: usize,
        n_mixtures: usize,
    ) -> BioNicaParams<F, rand_xoshiro::Xoshiro256Plus> {
        BioNicaParams::new(n_sources, n_mixtures)
    }

    /// Forward weights `W`, of shape `(n_sources, n_mixtures)`
    pub fn forward(&self) -> &Array2<F> {
        &self.forward
    }

    /// Lateral weights `M`, of shape `(n_sources, n_sources)`
    pub fn lateral(&self) -> &Array2<F> {
        &self.lateral
    }

    /// Running mean of the input, over the full history
    pub fn input_mean(&self) -> &Array1<F> {
        self.input_mean.mean()
    }

    /// Running mean of the projection `W x`, over a fixed window
    pub fn projection_mean(&self) -> &Array1<F> {
        self.projection_mean.mean()
    }

    pub fn learning_rate(&self) -> &LearningRate<F> {
        &self.rate
    }

    pub fn tau(&self) -> F {
        self.tau
    }

    /// Replace the equilibrium stage, e.g. to tune the tolerance of the quadratic program
    pub fn with_equilibrium(mut self, equilibrium: EquilibriumStage<F>) -> Self {
        self.equilibrium = equilibrium;
        self
    }
}

impl<F: Float, R: Rng + Clone> BioNicaValidParams<F, R> {
    /// Build a learner from the verified parameters
    ///
    /// Initial matrices are copied; without them `M` starts as the identity and the rows of
    /// `W` are drawn from a standard normal and normalised to unit length.
    pub fn init(&self) -> BioNica<F> {
        let (s, x) = (self.n_sources(), self.n_mixtures());
        let forward = match self.forward() {
            Some(w) => w.to_owned(),
            None => random_unit_rows(s, x, &mut self.rng().clone()),
        };
        let lateral = match self.lateral() {
            Some(m) => m.to_owned(),
            None => Array2::eye(s),
        };
        debug!(
            n_sources = s,
            n_mixtures = x,
            preset = %self.preset(),
            eta0 = ?self.eta0(),
            decay = ?self.decay(),
            tau = ?self.tau(),
            "initialised Bio-NICA learner"
        );

        BioNica {
            rate: self.learning_rate(),
            tau: self.tau(),
            forward,
            lateral,
            input_mean: RunningMean::full_history(x),
            projection_mean: RunningMean::fixed_window(s),
            equilibrium: EquilibriumStage::constrained(),
            stabilizer: WeightStabilizer::default(),
            t: 0,
        }
    }
}

impl<F: Float> OnlineSeparator<F> for BioNica<F> {
    fn n_sources(&self) -> usize {
        self.forward.nrows()
    }

    fn n_mixtures(&self) -> usize {
        self.forward.ncols()
    }

    fn n_steps(&self) -> usize {
        self.t
    }

    fn fit_next<D: Data<Elem = F>>(&mut self, x: &ArrayBase<D, Ix1>) -> Result<Array1<F>> {
        check_input(x, self.n_mixtures())?;

        let c = self.forward.dot(x);
        let y = self
            .equilibrium
            .settle(c.view(), Some(self.lateral.view()))?;

        self.input_mean.update(x);
        self.projection_mean.update(&c);

        let step = self.rate.step(self.t);
        trace!(t = self.t, step = ?step, "Bio-NICA update");

        let x_centered = self.input_mean.centered(x);
        let c_centered = self.projection_mean.centered(&c);
        let hebbian = outer(&y, x) - outer(&c_centered, &x_centered);
        self.forward.scaled_add(F::cast(2.) * step, &hebbian);

        let lateral_delta = outer(&y, &y) - &self.lateral;
        self.lateral.scaled_add(step / self.tau, &lateral_delta);
        self.stabilizer.stabilize(&mut self.lateral);

        self.t += 1;
        Ok(y)
    }

    /// Negates row `j` of the forward weights
    fn flip_weights(&mut self, j: usize) -> Result<()> {
        negate_row(&mut self.forward, j)
    }
}

impl<'a, F, R, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NicaError> for BioNicaValidParams<F, R>
where
    F: Float,
    R: Rng + Clone,
    D: Data<Elem = F>,
{
    type ObjectIn = Option<BioNica<F>>;
    type ObjectOut = BioNica<F>;

    /// Stream the records of `dataset` through a Bio-NICA learner
    ///
    /// Continues training `model_in` if given, otherwise starts from a freshly initialised
    /// learner.
    fn fit_with(
        &self,
        model_in: Self::ObjectIn,
        dataset: &'a DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self::ObjectOut> {
        let mut model = model_in.unwrap_or_else(|| self.init());
        model.fit_records(dataset.records())?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::array;

    fn identity_model() -> BioNica<f64> {
        BioNica::params(2, 2)
            .forward(Array2::eye(2))
            .lateral(Array2::eye(2))
            .check()
            .unwrap()
            .init()
    }

    #[test]
    fn first_step_matches_hand_computation() {
        let mut model = identity_model();
        let y = model.fit_next(&array![1.0, 0.0]).unwrap();
        assert_abs_diff_eq!(y, array![1.0, 0.0], epsilon = 1e-12);

        // x̄ = x, c̄ = c / 100, step = 0.1
        assert_abs_diff_eq!(model.input_mean(), &array![1.0, 0.0]);
        assert_abs_diff_eq!(model.projection_mean(), &array![0.01, 0.0]);
        // W += 0.2 * (y xᵗ - 0), the input is fully explained by its running mean
        assert_abs_diff_eq!(
            model.forward(),
            &array![[1.2, 0.0], [0.0, 1.0]],
            epsilon = 1e-12
        );
        // M += 0.2 * (y yᵗ - M)
        assert_abs_diff_eq!(
            model.lateral(),
            &array![[1.0, 0.0], [0.0, 0.8]],
            epsilon = 1e-12
        );
        assert_eq!(model.n_steps(), 1);
    }

    #[test]
    fn stabilizer_fires_on_degenerate_lateral() {
        let mut model = BioNica::params(2, 2)
            .forward(Array2::eye(2))
            .lateral(array![[1.0, 0.0], [0.0, 1e-5]])
            .eta0(1e-6)
            .check()
            .unwrap()
            .init();
        model.fit_next(&array![0.0, 0.0]).unwrap();
        // det(M) ≈ 1e-5 < 1e-4 so 0.1 is added to the diagonal
        assert!(model.lateral()[[1, 1]] > 0.1);
        assert!(model.lateral()[[0, 0]] > 1.0);
    }

    #[test]
    fn wrong_input_leaves_state_untouched() {
        let mut model = identity_model();
        let before = model.clone();
        let err = model.fit_next(&array![1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, NicaError::Shape { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn solver_error_leaves_state_untouched() {
        let mut model = BioNica::params(2, 2)
            .forward(Array2::eye(2))
            .lateral(array![[-1.0, 0.0], [0.0, -1.0]])
            .check()
            .unwrap()
            .init();
        let before = model.clone();
        let err = model.fit_next(&array![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, NicaError::Solver(_)));
        assert_eq!(model, before);
    }

    #[test]
    fn initial_matrices_are_copied() {
        let mut w0 = Array2::eye(2);
        let params = BioNica::params(2, 2).forward(w0.clone()).check().unwrap();
        w0[[0, 0]] = 5.0;
        let model = params.init();
        assert_abs_diff_eq!(model.forward(), &Array2::<f64>::eye(2));
    }

    #[test]
    fn default_initialisation_is_reproducible() {
        let params = BioNica::<f64>::params(3, 4).check().unwrap();
        let a = params.init();
        let b = params.init();
        assert_eq!(a.forward(), b.forward());
        assert_eq!(a.lateral(), &Array2::eye(3));
        for row in a.forward().rows() {
            assert_abs_diff_eq!(row.dot(&row), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn fit_with_continues_from_previous_model() {
        let params = BioNica::params(2, 2)
            .forward(Array2::eye(2))
            .check()
            .unwrap();
        let dataset = DatasetBase::from(array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]);

        let model = params.fit_with(None, &dataset).unwrap();
        assert_eq!(model.n_steps(), 3);
        let model = params.fit_with(Some(model), &dataset).unwrap();
        assert_eq!(model.n_steps(), 6);
    }

    #[test]
    fn flip_weights_negates_a_single_row() {
        let mut model = identity_model();
        model.flip_weights(1).unwrap();
        assert_eq!(model.forward(), &array![[1.0, 0.0], [-0.0, -1.0]]);
        assert!(matches!(
            model.flip_weights(2),
            Err(NicaError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }
}
