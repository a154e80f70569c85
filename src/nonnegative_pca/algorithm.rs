use linfa::dataset::DatasetBase;
use linfa::traits::FitWith;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rand::Rng;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{NonnegativePcaParams, NonnegativePcaValidParams};
use crate::equilibrium::EquilibriumStage;
use crate::error::{NicaError, Result};
use crate::linalg::{outer, random_unit_rows};
use crate::schedule::LearningRate;
use crate::separator::{check_input, negate_row, OnlineSeparator};

/// Nonnegative PCA
///
/// A single layer of rectified units without lateral connections. The weights follow the
/// subspace rule `W += step (y xᵗ - y yᵗ W)` with `y = max(W x, 0)`, which converges to
/// the nonnegative sources for whitened mixtures.
///
/// Reference: M. D. Plumbley and E. Oja, "A 'Nonnegative PCA' algorithm for independent
/// component analysis" (2004)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct NonnegativePca<F> {
    rate: LearningRate<F>,
    forward: Array2<F>,
    equilibrium: EquilibriumStage<F>,
    t: usize,
}

impl<F: Float> NonnegativePca<F> {
    pub fn params(
        n_sources: usize,
        n_mixtures: usize,
    ) -> NonnegativePcaParams<F, rand_xoshiro::Xoshiro256Plus> {
        NonnegativePcaParams::new(n_sources, n_mixtures)
    }

    /// Weights `W`, of shape `(n_sources, n_mixtures)`
    pub fn forward(&self) -> &Array2<F> {
        &self.forward
    }

    pub fn learning_rate(&self) -> &LearningRate<F> {
        &self.rate
    }
}

impl<F: Float, R: Rng + Clone> NonnegativePcaValidParams<F, R> {
    /// Build a learner from the verified parameters
    pub fn init(&self) -> NonnegativePca<F> {
        let (s, x) = (self.n_sources(), self.n_mixtures());
        let forward = match self.forward() {
            Some(w) => w.to_owned(),
            None => random_unit_rows(s, x, &mut self.rng().clone()),
        };
        debug!(
            n_sources = s,
            n_mixtures = x,
            preset = %self.preset(),
            eta0 = ?self.eta0(),
            decay = ?self.decay(),
            "initialised nonnegative PCA learner"
        );

        NonnegativePca {
            rate: self.learning_rate(),
            forward,
            equilibrium: EquilibriumStage::rectified(),
            t: 0,
        }
    }
}

impl<F: Float> OnlineSeparator<F> for NonnegativePca<F> {
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

        let y = self.equilibrium.settle(self.forward.dot(x).view(), None)?;

        let step = self.rate.step(self.t);
        trace!(t = self.t, step = ?step, "nonnegative PCA update");
        let delta = outer(&y, x) - outer(&y, &y).dot(&self.forward);
        self.forward.scaled_add(step, &delta);

        self.t += 1;
        Ok(y)
    }

    fn flip_weights(&mut self, j: usize) -> Result<()> {
        negate_row(&mut self.forward, j)
    }
}

impl<'a, F, R, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NicaError>
    for NonnegativePcaValidParams<F, R>
where
    F: Float,
    R: Rng + Clone,
    D: Data<Elem = F>,
{
    type ObjectIn = Option<NonnegativePca<F>>;
    type ObjectOut = NonnegativePca<F>;

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

    #[test]
    fn update_follows_subspace_rule() {
        let mut model = NonnegativePca::params(2, 2)
            .forward(array![[1.0, 0.0], [0.0, -1.0]])
            .check()
            .unwrap()
            .init();
        let y = model.fit_next(&array![1.0, 1.0]).unwrap();

        // W x = (1, -1) is rectified to (1, 0)
        assert_abs_diff_eq!(y, array![1.0, 0.0]);
        // y xᵗ - y yᵗ W = [[1, 1], [0, 0]] - [[1, 0], [0, 0]]
        assert_abs_diff_eq!(
            model.forward(),
            &array![[1.0, 0.1], [0.0, -1.0]],
            epsilon = 1e-12
        );
        assert_eq!(model.n_steps(), 1);
    }

    #[test]
    fn silent_units_do_not_learn() {
        let w0 = array![[-1.0, -1.0], [0.5, 0.5]];
        let mut model = NonnegativePca::params(2, 2)
            .forward(w0.clone())
            .check()
            .unwrap()
            .init();
        let y = model.fit_next(&array![1.0, 2.0]).unwrap();
        assert_abs_diff_eq!(y[0], 0.0);
        assert_eq!(model.forward().row(0), w0.row(0));
    }

    #[test]
    fn unit_index_out_of_range() {
        let mut model = NonnegativePca::<f64>::params(3, 2).check().unwrap().init();
        assert!(matches!(
            model.flip_weights(3),
            Err(NicaError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn fit_records_returns_one_row_per_sample() {
        let mut model = NonnegativePca::<f64>::params(3, 2).check().unwrap().init();
        let records = array![[1.0, 0.0], [0.0, 1.0], [0.3, 0.3], [0.9, 0.1]];
        let sources = model.fit_records(&records).unwrap();
        assert_eq!(sources.dim(), (4, 3));
        assert!(sources.iter().all(|&v| v >= 0.0));
        assert_eq!(model.n_steps(), 4);

        let err = model.fit_records(&array![[1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, NicaError::Shape { name: "records", .. }));
        assert_eq!(model.n_steps(), 4);
    }

    #[test]
    fn fit_with_on_dataset() {
        let params = NonnegativePca::params(2, 2).eta0(0.05);
        let dataset = DatasetBase::from(array![[1.0, 0.0], [0.0, 1.0]]);
        let model = params.fit_with(None, &dataset).unwrap();
        assert_eq!(model.n_steps(), 2);
        assert_abs_diff_eq!(model.learning_rate().eta0(), 0.05);
    }
}
