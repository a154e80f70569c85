use linfa::dataset::DatasetBase;
use linfa::traits::FitWith;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use rand::Rng;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{TwoLayerNsmParams, TwoLayerNsmValidParams};
use crate::equilibrium::EquilibriumStage;
use crate::error::{NicaError, Result};
use crate::linalg::{inverse_spd, outer, random_unit_rows};
use crate::running_mean::RunningMean;
use crate::schedule::{whitening_rate, LearningRate};
use crate::separator::{check_input, negate_row, OnlineSeparator};
use crate::stabilizer::WeightStabilizer;

/// Two-layer nonnegative similarity matching network
///
/// The first layer whitens the mixture: the hidden units `h` settle at
/// `(Wghᵗ Wgh)⁻¹ Whx x` and the interneurons `g = Wgh h` feed back onto them. The second
/// layer rotates the whitened signal into the nonnegative orthant with the same constrained
/// equilibrium as [`BioNica`](crate::BioNica), driven by `h` instead of the raw mixture.
///
/// Reference: C. Pehlevan, S. Mohan and D. B. Chklovskii, "Blind nonnegative source
/// separation using biological neural networks" (2017)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct TwoLayerNsm<F> {
    rate: LearningRate<F>,
    whx: Array2<F>,
    wgh: Array2<F>,
    wyh: Array2<F>,
    wyy: Array2<F>,
    input_mean: RunningMean<F>,
    hidden_mean: RunningMean<F>,
    interneuron_mean: RunningMean<F>,
    equilibrium: EquilibriumStage<F>,
    stabilizer: WeightStabilizer<F>,
    t: usize,
}

impl<F: Float> TwoLayerNsm<F> {
    pub fn params(
        n_sources: usize,
        n_mixtures: usize,
    ) -> TwoLayerNsmParams<F, rand_xoshiro::Xoshiro256Plus> {
        TwoLayerNsmParams::new(n_sources, n_mixtures)
    }

    /// Forward weights of the whitening layer, of shape `(n_sources, n_mixtures)`
    pub fn whx(&self) -> &Array2<F> {
        &self.whx
    }

    /// Weights between hidden units and interneurons of the whitening layer
    pub fn wgh(&self) -> &Array2<F> {
        &self.wgh
    }

    /// Forward weights of the rotation layer
    pub fn wyh(&self) -> &Array2<F> {
        &self.wyh
    }

    /// Lateral weights of the rotation layer
    pub fn wyy(&self) -> &Array2<F> {
        &self.wyy
    }

    pub fn input_mean(&self) -> &Array1<F> {
        self.input_mean.mean()
    }

    pub fn hidden_mean(&self) -> &Array1<F> {
        self.hidden_mean.mean()
    }

    pub fn interneuron_mean(&self) -> &Array1<F> {
        self.interneuron_mean.mean()
    }

    pub fn learning_rate(&self) -> &LearningRate<F> {
        &self.rate
    }

    pub fn with_equilibrium(mut self, equilibrium: EquilibriumStage<F>) -> Self {
        self.equilibrium = equilibrium;
        self
    }

    /// Steady state `(h, g)` of the whitening layer for the mixture `x`
    fn whiten<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Result<(Array1<F>, Array1<F>)> {
        let gram = self.wgh.t().dot(&self.wgh);
        let gram_inv = inverse_spd(&gram).map_err(|err| {
            NicaError::Solver(format!(
                "whitening layer feedback weights are degenerate ({})",
                err
            ))
        })?;
        let h = gram_inv.dot(&self.whx.dot(x));
        let g = self.wgh.dot(&h);
        Ok((h, g))
    }
}

impl<F: Float, R: Rng + Clone> TwoLayerNsmValidParams<F, R> {
    /// Build a learner from the verified parameters
    ///
    /// Initial matrices are copied. `Whx` and `Wyh` default to random unit rows drawn from the
    /// same generator, `Wgh` and `Wyy` to the identity.
    pub fn init(&self) -> TwoLayerNsm<F> {
        let s = self.n_sources();
        let x = self.n_mixtures();
        let mut rng = self.rng().clone();

        let whx = match self.whx() {
            Some(w) => w.to_owned(),
            None => random_unit_rows(s, x, &mut rng),
        };
        let wgh = self.wgh().map_or_else(|| Array2::eye(s), |w| w.to_owned());
        let wyh = match self.wyh() {
            Some(w) => w.to_owned(),
            None => random_unit_rows(s, s, &mut rng),
        };
        let wyy = self.wyy().map_or_else(|| Array2::eye(s), |w| w.to_owned());
        debug!(
            n_sources = s,
            n_mixtures = x,
            preset = %self.preset(),
            eta0 = ?self.eta0(),
            decay = ?self.decay(),
            "initialised two-layer NSM learner"
        );

        TwoLayerNsm {
            rate: self.learning_rate(),
            whx,
            wgh,
            wyh,
            wyy,
            input_mean: RunningMean::full_history(x),
            hidden_mean: RunningMean::full_history(s),
            interneuron_mean: RunningMean::full_history(s),
            equilibrium: EquilibriumStage::constrained(),
            stabilizer: WeightStabilizer::default(),
            t: 0,
        }
    }
}

impl<F: Float> OnlineSeparator<F> for TwoLayerNsm<F> {
    fn n_sources(&self) -> usize {
        self.whx.nrows()
    }

    fn n_mixtures(&self) -> usize {
        self.whx.ncols()
    }

    fn n_steps(&self) -> usize {
        self.t
    }

    fn fit_next<D: Data<Elem = F>>(&mut self, x: &ArrayBase<D, Ix1>) -> Result<Array1<F>> {
        check_input(x, self.n_mixtures())?;

        // both equilibria only depend on the weights before this step
        let (h, g) = self.whiten(x)?;
        let c = self.wyh.dot(&h);
        let y = self.equilibrium.settle(c.view(), Some(self.wyy.view()))?;

        // whitening layer
        self.input_mean.update(x);
        self.hidden_mean.update(&h);
        self.interneuron_mean.update(&g);

        let x_centered = self.input_mean.centered(x);
        let h_centered = self.hidden_mean.centered(&h);
        let g_centered = self.interneuron_mean.centered(&g);

        let whitening_step = whitening_rate::<F>(self.t);
        let whx_delta = outer(&h_centered, &x_centered) - &self.whx;
        self.whx.scaled_add(whitening_step, &whx_delta);
        let wgh_delta = outer(&g_centered, &h_centered) - &self.wgh;
        self.wgh.scaled_add(whitening_step, &wgh_delta);

        // rotation layer
        let step = self.rate.step(self.t);
        trace!(t = self.t, step = ?step, whitening_step = ?whitening_step, "two-layer NSM update");

        let wyh_delta = outer(&y, &h) - &self.wyh;
        self.wyh.scaled_add(step, &wyh_delta);
        let wyy_delta = outer(&y, &y) - &self.wyy;
        self.wyy.scaled_add(step, &wyy_delta);
        self.stabilizer.stabilize(&mut self.wyy);

        self.t += 1;
        Ok(y)
    }

    /// Negates row `j` of the rotation layer forward weights `Wyh`
    fn flip_weights(&mut self, j: usize) -> Result<()> {
        negate_row(&mut self.wyh, j)
    }
}

impl<'a, F, R, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NicaError> for TwoLayerNsmValidParams<F, R>
where
    F: Float,
    R: Rng + Clone,
    D: Data<Elem = F>,
{
    type ObjectIn = Option<TwoLayerNsm<F>>;
    type ObjectOut = TwoLayerNsm<F>;

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
