use linfa::{Float, ParamGuard};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::error::NicaError;
use crate::linalg::check_shape;
use crate::preset::Preset;
use crate::schedule::LearningRate;

/// A verified hyper-parameter set ready for the initialisation of a nonnegative PCA learner
///
/// See [`NonnegativePcaParams`] for more information.
#[derive(Clone, Debug)]
pub struct NonnegativePcaValidParams<F: Float, R: Rng> {
    n_sources: usize,
    n_mixtures: usize,
    preset: Preset,
    eta0: Option<F>,
    decay: Option<F>,
    forward: Option<Array2<F>>,
    rng: R,
}

impl<F: Float, R: Rng> NonnegativePcaValidParams<F, R> {
    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn n_mixtures(&self) -> usize {
        self.n_mixtures
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn eta0(&self) -> F {
        self.eta0
            .unwrap_or_else(|| F::cast(self.preset.nonnegative_pca().0))
    }

    pub fn decay(&self) -> F {
        self.decay
            .unwrap_or_else(|| F::cast(self.preset.nonnegative_pca().1))
    }

    pub fn learning_rate(&self) -> LearningRate<F> {
        LearningRate::new(self.eta0(), self.decay())
    }

    pub fn forward(&self) -> Option<&Array2<F>> {
        self.forward.as_ref()
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// A hyper-parameter set for nonnegative PCA
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | [preset](Self::preset) | [`Preset::Default`] | Tuned values of `eta0` and `decay` | |
/// | [eta0](Self::eta0) | preset | Initial learning rate | `(0, inf)` |
/// | [decay](Self::decay) | preset | Decay of the learning rate | `[0, inf)` |
/// | [forward](Self::forward) | random unit rows | Initial weights `W0` | `(n_sources, n_mixtures)` |
/// | [with_rng](Self::with_rng) | `Xoshiro256Plus` seeded with 42 | Generator for the random initial weights | |
#[derive(Clone, Debug)]
pub struct NonnegativePcaParams<F: Float, R: Rng>(NonnegativePcaValidParams<F, R>);

impl<F: Float> NonnegativePcaParams<F, Xoshiro256Plus> {
    pub fn new(n_sources: usize, n_mixtures: usize) -> Self {
        Self::new_with_rng(n_sources, n_mixtures, Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: Float, R: Rng> NonnegativePcaParams<F, R> {
    pub fn new_with_rng(n_sources: usize, n_mixtures: usize, rng: R) -> Self {
        Self(NonnegativePcaValidParams {
            n_sources,
            n_mixtures,
            preset: Preset::Default,
            eta0: None,
            decay: None,
            forward: None,
            rng,
        })
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.0.preset = preset;
        self
    }

    pub fn eta0(mut self, eta0: F) -> Self {
        self.0.eta0 = Some(eta0);
        self
    }

    pub fn decay(mut self, decay: F) -> Self {
        self.0.decay = Some(decay);
        self
    }

    pub fn forward(mut self, forward: Array2<F>) -> Self {
        self.0.forward = Some(forward);
        self
    }

    pub fn with_rng<R2: Rng>(self, rng: R2) -> NonnegativePcaParams<F, R2> {
        let p = self.0;
        NonnegativePcaParams(NonnegativePcaValidParams {
            n_sources: p.n_sources,
            n_mixtures: p.n_mixtures,
            preset: p.preset,
            eta0: p.eta0,
            decay: p.decay,
            forward: p.forward,
            rng,
        })
    }
}

impl<F: Float, R: Rng> ParamGuard for NonnegativePcaParams<F, R> {
    type Checked = NonnegativePcaValidParams<F, R>;
    type Error = NicaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        if p.n_sources == 0 {
            return Err(NicaError::InvalidDimension("source"));
        }
        if p.n_mixtures == 0 {
            return Err(NicaError::InvalidDimension("mixture"));
        }

        let (eta0, decay) = (p.eta0(), p.decay());
        if !eta0.is_finite() || eta0 <= F::zero() {
            return Err(NicaError::InvalidLearningRate(eta0.to_f32().unwrap_or(f32::NAN)));
        }
        if !decay.is_finite() || decay < F::zero() {
            return Err(NicaError::InvalidDecay(decay.to_f32().unwrap_or(f32::NAN)));
        }

        if let Some(forward) = &p.forward {
            check_shape("W0", forward, p.n_sources, p.n_mixtures)?;
        }
        Ok(p)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ten_dim_preset() {
        let params = NonnegativePcaParams::<f32, _>::new(10, 10)
            .preset(Preset::TenDimSynthetic)
            .check()
            .unwrap();
        assert_abs_diff_eq!(params.eta0(), 0.01);
        assert_abs_diff_eq!(params.decay(), 0.00001);
    }

    #[test]
    fn wrong_initial_shape_is_rejected() {
        let res = NonnegativePcaParams::new(3, 2)
            .forward(Array2::<f64>::zeros((2, 3)))
            .check();
        assert!(matches!(res, Err(NicaError::Shape { name: "W0", .. })));
    }
}
