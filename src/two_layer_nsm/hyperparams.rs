use linfa::{Float, ParamGuard};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::error::NicaError;
use crate::linalg::check_shape;
use crate::preset::Preset;
use crate::schedule::LearningRate;

/// A verified hyper-parameter set ready for the initialisation of a two-layer NSM learner
///
/// See [`TwoLayerNsmParams`] for more information.
#[derive(Clone, Debug)]
pub struct TwoLayerNsmValidParams<F: Float, R: Rng> {
    n_sources: usize,
    n_mixtures: usize,
    preset: Preset,
    eta0: Option<F>,
    decay: Option<F>,
    whx: Option<Array2<F>>,
    wgh: Option<Array2<F>>,
    wyh: Option<Array2<F>>,
    wyy: Option<Array2<F>>,
    rng: R,
}

impl<F: Float, R: Rng> TwoLayerNsmValidParams<F, R> {
    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn n_mixtures(&self) -> usize {
        self.n_mixtures
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Initial learning rate of the rotation layer
    pub fn eta0(&self) -> F {
        self.eta0
            .unwrap_or_else(|| F::cast(self.preset.two_layer_nsm().0))
    }

    pub fn decay(&self) -> F {
        self.decay
            .unwrap_or_else(|| F::cast(self.preset.two_layer_nsm().1))
    }

    pub fn learning_rate(&self) -> LearningRate<F> {
        LearningRate::new(self.eta0(), self.decay())
    }

    pub fn whx(&self) -> Option<&Array2<F>> {
        self.whx.as_ref()
    }

    pub fn wgh(&self) -> Option<&Array2<F>> {
        self.wgh.as_ref()
    }

    pub fn wyh(&self) -> Option<&Array2<F>> {
        self.wyh.as_ref()
    }

    pub fn wyy(&self) -> Option<&Array2<F>> {
        self.wyy.as_ref()
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// A hyper-parameter set for the two-layer nonnegative similarity matching network
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | [preset](Self::preset) | [`Preset::Default`] | Tuned values of `eta0` and `decay` | |
/// | [eta0](Self::eta0) | preset | Initial learning rate of the rotation layer | `(0, inf)` |
/// | [decay](Self::decay) | preset | Decay of the rotation layer learning rate | `[0, inf)` |
/// | [whx](Self::whx) | random unit rows | Forward weights of the whitening layer | `(n_sources, n_mixtures)` |
/// | [wgh](Self::wgh) | identity | Feedback weights of the whitening layer | `(n_sources, n_sources)` |
/// | [wyh](Self::wyh) | random unit rows | Forward weights of the rotation layer | `(n_sources, n_sources)` |
/// | [wyy](Self::wyy) | identity | Lateral weights of the rotation layer | `(n_sources, n_sources)` |
/// | [with_rng](Self::with_rng) | `Xoshiro256Plus` seeded with 42 | Generator for the random initial weights | |
///
/// The whitening layer always learns with the rate `1 / (100 + t)`.
#[derive(Clone, Debug)]
pub struct TwoLayerNsmParams<F: Float, R: Rng>(TwoLayerNsmValidParams<F, R>);

impl<F: Float> TwoLayerNsmParams<F, Xoshiro256Plus> {
    pub fn new(n_sources: usize, n_mixtures: usize) -> Self {
        Self::new_with_rng(n_sources, n_mixtures, Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: Float, R: Rng> TwoLayerNsmParams<F, R> {
    pub fn new_with_rng(n_sources: usize, n_mixtures: usize, rng: R) -> Self {
        Self(TwoLayerNsmValidParams {
            n_sources,
            n_mixtures,
            preset: Preset::Default,
            eta0: None,
            decay: None,
            whx: None,
            wgh: None,
            wyh: None,
            wyy: None,
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

    pub fn whx(mut self, whx: Array2<F>) -> Self {
        self.0.whx = Some(whx);
        self
    }

    pub fn wgh(mut self, wgh: Array2<F>) -> Self {
        self.0.wgh = Some(wgh);
        self
    }

    pub fn wyh(mut self, wyh: Array2<F>) -> Self {
        self.0.wyh = Some(wyh);
        self
    }

    pub fn wyy(mut self, wyy: Array2<F>) -> Self {
        self.0.wyy = Some(wyy);
        self
    }

    pub fn with_rng<R2: Rng>(self, rng: R2) -> TwoLayerNsmParams<F, R2> {
        let p = self.0;
        TwoLayerNsmParams(TwoLayerNsmValidParams {
            n_sources: p.n_sources,
            n_mixtures: p.n_mixtures,
            preset: p.preset,
            eta0: p.eta0,
            decay: p.decay,
            whx: p.whx,
            wgh: p.wgh,
            wyh: p.wyh,
            wyy: p.wyy,
            rng,
        })
    }
}

impl<F: Float, R: Rng> ParamGuard for TwoLayerNsmParams<F, R> {
    type Checked = TwoLayerNsmValidParams<F, R>;
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

        let s = p.n_sources;
        if let Some(whx) = &p.whx {
            check_shape("Whx0", whx, s, p.n_mixtures)?;
        }
        for (name, matrix) in [("Wgh0", &p.wgh), ("Wyh0", &p.wyh), ("Wyy0", &p.wyy)] {
            if let Some(matrix) = matrix {
                check_shape(name, matrix, s, s)?;
            }
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
    fn presets_map_to_tuned_rates() {
        let params = TwoLayerNsmParams::<f64, _>::new(3, 3)
            .preset(Preset::ThreeDimSynthetic)
            .check()
            .unwrap();
        assert_abs_diff_eq!(params.eta0(), 0.1);
        assert_abs_diff_eq!(params.decay(), 1e-7);

        let params = TwoLayerNsmParams::<f64, _>::new(3, 3)
            .preset(Preset::Image)
            .decay(0.5)
            .check()
            .unwrap();
        assert_abs_diff_eq!(params.eta0(), 0.1);
        assert_abs_diff_eq!(params.decay(), 0.5);
    }

    #[test]
    fn whitening_forward_weights_must_be_sources_by_mixtures() {
        let res = TwoLayerNsmParams::new(2, 4)
            .whx(Array2::<f64>::zeros((2, 2)))
            .check();
        assert!(matches!(res, Err(NicaError::Shape { name: "Whx0", .. })));
        assert!(TwoLayerNsmParams::new(2, 4)
            .whx(Array2::<f64>::zeros((2, 4)))
            .check()
            .is_ok());
    }

    #[test]
    fn square_matrices_are_shape_checked() {
        let res = TwoLayerNsmParams::new(2, 4)
            .wyy(Array2::<f64>::eye(4))
            .check();
        assert!(matches!(res, Err(NicaError::Shape { name: "Wyy0", .. })));
        let res = TwoLayerNsmParams::new(2, 4)
            .wgh(Array2::<f64>::zeros((2, 4)))
            .check();
        assert!(matches!(res, Err(NicaError::Shape { name: "Wgh0", .. })));
    }

    #[test]
    fn negative_learning_rate_is_rejected() {
        let res = TwoLayerNsmParams::<f64, _>::new(2, 2).eta0(-0.1).check();
        assert!(matches!(res, Err(NicaError::InvalidLearningRate(_))));
    }
}
