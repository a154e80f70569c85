use linfa::{Float, ParamGuard};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::error::NicaError;
use crate::linalg::check_shape;
use crate::preset::Preset;
use crate::schedule::LearningRate;

/// A verified hyper-parameter set ready for the initialisation of a Bio-NICA learner
///
/// See [`BioNicaParams`] for more information.
#[derive(Clone, Debug)]
pub struct BioNicaValidParams<F: Float, R: Rng> {
    n_sources: usize,
    n_mixtures: usize,
    preset: Preset,
    eta0: Option<F>,
    decay: Option<F>,
    tau: Option<F>,
    forward: Option<Array2<F>>,
    lateral: Option<Array2<F>>,
    rng: R,
}

impl<F: Float, R: Rng> BioNicaValidParams<F, R> {
    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn n_mixtures(&self) -> usize {
        self.n_mixtures
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Initial learning rate, the explicit value if set, the preset value otherwise
    pub fn eta0(&self) -> F {
        self.eta0
            .unwrap_or_else(|| F::cast(self.preset.bio_nica().0))
    }

    pub fn decay(&self) -> F {
        self.decay
            .unwrap_or_else(|| F::cast(self.preset.bio_nica().1))
    }

    /// Ratio between the learning rates of the forward and the lateral weights
    pub fn tau(&self) -> F {
        self.tau.unwrap_or_else(|| F::cast(self.preset.bio_nica().2))
    }

    pub fn learning_rate(&self) -> LearningRate<F> {
        LearningRate::new(self.eta0(), self.decay())
    }

    /// Initial forward weights `W0`, if provided
    pub fn forward(&self) -> Option<&Array2<F>> {
        self.forward.as_ref()
    }

    /// Initial lateral weights `M0`, if provided
    pub fn lateral(&self) -> Option<&Array2<F>> {
        self.lateral.as_ref()
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// A hyper-parameter set for Bio-NICA
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | [preset](Self::preset) | [`Preset::Default`] | Tuned values of `eta0`, `decay` and `tau` | |
/// | [eta0](Self::eta0) | preset | Initial learning rate | `(0, inf)` |
/// | [decay](Self::decay) | preset | Decay of the learning rate `eta0 / (1 + decay * t)` | `[0, inf)` |
/// | [tau](Self::tau) | preset | Learning rate ratio of forward to lateral weights | `(0, inf)` |
/// | [forward](Self::forward) | random unit rows | Initial forward weights `W0` | `(n_sources, n_mixtures)` |
/// | [lateral](Self::lateral) | identity | Initial lateral weights `M0` | `(n_sources, n_sources)` |
/// | [with_rng](Self::with_rng) | `Xoshiro256Plus` seeded with 42 | Generator for the random initial weights | |
///
/// Explicitly set values take precedence over the preset, independent of the order of the
/// builder calls.
///
/// # Errors
///
/// Returns [`InvalidDimension`](NicaError::InvalidDimension) if a dimension is zero,
/// [`InvalidLearningRate`](NicaError::InvalidLearningRate),
/// [`InvalidDecay`](NicaError::InvalidDecay) or [`InvalidTau`](NicaError::InvalidTau) for
/// out-of-range rates and [`Shape`](NicaError::Shape) if an initial matrix has the wrong
/// shape.
///
/// # Example
///
/// ```rust
/// use linfa::ParamGuard;
/// use linfa_nica::{BioNica, NicaError, OnlineSeparator, Preset};
/// use ndarray::{array, Array2};
///
/// let mut model = BioNica::params(2, 2)
///     .preset(Preset::ThreeDimSynthetic)
///     .forward(Array2::eye(2))
///     .check()?
///     .init();
///
/// let y = model.fit_next(&array![0.7, 0.2])?;
/// assert!(y.iter().all(|&v| v >= 0.0));
/// # Ok::<(), NicaError>(())
/// ```
#[derive(Clone, Debug)]
pub struct BioNicaParams<F: Float, R: Rng>(BioNicaValidParams<F, R>);

impl<F: Float> BioNicaParams<F, Xoshiro256Plus> {
    /// Create default hyperparameters for `n_sources` sources mixed into `n_mixtures` channels
    pub fn new(n_sources: usize, n_mixtures: usize) -> Self {
        Self::new_with_rng(n_sources, n_mixtures, Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: Float, R: Rng> BioNicaParams<F, R> {
    pub fn new_with_rng(n_sources: usize, n_mixtures: usize, rng: R) -> Self {
        Self(BioNicaValidParams {
            n_sources,
            n_mixtures,
            preset: Preset::Default,
            eta0: None,
            decay: None,
            tau: None,
            forward: None,
            lateral: None,
            rng,
        })
    }

    /// Select the tuned profile for `eta0`, `decay` and `tau`
    pub fn preset(mut self, preset: Preset) -> Self {
        self.0.preset = preset;
        self
    }

    /// Set the initial learning rate
    pub fn eta0(mut self, eta0: F) -> Self {
        self.0.eta0 = Some(eta0);
        self
    }

    /// Set the decay of the learning rate
    pub fn decay(mut self, decay: F) -> Self {
        self.0.decay = Some(decay);
        self
    }

    /// Set the learning rate factor of the lateral weights
    pub fn tau(mut self, tau: F) -> Self {
        self.0.tau = Some(tau);
        self
    }

    /// Set the initial forward weights, of shape `(n_sources, n_mixtures)`
    pub fn forward(mut self, forward: Array2<F>) -> Self {
        self.0.forward = Some(forward);
        self
    }

    /// Set the initial lateral weights, of shape `(n_sources, n_sources)`
    pub fn lateral(mut self, lateral: Array2<F>) -> Self {
        self.0.lateral = Some(lateral);
        self
    }

    /// Set the random number generator used for the default forward weights
    pub fn with_rng<R2: Rng>(self, rng: R2) -> BioNicaParams<F, R2> {
        let p = self.0;
        BioNicaParams(BioNicaValidParams {
            n_sources: p.n_sources,
            n_mixtures: p.n_mixtures,
            preset: p.preset,
            eta0: p.eta0,
            decay: p.decay,
            tau: p.tau,
            forward: p.forward,
            lateral: p.lateral,
            rng,
        })
    }
}

impl<F: Float, R: Rng> ParamGuard for BioNicaParams<F, R> {
    type Checked = BioNicaValidParams<F, R>;
    type Error = NicaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        if p.n_sources == 0 {
            return Err(NicaError::InvalidDimension("source"));
        }
        if p.n_mixtures == 0 {
            return Err(NicaError::InvalidDimension("mixture"));
        }

        let (eta0, decay, tau) = (p.eta0(), p.decay(), p.tau());
        if !eta0.is_finite() || eta0 <= F::zero() {
            return Err(NicaError::InvalidLearningRate(eta0.to_f32().unwrap_or(f32::NAN)));
        }
        if !decay.is_finite() || decay < F::zero() {
            return Err(NicaError::InvalidDecay(decay.to_f32().unwrap_or(f32::NAN)));
        }
        if !tau.is_finite() || tau <= F::zero() {
            return Err(NicaError::InvalidTau(tau.to_f32().unwrap_or(f32::NAN)));
        }

        if let Some(forward) = &p.forward {
            check_shape("W0", forward, p.n_sources, p.n_mixtures)?;
        }
        if let Some(lateral) = &p.lateral {
            check_shape("M0", lateral, p.n_sources, p.n_sources)?;
        }
        Ok(p)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
