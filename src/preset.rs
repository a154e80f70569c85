//! Tuned hyperparameter profiles
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::NicaError;

/// Hyperparameter profile selecting the learning rate schedule (and `tau` for Bio-NICA)
/// that worked best on the reference datasets
///
/// A preset only provides defaults; values set explicitly on a parameter set always take
/// precedence. Learners without a dedicated profile for a preset fall back to
/// [`Preset::Default`].
///
/// | Preset | Bio-NICA `(eta0, decay, tau)` | 2-layer NSM `(eta0, decay)` | Nonnegative PCA `(eta0, decay)` |
/// | :--- | :--- | :--- | :--- |
/// | `3-dim_synthetic` | `(0.1, 1e-2, 0.8)` | `(0.1, 1e-7)` | `(0.1, 1e-5)` |
/// | `10-dim_synthetic` | `(1e-3, 1e-4, 0.03)` | `(0.1, 1e-6)` | `(0.01, 1e-5)` |
/// | `image` | `(1e-3, 1e-6, 0.1)` | default | default |
/// | `default` | `(0.1, 1e-3, 0.5)` | `(0.1, 1e-3)` | `(0.1, 1e-3)` |
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    ThreeDimSynthetic,
    TenDimSynthetic,
    Image,
    Default,
}

impl Default for Preset {
    fn default() -> Self {
        Preset::Default
    }
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Preset::ThreeDimSynthetic => "3-dim_synthetic",
            Preset::TenDimSynthetic => "10-dim_synthetic",
            Preset::Image => "image",
            Preset::Default => "default",
        }
    }

    /// `(eta0, decay, tau)` of the Bio-NICA learner
    pub fn bio_nica(&self) -> (f64, f64, f64) {
        match self {
            Preset::ThreeDimSynthetic => (0.1, 0.01, 0.8),
            Preset::TenDimSynthetic => (0.001, 0.0001, 0.03),
            Preset::Image => (0.001, 0.000001, 0.1),
            Preset::Default => (0.1, 0.001, 0.5),
        }
    }

    /// `(eta0, decay)` of the two-layer NSM learner
    pub fn two_layer_nsm(&self) -> (f64, f64) {
        match self {
            Preset::ThreeDimSynthetic => (0.1, 0.0000001),
            Preset::TenDimSynthetic => (0.1, 0.000001),
            Preset::Image | Preset::Default => (0.1, 0.001),
        }
    }

    /// `(eta0, decay)` of the nonnegative PCA learner
    pub fn nonnegative_pca(&self) -> (f64, f64) {
        match self {
            Preset::ThreeDimSynthetic => (0.1, 0.00001),
            Preset::TenDimSynthetic => (0.01, 0.00001),
            Preset::Image | Preset::Default => (0.1, 0.001),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = NicaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3-dim_synthetic" => Ok(Preset::ThreeDimSynthetic),
            "10-dim_synthetic" => Ok(Preset::TenDimSynthetic),
            "image" => Ok(Preset::Image),
            "default" => Ok(Preset::Default),
            other => Err(NicaError::UnknownPreset(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_preset_name() {
        for preset in [
            Preset::ThreeDimSynthetic,
            Preset::TenDimSynthetic,
            Preset::Image,
            Preset::Default,
        ] {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
            assert_eq!(preset.to_string(), preset.name());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "5-dim_synthetic".parse::<Preset>().unwrap_err();
        assert!(matches!(err, NicaError::UnknownPreset(name) if name == "5-dim_synthetic"));
    }

    #[test]
    fn image_falls_back_to_default_without_dedicated_profile() {
        assert_eq!(
            Preset::Image.two_layer_nsm(),
            Preset::Default.two_layer_nsm()
        );
        assert_eq!(
            Preset::Image.nonnegative_pca(),
            Preset::Default.nonnegative_pca()
        );
        assert_ne!(Preset::Image.bio_nica(), Preset::Default.bio_nica());
    }
}
