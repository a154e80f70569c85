//! # Online nonnegative independent component analysis
//!
//! `linfa-nica` is a crate in the [`linfa`](https://crates.io/crates/linfa) ecosystem, an effort
//! to create a toolkit for classical Machine Learning implemented in pure Rust, akin to
//! Python's `scikit-learn`.
//!
//! ## The Big Picture
//!
//! Nonnegative ICA recovers statistically independent, nonnegative sources from linear
//! mixtures of them. The learners in this crate are neural network models: they see one
//! mixture at a time, respond with a nonnegative source estimate and adapt their synapses
//! with local Hebbian and anti-Hebbian rules. Three algorithms are provided:
//!
//! * [`BioNica`], a single layer whose outputs settle at the solution of a nonnegatively
//!   constrained quadratic program defined by the lateral weights
//! * [`TwoLayerNsm`], a whitening layer followed by a rotation layer of the same kind
//! * [`NonnegativePca`], rectified units without lateral interaction
//!
//! All of them implement [`OnlineSeparator`], so samples can be fed one by one with
//! [`fit_next`](OnlineSeparator::fit_next) or in bulk with
//! [`fit_records`](OnlineSeparator::fit_records). Training on a linfa dataset works with
//! [`FitWith`](linfa::traits::FitWith), optionally continuing from an existing model.
//!
//! Each learner owns its weights exclusively and mutates them on every sample. Calls have
//! to be serialised by the caller, which the `&mut self` receivers enforce.
//!
//! ## Example
//!
//! ```rust
//! use linfa::ParamGuard;
//! use linfa_nica::{BioNica, OnlineSeparator, Preset};
//! use ndarray::array;
//!
//! let mut model = BioNica::params(2, 2)
//!     .preset(Preset::ThreeDimSynthetic)
//!     .check()?
//!     .init();
//!
//! for x in [array![1.0, 0.2], array![0.1, 0.9], array![0.6, 0.6]].iter() {
//!     let y = model.fit_next(x)?;
//!     assert!(y.iter().all(|&v| v >= 0.0));
//! }
//! // the second source was recovered with the wrong sign
//! model.flip_weights(1)?;
//! assert_eq!(model.n_steps(), 3);
//! # Ok::<(), linfa_nica::NicaError>(())
//! ```
//!
//! ## Examples
//!
//! There is an usage example in the `demos/` directory. To run, use:
//!
//! ```bash
//! $ cargo run --release --example synthetic_sources
//! ```

mod bio_nica;
mod equilibrium;
mod error;
mod linalg;
mod nonnegative_pca;
mod preset;
mod qp;
mod running_mean;
mod schedule;
mod separator;
mod stabilizer;
mod two_layer_nsm;

pub mod prelude;

pub use bio_nica::{BioNica, BioNicaParams, BioNicaValidParams};
pub use equilibrium::EquilibriumStage;
pub use error::{NicaError, Result};
pub use nonnegative_pca::{NonnegativePca, NonnegativePcaParams, NonnegativePcaValidParams};
pub use preset::Preset;
pub use qp::NonnegativeQp;
pub use running_mean::{MeanPolicy, RunningMean, FIXED_WINDOW};
pub use schedule::{whitening_rate, LearningRate, WHITENING_OFFSET};
pub use separator::OnlineSeparator;
pub use stabilizer::{WeightStabilizer, DEGENERACY_THRESHOLD, RIDGE};
pub use two_layer_nsm::{TwoLayerNsm, TwoLayerNsmParams, TwoLayerNsmValidParams};
