//! Two-layer nonnegative similarity matching network, a whitening layer followed by a
//! nonnegative rotation layer
mod algorithm;
mod hyperparams;

pub use algorithm::TwoLayerNsm;
pub use hyperparams::{TwoLayerNsmParams, TwoLayerNsmValidParams};
