//! Bio-NICA, online nonnegative ICA with a single layer of neurons
mod algorithm;
mod hyperparams;

pub use algorithm::BioNica;
pub use hyperparams::{BioNicaParams, BioNicaValidParams};
