//! Nonnegative PCA with rectified outputs
mod algorithm;
mod hyperparams;

pub use algorithm::NonnegativePca;
pub use hyperparams::{NonnegativePcaParams, NonnegativePcaValidParams};
