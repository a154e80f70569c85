//! Error types in linfa-nica
//!
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NicaError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NicaError {
    /// An initial matrix or an input sample does not have the expected dimensions
    #[error("{name} must have shape {expected:?}, but has shape {actual:?}")]
    Shape {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// A unit index passed to `flip_weights` is not a valid source index
    #[error("unit index {index} is out of range for {len} sources")]
    IndexOutOfRange { index: usize, len: usize },
    /// The equilibrium computation could not be carried out
    #[error("equilibrium solve failed: {0}")]
    Solver(String),
    #[error("learning rate eta0 should be positive and finite, but is {0}")]
    InvalidLearningRate(f32),
    #[error("decay should be non-negative and finite, but is {0}")]
    InvalidDecay(f32),
    #[error("tau should be positive and finite, but is {0}")]
    InvalidTau(f32),
    #[error("the {0} dimension must be bigger than 0")]
    InvalidDimension(&'static str),
    #[error("unknown preset {0:?}, expected one of \"3-dim_synthetic\", \"10-dim_synthetic\", \"image\" or \"default\"")]
    UnknownPreset(String),
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}

impl NicaError {
    pub(crate) fn shape(name: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        NicaError::Shape {
            name,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
