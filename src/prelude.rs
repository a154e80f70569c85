//! linfa-nica prelude.
//!
//! This module contains the learners, their parameter sets and the traits needed to use
//! them, so they can be imported easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{NicaError, Result};

#[doc(no_inline)]
pub use crate::separator::OnlineSeparator;

#[doc(no_inline)]
pub use crate::{BioNica, NonnegativePca, Preset, TwoLayerNsm};

#[doc(no_inline)]
pub use linfa::{traits::FitWith, ParamGuard};
