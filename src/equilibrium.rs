//! Fixed point of the fast neural dynamics
use linfa::Float;
use ndarray::{Array1, ArrayView1, ArrayView2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{NicaError, Result};
use crate::qp::NonnegativeQp;

/// Computes the nonnegative output of a layer from its feedforward drive
///
/// The recurrent dynamics of the output neurons are not simulated, only their steady state is
/// computed:
///
/// * [`Constrained`](EquilibriumStage::Constrained) minimises the similarity matching energy
///   `1/2 yᵗ M y - cᵗ y` over `y >= 0`, with `M` the lateral weights and `c` the drive
/// * [`Rectified`](EquilibriumStage::Rectified) takes `y = max(c, 0)`, ignoring lateral
///   interaction altogether
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub enum EquilibriumStage<F> {
    Constrained(NonnegativeQp<F>),
    Rectified,
}

impl<F: Float> EquilibriumStage<F> {
    pub fn constrained() -> Self {
        EquilibriumStage::Constrained(NonnegativeQp::default())
    }

    pub fn rectified() -> Self {
        EquilibriumStage::Rectified
    }

    /// Steady state output for the drive `drive`
    ///
    /// The constrained stage needs the lateral weights and fails with
    /// [`NicaError::Solver`] without them or if the program is ill-posed.
    pub fn settle(&self, drive: ArrayView1<F>, lateral: Option<ArrayView2<F>>) -> Result<Array1<F>> {
        match self {
            EquilibriumStage::Constrained(solver) => {
                let lateral = lateral.ok_or_else(|| {
                    NicaError::Solver(
                        "constrained equilibrium requires lateral weights".to_string(),
                    )
                })?;
                solver.solve(&lateral, &drive)
            }
            EquilibriumStage::Rectified => Ok(drive.mapv(|v| F::max(v, F::zero()))),
        }
    }
}
