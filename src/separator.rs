use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};

use crate::error::{NicaError, Result};

/// Streaming nonnegative source separation
///
/// A separator consumes one mixture vector at a time. Every call to
/// [`fit_next`](OnlineSeparator::fit_next) computes the nonnegative source estimate for the
/// sample and then adapts the synaptic weights, so calls are strictly sequential and mutate
/// the whole learner state.
pub trait OnlineSeparator<F: Float> {
    /// Dimension of the source estimates
    fn n_sources(&self) -> usize;

    /// Dimension of the observed mixtures
    fn n_mixtures(&self) -> usize;

    /// Number of samples processed so far
    fn n_steps(&self) -> usize;

    /// Process one mixture `x` of length `n_mixtures` and return the source estimate
    ///
    /// # Errors
    ///
    /// Fails with [`NicaError::Shape`] if `x` has the wrong length and with
    /// [`NicaError::Solver`] if the equilibrium could not be computed. The learner is left
    /// untouched in both cases.
    fn fit_next<D: Data<Elem = F>>(&mut self, x: &ArrayBase<D, Ix1>) -> Result<Array1<F>>;

    /// Negate the weights of output unit `j`, resolving the sign ambiguity of a recovered
    /// source
    fn flip_weights(&mut self, j: usize) -> Result<()>;

    /// Stream every row of `records`, with shape `(n_samples, n_mixtures)`, through
    /// [`fit_next`](OnlineSeparator::fit_next) and collect the outputs into a
    /// `(n_samples, n_sources)` matrix
    fn fit_records<D: Data<Elem = F>>(&mut self, records: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
        if records.ncols() != self.n_mixtures() {
            return Err(NicaError::shape(
                "records",
                &[records.nrows(), self.n_mixtures()],
                records.shape(),
            ));
        }

        let mut sources = Array2::zeros((records.nrows(), self.n_sources()));
        for (x, mut y) in records.rows().into_iter().zip(sources.rows_mut()) {
            y.assign(&self.fit_next(&x)?);
        }
        Ok(sources)
    }
}

pub(crate) fn check_input<F, D: Data<Elem = F>>(x: &ArrayBase<D, Ix1>, n_mixtures: usize) -> Result<()> {
    if x.len() != n_mixtures {
        return Err(NicaError::shape("input sample", &[n_mixtures], x.shape()));
    }
    Ok(())
}

pub(crate) fn negate_row<F: Float>(weights: &mut Array2<F>, j: usize) -> Result<()> {
    if j >= weights.nrows() {
        return Err(NicaError::IndexOutOfRange {
            index: j,
            len: weights.nrows(),
        });
    }
    weights.row_mut(j).mapv_inplace(|v| -v);
    Ok(())
}
