//! Small dense linear algebra helpers shared by the learners
use std::cmp::Ordering;

use linfa::Float;
use linfa_linalg::{cholesky::InverseC, norm::Norm};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::{rand::Rng, rand_distr::StandardNormal, RandomExt};

use crate::error::{NicaError, Result};

/// Outer product `a bᵗ`
pub(crate) fn outer<F, Sa, Sb>(a: &ArrayBase<Sa, Ix1>, b: &ArrayBase<Sb, Ix1>) -> Array2<F>
where
    F: Float,
    Sa: Data<Elem = F>,
    Sb: Data<Elem = F>,
{
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}

/// Determinant by LU decomposition with partial pivoting
pub(crate) fn determinant<F: Float, S: Data<Elem = F>>(a: &ArrayBase<S, Ix2>) -> F {
    let n = a.nrows();
    let mut lu = a.to_owned();
    let mut det = F::one();

    for k in 0..n {
        let pivot = (k..n)
            .max_by(|&i, &j| {
                num_traits::Float::abs(lu[[i, k]])
                    .partial_cmp(&num_traits::Float::abs(lu[[j, k]]))
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(k);
        if lu[[pivot, k]] == F::zero() {
            return F::zero();
        }
        if pivot != k {
            for j in 0..n {
                lu.swap([k, j], [pivot, j]);
            }
            det = -det;
        }

        let p = lu[[k, k]];
        det *= p;
        for i in (k + 1)..n {
            let factor = lu[[i, k]] / p;
            for j in (k + 1)..n {
                let v = lu[[k, j]];
                lu[[i, j]] -= factor * v;
            }
        }
    }

    det
}

/// Inverse of a symmetric positive definite matrix through its Cholesky factor
pub(crate) fn inverse_spd<F: Float, S: Data<Elem = F>>(a: &ArrayBase<S, Ix2>) -> Result<Array2<F>> {
    Ok(a.invc()?)
}

/// Checks that `matrix` has exactly the shape `(rows, cols)`
pub(crate) fn check_shape<F>(
    name: &'static str,
    matrix: &Array2<F>,
    rows: usize,
    cols: usize,
) -> Result<()> {
    if matrix.dim() != (rows, cols) {
        return Err(NicaError::shape(name, &[rows, cols], matrix.shape()));
    }
    Ok(())
}

/// Random matrix whose rows are drawn from a standard normal and scaled to unit length
pub(crate) fn random_unit_rows<F: Float, R: Rng>(
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Array2<F> {
    let mut w = Array2::<f64>::random_using((rows, cols), StandardNormal, rng).mapv(F::cast);
    for mut row in w.rows_mut() {
        let norm = row.norm_l2();
        if norm > F::zero() {
            row.mapv_inplace(|v| v / norm);
        }
    }
    w
}
