//! Matrix decompositions (translates parts of `ql/math/matrixutilities/`).
//!
//! Wraps nalgebra's symmetric eigen and Cholesky decompositions.  Used to
//! validate correlation matrices and to factor state covariances.

use crate::array::Array;
use crate::matrix::Matrix;
use nalgebra::DMatrix;
use ql_core::{ensure, errors::Result, Real};

/// Eigenvalue decomposition of a symmetric real matrix.
///
/// Returns `(eigenvalues, eigenvectors)`; each column of the eigenvector
/// matrix belongs to the eigenvalue at the same position.
///
/// Corresponds to `QuantLib::SymmetricSchurDecomposition`.
pub fn symmetric_eigen(m: &Matrix) -> Result<(Array, Matrix)> {
    ensure!(
        m.is_square(),
        "matrix must be square, got {}x{}",
        m.rows(),
        m.cols()
    );
    let eigen = m.inner().clone().symmetric_eigen();
    Ok((Array::from(eigen.eigenvalues), Matrix::from(eigen.eigenvectors)))
}

/// Smallest eigenvalue of a symmetric matrix (`+inf` for an empty one).
pub fn min_symmetric_eigenvalue(m: &Matrix) -> Result<Real> {
    let (values, _) = symmetric_eigen(m)?;
    Ok(values.iter().copied().fold(Real::INFINITY, Real::min))
}

/// Lower Cholesky factor `L` with `L·Lᵀ = M` of a symmetric
/// positive-definite matrix.
pub fn cholesky_decomposition(m: &Matrix) -> Result<Matrix> {
    ensure!(m.is_square(), "matrix must be square");
    match m.inner().clone().cholesky() {
        Some(chol) => Ok(Matrix::from(chol.l())),
        None => Err(ql_core::Error::Runtime(
            "Cholesky decomposition failed, matrix is not positive definite".into(),
        )),
    }
}

/// Pseudo square root `S` of a symmetric positive-semidefinite matrix with
/// `S·Sᵀ ≈ M`, obtained by clipping negative eigenvalues to zero.
///
/// Corresponds to `QuantLib::pseudoSqrt` with the spectral salvaging
/// algorithm.
pub fn pseudo_sqrt(m: &Matrix) -> Result<Matrix> {
    let (values, vectors) = symmetric_eigen(m)?;
    let n = values.size();
    let mut root = DMatrix::<Real>::zeros(n, n);
    for i in 0..n {
        root[(i, i)] = values[i].max(0.0).sqrt();
    }
    let v = vectors.inner();
    Ok(Matrix::from(v * root * v.transpose()))
}

/// Cholesky factor if `m` is positive definite, pseudo square root
/// otherwise.
pub fn covariance_root(m: &Matrix) -> Result<Matrix> {
    cholesky_decomposition(m).or_else(|_| pseudo_sqrt(m))
}
