//! Linear-algebra helpers on top of a backend's factorizations.
//!
//! Every helper takes the backend explicitly.

use strided_view::{ElementKind, Result, StridedArray, StridedError};

use crate::backend::Gelsy;
use crate::eigen::EigenDecomposition;
use crate::lu::LuDecomposition;
use crate::qr::QrDecomposition;
use crate::svd::SvdDecomposition;
use crate::{Backend, RANK_EPSILON};

/// LU decomposition of `a`.
pub fn lu(backend: &dyn Backend, a: &StridedArray) -> Result<LuDecomposition> {
    LuDecomposition::new(backend, a)
}

/// Singular value decomposition of `a`.
pub fn svd(backend: &dyn Backend, a: &StridedArray) -> Result<SvdDecomposition> {
    SvdDecomposition::new(backend, a)
}

/// QR decomposition of `a`.
pub fn qr(backend: &dyn Backend, a: &StridedArray) -> Result<QrDecomposition> {
    QrDecomposition::new(backend, a)
}

/// Eigendecomposition of a general square matrix.
pub fn eig(backend: &dyn Backend, a: &StridedArray) -> Result<EigenDecomposition> {
    EigenDecomposition::new(backend, a)
}

/// Eigendecomposition of a symmetric matrix (lower triangle).
pub fn eigh(backend: &dyn Backend, a: &StridedArray) -> Result<EigenDecomposition> {
    EigenDecomposition::symmetric(backend, a)
}

/// Minimum-norm least-squares solution of `A·X ≈ B` for any `A`, with the
/// default `max(m, n)·ε` rank cutoff.
pub fn lstsq(backend: &dyn Backend, a: &StridedArray, b: &StridedArray) -> Result<Gelsy> {
    backend.linalg().gelsy(a, b, -1.0)
}

fn require_square(a: &StridedArray, what: &str) -> Result<usize> {
    let (m, n) = a.require_matrix()?;
    if m != n {
        return Err(StridedError::argument(format!(
            "{what} requires a square matrix, got {m}x{n}"
        )));
    }
    Ok(n)
}

/// Inverse of a square matrix.
///
/// # Errors
/// [`StridedError::Argument`] for non-square input,
/// [`StridedError::IllegalState`] for a singular matrix.
pub fn inv(backend: &dyn Backend, a: &StridedArray) -> Result<StridedArray> {
    require_square(a, "inverse")?;
    lu(backend, a)?.inverse()
}

/// Moore-Penrose pseudo-inverse of any matrix.
pub fn pinv(backend: &dyn Backend, a: &StridedArray) -> Result<StridedArray> {
    svd(backend, a)?.pseudo_inverse(backend)
}

/// Determinant of a square matrix.
///
/// # Errors
/// [`StridedError::Argument`] for non-square input.
pub fn det(backend: &dyn Backend, a: &StridedArray) -> Result<f64> {
    require_square(a, "determinant")?;
    lu(backend, a)?.determinant()
}

/// Number of singular values above [`RANK_EPSILON`].
pub fn rank(backend: &dyn Backend, a: &StridedArray) -> Result<usize> {
    Ok(svd(backend, a)?.rank(RANK_EPSILON))
}

/// Solve `A·X = B` for square `A`.
///
/// # Errors
/// [`StridedError::Argument`] for non-square `A`,
/// [`StridedError::NonConformant`] if `B` does not have `A`'s row count,
/// [`StridedError::IllegalState`] for a singular `A`.
pub fn solve(backend: &dyn Backend, a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
    let n = require_square(a, "solve")?;
    if b.ndim() == 0 || b.ndim() > 2 || b.dims()[0] != n {
        return Err(StridedError::non_conformant(a.dims(), b.dims()));
    }
    lu(backend, a)?.solve(b)
}

/// Unit-lower-triangular `L` (`rows x min(rows, cols)`) from a combined factor.
pub(crate) fn unit_lower_of(lu: &StridedArray) -> Result<StridedArray> {
    let (m, n) = lu.require_matrix()?;
    let k = m.min(n);
    let data = lu.to_vec::<f64>();
    let out = StridedArray::zeros(ElementKind::Double, &[m, k])?;
    let mut values = out.to_vec::<f64>();
    for j in 0..k {
        values[j + j * m] = 1.0;
        for i in j + 1..m {
            values[i + j * m] = data[i + j * m];
        }
    }
    out.write_all(&values)?;
    Ok(out)
}

/// Overwrite the column-major `n x k` right-hand side with the solution of
/// `A·X = B`, given the combined `n x n` factor of `A` and its swap sequence.
///
/// The factor must be non-singular.
pub(crate) fn lu_solve_in_place(lu: &[f64], pivots: &[usize], n: usize, k: usize, rhs: &mut [f64]) {
    for c in 0..k {
        let col = &mut rhs[c * n..(c + 1) * n];
        for (i, &p) in pivots.iter().enumerate() {
            col.swap(i, p);
        }
        // L·y = P·b
        for i in 0..n {
            let mut acc = col[i];
            for j in 0..i {
                acc -= lu[i + j * n] * col[j];
            }
            col[i] = acc;
        }
        // U·x = y
        for i in (0..n).rev() {
            let mut acc = col[i];
            for j in i + 1..n {
                acc -= lu[i + j * n] * col[j];
            }
            col[i] = acc / lu[i + i * n];
        }
    }
}
