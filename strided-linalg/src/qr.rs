//! QR decomposition and least-squares solves through it.

use strided_kernel::Transpose;
use strided_view::{Result, StridedArray, StridedError};

use crate::backend::Backend;
use crate::RANK_EPSILON;

/// `A = Q·R` with orthogonal `Q` (`m x m`) and upper-trapezoidal `R`
/// (`m x n`, non-negative diagonal).
#[derive(Debug, Clone)]
pub struct QrDecomposition {
    q: StridedArray,
    r: StridedArray,
}

impl QrDecomposition {
    /// Decompose `a` with `backend`. The input is not modified.
    pub fn new(backend: &dyn Backend, a: &StridedArray) -> Result<Self> {
        let f = backend.linalg().qr(a)?;
        log::debug!("qr via {}: {:?}", backend.name(), a.dims());
        Ok(Self { q: f.q, r: f.r })
    }

    pub fn q(&self) -> StridedArray {
        self.q.copy()
    }

    pub fn r(&self) -> StridedArray {
        self.r.copy()
    }

    /// True when every diagonal entry of `R` is above [`RANK_EPSILON`].
    pub fn is_full_rank(&self) -> bool {
        let (m, n) = (self.r.dims()[0], self.r.dims()[1]);
        let r = self.r.to_vec::<f64>();
        (0..m.min(n)).all(|i| r[i + i * m].abs() > RANK_EPSILON)
    }

    /// Least-squares solution of `A·X ≈ B` for `A` with at least as many rows
    /// as columns, by back substitution on `R·X = Qᵀ·B`.
    ///
    /// # Errors
    /// [`StridedError::Argument`] for a wide `A`,
    /// [`StridedError::NonConformant`] if `B` does not have `A`'s row count,
    /// [`StridedError::IllegalState`] if `A` is rank deficient.
    pub fn solve(&self, backend: &dyn Backend, b: &StridedArray) -> Result<StridedArray> {
        let (m, n) = (self.r.dims()[0], self.r.dims()[1]);
        if m < n {
            return Err(StridedError::argument(format!(
                "QR solve needs rows >= columns, got {m}x{n}"
            )));
        }
        let rhs = match b.ndim() {
            1 if b.len() == m => b.reshape(&[m, 1])?,
            2 if b.dims()[0] == m => b.clone(),
            _ => return Err(StridedError::non_conformant(&[m, n], b.dims())),
        };
        if !self.is_full_rank() {
            return Err(StridedError::illegal_state("matrix is rank deficient"));
        }
        let k = rhs.dims()[1];
        let qtb = backend
            .routines()
            .matmul(Transpose::Transpose, &self.q, Transpose::Keep, &rhs)?
            .to_vec::<f64>();
        let r = self.r.to_vec::<f64>();

        let mut x = vec![0.0; n * k];
        for c in 0..k {
            for i in (0..n).rev() {
                let mut acc = qtb[i + c * m];
                for j in i + 1..n {
                    acc -= r[i + j * m] * x[j + c * n];
                }
                x[i + c * n] = acc / r[i + i * m];
            }
        }
        if b.ndim() == 1 {
            StridedArray::from_vec(&[n], x)
        } else {
            StridedArray::from_vec(&[n, k], x)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portable_backend;
    use approx::assert_relative_eq;

    fn matrix(rows: usize, cols: usize, data: &[f64]) -> StridedArray {
        StridedArray::from_row_major(&[rows, cols], data).unwrap()
    }

    #[test]
    fn test_solve_overdetermined_line_fit() {
        // y = 1 + 2t sampled exactly at t = 0..4
        let a = matrix(4, 2, &[1., 0., 1., 1., 1., 2., 1., 3.]);
        let b = StridedArray::from_slice(&[1.0, 3.0, 5.0, 7.0]);
        let qr = QrDecomposition::new(portable_backend(), &a).unwrap();
        assert!(qr.is_full_rank());
        let x = qr.solve(portable_backend(), &b).unwrap();
        assert_eq!(x.dims(), &[2]);
        assert_relative_eq!(x.get::<f64>(&[0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(x.get::<f64>(&[1]).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_minimizes_residual() {
        // the line 1/2 + t plus a residual orthogonal to both columns
        let a = matrix(3, 2, &[1., 0., 1., 1., 1., 2.]);
        let b = matrix(3, 1, &[1.5, -0.5, 3.5]);
        let qr = QrDecomposition::new(portable_backend(), &a).unwrap();
        let x = qr.solve(portable_backend(), &b).unwrap();
        assert_eq!(x.dims(), &[2, 1]);
        assert_relative_eq!(x.get::<f64>(&[0, 0]).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(x.get::<f64>(&[1, 0]).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_errors() {
        let backend = portable_backend();
        let wide = QrDecomposition::new(backend, &matrix(2, 3, &[1., 2., 3., 4., 5., 6.])).unwrap();
        let b2 = StridedArray::from_slice(&[1.0, 2.0]);
        assert!(matches!(wide.solve(backend, &b2), Err(StridedError::Argument(_))));

        let deficient = QrDecomposition::new(backend, &matrix(3, 2, &[1., 2., 2., 4., 3., 6.])).unwrap();
        assert!(!deficient.is_full_rank());
        let b3 = StridedArray::from_slice(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            deficient.solve(backend, &b3),
            Err(StridedError::IllegalState(_))
        ));
        assert!(matches!(
            deficient.solve(backend, &b2),
            Err(StridedError::NonConformant { .. })
        ));
    }
}
