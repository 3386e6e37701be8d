//! LU decomposition with lazily computed secondary quantities.

use std::sync::OnceLock;

use strided_view::{ElementKind, Result, StridedArray, StridedError};

use crate::backend::Backend;
use crate::solve::{lu_solve_in_place, unit_lower_of};

/// `P·A = L·U` for a matrix `A`, as produced by a backend's `getrf`.
///
/// The factor arrays are owned by the decomposition. Accessors hand out
/// independent copies, and derived quantities are computed on first access
/// and kept for the lifetime of the value.
#[derive(Debug)]
pub struct LuDecomposition {
    lu: StridedArray,
    pivots: Vec<usize>,
    determinant: OnceLock<f64>,
    non_singular: OnceLock<bool>,
    upper: OnceLock<StridedArray>,
    lower: OnceLock<StridedArray>,
}

impl LuDecomposition {
    /// Factorize `a` with `backend`. The input is not modified.
    pub fn new(backend: &dyn Backend, a: &StridedArray) -> Result<Self> {
        let f = backend.linalg().getrf(a)?;
        log::debug!(
            "lu via {}: {:?}, info {}",
            backend.name(),
            a.dims(),
            f.info
        );
        Self::from_factors(f.lu, f.ipiv)
    }

    /// Wrap an existing `rows x cols` combined factor and its 0-based
    /// swap-sequence pivots.
    ///
    /// # Errors
    /// [`StridedError::Argument`] unless there are exactly `min(rows, cols)`
    /// pivots, each a valid row index.
    pub fn from_factors(lu: StridedArray, pivots: Vec<usize>) -> Result<Self> {
        let (m, n) = lu.require_matrix()?;
        if pivots.len() != m.min(n) {
            return Err(StridedError::argument(format!(
                "{m}x{n} factor needs {} pivots, got {}",
                m.min(n),
                pivots.len()
            )));
        }
        if let Some(&p) = pivots.iter().find(|&&p| p >= m) {
            return Err(StridedError::argument(format!(
                "pivot row {p} out of range for {m} rows"
            )));
        }
        Ok(Self {
            lu,
            pivots,
            determinant: OnceLock::new(),
            non_singular: OnceLock::new(),
            upper: OnceLock::new(),
            lower: OnceLock::new(),
        })
    }

    /// Combined factor: unit `L` below the diagonal, `U` on and above it.
    pub fn decomposition(&self) -> StridedArray {
        self.lu.copy()
    }

    /// Row `i` was exchanged with row `pivots()[i]`.
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    fn require_square(&self) -> Result<usize> {
        let (m, n) = self.lu.require_matrix()?;
        if m != n {
            return Err(StridedError::illegal_state(format!(
                "matrix must be square, got {m}x{n}"
            )));
        }
        Ok(n)
    }

    fn at(&self, i: usize, j: usize) -> Result<f64> {
        self.lu.get::<f64>(&[i, j])
    }

    /// Product of the diagonal of `U`, negated once per row interchange.
    ///
    /// # Errors
    /// [`StridedError::IllegalState`] for a non-square factorization.
    pub fn determinant(&self) -> Result<f64> {
        if let Some(&d) = self.determinant.get() {
            return Ok(d);
        }
        let n = self.require_square()?;
        let mut det = 1.0;
        for i in 0..n {
            det *= self.at(i, i)?;
            if self.pivots[i] != i {
                det = -det;
            }
        }
        Ok(*self.determinant.get_or_init(|| det))
    }

    /// Whether no diagonal entry of `U` is exactly zero.
    ///
    /// # Errors
    /// [`StridedError::IllegalState`] for a non-square factorization.
    pub fn is_non_singular(&self) -> Result<bool> {
        if let Some(&b) = self.non_singular.get() {
            return Ok(b);
        }
        let n = self.require_square()?;
        let mut non_singular = true;
        for i in 0..n {
            if self.at(i, i)? == 0.0 {
                non_singular = false;
                break;
            }
        }
        Ok(*self.non_singular.get_or_init(|| non_singular))
    }

    /// Row permutation `P` with `P·A = L·U`, as a `rows x rows` matrix.
    pub fn permutation(&self) -> Result<StridedArray> {
        let (m, _) = self.lu.require_matrix()?;
        let mut rows: Vec<usize> = (0..m).collect();
        for (i, &p) in self.pivots.iter().enumerate() {
            rows.swap(i, p);
        }
        let perm = StridedArray::zeros(ElementKind::Double, &[m, m])?;
        for (i, &r) in rows.iter().enumerate() {
            perm.set(&[i, r], 1.0)?;
        }
        Ok(perm)
    }

    /// Upper-triangular part of the factor, diagonal included.
    pub fn upper(&self) -> Result<StridedArray> {
        if let Some(u) = self.upper.get() {
            return Ok(u.copy());
        }
        let (m, n) = self.lu.require_matrix()?;
        let upper = StridedArray::zeros(ElementKind::Double, &[m, n])?;
        for i in 0..m {
            for j in i..n {
                upper.set(&[i, j], self.at(i, j)?)?;
            }
        }
        Ok(self.upper.get_or_init(|| upper).copy())
    }

    /// Lower factor in mirrored addressing.
    ///
    /// Entry `(i, cols-1-j)` for `j >= i` holds the factor entry at
    /// `(rows-1-i, cols-1-j)`, or 1 where those coordinates coincide. For a
    /// square factorization this is `L` with its rows in reverse order; use
    /// [`unit_lower`](Self::unit_lower) for `L` itself.
    pub fn lower(&self) -> Result<StridedArray> {
        if let Some(l) = self.lower.get() {
            return Ok(l.copy());
        }
        let (m, n) = self.lu.require_matrix()?;
        let lower = StridedArray::zeros(ElementKind::Double, &[m, n])?;
        for i in 0..m {
            let ii = m - 1 - i;
            for j in i..n {
                let jj = n - 1 - j;
                let value = if ii == jj { 1.0 } else { self.at(ii, jj)? };
                lower.set(&[i, jj], value)?;
            }
        }
        Ok(self.lower.get_or_init(|| lower).copy())
    }

    /// Unit-lower-triangular `L` with `P·A = L·U`, `rows x min(rows, cols)`.
    pub fn unit_lower(&self) -> Result<StridedArray> {
        unit_lower_of(&self.lu)
    }

    /// `A⁻¹` by substitution against the identity.
    ///
    /// # Errors
    /// [`StridedError::IllegalState`] if the factorization is not square or
    /// is singular.
    pub fn inverse(&self) -> Result<StridedArray> {
        let n = self.require_square()?;
        let mut rhs = vec![0.0; n * n];
        for i in 0..n {
            rhs[i + i * n] = 1.0;
        }
        self.solve_dense(n, n, &mut rhs)?;
        StridedArray::from_vec(&[n, n], rhs)
    }

    /// Solve `A·X = B` for `X`. `B` is a vector of length `n` or an `n x k`
    /// matrix; the result has the shape of `B`.
    ///
    /// # Errors
    /// [`StridedError::IllegalState`] for a non-square or singular
    /// factorization, [`StridedError::NonConformant`] if `B` has the wrong
    /// number of rows.
    pub fn solve(&self, b: &StridedArray) -> Result<StridedArray> {
        let n = self.require_square()?;
        let k = match b.ndim() {
            1 => 1,
            2 => b.dims()[1],
            _ => return Err(StridedError::non_conformant(self.lu.dims(), b.dims())),
        };
        if b.dims()[0] != n {
            return Err(StridedError::non_conformant(self.lu.dims(), b.dims()));
        }
        let mut rhs = b.to_vec::<f64>();
        self.solve_dense(n, k, &mut rhs)?;
        StridedArray::from_vec(b.dims(), rhs)
    }

    fn solve_dense(&self, n: usize, k: usize, rhs: &mut [f64]) -> Result<()> {
        if !self.is_non_singular()? {
            return Err(StridedError::illegal_state("matrix is singular"));
        }
        let lu = self.lu.to_vec::<f64>();
        lu_solve_in_place(&lu, &self.pivots, n, k, rhs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portable_backend;
    use approx::assert_relative_eq;

    fn reference() -> StridedArray {
        StridedArray::from_row_major(
            &[4, 4],
            &[0., 2., 0., 1., 2., 2., 3., 2., 4., -3., 0., 1., 6., 1., -6., -5.],
        )
        .unwrap()
    }

    #[test]
    fn test_reference_determinant_and_pivots() {
        let lu = LuDecomposition::new(portable_backend(), &reference()).unwrap();
        assert_eq!(lu.pivots(), &[3, 2, 2, 3]);
        assert_relative_eq!(lu.determinant().unwrap(), -234.0, epsilon = 1e-9);
        assert!(lu.is_non_singular().unwrap());
        // second call hits the cache
        assert_relative_eq!(lu.determinant().unwrap(), -234.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mirrored_lower_and_upper() {
        let lu = LuDecomposition::new(portable_backend(), &reference()).unwrap();
        let lower = lu.lower().unwrap();
        let row0 = lower.row(0).unwrap().to_vec::<f64>();
        assert_relative_eq!(row0[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(row0[1], -6.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(row0[2], 8.0 / 25.0, epsilon = 1e-12);
        assert_relative_eq!(row0[3], 1.0, epsilon = 1e-12);
        assert_eq!(lower.row(3).unwrap().to_vec::<f64>(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(lower.get::<f64>(&[2, 0]).unwrap(), 2.0 / 3.0, epsilon = 1e-12);

        let upper = lu.upper().unwrap();
        assert_eq!(upper.row(0).unwrap().to_vec::<f64>(), vec![6., 1., -6., -5.]);
        assert_eq!(upper.get::<f64>(&[3, 0]).unwrap(), 0.0);
        assert_relative_eq!(upper.get::<f64>(&[3, 3]).unwrap(), 39.0 / 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_accessors_are_independent_copies() {
        let lu = LuDecomposition::new(portable_backend(), &reference()).unwrap();
        let u = lu.upper().unwrap();
        u.fill(0.0);
        assert_eq!(lu.upper().unwrap().get::<f64>(&[0, 0]).unwrap(), 6.0);
    }

    #[test]
    fn test_unit_lower_reconstructs() {
        let a = reference();
        let lu = LuDecomposition::new(portable_backend(), &a).unwrap();
        let p = lu.permutation().unwrap().to_vec::<f64>();
        let l = lu.unit_lower().unwrap().to_vec::<f64>();
        let u = lu.upper().unwrap().to_vec::<f64>();
        let av = a.to_vec::<f64>();
        for i in 0..4 {
            for j in 0..4 {
                let pa: f64 = (0..4).map(|k| p[i + k * 4] * av[k + j * 4]).sum();
                let lu_ij: f64 = (0..4).map(|k| l[i + k * 4] * u[k + j * 4]).sum();
                assert_relative_eq!(pa, lu_ij, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_inverse_and_solve() {
        let a = reference();
        let lu = LuDecomposition::new(portable_backend(), &a).unwrap();
        let inv = lu.inverse().unwrap();
        assert_relative_eq!(inv.get::<f64>(&[0, 0]).unwrap(), -6.0 / 234.0, epsilon = 1e-12);

        let b = StridedArray::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let x = lu.solve(&b).unwrap();
        assert_eq!(x.dims(), &[4]);
        let xv = x.to_vec::<f64>();
        for i in 0..4 {
            let row: f64 = (0..4).map(|j| a.get::<f64>(&[i, j]).unwrap() * xv[j]).sum();
            assert_relative_eq!(row, b.get_linear::<f64>(i).unwrap(), epsilon = 1e-10);
        }

        let wrong = StridedArray::from_slice(&[1.0, 2.0]);
        assert!(matches!(lu.solve(&wrong), Err(StridedError::NonConformant { .. })));
    }

    #[test]
    fn test_from_factors_validates_pivots() {
        let f = portable_backend().linalg().getrf(&reference()).unwrap();
        let lu = LuDecomposition::from_factors(f.lu.copy(), f.ipiv.clone()).unwrap();
        assert_relative_eq!(lu.determinant().unwrap(), -234.0, epsilon = 1e-9);

        assert!(matches!(
            LuDecomposition::from_factors(f.lu.copy(), vec![0, 1]),
            Err(StridedError::Argument(_))
        ));
        assert!(matches!(
            LuDecomposition::from_factors(f.lu.copy(), vec![0, 1, 2, 4]),
            Err(StridedError::Argument(_))
        ));
        let tall = StridedArray::zeros(ElementKind::Double, &[3, 2]).unwrap();
        assert!(LuDecomposition::from_factors(tall.copy(), vec![2, 1]).is_ok());
        assert!(LuDecomposition::from_factors(tall, vec![0, 3]).is_err());
        let flat = StridedArray::zeros(ElementKind::Double, &[4]).unwrap();
        assert!(LuDecomposition::from_factors(flat, vec![0]).is_err());
    }

    #[test]
    fn test_singular_and_rectangular_states() {
        let s = StridedArray::from_row_major(&[2, 2], &[1., 2., 2., 4.]).unwrap();
        let lu = LuDecomposition::new(portable_backend(), &s).unwrap();
        assert!(!lu.is_non_singular().unwrap());
        assert_eq!(lu.determinant().unwrap(), 0.0);
        assert!(matches!(lu.inverse(), Err(StridedError::IllegalState(_))));

        let r = StridedArray::from_row_major(&[2, 3], &[1., 2., 3., 4., 5., 6.]).unwrap();
        let lu = LuDecomposition::new(portable_backend(), &r).unwrap();
        assert!(matches!(lu.determinant(), Err(StridedError::IllegalState(_))));
        assert!(matches!(lu.is_non_singular(), Err(StridedError::IllegalState(_))));
        assert_eq!(lu.upper().unwrap().dims(), &[2, 3]);
        assert_eq!(lu.lower().unwrap().dims(), &[2, 3]);
        assert_eq!(lu.unit_lower().unwrap().dims(), &[2, 2]);
        assert_eq!(lu.permutation().unwrap().dims(), &[2, 2]);
    }
}
