//! Eigendecomposition of square matrices.

use strided_view::{Complex64, ElementKind, Result, StridedArray, StridedError};

use crate::backend::Backend;
use crate::RANK_EPSILON;

/// `A·V = V·diag(λ)` for a square matrix `A`.
///
/// Eigenvalues are ordered by real part, then imaginary part. Eigenvectors
/// are the columns of a `Complex` array, each normalized to unit length.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    values: Vec<Complex64>,
    vectors: StridedArray,
}

impl EigenDecomposition {
    /// General eigendecomposition through the backend's `geev`.
    ///
    /// # Errors
    /// [`StridedError::Argument`] for non-square input. The portable backend
    /// reports [`StridedError::IllegalState`] for non-symmetric input.
    pub fn new(backend: &dyn Backend, a: &StridedArray) -> Result<Self> {
        let f = backend.linalg().geev(a)?;
        log::debug!("eig via {}: {:?}", backend.name(), a.dims());
        Ok(Self {
            values: f.w,
            vectors: f.v,
        })
    }

    /// Eigendecomposition of a symmetric matrix, reading its lower triangle.
    pub fn symmetric(backend: &dyn Backend, a: &StridedArray) -> Result<Self> {
        let f = backend.linalg().syev(a)?;
        log::debug!("eigh via {}: {:?}", backend.name(), a.dims());
        Ok(Self {
            values: f.w.into_iter().map(|x| Complex64::new(x, 0.0)).collect(),
            vectors: f.z.to_kind(ElementKind::Complex),
        })
    }

    /// Eigenvalues as a `Complex` vector.
    pub fn eigenvalues(&self) -> StridedArray {
        StridedArray::from_slice(&self.values)
    }

    pub fn eigenvectors(&self) -> StridedArray {
        self.vectors.copy()
    }

    /// True when no eigenvalue has an imaginary part above
    /// [`RANK_EPSILON`] relative to the spectral radius.
    pub fn is_real(&self) -> bool {
        let radius = self.values.iter().map(|z| z.norm()).fold(1.0f64, f64::max);
        self.values.iter().all(|z| z.im.abs() <= RANK_EPSILON * radius)
    }

    /// Real parts of the eigenvalues.
    ///
    /// # Errors
    /// [`StridedError::IllegalState`] if the spectrum is not real.
    pub fn real_eigenvalues(&self) -> Result<Vec<f64>> {
        if !self.is_real() {
            return Err(StridedError::illegal_state("matrix has complex eigenvalues"));
        }
        Ok(self.values.iter().map(|z| z.re).collect())
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
    fn test_symmetric_spectrum() {
        let a = matrix(3, 3, &[2., -1., 0., -1., 2., -1., 0., -1., 2.]);
        let eig = EigenDecomposition::symmetric(portable_backend(), &a).unwrap();
        assert!(eig.is_real());
        let w = eig.real_eigenvalues().unwrap();
        let root2 = 2f64.sqrt();
        for (got, want) in w.iter().zip([2.0 - root2, 2.0, 2.0 + root2]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        let v = eig.eigenvectors();
        assert_eq!(v.kind(), ElementKind::Complex);
        assert_eq!(v.dims(), &[3, 3]);
        assert_eq!(eig.eigenvalues().kind(), ElementKind::Complex);
    }

    #[test]
    fn test_general_on_portable_backend() {
        let sym = matrix(2, 2, &[1., 2., 2., 1.]);
        let eig = EigenDecomposition::new(portable_backend(), &sym).unwrap();
        let w = eig.real_eigenvalues().unwrap();
        assert_relative_eq!(w[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(w[1], 3.0, epsilon = 1e-12);

        let rotation = matrix(2, 2, &[0., -1., 1., 0.]);
        assert!(matches!(
            EigenDecomposition::new(portable_backend(), &rotation),
            Err(StridedError::IllegalState(_))
        ));
    }

    #[test]
    fn test_complex_spectrum_is_not_real() {
        let eig = EigenDecomposition {
            values: vec![Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0)],
            vectors: StridedArray::zeros(ElementKind::Complex, &[2, 2]).unwrap(),
        };
        assert!(!eig.is_real());
        assert!(matches!(
            eig.real_eigenvalues(),
            Err(StridedError::IllegalState(_))
        ));
    }
}
