//! Singular value decomposition.

use strided_kernel::Transpose;
use strided_view::{ElementKind, Result, StridedArray};

use crate::backend::Backend;
use crate::MACHINE_EPSILON;

/// `A = U·diag(s)·Vᵀ` with full square `U` (`m x m`) and `V` (`n x n`).
#[derive(Debug, Clone)]
pub struct SvdDecomposition {
    s: StridedArray,
    u: StridedArray,
    v: StridedArray,
}

impl SvdDecomposition {
    /// Decompose `a` with `backend`. The input is not modified.
    pub fn new(backend: &dyn Backend, a: &StridedArray) -> Result<Self> {
        let f = backend.linalg().gesvd(a)?;
        log::debug!("svd via {}: {:?}", backend.name(), a.dims());
        Ok(Self {
            s: StridedArray::from_slice(&f.s),
            u: f.u,
            v: f.vt.transpose().copy(),
        })
    }

    /// Singular values, non-increasing, length `min(m, n)`.
    pub fn s(&self) -> StridedArray {
        self.s.copy()
    }

    /// Left singular vectors as columns.
    pub fn u(&self) -> StridedArray {
        self.u.copy()
    }

    /// Right singular vectors as columns.
    pub fn v(&self) -> StridedArray {
        self.v.copy()
    }

    /// Number of singular values greater than `tol`.
    pub fn rank(&self, tol: f64) -> usize {
        self.s.to_vec::<f64>().iter().filter(|&&s| s > tol).count()
    }

    /// Moore-Penrose pseudo-inverse `V·diag(s)⁺·Uᵀ` (`n x m`).
    ///
    /// Singular values not above `max(m, n)·ε·s_max` are treated as zero, so
    /// round-off left in the null space of a rank-deficient matrix does not
    /// blow up.
    pub fn pseudo_inverse(&self, backend: &dyn Backend) -> Result<StridedArray> {
        let m = self.u.dims()[0];
        let n = self.v.dims()[0];
        let k = m.min(n);
        let s = self.s.to_vec::<f64>();
        let s_max = s.first().copied().unwrap_or(0.0);
        let cutoff = MACHINE_EPSILON * m.max(n) as f64 * s_max;

        // V[:, :k] with column j scaled by 1/s_j
        let scaled = self.v.view_2d(0, 0, n, k)?.copy();
        for (j, &sj) in s.iter().enumerate() {
            let factor = if sj > cutoff && sj > 0.0 { 1.0 / sj } else { 0.0 };
            backend.routines().scal(factor, &scaled.column(j)?)?;
        }

        let out = StridedArray::zeros(ElementKind::Double, &[n, m])?;
        let u_k = self.u.view_2d(0, 0, m, k)?;
        backend
            .routines()
            .gemm(Transpose::Keep, Transpose::Transpose, 1.0, &scaled, &u_k, 0.0, &out)?;
        Ok(out)
    }
}
