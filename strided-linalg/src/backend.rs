//! Backend abstraction: array factory, routines and factorization primitives.
//!
//! This module defines the [`ArrayFactory`], [`ArrayRoutines`] and
//! [`LinalgRoutines`] traits, the [`Backend`] bundle tying them together, and
//! the process-wide default backend.
//!
//! Every trait method has a portable default body built on `strided_kernel`,
//! so a backend only overrides the operations it accelerates. Whatever a
//! backend overrides must agree with the default within floating tolerance
//! and must reject exactly the same inputs.

use std::cmp::Ordering;
use std::sync::OnceLock;

use rand::RngCore;
use strided_kernel::{blas, Transpose, UnaryOp};
use strided_view::{Complex64, ElementKind, Result, StridedArray, StridedError};

use crate::{factory, portable};

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Creation of new arrays. All results are column-major with fresh storage.
pub trait ArrayFactory: Send + Sync {
    fn zeros(&self, kind: ElementKind, dims: &[usize]) -> Result<StridedArray> {
        StridedArray::zeros(kind, dims)
    }

    /// Array of `kind` with every element set to `value` (coerced).
    fn filled(&self, kind: ElementKind, dims: &[usize], value: f64) -> Result<StridedArray> {
        StridedArray::filled(kind, dims, value)
    }

    fn ones(&self, dims: &[usize]) -> Result<StridedArray> {
        StridedArray::filled(ElementKind::Double, dims, 1.0)
    }

    /// Wrap column-major `data` as a `Double` array.
    fn from_vec(&self, dims: &[usize], data: Vec<f64>) -> Result<StridedArray> {
        StridedArray::from_vec(dims, data)
    }

    fn eye(&self, n: usize) -> Result<StridedArray> {
        factory::eye(n)
    }

    fn linspace(&self, start: f64, end: f64, n: usize) -> Result<StridedArray> {
        factory::linspace(start, end, n)
    }

    fn range(&self, start: i64, end: i64, step: i64) -> Result<StridedArray> {
        factory::range(start, end, step)
    }

    /// Square matrix with `x` on its diagonal, or the diagonal of a matrix.
    fn diag(&self, x: &StridedArray) -> Result<StridedArray> {
        factory::diag(x)
    }
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// Reductions, BLAS-style products, structural and element-wise operations.
///
/// Comparators and element functions are trait objects so that a backend can
/// be used as `&dyn Backend`; real values reach them through the `f64`
/// coercion. Routines on real values reject complex arrays, and the
/// `*_long` and `*_complex` forms keep integer and complex values exact.
pub trait ArrayRoutines: Send + Sync {
    // Reductions

    fn sum(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::sum(x)
    }

    fn mean(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::mean(x)
    }

    /// Sample variance.
    fn var(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::var(x)
    }

    fn std(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::std(x)
    }

    fn min(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::min(x)
    }

    fn max(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::max(x)
    }

    fn prod(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::prod(x)
    }

    /// Exact sum of an integer array; overflow is an error.
    fn sum_long(&self, x: &StridedArray) -> Result<i64> {
        strided_kernel::sum_long(x)
    }

    fn prod_long(&self, x: &StridedArray) -> Result<i64> {
        strided_kernel::prod_long(x)
    }

    fn min_long(&self, x: &StridedArray) -> Result<i64> {
        strided_kernel::min_long(x)
    }

    fn max_long(&self, x: &StridedArray) -> Result<i64> {
        strided_kernel::max_long(x)
    }

    fn sum_complex(&self, x: &StridedArray) -> Complex64 {
        strided_kernel::sum_complex(x)
    }

    fn prod_complex(&self, x: &StridedArray) -> Complex64 {
        strided_kernel::prod_complex(x)
    }

    fn mean_complex(&self, x: &StridedArray) -> Complex64 {
        strided_kernel::mean_complex(x)
    }

    fn cumsum(&self, x: &StridedArray) -> Result<StridedArray> {
        strided_kernel::cumsum(x)
    }

    fn sum_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::sum_axis(x, axis)
    }

    fn mean_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::mean_axis(x, axis)
    }

    fn var_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::var_axis(x, axis)
    }

    fn std_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::std_axis(x, axis)
    }

    fn min_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::min_axis(x, axis)
    }

    fn max_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::max_axis(x, axis)
    }

    fn prod_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::prod_axis(x, axis)
    }

    fn cumsum_axis(&self, x: &StridedArray, axis: usize) -> Result<StridedArray> {
        strided_kernel::cumsum_axis(x, axis)
    }

    fn argmax(&self, x: &StridedArray) -> Result<usize> {
        strided_kernel::argmax(x)
    }

    fn argmin(&self, x: &StridedArray) -> Result<usize> {
        strided_kernel::argmin(x)
    }

    fn trace(&self, x: &StridedArray) -> Result<f64> {
        strided_kernel::trace(x)
    }

    // BLAS-style

    fn dot(&self, x: &StridedArray, y: &StridedArray) -> Result<f64> {
        blas::dot(x, y)
    }

    /// `Σ xᵢ·yᵢ` in complex arithmetic.
    fn dotu(&self, x: &StridedArray, y: &StridedArray) -> Result<Complex64> {
        blas::dotu(x, y)
    }

    /// `Σ conj(xᵢ)·yᵢ`.
    fn dotc(&self, x: &StridedArray, y: &StridedArray) -> Result<Complex64> {
        blas::dotc(x, y)
    }

    fn nrm2(&self, x: &StridedArray) -> f64 {
        blas::nrm2(x)
    }

    fn asum(&self, x: &StridedArray) -> f64 {
        blas::asum(x)
    }

    fn iamax(&self, x: &StridedArray) -> Result<usize> {
        blas::iamax(x)
    }

    fn scal(&self, alpha: f64, x: &StridedArray) -> Result<()> {
        blas::scal(alpha, x)
    }

    /// `y ← α·x + y`.
    fn axpy(&self, alpha: f64, x: &StridedArray, y: &StridedArray) -> Result<()> {
        blas::axpy(alpha, x, y)
    }

    /// `y ← α·op(A)·x + β·y`.
    fn gemv(
        &self,
        trans: Transpose,
        alpha: f64,
        a: &StridedArray,
        x: &StridedArray,
        beta: f64,
        y: &StridedArray,
    ) -> Result<()> {
        blas::gemv(trans, alpha, a, x, beta, y)
    }

    /// `A ← α·x·yᵀ + A`.
    fn ger(&self, alpha: f64, x: &StridedArray, y: &StridedArray, a: &StridedArray) -> Result<()> {
        blas::ger(alpha, x, y, a)
    }

    /// `C ← α·op(A)·op(B) + β·C`.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: &StridedArray,
        b: &StridedArray,
        beta: f64,
        c: &StridedArray,
    ) -> Result<()> {
        blas::gemm(trans_a, trans_b, alpha, a, b, beta, c)
    }

    /// `op(A)·op(B)` into a new array.
    fn matmul(
        &self,
        trans_a: Transpose,
        a: &StridedArray,
        trans_b: Transpose,
        b: &StridedArray,
    ) -> Result<StridedArray> {
        let (m, k) = blas::op_dims(a, trans_a)?;
        let (kb, n) = blas::op_dims(b, trans_b)?;
        if k != kb {
            return Err(StridedError::non_conformant(&[m, k], &[kb, n]));
        }
        let c = StridedArray::zeros(ElementKind::Double, &[m, n])?;
        self.gemm(trans_a, trans_b, 1.0, a, b, 0.0, &c)?;
        Ok(c)
    }

    // Structural

    fn repeat(&self, x: &StridedArray, n: usize) -> Result<StridedArray> {
        strided_kernel::repeat(x, n)
    }

    fn repmat(&self, x: &StridedArray, r: usize, c: usize) -> Result<StridedArray> {
        strided_kernel::repmat(x, r, c)
    }

    fn take(&self, x: &StridedArray, n: usize) -> Result<StridedArray> {
        strided_kernel::take(x, n)
    }

    fn take_indices(&self, x: &StridedArray, indices: &[usize]) -> Result<StridedArray> {
        strided_kernel::take_indices(x, indices)
    }

    fn vsplit(&self, x: &StridedArray, parts: usize) -> Result<Vec<StridedArray>> {
        strided_kernel::vsplit(x, parts)
    }

    fn vstack(&self, arrays: &[StridedArray]) -> Result<StridedArray> {
        strided_kernel::vstack(arrays)
    }

    fn hsplit(&self, x: &StridedArray, parts: usize) -> Result<Vec<StridedArray>> {
        strided_kernel::hsplit(x, parts)
    }

    fn hstack(&self, arrays: &[StridedArray]) -> Result<StridedArray> {
        strided_kernel::hstack(arrays)
    }

    fn shuffle(&self, x: &StridedArray, rng: &mut dyn RngCore) -> Result<StridedArray> {
        strided_kernel::shuffle(x, rng)
    }

    fn sort(&self, x: &StridedArray) -> Result<()> {
        strided_kernel::sort(x)
    }

    fn sort_by(&self, x: &StridedArray, cmp: &mut dyn FnMut(f64, f64) -> Ordering) -> Result<()> {
        strided_kernel::sort_by::<f64, _>(x, |a, b| cmp(*a, *b))
    }

    fn sort_axis(
        &self,
        x: &StridedArray,
        axis: usize,
        cmp: &mut dyn FnMut(f64, f64) -> Ordering,
    ) -> Result<()> {
        strided_kernel::sort_axis::<f64, _>(x, axis, |a, b| cmp(*a, *b))
    }

    /// Argsort of the linear order.
    fn order(&self, x: &StridedArray, cmp: &mut dyn FnMut(f64, f64) -> Ordering) -> Vec<usize> {
        strided_kernel::order::<f64, _>(x, |a, b| cmp(*a, *b))
    }

    fn copy(&self, from: &StridedArray, to: &StridedArray) -> Result<()> {
        strided_kernel::copy(from, to)
    }

    fn swap(&self, a: &StridedArray, b: &StridedArray) -> Result<()> {
        strided_kernel::swap(a, b)
    }

    // Element-wise

    fn map(&self, x: &StridedArray, f: &dyn Fn(f64) -> f64) -> Result<StridedArray> {
        strided_kernel::map(x, f)
    }

    fn map_complex(
        &self,
        x: &StridedArray,
        f: &dyn Fn(Complex64) -> Complex64,
    ) -> Result<StridedArray> {
        strided_kernel::map_complex(x, f)
    }

    /// `sin`, `exp`, `sqrt`, `abs`, `round` and the other math functions.
    fn unary(&self, x: &StridedArray, op: UnaryOp) -> Result<StridedArray> {
        strided_kernel::unary(x, op)
    }

    fn zip_map(
        &self,
        a: &StridedArray,
        b: &StridedArray,
        f: &dyn Fn(f64, f64) -> f64,
    ) -> Result<StridedArray> {
        strided_kernel::zip_map(a, b, f)
    }

    fn add(&self, a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
        strided_kernel::add(a, b)
    }

    fn sub(&self, a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
        strided_kernel::sub(a, b)
    }

    fn mul(&self, a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
        strided_kernel::mul(a, b)
    }

    fn div(&self, a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
        strided_kernel::div(a, b)
    }
}

// ---------------------------------------------------------------------------
// Factorization primitives
// ---------------------------------------------------------------------------

/// Output of [`LinalgRoutines::getrf`].
#[derive(Debug, Clone)]
pub struct Getrf {
    /// Combined factor: unit-lower `L` strictly below the diagonal, `U` on
    /// and above it. Same shape as the input.
    pub lu: StridedArray,
    /// Row interchanges as a 0-based swap sequence: row `i` was exchanged
    /// with row `ipiv[i]`. Length `min(rows, cols)`.
    pub ipiv: Vec<usize>,
    /// 0 on success, otherwise `k` where `U[k-1, k-1]` is exactly zero.
    pub info: usize,
}

/// Output of [`LinalgRoutines::gesvd`].
#[derive(Debug, Clone)]
pub struct Gesvd {
    /// Singular values, non-negative and non-increasing. Length `min(m, n)`.
    pub s: Vec<f64>,
    /// Left singular vectors, `m x m`.
    pub u: StridedArray,
    /// Transposed right singular vectors, `n x n`.
    pub vt: StridedArray,
}

/// Output of [`LinalgRoutines::geqrf`]: Householder QR in compact form.
#[derive(Debug, Clone)]
pub struct Geqrf {
    /// `R` on and above the diagonal, reflector vectors below it (the unit
    /// leading entry is implicit). Same shape as the input.
    pub qr: StridedArray,
    /// Reflector scales, length `min(m, n)`.
    pub tau: Vec<f64>,
}

/// Output of [`LinalgRoutines::qr`].
#[derive(Debug, Clone)]
pub struct Qr {
    /// Orthogonal `m x m` factor.
    pub q: StridedArray,
    /// Upper-trapezoidal `m x n` factor with a non-negative diagonal.
    pub r: StridedArray,
}

/// Output of [`LinalgRoutines::syev`].
#[derive(Debug, Clone)]
pub struct Syev {
    /// Eigenvalues in ascending order.
    pub w: Vec<f64>,
    /// Orthonormal eigenvectors, column `j` belongs to `w[j]`.
    pub z: StridedArray,
}

/// Output of [`LinalgRoutines::geev`].
#[derive(Debug, Clone)]
pub struct Geev {
    /// Eigenvalues ordered by real part, then imaginary part.
    pub w: Vec<Complex64>,
    /// Right eigenvectors as a `Complex` `n x n` array, column `j` belongs
    /// to `w[j]`.
    pub v: StridedArray,
}

/// Output of [`LinalgRoutines::gelsy`].
#[derive(Debug, Clone)]
pub struct Gelsy {
    /// Minimum-norm least-squares solution, `n` or `n x k` like `B`.
    pub x: StridedArray,
    /// Effective rank of `A` under the cutoff.
    pub rank: usize,
}

/// Which side of `C` an orthogonal factor multiplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// LAPACK-style factorizations. The input is never modified.
pub trait LinalgRoutines: Send + Sync {
    /// LU factorization with partial pivoting.
    fn getrf(&self, a: &StridedArray) -> Result<Getrf> {
        portable::getrf(a)
    }

    /// Full singular value decomposition `A = U·diag(s)·Vᵀ`.
    fn gesvd(&self, a: &StridedArray) -> Result<Gesvd> {
        portable::gesvd(a)
    }

    /// Householder QR in LAPACK's compact form.
    fn geqrf(&self, a: &StridedArray) -> Result<Geqrf> {
        portable::geqrf(a)
    }

    /// `op(Q)·C` (`Side::Left`) or `C·op(Q)` (`Side::Right`) for the `Q` of
    /// a [`geqrf`](Self::geqrf) result, as a new array.
    fn ormqr(
        &self,
        side: Side,
        trans: Transpose,
        f: &Geqrf,
        c: &StridedArray,
    ) -> Result<StridedArray> {
        portable::ormqr(side, trans, f, c)
    }

    /// Explicit QR `A = Q·R`, normalized so that `R` has a non-negative
    /// diagonal.
    fn qr(&self, a: &StridedArray) -> Result<Qr> {
        portable::qr(a)
    }

    /// Eigendecomposition of a symmetric matrix, reading its lower triangle.
    fn syev(&self, a: &StridedArray) -> Result<Syev> {
        portable::syev(a)
    }

    /// Eigendecomposition of a general square matrix.
    ///
    /// The portable default handles symmetric input only and reports
    /// [`StridedError::IllegalState`] otherwise.
    fn geev(&self, a: &StridedArray) -> Result<Geev> {
        portable::geev(a)
    }

    /// Minimum-norm least-squares solution of `A·X ≈ B`.
    ///
    /// Singular values at or below `rcond·s_max` count as zero; a negative
    /// `rcond` stands for `max(m, n)·ε`. Built on [`gesvd`](Self::gesvd).
    fn gelsy(&self, a: &StridedArray, b: &StridedArray, rcond: f64) -> Result<Gelsy> {
        let svd = self.gesvd(a)?;
        portable::least_squares(&svd, a, b, rcond)
    }
}

// ---------------------------------------------------------------------------
// Backend bundle and default selection
// ---------------------------------------------------------------------------

/// A stateless computation strategy.
///
/// Consumers receive `&dyn Backend` explicitly; [`default_backend`] is only
/// the fallback for callers without an opinion.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;
    fn factory(&self) -> &dyn ArrayFactory;
    fn routines(&self) -> &dyn ArrayRoutines;
    fn linalg(&self) -> &dyn LinalgRoutines;
}

impl std::fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("name", &self.name()).finish()
    }
}

static DEFAULT: OnceLock<&'static dyn Backend> = OnceLock::new();

static PORTABLE: portable::PortableBackend = portable::PortableBackend;

#[cfg(feature = "native")]
static NATIVE: crate::native::NativeBackend = crate::native::NativeBackend;

/// The pure-Rust backend.
pub fn portable_backend() -> &'static dyn Backend {
    &PORTABLE
}

/// The faer-backed backend.
#[cfg(feature = "native")]
pub fn native_backend() -> &'static dyn Backend {
    &NATIVE
}

/// The backend preferred by the enabled features.
///
/// - `native` -> the faer backend
/// - otherwise -> the portable backend
fn preferred_backend() -> &'static dyn Backend {
    #[cfg(feature = "native")]
    {
        native_backend()
    }
    #[cfg(not(feature = "native"))]
    {
        portable_backend()
    }
}

/// Process-wide default backend, fixed on first use.
pub fn default_backend() -> &'static dyn Backend {
    *DEFAULT.get_or_init(|| {
        let backend = preferred_backend();
        log::debug!("default backend initialized: {}", backend.name());
        backend
    })
}

/// Install the process-wide default backend.
///
/// # Errors
/// [`StridedError::IllegalState`] once a default is in place, either from an
/// earlier install or because [`default_backend`] was already called.
pub fn install_default(backend: &'static dyn Backend) -> Result<()> {
    DEFAULT.set(backend).map_err(|_| {
        let current = DEFAULT.get().map(|b| b.name()).unwrap_or("unknown");
        log::warn!(
            "rejected default backend {}: {} is already installed",
            backend.name(),
            current
        );
        StridedError::illegal_state(format!(
            "default backend already set to {current}"
        ))
    })?;
    log::debug!("default backend installed: {}", backend.name());
    Ok(())
}
