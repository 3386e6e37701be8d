//! Backends and matrix decompositions for strided arrays.
//!
//! # Backends
//!
//! A [`Backend`] bundles an [`ArrayFactory`], an [`ArrayRoutines`] set and the
//! [`LinalgRoutines`] factorization primitives. Two are provided:
//!
//! - [`PortableBackend`]: pure Rust, always available
//! - `NativeBackend`: products and factorizations through faer (feature `native`)
//!
//! Both agree within floating tolerance. [`default_backend`] returns the
//! process-wide default, which [`install_default`] may replace once before
//! first use.
//!
//! # Decompositions
//!
//! - [`LuDecomposition`]: `P·A = L·U` with cached determinant and factors
//! - [`SvdDecomposition`]: `A = U·diag(s)·Vᵀ`
//! - [`QrDecomposition`]: `A = Q·R` with least-squares solves
//! - [`EigenDecomposition`]: general (`geev`) and symmetric (`syev`) spectra
//! - helpers [`lu`], [`svd`], [`qr`], [`eig`], [`eigh`], [`inv`], [`pinv`],
//!   [`det`], [`rank`], [`solve`], [`lstsq`]
//!
//! The portable backend solves symmetric eigenproblems only; a general
//! spectrum needs `NativeBackend`.
//!
//! # Example
//!
//! ```rust
//! use strided_linalg::{det, portable_backend};
//! use strided_view::StridedArray;
//!
//! let a = StridedArray::from_row_major(&[2, 2], &[4.0, 3.0, 6.0, 3.0]).unwrap();
//! let d = det(portable_backend(), &a).unwrap();
//! assert!((d + 6.0).abs() < 1e-12);
//! ```

pub mod backend;
pub mod eigen;
pub mod factory;
pub mod lu;
#[cfg(feature = "native")]
pub mod native;
pub mod portable;
pub mod qr;
pub mod solve;
pub mod svd;

pub use backend::{
    default_backend, install_default, portable_backend, ArrayFactory, ArrayRoutines, Backend,
    Geev, Gelsy, Geqrf, Gesvd, Getrf, LinalgRoutines, Qr, Side, Syev,
};
pub use eigen::EigenDecomposition;
#[cfg(feature = "native")]
pub use backend::native_backend;
pub use lu::LuDecomposition;
#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use portable::PortableBackend;
pub use qr::QrDecomposition;
pub use solve::{det, eig, eigh, inv, lstsq, lu, pinv, qr, rank, solve, svd};
pub use svd::SvdDecomposition;

pub use strided_kernel::Transpose;
pub use strided_view::{Result, StridedError};

/// Relative cutoff of the pseudo-inverse: singular values at or below
/// `max(m, n)·MACHINE_EPSILON·s_max` are dropped.
pub const MACHINE_EPSILON: f64 = f64::EPSILON;

/// Singular values above this count towards [`rank`].
pub const RANK_EPSILON: f64 = 1e-10;
