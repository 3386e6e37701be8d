//! Strided arrays over shared storage, with pluggable computation backends.
//!
//! This crate re-exports the workspace:
//!
//! - [`strided_traits`]: element kinds and the cross-kind coercion table
//! - [`strided_view`]: [`Storage`], [`StridedArray`] views and the shape/stride engine
//! - [`strided_kernel`]: portable element-wise, reduction, BLAS-style and
//!   structural routines, the index quicksort and reservoir sampling
//! - [`strided_linalg`]: [`Backend`]s and the LU, SVD, QR and eigen
//!   decompositions
//!
//! # Core Types
//!
//! - [`StridedArray`]: `(dims, strides, offset)` over a reference-counted [`Storage`]
//! - [`ElementKind`]: bool, int, long, double or complex storage
//! - [`StridedError`]: the single error type, with [`Result`]
//!
//! # Feature flags
//!
//! - `native` (default): faer-backed products and factorizations, general
//!   (non-symmetric) eigenproblems, and the default backend
//! - `parallel`: rayon-parallel per-axis reductions
//!
//! # Example
//!
//! ```rust
//! use strided_numeric::{default_backend, LuDecomposition, StridedArray, Transpose};
//!
//! let backend = default_backend();
//! let a = StridedArray::from_row_major(&[2, 2], &[2.0, 1.0, 1.0, 3.0]).unwrap();
//!
//! let lu = LuDecomposition::new(backend, &a).unwrap();
//! assert!((lu.determinant().unwrap() - 5.0).abs() < 1e-12);
//!
//! let inv = lu.inverse().unwrap();
//! let eye = backend
//!     .routines()
//!     .matmul(Transpose::Keep, &a, Transpose::Keep, &inv)
//!     .unwrap();
//! assert!((eye.get::<f64>(&[0, 0]).unwrap() - 1.0).abs() < 1e-12);
//! assert!(eye.get::<f64>(&[1, 0]).unwrap().abs() < 1e-12);
//! ```
//!
//! # Views alias storage
//!
//! ```rust
//! use strided_numeric::{SliceSpec, StridedArray};
//!
//! let a = StridedArray::from_fn(&[3, 4], |idx| (idx[0] * 4 + idx[1]) as f64).unwrap();
//! let t = a.transpose();
//! let block = t.slice(&[SliceSpec::range(1..3), SliceSpec::Full]).unwrap();
//! block.fill(0.0);
//! assert_eq!(a.get::<f64>(&[2, 1]).unwrap(), 0.0);
//! assert_eq!(a.get::<f64>(&[2, 0]).unwrap(), 8.0);
//! ```

pub use strided_kernel;
pub use strided_linalg;
pub use strided_traits;
pub use strided_view;

pub use strided_traits::{dispatch_kind, Complex64, Element, ElementKind};
pub use strided_view::{
    broadcast_shape, concatenate, layout, split, split_even, MultiIndex, Result, SliceSpec,
    Storage, StridedArray, StridedError,
};

pub use strided_kernel::{
    abs, acos, add, argmax, argmin, asin, atan, blas, cbrt, ceil, compare, copy, cos, cosh,
    cumsum, cumsum_axis, div, exp, floor, hsplit, hstack, ln, log10, log2, map, map_complex,
    map_inplace, max, max_axis, max_long, mean, mean_axis, mean_complex, min, min_axis, min_long,
    mul, neg, order, prod, prod_axis, prod_complex, prod_long, quick_sort, repeat, repmat, round,
    shuffle, signum, sin, sinh, sort, sort_axis, sort_by, sort_indexed, sqrt, std, std_axis, sub,
    sum, sum_axis, sum_complex, sum_long, swap, take, take_indices, tan, tanh, trace, unary, var,
    var_axis, vsplit, vstack, without_replacement, without_replacement_default, zip_map,
    zip_map_complex, zip_map_into, Transpose, UnaryOp,
};

pub use strided_linalg::{
    default_backend, det, eig, eigh, install_default, inv, lstsq, lu, pinv, portable_backend, qr,
    rank, solve, svd, ArrayFactory, ArrayRoutines, Backend, EigenDecomposition, Geev, Gelsy,
    Geqrf, Gesvd, Getrf, LinalgRoutines, LuDecomposition, PortableBackend, Qr, QrDecomposition,
    Side, SvdDecomposition, Syev, MACHINE_EPSILON, RANK_EPSILON,
};

#[cfg(feature = "native")]
pub use strided_linalg::{native_backend, NativeBackend};
