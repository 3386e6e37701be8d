//! Portable routines over dynamic-rank strided arrays.
//!
//! Every routine here works directly on [`StridedArray`] storage and is the
//! reference behavior that optimized backends must reproduce.
//!
//! # Element-wise
//!
//! - [`map`], [`map_inplace`], [`zip_map`], [`zip_map_into`], [`compare`]
//!   over real values, [`map_complex`] and [`zip_map_complex`] over complex
//! - [`add`], [`sub`], [`mul`], [`div`] with numpy-style broadcasting, in the
//!   promoted kind of the operands
//! - [`unary`] with [`UnaryOp`]: [`sin`], [`exp`], [`ln`], [`sqrt`], [`abs`],
//!   [`round`] and the rest of the math family
//!
//! # Reductions
//!
//! - [`sum`], [`mean`], [`var`], [`std`], [`min`], [`max`], [`prod`], [`cumsum`]
//! - exact integer forms [`sum_long`], [`prod_long`], [`min_long`], [`max_long`]
//! - complex forms [`sum_complex`], [`prod_complex`], [`mean_complex`]
//! - per-axis variants ([`sum_axis`] and friends) built on [`reduce_axis`]
//! - [`argmax`], [`argmin`], [`trace`]
//!
//! # BLAS-style
//!
//! - [`blas::dot`], [`blas::dotu`], [`blas::dotc`], [`blas::nrm2`], [`blas::asum`],
//!   [`blas::iamax`], [`blas::scal`], [`blas::axpy`], [`blas::gemv`], [`blas::ger`],
//!   [`blas::gemm`]
//!
//! # Structural
//!
//! - [`repeat`], [`repmat`], [`take`], [`take_indices`], stacking and splitting
//! - [`shuffle`], [`sort`], [`sort_by`], [`sort_axis`], [`order`]
//!
//! # Utilities
//!
//! - [`quick_sort`]: index-based external quicksort
//! - [`without_replacement`]: reservoir sampling
//!
//! # Example
//!
//! ```rust
//! use strided_kernel::{add, sum, StridedArray};
//!
//! let col = StridedArray::from_vec(&[3, 1], vec![1.0, 2.0, 3.0]).unwrap();
//! let row = StridedArray::from_slice(&[10.0, 20.0]);
//! let grid = add(&col, &row).unwrap();
//! assert_eq!(grid.dims(), &[3, 2]);
//! assert_eq!(sum(&grid).unwrap(), 102.0);
//! ```

pub mod blas;
pub mod map_view;
pub mod ops_view;
pub mod reduce_view;
pub mod sample;
pub mod sort;

pub use blas::Transpose;
pub use map_view::{
    abs, acos, add, asin, atan, cbrt, ceil, compare, cos, cosh, div, exp, floor, ln, log10, log2,
    map, map_complex, map_inplace, mul, neg, round, signum, sin, sinh, sqrt, sub, tan, tanh,
    unary, zip_map, zip_map_complex, zip_map_into, UnaryOp,
};
pub use ops_view::{
    copy, hsplit, hstack, order, repeat, repmat, shuffle, sort, sort_axis, sort_by, swap, take,
    take_indices, vsplit, vstack,
};
pub use reduce_view::{
    argmax, argmin, cumsum, cumsum_axis, for_each_indexed, max, max_axis, max_long, mean,
    mean_axis, mean_complex, min, min_axis, min_long, prod, prod_axis, prod_complex, prod_long,
    reduce, reduce_axis, std, std_axis, sum, sum_axis, sum_complex, sum_long, trace, var,
    var_axis,
};
pub use sample::{without_replacement, without_replacement_default};
pub use sort::{quick_sort, sort_indexed};

pub use strided_view::{Complex64, ElementKind, Result, StridedArray, StridedError};
