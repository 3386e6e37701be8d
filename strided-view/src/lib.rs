//! Shared storage and strided array views.
//!
//! # Core Types
//!
//! - [`Storage`]: homogeneous, fixed-size buffer shared by reference count
//! - [`StridedArray`]: `(dims, strides, offset)` view over a [`Storage`]
//! - [`StridedError`]: the error type of the whole workspace
//!
//! # Shape/stride engine
//!
//! - [`layout`]: pure stride arithmetic (reshape, broadcast, bounds)
//! - [`concatenate`], [`split`], [`split_even`]: copying joins along an axis
//!
//! # Example
//!
//! ```rust
//! use strided_view::{SliceSpec, StridedArray};
//!
//! let a = StridedArray::from_fn(&[3, 4], |idx| (idx[0] * 10 + idx[1]) as f64).unwrap();
//! let block = a.slice(&[SliceSpec::range(1..3), SliceSpec::Full]).unwrap();
//! block.set(&[0, 0], -1.0).unwrap();
//! assert_eq!(a.get::<f64>(&[1, 0]).unwrap(), -1.0);
//! ```

mod error;
pub mod index;
pub mod join;
pub mod layout;
pub mod storage;
pub mod view;

pub use error::{Result, StridedError};
pub use index::{MultiIndex, SliceSpec};
pub use join::{concatenate, split, split_even};
pub use layout::{broadcast_shape, col_major_strides, row_major_strides};
pub use storage::Storage;
pub use view::StridedArray;

pub use strided_traits::{dispatch_kind, Complex64, Element, ElementKind};
