//! Shared element definitions for the strided workspace.
//!
//! This crate provides the element kinds a storage buffer can hold and the
//! coercion rules between them. They are shared across `strided-view`,
//! `strided-kernel` and `strided-linalg`.

pub mod element;

pub use element::{Element, ElementKind};
pub use num_complex::Complex64;
