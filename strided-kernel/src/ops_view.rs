//! Structural operations on dynamic-rank strided arrays.
//!
//! Tiling, selection, stacking, shuffling, sorting and element transfer.
//! Operations that produce an array return fresh column-major storage of the
//! source's element kind; in-place operations gather their inputs before
//! writing so operands may alias each other.

use std::cell::Cell;
use std::cmp::Ordering;

use rand::Rng;
use strided_view::{
    concatenate, dispatch_kind, split_even, Element, ElementKind, StridedArray, StridedError,
};

use crate::sort::sort_indexed;
use crate::Result;

// ============================================================================
// Tiling and selection
// ============================================================================

/// Each element `n` times in a row, following the linear order. 1-d result.
pub fn repeat(x: &StridedArray, n: usize) -> Result<StridedArray> {
    dispatch_kind!(x.kind(), T => {
        let values: Vec<T> = x
            .to_vec::<T>()
            .into_iter()
            .flat_map(|v| std::iter::repeat(v).take(n))
            .collect();
        Ok(StridedArray::from_slice(&values))
    })
}

/// Tile a matrix `r` times vertically and `c` times horizontally.
///
/// A 1-d input is treated as a single column.
pub fn repmat(x: &StridedArray, r: usize, c: usize) -> Result<StridedArray> {
    let x = if x.ndim() == 1 { x.reshape(&[x.len(), 1])? } else { x.clone() };
    let (rows, cols) = x.require_matrix()?;
    dispatch_kind!(x.kind(), T => {
        let src = x.to_vec::<T>();
        let out_rows = rows * r;
        let out_cols = cols * c;
        let mut values = Vec::with_capacity(out_rows * out_cols);
        for j in 0..out_cols {
            for i in 0..out_rows {
                values.push(src[(i % rows) + (j % cols) * rows]);
            }
        }
        StridedArray::from_vec(&[out_rows, out_cols], values)
    })
}

/// First `n` elements in linear order. 1-d result.
pub fn take(x: &StridedArray, n: usize) -> Result<StridedArray> {
    if n > x.len() {
        return Err(StridedError::argument(format!(
            "cannot take {n} elements from an array of {}",
            x.len()
        )));
    }
    dispatch_kind!(x.kind(), T => {
        let mut values = x.to_vec::<T>();
        values.truncate(n);
        Ok(StridedArray::from_slice(&values))
    })
}

/// Elements at the given linear positions. 1-d result.
pub fn take_indices(x: &StridedArray, indices: &[usize]) -> Result<StridedArray> {
    let len = x.len();
    if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
        return Err(StridedError::IndexOutOfRange { index: bad, len });
    }
    dispatch_kind!(x.kind(), T => {
        let src = x.to_vec::<T>();
        let values: Vec<T> = indices.iter().map(|&i| src[i]).collect();
        Ok(StridedArray::from_slice(&values))
    })
}

// ============================================================================
// Stacking
// ============================================================================

/// Split into `parts` equal blocks of rows.
pub fn vsplit(x: &StridedArray, parts: usize) -> Result<Vec<StridedArray>> {
    split_even(x, parts, 0)
}

/// Stack arrays on top of each other (along axis 0).
pub fn vstack(arrays: &[StridedArray]) -> Result<StridedArray> {
    concatenate(arrays, 0)
}

/// Split into `parts` equal blocks of columns.
pub fn hsplit(x: &StridedArray, parts: usize) -> Result<Vec<StridedArray>> {
    split_even(x, parts, horizontal_axis(x))
}

/// Stack arrays side by side (along axis 1, or axis 0 for 1-d operands).
pub fn hstack(arrays: &[StridedArray]) -> Result<StridedArray> {
    let axis = arrays.first().map(horizontal_axis).unwrap_or(0);
    concatenate(arrays, axis)
}

fn horizontal_axis(x: &StridedArray) -> usize {
    if x.ndim() >= 2 {
        1
    } else {
        0
    }
}

// ============================================================================
// Shuffling and sorting
// ============================================================================

/// Copy of `x` with its elements randomly permuted (Fisher-Yates over the
/// linear order).
pub fn shuffle<R: Rng + ?Sized>(x: &StridedArray, rng: &mut R) -> Result<StridedArray> {
    dispatch_kind!(x.kind(), T => {
        let mut values = x.to_vec::<T>();
        for i in (1..values.len()).rev() {
            let j = rng.gen_range(0..=i);
            values.swap(i, j);
        }
        StridedArray::from_vec(x.dims(), values)
    })
}

/// Sort the elements of `x` in place, in linear order, read as `K`.
pub fn sort_by<K, C>(x: &StridedArray, mut cmp: C) -> Result<()>
where
    K: Element,
    C: FnMut(&K, &K) -> Ordering,
{
    let mut values = x.to_vec::<K>();
    {
        let cells = Cell::from_mut(values.as_mut_slice()).as_slice_of_cells();
        sort_indexed(
            cells.len(),
            |i, j| cmp(&cells[i].get(), &cells[j].get()),
            |i, j| cells[i].swap(&cells[j]),
        );
    }
    x.write_all(&values)
}

/// Sort ascending in place.
///
/// Integer kinds compare exactly, doubles use IEEE total order.
///
/// # Errors
/// [`StridedError::Argument`] for complex arrays, which have no ordering.
pub fn sort(x: &StridedArray) -> Result<()> {
    match x.kind() {
        ElementKind::Bool | ElementKind::Int | ElementKind::Long => {
            sort_by::<i64, _>(x, |a, b| a.cmp(b))
        }
        ElementKind::Double => sort_by::<f64, _>(x, |a, b| a.total_cmp(b)),
        ElementKind::Complex => Err(StridedError::argument("complex values cannot be sorted")),
    }
}

/// Sort every 1-d vector along `axis` independently.
pub fn sort_axis<K, C>(x: &StridedArray, axis: usize, mut cmp: C) -> Result<()>
where
    K: Element,
    C: FnMut(&K, &K) -> Ordering,
{
    for i in 0..x.vectors(axis)? {
        sort_by(&x.vector(axis, i)?, &mut cmp)?;
    }
    Ok(())
}

/// Linear positions of `x` in sorted order (argsort). `x` is left untouched.
pub fn order<K, C>(x: &StridedArray, mut cmp: C) -> Vec<usize>
where
    K: Element,
    C: FnMut(&K, &K) -> Ordering,
{
    let values = x.to_vec::<K>();
    let mut perm: Vec<usize> = (0..values.len()).collect();
    {
        let cells = Cell::from_mut(perm.as_mut_slice()).as_slice_of_cells();
        sort_indexed(
            cells.len(),
            |i, j| cmp(&values[cells[i].get()], &values[cells[j].get()]),
            |i, j| cells[i].swap(&cells[j]),
        );
    }
    perm
}

// ============================================================================
// Transfer
// ============================================================================

/// Copy `from` into `to` element by element in linear order, coercing to
/// the kind of `to`. Shapes may differ as long as the lengths agree.
pub fn copy(from: &StridedArray, to: &StridedArray) -> Result<()> {
    if from.len() != to.len() {
        return Err(StridedError::non_conformant(from.dims(), to.dims()));
    }
    dispatch_kind!(to.kind(), T => to.write_all(&from.to_vec::<T>()))
}

/// Exchange the contents of `a` and `b` in linear order.
pub fn swap(a: &StridedArray, b: &StridedArray) -> Result<()> {
    if a.dims() == b.dims() {
        return a.swap_with(b);
    }
    if a.len() != b.len() {
        return Err(StridedError::non_conformant(a.dims(), b.dims()));
    }
    dispatch_kind!(a.kind(), A => {
        let into_a = b.to_vec::<A>();
        dispatch_kind!(b.kind(), B => {
            let into_b = a.to_vec::<B>();
            a.write_all(&into_a)?;
            b.write_all(&into_b)
        })
    })
}
