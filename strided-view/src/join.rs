//! Concatenation and splitting along an axis.
//!
//! Both operations copy into new column-major storage, and are inverse to
//! each other: `split(&concatenate(parts, axis)?, sizes, axis)` reproduces
//! `parts` when `sizes` are their extents along `axis`.

use crate::index::SliceSpec;
use crate::view::StridedArray;
use crate::{Result, StridedError};

/// Join `arrays` along `axis`.
///
/// All operands must have the same rank and agree on every extent except
/// `axis`. The result has the element kind of the first operand; the others
/// are coerced into it.
///
/// # Errors
/// [`StridedError::Argument`] for an empty list or an invalid axis,
/// [`StridedError::NonConformant`] for mismatched shapes.
pub fn concatenate(arrays: &[StridedArray], axis: usize) -> Result<StridedArray> {
    let first = arrays
        .first()
        .ok_or_else(|| StridedError::argument("cannot concatenate an empty list of arrays"))?;
    let rank = first.ndim();
    if axis >= rank {
        return Err(StridedError::argument(format!(
            "axis {axis} out of range for rank {rank}"
        )));
    }

    let mut out_dims = first.dims().to_vec();
    out_dims[axis] = 0;
    for a in arrays {
        let conforms = a.ndim() == rank
            && a.dims()
                .iter()
                .zip(first.dims().iter())
                .enumerate()
                .all(|(k, (&d, &f))| k == axis || d == f);
        if !conforms {
            return Err(StridedError::non_conformant(first.dims(), a.dims()));
        }
        out_dims[axis] += a.dims()[axis];
    }

    let out = StridedArray::zeros(first.kind(), &out_dims)?;
    let mut start = 0usize;
    for a in arrays {
        let extent = a.dims()[axis];
        let dest = out.slice_axis(axis, SliceSpec::range(start..start + extent))?;
        dest.assign(a)?;
        start += extent;
    }
    Ok(out)
}

/// Split `array` along `axis` into consecutive pieces of the given extents.
///
/// # Errors
/// [`StridedError::Argument`] if `sizes` does not sum to the extent of `axis`.
pub fn split(array: &StridedArray, sizes: &[usize], axis: usize) -> Result<Vec<StridedArray>> {
    if axis >= array.ndim() {
        return Err(StridedError::argument(format!(
            "axis {} out of range for rank {}",
            axis,
            array.ndim()
        )));
    }
    let total: usize = sizes.iter().sum();
    if total != array.dims()[axis] {
        return Err(StridedError::argument(format!(
            "split sizes {:?} do not sum to extent {} of axis {}",
            sizes,
            array.dims()[axis],
            axis
        )));
    }
    let mut start = 0usize;
    let mut parts = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let piece = array.slice_axis(axis, SliceSpec::range(start..start + size))?;
        parts.push(piece.copy());
        start += size;
    }
    Ok(parts)
}

/// Split `array` along `axis` into `parts` pieces of equal extent.
///
/// # Errors
/// [`StridedError::Argument`] if `parts` is zero or does not divide the extent.
pub fn split_even(array: &StridedArray, parts: usize, axis: usize) -> Result<Vec<StridedArray>> {
    if axis >= array.ndim() {
        return Err(StridedError::argument(format!(
            "axis {} out of range for rank {}",
            axis,
            array.ndim()
        )));
    }
    let extent = array.dims()[axis];
    if parts == 0 || extent % parts != 0 {
        return Err(StridedError::argument(format!(
            "cannot split extent {extent} into {parts} equal parts"
        )));
    }
    split(array, &vec![extent / parts; parts], axis)
}
