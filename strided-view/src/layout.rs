//! Pure shape/stride arithmetic.
//!
//! Every function here derives a new `(dims, strides, offset)` description
//! from an existing one without touching element data:
//!
//! - [`col_major_strides`] / [`row_major_strides`]: dense layouts
//! - [`reshape_strides`]: stride-preserving reshape when the layout permits
//! - [`broadcast_shape`] / [`broadcast_strides`]: right-aligned broadcasting
//! - [`validate_bounds`]: the addressability invariant of a view

use crate::{Result, StridedError};

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1].max(1) as isize;
    }
    strides
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1].max(1) as isize;
    }
    strides
}

/// Number of elements described by `dims`, rejecting overflow.
pub fn checked_size(dims: &[usize]) -> Result<usize> {
    dims.iter().try_fold(1usize, |acc, &d| {
        acc.checked_mul(d)
            .ok_or_else(|| StridedError::argument(format!("shape {dims:?} overflows usize")))
    })
}

/// Validate that every multi-index within `dims` maps into `[0, len)`.
pub fn validate_bounds(len: usize, dims: &[usize], strides: &[isize], offset: isize) -> Result<()> {
    if dims.len() != strides.len() {
        return Err(StridedError::argument(format!(
            "{} dimensions but {} strides",
            dims.len(),
            strides.len()
        )));
    }
    // Empty array - no access needed
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let overflow = || StridedError::argument("stride arithmetic overflows isize");
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride.checked_mul(dim as isize - 1).ok_or_else(overflow)?;
            if end >= 0 {
                max_offset = max_offset.checked_add(end).ok_or_else(overflow)?;
            } else {
                min_offset = min_offset.checked_add(end).ok_or_else(overflow)?;
            }
        }
    }
    if min_offset < 0 {
        return Err(StridedError::IndexOutOfRange { index: 0, len });
    }
    if max_offset as usize >= len {
        return Err(StridedError::IndexOutOfRange {
            index: max_offset as usize,
            len,
        });
    }
    Ok(())
}

/// Whether `(dims, strides)` walks memory densely in column-major order.
///
/// Axes of extent one do not affect addressability and are ignored.
pub fn is_col_major_contiguous(dims: &[usize], strides: &[isize]) -> bool {
    let mut expected = 1isize;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim <= 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected = expected.saturating_mul(dim as isize);
    }
    true
}

/// Try to express a reshape of `(dims, strides)` to `new_dims` without copying.
///
/// Reshaping follows the column-major linear order. Returns `None` when some
/// group of merged axes is not contiguous with respect to that order, in
/// which case the caller has to copy.
pub fn reshape_strides(dims: &[usize], strides: &[isize], new_dims: &[usize]) -> Option<Vec<isize>> {
    if dims.iter().any(|&d| d == 0) || new_dims.iter().any(|&d| d == 0) {
        return Some(col_major_strides(new_dims));
    }

    let old: Vec<(usize, isize)> = dims
        .iter()
        .zip(strides.iter())
        .filter(|(&d, _)| d != 1)
        .map(|(&d, &s)| (d, s))
        .collect();

    let mut new_strides = vec![0isize; new_dims.len()];
    if old.is_empty() {
        // Every axis has extent one; any strides address the single element.
        return Some(col_major_strides(new_dims));
    }

    let (mut oi, mut oj) = (0usize, 1usize);
    let (mut ni, mut nj) = (0usize, 1usize);
    while ni < new_dims.len() && oi < old.len() {
        let mut np = new_dims[ni];
        let mut op = old[oi].0;
        while np != op {
            if np < op {
                np *= *new_dims.get(nj)?;
                nj += 1;
            } else {
                op *= old.get(oj)?.0;
                oj += 1;
            }
        }

        // The merged old axes must be contiguous in column-major order
        for ok in oi..oj - 1 {
            if old[ok + 1].1 != old[ok].1 * old[ok].0 as isize {
                return None;
            }
        }

        new_strides[ni] = old[oi].1;
        for nk in ni + 1..nj {
            new_strides[nk] = new_strides[nk - 1] * new_dims[nk - 1] as isize;
        }

        ni = nj;
        nj += 1;
        oi = oj;
        oj += 1;
    }

    // Trailing unit axes
    let last = if ni > 0 {
        new_strides[ni - 1] * new_dims[ni - 1] as isize
    } else {
        1
    };
    for stride in new_strides.iter_mut().skip(ni) {
        *stride = last;
    }
    Some(new_strides)
}

/// Compute the broadcast shape of two operands (right-aligned).
///
/// # Errors
/// [`StridedError::NonConformant`] if some aligned pair of extents differs
/// and neither is one.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let max_rank = a.len().max(b.len());
    let mut result = vec![0usize; max_rank];

    for i in 0..max_rank {
        let a_dim = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let b_dim = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        result[max_rank - 1 - i] = if a_dim == b_dim || b_dim == 1 {
            a_dim
        } else if a_dim == 1 {
            b_dim
        } else {
            return Err(StridedError::non_conformant(a, b));
        };
    }

    Ok(result)
}

/// Strides that make `(dims, strides)` read as an array of shape `target`.
///
/// Missing leading axes and size-1 axes get stride 0.
pub fn broadcast_strides(dims: &[usize], strides: &[isize], target: &[usize]) -> Result<Vec<isize>> {
    if dims.len() > target.len() {
        return Err(StridedError::non_conformant(dims, target));
    }
    let lead = target.len() - dims.len();
    let mut out = vec![0isize; target.len()];
    for (i, &t) in target.iter().enumerate().skip(lead) {
        let d = dims[i - lead];
        if d == t {
            out[i] = strides[i - lead];
        } else if d == 1 {
            out[i] = 0;
        } else {
            return Err(StridedError::non_conformant(dims, target));
        }
    }
    Ok(out)
}

/// Number of elements selected by `start..end` with a positive `step`.
#[inline]
pub fn slice_len(start: usize, end: usize, step: usize) -> usize {
    end.saturating_sub(start).div_ceil(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_major_strides() {
        assert_eq!(col_major_strides(&[3, 4]), vec![1, 3]);
        assert_eq!(col_major_strides(&[2, 3, 4]), vec![1, 2, 6]);
        assert!(col_major_strides(&[]).is_empty());
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_strides(&[3, 4]), vec![4, 1]);
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
    }

    #[test]
    fn test_checked_size() {
        assert_eq!(checked_size(&[2, 3, 4]).unwrap(), 24);
        assert_eq!(checked_size(&[]).unwrap(), 1);
        assert_eq!(checked_size(&[5, 0]).unwrap(), 0);
        assert!(checked_size(&[usize::MAX, 2]).is_err());
    }

    #[test]
    fn test_validate_bounds_ok() {
        assert!(validate_bounds(6, &[2, 3], &[3, 1], 0).is_ok());
        assert!(validate_bounds(6, &[2, 3], &[1, 2], 0).is_ok());
    }

    #[test]
    fn test_validate_bounds_out_of_range() {
        assert!(matches!(
            validate_bounds(5, &[2, 3], &[3, 1], 0),
            Err(StridedError::IndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_validate_bounds_empty_and_offset() {
        assert!(validate_bounds(0, &[0, 3], &[3, 1], 0).is_ok());
        assert!(validate_bounds(7, &[2, 3], &[3, 1], 1).is_ok());
        assert!(validate_bounds(6, &[2, 3], &[3, 1], 1).is_err());
        assert!(validate_bounds(6, &[3], &[-1], 1).is_err());
        assert!(validate_bounds(6, &[3], &[-1], 2).is_ok());
    }

    #[test]
    fn test_contiguity() {
        assert!(is_col_major_contiguous(&[2, 3], &[1, 2]));
        assert!(!is_col_major_contiguous(&[2, 3], &[3, 1]));
        assert!(is_col_major_contiguous(&[1, 3], &[7, 1]));
    }

    #[test]
    fn test_reshape_contiguous_splits_and_merges() {
        assert_eq!(reshape_strides(&[6], &[1], &[2, 3]), Some(vec![1, 2]));
        assert_eq!(reshape_strides(&[2, 3], &[1, 2], &[6]), Some(vec![1]));
        assert_eq!(
            reshape_strides(&[2, 3, 4], &[1, 2, 6], &[6, 4]),
            Some(vec![1, 6])
        );
    }

    #[test]
    fn test_reshape_preserves_outer_stride() {
        // Every other column of a 4x6 column-major matrix
        assert_eq!(
            reshape_strides(&[4, 3], &[1, 8], &[2, 2, 3]),
            Some(vec![1, 2, 8])
        );
    }

    #[test]
    fn test_reshape_rejects_transposed_merge() {
        assert_eq!(reshape_strides(&[2, 3], &[3, 1], &[6]), None);
    }

    #[test]
    fn test_reshape_unit_axes() {
        assert_eq!(reshape_strides(&[3], &[2], &[1, 3, 1]), Some(vec![2, 2, 6]));
        assert_eq!(reshape_strides(&[1, 1], &[5, 5], &[1]), Some(vec![1]));
    }

    #[test]
    fn test_broadcast_shape_fn() {
        assert_eq!(broadcast_shape(&[3, 1], &[4]).unwrap(), vec![3, 4]);
        assert_eq!(broadcast_shape(&[1], &[2, 5]).unwrap(), vec![2, 5]);
        assert!(matches!(
            broadcast_shape(&[3, 2], &[4, 2]),
            Err(StridedError::NonConformant { .. })
        ));
    }

    #[test]
    fn test_broadcast_strides() {
        assert_eq!(
            broadcast_strides(&[3, 1], &[1, 3], &[2, 3, 4]).unwrap(),
            vec![0, 1, 0]
        );
        assert!(broadcast_strides(&[3], &[1], &[4]).is_err());
    }

    #[test]
    fn test_slice_len() {
        assert_eq!(slice_len(0, 10, 2), 5);
        assert_eq!(slice_len(1, 10, 3), 3);
        assert_eq!(slice_len(4, 4, 1), 0);
    }
}
