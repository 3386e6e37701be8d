//! Index iteration and per-axis slice descriptions.

use std::ops::Range;

use crate::layout::slice_len;
use crate::{Result, StridedError};

/// Iterator over multi-dimensional index tuples within given dimensions.
///
/// Iterates in column-major order (first index varies fastest), which is
/// the linear order of every array in this workspace.
#[derive(Debug, Clone)]
pub struct MultiIndex {
    dims: Vec<usize>,
    current: Vec<usize>,
    total: usize,
    count: usize,
}

impl MultiIndex {
    pub fn new(dims: &[usize]) -> Self {
        let total: usize = dims.iter().product();
        Self {
            dims: dims.to_vec(),
            current: vec![0; dims.len()],
            total,
            count: 0,
        }
    }

    /// Indices of the most recently yielded position.
    #[inline]
    pub fn current(&self) -> &[usize] {
        &self.current
    }

    /// Compute the storage offset of the current position for the given strides.
    pub fn offset(&self, strides: &[isize]) -> isize {
        self.current
            .iter()
            .zip(strides.iter())
            .map(|(&i, &s)| i as isize * s)
            .sum()
    }

    /// Reset the iterator to the beginning.
    pub fn reset(&mut self) {
        self.current.fill(0);
        self.count = 0;
    }
}

impl Iterator for MultiIndex {
    type Item = ();

    fn next(&mut self) -> Option<()> {
        if self.count >= self.total {
            return None;
        }
        if self.count > 0 {
            // Increment: first index varies fastest (column-major)
            for i in 0..self.dims.len() {
                self.current[i] += 1;
                if self.current[i] < self.dims[i] {
                    break;
                }
                self.current[i] = 0;
            }
        }
        self.count += 1;
        Some(())
    }
}

/// Decompose a column-major linear index into a multi-index.
pub fn unravel_col_major(mut linear: usize, dims: &[usize], out: &mut [usize]) {
    for (slot, &d) in out.iter_mut().zip(dims.iter()) {
        if d == 0 {
            *slot = 0;
            continue;
        }
        *slot = linear % d;
        linear /= d;
    }
}

/// Storage addresses of every element of `(dims, strides, offset)` in
/// column-major order.
pub fn addresses(dims: &[usize], strides: &[isize], offset: isize) -> Vec<usize> {
    let mut iter = MultiIndex::new(dims);
    let mut out = Vec::with_capacity(iter.total);
    while iter.next().is_some() {
        out.push((offset + iter.offset(strides)) as usize);
    }
    out
}

/// Range selection along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceSpec {
    /// The whole axis.
    Full,
    /// `start..end` taking every `step`-th element.
    Range { start: usize, end: usize, step: usize },
}

impl SliceSpec {
    pub fn range(range: Range<usize>) -> Self {
        SliceSpec::Range {
            start: range.start,
            end: range.end,
            step: 1,
        }
    }

    pub fn stepped(range: Range<usize>, step: usize) -> Self {
        SliceSpec::Range {
            start: range.start,
            end: range.end,
            step,
        }
    }

    /// Resolve against an axis of extent `dim`: `(start, len, step)`.
    pub(crate) fn resolve(&self, dim: usize) -> Result<(usize, usize, usize)> {
        match *self {
            SliceSpec::Full => Ok((0, dim, 1)),
            SliceSpec::Range { start, end, step } => {
                if step == 0 {
                    return Err(StridedError::argument("slice step must be positive"));
                }
                if end > dim {
                    return Err(StridedError::IndexOutOfRange {
                        index: end,
                        len: dim,
                    });
                }
                if start > end {
                    return Err(StridedError::IndexOutOfRange {
                        index: start,
                        len: end,
                    });
                }
                Ok((start, slice_len(start, end, step), step))
            }
        }
    }
}

impl From<Range<usize>> for SliceSpec {
    fn from(range: Range<usize>) -> Self {
        SliceSpec::range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_index_2d() {
        let mut iter = MultiIndex::new(&[2, 3]);
        let mut indices = vec![];
        while iter.next().is_some() {
            indices.push(iter.current().to_vec());
        }
        assert_eq!(
            indices,
            vec![
                vec![0, 0],
                vec![1, 0],
                vec![0, 1],
                vec![1, 1],
                vec![0, 2],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn test_multi_index_offset() {
        let mut iter = MultiIndex::new(&[2, 3]);
        let strides = [1, 2];
        let mut offsets = vec![];
        while iter.next().is_some() {
            offsets.push(iter.offset(&strides));
        }
        assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_multi_index_empty() {
        let mut iter = MultiIndex::new(&[]);
        assert!(iter.next().is_some()); // single scalar iteration
        assert!(iter.next().is_none());

        let mut zero = MultiIndex::new(&[3, 0]);
        assert!(zero.next().is_none());
    }

    #[test]
    fn test_unravel() {
        let mut idx = [0usize; 3];
        unravel_col_major(23, &[2, 3, 4], &mut idx);
        assert_eq!(idx, [1, 2, 3]);
        unravel_col_major(3, &[2, 3, 4], &mut idx);
        assert_eq!(idx, [1, 1, 0]);
    }

    #[test]
    fn test_addresses_transposed() {
        // 2x3 row-major layout read column-major
        assert_eq!(addresses(&[2, 3], &[3, 1], 0), vec![0, 3, 1, 4, 2, 5]);
        assert_eq!(addresses(&[3], &[-1], 2), vec![2, 1, 0]);
    }

    #[test]
    fn test_slice_resolve() {
        assert_eq!(SliceSpec::Full.resolve(4).unwrap(), (0, 4, 1));
        assert_eq!(SliceSpec::stepped(1..6, 2).resolve(6).unwrap(), (1, 3, 2));
        assert!(matches!(
            SliceSpec::range(0..7).resolve(6),
            Err(StridedError::IndexOutOfRange { index: 7, len: 6 })
        ));
        assert!(matches!(
            SliceSpec::stepped(0..2, 0).resolve(6),
            Err(StridedError::Argument(_))
        ));
    }
}
