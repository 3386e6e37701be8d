//! Dynamic-rank strided arrays over shared storage.
//!
//! A [`StridedArray`] is a `(dims, strides, offset)` description plus a
//! [`Storage`] handle. Views produced by [`reshape`](StridedArray::reshape),
//! [`permute`](StridedArray::permute), [`slice`](StridedArray::slice),
//! [`select`](StridedArray::select) and
//! [`broadcast_to`](StridedArray::broadcast_to) alias the same storage, so a
//! write through any of them is visible through all. [`copy`](StridedArray::copy)
//! and every computed result own fresh storage.
//!
//! The linear order of an array is column-major: `get_linear(i)` decomposes
//! `i` with the first index varying fastest.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use strided_traits::{dispatch_kind, Element, ElementKind};

use crate::index::{addresses, unravel_col_major, SliceSpec};
use crate::layout::{
    broadcast_strides, checked_size, col_major_strides, is_col_major_contiguous,
    reshape_strides, validate_bounds,
};
use crate::storage::Storage;
use crate::{Result, StridedError};

/// Dynamic-rank strided array sharing its [`Storage`] with other views.
#[derive(Clone)]
pub struct StridedArray {
    storage: Storage,
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl fmt::Debug for StridedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedArray")
            .field("kind", &self.kind())
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

// ============================================================================
// Construction
// ============================================================================

impl StridedArray {
    /// Create a view from raw parts.
    ///
    /// # Errors
    /// [`StridedError::IndexOutOfRange`] if some multi-index would resolve
    /// outside the storage.
    pub fn from_parts(
        storage: Storage,
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(storage.size(), dims, strides, offset)?;
        Ok(Self {
            storage,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    /// Column-major view covering the whole of `storage`.
    fn dense(storage: Storage, dims: &[usize]) -> Self {
        Self {
            storage,
            dims: Arc::from(dims),
            strides: Arc::from(col_major_strides(dims)),
            offset: 0,
        }
    }

    /// Zero-initialized column-major array of the given kind.
    pub fn zeros(kind: ElementKind, dims: &[usize]) -> Result<Self> {
        let len = checked_size(dims)?;
        Ok(Self::dense(Storage::zeros(kind, len), dims))
    }

    /// Column-major array of the given kind with every element set to `value`.
    pub fn filled<K: Element>(kind: ElementKind, dims: &[usize], value: K) -> Result<Self> {
        let len = checked_size(dims)?;
        Ok(Self::dense(Storage::filled(kind, len, value), dims))
    }

    /// Wrap `data` (column-major) as an array of kind `K::KIND`.
    ///
    /// # Errors
    /// [`StridedError::Argument`] if `data.len()` is not the product of `dims`.
    pub fn from_vec<K: Element>(dims: &[usize], data: Vec<K>) -> Result<Self> {
        let len = checked_size(dims)?;
        if data.len() != len {
            return Err(StridedError::argument(format!(
                "{} values cannot fill shape {:?}",
                data.len(),
                dims
            )));
        }
        Ok(Self::dense(Storage::from_vec(data), dims))
    }

    /// Build from `data` listed in row-major order; the result is column-major.
    pub fn from_row_major<K: Element>(dims: &[usize], data: &[K]) -> Result<Self> {
        let len = checked_size(dims)?;
        if data.len() != len {
            return Err(StridedError::argument(format!(
                "{} values cannot fill shape {:?}",
                data.len(),
                dims
            )));
        }
        let row_strides = crate::layout::row_major_strides(dims);
        let mut values = Vec::with_capacity(len);
        let mut iter = crate::MultiIndex::new(dims);
        while iter.next().is_some() {
            values.push(data[iter.offset(&row_strides) as usize]);
        }
        Self::from_vec(dims, values)
    }

    /// Column-major array with values produced by `f(index)`.
    ///
    /// The function is called with indices in column-major iteration order.
    pub fn from_fn<K: Element>(dims: &[usize], mut f: impl FnMut(&[usize]) -> K) -> Result<Self> {
        let len = checked_size(dims)?;
        let mut values = Vec::with_capacity(len);
        let mut iter = crate::MultiIndex::new(dims);
        while iter.next().is_some() {
            values.push(f(iter.current()));
        }
        Self::from_vec(dims, values)
    }

    /// One-dimensional array.
    pub fn from_slice<K: Element>(data: &[K]) -> Self {
        Self::dense(Storage::from_vec(data.to_vec()), &[data.len()])
    }
}

// ============================================================================
// Metadata
// ============================================================================

impl StridedArray {
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of addressable elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.storage.kind()
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Whether both arrays alias the same storage.
    #[inline]
    pub fn shares_storage(&self, other: &StridedArray) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Whether the elements are dense in column-major order.
    pub fn is_contiguous(&self) -> bool {
        is_col_major_contiguous(&self.dims, &self.strides)
    }

    /// Whether this array addresses anything other than its entire storage
    /// in column-major order.
    pub fn is_view(&self) -> bool {
        !(self.offset == 0 && self.is_contiguous() && self.len() == self.storage.size())
    }

    /// Rows of a 2-d array.
    pub fn rows(&self) -> Result<usize> {
        self.require_matrix().map(|(r, _)| r)
    }

    /// Columns of a 2-d array.
    pub fn cols(&self) -> Result<usize> {
        self.require_matrix().map(|(_, c)| c)
    }

    /// `(rows, cols)` of a 2-d array.
    ///
    /// # Errors
    /// [`StridedError::Argument`] when the array is not 2-d.
    pub fn require_matrix(&self) -> Result<(usize, usize)> {
        if self.ndim() != 2 {
            return Err(StridedError::argument(format!(
                "expected a 2-d array, got shape {:?}",
                self.dims()
            )));
        }
        Ok((self.dims[0], self.dims[1]))
    }

    /// Whether the array is 1-d, or 2-d with one of the extents equal to one.
    pub fn is_vector(&self) -> bool {
        match self.ndim() {
            1 => true,
            2 => self.dims[0] == 1 || self.dims[1] == 1,
            _ => false,
        }
    }
}

// ============================================================================
// Element access
// ============================================================================

impl StridedArray {
    /// Storage address of a multi-index.
    ///
    /// # Errors
    /// [`StridedError::Argument`] on a rank mismatch,
    /// [`StridedError::IndexOutOfRange`] if some index exceeds its extent.
    pub fn address(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.ndim() {
            return Err(StridedError::argument(format!(
                "expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        let mut pos = self.offset;
        for ((&i, &dim), &stride) in indices.iter().zip(self.dims.iter()).zip(self.strides.iter()) {
            if i >= dim {
                return Err(StridedError::IndexOutOfRange { index: i, len: dim });
            }
            pos += i as isize * stride;
        }
        Ok(pos as usize)
    }

    /// Storage address of the element at column-major position `i`.
    pub fn linear_address(&self, i: usize) -> Result<usize> {
        let len = self.len();
        if i >= len {
            return Err(StridedError::IndexOutOfRange { index: i, len });
        }
        let mut idx = vec![0usize; self.ndim()];
        unravel_col_major(i, &self.dims, &mut idx);
        self.address(&idx)
    }

    pub fn get<K: Element>(&self, indices: &[usize]) -> Result<K> {
        let addr = self.address(indices)?;
        self.storage.get(addr)
    }

    pub fn set<K: Element>(&self, indices: &[usize], value: K) -> Result<()> {
        let addr = self.address(indices)?;
        self.storage.set(addr, value)
    }

    /// Read the element at column-major position `i`.
    pub fn get_linear<K: Element>(&self, i: usize) -> Result<K> {
        let addr = self.linear_address(i)?;
        self.storage.get(addr)
    }

    pub fn set_linear<K: Element>(&self, i: usize, value: K) -> Result<()> {
        let addr = self.linear_address(i)?;
        self.storage.set(addr, value)
    }

    /// Storage addresses of all elements in column-major order.
    pub fn addresses(&self) -> Vec<usize> {
        addresses(&self.dims, &self.strides, self.offset)
    }

    /// All elements in column-major order, coerced to `K`.
    pub fn to_vec<K: Element>(&self) -> Vec<K> {
        self.storage.gather(&self.addresses())
    }

    /// Overwrite all elements, taking `values` in column-major order.
    ///
    /// # Errors
    /// [`StridedError::Argument`] if `values.len() != self.len()`.
    pub fn write_all<K: Element>(&self, values: &[K]) -> Result<()> {
        if values.len() != self.len() {
            return Err(StridedError::argument(format!(
                "{} values cannot fill shape {:?}",
                values.len(),
                self.dims()
            )));
        }
        self.storage.scatter(&self.addresses(), values);
        Ok(())
    }

    /// Set every element to `value`.
    pub fn fill<K: Element>(&self, value: K) {
        self.storage.scatter_value(&self.addresses(), value);
    }

    /// Copy `src` into this array, broadcasting it to this shape.
    ///
    /// The source is read completely before anything is written, so `src`
    /// may alias `self`.
    pub fn assign(&self, src: &StridedArray) -> Result<()> {
        let src = src.broadcast_to(self.dims())?;
        dispatch_kind!(self.kind(), T => {
            let values = src.to_vec::<T>();
            self.storage.scatter(&self.addresses(), &values);
        });
        Ok(())
    }

    /// Exchange contents with `other` element by element.
    ///
    /// Both sides are read before anything is written. When the two views
    /// overlap in storage, `self` takes the old contents of `other` first and
    /// `other` then takes the old contents of `self`, so shared elements end
    /// up with `self`'s old values.
    ///
    /// # Errors
    /// [`StridedError::NonConformant`] if the shapes differ.
    pub fn swap_with(&self, other: &StridedArray) -> Result<()> {
        if self.dims() != other.dims() {
            return Err(StridedError::non_conformant(self.dims(), other.dims()));
        }
        if self.shares_storage(other) {
            let mine = self.addresses();
            let theirs = other.addresses();
            let seen: HashSet<usize> = mine.iter().copied().collect();
            if !theirs.iter().any(|a| seen.contains(a)) {
                self.storage.swap_addresses(&mine, &theirs);
                return Ok(());
            }
            log::trace!("swap between overlapping views of {:?}", self.dims());
        }
        dispatch_kind!(self.kind(), T => {
            let mine = self.to_vec::<T>();
            let theirs = other.to_vec::<T>();
            self.write_all(&theirs)?;
            other.write_all(&mine)?;
        });
        Ok(())
    }

    /// Independent column-major copy with the same kind.
    pub fn copy(&self) -> StridedArray {
        self.to_kind(self.kind())
    }

    /// Independent column-major copy coerced to `kind`.
    pub fn to_kind(&self, kind: ElementKind) -> StridedArray {
        dispatch_kind!(kind, T => {
            Self::dense(Storage::from_vec(self.to_vec::<T>()), &self.dims)
        })
    }
}

// ============================================================================
// Views
// ============================================================================

impl StridedArray {
    fn with_layout(&self, dims: Vec<usize>, strides: Vec<isize>, offset: isize) -> StridedArray {
        StridedArray {
            storage: self.storage.clone(),
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        }
    }

    fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.ndim() {
            return Err(StridedError::argument(format!(
                "axis {} out of range for rank {}",
                axis,
                self.ndim()
            )));
        }
        Ok(())
    }

    /// Reshape to `new_dims` following the column-major linear order.
    ///
    /// Returns a view over the same storage when the strides permit it;
    /// otherwise the elements are first copied into fresh storage.
    ///
    /// # Errors
    /// [`StridedError::Argument`] if the element counts differ.
    pub fn reshape(&self, new_dims: &[usize]) -> Result<StridedArray> {
        let new_len = checked_size(new_dims)?;
        if new_len != self.len() {
            return Err(StridedError::argument(format!(
                "cannot reshape {:?} ({} elements) into {:?} ({} elements)",
                self.dims(),
                self.len(),
                new_dims,
                new_len
            )));
        }
        match reshape_strides(&self.dims, &self.strides, new_dims) {
            Some(strides) => Ok(self.with_layout(new_dims.to_vec(), strides, self.offset)),
            None => {
                log::trace!(
                    "reshape {:?} -> {:?} needs a copy (strides {:?})",
                    self.dims(),
                    new_dims,
                    self.strides()
                );
                let dense = self.copy();
                Ok(dense.with_layout(new_dims.to_vec(), col_major_strides(new_dims), 0))
            }
        }
    }

    /// One-dimensional reshape.
    pub fn ravel(&self) -> Result<StridedArray> {
        self.reshape(&[self.len()])
    }

    /// Reverse the order of all axes.
    pub fn transpose(&self) -> StridedArray {
        let dims: Vec<usize> = self.dims.iter().rev().copied().collect();
        let strides: Vec<isize> = self.strides.iter().rev().copied().collect();
        self.with_layout(dims, strides, self.offset)
    }

    /// Permute dimensions: axis `k` of the result is axis `perm[k]` of `self`.
    pub fn permute(&self, perm: &[usize]) -> Result<StridedArray> {
        let rank = self.ndim();
        if perm.len() != rank {
            return Err(StridedError::argument(format!(
                "permutation {perm:?} has wrong length for rank {rank}"
            )));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(StridedError::argument(format!(
                    "{perm:?} is not a permutation of 0..{rank}"
                )));
            }
            seen[p] = true;
        }
        let dims: Vec<usize> = perm.iter().map(|&p| self.dims[p]).collect();
        let strides: Vec<isize> = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(self.with_layout(dims, strides, self.offset))
    }

    /// Select a sub-range along every axis.
    pub fn slice(&self, specs: &[SliceSpec]) -> Result<StridedArray> {
        if specs.len() != self.ndim() {
            return Err(StridedError::argument(format!(
                "expected {} slice ranges, got {}",
                self.ndim(),
                specs.len()
            )));
        }
        let mut dims = Vec::with_capacity(specs.len());
        let mut strides = Vec::with_capacity(specs.len());
        let mut offset = self.offset;
        for (k, spec) in specs.iter().enumerate() {
            let (start, len, step) = spec.resolve(self.dims[k])?;
            if len > 0 {
                offset += start as isize * self.strides[k];
            }
            dims.push(len);
            strides.push(self.strides[k] * step as isize);
        }
        Ok(self.with_layout(dims, strides, offset))
    }

    /// Select a sub-range along a single axis.
    pub fn slice_axis(&self, axis: usize, spec: SliceSpec) -> Result<StridedArray> {
        self.check_axis(axis)?;
        let mut specs = vec![SliceSpec::Full; self.ndim()];
        specs[axis] = spec;
        self.slice(&specs)
    }

    /// Fix `axis` at `index`, dropping that axis.
    pub fn select(&self, axis: usize, index: usize) -> Result<StridedArray> {
        self.check_axis(axis)?;
        if index >= self.dims[axis] {
            return Err(StridedError::IndexOutOfRange {
                index,
                len: self.dims[axis],
            });
        }
        let mut dims = self.dims.to_vec();
        let mut strides = self.strides.to_vec();
        let offset = self.offset + index as isize * strides[axis];
        dims.remove(axis);
        strides.remove(axis);
        Ok(self.with_layout(dims, strides, offset))
    }

    /// Number of 1-d vectors along `axis`.
    pub fn vectors(&self, axis: usize) -> Result<usize> {
        self.check_axis(axis)?;
        let d = self.dims[axis];
        Ok(if d == 0 { 0 } else { self.len() / d })
    }

    /// The `i`-th 1-d vector along `axis`.
    ///
    /// Vectors are enumerated in column-major order over the remaining axes,
    /// so for a matrix `vector(0, j)` is column `j` and `vector(1, i)` is row `i`.
    pub fn vector(&self, axis: usize, i: usize) -> Result<StridedArray> {
        let count = self.vectors(axis)?;
        if i >= count {
            return Err(StridedError::IndexOutOfRange {
                index: i,
                len: count,
            });
        }
        let rest_dims: Vec<usize> = (0..self.ndim())
            .filter(|&k| k != axis)
            .map(|k| self.dims[k])
            .collect();
        let rest_strides: Vec<isize> = (0..self.ndim())
            .filter(|&k| k != axis)
            .map(|k| self.strides[k])
            .collect();
        let mut idx = vec![0usize; rest_dims.len()];
        unravel_col_major(i, &rest_dims, &mut idx);
        let offset = self.offset
            + idx
                .iter()
                .zip(rest_strides.iter())
                .map(|(&j, &s)| j as isize * s)
                .sum::<isize>();
        Ok(self.with_layout(vec![self.dims[axis]], vec![self.strides[axis]], offset))
    }

    pub fn row(&self, i: usize) -> Result<StridedArray> {
        self.require_matrix()?;
        self.select(0, i)
    }

    pub fn column(&self, j: usize) -> Result<StridedArray> {
        self.require_matrix()?;
        self.select(1, j)
    }

    /// Main diagonal of a matrix as a 1-d view.
    pub fn diagonal(&self) -> Result<StridedArray> {
        let (rows, cols) = self.require_matrix()?;
        let n = rows.min(cols);
        Ok(self.with_layout(
            vec![n],
            vec![self.strides[0] + self.strides[1]],
            self.offset,
        ))
    }

    /// Rectangular block of a matrix starting at `(row, col)`.
    pub fn view_2d(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<StridedArray> {
        self.require_matrix()?;
        let (Some(row_end), Some(col_end)) = (row.checked_add(rows), col.checked_add(cols)) else {
            return Err(StridedError::argument(format!(
                "block of {rows}x{cols} at ({row}, {col}) overflows the index range"
            )));
        };
        self.slice(&[
            SliceSpec::range(row..row_end),
            SliceSpec::range(col..col_end),
        ])
    }

    /// Read this array as shape `target` by giving size-1 and missing
    /// leading axes stride 0. No storage is allocated.
    ///
    /// # Errors
    /// [`StridedError::NonConformant`] if the shapes are not broadcast compatible.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<StridedArray> {
        if self.dims() == target {
            return Ok(self.clone());
        }
        let strides = broadcast_strides(&self.dims, &self.strides, target)?;
        Ok(self.with_layout(target.to_vec(), strides, self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn make_matrix(rows: usize, cols: usize) -> StridedArray {
        StridedArray::from_fn(&[rows, cols], |idx| (idx[0] * 10 + idx[1]) as f64).unwrap()
    }

    #[test]
    fn test_from_vec_col_major() {
        let a = StridedArray::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(a.strides(), &[1, 2]);
        assert_eq!(a.get::<f64>(&[0, 0]).unwrap(), 1.0);
        assert_eq!(a.get::<f64>(&[1, 0]).unwrap(), 2.0);
        assert_eq!(a.get::<f64>(&[0, 1]).unwrap(), 3.0);
        assert_eq!(a.get::<f64>(&[1, 2]).unwrap(), 6.0);
        assert!(StridedArray::from_vec(&[2, 2], vec![1.0]).is_err());
    }

    #[test]
    fn test_from_row_major() {
        let a = StridedArray::from_row_major(&[2, 3], &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(a.kind(), ElementKind::Int);
        assert_eq!(a.get::<i32>(&[0, 2]).unwrap(), 3);
        assert_eq!(a.get::<i32>(&[1, 0]).unwrap(), 4);
        assert_eq!(a.to_vec::<i32>(), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_index_errors() {
        let a = make_matrix(2, 3);
        assert!(matches!(
            a.get::<f64>(&[2, 0]),
            Err(StridedError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(a.get::<f64>(&[0]), Err(StridedError::Argument(_))));
        assert!(a.get_linear::<f64>(6).is_err());
    }

    #[test]
    fn test_linear_order_is_col_major() {
        let a = make_matrix(2, 3);
        assert_eq!(a.get_linear::<f64>(1).unwrap(), 10.0);
        assert_eq!(a.get_linear::<f64>(2).unwrap(), 1.0);
        let t = a.transpose();
        assert_eq!(t.get_linear::<f64>(1).unwrap(), 1.0);
    }

    #[test]
    fn test_views_alias_storage() {
        let a = make_matrix(3, 3);
        let col = a.column(1).unwrap();
        col.set(&[2], -1.0f64).unwrap();
        assert_eq!(a.get::<f64>(&[2, 1]).unwrap(), -1.0);
        assert!(col.shares_storage(&a));
        assert!(col.is_view());
        assert!(!a.is_view());

        let c = a.copy();
        c.set(&[0, 0], 99.0f64).unwrap();
        assert_eq!(a.get::<f64>(&[0, 0]).unwrap(), 0.0);
        assert!(!c.shares_storage(&a));
    }

    #[test]
    fn test_reshape_view_and_copy() {
        let a = StridedArray::from_fn(&[6], |i| i[0] as f64).unwrap();
        let m = a.reshape(&[2, 3]).unwrap();
        assert!(m.shares_storage(&a));
        assert_eq!(m.get::<f64>(&[1, 2]).unwrap(), 5.0);

        let t = m.transpose();
        let flat = t.reshape(&[6]).unwrap();
        assert!(!flat.shares_storage(&a));
        assert_eq!(flat.to_vec::<f64>(), vec![0.0, 2.0, 4.0, 1.0, 3.0, 5.0]);

        assert!(matches!(a.reshape(&[4]), Err(StridedError::Argument(_))));
    }

    #[test]
    fn test_permute() {
        let a = StridedArray::from_fn(&[2, 3, 4], |i| (i[0] * 100 + i[1] * 10 + i[2]) as f64)
            .unwrap();
        let p = a.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.dims(), &[4, 2, 3]);
        assert_eq!(p.get::<f64>(&[3, 1, 2]).unwrap(), 123.0);
        assert!(a.permute(&[0, 0, 1]).is_err());
        assert!(a.permute(&[0, 1]).is_err());
    }

    #[test]
    fn test_slice() {
        let a = make_matrix(4, 5);
        let s = a
            .slice(&[SliceSpec::stepped(0..4, 2), SliceSpec::range(1..4)])
            .unwrap();
        assert_eq!(s.dims(), &[2, 3]);
        assert_eq!(s.get::<f64>(&[1, 0]).unwrap(), 21.0);
        assert_eq!(s.get::<f64>(&[1, 2]).unwrap(), 23.0);
        assert!(matches!(
            a.slice(&[SliceSpec::range(0..5), SliceSpec::Full]),
            Err(StridedError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_select_and_vectors() {
        let a = make_matrix(3, 4);
        assert_eq!(a.vectors(0).unwrap(), 4);
        assert_eq!(a.vector(0, 2).unwrap().to_vec::<f64>(), vec![2.0, 12.0, 22.0]);
        assert_eq!(
            a.vector(1, 1).unwrap().to_vec::<f64>(),
            vec![10.0, 11.0, 12.0, 13.0]
        );
        assert_eq!(a.row(2).unwrap().to_vec::<f64>(), vec![20.0, 21.0, 22.0, 23.0]);
        assert_eq!(a.diagonal().unwrap().to_vec::<f64>(), vec![0.0, 11.0, 22.0]);
        assert!(a.select(1, 4).is_err());

        let cube = StridedArray::from_fn(&[2, 3, 2], |i| (i[0] * 100 + i[1] * 10 + i[2]) as f64)
            .unwrap();
        assert_eq!(cube.vector(1, 3).unwrap().to_vec::<f64>(), vec![101.0, 111.0, 121.0]);
    }

    #[test]
    fn test_view_2d() {
        let a = make_matrix(4, 4);
        let b = a.view_2d(1, 2, 2, 2).unwrap();
        assert_eq!(b.to_vec::<f64>(), vec![12.0, 22.0, 13.0, 23.0]);
    }

    #[test]
    fn test_broadcast_to() {
        let v = StridedArray::from_slice(&[1.0, 2.0, 3.0]);
        let b = v.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(b.strides(), &[0, 1]);
        assert_eq!(b.get::<f64>(&[1, 2]).unwrap(), 3.0);
        assert!(matches!(
            v.broadcast_to(&[4]),
            Err(StridedError::NonConformant { .. })
        ));
    }

    #[test]
    fn test_assign_self_alias() {
        let a = StridedArray::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let rev = StridedArray::from_parts(a.storage().clone(), &[4], &[-1], 3).unwrap();
        a.assign(&rev.copy()).unwrap();
        assert_eq!(a.to_vec::<f64>(), vec![4.0, 3.0, 2.0, 1.0]);
        a.assign(&rev).unwrap();
        assert_eq!(a.to_vec::<f64>(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_swap_with() {
        let a = make_matrix(2, 2);
        let b = StridedArray::filled(ElementKind::Double, &[2, 2], 7.0).unwrap();
        a.swap_with(&b).unwrap();
        assert_eq!(a.to_vec::<f64>(), vec![7.0; 4]);
        assert_eq!(b.get::<f64>(&[1, 1]).unwrap(), 11.0);

        let r0 = a.row(0).unwrap();
        let r1 = b.row(1).unwrap();
        r0.swap_with(&r1).unwrap();
        assert_eq!(a.row(0).unwrap().to_vec::<f64>(), vec![10.0, 11.0]);

        let c = make_matrix(3, 3);
        c.row(0).unwrap().swap_with(&c.row(2).unwrap()).unwrap();
        assert_eq!(c.row(0).unwrap().to_vec::<f64>(), vec![20.0, 21.0, 22.0]);
        assert!(a.swap_with(&c).is_err());
    }

    #[test]
    fn test_to_kind() {
        let a = StridedArray::from_slice(&[0.0, 1.5, -2.0]);
        let b = a.to_kind(ElementKind::Bool);
        assert_eq!(b.to_vec::<bool>(), vec![false, true, true]);
        let z = a.to_kind(ElementKind::Complex);
        assert_eq!(z.get::<Complex64>(&[1]).unwrap(), Complex64::new(1.5, 0.0));
        let i = a.to_kind(ElementKind::Int);
        assert_eq!(i.to_vec::<i64>(), vec![0, 1, -2]);
    }

    #[test]
    fn test_from_parts_rejects_out_of_range() {
        let s = Storage::zeros(ElementKind::Double, 5);
        assert!(matches!(
            StridedArray::from_parts(s, &[2, 3], &[3, 1], 0),
            Err(StridedError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_view_2d_rejects_overflowing_block() {
        let a = make_matrix(3, 3);
        assert!(matches!(
            a.view_2d(usize::MAX, 0, 2, 1),
            Err(StridedError::Argument(_))
        ));
        assert!(matches!(
            a.view_2d(0, 1, 1, usize::MAX),
            Err(StridedError::Argument(_))
        ));
        assert!(a.view_2d(2, 2, 2, 1).is_err());
    }

    #[test]
    fn test_swap_with_overlapping_views() {
        let a = StridedArray::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let x = a.slice(&[SliceSpec::range(0..3)]).unwrap();
        let y = a.slice(&[SliceSpec::range(1..4)]).unwrap();
        x.swap_with(&y).unwrap();
        // x takes [2, 3, 4], then y takes the old [1, 2, 3]
        assert_eq!(a.to_vec::<f64>(), vec![2.0, 1.0, 2.0, 3.0]);

        let b = StridedArray::from_slice(&[5i32, 6, 7]);
        b.swap_with(&b).unwrap();
        assert_eq!(b.to_vec::<i32>(), vec![5, 6, 7]);
    }

    proptest::proptest! {
        #[test]
        fn prop_overlapping_swap_reads_before_writing(n in 2usize..12, shift in 1usize..4) {
            let shift = shift.min(n - 1);
            let values: Vec<i64> = (0..n as i64).collect();
            let a = StridedArray::from_slice(&values);
            let x = a.slice(&[SliceSpec::range(0..n - shift)]).unwrap();
            let y = a.slice(&[SliceSpec::range(shift..n)]).unwrap();
            x.swap_with(&y).unwrap();

            let mut expected = values.clone();
            expected[..n - shift].copy_from_slice(&values[shift..]);
            expected[shift..].copy_from_slice(&values[..n - shift]);
            proptest::prop_assert_eq!(a.to_vec::<i64>(), expected);
        }
    }

    #[test]
    fn test_empty_arrays() {
        let e = StridedArray::zeros(ElementKind::Double, &[0, 3]).unwrap();
        assert!(e.is_empty());
        assert_eq!(e.len(), 0);
        assert!(e.to_vec::<f64>().is_empty());
        assert_eq!(e.reshape(&[3, 0]).unwrap().dims(), &[3, 0]);
    }
}
