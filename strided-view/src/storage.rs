//! Homogeneous, fixed-size, shared element buffers.
//!
//! A [`Storage`] is a cheap handle: cloning it yields another reference to the
//! same buffer, so writes through one handle are visible through all others.
//! [`Storage::copy`] is the only way to obtain an independent buffer.
//!
//! The per-buffer lock exists for memory safety. It does not make sequences of
//! accesses atomic; concurrent writers still need external coordination.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;
use parking_lot::RwLock;
use strided_traits::{Element, ElementKind};

use crate::{Result, StridedError};

/// Kind-specific backing vector.
#[derive(Clone, PartialEq)]
enum Buffer {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Double(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Buffer {
    fn zeros(kind: ElementKind, size: usize) -> Self {
        match kind {
            ElementKind::Bool => Buffer::Bool(vec![false; size]),
            ElementKind::Int => Buffer::Int(vec![0; size]),
            ElementKind::Long => Buffer::Long(vec![0; size]),
            ElementKind::Double => Buffer::Double(vec![0.0; size]),
            ElementKind::Complex => Buffer::Complex(vec![Complex64::new(0.0, 0.0); size]),
        }
    }

    fn from_vec<K: Element>(values: Vec<K>) -> Self {
        match K::KIND {
            ElementKind::Bool => Buffer::Bool(values.into_iter().map(K::to_bool).collect()),
            ElementKind::Int => Buffer::Int(values.into_iter().map(K::to_i32).collect()),
            ElementKind::Long => Buffer::Long(values.into_iter().map(K::to_i64).collect()),
            ElementKind::Double => Buffer::Double(values.into_iter().map(K::to_f64).collect()),
            ElementKind::Complex => {
                Buffer::Complex(values.into_iter().map(K::to_complex).collect())
            }
        }
    }

    fn kind(&self) -> ElementKind {
        match self {
            Buffer::Bool(_) => ElementKind::Bool,
            Buffer::Int(_) => ElementKind::Int,
            Buffer::Long(_) => ElementKind::Long,
            Buffer::Double(_) => ElementKind::Double,
            Buffer::Complex(_) => ElementKind::Complex,
        }
    }

    fn len(&self) -> usize {
        match self {
            Buffer::Bool(v) => v.len(),
            Buffer::Int(v) => v.len(),
            Buffer::Long(v) => v.len(),
            Buffer::Double(v) => v.len(),
            Buffer::Complex(v) => v.len(),
        }
    }

    /// Read without a bounds check beyond the slice's own.
    #[inline]
    fn load<K: Element>(&self, i: usize) -> K {
        match self {
            Buffer::Bool(v) => K::from_bool(v[i]),
            Buffer::Int(v) => K::from_i32(v[i]),
            Buffer::Long(v) => K::from_i64(v[i]),
            Buffer::Double(v) => K::from_f64(v[i]),
            Buffer::Complex(v) => K::from_complex(v[i]),
        }
    }

    #[inline]
    fn store<K: Element>(&mut self, i: usize, value: K) {
        match self {
            Buffer::Bool(v) => v[i] = value.to_bool(),
            Buffer::Int(v) => v[i] = value.to_i32(),
            Buffer::Long(v) => v[i] = value.to_i64(),
            Buffer::Double(v) => v[i] = value.to_f64(),
            Buffer::Complex(v) => v[i] = value.to_complex(),
        }
    }
}

/// Shared handle to a homogeneous element buffer.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<RwLock<Buffer>>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buf = self.inner.read();
        f.debug_struct("Storage")
            .field("kind", &buf.kind())
            .field("size", &buf.len())
            .finish()
    }
}

impl Storage {
    fn from_buffer(buffer: Buffer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buffer)),
        }
    }

    /// Zero-initialized storage of the given kind.
    pub fn zeros(kind: ElementKind, size: usize) -> Self {
        Self::from_buffer(Buffer::zeros(kind, size))
    }

    /// Storage of the given kind with every element set to `value` (coerced).
    pub fn filled<K: Element>(kind: ElementKind, size: usize, value: K) -> Self {
        let mut buffer = Buffer::zeros(kind, size);
        for i in 0..size {
            buffer.store(i, value);
        }
        Self::from_buffer(buffer)
    }

    /// Take ownership of `values`; the storage kind is `K::KIND`.
    pub fn from_vec<K: Element>(values: Vec<K>) -> Self {
        Self::from_buffer(Buffer::from_vec(values))
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.inner.read().kind()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.inner.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Read element `i`, coerced to `K`.
    ///
    /// # Errors
    /// [`StridedError::IndexOutOfRange`] when `i >= size`.
    pub fn get<K: Element>(&self, i: usize) -> Result<K> {
        let buf = self.inner.read();
        check_index(i, buf.len())?;
        Ok(buf.load(i))
    }

    /// Write element `i`, coercing `value` into the native kind.
    ///
    /// # Errors
    /// [`StridedError::IndexOutOfRange`] when `i >= size`.
    pub fn set<K: Element>(&self, i: usize, value: K) -> Result<()> {
        let mut buf = self.inner.write();
        check_index(i, buf.len())?;
        buf.store(i, value);
        Ok(())
    }

    /// Fully independent copy of the buffer.
    pub fn copy(&self) -> Storage {
        Self::from_buffer(self.inner.read().clone())
    }

    /// Whether both handles refer to the same buffer.
    #[inline]
    pub fn ptr_eq(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this buffer.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Read many addresses under a single lock acquisition.
    ///
    /// Addresses must already be validated against [`Storage::size`].
    pub(crate) fn gather<K: Element>(&self, addrs: &[usize]) -> Vec<K> {
        let buf = self.inner.read();
        addrs.iter().map(|&a| buf.load(a)).collect()
    }

    /// Write many addresses under a single lock acquisition.
    pub(crate) fn scatter<K: Element>(&self, addrs: &[usize], values: &[K]) {
        let mut buf = self.inner.write();
        for (&a, &v) in addrs.iter().zip(values.iter()) {
            buf.store(a, v);
        }
    }

    pub(crate) fn scatter_value<K: Element>(&self, addrs: &[usize], value: K) {
        let mut buf = self.inner.write();
        for &a in addrs {
            buf.store(a, value);
        }
    }

    /// Exchange the values at two address lists of equal length.
    pub(crate) fn swap_addresses(&self, a: &[usize], b: &[usize]) {
        let mut buf = self.inner.write();
        for (&i, &j) in a.iter().zip(b.iter()) {
            swap_in(&mut buf, i, j);
        }
    }
}

fn swap_in(buf: &mut Buffer, i: usize, j: usize) {
    match buf {
        Buffer::Bool(v) => v.swap(i, j),
        Buffer::Int(v) => v.swap(i, j),
        Buffer::Long(v) => v.swap(i, j),
        Buffer::Double(v) => v.swap(i, j),
        Buffer::Complex(v) => v.swap(i, j),
    }
}

#[inline]
fn check_index(i: usize, len: usize) -> Result<()> {
    if i >= len {
        return Err(StridedError::IndexOutOfRange { index: i, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_kind() {
        let s = Storage::zeros(ElementKind::Int, 4);
        assert_eq!(s.kind(), ElementKind::Int);
        assert_eq!(s.size(), 4);
        assert_eq!(s.get::<i32>(3).unwrap(), 0);
    }

    #[test]
    fn test_bool_storage_reads_as_double() {
        let s = Storage::from_vec(vec![true, false, true]);
        assert_eq!(s.get::<f64>(0).unwrap(), 1.0);
        assert_eq!(s.get::<f64>(1).unwrap(), 0.0);
    }

    #[test]
    fn test_complex_storage_coercions() {
        let s = Storage::zeros(ElementKind::Complex, 2);
        s.set(0, 4.5f64).unwrap();
        assert_eq!(s.get::<Complex64>(0).unwrap(), Complex64::new(4.5, 0.0));
        s.set(1, Complex64::new(-1.0, 2.0)).unwrap();
        assert_eq!(s.get::<f64>(1).unwrap(), -1.0);
    }

    #[test]
    fn test_double_written_into_int_truncates() {
        let s = Storage::zeros(ElementKind::Int, 1);
        s.set(0, 2.99f64).unwrap();
        assert_eq!(s.get::<i32>(0).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let s = Storage::zeros(ElementKind::Double, 2);
        assert!(matches!(
            s.get::<f64>(2),
            Err(StridedError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(s.set(5, 1.0f64).is_err());
    }

    #[test]
    fn test_handles_alias_and_copy_is_independent() {
        let a = Storage::filled(ElementKind::Double, 3, 1.0f64);
        let b = a.clone();
        b.set(0, 9.0f64).unwrap();
        assert_eq!(a.get::<f64>(0).unwrap(), 9.0);
        assert!(a.ptr_eq(&b));

        let c = a.copy();
        c.set(1, -1.0f64).unwrap();
        assert_eq!(a.get::<f64>(1).unwrap(), 1.0);
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_gather_scatter_swap() {
        let s = Storage::from_vec(vec![0i64, 1, 2, 3, 4, 5]);
        let evens: Vec<i64> = s.gather(&[0, 2, 4]);
        assert_eq!(evens, vec![0, 2, 4]);
        s.scatter(&[1, 3], &[10.0f64, 30.0]);
        assert_eq!(s.gather::<i64>(&[1, 3]), vec![10, 30]);
        s.swap_addresses(&[0, 1], &[4, 5]);
        assert_eq!(s.gather::<i64>(&[0, 1, 4, 5]), vec![4, 5, 0, 10]);
    }
}
