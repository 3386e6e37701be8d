//! Element kinds and the cross-kind coercion table.
//!
//! Every storage buffer has one native [`ElementKind`]. Values are read and
//! written through the [`Element`] trait, which converts between the native
//! kind and the requested one. The conversions are total:
//!
//! | from \ to | bool          | i32 / i64                 | f64            | Complex64      |
//! |-----------|---------------|---------------------------|----------------|----------------|
//! | bool      | identity      | 1 / 0                     | 1.0 / 0.0      | (1,0) / (0,0)  |
//! | i32 / i64 | `v != 0`      | widen, or saturate to i32 | nearest        | (v, 0)         |
//! | f64       | `v != 0.0`    | truncate, saturate, NaN→0 | identity       | (v, 0)         |
//! | Complex64 | either part≠0 | real part, as f64 → int   | real part      | identity       |

use num_complex::Complex64;
use num_traits::Zero;
use std::fmt;

/// The native kind of a storage buffer.
///
/// Kinds are ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Bool,
    Int,
    Long,
    Double,
    Complex,
}

impl ElementKind {
    /// All kinds, in widening order.
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Bool,
        ElementKind::Int,
        ElementKind::Long,
        ElementKind::Double,
        ElementKind::Complex,
    ];

    /// Short lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Bool => "bool",
            ElementKind::Int => "int",
            ElementKind::Long => "long",
            ElementKind::Double => "double",
            ElementKind::Complex => "complex",
        }
    }

    /// Whether values of this kind carry a fractional part.
    #[inline]
    pub fn is_floating(self) -> bool {
        matches!(self, ElementKind::Double | ElementKind::Complex)
    }

    /// Whether this kind holds exact integers (`Bool` counts as 0/1).
    #[inline]
    pub fn is_integral(self) -> bool {
        matches!(self, ElementKind::Bool | ElementKind::Int | ElementKind::Long)
    }

    /// Kind of the result of arithmetic between `self` and `other`.
    ///
    /// The wider kind wins; booleans are not closed under arithmetic and
    /// promote to `Int`.
    #[inline]
    pub fn promote(self, other: ElementKind) -> ElementKind {
        match self.max(other) {
            ElementKind::Bool => ElementKind::Int,
            wider => wider,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value that can be stored in, and coerced out of, any element kind.
pub trait Element: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// The kind a buffer of `Self` values has natively.
    const KIND: ElementKind;

    fn from_bool(v: bool) -> Self;
    fn from_i32(v: i32) -> Self;
    fn from_i64(v: i64) -> Self;
    fn from_f64(v: f64) -> Self;
    fn from_complex(v: Complex64) -> Self;

    fn to_bool(self) -> bool;
    fn to_i32(self) -> i32;
    fn to_i64(self) -> i64;
    fn to_f64(self) -> f64;
    fn to_complex(self) -> Complex64;

    /// Convert into another element type using the coercion table.
    #[inline]
    fn cast<U: Element>(self) -> U {
        match Self::KIND {
            ElementKind::Bool => U::from_bool(self.to_bool()),
            ElementKind::Int => U::from_i32(self.to_i32()),
            ElementKind::Long => U::from_i64(self.to_i64()),
            ElementKind::Double => U::from_f64(self.to_f64()),
            ElementKind::Complex => U::from_complex(self.to_complex()),
        }
    }
}

/// Run `$body` with `$T` bound to the Rust type of a runtime [`ElementKind`].
///
/// ```
/// use strided_traits::{dispatch_kind, Element, ElementKind};
///
/// let kind = ElementKind::Long;
/// let one = dispatch_kind!(kind, T => T::from_i32(1).to_f64());
/// assert_eq!(one, 1.0);
/// ```
#[macro_export]
macro_rules! dispatch_kind {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            $crate::ElementKind::Bool => {
                type $T = bool;
                $body
            }
            $crate::ElementKind::Int => {
                type $T = i32;
                $body
            }
            $crate::ElementKind::Long => {
                type $T = i64;
                $body
            }
            $crate::ElementKind::Double => {
                type $T = f64;
                $body
            }
            $crate::ElementKind::Complex => {
                type $T = $crate::Complex64;
                $body
            }
        }
    };
}

#[inline]
fn saturate_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl Element for bool {
    const KIND: ElementKind = ElementKind::Bool;

    #[inline]
    fn from_bool(v: bool) -> Self {
        v
    }
    #[inline]
    fn from_i32(v: i32) -> Self {
        v != 0
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v != 0
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    #[inline]
    fn from_complex(v: Complex64) -> Self {
        !v.is_zero()
    }
    #[inline]
    fn to_bool(self) -> bool {
        self
    }
    #[inline]
    fn to_i32(self) -> i32 {
        self as i32
    }
    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
    #[inline]
    fn to_complex(self) -> Complex64 {
        Complex64::new(self.to_f64(), 0.0)
    }
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Int;

    #[inline]
    fn from_bool(v: bool) -> Self {
        v as i32
    }
    #[inline]
    fn from_i32(v: i32) -> Self {
        v
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        saturate_i32(v)
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        // `as` truncates toward zero, saturates, and maps NaN to 0
        v as i32
    }
    #[inline]
    fn from_complex(v: Complex64) -> Self {
        v.re as i32
    }
    #[inline]
    fn to_bool(self) -> bool {
        self != 0
    }
    #[inline]
    fn to_i32(self) -> i32 {
        self
    }
    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn to_complex(self) -> Complex64 {
        Complex64::new(self as f64, 0.0)
    }
}

impl Element for i64 {
    const KIND: ElementKind = ElementKind::Long;

    #[inline]
    fn from_bool(v: bool) -> Self {
        v as i64
    }
    #[inline]
    fn from_i32(v: i32) -> Self {
        v as i64
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as i64
    }
    #[inline]
    fn from_complex(v: Complex64) -> Self {
        v.re as i64
    }
    #[inline]
    fn to_bool(self) -> bool {
        self != 0
    }
    #[inline]
    fn to_i32(self) -> i32 {
        saturate_i32(self)
    }
    #[inline]
    fn to_i64(self) -> i64 {
        self
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn to_complex(self) -> Complex64 {
        Complex64::new(self as f64, 0.0)
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Double;

    #[inline]
    fn from_bool(v: bool) -> Self {
        v.to_f64()
    }
    #[inline]
    fn from_i32(v: i32) -> Self {
        v as f64
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v as f64
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
    #[inline]
    fn from_complex(v: Complex64) -> Self {
        v.re
    }
    #[inline]
    fn to_bool(self) -> bool {
        self != 0.0
    }
    #[inline]
    fn to_i32(self) -> i32 {
        self as i32
    }
    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn to_complex(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }
}

impl Element for Complex64 {
    const KIND: ElementKind = ElementKind::Complex;

    #[inline]
    fn from_bool(v: bool) -> Self {
        v.to_complex()
    }
    #[inline]
    fn from_i32(v: i32) -> Self {
        Complex64::new(v as f64, 0.0)
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        Complex64::new(v as f64, 0.0)
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        Complex64::new(v, 0.0)
    }
    #[inline]
    fn from_complex(v: Complex64) -> Self {
        v
    }
    #[inline]
    fn to_bool(self) -> bool {
        !self.is_zero()
    }
    #[inline]
    fn to_i32(self) -> i32 {
        self.re as i32
    }
    #[inline]
    fn to_i64(self) -> i64 {
        self.re as i64
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self.re
    }
    #[inline]
    fn to_complex(self) -> Complex64 {
        self
    }
}
