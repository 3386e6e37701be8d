//! Element-wise operations with broadcasting.
//!
//! [`add`], [`sub`], [`mul`] and [`div`] compute in the promoted kind of their
//! operands (see [`ElementKind::promote`]): `Long` stays `Long`, complex stays
//! complex. Integer arithmetic wraps on overflow like two's complement
//! hardware; integer division by zero is an argument error.
//!
//! The closure routines ([`map`], [`zip_map`], [`compare`] and the in-place
//! forms) read real values through the `f64` coercion and reject complex
//! operands. [`map_complex`] and [`zip_map_complex`] are their complex
//! counterparts, and [`unary`] applies the standard math functions with
//! kind-aware results.

use num_traits::{NumOps, PrimInt, WrappingAdd, WrappingMul, WrappingSub};
use strided_view::{broadcast_shape, Complex64, Element, ElementKind, StridedArray, StridedError};

use crate::Result;

/// Reject complex operands of a routine defined on real values only.
pub(crate) fn require_real(x: &StridedArray, routine: &str) -> Result<()> {
    if x.kind() == ElementKind::Complex {
        return Err(StridedError::argument(format!(
            "{routine} is not defined for complex arrays"
        )));
    }
    Ok(())
}

// ============================================================================
// Closure maps
// ============================================================================

/// Apply `f` to every element, producing a new `Double` array of the same shape.
///
/// # Errors
/// [`StridedError::Argument`] for a complex source; use [`map_complex`].
pub fn map<F>(src: &StridedArray, f: F) -> Result<StridedArray>
where
    F: Fn(f64) -> f64,
{
    require_real(src, "map")?;
    let values: Vec<f64> = src.to_vec::<f64>().into_iter().map(f).collect();
    StridedArray::from_vec(src.dims(), values)
}

/// Apply `f` to every element in place, writing back through the array's kind.
pub fn map_inplace<F>(dst: &StridedArray, f: F) -> Result<()>
where
    F: Fn(f64) -> f64,
{
    require_real(dst, "map_inplace")?;
    let values: Vec<f64> = dst.to_vec::<f64>().into_iter().map(f).collect();
    dst.write_all(&values)
}

/// Apply `f` to every element read as complex, producing a `Complex` array.
pub fn map_complex<F>(src: &StridedArray, f: F) -> Result<StridedArray>
where
    F: Fn(Complex64) -> Complex64,
{
    let values: Vec<Complex64> = src.to_vec::<Complex64>().into_iter().map(f).collect();
    StridedArray::from_vec(src.dims(), values)
}

/// Combine two arrays element-wise after broadcasting them to a common shape.
///
/// # Errors
/// [`StridedError::NonConformant`] if the shapes do not broadcast,
/// [`StridedError::Argument`] if either operand is complex.
pub fn zip_map<F>(a: &StridedArray, b: &StridedArray, f: F) -> Result<StridedArray>
where
    F: Fn(f64, f64) -> f64,
{
    require_real(a, "zip_map")?;
    require_real(b, "zip_map")?;
    let dims = broadcast_shape(a.dims(), b.dims())?;
    let av = a.broadcast_to(&dims)?.to_vec::<f64>();
    let bv = b.broadcast_to(&dims)?.to_vec::<f64>();
    let values: Vec<f64> = av.iter().zip(bv.iter()).map(|(&x, &y)| f(x, y)).collect();
    StridedArray::from_vec(&dims, values)
}

/// Complex form of [`zip_map`]; real operands are read as `(v, 0)`.
pub fn zip_map_complex<F>(a: &StridedArray, b: &StridedArray, f: F) -> Result<StridedArray>
where
    F: Fn(Complex64, Complex64) -> Complex64,
{
    let dims = broadcast_shape(a.dims(), b.dims())?;
    let av = a.broadcast_to(&dims)?.to_vec::<Complex64>();
    let bv = b.broadcast_to(&dims)?.to_vec::<Complex64>();
    let values: Vec<Complex64> = av.iter().zip(bv.iter()).map(|(&x, &y)| f(x, y)).collect();
    StridedArray::from_vec(&dims, values)
}

/// `dst[i] = f(dst[i], src[i])` with `src` broadcast to the shape of `dst`.
pub fn zip_map_into<F>(dst: &StridedArray, src: &StridedArray, f: F) -> Result<()>
where
    F: Fn(f64, f64) -> f64,
{
    require_real(dst, "zip_map_into")?;
    require_real(src, "zip_map_into")?;
    let sv = src.broadcast_to(dst.dims())?.to_vec::<f64>();
    let dv = dst.to_vec::<f64>();
    let values: Vec<f64> = dv.iter().zip(sv.iter()).map(|(&x, &y)| f(x, y)).collect();
    dst.write_all(&values)
}

// ============================================================================
// Arithmetic
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

fn field_op<T: NumOps + Copy>(op: Arith, x: T, y: T) -> Result<T> {
    Ok(match op {
        Arith::Add => x + y,
        Arith::Sub => x - y,
        Arith::Mul => x * y,
        Arith::Div => x / y,
    })
}

fn wrapping_op<T>(op: Arith, x: T, y: T) -> Result<T>
where
    T: PrimInt + WrappingAdd + WrappingSub + WrappingMul,
{
    match op {
        Arith::Add => Ok(x.wrapping_add(&y)),
        Arith::Sub => Ok(x.wrapping_sub(&y)),
        Arith::Mul => Ok(x.wrapping_mul(&y)),
        Arith::Div => {
            if y.is_zero() {
                return Err(StridedError::argument("integer division by zero"));
            }
            // MIN / -1 is the only remaining overflow; it wraps to MIN
            Ok(x.checked_div(&y).unwrap_or(x))
        }
    }
}

fn combine<T: Element>(
    a: &StridedArray,
    b: &StridedArray,
    f: impl Fn(T, T) -> Result<T>,
) -> Result<StridedArray> {
    let dims = broadcast_shape(a.dims(), b.dims())?;
    let av = a.broadcast_to(&dims)?.to_vec::<T>();
    let bv = b.broadcast_to(&dims)?.to_vec::<T>();
    let values = av
        .into_iter()
        .zip(bv)
        .map(|(x, y)| f(x, y))
        .collect::<Result<Vec<T>>>()?;
    StridedArray::from_vec(&dims, values)
}

fn arith(a: &StridedArray, b: &StridedArray, op: Arith) -> Result<StridedArray> {
    match a.kind().promote(b.kind()) {
        ElementKind::Complex => combine::<Complex64>(a, b, |x, y| field_op(op, x, y)),
        ElementKind::Double => combine::<f64>(a, b, |x, y| field_op(op, x, y)),
        ElementKind::Long => combine::<i64>(a, b, |x, y| wrapping_op(op, x, y)),
        ElementKind::Int | ElementKind::Bool => {
            combine::<i32>(a, b, |x, y| wrapping_op(op, x, y))
        }
    }
}

pub fn add(a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
    arith(a, b, Arith::Add)
}

pub fn sub(a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
    arith(a, b, Arith::Sub)
}

pub fn mul(a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
    arith(a, b, Arith::Mul)
}

/// Element-wise quotient; integer kinds truncate toward zero.
///
/// # Errors
/// [`StridedError::Argument`] when an integer divisor is zero.
pub fn div(a: &StridedArray, b: &StridedArray) -> Result<StridedArray> {
    arith(a, b, Arith::Div)
}

/// Element-wise comparison producing a `Bool` array.
pub fn compare<F>(a: &StridedArray, b: &StridedArray, f: F) -> Result<StridedArray>
where
    F: Fn(f64, f64) -> bool,
{
    require_real(a, "compare")?;
    require_real(b, "compare")?;
    let dims = broadcast_shape(a.dims(), b.dims())?;
    let av = a.broadcast_to(&dims)?.to_vec::<f64>();
    let bv = b.broadcast_to(&dims)?.to_vec::<f64>();
    let values: Vec<bool> = av.iter().zip(bv.iter()).map(|(&x, &y)| f(x, y)).collect();
    let out = StridedArray::from_vec(&dims, values)?;
    debug_assert_eq!(out.kind(), ElementKind::Bool);
    Ok(out)
}

// ============================================================================
// Math functions
// ============================================================================

/// A unary math function applied element-wise by [`unary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    /// Natural logarithm.
    Ln,
    Log10,
    Log2,
    Sqrt,
    Cbrt,
    Abs,
    Neg,
    Signum,
    Ceil,
    Floor,
    /// Nearest integer, halves away from zero.
    Round,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Exp => "exp",
            UnaryOp::Ln => "ln",
            UnaryOp::Log10 => "log10",
            UnaryOp::Log2 => "log2",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Cbrt => "cbrt",
            UnaryOp::Abs => "abs",
            UnaryOp::Neg => "neg",
            UnaryOp::Signum => "signum",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Floor => "floor",
            UnaryOp::Round => "round",
        }
    }

    /// Whether an integer input stays integral (and keeps its kind).
    fn preserves_integers(self) -> bool {
        matches!(
            self,
            UnaryOp::Abs
                | UnaryOp::Neg
                | UnaryOp::Signum
                | UnaryOp::Ceil
                | UnaryOp::Floor
                | UnaryOp::Round
        )
    }

    pub fn apply_real(self, x: f64) -> f64 {
        match self {
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Asin => x.asin(),
            UnaryOp::Acos => x.acos(),
            UnaryOp::Atan => x.atan(),
            UnaryOp::Sinh => x.sinh(),
            UnaryOp::Cosh => x.cosh(),
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Ln => x.ln(),
            UnaryOp::Log10 => x.log10(),
            UnaryOp::Log2 => x.log2(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Cbrt => x.cbrt(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Neg => -x,
            // signum of +-0.0 is 0 here, unlike f64::signum
            UnaryOp::Signum => {
                if x == 0.0 || x.is_nan() {
                    x
                } else {
                    x.signum()
                }
            }
            UnaryOp::Ceil => x.ceil(),
            UnaryOp::Floor => x.floor(),
            UnaryOp::Round => x.round(),
        }
    }

    /// Complex value of the function, `None` where it needs an ordering.
    pub fn apply_complex(self, z: Complex64) -> Option<Complex64> {
        Some(match self {
            UnaryOp::Sin => z.sin(),
            UnaryOp::Cos => z.cos(),
            UnaryOp::Tan => z.tan(),
            UnaryOp::Asin => z.asin(),
            UnaryOp::Acos => z.acos(),
            UnaryOp::Atan => z.atan(),
            UnaryOp::Sinh => z.sinh(),
            UnaryOp::Cosh => z.cosh(),
            UnaryOp::Tanh => z.tanh(),
            UnaryOp::Exp => z.exp(),
            UnaryOp::Ln => z.ln(),
            UnaryOp::Log10 => z.ln() / std::f64::consts::LN_10,
            UnaryOp::Log2 => z.ln() / std::f64::consts::LN_2,
            UnaryOp::Sqrt => z.sqrt(),
            UnaryOp::Cbrt => z.cbrt(),
            UnaryOp::Abs => Complex64::new(z.norm(), 0.0),
            UnaryOp::Neg => -z,
            UnaryOp::Signum | UnaryOp::Ceil | UnaryOp::Floor | UnaryOp::Round => return None,
        })
    }

    fn apply_integer<T: PrimInt + WrappingSub>(self, x: T) -> T {
        match self {
            UnaryOp::Neg => T::zero().wrapping_sub(&x),
            UnaryOp::Abs if x < T::zero() => T::zero().wrapping_sub(&x),
            UnaryOp::Signum if x < T::zero() => T::zero().wrapping_sub(&T::one()),
            UnaryOp::Signum if x > T::zero() => T::one(),
            UnaryOp::Signum => T::zero(),
            _ => x,
        }
    }
}

/// Apply `op` element-wise, producing a new array.
///
/// Result kinds: integer inputs keep their kind (booleans become `Int`)
/// under `abs`, `neg`, `signum` and the rounding functions, which wrap like
/// integer arithmetic; every other function yields `Double`. Complex inputs
/// yield `Complex`, except `abs` which yields the `Double` modulus.
///
/// # Errors
/// [`StridedError::Argument`] for `signum` and the rounding functions on a
/// complex array.
pub fn unary(x: &StridedArray, op: UnaryOp) -> Result<StridedArray> {
    match x.kind() {
        ElementKind::Complex => {
            let values = x
                .to_vec::<Complex64>()
                .into_iter()
                .map(|z| {
                    op.apply_complex(z).ok_or_else(|| {
                        StridedError::argument(format!(
                            "{} is not defined for complex arrays",
                            op.name()
                        ))
                    })
                })
                .collect::<Result<Vec<Complex64>>>()?;
            if op == UnaryOp::Abs {
                let moduli: Vec<f64> = values.into_iter().map(|z| z.re).collect();
                return StridedArray::from_vec(x.dims(), moduli);
            }
            StridedArray::from_vec(x.dims(), values)
        }
        ElementKind::Long if op.preserves_integers() => {
            let values: Vec<i64> = x
                .to_vec::<i64>()
                .into_iter()
                .map(|v| op.apply_integer(v))
                .collect();
            StridedArray::from_vec(x.dims(), values)
        }
        ElementKind::Int | ElementKind::Bool if op.preserves_integers() => {
            let values: Vec<i32> = x
                .to_vec::<i32>()
                .into_iter()
                .map(|v| op.apply_integer(v))
                .collect();
            StridedArray::from_vec(x.dims(), values)
        }
        _ => map(x, |v| op.apply_real(v)),
    }
}

macro_rules! unary_fns {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[doc = concat!("Element-wise `", stringify!($name), "`; see [`unary`] for result kinds.")]
            pub fn $name(x: &StridedArray) -> Result<StridedArray> {
                unary(x, UnaryOp::$op)
            }
        )*
    };
}

unary_fns! {
    sin => Sin,
    cos => Cos,
    tan => Tan,
    asin => Asin,
    acos => Acos,
    atan => Atan,
    sinh => Sinh,
    cosh => Cosh,
    tanh => Tanh,
    exp => Exp,
    ln => Ln,
    log10 => Log10,
    log2 => Log2,
    sqrt => Sqrt,
    cbrt => Cbrt,
    abs => Abs,
    neg => Neg,
    signum => Signum,
    ceil => Ceil,
    floor => Floor,
    round => Round,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strided_view::StridedError;

    fn make_tensor(rows: usize, cols: usize) -> StridedArray {
        StridedArray::from_fn(&[rows, cols], |idx| (idx[0] * cols + idx[1]) as f64).unwrap()
    }

    #[test]
    fn test_map_transposed() {
        let a = make_tensor(8, 5);
        let t = a.transpose();
        let out = map(&t, |x| x * 2.0).unwrap();
        assert_eq!(out.dims(), &[5, 8]);
        for i in 0..5 {
            for j in 0..8 {
                let expected = a.get::<f64>(&[j, i]).unwrap() * 2.0;
                assert_relative_eq!(out.get::<f64>(&[i, j]).unwrap(), expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_broadcast_add_column_and_row() {
        let col = StridedArray::from_vec(&[3, 1], vec![1.0, 2.0, 3.0]).unwrap();
        let row = StridedArray::from_slice(&[10.0, 20.0]);
        let sum = add(&col, &row).unwrap();
        assert_eq!(sum.dims(), &[3, 2]);
        assert_eq!(sum.get::<f64>(&[2, 1]).unwrap(), 23.0);
        assert_eq!(sum.get::<f64>(&[0, 0]).unwrap(), 11.0);
    }

    #[test]
    fn test_incompatible_shapes() {
        let a = make_tensor(3, 2);
        let b = make_tensor(4, 2);
        assert!(matches!(
            mul(&a, &b),
            Err(StridedError::NonConformant { .. })
        ));
    }

    #[test]
    fn test_inplace_keeps_kind() {
        let a = StridedArray::from_slice(&[1i32, 2, 3]);
        map_inplace(&a, |x| x * 1.5).unwrap();
        assert_eq!(a.kind(), ElementKind::Int);
        assert_eq!(a.to_vec::<i32>(), vec![1, 3, 4]);

        let b = StridedArray::from_slice(&[1.0, 1.0, 1.0]);
        zip_map_into(&b, &StridedArray::from_slice(&[2.0]), |x, y| x - y).unwrap();
        assert_eq!(b.to_vec::<f64>(), vec![-1.0; 3]);
    }

    #[test]
    fn test_integer_arithmetic_keeps_kind() {
        let a = StridedArray::from_slice(&[i64::MAX - 1, 7]);
        let b = StridedArray::from_slice(&[1i64]);
        let s = add(&a, &b).unwrap();
        assert_eq!(s.kind(), ElementKind::Long);
        assert_eq!(s.to_vec::<i64>(), vec![i64::MAX, 8]);
        // wraps like two's complement
        assert_eq!(add(&s, &b).unwrap().to_vec::<i64>()[0], i64::MIN);

        let flags = StridedArray::from_slice(&[true, true]);
        let two = add(&flags, &flags).unwrap();
        assert_eq!(two.kind(), ElementKind::Int);
        assert_eq!(two.to_vec::<i32>(), vec![2, 2]);

        let num = StridedArray::from_slice(&[7i32, -7]);
        let q = div(&num, &StridedArray::from_slice(&[2i32])).unwrap();
        assert_eq!(q.to_vec::<i32>(), vec![3, -3]);
        assert!(matches!(
            div(&a, &StridedArray::from_slice(&[0i64])),
            Err(StridedError::Argument(_))
        ));
        let min = StridedArray::from_slice(&[i64::MIN]);
        let neg_one = StridedArray::from_slice(&[-1i64]);
        assert_eq!(div(&min, &neg_one).unwrap().to_vec::<i64>(), vec![i64::MIN]);
    }

    #[test]
    fn test_complex_arithmetic_stays_complex() {
        let a = StridedArray::from_slice(&[Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)]);
        let b = StridedArray::from_slice(&[Complex64::new(0.0, 1.0)]);
        let s = add(&a, &b).unwrap();
        assert_eq!(s.kind(), ElementKind::Complex);
        assert_eq!(s.to_vec::<Complex64>()[1], Complex64::new(3.0, 5.0));
        let p = mul(&a, &b).unwrap();
        assert_eq!(p.to_vec::<Complex64>()[0], Complex64::new(-2.0, 1.0));

        // a real operand promotes to complex
        let r = sub(&a, &StridedArray::from_slice(&[1.0])).unwrap();
        assert_eq!(r.kind(), ElementKind::Complex);
        assert_eq!(r.to_vec::<Complex64>()[0], Complex64::new(0.0, 2.0));

        assert!(matches!(map(&a, |x| x), Err(StridedError::Argument(_))));
        assert!(matches!(
            compare(&a, &b, |x, y| x < y),
            Err(StridedError::Argument(_))
        ));
        let conj = map_complex(&a, |z| z.conj()).unwrap();
        assert_eq!(conj.to_vec::<Complex64>()[0], Complex64::new(1.0, -2.0));
        let q = zip_map_complex(&a, &b, |x, y| x / y).unwrap();
        assert_eq!(q.to_vec::<Complex64>()[0], Complex64::new(2.0, -1.0));
    }

    #[test]
    fn test_math_functions() {
        let x = StridedArray::from_slice(&[0.0, 1.0, 4.0]);
        assert_eq!(sqrt(&x).unwrap().to_vec::<f64>(), vec![0.0, 1.0, 2.0]);
        let e = exp(&x).unwrap().to_vec::<f64>();
        assert_relative_eq!(e[1], std::f64::consts::E, epsilon = 1e-12);
        let back = ln(&exp(&x).unwrap()).unwrap().to_vec::<f64>();
        assert_relative_eq!(back[2], 4.0, epsilon = 1e-12);
        assert_relative_eq!(sin(&x).unwrap().to_vec::<f64>()[1], 1f64.sin(), epsilon = 1e-15);
        let thousand = StridedArray::from_slice(&[1000.0]);
        assert_relative_eq!(log10(&thousand).unwrap().to_vec::<f64>()[0], 3.0, epsilon = 1e-12);

        let r = round(&StridedArray::from_slice(&[-2.5, 0.4, 2.5])).unwrap();
        assert_eq!(r.to_vec::<f64>(), vec![-3.0, 0.0, 3.0]);
        assert_eq!(floor(&StridedArray::from_slice(&[-0.5])).unwrap().to_vec::<f64>(), vec![-1.0]);

        let l = StridedArray::from_slice(&[-5i64, 0, 9]);
        let a = abs(&l).unwrap();
        assert_eq!(a.kind(), ElementKind::Long);
        assert_eq!(a.to_vec::<i64>(), vec![5, 0, 9]);
        assert_eq!(signum(&l).unwrap().to_vec::<i64>(), vec![-1, 0, 1]);
        assert_eq!(sqrt(&l).unwrap().kind(), ElementKind::Double);
    }

    #[test]
    fn test_complex_math_functions() {
        let z = StridedArray::from_slice(&[Complex64::new(3.0, 4.0), Complex64::new(-1.0, 0.0)]);
        let m = abs(&z).unwrap();
        assert_eq!(m.kind(), ElementKind::Double);
        assert_eq!(m.to_vec::<f64>(), vec![5.0, 1.0]);

        let r = sqrt(&z).unwrap().to_vec::<Complex64>();
        assert_relative_eq!(r[0].re, 2.0, epsilon = 1e-12);
        assert_relative_eq!(r[0].im, 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[1].im, 1.0, epsilon = 1e-12);

        let half_turn = StridedArray::from_slice(&[Complex64::new(0.0, std::f64::consts::PI)]);
        let e = exp(&half_turn).unwrap().to_vec::<Complex64>();
        assert_relative_eq!(e[0].re, -1.0, epsilon = 1e-12);
        assert!(matches!(round(&z), Err(StridedError::Argument(_))));
    }

    #[test]
    fn test_compare_and_div() {
        let a = StridedArray::from_slice(&[1.0, 4.0, 9.0]);
        let b = StridedArray::from_slice(&[2.0]);
        let mask = compare(&a, &b, |x, y| x > y).unwrap();
        assert_eq!(mask.to_vec::<bool>(), vec![false, true, true]);
        let q = div(&a, &b).unwrap();
        assert_eq!(q.to_vec::<f64>(), vec![0.5, 2.0, 4.5]);
        let d = sub(&a, &b).unwrap();
        assert_eq!(d.to_vec::<f64>(), vec![-1.0, 2.0, 7.0]);
    }
}
