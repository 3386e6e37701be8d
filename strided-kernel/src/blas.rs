//! Portable BLAS-style operations on strided arrays.
//!
//! Vectors are taken in linear (column-major) order regardless of their
//! shape. Matrix operands must be 2-d. Shape checks run before anything is
//! written and report both operand shapes; the `check_*` helpers are shared
//! with optimized implementations so that every backend rejects exactly the
//! same inputs.
//!
//! Products and [`dot`] are real: complex operands are an argument error.
//! [`dotu`] and [`dotc`] are the complex inner products. The level-1
//! norms, [`iamax`], [`scal`] and [`axpy`] also accept complex vectors, with
//! BLAS's `|re| + |im|` magnitude for [`asum`] and [`iamax`].

use strided_view::{Complex64, ElementKind, StridedArray, StridedError};

use crate::map_view::{map_inplace, require_real};
use crate::Result;

/// Whether a matrix operand is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transpose {
    #[default]
    Keep,
    Transpose,
}

impl Transpose {
    /// Shape of `op(A)` for a stored `rows x cols` matrix.
    #[inline]
    pub fn apply(self, rows: usize, cols: usize) -> (usize, usize) {
        match self {
            Transpose::Keep => (rows, cols),
            Transpose::Transpose => (cols, rows),
        }
    }

    /// Convert to the BLAS character representation.
    pub fn to_char(self) -> u8 {
        match self {
            Transpose::Keep => b'N',
            Transpose::Transpose => b'T',
        }
    }
}

// ============================================================================
// Conformance checks
// ============================================================================

/// Shape of `op(a)` as `(rows, cols)`.
pub fn op_dims(a: &StridedArray, t: Transpose) -> Result<(usize, usize)> {
    let (r, c) = a.require_matrix()?;
    Ok(t.apply(r, c))
}

pub fn check_same_len(x: &StridedArray, y: &StridedArray) -> Result<usize> {
    if x.len() != y.len() {
        return Err(StridedError::non_conformant(x.dims(), y.dims()));
    }
    Ok(x.len())
}

/// Validate `y ← α·op(A)·x + β·y`, returning `(m, n)` of `op(A)`.
pub fn check_gemv(
    trans: Transpose,
    a: &StridedArray,
    x: &StridedArray,
    y: &StridedArray,
) -> Result<(usize, usize)> {
    for operand in [a, x, y] {
        require_real(operand, "gemv")?;
    }
    let (m, n) = op_dims(a, trans)?;
    if x.len() != n {
        return Err(StridedError::non_conformant(&[m, n], x.dims()));
    }
    if y.len() != m {
        return Err(StridedError::non_conformant(&[m, n], y.dims()));
    }
    Ok((m, n))
}

/// Validate `A ← α·x·yᵀ + A`, returning `(m, n)` of `A`.
pub fn check_ger(x: &StridedArray, y: &StridedArray, a: &StridedArray) -> Result<(usize, usize)> {
    for operand in [x, y, a] {
        require_real(operand, "ger")?;
    }
    let (m, n) = a.require_matrix()?;
    if x.len() != m {
        return Err(StridedError::non_conformant(x.dims(), a.dims()));
    }
    if y.len() != n {
        return Err(StridedError::non_conformant(a.dims(), y.dims()));
    }
    Ok((m, n))
}

/// Validate `C ← α·op(A)·op(B) + β·C`, returning `(m, n, k)`.
pub fn check_gemm(
    trans_a: Transpose,
    a: &StridedArray,
    trans_b: Transpose,
    b: &StridedArray,
    c: &StridedArray,
) -> Result<(usize, usize, usize)> {
    for operand in [a, b, c] {
        require_real(operand, "gemm")?;
    }
    let (m, k) = op_dims(a, trans_a)?;
    let (kb, n) = op_dims(b, trans_b)?;
    if k != kb {
        return Err(StridedError::non_conformant(&[m, k], &[kb, n]));
    }
    let (cm, cn) = c.require_matrix()?;
    if cm != m || cn != n {
        return Err(StridedError::non_conformant(&[m, n], c.dims()));
    }
    Ok((m, n, k))
}

/// Element `(i, j)` of `op(A)` where `data` holds the stored `rows x _`
/// matrix in column-major order.
#[inline]
pub fn op_at(data: &[f64], rows: usize, t: Transpose, i: usize, j: usize) -> f64 {
    match t {
        Transpose::Keep => data[i + j * rows],
        Transpose::Transpose => data[j + i * rows],
    }
}

// ============================================================================
// Level 1
// ============================================================================

/// Real inner product.
///
/// # Errors
/// [`StridedError::Argument`] for complex operands; use [`dotu`] or [`dotc`].
pub fn dot(x: &StridedArray, y: &StridedArray) -> Result<f64> {
    require_real(x, "dot")?;
    require_real(y, "dot")?;
    check_same_len(x, y)?;
    let xv = x.to_vec::<f64>();
    let yv = y.to_vec::<f64>();
    Ok(xv.iter().zip(yv.iter()).map(|(&a, &b)| a * b).sum())
}

/// Unconjugated complex inner product `Σ xᵢ·yᵢ`.
pub fn dotu(x: &StridedArray, y: &StridedArray) -> Result<Complex64> {
    check_same_len(x, y)?;
    let xv = x.to_vec::<Complex64>();
    let yv = y.to_vec::<Complex64>();
    Ok(xv.iter().zip(yv.iter()).map(|(a, b)| a * b).sum())
}

/// Conjugated complex inner product `Σ conj(xᵢ)·yᵢ`.
pub fn dotc(x: &StridedArray, y: &StridedArray) -> Result<Complex64> {
    check_same_len(x, y)?;
    let xv = x.to_vec::<Complex64>();
    let yv = y.to_vec::<Complex64>();
    Ok(xv.iter().zip(yv.iter()).map(|(a, b)| a.conj() * b).sum())
}

/// `|re| + |im|`, the magnitude BLAS uses for complex `asum` and `iamax`.
#[inline]
fn abs1(z: Complex64) -> f64 {
    z.re.abs() + z.im.abs()
}

/// Euclidean norm.
pub fn nrm2(x: &StridedArray) -> f64 {
    if x.kind() == ElementKind::Complex {
        return x
            .to_vec::<Complex64>()
            .iter()
            .map(|z| z.norm_sqr())
            .sum::<f64>()
            .sqrt();
    }
    x.to_vec::<f64>().iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Sum of absolute values.
pub fn asum(x: &StridedArray) -> f64 {
    if x.kind() == ElementKind::Complex {
        return x.to_vec::<Complex64>().into_iter().map(abs1).sum();
    }
    x.to_vec::<f64>().iter().map(|v| v.abs()).sum()
}

/// Linear position of the first element with the largest absolute value.
pub fn iamax(x: &StridedArray) -> Result<usize> {
    let magnitudes: Vec<f64> = if x.kind() == ElementKind::Complex {
        x.to_vec::<Complex64>().into_iter().map(abs1).collect()
    } else {
        x.to_vec::<f64>().iter().map(|v| v.abs()).collect()
    };
    if magnitudes.is_empty() {
        return Err(StridedError::argument("iamax of an empty array"));
    }
    let mut best = 0usize;
    for (i, &v) in magnitudes.iter().enumerate().skip(1) {
        if v > magnitudes[best] {
            best = i;
        }
    }
    Ok(best)
}

/// `x ← α·x`.
pub fn scal(alpha: f64, x: &StridedArray) -> Result<()> {
    if x.kind() == ElementKind::Complex {
        let scaled: Vec<Complex64> = x
            .to_vec::<Complex64>()
            .into_iter()
            .map(|z| z * alpha)
            .collect();
        return x.write_all(&scaled);
    }
    map_inplace(x, |v| alpha * v)
}

/// `y ← α·x + y`.
///
/// A complex `y` accumulates in complex arithmetic.
///
/// # Errors
/// [`StridedError::Argument`] when `x` is complex but `y` is not.
pub fn axpy(alpha: f64, x: &StridedArray, y: &StridedArray) -> Result<()> {
    check_same_len(x, y)?;
    if y.kind() == ElementKind::Complex {
        if alpha == 0.0 {
            return Ok(());
        }
        let xv = x.to_vec::<Complex64>();
        let yv = y.to_vec::<Complex64>();
        let out: Vec<Complex64> = xv
            .iter()
            .zip(yv.iter())
            .map(|(a, b)| a * alpha + b)
            .collect();
        return y.write_all(&out);
    }
    require_real(x, "axpy into a real array")?;
    if alpha == 0.0 {
        return Ok(());
    }
    let xv = x.to_vec::<f64>();
    let yv = y.to_vec::<f64>();
    let out: Vec<f64> = xv.iter().zip(yv.iter()).map(|(&a, &b)| alpha * a + b).collect();
    y.write_all(&out)
}

// ============================================================================
// Level 2
// ============================================================================

/// `y ← α·op(A)·x + β·y`.
pub fn gemv(
    trans: Transpose,
    alpha: f64,
    a: &StridedArray,
    x: &StridedArray,
    beta: f64,
    y: &StridedArray,
) -> Result<()> {
    let (m, n) = check_gemv(trans, a, x, y)?;
    let (rows, _) = a.require_matrix()?;
    let av = a.to_vec::<f64>();
    let xv = x.to_vec::<f64>();
    let yv = y.to_vec::<f64>();
    let out: Vec<f64> = (0..m)
        .map(|i| {
            let s: f64 = (0..n).map(|j| op_at(&av, rows, trans, i, j) * xv[j]).sum();
            scale_add(alpha * s, beta, yv[i])
        })
        .collect();
    y.write_all(&out)
}

/// Rank-1 update `A ← α·x·yᵀ + A`.
pub fn ger(alpha: f64, x: &StridedArray, y: &StridedArray, a: &StridedArray) -> Result<()> {
    let (m, n) = check_ger(x, y, a)?;
    let xv = x.to_vec::<f64>();
    let yv = y.to_vec::<f64>();
    let mut av = a.to_vec::<f64>();
    for j in 0..n {
        for i in 0..m {
            av[i + j * m] += alpha * xv[i] * yv[j];
        }
    }
    a.write_all(&av)
}

// ============================================================================
// Level 3
// ============================================================================

/// `C ← α·op(A)·op(B) + β·C`.
///
/// With `β = 0` the previous contents of `C` are ignored, NaN included.
#[allow(clippy::too_many_arguments)]
pub fn gemm(
    trans_a: Transpose,
    trans_b: Transpose,
    alpha: f64,
    a: &StridedArray,
    b: &StridedArray,
    beta: f64,
    c: &StridedArray,
) -> Result<()> {
    let (m, n, k) = check_gemm(trans_a, a, trans_b, b, c)?;
    let a_rows = a.dims()[0];
    let b_rows = b.dims()[0];
    let av = a.to_vec::<f64>();
    let bv = b.to_vec::<f64>();
    let cv = c.to_vec::<f64>();
    let mut out = vec![0.0; m * n];
    for j in 0..n {
        for i in 0..m {
            let mut s = 0.0;
            for l in 0..k {
                s += op_at(&av, a_rows, trans_a, i, l) * op_at(&bv, b_rows, trans_b, l, j);
            }
            out[i + j * m] = scale_add(alpha * s, beta, cv[i + j * m]);
        }
    }
    c.write_all(&out)
}

/// `value + β·old`, treating `β = 0` as overwrite.
#[inline]
pub fn scale_add(value: f64, beta: f64, old: f64) -> f64 {
    if beta == 0.0 {
        value
    } else {
        value + beta * old
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: usize, cols: usize, data: &[f64]) -> StridedArray {
        StridedArray::from_row_major(&[rows, cols], data).unwrap()
    }

    #[test]
    fn test_level1() {
        let x = StridedArray::from_slice(&[1.0, -2.0, 3.0]);
        let y = StridedArray::from_slice(&[4.0, 5.0, 6.0]);
        assert_relative_eq!(dot(&x, &y).unwrap(), 12.0, epsilon = 1e-12);
        assert_relative_eq!(nrm2(&x), 14f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(asum(&x), 6.0, epsilon = 1e-12);
        assert_eq!(iamax(&x).unwrap(), 2);

        axpy(2.0, &x, &y).unwrap();
        assert_eq!(y.to_vec::<f64>(), vec![6.0, 1.0, 12.0]);
        scal(-1.0, &x).unwrap();
        assert_eq!(x.to_vec::<f64>(), vec![-1.0, 2.0, -3.0]);

        let short = StridedArray::from_slice(&[1.0]);
        assert!(matches!(
            dot(&x, &short),
            Err(StridedError::NonConformant { .. })
        ));
    }

    #[test]
    fn test_complex_level1() {
        let x = StridedArray::from_slice(&[Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)]);
        let y = StridedArray::from_slice(&[Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)]);
        // (1+2i)^2 + (3+4i)^2 = (-3+4i) + (-7+24i)
        assert_eq!(dotu(&x, &y).unwrap(), Complex64::new(-10.0, 28.0));
        // |1+2i|^2 + |3+4i|^2
        assert_eq!(dotc(&x, &y).unwrap(), Complex64::new(30.0, 0.0));
        assert!(matches!(dot(&x, &y), Err(StridedError::Argument(_))));

        assert_relative_eq!(nrm2(&x), 30f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(asum(&x), 10.0, epsilon = 1e-12);
        assert_eq!(iamax(&x).unwrap(), 1);

        scal(2.0, &x).unwrap();
        assert_eq!(x.to_vec::<Complex64>()[0], Complex64::new(2.0, 4.0));
        axpy(-1.0, &StridedArray::from_slice(&[1.0, 1.0]), &y).unwrap();
        assert_eq!(y.to_vec::<Complex64>()[1], Complex64::new(2.0, 4.0));
        let real = StridedArray::from_slice(&[0.0, 0.0]);
        assert!(matches!(axpy(1.0, &x, &real), Err(StridedError::Argument(_))));
    }

    #[test]
    fn test_products_reject_complex() {
        let a = StridedArray::from_row_major(&[1, 1], &[Complex64::new(0.0, 1.0)]).unwrap();
        let c = StridedArray::zeros(ElementKind::Double, &[1, 1]).unwrap();
        assert!(matches!(
            gemm(Transpose::Keep, Transpose::Keep, 1.0, &a, &a, 0.0, &c),
            Err(StridedError::Argument(_))
        ));
        let v = StridedArray::from_slice(&[1.0]);
        assert!(gemv(Transpose::Keep, 1.0, &a, &v, 0.0, &v).is_err());
        assert!(ger(1.0, &v, &v, &a).is_err());
    }

    #[test]
    fn test_gemv_keep_and_transpose() {
        let a = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let x = StridedArray::from_slice(&[1.0, 1.0, 1.0]);
        let y = StridedArray::from_slice(&[1.0, 1.0]);
        gemv(Transpose::Keep, 1.0, &a, &x, 2.0, &y).unwrap();
        assert_eq!(y.to_vec::<f64>(), vec![8.0, 17.0]);

        let x2 = StridedArray::from_slice(&[1.0, -1.0]);
        let y2 = StridedArray::zeros(ElementKind::Double, &[3]).unwrap();
        gemv(Transpose::Transpose, 1.0, &a, &x2, 0.0, &y2).unwrap();
        assert_eq!(y2.to_vec::<f64>(), vec![-3.0, -3.0, -3.0]);

        assert!(matches!(
            gemv(Transpose::Keep, 1.0, &a, &x2, 0.0, &y2),
            Err(StridedError::NonConformant { .. })
        ));
    }

    #[test]
    fn test_ger_accumulates() {
        let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let x = StridedArray::from_slice(&[1.0, 2.0]);
        let y = StridedArray::from_slice(&[3.0, 4.0]);
        ger(0.5, &x, &y, &a).unwrap();
        assert_eq!(a.row(0).unwrap().to_vec::<f64>(), vec![2.5, 2.0]);
        assert_eq!(a.row(1).unwrap().to_vec::<f64>(), vec![3.0, 5.0]);
        assert!(ger(1.0, &y, &StridedArray::from_slice(&[1.0]), &a).is_err());
    }

    #[test]
    fn test_gemm_transpose_flags() {
        let a = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = matrix(2, 3, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = StridedArray::zeros(ElementKind::Double, &[2, 2]).unwrap();
        gemm(Transpose::Keep, Transpose::Transpose, 1.0, &a, &b, 0.0, &c).unwrap();
        // A * B^T
        assert_eq!(c.row(0).unwrap().to_vec::<f64>(), vec![50.0, 68.0]);
        assert_eq!(c.row(1).unwrap().to_vec::<f64>(), vec![122.0, 167.0]);

        let c2 = StridedArray::filled(ElementKind::Double, &[3, 3], 1.0).unwrap();
        gemm(Transpose::Transpose, Transpose::Keep, 2.0, &a, &b, -1.0, &c2).unwrap();
        // 2 * (A^T B)[0,0] - 1 = 2 * (1*7 + 4*10) - 1
        assert_relative_eq!(c2.get::<f64>(&[0, 0]).unwrap(), 93.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gemm_non_conformant_reports_shapes() {
        let a = matrix(2, 3, &[0.0; 6]);
        let b = matrix(2, 3, &[0.0; 6]);
        let c = StridedArray::zeros(ElementKind::Double, &[2, 3]).unwrap();
        match gemm(Transpose::Keep, Transpose::Keep, 1.0, &a, &b, 0.0, &c) {
            Err(StridedError::NonConformant { lhs, rhs }) => {
                assert_eq!(lhs, vec![2, 3]);
                assert_eq!(rhs, vec![2, 3]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        // C left untouched on failure
        assert_eq!(c.to_vec::<f64>(), vec![0.0; 6]);
    }

    #[test]
    fn test_gemm_beta_zero_ignores_nan() {
        let a = matrix(1, 1, &[2.0]);
        let c = StridedArray::filled(ElementKind::Double, &[1, 1], f64::NAN).unwrap();
        gemm(Transpose::Keep, Transpose::Keep, 1.0, &a, &a, 0.0, &c).unwrap();
        assert_eq!(c.get::<f64>(&[0, 0]).unwrap(), 4.0);
    }

    #[test]
    fn test_gemm_output_aliases_input() {
        let a = matrix(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        gemm(Transpose::Keep, Transpose::Keep, 1.0, &a.clone(), &a.clone(), 0.0, &a).unwrap();
        assert_eq!(a.row(0).unwrap().to_vec::<f64>(), vec![7.0, 10.0]);
        assert_eq!(a.row(1).unwrap().to_vec::<f64>(), vec![15.0, 22.0]);
    }
}
