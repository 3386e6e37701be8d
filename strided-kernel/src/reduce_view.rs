//! Reductions over whole arrays and along single axes.
//!
//! Whole-array reductions return a scalar. Per-axis reductions return a new
//! `Double` array with the reduced axis removed (a reduction of a 1-d array
//! along axis 0 has shape `[1]`). `cumsum_axis` keeps the input shape.
//!
//! Empty inputs: `sum` is 0, `prod` is 1, `min` is +inf, `max` is -inf,
//! `mean`/`var`/`std` are NaN. `var` is the sample variance (n - 1).
//!
//! The `f64` reductions reject complex arrays. Integer kinds are read
//! exactly; `sum` accumulates them in 128 bits and rounds once. The exact
//! integer results come from [`sum_long`], [`prod_long`], [`min_long`] and
//! [`max_long`], which fail on overflow instead of wrapping. Complex arrays
//! reduce through [`sum_complex`], [`prod_complex`] and [`mean_complex`], and
//! [`cumsum`] keeps complex values complex.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use strided_view::{Complex64, ElementKind, MultiIndex, StridedArray, StridedError};

use crate::map_view::require_real;
use crate::Result;

/// Full reduction with map function: `reduce(init, op, map.(src))`.
pub fn reduce<M, R, U>(src: &StridedArray, map_fn: M, reduce_fn: R, init: U) -> Result<U>
where
    M: Fn(f64) -> U,
    R: Fn(U, U) -> U,
{
    require_real(src, "reduce")?;
    Ok(src
        .to_vec::<f64>()
        .into_iter()
        .fold(init, |acc, x| reduce_fn(acc, map_fn(x))))
}

/// Reduce every 1-d lane along `axis` with `lane_fn`.
///
/// Lanes are visited in column-major order over the remaining axes, which
/// is also the linear order of the output.
pub fn reduce_axis<F>(src: &StridedArray, axis: usize, lane_fn: F) -> Result<StridedArray>
where
    F: Fn(&[f64]) -> f64 + Sync + Send,
{
    require_real(src, "reduce_axis")?;
    let rank = src.ndim();
    if axis >= rank {
        return Err(StridedError::argument(format!(
            "axis {axis} out of range for rank {rank}"
        )));
    }
    let mut out_dims: Vec<usize> = src
        .dims()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != axis)
        .map(|(_, &d)| d)
        .collect();
    if out_dims.is_empty() {
        out_dims.push(1);
    }
    let out_len: usize = out_dims.iter().product();

    if src.dims()[axis] == 0 {
        let empty = lane_fn(&[]);
        return StridedArray::from_vec(&out_dims, vec![empty; out_len]);
    }

    #[cfg(feature = "parallel")]
    let values: Vec<f64> = (0..out_len)
        .into_par_iter()
        .map(|i| src.vector(axis, i).map(|lane| lane_fn(&lane.to_vec::<f64>())))
        .collect::<Result<Vec<f64>>>()?;

    #[cfg(not(feature = "parallel"))]
    let values: Vec<f64> = (0..out_len)
        .map(|i| src.vector(axis, i).map(|lane| lane_fn(&lane.to_vec::<f64>())))
        .collect::<Result<Vec<f64>>>()?;

    StridedArray::from_vec(&out_dims, values)
}

// ============================================================================
// Lane statistics
// ============================================================================

pub(crate) fn lane_sum(x: &[f64]) -> f64 {
    x.iter().sum()
}

pub(crate) fn lane_mean(x: &[f64]) -> f64 {
    lane_sum(x) / x.len() as f64
}

pub(crate) fn lane_var(x: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = lane_mean(x);
    let ss: f64 = x.iter().map(|&v| (v - mean) * (v - mean)).sum();
    ss / (n - 1) as f64
}

pub(crate) fn lane_min(x: &[f64]) -> f64 {
    x.iter().copied().fold(f64::INFINITY, f64::min)
}

pub(crate) fn lane_max(x: &[f64]) -> f64 {
    x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn lane_prod(x: &[f64]) -> f64 {
    x.iter().product()
}

fn running_sum(x: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    x.iter()
        .map(|&v| {
            acc += v;
            acc
        })
        .collect()
}

fn overflow(routine: &str) -> StridedError {
    StridedError::argument(format!("{routine} overflows a 64-bit integer"))
}

/// Kind of a running sum over `kind`: integers widen to `Long`.
fn cumulative_kind(kind: ElementKind) -> ElementKind {
    if kind.is_integral() {
        ElementKind::Long
    } else {
        kind
    }
}

/// Write the running sum of `src` into `dst` in linear order.
fn running_sum_into(src: &StridedArray, dst: &StridedArray) -> Result<()> {
    match dst.kind() {
        ElementKind::Complex => {
            let mut acc = Complex64::new(0.0, 0.0);
            let values: Vec<Complex64> = src
                .to_vec::<Complex64>()
                .into_iter()
                .map(|v| {
                    acc += v;
                    acc
                })
                .collect();
            dst.write_all(&values)
        }
        ElementKind::Long => {
            let mut acc = 0i64;
            let values = src
                .to_vec::<i64>()
                .into_iter()
                .map(|v| {
                    acc = acc.checked_add(v).ok_or_else(|| overflow("cumsum"))?;
                    Ok(acc)
                })
                .collect::<Result<Vec<i64>>>()?;
            dst.write_all(&values)
        }
        _ => dst.write_all(&running_sum(&src.to_vec::<f64>())),
    }
}

fn integral_values(src: &StridedArray, routine: &str) -> Result<Vec<i64>> {
    if !src.kind().is_integral() {
        return Err(StridedError::argument(format!(
            "{routine} needs an integer array, got {}",
            src.kind()
        )));
    }
    Ok(src.to_vec::<i64>())
}

// ============================================================================
// Whole-array reductions
// ============================================================================

pub fn sum(src: &StridedArray) -> Result<f64> {
    require_real(src, "sum")?;
    if src.kind().is_integral() {
        let exact: i128 = src.to_vec::<i64>().into_iter().map(i128::from).sum();
        return Ok(exact as f64);
    }
    Ok(lane_sum(&src.to_vec::<f64>()))
}

pub fn mean(src: &StridedArray) -> Result<f64> {
    require_real(src, "mean")?;
    Ok(lane_mean(&src.to_vec::<f64>()))
}

/// Sample variance.
pub fn var(src: &StridedArray) -> Result<f64> {
    require_real(src, "var")?;
    Ok(lane_var(&src.to_vec::<f64>()))
}

pub fn std(src: &StridedArray) -> Result<f64> {
    Ok(var(src)?.sqrt())
}

pub fn min(src: &StridedArray) -> Result<f64> {
    require_real(src, "min")?;
    Ok(lane_min(&src.to_vec::<f64>()))
}

pub fn max(src: &StridedArray) -> Result<f64> {
    require_real(src, "max")?;
    Ok(lane_max(&src.to_vec::<f64>()))
}

pub fn prod(src: &StridedArray) -> Result<f64> {
    require_real(src, "prod")?;
    Ok(lane_prod(&src.to_vec::<f64>()))
}

/// Exact sum of an integer array.
///
/// # Errors
/// [`StridedError::Argument`] for floating kinds or when the sum leaves the
/// `i64` range.
pub fn sum_long(src: &StridedArray) -> Result<i64> {
    integral_values(src, "sum_long")?
        .into_iter()
        .try_fold(0i64, |acc, v| acc.checked_add(v))
        .ok_or_else(|| overflow("sum_long"))
}

/// Exact product of an integer array; 1 when empty.
pub fn prod_long(src: &StridedArray) -> Result<i64> {
    integral_values(src, "prod_long")?
        .into_iter()
        .try_fold(1i64, |acc, v| acc.checked_mul(v))
        .ok_or_else(|| overflow("prod_long"))
}

/// Smallest element of a non-empty integer array.
pub fn min_long(src: &StridedArray) -> Result<i64> {
    integral_values(src, "min_long")?
        .into_iter()
        .min()
        .ok_or_else(|| StridedError::argument("empty array has no extremum"))
}

/// Largest element of a non-empty integer array.
pub fn max_long(src: &StridedArray) -> Result<i64> {
    integral_values(src, "max_long")?
        .into_iter()
        .max()
        .ok_or_else(|| StridedError::argument("empty array has no extremum"))
}

/// Sum of any array read as complex.
pub fn sum_complex(src: &StridedArray) -> Complex64 {
    src.to_vec::<Complex64>().into_iter().sum()
}

/// Product of any array read as complex; 1 when empty.
pub fn prod_complex(src: &StridedArray) -> Complex64 {
    src.to_vec::<Complex64>().into_iter().product()
}

/// Mean of any array read as complex; NaN parts when empty.
pub fn mean_complex(src: &StridedArray) -> Complex64 {
    sum_complex(src) / src.len() as f64
}

/// Running sum in linear (column-major) order, same shape as `src`.
///
/// Integer kinds accumulate exactly into a `Long` array, complex stays
/// complex, everything else is `Double`.
///
/// # Errors
/// [`StridedError::Argument`] when an integer running sum overflows.
pub fn cumsum(src: &StridedArray) -> Result<StridedArray> {
    let out = StridedArray::zeros(cumulative_kind(src.kind()), src.dims())?;
    running_sum_into(src, &out)?;
    Ok(out)
}

// ============================================================================
// Per-axis reductions
// ============================================================================

pub fn sum_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, lane_sum)
}

pub fn mean_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, lane_mean)
}

pub fn var_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, lane_var)
}

pub fn std_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, |x| lane_var(x).sqrt())
}

pub fn min_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, lane_min)
}

pub fn max_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, lane_max)
}

pub fn prod_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    reduce_axis(src, axis, lane_prod)
}

/// Running sum along `axis`; the result has the shape of `src` and the
/// kind [`cumsum`] would give.
pub fn cumsum_axis(src: &StridedArray, axis: usize) -> Result<StridedArray> {
    let lanes = src.vectors(axis)?;
    let out = StridedArray::zeros(cumulative_kind(src.kind()), src.dims())?;
    for i in 0..lanes {
        running_sum_into(&src.vector(axis, i)?, &out.vector(axis, i)?)?;
    }
    Ok(out)
}

/// Linear position of the first maximum.
///
/// # Errors
/// [`StridedError::Argument`] for an empty array.
pub fn argmax(src: &StridedArray) -> Result<usize> {
    require_real(src, "argmax")?;
    if src.kind().is_integral() {
        return arg_best(src.to_vec::<i64>(), |candidate, best| candidate > best);
    }
    arg_best(src.to_vec::<f64>(), |candidate, best| candidate > best)
}

/// Linear position of the first minimum.
pub fn argmin(src: &StridedArray) -> Result<usize> {
    require_real(src, "argmin")?;
    if src.kind().is_integral() {
        return arg_best(src.to_vec::<i64>(), |candidate, best| candidate < best);
    }
    arg_best(src.to_vec::<f64>(), |candidate, best| candidate < best)
}

fn arg_best<T: Copy>(values: Vec<T>, better: impl Fn(T, T) -> bool) -> Result<usize> {
    if values.is_empty() {
        return Err(StridedError::argument("empty array has no extremum"));
    }
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, values[best]) {
            best = i;
        }
    }
    Ok(best)
}

/// Sum of the main diagonal of a matrix.
pub fn trace(src: &StridedArray) -> Result<f64> {
    sum(&src.diagonal()?)
}

/// Iterate `(multi-index, value)` pairs in column-major order.
pub fn for_each_indexed(src: &StridedArray, mut f: impl FnMut(&[usize], f64)) -> Result<()> {
    require_real(src, "for_each_indexed")?;
    let values = src.to_vec::<f64>();
    let mut iter = MultiIndex::new(src.dims());
    let mut k = 0usize;
    while iter.next().is_some() {
        f(iter.current(), values[k]);
        k += 1;
    }
    Ok(())
}
