//! Array constructors shared by every backend's [`ArrayFactory`](crate::ArrayFactory).

use strided_view::{dispatch_kind, ElementKind, Result, StridedArray, StridedError};

/// `n x n` identity matrix of kind `Double`.
pub fn eye(n: usize) -> Result<StridedArray> {
    let out = StridedArray::zeros(ElementKind::Double, &[n, n])?;
    out.diagonal()?.fill(1.0);
    Ok(out)
}

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Result<StridedArray> {
    let values: Vec<f64> = match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
                .collect()
        }
    };
    Ok(StridedArray::from_slice(&values))
}

/// `start, start + step, ...` up to but excluding `end`, as a `Long` array.
///
/// # Errors
/// [`StridedError::Argument`] if `step == 0`.
pub fn range(start: i64, end: i64, step: i64) -> Result<StridedArray> {
    if step == 0 {
        return Err(StridedError::argument("range step must be non-zero"));
    }
    let mut values = Vec::new();
    let mut v = start;
    while (step > 0 && v < end) || (step < 0 && v > end) {
        values.push(v);
        v = match v.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(StridedArray::from_slice(&values))
}

/// Square matrix with the vector `x` on its diagonal, keeping the element
/// kind. For a matrix input, its diagonal as a view.
///
/// # Errors
/// [`StridedError::Argument`] for inputs of rank other than 1 or 2.
pub fn diag(x: &StridedArray) -> Result<StridedArray> {
    match x.ndim() {
        1 => {
            let n = x.len();
            let out = StridedArray::zeros(x.kind(), &[n, n])?;
            dispatch_kind!(x.kind(), T => out.diagonal()?.write_all(&x.to_vec::<T>())?);
            Ok(out)
        }
        2 => x.diagonal(),
        d => Err(StridedError::argument(format!(
            "diag expects a 1-d or 2-d array, got rank {d}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eye() {
        let i = eye(3).unwrap();
        assert_eq!(i.dims(), &[3, 3]);
        assert_eq!(i.get::<f64>(&[1, 1]).unwrap(), 1.0);
        assert_eq!(i.get::<f64>(&[1, 2]).unwrap(), 0.0);
        assert_eq!(strided_kernel::sum(&i).unwrap(), 3.0);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(0.0, 1.0, 11).unwrap().to_vec::<f64>();
        assert_eq!(v.len(), 11);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[10], 1.0);
        assert_relative_eq!(v[3], 0.3, epsilon = 1e-12);
        assert_eq!(linspace(2.0, 5.0, 1).unwrap().to_vec::<f64>(), vec![2.0]);
        assert!(linspace(2.0, 5.0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_range() {
        let r = range(0, 10, 3).unwrap();
        assert_eq!(r.kind(), ElementKind::Long);
        assert_eq!(r.to_vec::<i64>(), vec![0, 3, 6, 9]);
        assert_eq!(range(5, 0, -2).unwrap().to_vec::<i64>(), vec![5, 3, 1]);
        assert!(range(0, 5, -1).unwrap().is_empty());
        assert!(matches!(range(0, 5, 0), Err(StridedError::Argument(_))));
    }

    #[test]
    fn test_diag_both_ways() {
        let v = StridedArray::from_slice(&[1i32, 2, 3]);
        let m = diag(&v).unwrap();
        assert_eq!(m.kind(), ElementKind::Int);
        assert_eq!(m.get::<i32>(&[2, 2]).unwrap(), 3);
        assert_eq!(m.get::<i32>(&[0, 2]).unwrap(), 0);

        let d = diag(&m).unwrap();
        assert!(d.shares_storage(&m));
        assert_eq!(d.to_vec::<i32>(), vec![1, 2, 3]);

        let cube = StridedArray::zeros(ElementKind::Double, &[2, 2, 2]).unwrap();
        assert!(diag(&cube).is_err());
    }
}
