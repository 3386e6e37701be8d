//! faer-backed backend.
//!
//! Matrix products and factorizations run through faer on dense column-major
//! copies of the operands. Everything else uses the portable defaults, so the
//! two backends differ only in floating rounding and in the signs of singular
//! vectors and eigenvectors. Non-symmetric eigenproblems are native only.

use std::cmp::Ordering;

use faer::linalg::matmul::matmul_with_conj;
use faer::mat::{MatMut, MatRef};
use faer::{Accum, Conj, Mat, Par};
use strided_kernel::{blas, Transpose};
use strided_view::{Complex64, Result, StridedArray, StridedError};

use crate::backend::{
    ArrayFactory, ArrayRoutines, Backend, Geev, Gesvd, Getrf, LinalgRoutines, Qr, Syev,
};
use crate::portable::{self, dense_matrix, normalize_qr};

/// Backend delegating products and factorizations to faer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl Backend for NativeBackend {
    fn name(&self) -> &'static str {
        "native-faer"
    }

    fn factory(&self) -> &dyn ArrayFactory {
        self
    }

    fn routines(&self) -> &dyn ArrayRoutines {
        self
    }

    fn linalg(&self) -> &dyn LinalgRoutines {
        self
    }
}

impl ArrayFactory for NativeBackend {}

/// Dense faer copy of a matrix operand.
fn to_faer(a: &StridedArray) -> Result<Mat<f64>> {
    let (m, n, data) = dense_matrix(a)?;
    Ok(Mat::from_fn(m, n, |i, j| data[i + j * m]))
}

fn op(mat: &Mat<f64>, t: Transpose) -> MatRef<'_, f64> {
    match t {
        Transpose::Keep => mat.as_ref(),
        Transpose::Transpose => mat.as_ref().transpose(),
    }
}

fn col_major(mat: MatRef<'_, f64>) -> Vec<f64> {
    let (m, n) = (mat.nrows(), mat.ncols());
    let mut out = Vec::with_capacity(m * n);
    for j in 0..n {
        for i in 0..m {
            out.push(mat[(i, j)]);
        }
    }
    out
}

/// `α·lhs·rhs + β·old`, with `old` given column-major.
fn product(lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>, alpha: f64, beta: f64, old: &[f64]) -> Vec<f64> {
    let (m, n) = (lhs.nrows(), rhs.ncols());
    // β = 0 must ignore the previous contents entirely
    let accum = if beta == 0.0 { Accum::Replace } else { Accum::Add };
    let mut dst = Mat::from_fn(m, n, |i, j| if beta == 0.0 { 0.0 } else { beta * old[i + j * m] });
    let dst_mut: MatMut<'_, f64> = dst.as_mut();
    matmul_with_conj(dst_mut, accum, lhs, Conj::No, rhs, Conj::No, alpha, Par::Seq);
    col_major(dst.as_ref())
}

impl ArrayRoutines for NativeBackend {
    fn gemv(
        &self,
        trans: Transpose,
        alpha: f64,
        a: &StridedArray,
        x: &StridedArray,
        beta: f64,
        y: &StridedArray,
    ) -> Result<()> {
        let (_, n) = blas::check_gemv(trans, a, x, y)?;
        let a_mat = to_faer(a)?;
        let xv = x.to_vec::<f64>();
        let x_mat = Mat::from_fn(n, 1, |i, _| xv[i]);
        let out = product(op(&a_mat, trans), x_mat.as_ref(), alpha, beta, &y.to_vec::<f64>());
        y.write_all(&out)
    }

    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: &StridedArray,
        b: &StridedArray,
        beta: f64,
        c: &StridedArray,
    ) -> Result<()> {
        blas::check_gemm(trans_a, a, trans_b, b, c)?;
        let a_mat = to_faer(a)?;
        let b_mat = to_faer(b)?;
        let out = product(
            op(&a_mat, trans_a),
            op(&b_mat, trans_b),
            alpha,
            beta,
            &c.to_vec::<f64>(),
        );
        c.write_all(&out)
    }
}

/// Convert a forward row permutation (`PA` row `i` is `A` row `fwd[i]`) into
/// the equivalent sequence of row swaps.
pub(crate) fn swap_sequence(fwd: &[usize]) -> Vec<usize> {
    let n = fwd.len();
    let mut row_at: Vec<usize> = (0..n).collect();
    let mut pos_of: Vec<usize> = (0..n).collect();
    let mut ipiv = Vec::with_capacity(n);
    for (i, &want) in fwd.iter().enumerate() {
        let p = pos_of[want];
        ipiv.push(p);
        let displaced = row_at[i];
        row_at.swap(i, p);
        pos_of[want] = i;
        pos_of[displaced] = p;
    }
    ipiv
}

fn native_error(routine: &str, e: impl std::fmt::Debug) -> StridedError {
    StridedError::NativeComputation {
        code: 1,
        message: format!("faer {routine} failed: {e:?}"),
    }
}

/// Column order that sorts `keys` under `cmp`.
fn sorted_order<K>(keys: &[K], cmp: impl Fn(&K, &K) -> Ordering) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| cmp(&keys[a], &keys[b]));
    order
}

/// Gather the columns of a column-major `rows x order.len()` buffer.
fn gather_columns<T: Copy>(data: &[T], rows: usize, order: &[usize]) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for &j in order {
        out.extend_from_slice(&data[j * rows..(j + 1) * rows]);
    }
    out
}

impl LinalgRoutines for NativeBackend {
    fn getrf(&self, a: &StridedArray) -> Result<Getrf> {
        let (m, n) = a.require_matrix()?;
        if m != n {
            log::warn!("native getrf: {m}x{n} is not square, using the portable factorization");
            return portable::getrf(a);
        }
        let mat = to_faer(a)?;
        let lu = mat.partial_piv_lu();
        let l = lu.L();
        let u = lu.U();
        let fwd: Vec<usize> = lu.P().arrays().0.to_vec();

        let mut combined = Vec::with_capacity(n * n);
        let mut info = 0;
        for j in 0..n {
            for i in 0..n {
                combined.push(if i > j { l[(i, j)] } else { u[(i, j)] });
            }
            if info == 0 && u[(j, j)] == 0.0 {
                info = j + 1;
            }
        }
        log::debug!("native getrf: {n}x{n}");
        Ok(Getrf {
            lu: StridedArray::from_vec(&[n, n], combined)?,
            ipiv: swap_sequence(&fwd),
            info,
        })
    }

    fn gesvd(&self, a: &StridedArray) -> Result<Gesvd> {
        let (m, n) = a.require_matrix()?;
        let mat = to_faer(a)?;
        let svd = mat.svd().map_err(|e| native_error("svd", e))?;
        let s_col = svd.S().column_vector();
        let s: Vec<f64> = (0..m.min(n)).map(|i| s_col[i]).collect();
        let u = svd.U();
        let v = svd.V();
        log::debug!("native gesvd: {m}x{n}");
        Ok(Gesvd {
            s,
            u: StridedArray::from_vec(&[m, m], col_major(u))?,
            vt: StridedArray::from_vec(&[n, n], col_major(v.transpose()))?,
        })
    }

    fn qr(&self, a: &StridedArray) -> Result<Qr> {
        let (m, n) = a.require_matrix()?;
        let mat = to_faer(a)?;
        let f = mat.qr();
        let q_mat = f.compute_Q();
        if q_mat.nrows() != m || q_mat.ncols() != m {
            log::warn!("native qr: unexpected Q shape, using the portable factorization");
            return portable::qr(a);
        }
        let r_ref = f.R();
        let mut r = vec![0.0; m * n];
        let k = m.min(n).min(r_ref.nrows());
        for j in 0..n.min(r_ref.ncols()) {
            for i in 0..k.min(j + 1) {
                r[i + j * m] = r_ref[(i, j)];
            }
        }
        let mut q = col_major(q_mat.as_ref());
        normalize_qr(m, n, &mut q, &mut r);
        log::debug!("native qr: {m}x{n}");
        Ok(Qr {
            q: StridedArray::from_vec(&[m, m], q)?,
            r: StridedArray::from_vec(&[m, n], r)?,
        })
    }

    fn syev(&self, a: &StridedArray) -> Result<Syev> {
        let (m, n) = a.require_matrix()?;
        if m != n {
            return portable::syev(a);
        }
        let mat = to_faer(a)?;
        let evd = mat
            .self_adjoint_eigen(faer::Side::Lower)
            .map_err(|e| native_error("self-adjoint eigen", e))?;
        let s_col = evd.S().column_vector();
        let w: Vec<f64> = (0..n).map(|i| s_col[i]).collect();
        let order = sorted_order(&w, |x, y| x.total_cmp(y));
        let z = gather_columns(&col_major(evd.U()), n, &order);
        log::debug!("native syev: {n}x{n}");
        Ok(Syev {
            w: order.iter().map(|&i| w[i]).collect(),
            z: StridedArray::from_vec(&[n, n], z)?,
        })
    }

    fn geev(&self, a: &StridedArray) -> Result<Geev> {
        let (m, n) = a.require_matrix()?;
        if m != n {
            return portable::geev(a);
        }
        let mat = to_faer(a)?;
        let evd = mat.eigen().map_err(|e| native_error("eigen", e))?;
        let s_col = evd.S().column_vector();
        let w: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new(s_col[i].re, s_col[i].im))
            .collect();
        let u = evd.U();
        let mut v = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                let x = u[(i, j)];
                v.push(Complex64::new(x.re, x.im));
            }
        }
        let order = sorted_order(&w, |x, y| x.re.total_cmp(&y.re).then(x.im.total_cmp(&y.im)));
        let v = gather_columns(&v, n, &order);
        log::debug!("native geev: {n}x{n}");
        Ok(Geev {
            w: order.iter().map(|&i| w[i]).collect(),
            v: StridedArray::from_vec(&[n, n], v)?,
        })
    }
}
