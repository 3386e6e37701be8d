//! Pure-Rust backend and its factorization kernels.
//!
//! Matrices are copied into dense column-major `Vec<f64>` buffers, factorized
//! there, and wrapped as new arrays.

use strided_kernel::Transpose;
use strided_view::{Complex64, ElementKind, Result, StridedArray, StridedError};

use crate::backend::{
    ArrayFactory, ArrayRoutines, Backend, Geev, Gelsy, Geqrf, Gesvd, Getrf, LinalgRoutines, Qr,
    Side, Syev,
};

/// Backend computing everything with the portable kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableBackend;

impl ArrayFactory for PortableBackend {}
impl ArrayRoutines for PortableBackend {}
impl LinalgRoutines for PortableBackend {}

impl Backend for PortableBackend {
    fn name(&self) -> &'static str {
        "portable"
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

/// Upper bound on Jacobi sweeps before giving up.
const MAX_SWEEPS: usize = 100;

/// Dense column-major copy of a real matrix operand.
pub(crate) fn dense_matrix(a: &StridedArray) -> Result<(usize, usize, Vec<f64>)> {
    let (m, n) = a.require_matrix()?;
    if a.kind() == ElementKind::Complex {
        return Err(StridedError::argument(
            "factorizations are defined for real matrices only",
        ));
    }
    Ok((m, n, a.to_vec::<f64>()))
}

/// LU factorization with partial pivoting (unblocked, right-looking).
pub fn getrf(a: &StridedArray) -> Result<Getrf> {
    let (m, n, mut lu) = dense_matrix(a)?;
    let k = m.min(n);
    let mut ipiv = Vec::with_capacity(k);
    let mut info = 0;

    for j in 0..k {
        let col = j * m;
        let mut p = j;
        for i in j + 1..m {
            if lu[col + i].abs() > lu[col + p].abs() {
                p = i;
            }
        }
        ipiv.push(p);

        if lu[col + p] != 0.0 {
            if p != j {
                for c in 0..n {
                    lu.swap(c * m + j, c * m + p);
                }
            }
            let pivot = lu[col + j];
            for i in j + 1..m {
                lu[col + i] /= pivot;
            }
        } else if info == 0 {
            info = j + 1;
        }

        for c in j + 1..n {
            let ujc = lu[c * m + j];
            if ujc == 0.0 {
                continue;
            }
            for i in j + 1..m {
                lu[c * m + i] -= lu[col + i] * ujc;
            }
        }
    }

    Ok(Getrf {
        lu: StridedArray::from_vec(&[m, n], lu)?,
        ipiv,
        info,
    })
}

/// Full SVD by one-sided Jacobi rotations.
///
/// For wide inputs the transpose is factorized and the roles of `U` and `V`
/// are exchanged.
pub fn gesvd(a: &StridedArray) -> Result<Gesvd> {
    let (m, n, data) = dense_matrix(a)?;
    if m >= n {
        let (s, u, v) = jacobi_svd(m, n, data)?;
        svd_result(s, m, u, n, &v)
    } else {
        let mut t = vec![0.0; m * n];
        for j in 0..n {
            for i in 0..m {
                t[j + i * n] = data[i + j * m];
            }
        }
        let (s, u, v) = jacobi_svd(n, m, t)?;
        // Aᵀ = U' S V'ᵀ  =>  A = V' S U'ᵀ
        svd_result(s, m, v, n, &u)
    }
}

fn svd_result(s: Vec<f64>, m: usize, u: Vec<f64>, n: usize, v: &[f64]) -> Result<Gesvd> {
    let mut vt = vec![0.0; n * n];
    for j in 0..n {
        for i in 0..n {
            vt[j + i * n] = v[i + j * n];
        }
    }
    Ok(Gesvd {
        s,
        u: StridedArray::from_vec(&[m, m], u)?,
        vt: StridedArray::from_vec(&[n, n], vt)?,
    })
}

/// One-sided Jacobi SVD of a tall `m x n` matrix (`m >= n`), column-major.
///
/// Returns `(s, u, v)` with `s` of length `n` sorted descending, `u` a full
/// orthogonal `m x m` matrix and `v` an orthogonal `n x n` matrix.
fn jacobi_svd(m: usize, n: usize, mut w: Vec<f64>) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i + i * n] = 1.0;
    }

    let tol = m as f64 * f64::EPSILON;
    // columns below this squared norm are round-off and take no part in rotations;
    // rotations preserve the Frobenius norm, so the floor is fixed for all sweeps
    let frob2: f64 = w.iter().map(|x| x * x).sum();
    let floor = (10.0 * tol).powi(2) * frob2;
    let mut converged = n < 2;
    for _ in 0..MAX_SWEEPS {
        if converged {
            break;
        }
        let mut rotated = false;
        for p in 0..n {
            for q in p + 1..n {
                let (mut alpha, mut beta, mut gamma) = (0.0, 0.0, 0.0);
                for k in 0..m {
                    let wp = w[k + p * m];
                    let wq = w[k + q * m];
                    alpha += wp * wp;
                    beta += wq * wq;
                    gamma += wp * wq;
                }
                if alpha <= floor
                    || beta <= floor
                    || gamma == 0.0
                    || gamma.abs() <= tol * (alpha * beta).sqrt()
                {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                rotate(&mut w, m, p, q, c, s);
                rotate(&mut v, n, p, q, c, s);
            }
        }
        converged = !rotated;
    }
    if !converged {
        return Err(StridedError::NativeComputation {
            code: MAX_SWEEPS as i32,
            message: format!("Jacobi SVD did not converge in {MAX_SWEEPS} sweeps"),
        });
    }

    let norms: Vec<f64> = (0..n)
        .map(|j| (0..m).map(|k| w[k + j * m].powi(2)).sum::<f64>().sqrt())
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| norms[b].total_cmp(&norms[a]));

    let scale = norms.iter().copied().fold(0.0, f64::max);
    let tiny = scale * f64::EPSILON * m as f64;

    let mut s = Vec::with_capacity(n);
    let mut u = vec![0.0; m * m];
    let mut v_sorted = vec![0.0; n * n];
    let mut filled = 0;
    for (dst, &src) in order.iter().enumerate() {
        let sigma = norms[src];
        s.push(sigma);
        v_sorted[dst * n..(dst + 1) * n].copy_from_slice(&v[src * n..(src + 1) * n]);
        if sigma > tiny {
            for k in 0..m {
                u[k + dst * m] = w[k + src * m] / sigma;
            }
            filled = dst + 1;
        }
    }
    complete_orthonormal(&mut u, m, filled);
    Ok((s, u, v_sorted))
}

/// Apply the plane rotation `(c, s)` to columns `p` and `q`.
fn rotate(x: &mut [f64], rows: usize, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..rows {
        let xp = x[k + p * rows];
        let xq = x[k + q * rows];
        x[k + p * rows] = c * xp - s * xq;
        x[k + q * rows] = s * xp + c * xq;
    }
}

/// Fill columns `filled..m` of the `m x m` matrix `u` with unit vectors
/// orthogonal to all previous columns (Gram-Schmidt against `e_0, e_1, ...`).
fn complete_orthonormal(u: &mut [f64], m: usize, mut filled: usize) {
    let mut candidate = 0;
    while filled < m && candidate < m {
        let mut x = vec![0.0; m];
        x[candidate] = 1.0;
        candidate += 1;
        // two passes for numerical orthogonality
        for _ in 0..2 {
            for j in 0..filled {
                let col = &u[j * m..(j + 1) * m];
                let d: f64 = col.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
                for (xi, ci) in x.iter_mut().zip(col.iter()) {
                    *xi -= d * ci;
                }
            }
        }
        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 1e-8 {
            for (k, xi) in x.iter().enumerate() {
                u[k + filled * m] = xi / norm;
            }
            filled += 1;
        }
    }
}

// ============================================================================
// QR
// ============================================================================

/// Householder QR in LAPACK's compact form.
///
/// Reflector `j` is `H_j = I - tau[j]·v·vᵀ` with `v[j] = 1` implicit and
/// `v[j+1..]` stored below the diagonal of column `j`; `R` is on and above
/// the diagonal. `Q = H_0·H_1···H_{k-1}`.
pub fn geqrf(a: &StridedArray) -> Result<Geqrf> {
    let (m, n, mut w) = dense_matrix(a)?;
    let k = m.min(n);
    let mut tau = vec![0.0; k];
    for j in 0..k {
        let col = j * m;
        let alpha = w[col + j];
        let xnorm = w[col + j + 1..col + m]
            .iter()
            .map(|x| x * x)
            .sum::<f64>()
            .sqrt();
        if xnorm == 0.0 {
            continue;
        }
        let norm = alpha.hypot(xnorm);
        let beta = if alpha >= 0.0 { -norm } else { norm };
        let scale = 1.0 / (alpha - beta);
        for x in &mut w[col + j + 1..col + m] {
            *x *= scale;
        }
        w[col + j] = beta;
        tau[j] = (beta - alpha) / beta;

        for c in j + 1..n {
            let cc = c * m;
            let mut d = w[cc + j];
            for i in j + 1..m {
                d += w[col + i] * w[cc + i];
            }
            d *= tau[j];
            w[cc + j] -= d;
            for i in j + 1..m {
                w[cc + i] -= d * w[col + i];
            }
        }
    }
    Ok(Geqrf {
        qr: StridedArray::from_vec(&[m, n], w)?,
        tau,
    })
}

/// `op(Q)·C` or `C·op(Q)` for the `Q` of a [`geqrf`] factorization, as a
/// new array. `Q` is `m x m` where `m` is the row count of the factored
/// matrix.
///
/// # Errors
/// [`StridedError::NonConformant`] when `C` has the wrong row count
/// (`Side::Left`) or column count (`Side::Right`).
pub fn ormqr(side: Side, trans: Transpose, f: &Geqrf, c: &StridedArray) -> Result<StridedArray> {
    let (m, _) = f.qr.require_matrix()?;
    let (rows, cols, mut out) = dense_matrix(c)?;
    let along = match side {
        Side::Left => rows,
        Side::Right => cols,
    };
    if along != m {
        return Err(StridedError::non_conformant(f.qr.dims(), c.dims()));
    }
    let qr = f.qr.to_vec::<f64>();
    let k = f.tau.len();
    // Q = H_0···H_{k-1}: Q·C and C·Qᵀ apply the last reflector first
    let reversed = matches!(
        (side, trans),
        (Side::Left, Transpose::Keep) | (Side::Right, Transpose::Transpose)
    );
    let order: Vec<usize> = if reversed {
        (0..k).rev().collect()
    } else {
        (0..k).collect()
    };
    for j in order {
        let tau = f.tau[j];
        if tau == 0.0 {
            continue;
        }
        let v = |i: usize| -> f64 {
            if i == j {
                1.0
            } else {
                qr[i + j * m]
            }
        };
        match side {
            Side::Left => {
                for cc in 0..cols {
                    let base = cc * rows;
                    let d: f64 = (j..m).map(|i| v(i) * out[base + i]).sum::<f64>() * tau;
                    for i in j..m {
                        out[base + i] -= d * v(i);
                    }
                }
            }
            Side::Right => {
                for r in 0..rows {
                    let d: f64 = (j..m).map(|i| out[r + i * rows] * v(i)).sum::<f64>() * tau;
                    for i in j..m {
                        out[r + i * rows] -= d * v(i);
                    }
                }
            }
        }
    }
    StridedArray::from_vec(&[rows, cols], out)
}

/// Flip signs so that `R` has a non-negative diagonal, keeping `Q·R`.
///
/// `q` is `m x m` and `r` is `m x n`, both column-major.
pub(crate) fn normalize_qr(m: usize, n: usize, q: &mut [f64], r: &mut [f64]) {
    for i in 0..m.min(n) {
        if r[i + i * m] < 0.0 {
            for j in 0..n {
                r[i + j * m] = -r[i + j * m];
            }
            for x in &mut q[i * m..(i + 1) * m] {
                *x = -*x;
            }
        }
    }
}

/// Full QR `A = Q·R`: `Q` is `m x m` orthogonal, `R` is `m x n` upper
/// trapezoidal with a non-negative diagonal.
pub fn qr(a: &StridedArray) -> Result<Qr> {
    let f = geqrf(a)?;
    let (m, n) = f.qr.require_matrix()?;
    let mut eye = vec![0.0; m * m];
    for i in 0..m {
        eye[i + i * m] = 1.0;
    }
    let q = ormqr(
        Side::Left,
        Transpose::Keep,
        &f,
        &StridedArray::from_vec(&[m, m], eye)?,
    )?;
    let mut q = q.to_vec::<f64>();
    let mut r = f.qr.to_vec::<f64>();
    for j in 0..n {
        for i in j + 1..m {
            r[i + j * m] = 0.0;
        }
    }
    normalize_qr(m, n, &mut q, &mut r);
    Ok(Qr {
        q: StridedArray::from_vec(&[m, m], q)?,
        r: StridedArray::from_vec(&[m, n], r)?,
    })
}

// ============================================================================
// Least squares
// ============================================================================

/// Minimum-norm solution of `A·X ≈ B` from the SVD of `A`.
///
/// `B` is a vector of length `m` or an `m x k` matrix; `X` has the same
/// layout with `n` rows. Singular values at or below `rcond·s_max` are
/// dropped, and a negative `rcond` means `max(m, n)·ε`.
pub(crate) fn least_squares(svd: &Gesvd, a: &StridedArray, b: &StridedArray, rcond: f64) -> Result<Gelsy> {
    let (m, n) = a.require_matrix()?;
    let (rows, k) = match b.ndim() {
        1 => (b.len(), 1),
        2 => b.require_matrix()?,
        _ => return Err(StridedError::non_conformant(a.dims(), b.dims())),
    };
    if rows != m {
        return Err(StridedError::non_conformant(a.dims(), b.dims()));
    }
    if b.kind() == ElementKind::Complex {
        return Err(StridedError::argument("least squares needs a real right-hand side"));
    }
    let rcond = if rcond < 0.0 {
        m.max(n) as f64 * f64::EPSILON
    } else {
        rcond
    };
    let s_max = svd.s.first().copied().unwrap_or(0.0);
    let cutoff = rcond * s_max;
    let rank = svd.s.iter().take_while(|&&s| s > cutoff && s > 0.0).count();

    let u = svd.u.to_vec::<f64>();
    let vt = svd.vt.to_vec::<f64>();
    let bv = b.to_vec::<f64>();
    let mut x = vec![0.0; n * k];
    for col in 0..k {
        let rhs = &bv[col * m..(col + 1) * m];
        let out = &mut x[col * n..(col + 1) * n];
        for i in 0..rank {
            let c: f64 = (0..m).map(|r| u[r + i * m] * rhs[r]).sum::<f64>() / svd.s[i];
            for (j, xj) in out.iter_mut().enumerate() {
                *xj += vt[i + j * n] * c;
            }
        }
    }
    log::debug!("least squares: {m}x{n}, {k} right-hand side(s), rank {rank}");
    let x = if b.ndim() == 1 {
        StridedArray::from_vec(&[n], x)?
    } else {
        StridedArray::from_vec(&[n, k], x)?
    };
    Ok(Gelsy { x, rank })
}

// ============================================================================
// Eigenvalues
// ============================================================================

fn square_matrix(a: &StridedArray) -> Result<(usize, Vec<f64>)> {
    let (m, n, data) = dense_matrix(a)?;
    if m != n {
        return Err(StridedError::argument(format!(
            "eigenproblem needs a square matrix, got {m}x{n}"
        )));
    }
    Ok((n, data))
}

/// Symmetric eigendecomposition by cyclic Jacobi rotations.
///
/// Only the lower triangle of `a` is read. Eigenvalues come out ascending,
/// with orthonormal eigenvectors in the matching columns of `z`.
pub fn syev(a: &StridedArray) -> Result<Syev> {
    let (n, mut w) = square_matrix(a)?;
    for j in 0..n {
        for i in 0..j {
            w[i + j * n] = w[j + i * n];
        }
    }
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i + i * n] = 1.0;
    }

    let frob2: f64 = w.iter().map(|x| x * x).sum();
    let tol = (n as f64 * f64::EPSILON).powi(2) * frob2;
    let off_diagonal = |w: &[f64]| -> f64 {
        let mut off = 0.0;
        for j in 0..n {
            for i in 0..n {
                if i != j {
                    off += w[i + j * n] * w[i + j * n];
                }
            }
        }
        off
    };

    let mut converged = off_diagonal(&w) <= tol;
    for _ in 0..MAX_SWEEPS {
        if converged {
            break;
        }
        for p in 0..n {
            for q in p + 1..n {
                let apq = w[p + q * n];
                if apq == 0.0 {
                    continue;
                }
                let theta = (w[q + q * n] - w[p + p * n]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                // A ← Jᵀ·A·J
                rotate(&mut w, n, p, q, c, s);
                for k in 0..n {
                    let apk = w[p + k * n];
                    let aqk = w[q + k * n];
                    w[p + k * n] = c * apk - s * aqk;
                    w[q + k * n] = s * apk + c * aqk;
                }
                rotate(&mut v, n, p, q, c, s);
            }
        }
        converged = off_diagonal(&w) <= tol;
    }
    if !converged {
        return Err(StridedError::NativeComputation {
            code: MAX_SWEEPS as i32,
            message: format!("Jacobi eigensolver did not converge in {MAX_SWEEPS} sweeps"),
        });
    }

    let diag: Vec<f64> = (0..n).map(|i| w[i + i * n]).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| diag[a].total_cmp(&diag[b]));
    let mut z = vec![0.0; n * n];
    for (dst, &src) in order.iter().enumerate() {
        z[dst * n..(dst + 1) * n].copy_from_slice(&v[src * n..(src + 1) * n]);
    }
    Ok(Syev {
        w: order.iter().map(|&i| diag[i]).collect(),
        z: StridedArray::from_vec(&[n, n], z)?,
    })
}

/// General eigendecomposition, limited to symmetric input.
///
/// # Errors
/// [`StridedError::IllegalState`] for a non-symmetric matrix, whose complex
/// spectrum needs the native backend.
pub fn geev(a: &StridedArray) -> Result<Geev> {
    let (n, data) = square_matrix(a)?;
    let scale = data.iter().fold(0.0f64, |acc, x| acc.max(x.abs()));
    let tol = 1e-12 * scale;
    for j in 0..n {
        for i in j + 1..n {
            if (data[i + j * n] - data[j + i * n]).abs() > tol {
                return Err(StridedError::illegal_state(
                    "the portable backend solves symmetric eigenproblems only",
                ));
            }
        }
    }
    let Syev { w, z } = syev(a)?;
    Ok(Geev {
        w: w.into_iter().map(|x| Complex64::new(x, 0.0)).collect(),
        v: StridedArray::from_vec(&[n, n], z.to_vec::<Complex64>())?,
    })
}
