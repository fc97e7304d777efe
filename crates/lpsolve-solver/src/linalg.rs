//! Dense row-major helpers for the basis-inverse based engines.

pub type Matrix = Vec<Vec<f64>>;

pub fn identity(size: usize) -> Matrix {
    let mut m = vec![vec![0.0; size]; size];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

/// `m · v`
pub fn mat_vec(m: &Matrix, v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, v)).collect()
}

/// `vᵗ · m`
pub fn vec_mat(v: &[f64], m: &Matrix) -> Vec<f64> {
    let cols = m.first().map_or(0, |row| row.len());
    let mut out = vec![0.0; cols];
    for (vi, row) in v.iter().zip(m) {
        for (o, mij) in out.iter_mut().zip(row) {
            *o += vi * mij;
        }
    }
    out
}

pub fn mat_mul(a: &Matrix, b: &Matrix) -> Matrix {
    a.iter().map(|row| vec_mat(row, b)).collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Gauss-Jordan inversion with partial pivoting; `None` when a pivot
/// falls below `tolerance`.
pub fn invert(a: &Matrix, tolerance: f64) -> Option<Matrix> {
    let n = a.len();
    let mut m = a.clone();
    let mut inv = identity(n);

    for k in 0..n {
        let mut piv = k;
        let mut best = m[k][k].abs();
        for (i, row) in m.iter().enumerate().skip(k + 1) {
            if row[k].abs() > best {
                best = row[k].abs();
                piv = i;
            }
        }
        if best < tolerance {
            return None;
        }
        if piv != k {
            m.swap(k, piv);
            inv.swap(k, piv);
        }

        let diag = m[k][k];
        for j in 0..n {
            m[k][j] /= diag;
            inv[k][j] /= diag;
        }

        for i in 0..n {
            if i == k {
                continue;
            }
            let f = m[i][k];
            if f == 0.0 {
                continue;
            }
            for j in 0..n {
                m[i][j] -= f * m[k][j];
                inv[i][j] -= f * inv[k][j];
            }
        }
    }
    Some(inv)
}

/// Eta matrix replacing basis position `leaving` by a column whose
/// representation in the current basis is `direction`.
pub fn eta(direction: &[f64], leaving: usize) -> Matrix {
    let m = direction.len();
    let pivot = direction[leaving];
    let mut e = identity(m);
    for (i, row) in e.iter_mut().enumerate() {
        row[leaving] = if i == leaving {
            1.0 / pivot
        } else {
            -direction[i] / pivot
        };
    }
    e
}
