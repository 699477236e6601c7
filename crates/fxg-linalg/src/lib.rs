#![forbid(unsafe_code)]

use core::fmt;
use fxg_layout::{Matrix, column, nan_max, nan_min};
use nalgebra::SVD;
use nalgebra::linalg::SymmetricEigen;

pub const MAX_DECOMPOSITION_ITERATIONS: usize = 10_000;
pub const SYMMETRY_TOLERANCE: f64 = 1e-12;

pub const LINALG_REASON_CODES: [&str; 7] = [
    "linalg_shape_contract_violation",
    "linalg_solver_singularity",
    "linalg_cholesky_contract_violation",
    "linalg_svd_nonconvergence",
    "linalg_spectral_convergence_failed",
    "linalg_norm_policy_violation",
    "linalg_non_finite_input",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorNormOrder {
    P(u32),
    Inf,
    NegInf,
    Fro,
}

impl VectorNormOrder {
    pub fn from_token(token: &str) -> Result<Self, LinAlgError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "inf" | "+inf" => Ok(Self::Inf),
            "-inf" | "neginf" => Ok(Self::NegInf),
            "fro" => Ok(Self::Fro),
            other => match other.parse::<u32>() {
                Ok(p) if p >= 1 => Ok(Self::P(p)),
                _ => Err(LinAlgError::NormPolicyViolation(
                    "unsupported vector norm order token",
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixNormOrder {
    One,
    Two,
    Inf,
    Fro,
}

impl MatrixNormOrder {
    pub fn from_token(token: &str) -> Result<Self, LinAlgError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "inf" | "+inf" => Ok(Self::Inf),
            "fro" => Ok(Self::Fro),
            _ => Err(LinAlgError::NormPolicyViolation(
                "unsupported matrix norm order token",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinAlgError {
    ShapeContractViolation(&'static str),
    SolverSingularity,
    CholeskyContractViolation(&'static str),
    SvdNonConvergence,
    SpectralConvergenceFailed,
    NormPolicyViolation(&'static str),
    NonFiniteInput,
}

impl LinAlgError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::ShapeContractViolation(_) => "linalg_shape_contract_violation",
            Self::SolverSingularity => "linalg_solver_singularity",
            Self::CholeskyContractViolation(_) => "linalg_cholesky_contract_violation",
            Self::SvdNonConvergence => "linalg_svd_nonconvergence",
            Self::SpectralConvergenceFailed => "linalg_spectral_convergence_failed",
            Self::NormPolicyViolation(_) => "linalg_norm_policy_violation",
            Self::NonFiniteInput => "linalg_non_finite_input",
        }
    }
}

impl fmt::Display for LinAlgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeContractViolation(msg) => write!(f, "{msg}"),
            Self::SolverSingularity => write!(f, "solve/inv rejected singular matrix"),
            Self::CholeskyContractViolation(msg) => write!(f, "{msg}"),
            Self::SvdNonConvergence => write!(f, "svd did not converge"),
            Self::SpectralConvergenceFailed => write!(f, "spectral decomposition did not converge"),
            Self::NormPolicyViolation(msg) => write!(f, "{msg}"),
            Self::NonFiniteInput => write!(f, "decomposition input has non-finite elements"),
        }
    }
}

impl std::error::Error for LinAlgError {}

#[derive(Debug, Clone, PartialEq)]
pub struct LuFactors {
    pub l: Matrix,
    pub u: Matrix,
    /// Row permutation with `p * a == l * u`.
    pub p: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrFactors {
    pub q: Matrix,
    pub r: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvdFactors {
    pub u: Matrix,
    /// Singular values, descending, as a column.
    pub s: Matrix,
    pub v: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EigSymFactors {
    /// Eigenvalues, ascending, as a column.
    pub values: Matrix,
    /// Eigenvectors in matching column order.
    pub vectors: Matrix,
}

pub fn validate_square(m: &Matrix) -> Result<usize, LinAlgError> {
    if m.nrows() != m.ncols() {
        return Err(LinAlgError::ShapeContractViolation(
            "square matrix required for det/inv/solve/chol",
        ));
    }
    Ok(m.nrows())
}

fn validate_finite(m: &Matrix) -> Result<(), LinAlgError> {
    if m.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LinAlgError::NonFiniteInput)
    }
}

fn validate_symmetric(m: &Matrix) -> Result<usize, LinAlgError> {
    let n = validate_square(m)?;
    let scale = m.amax().max(1.0);
    for i in 0..n {
        for j in (i + 1)..n {
            if (m[(i, j)] - m[(j, i)]).abs() > SYMMETRY_TOLERANCE * scale {
                return Err(LinAlgError::CholeskyContractViolation(
                    "symmetric matrix required",
                ));
            }
        }
    }
    Ok(n)
}

pub fn det(m: &Matrix) -> Result<f64, LinAlgError> {
    validate_square(m)?;
    validate_finite(m)?;
    if m.is_empty() {
        return Ok(1.0);
    }
    Ok(m.determinant())
}

/// `(log|det|, sign)`; a singular input yields `(-inf, 0)`.
pub fn log_det(m: &Matrix) -> Result<(f64, f64), LinAlgError> {
    validate_square(m)?;
    validate_finite(m)?;
    let lu = m.clone().lu();
    let u = lu.u();
    let mut log_abs = 0.0;
    let mut sign: f64 = lu.p().determinant();
    for i in 0..u.nrows() {
        let pivot = u[(i, i)];
        log_abs += pivot.abs().ln();
        sign *= pivot.signum();
        if pivot == 0.0 {
            sign = 0.0;
        }
    }
    Ok((log_abs, sign))
}

/// Sum of the main diagonal, defined for any shape.
#[must_use]
pub fn trace(m: &Matrix) -> f64 {
    let n = m.nrows().min(m.ncols());
    (0..n).map(|i| m[(i, i)]).sum()
}

pub fn inv(m: &Matrix) -> Result<Matrix, LinAlgError> {
    validate_square(m)?;
    validate_finite(m)?;
    m.clone()
        .try_inverse()
        .filter(|inverse| inverse.iter().all(|v| v.is_finite()))
        .ok_or(LinAlgError::SolverSingularity)
}

pub fn inv_sympd(m: &Matrix) -> Result<Matrix, LinAlgError> {
    validate_finite(m)?;
    validate_symmetric(m)?;
    m.clone()
        .cholesky()
        .map(|factor| factor.inverse())
        .ok_or(LinAlgError::CholeskyContractViolation(
            "matrix is not positive definite",
        ))
}

pub fn solve(a: &Matrix, b: &Matrix) -> Result<Matrix, LinAlgError> {
    validate_square(a)?;
    if a.nrows() != b.nrows() {
        return Err(LinAlgError::ShapeContractViolation(
            "solve rhs row count must match lhs",
        ));
    }
    validate_finite(a)?;
    validate_finite(b)?;
    a.clone()
        .lu()
        .solve(b)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .ok_or(LinAlgError::SolverSingularity)
}

pub fn lu(m: &Matrix) -> Result<LuFactors, LinAlgError> {
    validate_finite(m)?;
    let decomposition = m.clone().lu();
    let mut p = Matrix::identity(m.nrows(), m.nrows());
    decomposition.p().permute_rows(&mut p);
    Ok(LuFactors {
        l: decomposition.l(),
        u: decomposition.u(),
        p,
    })
}

/// Thin QR: `q` is `m x k`, `r` is `k x n` with `k = min(m, n)`.
pub fn qr_econ(m: &Matrix) -> Result<QrFactors, LinAlgError> {
    validate_finite(m)?;
    let decomposition = m.clone().qr();
    Ok(QrFactors {
        q: decomposition.q(),
        r: decomposition.r(),
    })
}

fn ordered_svd(m: &Matrix) -> Result<SvdFactors, LinAlgError> {
    validate_finite(m)?;
    let decomposition: SVD<f64, _, _> = m
        .clone()
        .try_svd(true, true, f64::EPSILON, MAX_DECOMPOSITION_ITERATIONS)
        .ok_or(LinAlgError::SvdNonConvergence)?;
    let (Some(u), Some(v_t)) = (decomposition.u, decomposition.v_t) else {
        return Err(LinAlgError::SvdNonConvergence);
    };
    let sigma = decomposition.singular_values;

    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));

    let s: Vec<f64> = order.iter().map(|&i| sigma[i]).collect();
    let u = Matrix::from_fn(u.nrows(), order.len(), |i, j| u[(i, order[j])]);
    let v = Matrix::from_fn(v_t.ncols(), order.len(), |i, j| v_t[(order[j], i)]);
    Ok(SvdFactors {
        u,
        s: column(&s),
        v,
    })
}

/// Singular values in descending order.
pub fn svd(m: &Matrix) -> Result<Matrix, LinAlgError> {
    ordered_svd(m).map(|factors| factors.s)
}

/// Economical SVD with `a == u * diag(s) * v^T`.
pub fn svd_econ(m: &Matrix) -> Result<SvdFactors, LinAlgError> {
    ordered_svd(m)
}

fn default_tolerance(m: &Matrix, largest: f64) -> f64 {
    (m.nrows().max(m.ncols()) as f64) * largest * f64::EPSILON
}

pub fn pinv(m: &Matrix) -> Result<Matrix, LinAlgError> {
    let factors = ordered_svd(m)?;
    let largest = factors.s.iter().copied().fold(0.0, f64::max);
    let tol = default_tolerance(m, largest);
    let mut out = Matrix::zeros(m.ncols(), m.nrows());
    for (k, &sigma) in factors.s.iter().enumerate() {
        if sigma <= tol {
            continue;
        }
        let v_k = factors.v.column(k);
        let u_k = factors.u.column(k);
        out += (v_k * u_k.transpose()) / sigma;
    }
    Ok(out)
}

pub fn rank(m: &Matrix) -> Result<usize, LinAlgError> {
    let factors = ordered_svd(m)?;
    let largest = factors.s.iter().copied().fold(0.0, f64::max);
    let tol = default_tolerance(m, largest);
    Ok(factors.s.iter().filter(|&&sigma| sigma > tol).count())
}

/// Upper factor `r` with `a == r^T * r`.
pub fn chol(m: &Matrix) -> Result<Matrix, LinAlgError> {
    validate_finite(m)?;
    validate_symmetric(m)?;
    m.clone()
        .cholesky()
        .map(|factor| factor.l().transpose())
        .ok_or(LinAlgError::CholeskyContractViolation(
            "matrix is not positive definite",
        ))
}

pub fn eig_sym(m: &Matrix) -> Result<EigSymFactors, LinAlgError> {
    validate_finite(m)?;
    let n = validate_symmetric(m)?;
    let decomposition: SymmetricEigen<f64, _> = m
        .clone()
        .try_symmetric_eigen(f64::EPSILON, MAX_DECOMPOSITION_ITERATIONS)
        .ok_or(LinAlgError::SpectralConvergenceFailed)?;

    let lambda = &decomposition.eigenvalues;
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| lambda[a].total_cmp(&lambda[b]));

    let values: Vec<f64> = order.iter().map(|&i| lambda[i]).collect();
    let vectors = Matrix::from_fn(n, n, |i, j| decomposition.eigenvectors[(i, order[j])]);
    Ok(EigSymFactors {
        values: column(&values),
        vectors,
    })
}

/// Norm of a vector-shaped matrix.
pub fn vector_norm(v: &Matrix, ord: VectorNormOrder) -> Result<f64, LinAlgError> {
    if v.nrows() != 1 && v.ncols() != 1 {
        return Err(LinAlgError::ShapeContractViolation(
            "vector norm requires a row or column vector",
        ));
    }
    if v.is_empty() {
        return Ok(0.0);
    }
    Ok(match ord {
        VectorNormOrder::P(1) => v.iter().map(|x| x.abs()).sum(),
        VectorNormOrder::P(2) | VectorNormOrder::Fro => v.norm(),
        VectorNormOrder::P(p) => {
            let p = f64::from(p);
            v.iter().map(|x| x.abs().powf(p)).sum::<f64>().powf(1.0 / p)
        }
        VectorNormOrder::Inf => v.iter().map(|x| x.abs()).fold(0.0, nan_max),
        VectorNormOrder::NegInf => v.iter().map(|x| x.abs()).fold(f64::INFINITY, nan_min),
    })
}

pub fn matrix_norm(m: &Matrix, ord: MatrixNormOrder) -> Result<f64, LinAlgError> {
    if m.is_empty() {
        return Ok(0.0);
    }
    match ord {
        MatrixNormOrder::One => Ok(m
            .column_iter()
            .map(|lane| lane.iter().map(|x| x.abs()).sum::<f64>())
            .fold(0.0, nan_max)),
        MatrixNormOrder::Inf => Ok(m
            .row_iter()
            .map(|lane| lane.iter().map(|x| x.abs()).sum::<f64>())
            .fold(0.0, nan_max)),
        MatrixNormOrder::Fro => Ok(m.norm()),
        MatrixNormOrder::Two => {
            // ||A||_2 >= max |a_ij|, so a non-finite entry decides the result.
            let largest_entry = m.iter().map(|x| x.abs()).fold(0.0, nan_max);
            if !largest_entry.is_finite() {
                return Ok(largest_entry);
            }
            let s = svd(m)?;
            Ok(s.iter().copied().fold(0.0, f64::max))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LINALG_REASON_CODES, LinAlgError, MatrixNormOrder, VectorNormOrder, chol, det, eig_sym,
        inv, inv_sympd, log_det, lu, matrix_norm, pinv, qr_econ, rank, solve, svd, svd_econ,
        trace, validate_square, vector_norm,
    };
    use fxg_layout::{Matrix, column, hilbert, row_vector};

    fn approx_equal(lhs: &Matrix, rhs: &Matrix, tol: f64) -> bool {
        lhs.shape() == rhs.shape() && lhs.iter().zip(rhs.iter()).all(|(a, b)| (a - b).abs() <= tol)
    }

    fn spd() -> Matrix {
        Matrix::from_row_slice(3, 3, &[4.0, 2.0, 0.6, 2.0, 5.0, 1.0, 0.6, 1.0, 3.0])
    }

    fn rect() -> Matrix {
        Matrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    #[test]
    fn reason_code_registry_is_stable() {
        let errors = [
            LinAlgError::ShapeContractViolation("x"),
            LinAlgError::SolverSingularity,
            LinAlgError::CholeskyContractViolation("x"),
            LinAlgError::SvdNonConvergence,
            LinAlgError::SpectralConvergenceFailed,
            LinAlgError::NormPolicyViolation("x"),
            LinAlgError::NonFiniteInput,
        ];
        let codes: Vec<&str> = errors.iter().map(LinAlgError::reason_code).collect();
        assert_eq!(codes, LINALG_REASON_CODES);
    }

    #[test]
    fn norm_tokens_resolve() {
        assert_eq!(VectorNormOrder::from_token("3"), Ok(VectorNormOrder::P(3)));
        assert_eq!(VectorNormOrder::from_token("-inf"), Ok(VectorNormOrder::NegInf));
        assert!(VectorNormOrder::from_token("0").is_err());
        assert_eq!(MatrixNormOrder::from_token("fro"), Ok(MatrixNormOrder::Fro));
        let err = MatrixNormOrder::from_token("3").expect_err("p=3 matrix norm");
        assert_eq!(err.reason_code(), "linalg_norm_policy_violation");
    }

    #[test]
    fn det_and_log_det_agree() {
        let m = spd();
        let d = det(&m).expect("det");
        let (log_abs, sign) = log_det(&m).expect("log_det");
        assert!((log_abs.exp() * sign - d).abs() < 1e-9);

        let flipped = Matrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let (log_abs, sign) = log_det(&flipped).expect("permutation");
        assert!(log_abs.abs() < 1e-12);
        assert_eq!(sign, -1.0);

        assert!(validate_square(&rect()).is_err());
        assert_eq!(det(&Matrix::zeros(0, 0)), Ok(1.0));
    }

    #[test]
    fn inverse_rejects_singular_and_non_finite() {
        let singular = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(inv(&singular), Err(LinAlgError::SolverSingularity));

        let with_nan = Matrix::from_row_slice(1, 1, &[f64::NAN]);
        assert_eq!(inv(&with_nan), Err(LinAlgError::NonFiniteInput));

        let m = spd();
        let product = &m * inv(&m).expect("invertible");
        assert!(approx_equal(&product, &Matrix::identity(3, 3), 1e-12));
        let sympd = inv_sympd(&m).expect("sympd");
        assert!(approx_equal(&sympd, &inv(&m).expect("inv"), 1e-12));
    }

    #[test]
    fn solve_checks_rows_and_solves() {
        let a = Matrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0]);
        let b = column(&[9.0, 8.0]);
        let x = solve(&a, &b).expect("solve");
        assert!(approx_equal(&x, &column(&[2.0, 3.0]), 1e-12));

        let err = solve(&a, &column(&[1.0, 2.0, 3.0])).expect_err("row mismatch");
        assert_eq!(err.reason_code(), "linalg_shape_contract_violation");
    }

    #[test]
    fn lu_reconstructs_permuted_input() {
        let m = Matrix::from_row_slice(3, 3, &[0.0, 2.0, 1.0, 4.0, 1.0, 0.0, 2.0, 3.0, 5.0]);
        let factors = lu(&m).expect("lu");
        assert!(approx_equal(&(&factors.p * &m), &(&factors.l * &factors.u), 1e-12));
        assert_eq!(factors.l[(0, 0)], 1.0);
    }

    #[test]
    fn qr_econ_is_thin_and_reconstructs() {
        let factors = qr_econ(&rect()).expect("qr");
        assert_eq!(factors.q.shape(), (3, 2));
        assert_eq!(factors.r.shape(), (2, 2));
        assert!(approx_equal(&(&factors.q * &factors.r), &rect(), 1e-12));
    }

    #[test]
    fn svd_is_descending_and_reconstructs() {
        let s = svd(&rect()).expect("svd");
        assert_eq!(s.shape(), (2, 1));
        assert!(s[0] >= s[1]);

        let factors = svd_econ(&rect()).expect("svd_econ");
        let sigma = Matrix::from_diagonal(&factors.s.column(0).into_owned());
        let rebuilt = &factors.u * sigma * factors.v.transpose();
        assert!(approx_equal(&rebuilt, &rect(), 1e-10));
    }

    #[test]
    fn pinv_and_rank_handle_deficiency() {
        let deficient = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(rank(&deficient), Ok(1));
        assert_eq!(rank(&hilbert(3, 3)), Ok(3));

        let p = pinv(&deficient).expect("pinv");
        let again = &deficient * &p * &deficient;
        assert!(approx_equal(&again, &deficient, 1e-10));

        let p = pinv(&rect()).expect("pinv rect");
        assert_eq!(p.shape(), (2, 3));
    }

    #[test]
    fn chol_and_eig_sym() {
        let r = chol(&spd()).expect("chol");
        assert_eq!(r[(1, 0)], 0.0);
        assert!(approx_equal(&(r.transpose() * &r), &spd(), 1e-12));

        let factors = eig_sym(&spd()).expect("eig_sym");
        assert!(factors.values[0] <= factors.values[1]);
        assert!(factors.values[1] <= factors.values[2]);
        for k in 0..3 {
            let v: Matrix = factors.vectors.columns(k, 1).into_owned();
            let lhs = spd() * &v;
            let rhs = &v * factors.values[k];
            assert!(approx_equal(&lhs, &rhs, 1e-9));
        }

        let not_pd = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let err = chol(&not_pd).expect_err("indefinite");
        assert_eq!(err.reason_code(), "linalg_cholesky_contract_violation");
        let asym = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
        assert!(eig_sym(&asym).is_err());
    }

    #[test]
    fn norms_and_trace() {
        let v = row_vector(&[3.0, -4.0]);
        assert_eq!(vector_norm(&v, VectorNormOrder::P(1)), Ok(7.0));
        assert_eq!(vector_norm(&v, VectorNormOrder::P(2)), Ok(5.0));
        assert_eq!(vector_norm(&v, VectorNormOrder::Inf), Ok(4.0));
        assert_eq!(vector_norm(&v, VectorNormOrder::NegInf), Ok(3.0));
        assert!(vector_norm(&rect(), VectorNormOrder::Fro).is_err());

        assert_eq!(matrix_norm(&rect(), MatrixNormOrder::One), Ok(12.0));
        assert_eq!(matrix_norm(&rect(), MatrixNormOrder::Inf), Ok(11.0));
        let two = matrix_norm(&rect(), MatrixNormOrder::Two).expect("2-norm");
        let fro = matrix_norm(&rect(), MatrixNormOrder::Fro).expect("fro");
        assert!(two <= fro);

        assert_eq!(trace(&rect()), 5.0);
    }

    #[test]
    fn norms_propagate_nan_for_every_order() {
        use std::f64::consts::PI;

        let special = column(&[f64::INFINITY, f64::NEG_INFINITY, f64::NAN, PI]);
        for ord in [
            VectorNormOrder::P(1),
            VectorNormOrder::P(2),
            VectorNormOrder::P(3),
            VectorNormOrder::Inf,
            VectorNormOrder::NegInf,
            VectorNormOrder::Fro,
        ] {
            let norm = vector_norm(&special, ord).expect("vector norm");
            assert!(norm.is_nan(), "{ord:?} gave {norm}");
            let flipped = vector_norm(&special.transpose(), ord).expect("row norm");
            assert!(flipped.is_nan(), "{ord:?} gave {flipped}");
        }

        let infinite = column(&[f64::INFINITY, f64::NEG_INFINITY, PI]);
        assert_eq!(vector_norm(&infinite, VectorNormOrder::Inf), Ok(f64::INFINITY));
        assert_eq!(vector_norm(&infinite, VectorNormOrder::NegInf), Ok(PI));
        assert_eq!(vector_norm(&infinite, VectorNormOrder::P(1)), Ok(f64::INFINITY));

        let with_nan = column(&[1.0, f64::NAN, 2.0]);
        for ord in [
            MatrixNormOrder::One,
            MatrixNormOrder::Two,
            MatrixNormOrder::Inf,
            MatrixNormOrder::Fro,
        ] {
            let norm = matrix_norm(&with_nan, ord).expect("matrix norm");
            assert!(norm.is_nan(), "{ord:?} gave {norm}");
        }
        let with_inf = Matrix::from_row_slice(2, 2, &[1.0, f64::INFINITY, 0.0, 2.0]);
        assert_eq!(matrix_norm(&with_inf, MatrixNormOrder::Two), Ok(f64::INFINITY));
    }
}
