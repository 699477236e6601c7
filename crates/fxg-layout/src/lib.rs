#![forbid(unsafe_code)]

use fxg_io::TextMatrix;
use nalgebra::DMatrix;

pub const SHAPE_REASON_CODES: [&str; 6] = [
    "layout_index_out_of_bounds",
    "layout_join_mismatch",
    "layout_shape_contract_violation",
    "layout_dim_invalid",
    "layout_length_invalid",
    "layout_element_count_mismatch",
];

/// Dense column-major `f64` matrix. Column vectors are `n x 1`, row vectors `1 x n`.
pub type Matrix = DMatrix<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpan {
    /// Inclusive `first..=last`.
    Range { first: usize, last: usize },
    All,
}

impl IndexSpan {
    #[must_use]
    pub const fn range(first: usize, last: usize) -> Self {
        Self::Range { first, last }
    }

    /// Resolve against an axis of length `len` into `(start, count)`.
    pub fn resolve(self, len: usize) -> Result<(usize, usize), ShapeError> {
        match self {
            Self::All => Ok((0, len)),
            Self::Range { first, last } => {
                if first > last {
                    return Err(ShapeError::InvalidSpan { first, last });
                }
                if last >= len {
                    return Err(ShapeError::IndexOutOfBounds { index: last, len });
                }
                Ok((first, last - first + 1))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    IndexOutOfBounds { index: usize, len: usize },
    InvalidSpan { first: usize, last: usize },
    IncompatibleJoin { lhs: (usize, usize), rhs: (usize, usize) },
    NotSquare { rows: usize, cols: usize },
    NotVector { rows: usize, cols: usize },
    InvalidDim(usize),
    InvalidLength(usize),
    ElementCountMismatch { expected: usize, actual: usize },
}

impl ShapeError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::IndexOutOfBounds { .. } | Self::InvalidSpan { .. } => {
                "layout_index_out_of_bounds"
            }
            Self::IncompatibleJoin { .. } => "layout_join_mismatch",
            Self::NotSquare { .. } | Self::NotVector { .. } => "layout_shape_contract_violation",
            Self::InvalidDim(_) => "layout_dim_invalid",
            Self::InvalidLength(_) => "layout_length_invalid",
            Self::ElementCountMismatch { .. } => "layout_element_count_mismatch",
        }
    }
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::InvalidSpan { first, last } => {
                write!(f, "span first={first} exceeds last={last}")
            }
            Self::IncompatibleJoin { lhs, rhs } => {
                write!(f, "cannot join {}x{} with {}x{}", lhs.0, lhs.1, rhs.0, rhs.1)
            }
            Self::NotSquare { rows, cols } => write!(f, "square matrix required, got {rows}x{cols}"),
            Self::NotVector { rows, cols } => write!(f, "vector required, got {rows}x{cols}"),
            Self::InvalidDim(dim) => write!(f, "dim must be 0 or 1, got {dim}"),
            Self::InvalidLength(len) => write!(f, "invalid length {len}"),
            Self::ElementCountMismatch { expected, actual } => {
                write!(f, "element count mismatch expected={expected} actual={actual}")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

pub fn from_text(text: &TextMatrix) -> Result<Matrix, ShapeError> {
    let expected = text.nrows * text.ncols;
    if text.values.len() != expected {
        return Err(ShapeError::ElementCountMismatch {
            expected,
            actual: text.values.len(),
        });
    }
    Ok(Matrix::from_column_slice(text.nrows, text.ncols, &text.values))
}

#[must_use]
pub fn to_text(matrix: &Matrix) -> TextMatrix {
    TextMatrix {
        nrows: matrix.nrows(),
        ncols: matrix.ncols(),
        values: matrix.as_slice().to_vec(),
    }
}

#[must_use]
pub fn scalar(value: f64) -> Matrix {
    Matrix::from_element(1, 1, value)
}

#[must_use]
pub fn column(values: &[f64]) -> Matrix {
    Matrix::from_column_slice(values.len(), 1, values)
}

#[must_use]
pub fn row_vector(values: &[f64]) -> Matrix {
    Matrix::from_row_slice(1, values.len(), values)
}

// ── shape predicates ────────

#[must_use]
pub fn is_empty(m: &Matrix) -> bool {
    m.nrows() == 0 || m.ncols() == 0
}

#[must_use]
pub fn is_col_vec(m: &Matrix) -> bool {
    m.ncols() == 1
}

#[must_use]
pub fn is_row_vec(m: &Matrix) -> bool {
    m.nrows() == 1
}

#[must_use]
pub fn is_vector(m: &Matrix) -> bool {
    is_col_vec(m) || is_row_vec(m)
}

#[must_use]
pub fn is_square(m: &Matrix) -> bool {
    m.nrows() == m.ncols()
}

#[must_use]
pub fn same_shape(lhs: &Matrix, rhs: &Matrix) -> bool {
    lhs.shape() == rhs.shape()
}

#[must_use]
pub fn can_multiply(lhs: &Matrix, rhs: &Matrix) -> bool {
    lhs.ncols() == rhs.nrows()
}

/// `f64::min` that returns NaN when either side is NaN.
#[must_use]
pub fn nan_min(lhs: f64, rhs: f64) -> f64 {
    if lhs.is_nan() || rhs.is_nan() {
        f64::NAN
    } else {
        lhs.min(rhs)
    }
}

/// `f64::max` that returns NaN when either side is NaN.
#[must_use]
pub fn nan_max(lhs: f64, rhs: f64) -> f64 {
    if lhs.is_nan() || rhs.is_nan() {
        f64::NAN
    } else {
        lhs.max(rhs)
    }
}

pub fn require_square(m: &Matrix) -> Result<usize, ShapeError> {
    if !is_square(m) {
        return Err(ShapeError::NotSquare {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(m.nrows())
}

pub fn require_vector(m: &Matrix) -> Result<usize, ShapeError> {
    if !is_vector(m) {
        return Err(ShapeError::NotVector {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(m.len())
}

fn is_unsized(m: &Matrix) -> bool {
    m.nrows() == 0 && m.ncols() == 0
}

// ── generators ────────

#[must_use]
pub fn zeros(rows: usize, cols: usize) -> Matrix {
    Matrix::zeros(rows, cols)
}

#[must_use]
pub fn ones(rows: usize, cols: usize) -> Matrix {
    Matrix::from_element(rows, cols, 1.0)
}

/// Ones on the main diagonal, also for non-square shapes.
#[must_use]
pub fn eye(rows: usize, cols: usize) -> Matrix {
    Matrix::identity(rows, cols)
}

#[must_use]
pub fn hilbert(rows: usize, cols: usize) -> Matrix {
    Matrix::from_fn(rows, cols, |i, j| 1.0 / ((i + j + 1) as f64))
}

/// `n` equally spaced points from `start` to `end` inclusive, as a column.
pub fn linspace(start: f64, end: f64, n: usize) -> Result<Matrix, ShapeError> {
    if n < 2 {
        return Err(ShapeError::InvalidLength(n));
    }
    let step = (end - start) / ((n - 1) as f64);
    Ok(Matrix::from_fn(n, 1, |i, _| {
        if i == n - 1 {
            end
        } else {
            start + (i as f64) * step
        }
    }))
}

// ── joins / reshapes ────────

/// Horizontal concatenation. Row counts must agree unless an operand is 0x0.
pub fn join_rows(lhs: &Matrix, rhs: &Matrix) -> Result<Matrix, ShapeError> {
    if is_unsized(lhs) {
        return Ok(rhs.clone());
    }
    if is_unsized(rhs) {
        return Ok(lhs.clone());
    }
    if lhs.nrows() != rhs.nrows() {
        return Err(ShapeError::IncompatibleJoin {
            lhs: lhs.shape(),
            rhs: rhs.shape(),
        });
    }
    let split = lhs.ncols();
    Ok(Matrix::from_fn(lhs.nrows(), split + rhs.ncols(), |i, j| {
        if j < split { lhs[(i, j)] } else { rhs[(i, j - split)] }
    }))
}

/// Vertical concatenation. Column counts must agree unless an operand is 0x0.
pub fn join_cols(lhs: &Matrix, rhs: &Matrix) -> Result<Matrix, ShapeError> {
    if is_unsized(lhs) {
        return Ok(rhs.clone());
    }
    if is_unsized(rhs) {
        return Ok(lhs.clone());
    }
    if lhs.ncols() != rhs.ncols() {
        return Err(ShapeError::IncompatibleJoin {
            lhs: lhs.shape(),
            rhs: rhs.shape(),
        });
    }
    let split = lhs.nrows();
    Ok(Matrix::from_fn(split + rhs.nrows(), lhs.ncols(), |i, j| {
        if i < split { lhs[(i, j)] } else { rhs[(i - split, j)] }
    }))
}

/// Refill in column-major order, padding with zeros when growing.
#[must_use]
pub fn reshape(m: &Matrix, rows: usize, cols: usize) -> Matrix {
    let values = m.iter().copied().chain(std::iter::repeat(0.0));
    Matrix::from_iterator(rows, cols, values.take(rows * cols))
}

/// Keep each overlapping element at its `(row, col)` position.
#[must_use]
pub fn resize(m: &Matrix, rows: usize, cols: usize) -> Matrix {
    m.clone().resize(rows, cols, 0.0)
}

pub fn vectorise(m: &Matrix, dim: usize) -> Result<Matrix, ShapeError> {
    match dim {
        0 => Ok(Matrix::from_column_slice(m.len(), 1, m.as_slice())),
        1 => {
            let transposed = m.transpose();
            Ok(Matrix::from_column_slice(1, m.len(), transposed.as_slice()))
        }
        other => Err(ShapeError::InvalidDim(other)),
    }
}

#[must_use]
pub fn flipud(m: &Matrix) -> Matrix {
    let rows = m.nrows();
    Matrix::from_fn(rows, m.ncols(), |i, j| m[(rows - 1 - i, j)])
}

#[must_use]
pub fn fliplr(m: &Matrix) -> Matrix {
    let cols = m.ncols();
    Matrix::from_fn(m.nrows(), cols, |i, j| m[(i, cols - 1 - j)])
}

#[must_use]
pub fn repmat(m: &Matrix, row_copies: usize, col_copies: usize) -> Matrix {
    let (rows, cols) = m.shape();
    Matrix::from_fn(rows * row_copies, cols * col_copies, |i, j| {
        m[(i % rows, j % cols)]
    })
}

pub fn trimatu(m: &Matrix) -> Result<Matrix, ShapeError> {
    let n = require_square(m)?;
    Ok(Matrix::from_fn(n, n, |i, j| if i <= j { m[(i, j)] } else { 0.0 }))
}

pub fn trimatl(m: &Matrix) -> Result<Matrix, ShapeError> {
    let n = require_square(m)?;
    Ok(Matrix::from_fn(n, n, |i, j| if i >= j { m[(i, j)] } else { 0.0 }))
}

/// Diagonal `k` as a column: `k > 0` above the main diagonal, `k < 0` below.
pub fn diagvec(m: &Matrix, k: isize) -> Result<Matrix, ShapeError> {
    let (rows, cols) = m.shape();
    let (row0, col0) = if k >= 0 {
        (0, k.unsigned_abs())
    } else {
        (k.unsigned_abs(), 0)
    };
    if (row0 > 0 && row0 >= rows) || (col0 > 0 && col0 >= cols) {
        return Err(ShapeError::IndexOutOfBounds {
            index: row0.max(col0),
            len: rows.max(cols),
        });
    }
    let len = (rows.saturating_sub(row0)).min(cols.saturating_sub(col0));
    Ok(Matrix::from_fn(len, 1, |i, _| m[(row0 + i, col0 + i)]))
}

// ── element / range access ────────

pub fn at_linear(m: &Matrix, index: usize) -> Result<f64, ShapeError> {
    m.as_slice()
        .get(index)
        .copied()
        .ok_or(ShapeError::IndexOutOfBounds {
            index,
            len: m.len(),
        })
}

pub fn at(m: &Matrix, row: usize, col: usize) -> Result<f64, ShapeError> {
    check_index(row, m.nrows())?;
    check_index(col, m.ncols())?;
    Ok(m[(row, col)])
}

fn check_index(index: usize, len: usize) -> Result<(), ShapeError> {
    if index >= len {
        return Err(ShapeError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

pub fn row(m: &Matrix, index: usize) -> Result<Matrix, ShapeError> {
    check_index(index, m.nrows())?;
    Ok(m.rows(index, 1).into_owned())
}

pub fn col(m: &Matrix, index: usize) -> Result<Matrix, ShapeError> {
    check_index(index, m.ncols())?;
    Ok(m.columns(index, 1).into_owned())
}

pub fn rows(m: &Matrix, span: IndexSpan) -> Result<Matrix, ShapeError> {
    let (start, count) = span.resolve(m.nrows())?;
    Ok(m.rows(start, count).into_owned())
}

pub fn cols(m: &Matrix, span: IndexSpan) -> Result<Matrix, ShapeError> {
    let (start, count) = span.resolve(m.ncols())?;
    Ok(m.columns(start, count).into_owned())
}

pub fn submat(m: &Matrix, row_span: IndexSpan, col_span: IndexSpan) -> Result<Matrix, ShapeError> {
    let (r0, nr) = row_span.resolve(m.nrows())?;
    let (c0, nc) = col_span.resolve(m.ncols())?;
    Ok(m.view((r0, c0), (nr, nc)).into_owned())
}

/// Contiguous slice of a vector, keeping its orientation.
pub fn subvec(v: &Matrix, span: IndexSpan) -> Result<Matrix, ShapeError> {
    let len = require_vector(v)?;
    let (start, count) = span.resolve(len)?;
    let values = &v.as_slice()[start..start + count];
    if is_col_vec(v) {
        Ok(column(values))
    } else {
        Ok(row_vector(values))
    }
}

pub fn shed_row(m: &Matrix, index: usize) -> Result<Matrix, ShapeError> {
    check_index(index, m.nrows())?;
    Ok(m.clone().remove_row(index))
}

pub fn shed_col(m: &Matrix, index: usize) -> Result<Matrix, ShapeError> {
    check_index(index, m.ncols())?;
    Ok(m.clone().remove_column(index))
}

pub fn shed_rows(m: &Matrix, span: IndexSpan) -> Result<Matrix, ShapeError> {
    let (start, count) = span.resolve(m.nrows())?;
    Ok(m.clone().remove_rows(start, count))
}

pub fn shed_cols(m: &Matrix, span: IndexSpan) -> Result<Matrix, ShapeError> {
    let (start, count) = span.resolve(m.ncols())?;
    Ok(m.clone().remove_columns(start, count))
}

pub fn swap_rows(m: &Matrix, a: usize, b: usize) -> Result<Matrix, ShapeError> {
    check_index(a, m.nrows())?;
    check_index(b, m.nrows())?;
    let mut out = m.clone();
    out.swap_rows(a, b);
    Ok(out)
}

pub fn swap_cols(m: &Matrix, a: usize, b: usize) -> Result<Matrix, ShapeError> {
    check_index(a, m.ncols())?;
    check_index(b, m.ncols())?;
    let mut out = m.clone();
    out.swap_columns(a, b);
    Ok(out)
}
