#![forbid(unsafe_code)]

use fxg_layout::{
    Matrix, column, is_col_vec, is_row_vec, nan_max, nan_min, require_vector, row_vector,
};
use std::cmp::Ordering;

pub const UFUNC_REASON_CODES: [&str; 9] = [
    "ufunc_shape_contract_violation",
    "ufunc_empty_input",
    "ufunc_nan_rejected",
    "ufunc_dim_invalid",
    "ufunc_norm_type_invalid",
    "ufunc_bin_count_invalid",
    "ufunc_edges_not_monotonic",
    "ufunc_vector_required",
    "ufunc_token_unknown",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Abs,
    Sqrt,
    Square,
    Exp,
    Exp2,
    Exp10,
    Log,
    Log2,
    Log10,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sign,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
}

impl UnaryOp {
    pub const ALL: [Self; 26] = [
        Self::Abs,
        Self::Sqrt,
        Self::Square,
        Self::Exp,
        Self::Exp2,
        Self::Exp10,
        Self::Log,
        Self::Log2,
        Self::Log10,
        Self::Floor,
        Self::Ceil,
        Self::Round,
        Self::Trunc,
        Self::Sign,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Asin,
        Self::Acos,
        Self::Atan,
        Self::Sinh,
        Self::Cosh,
        Self::Tanh,
        Self::Asinh,
        Self::Acosh,
        Self::Atanh,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Square => "square",
            Self::Exp => "exp",
            Self::Exp2 => "exp2",
            Self::Exp10 => "exp10",
            Self::Log => "log",
            Self::Log2 => "log2",
            Self::Log10 => "log10",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Trunc => "trunc",
            Self::Sign => "sign",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Asinh => "asinh",
            Self::Acosh => "acosh",
            Self::Atanh => "atanh",
        }
    }

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Abs => x.abs(),
            Self::Sqrt => x.sqrt(),
            Self::Square => x * x,
            Self::Exp => x.exp(),
            Self::Exp2 => x.exp2(),
            Self::Exp10 => 10f64.powf(x),
            Self::Log => x.ln(),
            Self::Log2 => x.log2(),
            Self::Log10 => x.log10(),
            Self::Floor => x.floor(),
            Self::Ceil => x.ceil(),
            // half away from zero
            Self::Round => x.round(),
            Self::Trunc => x.trunc(),
            Self::Sign => {
                if x.is_nan() {
                    f64::NAN
                } else if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Asinh => x.asinh(),
            Self::Acosh => x.acosh(),
            Self::Atanh => x.atanh(),
        }
    }

    #[must_use]
    pub fn map(self, m: &Matrix) -> Matrix {
        m.map(|x| self.apply(x))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    ElemTimes,
    ElemDivide,
    ElemMin,
    ElemMax,
    Atan2,
    Hypot,
}

impl BinaryOp {
    pub const ALL: [Self; 8] = [
        Self::Plus,
        Self::Minus,
        Self::ElemTimes,
        Self::ElemDivide,
        Self::ElemMin,
        Self::ElemMax,
        Self::Atan2,
        Self::Hypot,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::ElemTimes => "elem_times",
            Self::ElemDivide => "elem_divide",
            Self::ElemMin => "elem_min",
            Self::ElemMax => "elem_max",
            Self::Atan2 => "atan2",
            Self::Hypot => "hypot",
        }
    }

    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Plus => lhs + rhs,
            Self::Minus => lhs - rhs,
            Self::ElemTimes => lhs * rhs,
            Self::ElemDivide => lhs / rhs,
            Self::ElemMin => nan_min(lhs, rhs),
            Self::ElemMax => nan_max(lhs, rhs),
            Self::Atan2 => lhs.atan2(rhs),
            Self::Hypot => lhs.hypot(rhs),
        }
    }

    pub fn zip(self, lhs: &Matrix, rhs: &Matrix) -> Result<Matrix, UFuncError> {
        if lhs.shape() != rhs.shape() {
            return Err(UFuncError::ShapeMismatch {
                lhs: lhs.shape(),
                rhs: rhs.shape(),
            });
        }
        Ok(lhs.zip_map(rhs, |l, r| self.apply(l, r)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    Plus,
    Minus,
    MinusRev,
    Times,
    Divide,
    DivideRev,
    Pow,
}

impl ScalarOp {
    pub const ALL: [Self; 7] = [
        Self::Plus,
        Self::Minus,
        Self::MinusRev,
        Self::Times,
        Self::Divide,
        Self::DivideRev,
        Self::Pow,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::MinusRev => "minus_rev",
            Self::Times => "times",
            Self::Divide => "divide",
            Self::DivideRev => "divide_rev",
            Self::Pow => "pow",
        }
    }

    #[must_use]
    pub fn apply(self, x: f64, s: f64) -> f64 {
        match self {
            Self::Plus => x + s,
            Self::Minus => x - s,
            Self::MinusRev => s - x,
            Self::Times => x * s,
            Self::Divide => x / s,
            Self::DivideRev => s / x,
            Self::Pow => x.powf(s),
        }
    }

    #[must_use]
    pub fn map(self, m: &Matrix, s: f64) -> Matrix {
        m.map(|x| self.apply(x, s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Prod,
    Mean,
    Median,
    Min,
    Max,
    Range,
    Stddev,
    Var,
}

impl ReduceOp {
    pub const ALL: [Self; 9] = [
        Self::Sum,
        Self::Prod,
        Self::Mean,
        Self::Median,
        Self::Min,
        Self::Max,
        Self::Range,
        Self::Stddev,
        Self::Var,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Prod => "prod",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Range => "range",
            Self::Stddev => "stddev",
            Self::Var => "var",
        }
    }

    /// Whether the op accepts a `norm_type` selector.
    #[must_use]
    pub const fn takes_norm_type(self) -> bool {
        matches!(self, Self::Stddev | Self::Var)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CumulativeOp {
    Sum,
    Prod,
}

impl CumulativeOp {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Sum => "cumsum",
            Self::Prod => "cumprod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascend,
    Descend,
}

impl SortDirection {
    pub fn from_token(token: &str) -> Result<Self, UFuncError> {
        match token {
            "ascend" => Ok(Self::Ascend),
            "descend" => Ok(Self::Descend),
            _ => Err(UFuncError::UnknownToken(token.to_string())),
        }
    }

    fn compare(self, lhs: f64, rhs: f64) -> Ordering {
        match self {
            Self::Ascend => lhs.total_cmp(&rhs),
            Self::Descend => rhs.total_cmp(&lhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UFuncError {
    ShapeMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    EmptyInput,
    NanRejected,
    InvalidDim(usize),
    InvalidNormType(usize),
    InvalidBinCount(usize),
    EdgesNotMonotonic,
    VectorRequired {
        rows: usize,
        cols: usize,
    },
    UnknownToken(String),
}

impl std::fmt::Display for UFuncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch { lhs, rhs } => write!(
                f,
                "operand shapes differ: {}x{} vs {}x{}",
                lhs.0, lhs.1, rhs.0, rhs.1
            ),
            Self::EmptyInput => write!(f, "reduction over empty input"),
            Self::NanRejected => write!(f, "input contains NaN"),
            Self::InvalidDim(dim) => write!(f, "dim must be 0 or 1, got {dim}"),
            Self::InvalidNormType(norm_type) => {
                write!(f, "norm_type must be 0 or 1, got {norm_type}")
            }
            Self::InvalidBinCount(n) => write!(f, "bin count must be positive, got {n}"),
            Self::EdgesNotMonotonic => write!(f, "histogram edges must be non-decreasing"),
            Self::VectorRequired { rows, cols } => {
                write!(f, "vector required, got {rows}x{cols}")
            }
            Self::UnknownToken(token) => write!(f, "unknown token {token:?}"),
        }
    }
}

impl std::error::Error for UFuncError {}

impl UFuncError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "ufunc_shape_contract_violation",
            Self::EmptyInput => "ufunc_empty_input",
            Self::NanRejected => "ufunc_nan_rejected",
            Self::InvalidDim(_) => "ufunc_dim_invalid",
            Self::InvalidNormType(_) => "ufunc_norm_type_invalid",
            Self::InvalidBinCount(_) => "ufunc_bin_count_invalid",
            Self::EdgesNotMonotonic => "ufunc_edges_not_monotonic",
            Self::VectorRequired { .. } => "ufunc_vector_required",
            Self::UnknownToken(_) => "ufunc_token_unknown",
        }
    }
}

fn vector_len(v: &Matrix) -> Result<usize, UFuncError> {
    require_vector(v).map_err(|_| UFuncError::VectorRequired {
        rows: v.nrows(),
        cols: v.ncols(),
    })
}

fn reject_nan(values: &[f64]) -> Result<(), UFuncError> {
    if values.iter().any(|v| v.is_nan()) {
        return Err(UFuncError::NanRejected);
    }
    Ok(())
}

/// Rebuild a vector with the orientation of `like`.
fn shaped_like(like: &Matrix, values: &[f64]) -> Matrix {
    if is_row_vec(like) && !is_col_vec(like) {
        row_vector(values)
    } else {
        column(values)
    }
}

// ── reductions ────────

pub fn reduce_slice(values: &[f64], op: ReduceOp, norm_type: usize) -> Result<f64, UFuncError> {
    if norm_type > 1 {
        return Err(UFuncError::InvalidNormType(norm_type));
    }
    let n = values.len() as f64;
    match op {
        ReduceOp::Sum => Ok(values.iter().sum()),
        ReduceOp::Prod => Ok(values.iter().product()),
        _ if values.is_empty() => Err(UFuncError::EmptyInput),
        ReduceOp::Mean => Ok(values.iter().sum::<f64>() / n),
        ReduceOp::Median => {
            reject_nan(values)?;
            let mut sorted = values.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
            } else {
                Ok(sorted[mid])
            }
        }
        ReduceOp::Min => Ok(values.iter().copied().fold(f64::INFINITY, nan_min)),
        ReduceOp::Max => Ok(values.iter().copied().fold(f64::NEG_INFINITY, nan_max)),
        ReduceOp::Range => {
            let min = values.iter().copied().fold(f64::INFINITY, nan_min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, nan_max);
            Ok(max - min)
        }
        ReduceOp::Var => Ok(variance(values, norm_type)),
        ReduceOp::Stddev => Ok(variance(values, norm_type).sqrt()),
    }
}

fn variance(values: &[f64], norm_type: usize) -> f64 {
    if values.len() == 1 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    let denom = if norm_type == 0 { n - 1.0 } else { n };
    squares / denom
}

/// Reduce every element of `m` to one value.
pub fn reduce_all(m: &Matrix, op: ReduceOp, norm_type: usize) -> Result<f64, UFuncError> {
    reduce_slice(m.as_slice(), op, norm_type)
}

/// `dim == 0` reduces each column into a row vector, `dim == 1` each row into a column.
pub fn reduce_along(
    m: &Matrix,
    op: ReduceOp,
    norm_type: usize,
    dim: usize,
) -> Result<Matrix, UFuncError> {
    match dim {
        0 => {
            let lanes = m
                .column_iter()
                .map(|lane| reduce_slice(&lane.iter().copied().collect::<Vec<_>>(), op, norm_type))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(row_vector(&lanes))
        }
        1 => {
            let lanes = m
                .row_iter()
                .map(|lane| reduce_slice(&lane.iter().copied().collect::<Vec<_>>(), op, norm_type))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(column(&lanes))
        }
        other => Err(UFuncError::InvalidDim(other)),
    }
}

fn cumulate(values: &mut [f64], op: CumulativeOp) {
    for i in 1..values.len() {
        values[i] = match op {
            CumulativeOp::Sum => values[i - 1] + values[i],
            CumulativeOp::Prod => values[i - 1] * values[i],
        };
    }
}

/// Apply `f` to every column of `m` in place.
fn for_each_column(mut m: Matrix, mut f: impl FnMut(&mut [f64])) -> Matrix {
    let rows = m.nrows();
    if rows == 0 {
        return m;
    }
    for lane in m.as_mut_slice().chunks_mut(rows) {
        f(lane);
    }
    m
}

/// Running sum/product along `dim` (0 walks down columns, 1 walks along rows).
pub fn cumulative_along(m: &Matrix, op: CumulativeOp, dim: usize) -> Result<Matrix, UFuncError> {
    match dim {
        0 => Ok(for_each_column(m.clone(), |lane| cumulate(lane, op))),
        1 => Ok(for_each_column(m.transpose(), |lane| cumulate(lane, op)).transpose()),
        other => Err(UFuncError::InvalidDim(other)),
    }
}

pub fn cumulative_vec(v: &Matrix, op: CumulativeOp) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    let mut values = v.as_slice().to_vec();
    cumulate(&mut values, op);
    Ok(shaped_like(v, &values))
}

/// Position of the first minimum.
pub fn index_min(v: &Matrix) -> Result<usize, UFuncError> {
    extreme_index(v, Ordering::Less)
}

/// Position of the first maximum.
pub fn index_max(v: &Matrix) -> Result<usize, UFuncError> {
    extreme_index(v, Ordering::Greater)
}

fn extreme_index(v: &Matrix, wanted: Ordering) -> Result<usize, UFuncError> {
    let values = v.as_slice();
    reject_nan(values)?;
    if values.is_empty() {
        return Err(UFuncError::EmptyInput);
    }
    let mut best = 0usize;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if value.total_cmp(&values[best]) == wanted {
            best = idx;
        }
    }
    Ok(best)
}

// ── sorting ────────

pub fn sort_vec(v: &Matrix, direction: SortDirection) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    reject_nan(v.as_slice())?;
    let mut values = v.as_slice().to_vec();
    values.sort_by(|a, b| direction.compare(*a, *b));
    Ok(shaped_like(v, &values))
}

/// Sort each column (`dim == 0`) or each row (`dim == 1`).
pub fn sort_along(m: &Matrix, direction: SortDirection, dim: usize) -> Result<Matrix, UFuncError> {
    reject_nan(m.as_slice())?;
    let sort_lane = |lane: &mut [f64]| lane.sort_by(|a, b| direction.compare(*a, *b));
    match dim {
        0 => Ok(for_each_column(m.clone(), sort_lane)),
        1 => Ok(for_each_column(m.transpose(), sort_lane).transpose()),
        other => Err(UFuncError::InvalidDim(other)),
    }
}

/// Permutation that sorts `v`, as a column of indices.
pub fn sort_index(v: &Matrix, direction: SortDirection) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    let values = v.as_slice();
    reject_nan(values)?;
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_unstable_by(|&a, &b| direction.compare(values[a], values[b]));
    Ok(index_column(&order))
}

/// Like [`sort_index`], keeping tied elements in input order.
pub fn stable_sort_index(v: &Matrix, direction: SortDirection) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    let values = v.as_slice();
    reject_nan(values)?;
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| direction.compare(values[a], values[b]));
    Ok(index_column(&order))
}

fn index_column(order: &[usize]) -> Matrix {
    let as_f64: Vec<f64> = order.iter().map(|&idx| idx as f64).collect();
    column(&as_f64)
}

/// Sorted distinct values with the orientation of the input.
pub fn unique(v: &Matrix) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    reject_nan(v.as_slice())?;
    let mut values = v.as_slice().to_vec();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| a == b);
    Ok(shaped_like(v, &values))
}

// ── histograms ────────

/// Counts over `n_bins` equal-width bins spanning the finite range of `v`.
pub fn hist(v: &Matrix, n_bins: usize) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    if n_bins == 0 {
        return Err(UFuncError::InvalidBinCount(n_bins));
    }
    let values = v.as_slice();
    reject_nan(values)?;

    let finite = values.iter().copied().filter(|x| x.is_finite());
    let (mut min, mut max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });
    if min > max {
        min = 0.0;
        max = 0.0;
    }
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / (n_bins as f64);

    let mut counts = vec![0.0; n_bins];
    for &x in values {
        let slot = if x == f64::NEG_INFINITY {
            0
        } else if x == f64::INFINITY {
            n_bins - 1
        } else {
            let raw = ((x - min) / width).floor();
            if raw < 0.0 {
                0
            } else {
                (raw as usize).min(n_bins - 1)
            }
        };
        counts[slot] += 1.0;
    }
    Ok(shaped_like(v, &counts))
}

/// Counts of `v` in `[edges[i], edges[i + 1])`; the last slot counts exact hits on the last edge.
pub fn histc(v: &Matrix, edges: &Matrix) -> Result<Matrix, UFuncError> {
    vector_len(v)?;
    vector_len(edges)?;
    let values = v.as_slice();
    let edges = edges.as_slice();
    reject_nan(values)?;
    reject_nan(edges)?;
    if edges.is_empty() {
        return Err(UFuncError::InvalidBinCount(0));
    }
    if edges.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(UFuncError::EdgesNotMonotonic);
    }

    let last = edges.len() - 1;
    let mut counts = vec![0.0; edges.len()];
    for &x in values {
        if x == edges[last] {
            counts[last] += 1.0;
            continue;
        }
        if let Some(slot) = (0..last).find(|&i| edges[i] <= x && x < edges[i + 1]) {
            counts[slot] += 1.0;
        }
    }
    Ok(shaped_like(v, &counts))
}
