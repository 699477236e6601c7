#![forbid(unsafe_code)]

mod rng;

pub use rng::DeterministicRng;

use core::fmt;
use fxg_io::{IOError, MatrixFileFormat, read_matrix_file, write_matrix_file};
use fxg_layout::{IndexSpan, Matrix, ShapeError, column, from_text, hilbert, to_text};
use std::collections::BTreeMap;
use std::f64::consts::{E, PI};
use std::path::{Path, PathBuf};

pub const INPUT_REASON_CODES: [&str; 6] = [
    "input_kind_mismatch",
    "input_position_out_of_range",
    "input_label_invalid",
    "input_class_unknown",
    "input_io_failure",
    "input_shape_invalid",
];

/// Vector lengths and square sizes.
pub const SIZES: [usize; 5] = [1, 2, 3, 4, 10];

/// Shapes used for generic matrices: square, tall, wide and a single element.
pub const GEN_MAT_SHAPES: [(usize, usize); 8] = [
    (1, 1),
    (1, 3),
    (3, 1),
    (2, 3),
    (3, 2),
    (3, 3),
    (4, 4),
    (10, 10),
];

const COUNTS: [usize; 6] = [0, 1, 2, 3, 4, 10];
const INDICES: [usize; 5] = [0, 1, 2, 4, 9];
const NUM_BINS: [usize; 5] = [1, 2, 3, 5, 10];

const SPECIAL_CYCLE: [f64; 8] = [
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::NAN,
    PI,
    -PI,
    0.0,
    1.0,
    -1.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputClass {
    NumRows,
    NumCols,
    NumElems,
    Scalar,
    ElemInd,
    RowInd,
    ColInd,
    Span,
    Dim,
    NormType,
    NormOrder,
    SortDirection,
    NumBins,
    MonColVec,
    GenColVec,
    GenRowVec,
    GenMat,
    SquareMat,
    InvMat,
    SymPdMat,
}

impl InputClass {
    pub const ALL: [Self; 20] = [
        Self::NumRows,
        Self::NumCols,
        Self::NumElems,
        Self::Scalar,
        Self::ElemInd,
        Self::RowInd,
        Self::ColInd,
        Self::Span,
        Self::Dim,
        Self::NormType,
        Self::NormOrder,
        Self::SortDirection,
        Self::NumBins,
        Self::MonColVec,
        Self::GenColVec,
        Self::GenRowVec,
        Self::GenMat,
        Self::SquareMat,
        Self::InvMat,
        Self::SymPdMat,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NumRows => "NumRows",
            Self::NumCols => "NumCols",
            Self::NumElems => "NumElems",
            Self::Scalar => "Scalar",
            Self::ElemInd => "ElemInd",
            Self::RowInd => "RowInd",
            Self::ColInd => "ColInd",
            Self::Span => "Span",
            Self::Dim => "Dim",
            Self::NormType => "NormType",
            Self::NormOrder => "NormOrder",
            Self::SortDirection => "SortDirection",
            Self::NumBins => "NumBins",
            Self::MonColVec => "MonColVec",
            Self::GenColVec => "GenColVec",
            Self::GenRowVec => "GenRowVec",
            Self::GenMat => "GenMat",
            Self::SquareMat => "SquareMat",
            Self::InvMat => "InvMat",
            Self::SymPdMat => "SymPdMat",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, InputError> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == name)
            .ok_or_else(|| InputError::UnknownClass(name.to_string()))
    }

    /// Classes whose values are persisted as input files.
    #[must_use]
    pub const fn is_matrix_valued(self) -> bool {
        matches!(
            self,
            Self::MonColVec
                | Self::GenColVec
                | Self::GenRowVec
                | Self::GenMat
                | Self::SquareMat
                | Self::InvMat
                | Self::SymPdMat
        )
    }

    const fn seed_tag(self) -> u64 {
        self as u64 + 1
    }

    /// The full labeled value set for this class.
    #[must_use]
    pub fn parameters(self) -> Vec<InputParameter> {
        match self {
            Self::NumRows | Self::NumCols | Self::NumElems => {
                count_parameters(self, &COUNTS)
            }
            Self::Dim | Self::NormType => count_parameters(self, &[0, 1]),
            Self::NumBins => count_parameters(self, &NUM_BINS),
            Self::ElemInd | Self::RowInd | Self::ColInd => INDICES
                .iter()
                .map(|&i| InputParameter::new(self, i.to_string(), InputValue::Index(i)))
                .collect(),
            Self::Scalar => scalar_parameters(),
            Self::Span => span_parameters(),
            Self::NormOrder => [
                ("1", "1"),
                ("2", "2"),
                ("3", "3"),
                ("Inf", "inf"),
                ("NegInf", "-inf"),
                ("Fro", "fro"),
            ]
            .into_iter()
            .map(|(label, token)| InputParameter::new(self, label, InputValue::Token(token)))
            .collect(),
            Self::SortDirection => ["ascend", "descend"]
                .into_iter()
                .map(|token| InputParameter::new(self, token, InputValue::Token(token)))
                .collect(),
            Self::MonColVec => edge_parameters(),
            Self::GenColVec => SIZES
                .iter()
                .flat_map(|&n| fill_parameters(self, n, 1, &format!("{n}")))
                .collect(),
            Self::GenRowVec => SIZES
                .iter()
                .flat_map(|&n| fill_parameters(self, 1, n, &format!("{n}")))
                .collect(),
            Self::GenMat => GEN_MAT_SHAPES
                .iter()
                .flat_map(|&(r, c)| fill_parameters(self, r, c, &format!("{r}x{c}")))
                .collect(),
            Self::SquareMat => SIZES
                .iter()
                .flat_map(|&n| fill_parameters(self, n, n, &format!("{n}x{n}")))
                .collect(),
            Self::InvMat => SIZES
                .iter()
                .flat_map(|&n| {
                    [
                        ("Eye", Fill::Eye.matrix(self, n, n)),
                        ("Hilbert", Fill::Hilbert.matrix(self, n, n)),
                        ("DiagDominant", diag_dominant(self, n)),
                    ]
                    .map(|(name, m)| {
                        InputParameter::new(self, format!("{name}{n}x{n}"), InputValue::Matrix(m))
                    })
                })
                .collect(),
            Self::SymPdMat => SIZES
                .iter()
                .flat_map(|&n| {
                    [
                        ("Eye", Fill::Eye.matrix(self, n, n)),
                        ("Hilbert", Fill::Hilbert.matrix(self, n, n)),
                        ("Gram", shifted_gram(self, n)),
                    ]
                    .map(|(name, m)| {
                        InputParameter::new(self, format!("{name}{n}x{n}"), InputValue::Matrix(m))
                    })
                })
                .collect(),
        }
    }
}

impl fmt::Display for InputClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    Zeros,
    Ones,
    Eye,
    Hilbert,
    Random,
    Special,
}

impl Fill {
    const ALL: [Self; 6] = [
        Self::Zeros,
        Self::Ones,
        Self::Eye,
        Self::Hilbert,
        Self::Random,
        Self::Special,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Zeros => "Zeros",
            Self::Ones => "Ones",
            Self::Eye => "Eye",
            Self::Hilbert => "Hilbert",
            Self::Random => "Random",
            Self::Special => "Special",
        }
    }

    fn matrix(self, class: InputClass, rows: usize, cols: usize) -> Matrix {
        match self {
            Self::Zeros => Matrix::zeros(rows, cols),
            Self::Ones => Matrix::from_element(rows, cols, 1.0),
            Self::Eye => Matrix::identity(rows, cols),
            Self::Hilbert => hilbert(rows, cols),
            Self::Random => random_matrix(class, rows, cols),
            Self::Special => Matrix::from_iterator(
                rows,
                cols,
                SPECIAL_CYCLE.iter().copied().cycle().take(rows * cols),
            ),
        }
    }
}

fn random_matrix(class: InputClass, rows: usize, cols: usize) -> Matrix {
    let mut rng = DeterministicRng::for_shape(class.seed_tag(), rows, cols);
    Matrix::from_fn(rows, cols, |_, _| rng.next_signed_unit())
}

/// Random matrix whose diagonal dominates its row's absolute sum.
fn diag_dominant(class: InputClass, n: usize) -> Matrix {
    let mut m = random_matrix(class, n, n);
    for i in 0..n {
        let off_diagonal: f64 = (0..n).filter(|&j| j != i).map(|j| m[(i, j)].abs()).sum();
        m[(i, i)] = off_diagonal + 1.0;
    }
    m
}

/// `R^T R + n I` for a random `R`.
fn shifted_gram(class: InputClass, n: usize) -> Matrix {
    let r = random_matrix(class, n, n);
    Matrix::from_fn(n, n, |i, j| {
        let dot: f64 = r.column(i).iter().zip(r.column(j).iter()).map(|(a, b)| a * b).sum();
        if i == j { dot + n as f64 } else { dot }
    })
}

fn count_parameters(class: InputClass, values: &[usize]) -> Vec<InputParameter> {
    values
        .iter()
        .map(|&n| InputParameter::new(class, n.to_string(), InputValue::Count(n)))
        .collect()
}

fn scalar_parameters() -> Vec<InputParameter> {
    [
        ("NegInf", f64::NEG_INFINITY),
        ("NegPi", -PI),
        ("NegOne", -1.0),
        ("NegHalf", -0.5),
        ("Zero", 0.0),
        ("Half", 0.5),
        ("One", 1.0),
        ("E", E),
        ("Pi", PI),
        ("Inf", f64::INFINITY),
        ("NaN", f64::NAN),
    ]
    .into_iter()
    .map(|(label, value)| InputParameter::new(InputClass::Scalar, label, InputValue::Scalar(value)))
    .collect()
}

fn span_parameters() -> Vec<InputParameter> {
    let mut spans: Vec<InputParameter> = [(0, 0), (0, 1), (1, 2), (0, 3), (2, 4), (0, 9)]
        .into_iter()
        .map(|(first, last)| {
            InputParameter::new(
                InputClass::Span,
                format!("{first}_{last}"),
                InputValue::Span(IndexSpan::range(first, last)),
            )
        })
        .collect();
    spans.push(InputParameter::new(
        InputClass::Span,
        "All",
        InputValue::Span(IndexSpan::All),
    ));
    spans
}

fn edge_parameters() -> Vec<InputParameter> {
    [
        ("Edges3", vec![0.0, 0.5, 1.0]),
        ("Edges4", vec![-10.0, -1.0, 1.0, 10.0]),
        ("Edges5", vec![-1.0, -0.5, 0.0, 0.5, 1.0]),
    ]
    .into_iter()
    .map(|(label, edges)| {
        InputParameter::new(InputClass::MonColVec, label, InputValue::Matrix(column(&edges)))
    })
    .collect()
}

fn fill_parameters(class: InputClass, rows: usize, cols: usize, shape: &str) -> Vec<InputParameter> {
    Fill::ALL
        .iter()
        .map(|&fill| {
            InputParameter::new(
                class,
                format!("{}{shape}", fill.as_str()),
                InputValue::Matrix(fill.matrix(class, rows, cols)),
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Count(usize),
    Scalar(f64),
    Index(usize),
    Span(IndexSpan),
    Token(&'static str),
    Matrix(Matrix),
}

impl InputValue {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::Scalar(_) => "scalar",
            Self::Index(_) => "index",
            Self::Span(_) => "span",
            Self::Token(_) => "token",
            Self::Matrix(_) => "matrix",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputParameter {
    pub class: InputClass,
    pub label: String,
    pub value: InputValue,
}

impl InputParameter {
    fn new(class: InputClass, label: impl Into<String>, value: InputValue) -> Self {
        Self {
            class,
            label: label.into(),
            value,
        }
    }
}

/// Labels end up in file names, so only `[A-Za-z0-9_.-]` is allowed.
pub fn validate_label(label: &str) -> Result<(), InputError> {
    let valid = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(InputError::InvalidLabel(label.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    KindMismatch {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
    PositionOutOfRange {
        position: usize,
        len: usize,
    },
    InvalidLabel(String),
    UnknownClass(String),
    Io(IOError),
    Shape(ShapeError),
}

impl InputError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::KindMismatch { .. } => "input_kind_mismatch",
            Self::PositionOutOfRange { .. } => "input_position_out_of_range",
            Self::InvalidLabel(_) => "input_label_invalid",
            Self::UnknownClass(_) => "input_class_unknown",
            Self::Io(_) => "input_io_failure",
            Self::Shape(_) => "input_shape_invalid",
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch {
                position,
                expected,
                found,
            } => write!(f, "tuple slot {position} holds a {found}, not a {expected}"),
            Self::PositionOutOfRange { position, len } => {
                write!(f, "tuple slot {position} out of range for {len} parameters")
            }
            Self::InvalidLabel(label) => write!(f, "invalid parameter label {label:?}"),
            Self::UnknownClass(name) => write!(f, "unknown input class {name:?}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Shape(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InputError {}

impl From<IOError> for InputError {
    fn from(err: IOError) -> Self {
        Self::Io(err)
    }
}

impl From<ShapeError> for InputError {
    fn from(err: ShapeError) -> Self {
        Self::Shape(err)
    }
}

/// One combinatorial case: parameters borrowed from an [`InputCatalog`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestTuple<'a> {
    params: Vec<&'a InputParameter>,
}

impl<'a> TestTuple<'a> {
    #[must_use]
    pub fn new(params: Vec<&'a InputParameter>) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `(label1,label2,...)`
    #[must_use]
    pub fn file_suffix(&self) -> String {
        let labels: Vec<&str> = self.params.iter().map(|p| p.label.as_str()).collect();
        format!("({})", labels.join(","))
    }

    fn value(&self, position: usize) -> Result<&'a InputValue, InputError> {
        self.params
            .get(position)
            .copied()
            .map(|p| &p.value)
            .ok_or(InputError::PositionOutOfRange {
                position,
                len: self.params.len(),
            })
    }

    fn mismatch(&self, position: usize, expected: &'static str) -> InputError {
        InputError::KindMismatch {
            position,
            expected,
            found: self.params[position].value.kind(),
        }
    }

    pub fn matrix(&self, position: usize) -> Result<&'a Matrix, InputError> {
        match self.value(position)? {
            InputValue::Matrix(m) => Ok(m),
            _ => Err(self.mismatch(position, "matrix")),
        }
    }

    pub fn scalar(&self, position: usize) -> Result<f64, InputError> {
        match self.value(position)? {
            InputValue::Scalar(s) => Ok(*s),
            _ => Err(self.mismatch(position, "scalar")),
        }
    }

    pub fn count(&self, position: usize) -> Result<usize, InputError> {
        match self.value(position)? {
            InputValue::Count(n) => Ok(*n),
            _ => Err(self.mismatch(position, "count")),
        }
    }

    pub fn index(&self, position: usize) -> Result<usize, InputError> {
        match self.value(position)? {
            InputValue::Index(i) => Ok(*i),
            _ => Err(self.mismatch(position, "index")),
        }
    }

    pub fn span(&self, position: usize) -> Result<IndexSpan, InputError> {
        match self.value(position)? {
            InputValue::Span(span) => Ok(*span),
            _ => Err(self.mismatch(position, "span")),
        }
    }

    pub fn token(&self, position: usize) -> Result<&'static str, InputError> {
        match self.value(position)? {
            InputValue::Token(token) => Ok(token),
            _ => Err(self.mismatch(position, "token")),
        }
    }
}

#[must_use]
pub fn input_file_name(class: InputClass, label: &str, format: MatrixFileFormat) -> String {
    format!("{}.{label}.{}", class.as_str(), format.extension())
}

/// Parameter sets for every class, keyed by class.
#[derive(Debug, Clone, PartialEq)]
pub struct InputCatalog {
    sets: BTreeMap<InputClass, Vec<InputParameter>>,
}

impl InputCatalog {
    #[must_use]
    pub fn in_memory() -> Self {
        let sets = InputClass::ALL
            .into_iter()
            .map(|class| (class, class.parameters()))
            .collect();
        Self { sets }
    }

    /// Matrix-valued classes are read from `<root>/<Class>.<label>.<ext>`; the rest are generated.
    pub fn from_directory(root: &Path, format: MatrixFileFormat) -> Result<Self, InputError> {
        let mut catalog = Self::in_memory();
        for (class, params) in &mut catalog.sets {
            if !class.is_matrix_valued() {
                continue;
            }
            for param in params.iter_mut() {
                let path = root.join(input_file_name(*class, &param.label, format));
                let text = read_matrix_file(&path, format)?;
                param.value = InputValue::Matrix(from_text(&text)?);
            }
        }
        Ok(catalog)
    }

    /// Write every matrix-valued parameter under `root`, returning the written paths.
    pub fn write_directory(
        &self,
        root: &Path,
        format: MatrixFileFormat,
    ) -> Result<Vec<PathBuf>, InputError> {
        let mut written = Vec::new();
        for (class, params) in &self.sets {
            if !class.is_matrix_valued() {
                continue;
            }
            for param in params {
                let InputValue::Matrix(m) = &param.value else {
                    continue;
                };
                validate_label(&param.label)?;
                let path = root.join(input_file_name(*class, &param.label, format));
                write_matrix_file(&path, &to_text(m), format)?;
                written.push(path);
            }
        }
        Ok(written)
    }

    #[must_use]
    pub fn parameters(&self, class: InputClass) -> &[InputParameter] {
        self.sets.get(&class).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn tuple_count(&self, signature: &[InputClass]) -> usize {
        if signature.is_empty() {
            return 0;
        }
        signature
            .iter()
            .map(|&class| self.parameters(class).len())
            .product()
    }

    /// Cartesian product over `signature`; the first class varies slowest.
    #[must_use]
    pub fn expand(&self, signature: &[InputClass]) -> Vec<TestTuple<'_>> {
        let sets: Vec<&[InputParameter]> = signature
            .iter()
            .map(|&class| self.parameters(class))
            .collect();
        if sets.is_empty() || sets.iter().any(|set| set.is_empty()) {
            return Vec::new();
        }

        let mut tuples = Vec::with_capacity(self.tuple_count(signature));
        let mut cursor = vec![0usize; sets.len()];
        loop {
            tuples.push(TestTuple::new(
                cursor.iter().zip(&sets).map(|(&i, set)| &set[i]).collect(),
            ));

            let mut slot = sets.len();
            loop {
                if slot == 0 {
                    return tuples;
                }
                slot -= 1;
                cursor[slot] += 1;
                if cursor[slot] < sets[slot].len() {
                    break;
                }
                cursor[slot] = 0;
            }
        }
    }
}
