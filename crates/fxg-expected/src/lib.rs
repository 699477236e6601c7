#![forbid(unsafe_code)]

mod access;
mod arithmetic;
mod decomposition;
mod elementwise;
mod generation;
mod histogram;
mod norms;
mod reshape;
mod sink;
mod sorting;
mod statistics;

pub use access::Access;
pub use arithmetic::{MatrixArithmetic, ScalarArithmetic, VectorProducts};
pub use decomposition::Decompositions;
pub use elementwise::ElementwiseMaps;
pub use generation::Generation;
pub use histogram::Histograms;
pub use norms::Norms;
pub use reshape::Reshapes;
pub use sink::{Artifact, ExpectedSink};
pub use sorting::Sorting;
pub use statistics::Statistics;

use core::fmt;
use fxg_input::{InputCatalog, InputClass, InputError, TestTuple};
use fxg_io::IOError;
use fxg_layout::ShapeError;
use fxg_linalg::LinAlgError;
use fxg_runtime::CaseOutcome;
use fxg_ufunc::UFuncError;
use std::time::Instant;

pub const EXPECTED_REASON_CODES: [&str; 5] = [
    "expected_io_failure",
    "expected_input_contract_violation",
    "expected_duplicate_artifact",
    "expected_signature_unsupported",
    "expected_part_count_mismatch",
];

pub const GUARD_SHAPE_MISMATCH: &str = "guard_shape_mismatch";
pub const GUARD_LENGTH_MISMATCH: &str = "guard_length_mismatch";
pub const GUARD_NON_FINITE_INPUT: &str = "guard_non_finite_input";

pub const GUARD_REASON_CODES: [&str; 3] = [
    GUARD_SHAPE_MISMATCH,
    GUARD_LENGTH_MISMATCH,
    GUARD_NON_FINITE_INPUT,
];

/// Errors that can explain a skipped or suppressed case.
pub trait ReasonCode {
    fn reason_code(&self) -> &'static str;
}

impl ReasonCode for ShapeError {
    fn reason_code(&self) -> &'static str {
        ShapeError::reason_code(self)
    }
}

impl ReasonCode for UFuncError {
    fn reason_code(&self) -> &'static str {
        UFuncError::reason_code(self)
    }
}

impl ReasonCode for LinAlgError {
    fn reason_code(&self) -> &'static str {
        LinAlgError::reason_code(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedError {
    Io(IOError),
    Input(InputError),
    DuplicateArtifact(String),
    UnsupportedSignature(String),
    PartCountMismatch { ops: usize, parts: usize },
}

impl ExpectedError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "expected_io_failure",
            Self::Input(_) => "expected_input_contract_violation",
            Self::DuplicateArtifact(_) => "expected_duplicate_artifact",
            Self::UnsupportedSignature(_) => "expected_signature_unsupported",
            Self::PartCountMismatch { .. } => "expected_part_count_mismatch",
        }
    }
}

impl fmt::Display for ExpectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Input(err) => write!(f, "{err}"),
            Self::DuplicateArtifact(file) => write!(f, "artifact {file} written twice"),
            Self::UnsupportedSignature(prefix) => {
                write!(f, "family has no handler for signature {prefix}")
            }
            Self::PartCountMismatch { ops, parts } => {
                write!(f, "{parts} result parts for {ops} op tags")
            }
        }
    }
}

impl std::error::Error for ExpectedError {}

impl From<IOError> for ExpectedError {
    fn from(err: IOError) -> Self {
        Self::Io(err)
    }
}

impl From<InputError> for ExpectedError {
    fn from(err: InputError) -> Self {
        Self::Input(err)
    }
}

/// Concatenated class names, e.g. `GenMatScalar`.
#[must_use]
pub fn signature_prefix(signature: &[InputClass]) -> String {
    signature.iter().map(|class| class.as_str()).collect()
}

pub(crate) fn unsupported(signature: &[InputClass]) -> ExpectedError {
    ExpectedError::UnsupportedSignature(signature_prefix(signature))
}

/// A group of expected-value computations over one input signature.
pub trait ExpectedFamily {
    fn name(&self) -> &'static str;

    fn signature(&self) -> &'static [InputClass];

    fn prefix(&self) -> String {
        signature_prefix(self.signature())
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError>;
}

fn register<F, C>(
    families: &mut Vec<Box<dyn ExpectedFamily>>,
    signatures: &[&'static [InputClass]],
    build: C,
) where
    F: ExpectedFamily + 'static,
    C: Fn(&'static [InputClass]) -> F,
{
    for &signature in signatures {
        families.push(Box::new(build(signature)));
    }
}

/// Every family, one entry per handled signature.
#[must_use]
pub fn registry() -> Vec<Box<dyn ExpectedFamily>> {
    let mut families: Vec<Box<dyn ExpectedFamily>> = Vec::new();
    register(&mut families, &Generation::SIGNATURES, Generation::new);
    register(&mut families, &ElementwiseMaps::SIGNATURES, ElementwiseMaps::new);
    register(&mut families, &ScalarArithmetic::SIGNATURES, ScalarArithmetic::new);
    register(&mut families, &MatrixArithmetic::SIGNATURES, MatrixArithmetic::new);
    register(&mut families, &VectorProducts::SIGNATURES, VectorProducts::new);
    register(&mut families, &Statistics::SIGNATURES, Statistics::new);
    register(&mut families, &Decompositions::SIGNATURES, Decompositions::new);
    register(&mut families, &Norms::SIGNATURES, Norms::new);
    register(&mut families, &Reshapes::SIGNATURES, Reshapes::new);
    register(&mut families, &Access::SIGNATURES, Access::new);
    register(&mut families, &Sorting::SIGNATURES, Sorting::new);
    register(&mut families, &Histograms::SIGNATURES, Histograms::new);
    families
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyRun {
    pub name: &'static str,
    pub prefix: String,
    pub tuple_count: usize,
    pub written: usize,
    pub skipped: usize,
    pub suppressed: usize,
    pub duration_ms: u128,
}

/// Expand the family's signature over `catalog` and drive every tuple through it.
pub fn run_family(
    family: &dyn ExpectedFamily,
    catalog: &InputCatalog,
    sink: &mut ExpectedSink,
) -> Result<FamilyRun, ExpectedError> {
    let started = Instant::now();
    let prefix = family.prefix();
    let first_event = sink.ledger().events().len();

    let tuples = catalog.expand(family.signature());
    for tuple in &tuples {
        sink.begin_case(&prefix, &tuple.file_suffix());
        family.expect(tuple, sink)?;
    }

    let events = &sink.ledger().events()[first_event..];
    let count = |outcome: CaseOutcome| events.iter().filter(|e| e.outcome == outcome).count();
    Ok(FamilyRun {
        name: family.name(),
        prefix,
        tuple_count: tuples.len(),
        written: count(CaseOutcome::Written),
        skipped: count(CaseOutcome::Skipped),
        suppressed: count(CaseOutcome::Suppressed),
        duration_ms: started.elapsed().as_millis(),
    })
}


#[cfg(test)]
mod tests {
    use super::{
        EXPECTED_REASON_CODES, ExpectedError, ExpectedSink, GUARD_REASON_CODES, registry,
        signature_prefix,
    };
    use crate::test_support::temp_dir;
    use fxg_input::{InputCatalog, InputClass, InputError};
    use fxg_io::MatrixFileFormat;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn reason_code_registry_is_stable() {
        let errors = [
            ExpectedError::Io(fxg_io::IOError::FileSystem("x".to_string())),
            ExpectedError::Input(InputError::InvalidLabel("x y".to_string())),
            ExpectedError::DuplicateArtifact("a".to_string()),
            ExpectedError::UnsupportedSignature("Dim".to_string()),
            ExpectedError::PartCountMismatch { ops: 3, parts: 2 },
        ];
        let codes: Vec<&str> = errors.iter().map(ExpectedError::reason_code).collect();
        assert_eq!(codes, EXPECTED_REASON_CODES);
    }

    #[test]
    fn guard_codes_are_distinct_from_library_codes() {
        let guards: BTreeSet<&str> = GUARD_REASON_CODES.into_iter().collect();
        assert_eq!(guards.len(), GUARD_REASON_CODES.len());
        assert!(guards.iter().all(|code| code.starts_with("guard_")));
        let library = fxg_io::IO_REASON_CODES
            .iter()
            .chain(&fxg_layout::SHAPE_REASON_CODES)
            .chain(&fxg_ufunc::UFUNC_REASON_CODES)
            .chain(&fxg_linalg::LINALG_REASON_CODES)
            .chain(&EXPECTED_REASON_CODES);
        for code in library {
            assert!(!guards.contains(code), "{code}");
        }
    }

    #[test]
    fn families_sharing_a_prefix_use_distinct_ops() {
        let catalog = InputCatalog::in_memory();
        let root = temp_dir("shared_prefix");
        let mut by_prefix: BTreeMap<String, Vec<(&str, BTreeSet<String>)>> = BTreeMap::new();

        for family in registry() {
            let prefix = family.prefix();
            let tuples = catalog.expand(family.signature());
            let Some(tuple) = tuples.first() else {
                continue;
            };
            let mut sink = ExpectedSink::new(root.join(&prefix), MatrixFileFormat::RawAscii);
            sink.begin_case(&prefix, &tuple.file_suffix());
            family.expect(tuple, &mut sink).expect("first tuple runs");
            let ops = sink.ledger().events().iter().map(|e| e.op.clone()).collect();
            by_prefix.entry(prefix).or_default().push((family.name(), ops));
        }

        let shared: Vec<&String> = by_prefix
            .iter()
            .filter(|(_, families)| families.len() > 1)
            .map(|(prefix, _)| prefix)
            .collect();
        for prefix in ["GenMat", "GenColVec", "GenMatGenMat", "GenMatDim", "GenColVecGenColVec"] {
            assert!(shared.iter().any(|p| p.as_str() == prefix), "{prefix}");
        }
        for (prefix, families) in &by_prefix {
            for (i, (name_a, ops_a)) in families.iter().enumerate() {
                assert!(!ops_a.is_empty(), "{name_a} recorded nothing for {prefix}");
                for (name_b, ops_b) in &families[i + 1..] {
                    let overlap: Vec<&String> = ops_a.intersection(ops_b).collect();
                    assert!(
                        overlap.is_empty(),
                        "{prefix}: {name_a} and {name_b} both emit {overlap:?}"
                    );
                }
            }
        }
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn prefix_concatenates_class_names() {
        assert_eq!(
            signature_prefix(&[InputClass::GenMat, InputClass::Scalar]),
            "GenMatScalar"
        );
    }

    #[test]
    fn registry_entries_are_distinct() {
        let families = registry();
        let keys: BTreeSet<(&str, String)> = families
            .iter()
            .map(|family| (family.name(), family.prefix()))
            .collect();
        assert_eq!(keys.len(), families.len());
        assert!(keys.contains(&("Decompositions", "InvMatGenColVec".to_string())));
        assert!(keys.contains(&("Histograms", "GenColVecMonColVec".to_string())));
    }
}
