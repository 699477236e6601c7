use crate::{ExpectedError, ReasonCode};
use fxg_io::{MatrixFileFormat, write_matrix_file};
use fxg_layout::{Matrix, scalar, to_text};
use fxg_runtime::{CaseOutcome, GenerationLedger, WRITTEN_REASON_CODE};
use std::collections::HashSet;
use std::path::PathBuf;

/// One expected-output file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file: String,
    pub prefix: String,
    pub op: String,
    pub suffix: String,
    pub rows: usize,
    pub cols: usize,
    pub path: PathBuf,
}

/// Writes artifacts for the current case and records every outcome in the ledger.
#[derive(Debug)]
pub struct ExpectedSink {
    output_root: PathBuf,
    format: MatrixFileFormat,
    prefix: String,
    suffix: String,
    ledger: GenerationLedger,
    artifacts: Vec<Artifact>,
    seen: HashSet<String>,
}

impl ExpectedSink {
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>, format: MatrixFileFormat) -> Self {
        Self {
            output_root: output_root.into(),
            format,
            prefix: String::new(),
            suffix: String::new(),
            ledger: GenerationLedger::new(),
            artifacts: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn begin_case(&mut self, prefix: &str, suffix: &str) {
        prefix.clone_into(&mut self.prefix);
        suffix.clone_into(&mut self.suffix);
    }

    /// `<prefix>.<op><suffix>.<ext>` for the current case.
    #[must_use]
    pub fn artifact_name(&self, op: &str) -> String {
        format!(
            "{}.{op}{}.{}",
            self.prefix,
            self.suffix,
            self.format.extension()
        )
    }

    pub fn write(&mut self, op: &str, m: &Matrix) -> Result<(), ExpectedError> {
        let file = self.artifact_name(op);
        if !self.seen.insert(file.clone()) {
            return Err(ExpectedError::DuplicateArtifact(file));
        }
        let path = self.output_root.join(&file);
        write_matrix_file(&path, &to_text(m), self.format)?;
        self.ledger.record_case(
            &self.prefix,
            op,
            &self.suffix,
            CaseOutcome::Written,
            WRITTEN_REASON_CODE,
        );
        self.artifacts.push(Artifact {
            file,
            prefix: self.prefix.clone(),
            op: op.to_string(),
            suffix: self.suffix.clone(),
            rows: m.nrows(),
            cols: m.ncols(),
            path,
        });
        Ok(())
    }

    /// Scalars are written as 1x1 matrices.
    pub fn write_scalar(&mut self, op: &str, value: f64) -> Result<(), ExpectedError> {
        self.write(op, &scalar(value))
    }

    pub fn skip(&mut self, op: &str, reason_code: &'static str) -> Result<(), ExpectedError> {
        self.ledger.record_case(
            &self.prefix,
            op,
            &self.suffix,
            CaseOutcome::Skipped,
            reason_code,
        );
        Ok(())
    }

    pub fn suppressed(&mut self, op: &str, reason_code: &'static str) -> Result<(), ExpectedError> {
        self.ledger.record_case(
            &self.prefix,
            op,
            &self.suffix,
            CaseOutcome::Suppressed,
            reason_code,
        );
        Ok(())
    }

    /// Write on success, skip with the error's reason code otherwise.
    pub fn emit<E: ReasonCode>(
        &mut self,
        op: &str,
        result: Result<Matrix, E>,
    ) -> Result<(), ExpectedError> {
        match result {
            Ok(m) => self.write(op, &m),
            Err(err) => self.skip(op, err.reason_code()),
        }
    }

    pub fn emit_scalar<E: ReasonCode>(
        &mut self,
        op: &str,
        result: Result<f64, E>,
    ) -> Result<(), ExpectedError> {
        self.emit(op, result.map(scalar))
    }

    /// Write on success, record a suppressed failure otherwise.
    pub fn emit_or_suppress<E: ReasonCode>(
        &mut self,
        op: &str,
        result: Result<Matrix, E>,
    ) -> Result<(), ExpectedError> {
        match result {
            Ok(m) => self.write(op, &m),
            Err(err) => self.suppressed(op, err.reason_code()),
        }
    }

    /// Multi-output ops: every part is written, or every part is skipped.
    pub fn emit_parts<E: ReasonCode>(
        &mut self,
        ops: &[&str],
        result: Result<Vec<Matrix>, E>,
    ) -> Result<(), ExpectedError> {
        match result {
            Ok(parts) => {
                if parts.len() != ops.len() {
                    return Err(ExpectedError::PartCountMismatch {
                        ops: ops.len(),
                        parts: parts.len(),
                    });
                }
                for (op, part) in ops.iter().zip(&parts) {
                    self.write(op, part)?;
                }
                Ok(())
            }
            Err(err) => {
                let reason_code = err.reason_code();
                for op in ops {
                    self.skip(op, reason_code)?;
                }
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &GenerationLedger {
        &self.ledger
    }

    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    #[must_use]
    pub fn into_parts(self) -> (GenerationLedger, Vec<Artifact>) {
        (self.ledger, self.artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::ExpectedSink;
    use crate::ExpectedError;
    use fxg_io::{MatrixFileFormat, read_matrix_file};
    use fxg_layout::{Matrix, ShapeError};
    use fxg_runtime::CaseOutcome;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        std::env::temp_dir().join(format!("fxg_sink_{name}_{ts}"))
    }

    #[test]
    fn names_follow_prefix_op_suffix() {
        let mut sink = ExpectedSink::new(temp_dir("names"), MatrixFileFormat::RawAscii);
        sink.begin_case("GenMatScalar", "(Eye2x3,NegPi)");
        assert_eq!(sink.artifact_name("plus"), "GenMatScalar.plus(Eye2x3,NegPi).txt");
    }

    #[test]
    fn write_records_artifact_and_rejects_duplicates() {
        let root = temp_dir("write");
        let mut sink = ExpectedSink::new(&root, MatrixFileFormat::ArmaAscii);
        sink.begin_case("GenMat", "(Ones2x2)");
        sink.write("trans", &Matrix::from_element(2, 2, 1.0))
            .expect("first write");
        let err = sink
            .write("trans", &Matrix::zeros(1, 1))
            .expect_err("same file twice");
        assert!(matches!(err, ExpectedError::DuplicateArtifact(_)));

        let artifact = &sink.artifacts()[0];
        assert_eq!(artifact.file, "GenMat.trans(Ones2x2).mat");
        assert_eq!((artifact.rows, artifact.cols), (2, 2));
        let reread = read_matrix_file(&artifact.path, MatrixFileFormat::ArmaAscii)
            .expect("artifact readable");
        assert_eq!(reread.values, vec![1.0; 4]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn failures_are_counted_without_files() {
        let root = temp_dir("skip");
        let mut sink = ExpectedSink::new(&root, MatrixFileFormat::RawAscii);
        sink.begin_case("GenMatGenMat", "(Eye1x3,Eye3x1)");
        let failure: Result<Matrix, ShapeError> = Err(ShapeError::InvalidDim(2));
        sink.emit("join_rows", failure.clone()).expect("skip");
        sink.emit_or_suppress("solve", failure.clone())
            .expect("suppress");
        sink.emit_parts(&["qr_econ.Q", "qr_econ.R"], failure.map(|m| vec![m]))
            .expect("skip parts");

        assert!(sink.artifacts().is_empty());
        assert!(!root.exists());
        assert_eq!(sink.ledger().count(CaseOutcome::Skipped), 3);
        assert_eq!(sink.ledger().count(CaseOutcome::Suppressed), 1);
        assert_eq!(
            sink.ledger().last().map(|e| e.reason_code),
            Some("layout_dim_invalid")
        );
    }

    #[test]
    fn part_count_must_match_op_count() {
        let root = temp_dir("parts");
        let mut sink = ExpectedSink::new(&root, MatrixFileFormat::RawAscii);
        sink.begin_case("GenMat", "(Eye3x3)");
        let parts: Result<Vec<Matrix>, ShapeError> = Ok(vec![Matrix::identity(3, 3)]);
        let err = sink
            .emit_parts(&["qr_econ.Q", "qr_econ.R"], parts)
            .expect_err("one part for two ops");
        assert_eq!(err, ExpectedError::PartCountMismatch { ops: 2, parts: 1 });
        assert_eq!(err.reason_code(), "expected_part_count_mismatch");
        assert!(sink.artifacts().is_empty());
        assert!(sink.ledger().events().is_empty());
    }
}
