use crate::{
    ExpectedError, ExpectedFamily, ExpectedSink, GUARD_LENGTH_MISMATCH, GUARD_SHAPE_MISMATCH,
    unsupported,
};
use fxg_input::{InputClass as C, TestTuple};
use fxg_layout::{Matrix, can_multiply};
use fxg_ufunc::{BinaryOp, ScalarOp};

/// Matrix-scalar arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct ScalarArithmetic {
    signature: &'static [C],
}

impl ScalarArithmetic {
    pub const SIGNATURES: [&'static [C]; 3] = [
        &[C::GenMat, C::Scalar],
        &[C::GenColVec, C::Scalar],
        &[C::GenRowVec, C::Scalar],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for ScalarArithmetic {
    fn name(&self) -> &'static str {
        "ScalarArithmetic"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenMat | C::GenColVec | C::GenRowVec, C::Scalar] => {
                let (m, s) = (tuple.matrix(0)?, tuple.scalar(1)?);
                for op in ScalarOp::ALL {
                    sink.write(op.token(), &op.map(m, s))?;
                }
                Ok(())
            }
            other => Err(unsupported(other)),
        }
    }
}

/// Element-wise binary ops, the matrix product and the Kronecker product.
#[derive(Debug, Clone, Copy)]
pub struct MatrixArithmetic {
    signature: &'static [C],
}

impl MatrixArithmetic {
    pub const SIGNATURES: [&'static [C]; 1] = [&[C::GenMat, C::GenMat]];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for MatrixArithmetic {
    fn name(&self) -> &'static str {
        "MatrixArithmetic"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenMat, C::GenMat] => {
                let (a, b) = (tuple.matrix(0)?, tuple.matrix(1)?);
                for op in BinaryOp::ALL {
                    sink.emit(op.token(), op.zip(a, b))?;
                }
                if can_multiply(a, b) {
                    sink.write("times", &(a * b))?;
                } else {
                    sink.skip("times", GUARD_SHAPE_MISMATCH)?;
                }
                sink.write("kron", &a.kronecker(b))
            }
            other => Err(unsupported(other)),
        }
    }
}

/// Outer, inner, dot and cross products of vectors.
#[derive(Debug, Clone, Copy)]
pub struct VectorProducts {
    signature: &'static [C],
}

impl VectorProducts {
    pub const SIGNATURES: [&'static [C]; 3] = [
        &[C::GenColVec, C::GenRowVec],
        &[C::GenRowVec, C::GenColVec],
        &[C::GenColVec, C::GenColVec],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

fn cross(a: &[f64], b: &[f64]) -> Matrix {
    Matrix::from_column_slice(
        3,
        1,
        &[
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ],
    )
}

impl ExpectedFamily for VectorProducts {
    fn name(&self) -> &'static str {
        "VectorProducts"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        let (a, b) = (tuple.matrix(0)?, tuple.matrix(1)?);
        match self.signature {
            [C::GenColVec, C::GenRowVec] => sink.write("outer", &(a * b)),
            [C::GenRowVec, C::GenColVec] => {
                if a.len() != b.len() {
                    return sink.skip("inner", GUARD_LENGTH_MISMATCH);
                }
                sink.write("inner", &(a * b))
            }
            [C::GenColVec, C::GenColVec] => {
                if a.len() != b.len() {
                    sink.skip("dot", GUARD_LENGTH_MISMATCH)?;
                } else {
                    sink.write_scalar("dot", a.dot(b))?;
                }
                if a.len() == 3 && b.len() == 3 {
                    sink.write("cross", &cross(a.as_slice(), b.as_slice()))
                } else {
                    sink.skip("cross", GUARD_LENGTH_MISMATCH)
                }
            }
            other => Err(unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MatrixArithmetic, ScalarArithmetic, VectorProducts};
    use crate::test_support::{has_artifact, run_into_temp};
    use fxg_input::InputClass as C;
    use fxg_io::{MatrixFileFormat, read_matrix_file};
    use fxg_runtime::CaseOutcome;

    #[test]
    fn scalar_ops_write_every_case() {
        let family = ScalarArithmetic::new(&[C::GenRowVec, C::Scalar]);
        let (run, sink, root) = run_into_temp(&family, "scalar_arith");
        assert_eq!(run.tuple_count, 30 * 11);
        assert_eq!(run.written, run.tuple_count * 7);
        assert!(has_artifact(&sink, "GenRowVecScalar.pow(Random4,Half).txt"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn binary_ops_are_shape_guarded() {
        let family = MatrixArithmetic::new(&[C::GenMat, C::GenMat]);
        let (run, sink, root) = run_into_temp(&family, "matrix_arith");
        assert_eq!(run.tuple_count, 48 * 48);
        assert!(has_artifact(&sink, "GenMatGenMat.plus(Ones2x3,Eye2x3).txt"));
        assert!(!has_artifact(&sink, "GenMatGenMat.plus(Ones2x3,Eye3x2).txt"));
        assert!(has_artifact(&sink, "GenMatGenMat.times(Ones2x3,Eye3x2).txt"));
        assert!(!has_artifact(&sink, "GenMatGenMat.times(Ones2x3,Eye2x3).txt"));
        assert!(has_artifact(&sink, "GenMatGenMat.kron(Ones1x3,Eye3x1).txt"));
        let skipped_plus = sink
            .ledger()
            .events()
            .iter()
            .filter(|e| e.op == "plus" && e.outcome == CaseOutcome::Skipped)
            .count();
        // 8 shapes with 6 fills each; only equal shapes combine.
        assert_eq!(skipped_plus, 48 * 48 - 8 * 36);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn vector_products_check_lengths() {
        let family = VectorProducts::new(&[C::GenColVec, C::GenColVec]);
        let (run, sink, root) = run_into_temp(&family, "vector_products");
        assert_eq!(run.tuple_count, 30 * 30);
        assert!(has_artifact(&sink, "GenColVecGenColVec.dot(Ones3,Random3).txt"));
        assert!(!has_artifact(&sink, "GenColVecGenColVec.dot(Ones3,Random4).txt"));

        let cross = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenColVecGenColVec.cross(Eye3,Eye3).txt")
            .expect("cross artifact");
        let values = read_matrix_file(&cross.path, MatrixFileFormat::RawAscii)
            .expect("readable")
            .values;
        assert_eq!(values, vec![0.0, 0.0, 0.0]);

        let outer = VectorProducts::new(&[C::GenColVec, C::GenRowVec]);
        let (run, sink, root2) = run_into_temp(&outer, "outer_products");
        assert_eq!(run.written, run.tuple_count);
        let artifact = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenColVecGenRowVec.outer(Ones2,Ones10).txt")
            .expect("outer artifact");
        assert_eq!((artifact.rows, artifact.cols), (2, 10));
        let _ = std::fs::remove_dir_all(&root);
        let _ = std::fs::remove_dir_all(&root2);
    }
}
