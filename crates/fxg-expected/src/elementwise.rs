use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_ufunc::UnaryOp;

/// Every unary element-wise map over matrices and vectors.
#[derive(Debug, Clone, Copy)]
pub struct ElementwiseMaps {
    signature: &'static [C],
}

impl ElementwiseMaps {
    pub const SIGNATURES: [&'static [C]; 3] = [&[C::GenMat], &[C::GenColVec], &[C::GenRowVec]];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for ElementwiseMaps {
    fn name(&self) -> &'static str {
        "ElementwiseMaps"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenMat] | [C::GenColVec] | [C::GenRowVec] => {
                let m = tuple.matrix(0)?;
                for op in UnaryOp::ALL {
                    sink.write(op.token(), &op.map(m))?;
                }
                Ok(())
            }
            other => Err(unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ElementwiseMaps;
    use crate::test_support::{has_artifact, run_into_temp};
    use fxg_input::InputClass as C;
    use fxg_io::{MatrixFileFormat, read_matrix_file};
    use fxg_ufunc::UnaryOp;

    #[test]
    fn writes_every_op_for_every_vector() {
        let family = ElementwiseMaps::new(&[C::GenColVec]);
        let (run, sink, root) = run_into_temp(&family, "elementwise");
        assert_eq!(run.written, run.tuple_count * UnaryOp::ALL.len());
        assert_eq!(run.skipped, 0);
        assert!(has_artifact(&sink, "GenColVec.sqrt(Special4).txt"));

        let abs = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenColVec.abs(Special3).txt")
            .expect("abs artifact");
        let values = read_matrix_file(&abs.path, MatrixFileFormat::RawAscii)
            .expect("readable")
            .values;
        assert_eq!(values[0], f64::INFINITY);
        assert_eq!(values[1], f64::INFINITY);
        assert!(values[2].is_nan());
        let _ = std::fs::remove_dir_all(&root);
    }
}
