use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_layout::{fliplr, flipud, join_cols, join_rows, repmat, reshape, resize, vectorise};

/// Reshaping, flipping, tiling and joining.
#[derive(Debug, Clone, Copy)]
pub struct Reshapes {
    signature: &'static [C],
}

impl Reshapes {
    pub const SIGNATURES: [&'static [C]; 6] = [
        &[C::GenMat, C::NumRows, C::NumCols],
        &[C::GenMat],
        &[C::GenMat, C::Dim],
        &[C::GenMat, C::GenMat],
        &[C::GenColVec, C::GenColVec],
        &[C::GenRowVec, C::GenRowVec],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Reshapes {
    fn name(&self) -> &'static str {
        "Reshapes"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenMat, C::NumRows, C::NumCols] => {
                let (m, rows, cols) = (tuple.matrix(0)?, tuple.count(1)?, tuple.count(2)?);
                sink.write("reshape", &reshape(m, rows, cols))?;
                sink.write("resize", &resize(m, rows, cols))?;
                sink.write("repmat", &repmat(m, rows, cols))
            }
            [C::GenMat] => {
                let m = tuple.matrix(0)?;
                sink.write("flipud", &flipud(m))?;
                sink.write("fliplr", &fliplr(m))
            }
            [C::GenMat, C::Dim] => {
                let (m, dim) = (tuple.matrix(0)?, tuple.count(1)?);
                sink.emit("vectorise", vectorise(m, dim))
            }
            [C::GenMat, C::GenMat] => {
                let (a, b) = (tuple.matrix(0)?, tuple.matrix(1)?);
                sink.emit("join_rows", join_rows(a, b))?;
                sink.emit("join_cols", join_cols(a, b))
            }
            [C::GenColVec, C::GenColVec] => {
                sink.emit("join_cols", join_cols(tuple.matrix(0)?, tuple.matrix(1)?))
            }
            [C::GenRowVec, C::GenRowVec] => {
                sink.emit("join_rows", join_rows(tuple.matrix(0)?, tuple.matrix(1)?))
            }
            other => Err(unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Reshapes;
    use crate::test_support::{has_artifact, run_into_temp};
    use fxg_input::InputClass as C;
    use fxg_io::{MatrixFileFormat, read_matrix_file};

    #[test]
    fn reshape_keeps_column_major_order() {
        let family = Reshapes::new(&[C::GenMat, C::NumRows, C::NumCols]);
        let (run, sink, root) = run_into_temp(&family, "reshape");
        assert_eq!(run.written, run.tuple_count * 3);
        let artifact = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenMatNumRowsNumCols.reshape(Hilbert2x3,3,2).txt")
            .expect("reshape artifact");
        let values = read_matrix_file(&artifact.path, MatrixFileFormat::RawAscii)
            .expect("readable")
            .values;
        let expected = [1.0, 0.5, 0.5, 1.0 / 3.0, 1.0 / 3.0, 0.25];
        assert_eq!(values, expected);
        assert!(has_artifact(&sink, "GenMatNumRowsNumCols.repmat(Eye1x1,0,4).txt"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn joins_are_guarded() {
        let family = Reshapes::new(&[C::GenMat, C::GenMat]);
        let (_, sink, root) = run_into_temp(&family, "joins");
        assert!(has_artifact(&sink, "GenMatGenMat.join_rows(Ones3x2,Eye3x3).txt"));
        assert!(!has_artifact(&sink, "GenMatGenMat.join_cols(Ones3x2,Eye3x3).txt"));
        assert!(has_artifact(&sink, "GenMatGenMat.join_cols(Ones2x3,Eye3x3).txt"));
        let _ = std::fs::remove_dir_all(&root);

        let family = Reshapes::new(&[C::GenColVec, C::GenColVec]);
        let (run, _, root) = run_into_temp(&family, "join_vecs");
        assert_eq!(run.written, run.tuple_count);
        let _ = std::fs::remove_dir_all(&root);
    }
}
