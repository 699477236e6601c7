use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_ufunc::{
    CumulativeOp, ReduceOp, cumulative_along, cumulative_vec, index_max, index_min, reduce_all,
    reduce_along,
};

const CUMULATIVE: [CumulativeOp; 2] = [CumulativeOp::Sum, CumulativeOp::Prod];

fn plain_reductions() -> impl Iterator<Item = ReduceOp> {
    ReduceOp::ALL.into_iter().filter(|op| !op.takes_norm_type())
}

fn normed_reductions() -> impl Iterator<Item = ReduceOp> {
    ReduceOp::ALL.into_iter().filter(|op| op.takes_norm_type())
}

/// Reductions, extreme indices and running sums/products.
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
    signature: &'static [C],
}

impl Statistics {
    pub const SIGNATURES: [&'static [C]; 6] = [
        &[C::GenColVec],
        &[C::GenRowVec],
        &[C::GenMat, C::Dim],
        &[C::GenColVec, C::NormType],
        &[C::GenMat, C::NormType, C::Dim],
        &[C::GenMat],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Statistics {
    fn name(&self) -> &'static str {
        "Statistics"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenColVec] | [C::GenRowVec] => {
                let v = tuple.matrix(0)?;
                for op in plain_reductions() {
                    sink.emit_scalar(op.token(), reduce_all(v, op, 0))?;
                }
                sink.emit_scalar("index_min", index_min(v).map(|i| i as f64))?;
                sink.emit_scalar("index_max", index_max(v).map(|i| i as f64))?;
                for op in CUMULATIVE {
                    sink.emit(op.token(), cumulative_vec(v, op))?;
                }
                Ok(())
            }
            [C::GenMat, C::Dim] => {
                let (m, dim) = (tuple.matrix(0)?, tuple.count(1)?);
                for op in plain_reductions() {
                    sink.emit(op.token(), reduce_along(m, op, 0, dim))?;
                }
                for op in CUMULATIVE {
                    sink.emit(op.token(), cumulative_along(m, op, dim))?;
                }
                Ok(())
            }
            [C::GenColVec, C::NormType] => {
                let (v, norm_type) = (tuple.matrix(0)?, tuple.count(1)?);
                for op in normed_reductions() {
                    sink.emit_scalar(op.token(), reduce_all(v, op, norm_type))?;
                }
                Ok(())
            }
            [C::GenMat, C::NormType, C::Dim] => {
                let (m, norm_type, dim) = (tuple.matrix(0)?, tuple.count(1)?, tuple.count(2)?);
                for op in normed_reductions() {
                    sink.emit(op.token(), reduce_along(m, op, norm_type, dim))?;
                }
                Ok(())
            }
            [C::GenMat] => {
                let m = tuple.matrix(0)?;
                sink.emit_scalar("accu", reduce_all(m, ReduceOp::Sum, 0))
            }
            other => Err(unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;
    use crate::test_support::{has_artifact, run_into_temp};
    use fxg_input::InputClass as C;
    use fxg_io::{MatrixFileFormat, read_matrix_file};

    #[test]
    fn vector_reductions_skip_nan_sensitive_ops() {
        let family = Statistics::new(&[C::GenColVec]);
        let (run, sink, root) = run_into_temp(&family, "stats_vec");
        assert!(has_artifact(&sink, "GenColVec.median(Random4).txt"));
        assert!(has_artifact(&sink, "GenColVec.cumprod(Hilbert3).txt"));
        // Special vectors of length 3+ hold a NaN.
        assert!(!has_artifact(&sink, "GenColVec.median(Special3).txt"));
        assert!(has_artifact(&sink, "GenColVec.median(Special2).txt"));
        assert!(run.skipped > 0);

        let index = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenColVec.index_max(Eye4).txt")
            .expect("index_max artifact");
        let values = read_matrix_file(&index.path, MatrixFileFormat::RawAscii)
            .expect("readable")
            .values;
        assert_eq!(values, vec![0.0]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn reductions_along_dim_shape_their_output() {
        let family = Statistics::new(&[C::GenMat, C::Dim]);
        let (_, sink, root) = run_into_temp(&family, "stats_dim");
        let by_cols = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenMatDim.sum(Ones2x3,0).txt")
            .expect("dim 0 sum");
        assert_eq!((by_cols.rows, by_cols.cols), (1, 3));
        let by_rows = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenMatDim.cumsum(Ones2x3,1).txt")
            .expect("dim 1 cumsum");
        assert_eq!((by_rows.rows, by_rows.cols), (2, 3));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn norm_type_selects_the_divisor() {
        let family = Statistics::new(&[C::GenColVec, C::NormType]);
        let (_, sink, root) = run_into_temp(&family, "stats_norm_type");
        let read = |file: &str| {
            let artifact = sink
                .artifacts()
                .iter()
                .find(|a| a.file == file)
                .expect("var artifact");
            read_matrix_file(&artifact.path, MatrixFileFormat::RawAscii)
                .expect("readable")
                .values[0]
        };
        // Eye2 = [1, 0]: squared deviations sum to 0.5.
        assert_eq!(read("GenColVecNormType.var(Eye2,0).txt"), 0.5);
        assert_eq!(read("GenColVecNormType.var(Eye2,1).txt"), 0.25);
        let _ = std::fs::remove_dir_all(&root);
    }
}
