use crate::{ExpectedError, ExpectedFamily, ExpectedSink, GUARD_SHAPE_MISMATCH, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_layout::{Matrix, diagvec, scalar, trimatl, trimatu};
use fxg_linalg::{
    LinAlgError, chol, det, eig_sym, inv, inv_sympd, log_det, lu, pinv, qr_econ, rank, solve,
    svd, svd_econ, trace,
};

/// Factorizations, inverses and solves delegated to the linear-algebra backend.
#[derive(Debug, Clone, Copy)]
pub struct Decompositions {
    signature: &'static [C],
}

impl Decompositions {
    pub const SIGNATURES: [&'static [C]; 5] = [
        &[C::GenMat],
        &[C::SquareMat],
        &[C::SymPdMat],
        &[C::InvMat, C::GenColVec],
        &[C::InvMat, C::GenMat],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

fn general(m: &Matrix, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
    sink.write("trans", &m.transpose())?;
    sink.emit_parts(
        &["qr_econ.Q", "qr_econ.R"],
        qr_econ(m).map(|f| vec![f.q, f.r]),
    )?;
    sink.emit("svd", svd(m))?;
    sink.emit_parts(
        &["svd_econ.U", "svd_econ.s", "svd_econ.V"],
        svd_econ(m).map(|f| vec![f.u, f.s, f.v]),
    )?;
    sink.emit("pinv", pinv(m))?;
    sink.emit_scalar("rank", rank(m).map(|r| r as f64))
}

fn square(m: &Matrix, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
    sink.emit_scalar("det", det(m))?;
    sink.emit_parts(
        &["log_det.value", "log_det.sign"],
        log_det(m).map(|(value, sign)| vec![scalar(value), scalar(sign)]),
    )?;
    match inv(m) {
        Ok(inverse) => sink.write("inv", &inverse)?,
        Err(err @ LinAlgError::SolverSingularity) => sink.suppressed("inv", err.reason_code())?,
        Err(err) => sink.skip("inv", err.reason_code())?,
    }
    sink.write_scalar("trace", trace(m))?;
    sink.emit("diagvec", diagvec(m, 0))?;
    sink.emit_parts(
        &["lu.L", "lu.U", "lu.P"],
        lu(m).map(|f| vec![f.l, f.u, f.p]),
    )?;
    sink.emit("trimatu", trimatu(m))?;
    sink.emit("trimatl", trimatl(m))
}

fn symmetric_pd(m: &Matrix, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
    sink.emit("chol", chol(m))?;
    sink.emit_parts(
        &["eig_sym.values", "eig_sym.vectors"],
        eig_sym(m).map(|f| vec![f.values, f.vectors]),
    )?;
    sink.emit("inv_sympd", inv_sympd(m))
}

fn solve_system(a: &Matrix, b: &Matrix, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
    if a.nrows() != b.nrows() {
        return sink.skip("solve", GUARD_SHAPE_MISMATCH);
    }
    sink.emit_or_suppress("solve", solve(a, b))
}

impl ExpectedFamily for Decompositions {
    fn name(&self) -> &'static str {
        "Decompositions"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenMat] => general(tuple.matrix(0)?, sink),
            [C::SquareMat] => square(tuple.matrix(0)?, sink),
            [C::SymPdMat] => symmetric_pd(tuple.matrix(0)?, sink),
            [C::InvMat, C::GenColVec | C::GenMat] => {
                solve_system(tuple.matrix(0)?, tuple.matrix(1)?, sink)
            }
            other => Err(unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Decompositions;
    use crate::test_support::{has_artifact, run_into_temp};
    use fxg_input::InputClass as C;
    use fxg_io::{MatrixFileFormat, read_matrix_file};
    use fxg_runtime::CaseOutcome;

    #[test]
    fn general_matrices_decompose_unless_non_finite() {
        let family = Decompositions::new(&[C::GenMat]);
        let (_, sink, root) = run_into_temp(&family, "decomp_general");
        assert!(has_artifact(&sink, "GenMat.qr_econ.Q(Random3x2).txt"));
        assert!(has_artifact(&sink, "GenMat.svd_econ.V(Hilbert2x3).txt"));
        assert!(has_artifact(&sink, "GenMat.trans(Special2x3).txt"));
        assert!(!has_artifact(&sink, "GenMat.pinv(Special2x3).txt"));

        let rank = sink
            .artifacts()
            .iter()
            .find(|a| a.file == "GenMat.rank(Ones4x4).txt")
            .expect("rank artifact");
        let values = read_matrix_file(&rank.path, MatrixFileFormat::RawAscii)
            .expect("readable")
            .values;
        assert_eq!(values, vec![1.0]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn singular_inverse_is_suppressed() {
        let family = Decompositions::new(&[C::SquareMat]);
        let (run, sink, root) = run_into_temp(&family, "decomp_square");
        assert!(run.suppressed > 0);
        assert!(!has_artifact(&sink, "SquareMat.inv(Zeros3x3).txt"));
        assert!(has_artifact(&sink, "SquareMat.inv(Eye3x3).txt"));
        assert!(has_artifact(&sink, "SquareMat.lu.P(Random4x4).txt"));
        assert!(has_artifact(&sink, "SquareMat.det(Zeros3x3).txt"));
        let inv_zero = sink
            .ledger()
            .events()
            .iter()
            .find(|e| e.op == "inv" && e.suffix == "(Zeros3x3)")
            .expect("inv event");
        assert_eq!(inv_zero.outcome, CaseOutcome::Suppressed);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn spd_and_solve_families() {
        let family = Decompositions::new(&[C::SymPdMat]);
        let (run, _, root) = run_into_temp(&family, "decomp_spd");
        assert_eq!(run.written, run.tuple_count * 4);
        let _ = std::fs::remove_dir_all(&root);

        let family = Decompositions::new(&[C::InvMat, C::GenColVec]);
        let (run, sink, root) = run_into_temp(&family, "decomp_solve");
        assert!(has_artifact(&sink, "InvMatGenColVec.solve(DiagDominant3x3,Random3).txt"));
        assert!(!has_artifact(&sink, "InvMatGenColVec.solve(DiagDominant3x3,Random4).txt"));
        assert!(run.skipped > 0);
        let _ = std::fs::remove_dir_all(&root);
    }
}
