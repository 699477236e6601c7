use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_linalg::{MatrixNormOrder, VectorNormOrder, matrix_norm, vector_norm};

/// Vector p-norms and induced/Frobenius matrix norms.
#[derive(Debug, Clone, Copy)]
pub struct Norms {
    signature: &'static [C],
}

impl Norms {
    pub const SIGNATURES: [&'static [C]; 3] = [
        &[C::GenColVec, C::NormOrder],
        &[C::GenRowVec, C::NormOrder],
        &[C::GenMat, C::NormOrder],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Norms {
    fn name(&self) -> &'static str {
        "Norms"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        let (m, token) = (tuple.matrix(0)?, tuple.token(1)?);
        match self.signature {
            [C::GenColVec | C::GenRowVec, C::NormOrder] => {
                let norm = VectorNormOrder::from_token(token).and_then(|ord| vector_norm(m, ord));
                sink.emit_scalar("norm", norm)
            }
            [C::GenMat, C::NormOrder] => {
                let norm = MatrixNormOrder::from_token(token).and_then(|ord| matrix_norm(m, ord));
                sink.emit_scalar("norm", norm)
            }
            other => Err(unsupported(other)),
        }
    }
}
