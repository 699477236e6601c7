use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_layout::{
    at, at_linear, col, cols, row, rows, shed_col, shed_cols, shed_row, shed_rows, submat, subvec,
    swap_cols, swap_rows,
};

/// Element, row, column and span access, plus shedding and swapping. Every op is range-checked.
#[derive(Debug, Clone, Copy)]
pub struct Access {
    signature: &'static [C],
}

impl Access {
    pub const SIGNATURES: [&'static [C]; 9] = [
        &[C::GenMat, C::ElemInd],
        &[C::GenMat, C::RowInd, C::ColInd],
        &[C::GenMat, C::RowInd],
        &[C::GenMat, C::ColInd],
        &[C::GenMat, C::Span],
        &[C::GenMat, C::Span, C::Span],
        &[C::GenColVec, C::Span],
        &[C::GenMat, C::RowInd, C::RowInd],
        &[C::GenMat, C::ColInd, C::ColInd],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Access {
    fn name(&self) -> &'static str {
        "Access"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        let m = tuple.matrix(0)?;
        match self.signature {
            [C::GenMat, C::ElemInd] => sink.emit_scalar("at", at_linear(m, tuple.index(1)?)),
            [C::GenMat, C::RowInd, C::ColInd] => {
                sink.emit_scalar("at", at(m, tuple.index(1)?, tuple.index(2)?))
            }
            [C::GenMat, C::RowInd] => {
                let i = tuple.index(1)?;
                sink.emit("row", row(m, i))?;
                sink.emit("shed_row", shed_row(m, i))
            }
            [C::GenMat, C::ColInd] => {
                let j = tuple.index(1)?;
                sink.emit("col", col(m, j))?;
                sink.emit("shed_col", shed_col(m, j))
            }
            [C::GenMat, C::Span] => {
                let span = tuple.span(1)?;
                sink.emit("rows", rows(m, span))?;
                sink.emit("cols", cols(m, span))?;
                sink.emit("shed_rows", shed_rows(m, span))?;
                sink.emit("shed_cols", shed_cols(m, span))
            }
            [C::GenMat, C::Span, C::Span] => {
                sink.emit("submat", submat(m, tuple.span(1)?, tuple.span(2)?))
            }
            [C::GenColVec, C::Span] => sink.emit("subvec", subvec(m, tuple.span(1)?)),
            [C::GenMat, C::RowInd, C::RowInd] => {
                sink.emit("swap_rows", swap_rows(m, tuple.index(1)?, tuple.index(2)?))
            }
            [C::GenMat, C::ColInd, C::ColInd] => {
                sink.emit("swap_cols", swap_cols(m, tuple.index(1)?, tuple.index(2)?))
            }
            other => Err(unsupported(other)),
        }
    }
}
