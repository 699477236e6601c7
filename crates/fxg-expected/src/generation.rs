use crate::{ExpectedError, ExpectedFamily, ExpectedSink, GUARD_NON_FINITE_INPUT, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_layout::{eye, linspace, ones, zeros};

/// Constructors: filled matrices and evenly spaced vectors.
#[derive(Debug, Clone, Copy)]
pub struct Generation {
    signature: &'static [C],
}

impl Generation {
    pub const SIGNATURES: [&'static [C]; 2] =
        [&[C::NumRows, C::NumCols], &[C::Scalar, C::Scalar, C::NumElems]];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Generation {
    fn name(&self) -> &'static str {
        "Generation"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::NumRows, C::NumCols] => {
                let (rows, cols) = (tuple.count(0)?, tuple.count(1)?);
                sink.write("zeros", &zeros(rows, cols))?;
                sink.write("ones", &ones(rows, cols))?;
                sink.write("eye", &eye(rows, cols))
            }
            [C::Scalar, C::Scalar, C::NumElems] => {
                let (start, end, n) = (tuple.scalar(0)?, tuple.scalar(1)?, tuple.count(2)?);
                if !start.is_finite() || !end.is_finite() {
                    return sink.skip("linspace", GUARD_NON_FINITE_INPUT);
                }
                sink.emit("linspace", linspace(start, end, n))
            }
            other => Err(unsupported(other)),
        }
    }
}
