use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_ufunc::{hist, histc};

#[derive(Debug, Clone, Copy)]
pub struct Histograms {
    signature: &'static [C],
}

impl Histograms {
    pub const SIGNATURES: [&'static [C]; 3] = [
        &[C::GenColVec, C::NumBins],
        &[C::GenRowVec, C::NumBins],
        &[C::GenColVec, C::MonColVec],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Histograms {
    fn name(&self) -> &'static str {
        "Histograms"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        let v = tuple.matrix(0)?;
        match self.signature {
            [C::GenColVec | C::GenRowVec, C::NumBins] => {
                sink.emit("hist", hist(v, tuple.count(1)?))
            }
            [C::GenColVec, C::MonColVec] => sink.emit("histc", histc(v, tuple.matrix(1)?)),
            other => Err(unsupported(other)),
        }
    }
}
