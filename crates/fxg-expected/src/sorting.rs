use crate::{ExpectedError, ExpectedFamily, ExpectedSink, unsupported};
use fxg_input::{InputClass as C, TestTuple};
use fxg_ufunc::{SortDirection, sort_along, sort_index, sort_vec, stable_sort_index, unique};

#[derive(Debug, Clone, Copy)]
pub struct Sorting {
    signature: &'static [C],
}

impl Sorting {
    pub const SIGNATURES: [&'static [C]; 4] = [
        &[C::GenColVec, C::SortDirection],
        &[C::GenRowVec, C::SortDirection],
        &[C::GenMat, C::SortDirection, C::Dim],
        &[C::GenColVec],
    ];

    #[must_use]
    pub const fn new(signature: &'static [C]) -> Self {
        Self { signature }
    }
}

impl ExpectedFamily for Sorting {
    fn name(&self) -> &'static str {
        "Sorting"
    }

    fn signature(&self) -> &'static [C] {
        self.signature
    }

    fn expect(&self, tuple: &TestTuple<'_>, sink: &mut ExpectedSink) -> Result<(), ExpectedError> {
        match self.signature {
            [C::GenColVec | C::GenRowVec, C::SortDirection] => {
                let v = tuple.matrix(0)?;
                let direction = match SortDirection::from_token(tuple.token(1)?) {
                    Ok(direction) => direction,
                    Err(err) => {
                        for op in ["sort", "sort_index", "stable_sort_index"] {
                            sink.skip(op, err.reason_code())?;
                        }
                        return Ok(());
                    }
                };
                sink.emit("sort", sort_vec(v, direction))?;
                sink.emit("sort_index", sort_index(v, direction))?;
                sink.emit("stable_sort_index", stable_sort_index(v, direction))
            }
            [C::GenMat, C::SortDirection, C::Dim] => {
                let (m, dim) = (tuple.matrix(0)?, tuple.count(2)?);
                let sorted = SortDirection::from_token(tuple.token(1)?)
                    .and_then(|direction| sort_along(m, direction, dim));
                sink.emit("sort", sorted)
            }
            [C::GenColVec] => sink.emit("unique", unique(tuple.matrix(0)?)),
            other => Err(unsupported(other)),
        }
    }
}
