#![forbid(unsafe_code)]

use core::fmt;
use std::fs;
use std::path::Path;

pub const ARMA_ASCII_HEADER: &str = "ARMA_MAT_TXT_FN008";

pub const IO_REASON_CODES: [&str; 5] = [
    "io_header_invalid",
    "io_payload_incomplete",
    "io_write_contract_violation",
    "io_filesystem_failure",
    "io_format_unknown",
];

/// On-disk layout of a flat numeric matrix file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFileFormat {
    /// Whitespace separated rows, no header. Empty matrices round-trip as 0x0.
    RawAscii,
    /// `ARMA_MAT_TXT_FN008` header followed by `<rows> <cols>` and the rows.
    ArmaAscii,
}

impl MatrixFileFormat {
    pub fn from_token(token: &str) -> Result<Self, IOError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "raw_ascii" | "raw" | "txt" => Ok(Self::RawAscii),
            "arma_ascii" | "arma" | "mat" => Ok(Self::ArmaAscii),
            _ => Err(IOError::FormatUnknown(
                "matrix format must be one of raw_ascii|arma_ascii",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RawAscii => "raw_ascii",
            Self::ArmaAscii => "arma_ascii",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::RawAscii => "txt",
            Self::ArmaAscii => "mat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IOError {
    HeaderInvalid(&'static str),
    PayloadIncomplete(&'static str),
    WriteContractViolation(&'static str),
    FileSystem(String),
    FormatUnknown(&'static str),
}

impl IOError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::HeaderInvalid(_) => "io_header_invalid",
            Self::PayloadIncomplete(_) => "io_payload_incomplete",
            Self::WriteContractViolation(_) => "io_write_contract_violation",
            Self::FileSystem(_) => "io_filesystem_failure",
            Self::FormatUnknown(_) => "io_format_unknown",
        }
    }
}

impl fmt::Display for IOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderInvalid(msg)
            | Self::PayloadIncomplete(msg)
            | Self::WriteContractViolation(msg)
            | Self::FormatUnknown(msg) => write!(f, "{msg}"),
            Self::FileSystem(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IOError {}

/// Dense matrix payload in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatrix {
    pub nrows: usize,
    pub ncols: usize,
    /// Column-major values, `nrows * ncols` long.
    pub values: Vec<f64>,
}

impl TextMatrix {
    pub fn new(nrows: usize, ncols: usize, values: Vec<f64>) -> Result<Self, IOError> {
        let expected = nrows
            .checked_mul(ncols)
            .ok_or(IOError::WriteContractViolation("matrix element count overflowed"))?;
        if values.len() != expected {
            return Err(IOError::WriteContractViolation(
                "values length != nrows * ncols",
            ));
        }
        Ok(Self {
            nrows,
            ncols,
            values,
        })
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.nrows || col >= self.ncols {
            return None;
        }
        self.values.get(col * self.nrows + row).copied()
    }
}

#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{value:e}")
    }
}

pub fn parse_value(token: &str) -> Result<f64, IOError> {
    let trimmed = token.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" | "+nan" | "-nan" => return Ok(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => return Ok(f64::INFINITY),
        "-inf" | "-infinity" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| IOError::PayloadIncomplete("matrix payload contains a non-numeric token"))
}

/// Render a matrix into the text layout of `format`.
pub fn save_matrix_text(matrix: &TextMatrix, format: MatrixFileFormat) -> Result<String, IOError> {
    if matrix.values.len() != matrix.nrows * matrix.ncols {
        return Err(IOError::WriteContractViolation(
            "values length != nrows * ncols",
        ));
    }

    let mut output = String::new();
    if format == MatrixFileFormat::ArmaAscii {
        output.push_str(ARMA_ASCII_HEADER);
        output.push('\n');
        output.push_str(&format!("{} {}\n", matrix.nrows, matrix.ncols));
    }

    for r in 0..matrix.nrows {
        for c in 0..matrix.ncols {
            if c > 0 {
                output.push(' ');
            }
            output.push_str(&format_value(matrix.values[c * matrix.nrows + r]));
        }
        output.push('\n');
    }
    Ok(output)
}

/// Parse the text layout of `format` back into a column-major matrix.
pub fn load_matrix_text(text: &str, format: MatrixFileFormat) -> Result<TextMatrix, IOError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let declared = match format {
        MatrixFileFormat::RawAscii => None,
        MatrixFileFormat::ArmaAscii => {
            let magic = lines
                .next()
                .ok_or(IOError::HeaderInvalid("missing ARMA_MAT_TXT header"))?;
            if magic.trim() != ARMA_ASCII_HEADER {
                return Err(IOError::HeaderInvalid("unexpected header magic"));
            }
            let dims = lines
                .next()
                .ok_or(IOError::HeaderInvalid("missing dimension line"))?;
            let parsed: Vec<usize> = dims
                .split_whitespace()
                .map(str::parse::<usize>)
                .collect::<Result<_, _>>()
                .map_err(|_| IOError::HeaderInvalid("dimension line is not two integers"))?;
            let &[nrows, ncols] = parsed.as_slice() else {
                return Err(IOError::HeaderInvalid("dimension line is not two integers"));
            };
            Some((nrows, ncols))
        }
    };

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for line in lines {
        let row = line
            .split_whitespace()
            .map(parse_value)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(first) = rows.first()
            && first.len() != row.len()
        {
            return Err(IOError::PayloadIncomplete(
                "inconsistent number of columns",
            ));
        }
        rows.push(row);
    }

    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);

    let (nrows, ncols) = match declared {
        Some((d_rows, d_cols)) if d_rows == 0 || d_cols == 0 => {
            if nrows != 0 {
                return Err(IOError::PayloadIncomplete(
                    "empty matrix header followed by payload rows",
                ));
            }
            (d_rows, d_cols)
        }
        Some((d_rows, d_cols)) => {
            if d_rows != nrows || d_cols != ncols {
                return Err(IOError::PayloadIncomplete(
                    "payload shape disagrees with header",
                ));
            }
            (d_rows, d_cols)
        }
        None => (nrows, ncols),
    };

    let mut values = vec![0.0; nrows * ncols];
    for (r, row) in rows.iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            values[c * nrows + r] = value;
        }
    }

    Ok(TextMatrix {
        nrows,
        ncols,
        values,
    })
}

pub fn write_matrix_file(
    path: &Path,
    matrix: &TextMatrix,
    format: MatrixFileFormat,
) -> Result<(), IOError> {
    let text = save_matrix_text(matrix, format)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            IOError::FileSystem(format!("failed creating {}: {err}", parent.display()))
        })?;
    }
    fs::write(path, text)
        .map_err(|err| IOError::FileSystem(format!("failed writing {}: {err}", path.display())))
}

pub fn read_matrix_file(path: &Path, format: MatrixFileFormat) -> Result<TextMatrix, IOError> {
    let text = fs::read_to_string(path)
        .map_err(|err| IOError::FileSystem(format!("failed reading {}: {err}", path.display())))?;
    load_matrix_text(&text, format)
}
