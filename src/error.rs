use std::io;
use std::path::PathBuf;

use enough::StopReason;

/// Errors from PNM/PAM decoding, external conversion, and raster output.
///
/// Every variant is fatal for the operation that produced it. A decode
/// session that returns one of these has already released its source.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PnmError {
    #[error("bad magic bytes, expected 0x50 0x31..0x37 but got {first:#04x} {second:#04x}")]
    UnrecognizedFormat { first: u8, second: u8 },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("integer overflow while reading {0}")]
    IntegerOverflow(&'static str),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("sample group too large: depth {depth} x {bytes_per_sample} bytes per sample")]
    SampleGroupTooLarge { depth: u32, bytes_per_sample: usize },

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("opening file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("spawning converter `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("writing row {row}")]
    Write {
        row: u32,
        #[source]
        source: io::Error,
    },

    #[error("writing image header")]
    WriteHeader(#[source] io::Error),

    #[error("flushing output")]
    Flush(#[source] io::Error),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("decode session already closed")]
    SessionClosed,

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for PnmError {
    fn from(r: StopReason) -> Self {
        PnmError::Cancelled(r)
    }
}

/// Map a short read onto [`PnmError::UnexpectedEof`], keeping other I/O errors.
pub(crate) fn read_error(e: io::Error) -> PnmError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        PnmError::UnexpectedEof
    } else {
        PnmError::Io(e)
    }
}
