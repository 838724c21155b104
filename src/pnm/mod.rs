//! PNM family: P1..P6 fixed-field headers and the keyed P7 (PAM) header.
//!
//! Credits: header handling draws from [zune-ppm](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).

mod decode;
mod encode;
mod header;
mod tokenizer;

pub use encode::{
    PpmOptions, WriteSummary, encode_pbm, encode_pgm, encode_ppm, save_pbm, save_pgm, save_ppm,
    write_pbm, write_pgm, write_ppm,
};
pub use tokenizer::DEFAULT_EOF_BUDGET;

pub(crate) use decode::decode_pixels;
pub(crate) use header::{PnmHeader, read_header};
pub(crate) use tokenizer::Tokenizer;

use std::io::Cursor;

use crate::error::PnmError;
use crate::pixel::PnmFormat;

/// Header summary of the first image in a byte stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: PnmFormat,
    pub width: u32,
    pub height: u32,
    /// Channels per pixel as declared (1 for PBM/PGM, 3 for PPM, DEPTH for PAM).
    pub depth: u32,
    pub maxval: u32,
    /// PAM tuple type, informational only.
    pub tuple_type: Option<String>,
}

impl From<PnmHeader> for ImageInfo {
    fn from(h: PnmHeader) -> Self {
        Self {
            format: h.format,
            width: h.width,
            height: h.height,
            depth: h.depth,
            maxval: h.maxval,
            tuple_type: h.tuple_type,
        }
    }
}

impl ImageInfo {
    /// Parse only the header of `data`; no pixels are read.
    pub fn from_bytes(data: &[u8]) -> Result<Self, PnmError> {
        let mut tok = Tokenizer::new(Cursor::new(data), DEFAULT_EOF_BUDGET);
        read_header(&mut tok).map(Self::from)
    }
}
