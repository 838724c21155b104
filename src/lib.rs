//! # zenraster
//!
//! PNM/PAM raster ingest for OCR pipelines.
//!
//! Decodes the whole PNM family into an 8-bit grayscale (or RGB) raster,
//! reads streams holding several concatenated images, routes compressed or
//! foreign files through external converter programs, and writes rasters
//! back out as P4, P5 or P6.
//!
//! ## Supported Formats
//!
//! - **P1/P4** (PBM) ASCII and binary bitmaps, decoded as 0 (black) and 255 (white)
//! - **P2/P5** (PGM) ASCII and binary graymaps, maxval up to 32 bits
//! - **P3/P6** (PPM) ASCII and binary pixmaps, reduced to luminance or kept as RGB
//! - **P7** (PAM) keyed headers with arbitrary DEPTH
//!
//! Anything else is handed to a converter picked by file suffix
//! (`gzip -cd`, `djpeg`, `pngtopnm`, ...). See [`ConverterTable`].
//!
//! ## Credits
//!
//! The PNM header handling draws from [zune-ppm](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).
//!
//! ## Usage
//!
//! ```no_run
//! use zenraster::{Continuation, DecodeOptions, DecodeSession, Unstoppable};
//!
//! let data: &[u8] = b"P5\n2 1\n255\n\x00\xff";
//!
//! // Probe without decoding
//! let info = zenraster::probe_header(data)?;
//! println!("{}x{} {:?}", info.width, info.height, info.format);
//!
//! // Decode every image in a file, through gzip when needed
//! let mut session = DecodeSession::open("scans.pgm.gz", DecodeOptions::default())?;
//! loop {
//!     let decoded = session.decode_next(Unstoppable)?;
//!     println!("{}x{}", decoded.raster.width, decoded.raster.height);
//!     if decoded.continuation == Continuation::Finished {
//!         break;
//!     }
//! }
//!
//! // Write a P5
//! let raster = zenraster::decode(data, Unstoppable)?;
//! let pgm = zenraster::encode_pgm(&raster, Unstoppable)?;
//! # Ok::<(), zenraster::PnmError>(())
//! ```

#![forbid(unsafe_code)]

mod error;
mod limits;
mod pixel;
mod raster;
mod resolve;
mod session;
mod source;

pub mod pnm;

pub use enough::{Stop, Unstoppable};
pub use error::PnmError;
pub use limits::{Limits, MAX_SAMPLE_GROUP_BYTES};
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::{ColorMode, PixelLayout, PnmFormat};
pub use pnm::{
    DEFAULT_EOF_BUDGET, ImageInfo, PpmOptions, WriteSummary, encode_pbm, encode_pgm, encode_ppm,
    save_pbm, save_pgm, save_ppm, write_pbm, write_pgm, write_ppm,
};
pub use raster::Raster;
pub use resolve::{Converter, ConverterTable};
pub use session::{Continuation, DecodeOptions, DecodeSession, Decoded, Images};
pub use source::{ByteSource, STDIN_NAME, Source};

/// Parse the header of the first image in `data` without reading pixels.
pub fn probe_header(data: &[u8]) -> Result<ImageInfo, PnmError> {
    ImageInfo::from_bytes(data)
}

/// Decode the first image in `data` with default options.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<Raster, PnmError> {
    DecodeSession::from_bytes(data, DecodeOptions::default())
        .decode_next(stop)
        .map(|d| d.raster)
}

/// Decode the first image of the file `name` (`-` for stdin), running a
/// converter when its suffix calls for one. Remaining images are skipped.
pub fn decode_file(name: &str, stop: impl Stop) -> Result<Raster, PnmError> {
    DecodeSession::open(name, DecodeOptions::default())?
        .decode_next(stop)
        .map(|d| d.raster)
}
