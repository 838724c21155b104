//! Decode sessions over a single open source.
//!
//! A session owns the source, its one-byte look-ahead, and the
//! end-of-stream budget. It decodes one image per call and reports
//! whether another image follows in the same stream. The source is
//! closed exactly once: when the stream is exhausted, on the first
//! error, on [`DecodeSession::close`], or on drop.

use std::io::Cursor;

use enough::Stop;
use log::{debug, error};

use crate::error::PnmError;
use crate::limits::Limits;
use crate::pixel::ColorMode;
use crate::pnm::{self, DEFAULT_EOF_BUDGET, Tokenizer};
use crate::raster::Raster;
use crate::resolve::ConverterTable;
use crate::source::{ByteSource, Source};

/// Settings shared by every image decoded in a session.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    limits: Option<Limits>,
    converters: ConverterTable,
    eof_budget: u32,
    color: ColorMode,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self {
            limits: None,
            converters: ConverterTable::default(),
            eof_budget: DEFAULT_EOF_BUDGET,
            color: ColorMode::Gray,
        }
    }

    /// Reject images exceeding `limits` before allocating their raster.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Replace the suffix-to-converter table used by [`DecodeSession::open`].
    pub fn with_converters(mut self, converters: ConverterTable) -> Self {
        self.converters = converters;
        self
    }

    /// How many end-of-stream hits the session tolerates before failing.
    pub fn with_eof_budget(mut self, budget: u32) -> Self {
        self.eof_budget = budget;
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn limits(&self) -> Option<&Limits> {
        self.limits.as_ref()
    }

    pub fn converters(&self) -> &ConverterTable {
        &self.converters
    }

    pub fn eof_budget(&self) -> u32 {
        self.eof_budget
    }

    pub fn color(&self) -> ColorMode {
        self.color
    }
}

/// Whether the stream holds another image after the one just decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Continuation {
    /// Another header follows; call [`DecodeSession::decode_next`] again.
    MoreImages,
    /// The source has been closed.
    Finished,
}

/// One decoded image plus the continuation signal.
#[derive(Clone, Debug)]
pub struct Decoded {
    pub raster: Raster,
    pub continuation: Continuation,
}

/// A decode session over one source.
pub struct DecodeSession<S: ByteSource = Source> {
    reader: Option<Tokenizer<S>>,
    options: DecodeOptions,
    images: usize,
}

impl DecodeSession<Source> {
    /// Open `name` (`-` for standard input), through a converter when its
    /// suffix is listed in the options' table.
    pub fn open(name: &str, options: DecodeOptions) -> Result<Self, PnmError> {
        let source = Source::open(name, &options.converters)?;
        Ok(Self::from_source(source, options))
    }
}

impl<'a> DecodeSession<Cursor<&'a [u8]>> {
    /// Decode from an in-memory byte stream.
    pub fn from_bytes(data: &'a [u8], options: DecodeOptions) -> Self {
        Self::from_source(Cursor::new(data), options)
    }
}

impl<S: ByteSource> DecodeSession<S> {
    pub fn from_source(source: S, options: DecodeOptions) -> Self {
        Self {
            reader: Some(Tokenizer::new(source, options.eof_budget)),
            options,
            images: 0,
        }
    }

    /// Whether the source is still open.
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Images decoded so far.
    pub fn images_decoded(&self) -> usize {
        self.images
    }

    /// Decode the next image.
    ///
    /// On error the session is closed and further calls return
    /// [`PnmError::SessionClosed`].
    pub fn decode_next(&mut self, stop: impl Stop) -> Result<Decoded, PnmError> {
        self.decode_with(&stop)
    }

    fn decode_with(&mut self, stop: &dyn Stop) -> Result<Decoded, PnmError> {
        let Some(tok) = self.reader.as_mut() else {
            return Err(PnmError::SessionClosed);
        };
        let outcome = decode_one(tok, &self.options, stop).and_then(|raster| {
            let more = tok.another_image_follows()?;
            Ok((raster, more))
        });

        match outcome {
            Ok((raster, more)) => {
                self.images += 1;
                let continuation = if more {
                    debug!("image {} decoded, another image follows", self.images);
                    Continuation::MoreImages
                } else {
                    debug!("image {} decoded, end of stream", self.images);
                    self.teardown();
                    Continuation::Finished
                };
                Ok(Decoded {
                    raster,
                    continuation,
                })
            }
            Err(e) => {
                self.teardown();
                Err(e)
            }
        }
    }

    /// Iterate over the remaining images.
    pub fn images<T: Stop>(&mut self, stop: T) -> Images<'_, S, T> {
        Images {
            session: self,
            stop,
        }
    }

    /// Close the source now, skipping any remaining images.
    pub fn close(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(tok) = self.reader.take() {
            if let Err(e) = tok.into_inner().close() {
                error!("closing decode source: {e}");
            }
        }
    }
}

impl<S: ByteSource> Drop for DecodeSession<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn decode_one<S: ByteSource>(
    tok: &mut Tokenizer<S>,
    options: &DecodeOptions,
    stop: &dyn Stop,
) -> Result<Raster, PnmError> {
    let header = pnm::read_header(tok)?;
    pnm::decode_pixels(tok, &header, options.color, options.limits.as_ref(), stop)
}

/// Iterator over the images of a session. Stops after the last image or
/// after the first error.
pub struct Images<'s, S: ByteSource, T: Stop> {
    session: &'s mut DecodeSession<S>,
    stop: T,
}

impl<S: ByteSource, T: Stop> Iterator for Images<'_, S, T> {
    type Item = Result<Raster, PnmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.session.is_open() {
            return None;
        }
        Some(self.session.decode_with(&self.stop).map(|d| d.raster))
    }
}
