/// Header family detected from the magic pair.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PnmFormat {
    /// P1: ASCII bitmap.
    PbmAscii,
    /// P2: ASCII graymap.
    PgmAscii,
    /// P3: ASCII pixmap.
    PpmAscii,
    /// P4: binary bitmap, rows packed MSB first.
    PbmBinary,
    /// P5: binary graymap.
    PgmBinary,
    /// P6: binary pixmap.
    PpmBinary,
    /// P7: PAM, keyed header.
    Pam,
}

impl PnmFormat {
    /// Map the second magic byte (`'1'..='7'`) to a format.
    pub fn from_magic(second: u8) -> Option<Self> {
        match second {
            b'1' => Some(Self::PbmAscii),
            b'2' => Some(Self::PgmAscii),
            b'3' => Some(Self::PpmAscii),
            b'4' => Some(Self::PbmBinary),
            b'5' => Some(Self::PgmBinary),
            b'6' => Some(Self::PpmBinary),
            b'7' => Some(Self::Pam),
            _ => None,
        }
    }

    /// The second magic byte for this format.
    pub fn magic(self) -> u8 {
        match self {
            Self::PbmAscii => b'1',
            Self::PgmAscii => b'2',
            Self::PpmAscii => b'3',
            Self::PbmBinary => b'4',
            Self::PgmBinary => b'5',
            Self::PpmBinary => b'6',
            Self::Pam => b'7',
        }
    }

    /// Sample data is whitespace-separated decimal text.
    pub fn is_ascii(self) -> bool {
        matches!(self, Self::PbmAscii | Self::PgmAscii | Self::PpmAscii)
    }

    /// One bit per pixel, no maxval field.
    pub fn is_bitmap(self) -> bool {
        matches!(self, Self::PbmAscii | Self::PbmBinary)
    }
}

/// Pixel memory layout of a decoded or to-be-written raster.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Single channel, 8-bit grayscale.
    Gray8,
    /// 3 channels, 8-bit RGB.
    Rgb8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        self.channels()
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
        }
    }
}

/// How multi-channel input is normalized during decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Reduce every input to 8-bit luminance.
    #[default]
    Gray,
    /// Keep three 8-bit channels for inputs with depth >= 3.
    Rgb,
}

/// Pixel types that can view a decoded raster's buffer.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy {
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGB8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::Gray<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Gray8
    }
}
