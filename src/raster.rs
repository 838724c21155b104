#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::error::PnmError;
use crate::pixel::PixelLayout;

/// A decoded image: row-major 8-bit samples, `width * height * channels` long.
///
/// The buffer length always matches the declared dimensions; a raster is
/// never handed out partially filled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

impl Raster {
    /// Wrap an existing buffer, checking its length against the dimensions.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<Self, PnmError> {
        let needed = expected_len(width, height, layout)?;
        if pixels.len() != needed {
            return Err(PnmError::BufferTooSmall {
                needed,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            layout,
        })
    }

    pub(crate) fn from_parts(pixels: Vec<u8>, width: u32, height: u32, layout: PixelLayout) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * layout.channels()
        );
        Self {
            pixels,
            width,
            height,
            layout,
        }
    }

    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access for in-place processing by the caller.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Take ownership of the pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// One row of samples.
    ///
    /// # Panics
    ///
    /// Panics if `y >= self.height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * self.channels();
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }

    /// Smallest and largest sample value.
    pub fn min_max(&self) -> (u8, u8) {
        self.pixels
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Grayscale copy with RGB collapsed as `(r + g + b) / 3`.
    ///
    /// Grayscale rasters are cloned unchanged. `self` is never modified.
    pub fn to_gray_average(&self) -> Raster {
        match self.layout {
            PixelLayout::Gray8 => self.clone(),
            PixelLayout::Rgb8 => {
                let pixels = self
                    .pixels
                    .chunks_exact(3)
                    .map(|p| ((p[0] as u16 + p[1] as u16 + p[2] as u16) / 3) as u8)
                    .collect();
                Raster::from_parts(pixels, self.width, self.height, PixelLayout::Gray8)
            }
        }
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`PnmError::InvalidData`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], PnmError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if self.layout != P::layout() {
            return Err(PnmError::InvalidData(format!(
                "raster is {:?}, requested {:?}",
                self.layout,
                P::layout()
            )));
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, PnmError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }
}

pub(crate) fn expected_len(width: u32, height: u32, layout: PixelLayout) -> Result<usize, PnmError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|wh| wh.checked_mul(layout.channels()))
        .ok_or(PnmError::DimensionsTooLarge { width, height })
}
