use crate::error::PnmError;

/// Largest byte size of one pixel's sample group (`depth * bytes_per_sample`).
///
/// Headers that would need more are rejected before any pixel is read.
pub const MAX_SAMPLE_GROUP_BYTES: usize = 512;

/// Resource limits for decode operations.
///
/// All fields default to `None` (no limit). The signed 32-bit guard on
/// `width * height` applies regardless of these settings.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum memory bytes for output buffer allocation.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check dimensions against limits. Returns Ok(()) or LimitExceeded error.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), PnmError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(PnmError::LimitExceeded(format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(PnmError::LimitExceeded(format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(PnmError::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check that an allocation size is within memory limits.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), PnmError> {
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(PnmError::LimitExceeded(format!(
                    "allocation {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}

/// Reject dimensions whose pixel count does not fit signed 32-bit arithmetic.
///
/// Runs before the raster buffer is allocated.
pub(crate) fn check_pixel_count(width: u32, height: u32) -> Result<usize, PnmError> {
    if width == 0 || height == 0 {
        return Err(PnmError::InvalidHeader(format!(
            "zero dimension {width}x{height}"
        )));
    }
    let pixels = i64::from(width) * i64::from(height);
    if pixels > i64::from(i32::MAX) {
        return Err(PnmError::DimensionsTooLarge { width, height });
    }
    Ok(pixels as usize)
}
