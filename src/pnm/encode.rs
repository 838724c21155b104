//! Raster writers: P4 (PBM), P5 (PGM), P6 (PPM).
//!
//! Each writer emits a minimal text header followed by raw rows. PBM and
//! PGM stop at the first failed row; PPM keeps going best-effort and
//! reports how many rows made it out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use enough::Stop;
use log::error;

use crate::error::PnmError;
use crate::pixel::PixelLayout;
use crate::raster::Raster;

/// Options for the PPM writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PpmOptions {
    /// Tint grayscale pixels by their four low-order marker bits.
    pub marker_overlay: bool,
}

/// Rows delivered by a best-effort write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows_written: u32,
    pub rows_total: u32,
}

impl WriteSummary {
    pub fn is_complete(&self) -> bool {
        self.rows_written == self.rows_total
    }
}

fn gray_value(raster: &Raster, i: usize) -> u8 {
    let px = raster.pixels();
    match raster.layout {
        PixelLayout::Gray8 => px[i],
        PixelLayout::Rgb8 => {
            let off = i * 3;
            ((px[off] as u16 + px[off + 1] as u16 + px[off + 2] as u16) / 3) as u8
        }
    }
}

/// Write a P4 bitmap: samples above 127 are white, the rest black.
pub fn write_pbm<W: Write>(out: &mut W, raster: &Raster, stop: impl Stop) -> Result<(), PnmError> {
    let (width, height) = (raster.width, raster.height);
    let w = width as usize;
    write!(out, "P4\n{width} {height}\n").map_err(PnmError::WriteHeader)?;

    let mut row = vec![0u8; w.div_ceil(8)];
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        row.fill(0);
        let base = y as usize * w;
        for x in 0..w {
            if gray_value(raster, base + x) <= 127 {
                row[x >> 3] |= 0x80 >> (x & 7);
            }
        }
        out.write_all(&row)
            .map_err(|source| PnmError::Write { row: y, source })?;
    }
    Ok(())
}

/// Write a P5 graymap. RGB input is averaged into a new buffer first.
pub fn write_pgm<W: Write>(out: &mut W, raster: &Raster, stop: impl Stop) -> Result<(), PnmError> {
    let (width, height) = (raster.width, raster.height);
    write!(out, "P5\n{width} {height}\n255\n").map_err(PnmError::WriteHeader)?;

    let averaged;
    let gray = match raster.layout {
        PixelLayout::Gray8 => raster,
        PixelLayout::Rgb8 => {
            averaged = raster.to_gray_average();
            &averaged
        }
    };
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        out.write_all(gray.row(y))
            .map_err(|source| PnmError::Write { row: y, source })?;
    }
    Ok(())
}

/// Contrast remap applied before tinting: dark values halve, bright values lift.
fn overlay_base(gray: u8) -> u8 {
    if gray < 160 {
        (gray & !0x0F) >> 1
    } else {
        0xC3 | (gray >> 1)
    }
}

/// Nudge a pixel toward a color, clamped to 0..=255.
///
/// Dark pixels get twice the tint added; bright pixels (sum >= 3 * 160)
/// instead lose the other two components.
fn tint(rgb: &mut [u8; 3], r: i32, g: i32, b: i32) {
    let sum: i32 = rgb.iter().map(|&c| i32::from(c)).sum();
    let add = if sum >= 3 * 160 {
        [-(g + b), -(r + b), -(r + g)]
    } else {
        [2 * r, 2 * g, 2 * b]
    };
    for (c, a) in rgb.iter_mut().zip(add) {
        *c = (i32::from(*c) + a).clamp(0, 255) as u8;
    }
}

/// Color one grayscale sample by its marker bits.
pub(crate) fn overlay_pixel(gray: u8, x: u32, y: u32) -> [u8; 3] {
    let bits = gray & 0x0F;
    let base = overlay_base(gray);
    let mut rgb = [base; 3];
    if bits & 1 == 1 {
        let checker = ((x + y) & 1) as i32;
        tint(&mut rgb, 0, 0, 8 + 8 * checker); // dark blue
    }
    if bits & 8 == 8 {
        tint(&mut rgb, 0, 0, 16);
    }
    match bits & 6 {
        6 => tint(&mut rgb, 0, 0, 32),
        4 => tint(&mut rgb, 0, 48, 0),
        2 => tint(&mut rgb, 32, 0, 0),
        _ => {}
    }
    rgb
}

/// Write a P6 pixmap.
///
/// Grayscale input is expanded to RGB, optionally with the marker overlay.
/// A failed row is logged and ends the write; the summary says how far it got.
pub fn write_ppm<W: Write>(
    out: &mut W,
    raster: &Raster,
    options: PpmOptions,
    stop: impl Stop,
) -> Result<WriteSummary, PnmError> {
    let (width, height) = (raster.width, raster.height);
    write!(out, "P6\n{width} {height}\n255\n").map_err(PnmError::WriteHeader)?;

    let mut summary = WriteSummary {
        rows_written: 0,
        rows_total: height,
    };
    let mut row = Vec::with_capacity(width as usize * 3);
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        let src = raster.row(y);
        let bytes: &[u8] = match raster.layout {
            PixelLayout::Rgb8 => src,
            PixelLayout::Gray8 => {
                row.clear();
                for (x, &g) in src.iter().enumerate() {
                    if options.marker_overlay {
                        row.extend_from_slice(&overlay_pixel(g, x as u32, y));
                    } else {
                        row.extend_from_slice(&[g, g, g]);
                    }
                }
                &row
            }
        };
        if let Err(e) = out.write_all(bytes) {
            error!("writing PPM row {y} of {height}: {e}");
            break;
        }
        summary.rows_written += 1;
    }
    Ok(summary)
}

/// Encode to an in-memory P4 image.
pub fn encode_pbm(raster: &Raster, stop: impl Stop) -> Result<Vec<u8>, PnmError> {
    let mut out = Vec::with_capacity(16 + (raster.width as usize).div_ceil(8) * raster.height as usize);
    write_pbm(&mut out, raster, stop)?;
    Ok(out)
}

/// Encode to an in-memory P5 image.
pub fn encode_pgm(raster: &Raster, stop: impl Stop) -> Result<Vec<u8>, PnmError> {
    let mut out = Vec::with_capacity(20 + raster.width as usize * raster.height as usize);
    write_pgm(&mut out, raster, stop)?;
    Ok(out)
}

/// Encode to an in-memory P6 image.
pub fn encode_ppm(raster: &Raster, options: PpmOptions, stop: impl Stop) -> Result<Vec<u8>, PnmError> {
    let mut out = Vec::with_capacity(20 + raster.width as usize * raster.height as usize * 3);
    write_ppm(&mut out, raster, options, stop)?;
    Ok(out)
}

fn create(path: &Path) -> Result<BufWriter<File>, PnmError> {
    let file = File::create(path).map_err(|source| PnmError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

/// Write a P4 file at `path`.
pub fn save_pbm(path: impl AsRef<Path>, raster: &Raster, stop: impl Stop) -> Result<(), PnmError> {
    let mut out = create(path.as_ref())?;
    write_pbm(&mut out, raster, stop)?;
    out.flush().map_err(PnmError::Flush)?;
    Ok(())
}

/// Write a P5 file at `path`.
pub fn save_pgm(path: impl AsRef<Path>, raster: &Raster, stop: impl Stop) -> Result<(), PnmError> {
    let mut out = create(path.as_ref())?;
    write_pgm(&mut out, raster, stop)?;
    out.flush().map_err(PnmError::Flush)?;
    Ok(())
}

/// Write a P6 file at `path`.
pub fn save_ppm(
    path: impl AsRef<Path>,
    raster: &Raster,
    options: PpmOptions,
    stop: impl Stop,
) -> Result<WriteSummary, PnmError> {
    let mut out = create(path.as_ref())?;
    let summary = write_ppm(&mut out, raster, options, stop)?;
    out.flush().map_err(PnmError::Flush)?;
    Ok(summary)
}
