//! Sample decoding for P1..P7 into an 8-bit raster.

use std::io::BufRead;

use enough::Stop;
use log::debug;

use super::header::PnmHeader;
use super::tokenizer::{Tokenizer, is_space};
use crate::error::PnmError;
use crate::limits::{Limits, MAX_SAMPLE_GROUP_BYTES, check_pixel_count};
use crate::pixel::{ColorMode, PixelLayout, PnmFormat};
use crate::raster::Raster;

/// Fixed-point luminance weights over 1024.
const RED_WEIGHT: u64 = 511;
const GREEN_WEIGHT: u64 = 396;
const BLUE_WEIGHT: u64 = 117;

/// Weighted RGB sum at the input's sample scale.
pub(crate) fn luminance(r: u32, g: u32, b: u32) -> u64 {
    ((RED_WEIGHT * u64::from(r) + 511) >> 10)
        + ((GREEN_WEIGHT * u64::from(g) + 511) >> 10)
        + ((BLUE_WEIGHT * u64::from(b) + 511) >> 10)
}

/// Rescale a sample from `0..=maxval` to `0..=255`.
pub(crate) fn normalize(value: u64, maxval: u32) -> u8 {
    let scaled = if maxval == 255 {
        value
    } else {
        value * 255 / u64::from(maxval)
    };
    scaled.min(255) as u8
}

fn sample_from_be(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Decode the sample data following `header`.
///
/// The output buffer is only returned once every pixel has been read.
pub(crate) fn decode_pixels<R: BufRead>(
    tok: &mut Tokenizer<R>,
    header: &PnmHeader,
    color: ColorMode,
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Raster, PnmError> {
    let pixel_count = check_pixel_count(header.width, header.height)?;
    if let Some(limits) = limits {
        limits.check(header.width, header.height)?;
    }

    let bps = header.bytes_per_sample();
    let depth = header.depth as usize;
    let group = depth
        .checked_mul(bps)
        .filter(|&g| g <= MAX_SAMPLE_GROUP_BYTES)
        .ok_or(PnmError::SampleGroupTooLarge {
            depth: header.depth,
            bytes_per_sample: bps,
        })?;

    let layout = if color == ColorMode::Rgb && depth >= 3 && !header.format.is_bitmap() {
        PixelLayout::Rgb8
    } else {
        PixelLayout::Gray8
    };
    let out_bytes = pixel_count
        .checked_mul(layout.channels())
        .ok_or(PnmError::DimensionsTooLarge {
            width: header.width,
            height: header.height,
        })?;
    if let Some(limits) = limits {
        limits.check_memory(out_bytes)?;
    }
    let mut out = Vec::new();
    out.try_reserve_exact(out_bytes).map_err(|_| {
        PnmError::LimitExceeded(format!("cannot allocate {out_bytes} bytes for raster"))
    })?;

    stop.check()?;

    match header.format {
        PnmFormat::PbmAscii => decode_pbm_ascii(tok, header, &mut out, stop)?,
        PnmFormat::PbmBinary => decode_pbm_binary(tok, header, &mut out, stop)?,
        _ => decode_samples(tok, header, bps, group, layout, &mut out, stop)?,
    }

    let raster = Raster::from_parts(out, header.width, header.height, layout);
    let (min, max) = raster.min_max();
    debug!("decoded {}x{} {:?}: min={min} max={max}", raster.width, raster.height, layout);
    Ok(raster)
}

/// P1: one digit per pixel, `0` is white and anything else black.
fn decode_pbm_ascii<R: BufRead>(
    tok: &mut Tokenizer<R>,
    header: &PnmHeader,
    out: &mut Vec<u8>,
    stop: &dyn Stop,
) -> Result<(), PnmError> {
    let w = header.width as usize;
    for y in 0..header.height as usize {
        if y % 16 == 0 {
            stop.check()?;
        }
        let mut x = 0;
        while x < w {
            match tok.next_char()? {
                None => return Err(PnmError::UnexpectedEof),
                Some(c) if c.is_ascii_digit() => {
                    out.push(if c == b'0' { 255 } else { 0 });
                    x += 1;
                }
                Some(c) if is_space(c) => {}
                Some(c) => {
                    return Err(PnmError::InvalidData(format!(
                        "unexpected character {:?} in bitmap data",
                        c as char
                    )));
                }
            }
        }
    }
    Ok(())
}

/// P4: rows packed MSB first, each padded to a whole byte. A set bit is black.
fn decode_pbm_binary<R: BufRead>(
    tok: &mut Tokenizer<R>,
    header: &PnmHeader,
    out: &mut Vec<u8>,
    stop: &dyn Stop,
) -> Result<(), PnmError> {
    let w = header.width as usize;
    let mut row = vec![0u8; w.div_ceil(8)];
    for y in 0..header.height as usize {
        if y % 16 == 0 {
            stop.check()?;
        }
        tok.read_exact(&mut row)?;
        out.extend((0..w).map(|x| {
            if (row[x >> 3] << (x & 7)) & 0x80 != 0 {
                0
            } else {
                255
            }
        }));
    }
    Ok(())
}

/// P2, P3, P5, P6, P7: `depth` channels of `bps` bytes (binary) or
/// decimal tokens (ASCII) per pixel.
fn decode_samples<R: BufRead>(
    tok: &mut Tokenizer<R>,
    header: &PnmHeader,
    bps: usize,
    group: usize,
    layout: PixelLayout,
    out: &mut Vec<u8>,
    stop: &dyn Stop,
) -> Result<(), PnmError> {
    let depth = header.depth as usize;
    let maxval = header.maxval;
    let ascii = header.format.is_ascii();
    let mut raw = [0u8; MAX_SAMPLE_GROUP_BYTES];
    // Only the first three channels contribute to the output.
    let mut samples = [0u32; 3];

    for y in 0..header.height as usize {
        if y % 16 == 0 {
            stop.check()?;
        }
        for _ in 0..header.width {
            if ascii {
                for c in 0..depth {
                    let v = tok.read_ascii_sample(bps)?;
                    if c < 3 {
                        samples[c] = v;
                    }
                }
            } else {
                let bytes = &mut raw[..group];
                tok.read_exact(bytes)?;
                for (c, s) in bytes.chunks_exact(bps).take(3).enumerate() {
                    samples[c] = sample_from_be(s);
                }
            }

            if depth >= 3 {
                match layout {
                    PixelLayout::Rgb8 => {
                        out.extend(samples.iter().map(|&s| normalize(u64::from(s), maxval)));
                    }
                    PixelLayout::Gray8 => {
                        let lum = luminance(samples[0], samples[1], samples[2]);
                        out.push(normalize(lum, maxval));
                    }
                }
            } else {
                out.push(normalize(u64::from(samples[0]), maxval));
            }
        }
    }
    Ok(())
}
