//! Decode corpus: hand-built inputs covering every header shape and sample encoding.

use enough::Unstoppable;
use zenraster::*;

fn decode_with(data: &[u8], options: DecodeOptions) -> Result<Raster, PnmError> {
    DecodeSession::from_bytes(data, options)
        .decode_next(Unstoppable)
        .map(|d| d.raster)
}

// ── ASCII formats ────────────────────────────────────────────────────

#[test]
fn p1_ascii_bitmap() {
    let data = b"P1\n# tiny\n4 2\n0 1 0 1\n1100\n";
    let r = decode(data, Unstoppable).unwrap();
    assert_eq!((r.width, r.height), (4, 2));
    assert_eq!(r.pixels(), &[255, 0, 255, 0, 0, 0, 255, 255]);
}

#[test]
fn p2_ascii_graymap_scales_to_255() {
    let data = b"P2\n3 1\n15\n0 # dark\n 15 5\n";
    let r = decode(data, Unstoppable).unwrap();
    assert_eq!(r.pixels(), &[0, 255, 85]);
}

#[test]
fn p2_last_sample_may_end_at_eof() {
    let r = decode(b"P2 2 1 255 7 9", Unstoppable).unwrap();
    assert_eq!(r.pixels(), &[7, 9]);
}

#[test]
fn p3_ascii_pixmap_to_luminance() {
    let data = b"P3\n4 1\n255\n255 255 255  255 0 0  0 255 0  0 0 255\n";
    let r = decode(data, Unstoppable).unwrap();
    assert_eq!(r.layout, PixelLayout::Gray8);
    assert_eq!(r.pixels(), &[255, 127, 99, 29]);
}

#[test]
fn ascii_sample_wraps_at_sample_width() {
    // 300 does not fit one byte: keeps the low byte, 300 - 256 = 44.
    let r = decode(b"P2 1 1 255\n300\n", Unstoppable).unwrap();
    assert_eq!(r.pixels(), &[44]);
}

#[test]
fn ascii_sample_with_garbage_is_invalid_data() {
    assert!(matches!(
        decode(b"P2 2 1 255\n12 x\n", Unstoppable),
        Err(PnmError::InvalidData(_))
    ));
}

// ── Binary formats ───────────────────────────────────────────────────

#[test]
fn p4_binary_bitmap_unpacks_msb_first() {
    let data = b"P4\n10 2\n\xA0\x40\xFF\xC0";
    let r = decode(data, Unstoppable).unwrap();
    assert_eq!(
        r.pixels(),
        &[
            0, 255, 0, 255, 255, 255, 255, 255, 255, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]
    );
}

#[test]
fn p5_sixteen_bit_big_endian() {
    let data = b"P5\n3 1\n65535\n\x00\x00\xFF\xFF\x80\x00";
    let r = decode(data, Unstoppable).unwrap();
    assert_eq!(r.pixels(), &[0, 255, 127]);
}

#[test]
fn p6_rgb_reduced_or_kept() {
    let data = b"P6\n2 1\n255\n\xFF\x00\x00\x00\x00\xFF";
    let gray = decode(data, Unstoppable).unwrap();
    assert_eq!(gray.pixels(), &[127, 29]);

    let rgb = decode_with(data, DecodeOptions::new().with_color(ColorMode::Rgb)).unwrap();
    assert_eq!(rgb.layout, PixelLayout::Rgb8);
    assert_eq!(rgb.pixels(), &[255, 0, 0, 0, 0, 255]);
}

#[test]
fn p6_sixteen_bit_white() {
    let data = b"P6\n1 1\n65535\n\xFF\xFF\xFF\xFF\xFF\xFF";
    assert_eq!(decode(data, Unstoppable).unwrap().pixels(), &[255]);
}

#[test]
fn short_binary_read_is_unexpected_eof() {
    assert!(matches!(
        decode(b"P5\n4 4\n255\n\x00\x01\x02", Unstoppable),
        Err(PnmError::UnexpectedEof)
    ));
}

// ── PAM ──────────────────────────────────────────────────────────────

#[test]
fn pam_gray() {
    let data = b"P7\nWIDTH 2\nHEIGHT 1\nDEPTH 1\nMAXVAL 255\nTUPLTYPE GRAYSCALE\nENDHDR\n\x10\x20";
    let r = decode(data, Unstoppable).unwrap();
    assert_eq!(r.pixels(), &[0x10, 0x20]);
}

#[test]
fn pam_rgba_ignores_alpha() {
    let data =
        b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n\xFF\xFF\xFF\x00";
    let gray = decode(data, Unstoppable).unwrap();
    assert_eq!(gray.pixels(), &[255]);

    let rgb = decode_with(data, DecodeOptions::new().with_color(ColorMode::Rgb)).unwrap();
    assert_eq!(rgb.pixels(), &[255, 255, 255]);
}

#[test]
fn pam_depth_wins_over_tuple_type() {
    let data = b"P7\nWIDTH 2\nHEIGHT 1\nDEPTH 1\nMAXVAL 255\nTUPLTYPE RGB\nENDHDR\n\x05\x06";
    assert_eq!(decode(data, Unstoppable).unwrap().pixels(), &[5, 6]);
}

#[test]
fn pam_endhdr_ends_valueless_tuple_type() {
    let data = b"P7\nWIDTH 1\nHEIGHT 1\nMAXVAL 255\nTUPLTYPE\nENDHDR\n\x80";
    assert_eq!(decode(data, Unstoppable).unwrap().pixels(), &[0x80]);

    // Letter-valued samples must not be taken for header text.
    let data = b"P7\nWIDTH 2\nHEIGHT 1\nMAXVAL 255\nTUPLTYPE\nENDHDR\nAB";
    assert_eq!(decode(data, Unstoppable).unwrap().pixels(), b"AB");
}

#[test]
fn pam_without_endhdr_fails() {
    let data = b"P7\nWIDTH 2\nHEIGHT 1\nMAXVAL 255\n";
    assert!(matches!(
        decode(data, Unstoppable),
        Err(PnmError::InvalidHeader(_))
    ));
}

#[test]
fn pam_oversized_sample_group_fails() {
    // 200 channels of 4 bytes = 800 bytes per pixel.
    let data = b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 200\nMAXVAL 4294967295\nENDHDR\n";
    assert!(matches!(
        decode(data, Unstoppable),
        Err(PnmError::SampleGroupTooLarge { depth: 200, bytes_per_sample: 4 })
    ));
}

// ── Header errors and sizes ──────────────────────────────────────────

#[test]
fn probe_reads_header_only() {
    let info = ImageInfo::from_bytes(b"P5\n# c\n640 480\n1023\n").unwrap();
    assert_eq!(info.format, PnmFormat::PgmBinary);
    assert_eq!((info.width, info.height, info.depth, info.maxval), (640, 480, 1, 1023));
}

#[test]
fn dimensions_over_i32_fail_before_allocation() {
    // 65536 * 65536 overflows i32; no sample bytes are present at all.
    let data = b"P5\n65536 65536\n255\n";
    assert!(matches!(
        decode(data, Unstoppable),
        Err(PnmError::DimensionsTooLarge { width: 65536, height: 65536 })
    ));
}

#[test]
fn header_number_overflow() {
    assert!(matches!(
        decode(b"P5\n4294967296 1\n255\n", Unstoppable),
        Err(PnmError::IntegerOverflow("width"))
    ));
    assert!(matches!(
        decode(b"P5\n1 1\n99999999999\n", Unstoppable),
        Err(PnmError::IntegerOverflow("maxval"))
    ));
}

#[test]
fn zero_width_is_rejected() {
    assert!(matches!(
        decode(b"P5\n0 4\n255\n", Unstoppable),
        Err(PnmError::InvalidHeader(_))
    ));
}

#[test]
fn unknown_magic() {
    assert!(matches!(
        decode(b"BM\x00\x00", Unstoppable),
        Err(PnmError::UnrecognizedFormat { first: b'B', second: b'M' })
    ));
    assert!(matches!(
        decode(b"P9\n1 1\n", Unstoppable),
        Err(PnmError::UnrecognizedFormat { first: b'P', second: b'9' })
    ));
}

#[test]
fn empty_input() {
    assert!(matches!(decode(b"", Unstoppable), Err(PnmError::UnexpectedEof)));
}

#[test]
fn limits_reject_large_images() {
    let data = b"P5\n100 100\n255\n";
    let options = DecodeOptions::new().with_limits(Limits {
        max_pixels: Some(1_000),
        ..Limits::default()
    });
    assert!(matches!(
        decode_with(data, options),
        Err(PnmError::LimitExceeded(_))
    ));
}

struct AlreadyCancelled;

impl Stop for AlreadyCancelled {
    fn check(&self) -> Result<(), enough::StopReason> {
        Err(enough::StopReason::Cancelled)
    }
}

#[test]
fn cancelled_decode() {
    let data = b"P5\n1 1\n255\n\x00";
    let err = DecodeSession::from_bytes(data, DecodeOptions::default())
        .decode_next(AlreadyCancelled)
        .unwrap_err();
    assert!(matches!(err, PnmError::Cancelled(_)), "{err:?}");
}

#[cfg(feature = "rgb")]
#[test]
fn typed_views() {
    let data = b"P6\n2 1\n255\n\x01\x02\x03\x04\x05\x06";
    let color = decode_with(data, DecodeOptions::new().with_color(ColorMode::Rgb)).unwrap();
    let px: &[rgb::RGB8] = color.as_pixels().unwrap();
    assert_eq!(px[1], rgb::RGB8::new(4, 5, 6));

    let gray = decode(data, Unstoppable).unwrap();
    assert!(gray.as_pixels::<rgb::RGB8>().is_err());
}
