#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

fuzz_target!(|data: &[u8]| {
    // Walk every image in the stream, gray and RGB; must never panic
    for color in [ColorMode::Gray, ColorMode::Rgb] {
        let options = DecodeOptions::new()
            .with_color(color)
            .with_limits(Limits {
                max_pixels: Some(1 << 22),
                ..Limits::default()
            });
        let mut session = DecodeSession::from_bytes(data, options);
        for raster in session.images(enough::Unstoppable) {
            let Ok(raster) = raster else { break };
            assert_eq!(
                raster.pixels().len(),
                raster.width as usize * raster.height as usize * raster.channels()
            );
        }
    }

    let _ = ImageInfo::from_bytes(data);
});
