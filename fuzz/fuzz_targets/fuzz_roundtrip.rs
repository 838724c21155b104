#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must survive a P5 roundtrip unchanged
    let Ok(decoded) = decode(data, enough::Unstoppable) else {
        return;
    };

    let Ok(reencoded) = encode_pgm(&decoded, enough::Unstoppable) else {
        return;
    };
    let Ok(decoded2) = decode(&reencoded, enough::Unstoppable) else {
        panic!("re-encoded data failed to decode");
    };

    assert_eq!(decoded.pixels(), decoded2.pixels(), "roundtrip pixel mismatch");
    assert_eq!(decoded.width, decoded2.width);
    assert_eq!(decoded.height, decoded2.height);

    // The overlay writer must cover every row of an in-memory sink
    let summary = write_ppm(
        &mut Vec::<u8>::new(),
        &decoded,
        PpmOptions { marker_overlay: true },
        enough::Unstoppable,
    )
    .unwrap();
    assert!(summary.is_complete());
});
