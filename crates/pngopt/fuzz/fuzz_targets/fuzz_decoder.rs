#![no_main]

use libfuzzer_sys::fuzz_target;
use pngopt::{decode_png, DecodeOptions};

fuzz_target!(|data: &[u8]| {
    // Malformed input must surface as an error, never a panic
    let _ = decode_png(data, &DecodeOptions::default());
    let _ = decode_png(data, &DecodeOptions { verify_crc: true });
});
