#![no_main]

use libfuzzer_sys::fuzz_target;
use pngopt::{decode_png, optimize_png, DecodeOptions, OptimizeOptions};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let opts = OptimizeOptions {
        color_limit: data[0] as u16 + 1,
        ..Default::default()
    };
    if let Ok(optimized) = optimize_png(&data[1..], &opts) {
        // Our own output must always decode
        let image = decode_png(&optimized.png, &DecodeOptions { verify_crc: true })
            .expect("re-decode optimized output");
        assert_eq!(image.width, optimized.width);
        assert_eq!(image.height, optimized.height);
    }
});
