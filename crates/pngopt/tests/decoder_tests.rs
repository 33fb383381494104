mod common;

use common::*;
use image::codecs::png::FilterType;
use pngopt::filter::paeth_predictor;
use pngopt::*;
use pretty_assertions::assert_eq;

fn gradient_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(((x * 7 + y * 13) % 256) as u8);
            pixels.push(((x + y) % 3 * 120) as u8);
        }
    }
    pixels
}

#[test]
fn test_decode_rgba_every_filter() {
    let rgba = gradient_rgba(23, 17);
    for filter in [
        FilterType::NoFilter,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Avg,
        FilterType::Paeth,
        FilterType::Adaptive,
    ] {
        let png = encode_rgba(23, 17, &rgba, filter);
        let image = decode_png(&png, &DecodeOptions::default()).unwrap();
        assert_eq!(image.width, 23);
        assert_eq!(image.height, 17);
        assert_eq!(image.pixels, rgba, "filter {filter:?}");
    }
}

#[test]
fn test_decode_image_past_one_mebibyte() {
    // 600 rows of 1 + 2400 bytes inflate to about 1.4 MiB
    let rgba = gradient_rgba(600, 600);
    for filter in [FilterType::Sub, FilterType::Adaptive] {
        let png = encode_rgba(600, 600, &rgba, filter);
        let image = decode_png(&png, &DecodeOptions::default()).unwrap();
        assert_eq!((image.width, image.height), (600, 600));
        assert!(image.pixels == rgba, "filter {filter:?}");
    }
}

#[test]
fn test_decode_rgb_appends_opaque_alpha() {
    let rgb: Vec<u8> = (0..5 * 4 * 3).map(|i| (i * 11 % 256) as u8).collect();
    let png = encode_rgb(5, 4, &rgb, FilterType::Adaptive);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();

    let expected: Vec<u8> = rgb
        .chunks_exact(3)
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect();
    assert_eq!(image.pixels, expected);
}

#[test]
fn test_paeth_three_rows_manual_values() {
    // 2x3 RGB, every row filtered with Paeth (filter byte 4)
    let scanlines = [
        4, 10, 20, 30, 5, 5, 5, // row 0: above is zero, so left is chosen for x >= 3
        4, 1, 2, 3, 0, 0, 0, // row 1
        4, 0, 0, 0, 250, 1, 2, // row 2
    ];
    let png = raw_png(ihdr(2, 3, 8, 2), None, None, &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();

    // row 0: first pixel raw (predictor 0), second = 5 + left
    // row 1: first pixel predicted by up (left and up-left are 0); second:
    //        left=(11,22,33) up=(15,25,35) up_left=(10,20,30) -> p=(16,27,38),
    //        closest is up -> (15,25,35)
    // row 2: first pixel up=(11,22,33); second: left=(11,22,33)
    //        up=(15,25,35) up_left=(11,22,33) -> p=up -> (15+250,25+1,35+2)
    let expected = vec![
        10, 20, 30, 255, 15, 25, 35, 255, //
        11, 22, 33, 255, 15, 25, 35, 255, //
        11, 22, 33, 255, 9, 26, 37, 255,
    ];
    assert_eq!(image.pixels, expected);
}

#[test]
fn test_paeth_matches_reference_filter() {
    // filter random rows with Paeth using the textbook predictor, then decode
    let (width, height, bpp) = (7usize, 5usize, 4usize);
    let stride = width * bpp;
    let mut rng = Lcg(42);
    let raw: Vec<u8> = (0..stride * height).map(|_| rng.next_u32() as u8).collect();

    let mut scanlines = Vec::new();
    for y in 0..height {
        scanlines.push(4);
        for x in 0..stride {
            let left = if x >= bpp { raw[y * stride + x - bpp] } else { 0 };
            let up = if y > 0 { raw[(y - 1) * stride + x] } else { 0 };
            let up_left = if x >= bpp && y > 0 {
                raw[(y - 1) * stride + x - bpp]
            } else {
                0
            };
            scanlines.push(raw[y * stride + x].wrapping_sub(paeth_predictor(left, up, up_left)));
        }
    }

    let png = raw_png(ihdr(width as u32, height as u32, 8, 6), None, None, &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();
    assert_eq!(image.pixels, raw);
}

#[test]
fn test_indexed_out_of_range_is_transparent_black() {
    let plte = [255, 0, 0, 0, 0, 255];
    let scanlines = [0, 0, 1, 7];
    let png = raw_png(ihdr(3, 1, 8, 3), Some(&plte), None, &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();
    assert_eq!(
        image.pixels,
        vec![255, 0, 0, 255, 0, 0, 255, 255, 0, 0, 0, 0]
    );
}

#[test]
fn test_indexed_trns_applies_alpha() {
    let plte = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    let trns = [0, 128];
    let scanlines = [0, 2, 1, 0];
    let png = raw_png(ihdr(3, 1, 8, 3), Some(&plte), Some(&trns), &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();
    assert_eq!(
        image.pixels,
        vec![7, 8, 9, 255, 4, 5, 6, 128, 1, 2, 3, 0]
    );
}

#[test]
fn test_indexed_sub_byte_depths() {
    let plte: Vec<u8> = (0..16u8).flat_map(|i| [i * 16, i, 255 - i]).collect();

    // 1-bit, 10 pixels per row -> 2 bytes, second row uses Sub on packed bytes
    let scanlines = [
        0, 0b1011_0000, 0b1100_0000, //
        1, 0b0000_0001, 0b0000_0000,
    ];
    let png = raw_png(ihdr(10, 2, 1, 3), Some(&plte[..6]), None, &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();
    let reds: Vec<u8> = image.pixels.chunks_exact(4).map(|p| p[0]).collect();
    // row 1 bytes: 0b0000_0001, 0b0000_0001 (1 + 0)
    assert_eq!(
        reds,
        vec![
            16, 0, 16, 16, 0, 0, 0, 0, 16, 16, //
            0, 0, 0, 0, 0, 0, 0, 16, 0, 0,
        ]
    );

    // 4-bit, 3 pixels -> 2 bytes per row
    let scanlines = [0, 0x1F, 0x30];
    let png = raw_png(ihdr(3, 1, 4, 3), Some(&plte), None, &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();
    let greens: Vec<u8> = image.pixels.chunks_exact(4).map(|p| p[1]).collect();
    assert_eq!(greens, vec![1, 15, 3]);

    // 2-bit, 4 pixels -> 1 byte
    let scanlines = [0, 0b00_01_10_11];
    let png = raw_png(ihdr(4, 1, 2, 3), Some(&plte[..12]), None, &scanlines);
    let image = decode_png(&png, &DecodeOptions::default()).unwrap();
    let greens: Vec<u8> = image.pixels.chunks_exact(4).map(|p| p[1]).collect();
    assert_eq!(greens, vec![0, 1, 2, 3]);
}

#[test]
fn test_unknown_filter_type_is_format_error() {
    let scanlines = [0, 1, 2, 3, 4, 9, 1, 2, 3, 4];
    let png = raw_png(ihdr(1, 2, 8, 6), None, None, &scanlines);
    let err = decode_png(&png, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, PngOptError::UnknownFilterType(9)));
    assert!(err.is_format_error());
}

#[test]
fn test_decompressed_length_mismatch() {
    // one row short
    let scanlines = [0, 1, 2, 3, 4];
    let png = raw_png(ihdr(1, 2, 8, 6), None, None, &scanlines);
    let err = decode_png(&png, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PngOptError::DecompressedSizeMismatch {
            expected: 10,
            actual: 5
        }
    ));

    // one row too many
    let scanlines = [0u8; 15];
    let png = raw_png(ihdr(1, 2, 8, 6), None, None, &scanlines);
    assert!(decode_png(&png, &DecodeOptions::default()).is_err());
}

#[test]
fn test_truncated_file_is_format_error() {
    let png = encode_rgba(16, 16, &gradient_rgba(16, 16), FilterType::Adaptive);
    for cut in [png.len() - 1, png.len() - 13, png.len() / 2, 20] {
        let err = decode_png(&png[..cut], &DecodeOptions::default()).unwrap_err();
        assert!(err.is_format_error(), "cut at {cut}: {err}");
    }
}

#[test]
fn test_unsupported_formats_rejected_at_header() {
    for (depth, color_type) in [(8, 0), (16, 0), (8, 4), (16, 6), (16, 2), (3, 3)] {
        let png = raw_png(ihdr(1, 1, depth, color_type), None, None, &[0, 0]);
        let err = decode_png(&png, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, PngOptError::Unsupported(_)), "{depth}/{color_type}: {err}");
    }

    let mut interlaced = ihdr(1, 1, 8, 6);
    interlaced[12] = 1;
    let png = raw_png(interlaced, None, None, &[0, 0, 0, 0, 0]);
    assert!(matches!(
        decode_png(&png, &DecodeOptions::default()),
        Err(PngOptError::Unsupported(_))
    ));
}

#[test]
fn test_verify_crc_accepts_valid_file() {
    let png = encode_rgba(4, 4, &gradient_rgba(4, 4), FilterType::Sub);
    let opts = DecodeOptions { verify_crc: true };
    assert!(decode_png(&png, &opts).is_ok());
}
