#![allow(dead_code)]

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use pngopt::chunk::{write_chunk, IDAT, IEND, IHDR, PLTE, SIGNATURE, TRNS};
use pngopt::zlib::deflate_best;

/// Encode RGBA pixels with the `image` crate using one filter for every row.
pub fn encode_rgba(width: u32, height: u32, rgba: &[u8], filter: FilterType) -> Vec<u8> {
    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, filter)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .expect("encode RGBA png");
    buf
}

/// Encode RGB pixels with the `image` crate.
pub fn encode_rgb(width: u32, height: u32, rgb: &[u8], filter: FilterType) -> Vec<u8> {
    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, filter)
        .write_image(rgb, width, height, ExtendedColorType::Rgb8)
        .expect("encode RGB png");
    buf
}

pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
    data
}

/// Assemble a PNG by hand from already filtered scanlines.
pub fn raw_png(
    header: Vec<u8>,
    plte: Option<&[u8]>,
    trns: Option<&[u8]>,
    scanlines: &[u8],
) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    write_chunk(&mut out, &IHDR, &header);
    if let Some(plte) = plte {
        write_chunk(&mut out, &PLTE, plte);
    }
    if let Some(trns) = trns {
        write_chunk(&mut out, &TRNS, trns);
    }
    write_chunk(&mut out, &IDAT, &deflate_best(scanlines).expect("deflate"));
    write_chunk(&mut out, &IEND, &[]);
    out
}

/// Decode with the `image` crate into RGBA.
pub fn decode_reference(png: &[u8]) -> (u32, u32, Vec<u8>) {
    let img = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("reference decode")
        .to_rgba8();
    let (w, h) = img.dimensions();
    (w, h, img.into_raw())
}

/// Small deterministic generator for test images.
pub struct Lcg(pub u32);

impl Lcg {
    pub fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }

    pub fn below(&mut self, n: u32) -> u32 {
        (self.next_u32() >> 8) % n
    }
}

/// RGBA buffer drawing from a fixed set of `colors`.
pub fn random_image(rng: &mut Lcg, pixels: usize, colors: &[[u8; 4]]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixels * 4);
    for _ in 0..pixels {
        let c = colors[rng.below(colors.len() as u32) as usize];
        rgba.extend_from_slice(&c);
    }
    rgba
}

/// `n` distinct colors with alpha restricted to 0 or 255.
pub fn color_set(rng: &mut Lcg, n: usize) -> Vec<[u8; 4]> {
    let mut set: Vec<[u8; 4]> = Vec::with_capacity(n);
    while set.len() < n {
        let v = rng.next_u32();
        let a = if v & 1 == 0 { 255 } else { 0 };
        let c = [(v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, a];
        if !set.contains(&c) {
            set.push(c);
        }
    }
    set
}
