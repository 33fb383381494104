//! Nearest-color mapping of RGBA pixels onto a palette.

use crate::palette::{Palette, PaletteEntry};

/// Index of the palette entry closest to `px` by squared distance over r, g,
/// b and a. Ties go to the lowest index.
#[inline]
pub fn nearest_index(entries: &[PaletteEntry], px: [u8; 4]) -> u8 {
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, e) in entries.iter().enumerate() {
        let dr = e.r as i32 - px[0] as i32;
        let dg = e.g as i32 - px[1] as i32;
        let db = e.b as i32 - px[2] as i32;
        let da = e.a as i32 - px[3] as i32;
        let dist = (dr * dr + dg * dg + db * db + da * da) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i;
            if dist == 0 {
                break;
            }
        }
    }
    best as u8
}

/// Map every pixel of a flat RGBA buffer to a palette index, row-major.
pub fn quantize(rgba: &[u8], palette: &Palette) -> Vec<u8> {
    let entries = palette.entries();
    rgba.chunks_exact(4)
        .map(|px| nearest_index(entries, [px[0], px[1], px[2], px[3]]))
        .collect()
}
