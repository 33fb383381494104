//! Popularity palette: the most frequent colors of a histogram.

use tracing::debug;

use crate::histogram::{ColorKey, Histogram};
use crate::{clamp_color_limit, PngOptError, Result};

/// One palette color and the number of source pixels it was selected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub count: u64,
}

impl PaletteEntry {
    pub const OPAQUE_WHITE: PaletteEntry = PaletteEntry {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
        count: 1,
    };

    fn from_key(key: ColorKey, count: u64) -> Self {
        let [r, g, b, a] = key.rgba();
        Self { r, g, b, a, count }
    }

    pub fn is_opaque_white(&self) -> bool {
        self.r == 255 && self.g == 255 && self.b == 255 && self.a == 255
    }
}

/// Ordered palette of 1 to 256 entries, alpha binarized to 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Select up to `color_limit` colors from `hist` by descending count.
    ///
    /// `color_limit` is clamped to `1..=256`. Equal counts keep histogram
    /// iteration order. Alpha of every entry becomes 0 if it was 0, else 255.
    /// If the source has opaque white and no selected entry is opaque white,
    /// the last (least frequent) entry is replaced by opaque white.
    ///
    /// # Errors
    ///
    /// Returns [`PngOptError::EmptyImage`] if the histogram is empty.
    pub fn build(hist: &Histogram, color_limit: u16) -> Result<Self> {
        if hist.is_empty() {
            return Err(PngOptError::EmptyImage);
        }

        let mut colors: Vec<PaletteEntry> = hist
            .iter()
            .map(|(key, count)| PaletteEntry::from_key(key, count))
            .collect();
        // stable: ties stay in histogram order
        colors.sort_by(|a, b| b.count.cmp(&a.count));

        let size = clamp_color_limit(color_limit).min(colors.len());
        colors.truncate(size);
        for entry in &mut colors {
            entry.a = if entry.a == 0 { 0 } else { 255 };
        }

        if hist.contains(ColorKey::OPAQUE_WHITE) && !colors.iter().any(|e| e.is_opaque_white()) {
            if let Some(last) = colors.last_mut() {
                debug!(replaced = ?last, "keeping opaque white in palette");
                *last = PaletteEntry::OPAQUE_WHITE;
            }
        }

        debug!(distinct = hist.len(), size = colors.len(), "built palette");
        Ok(Self { entries: colors })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `PLTE` payload: r, g, b per entry.
    pub fn plte_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| [e.r, e.g, e.b]).collect()
    }

    /// `tRNS` payload: one alpha byte per entry.
    pub fn trns_bytes(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.a).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn histogram(pixels: &[([u8; 4], usize)]) -> Histogram {
        let mut rgba = Vec::new();
        for (color, n) in pixels {
            for _ in 0..*n {
                rgba.extend_from_slice(color);
            }
        }
        Histogram::from_rgba(&rgba)
    }

    #[test]
    fn test_sorted_by_count() {
        let hist = histogram(&[([1, 1, 1, 255], 2), ([2, 2, 2, 255], 5), ([3, 3, 3, 255], 3)]);
        let palette = Palette::build(&hist, 64).unwrap();
        let counts: Vec<u64> = palette.entries().iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![5, 3, 2]);
        assert_eq!(palette.entries()[0].r, 2);
    }

    #[test]
    fn test_limit_truncates() {
        let hist = histogram(&[([1, 0, 0, 255], 4), ([2, 0, 0, 255], 3), ([3, 0, 0, 255], 1)]);
        let palette = Palette::build(&hist, 2).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.plte_bytes(), vec![1, 0, 0, 2, 0, 0]);
    }

    #[test]
    fn test_limit_is_clamped() {
        let hist = histogram(&[([1, 0, 0, 255], 4), ([2, 0, 0, 255], 3)]);
        assert_eq!(Palette::build(&hist, 0).unwrap().len(), 1);
        assert_eq!(Palette::build(&hist, 1000).unwrap().len(), 2);
    }

    #[test]
    fn test_alpha_is_binarized() {
        let hist = histogram(&[([10, 20, 30, 0], 3), ([40, 50, 60, 1], 2), ([70, 80, 90, 200], 1)]);
        let palette = Palette::build(&hist, 64).unwrap();
        assert_eq!(palette.trns_bytes(), vec![0, 255, 255]);
        // rgb of the transparent entry survives
        assert_eq!(&palette.plte_bytes()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_rare_white_replaces_last_entry() {
        let hist = histogram(&[
            ([0, 0, 0, 255], 10),
            ([255, 0, 0, 255], 5),
            ([0, 255, 0, 255], 4),
            ([255, 255, 255, 255], 1),
        ]);
        let palette = Palette::build(&hist, 3).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(palette.entries()[2], PaletteEntry::OPAQUE_WHITE);
        assert_eq!(palette.entries()[0].count, 10);
        assert_eq!(palette.entries()[1].count, 5);
    }

    #[test]
    fn test_white_survives_limit_one() {
        let hist = histogram(&[([0, 0, 0, 255], 10), ([255, 255, 255, 255], 1)]);
        let palette = Palette::build(&hist, 1).unwrap();
        assert_eq!(palette.entries(), &[PaletteEntry::OPAQUE_WHITE]);
    }

    #[test]
    fn test_semi_transparent_white_counts_as_white_after_binarize() {
        let hist = histogram(&[([255, 255, 255, 128], 10), ([255, 255, 255, 255], 1), ([1, 2, 3, 255], 5)]);
        let palette = Palette::build(&hist, 2).unwrap();
        // the binarized 50% white is already opaque white, so the last slot stays
        assert_eq!(palette.entries()[0].count, 10);
        assert!(palette.entries()[0].is_opaque_white());
        assert_eq!(palette.entries()[1].count, 5);
    }

    #[test]
    fn test_no_white_no_replacement() {
        let hist = histogram(&[([0, 0, 0, 255], 3), ([9, 9, 9, 255], 1)]);
        let palette = Palette::build(&hist, 1).unwrap();
        assert_eq!(palette.plte_bytes(), vec![0, 0, 0]);
    }

    #[test]
    fn test_empty_histogram_fails() {
        let hist = Histogram::from_rgba(&[]);
        assert!(matches!(Palette::build(&hist, 64), Err(PngOptError::EmptyImage)));
    }
}
