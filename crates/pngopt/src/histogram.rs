//! Exact color histogram over an RGBA buffer.
//!
//! Open addressing with linear probing over a power-of-two table sized to at
//! least twice the pixel count (minimum 1024 slots), so the table never fills.

/// A color packed as `r << 24 | g << 16 | b << 8 | a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey(pub u32);

impl ColorKey {
    pub const OPAQUE_WHITE: ColorKey = ColorKey(0xFFFF_FFFF);

    #[inline]
    pub const fn pack(r: u8, g: u8, b: u8, a: u8) -> Self {
        ColorKey((r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32)
    }

    #[inline]
    pub fn from_rgba(px: &[u8]) -> Self {
        Self::pack(px[0], px[1], px[2], px[3])
    }

    #[inline]
    pub const fn rgba(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

const MIN_CAPACITY: usize = 1024;

/// 32-bit avalanche mix.
#[inline]
fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x
}

/// Distinct colors and how often each occurs.
#[derive(Debug, Clone)]
pub struct Histogram {
    keys: Vec<u32>,
    // zero marks an empty slot; every occupied slot has count >= 1
    counts: Vec<u64>,
    len: usize,
    total: u64,
}

impl Histogram {
    /// An empty table sized for `pixel_count` pixels.
    pub fn with_pixel_capacity(pixel_count: usize) -> Self {
        let capacity = pixel_count
            .saturating_mul(2)
            .max(MIN_CAPACITY)
            .next_power_of_two();
        Self {
            keys: vec![0; capacity],
            counts: vec![0; capacity],
            len: 0,
            total: 0,
        }
    }

    /// Count every pixel of a flat RGBA buffer.
    pub fn from_rgba(rgba: &[u8]) -> Self {
        let mut hist = Self::with_pixel_capacity(rgba.len() / 4);
        for px in rgba.chunks_exact(4) {
            hist.insert(ColorKey::from_rgba(px));
        }
        hist
    }

    /// Record one occurrence of `key`.
    pub fn insert(&mut self, key: ColorKey) {
        if self.len * 2 >= self.keys.len() {
            self.grow();
        }
        let slot = self.probe(key.0);
        if self.counts[slot] == 0 {
            self.keys[slot] = key.0;
            self.len += 1;
        }
        self.counts[slot] += 1;
        self.total += 1;
    }

    // Slot holding `key`, or the first empty slot on its probe path.
    #[inline]
    fn probe(&self, key: u32) -> usize {
        let mask = self.keys.len() - 1;
        let mut idx = mix32(key) as usize & mask;
        while self.counts[idx] != 0 && self.keys[idx] != key {
            idx = (idx + 1) & mask;
        }
        idx
    }

    // Only reached when inserts exceed the pixel count the table was sized for.
    fn grow(&mut self) {
        let capacity = self.keys.len() * 2;
        let keys = std::mem::replace(&mut self.keys, vec![0; capacity]);
        let counts = std::mem::replace(&mut self.counts, vec![0; capacity]);
        for (key, count) in keys.into_iter().zip(counts) {
            if count != 0 {
                let slot = self.probe(key);
                self.keys[slot] = key;
                self.counts[slot] = count;
            }
        }
    }

    /// Occurrences of `key`.
    pub fn count(&self, key: ColorKey) -> u64 {
        self.counts[self.probe(key.0)]
    }

    pub fn contains(&self, key: ColorKey) -> bool {
        self.count(key) > 0
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of all counts, equal to the number of pixels inserted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Table size in slots.
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// `(color, count)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (ColorKey, u64)> + '_ {
        self.keys
            .iter()
            .zip(&self.counts)
            .filter(|(_, count)| **count != 0)
            .map(|(&key, &count)| (ColorKey(key), count))
    }
}
