//! Contains the code for color/pixel deduplication.

use ::palette::{
    cast::{self, AsArrays},
    Srgb,
};

/// Deduplicated colors alongside the number of times each color occurred.
///
/// Colors are stored in ascending `(red, green, blue)` order, so the same input
/// (in any pixel order) always produces the same [`UniqueColorCounts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueColorCounts {
    /// The unique colors.
    colors: Vec<Srgb<u8>>,
    /// The number of pixels of each color in `colors`. Every count is non-zero.
    counts: Vec<u32>,
    /// The sum of `counts`.
    total_count: u64,
}

impl UniqueColorCounts {
    /// Counts the unique colors in the given slice.
    #[must_use]
    pub fn new(colors: &[Srgb<u8>]) -> Self {
        #[inline]
        fn key(color: Srgb<u8>) -> u32 {
            let [r, g, b] = cast::into_array(color);
            u32::from_be_bytes([0, r, g, b])
        }

        let mut keys = colors.iter().copied().map(key).collect::<Vec<_>>();
        keys.sort_unstable();

        let mut unique = Vec::new();
        let mut counts = Vec::<u32>::new();
        let mut prev = None;
        for k in keys {
            if prev == Some(k) {
                if let Some(count) = counts.last_mut() {
                    *count = count.saturating_add(1);
                }
            } else {
                let [_, r, g, b] = k.to_be_bytes();
                unique.push(Srgb::new(r, g, b));
                counts.push(1);
                prev = Some(k);
            }
        }

        let total_count = counts.iter().copied().map(u64::from).sum();

        Self { colors: unique, counts, total_count }
    }

    /// The unique colors.
    #[must_use]
    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.colors
    }

    /// The unique colors casted to component arrays.
    #[must_use]
    pub fn color_components(&self) -> &[[u8; 3]] {
        self.colors.as_arrays()
    }

    /// The number of pixels of each unique color.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// The total number of pixels counted.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// The number of unique colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether there are no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
