//! Median cut color quantization.
//!
//! Starting from a single box holding every pixel, this method repeatedly takes the box with
//! the largest volume in RGB space, sorts its pixels along the channel with the widest range,
//! and cuts it in two at the median pixel. The average color of each final box becomes a
//! palette color, weighted by the fraction of pixels the box holds.
//!
//! Boxes whose pixels are all identical cannot be cut. Once every box is in that state,
//! quantization stops early and the palette has fewer colors than requested.

use crate::{Color, PaletteSize};

use ::palette::{cast, Srgb};
use log::debug;

/// The number of channels taking part in the partitioning.
const N: usize = 3;

/// A box in RGB space: a non-empty set of pixels and its per-channel extrema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBox {
    /// The pixels in this box. Never empty.
    colors: Vec<Srgb<u8>>,
    /// The component-wise minimum of `colors`.
    min: [u8; N],
    /// The component-wise maximum of `colors`.
    max: [u8; N],
}

impl ColorBox {
    /// Creates a box around the given pixels, or `None` if there are no pixels.
    #[must_use]
    pub fn new(colors: Vec<Srgb<u8>>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self::with_bounds(colors))
        }
    }

    /// Computes the extrema of a non-empty pixel list.
    fn with_bounds(colors: Vec<Srgb<u8>>) -> Self {
        let mut min = [u8::MAX; N];
        let mut max = [u8::MIN; N];
        for &color in &colors {
            let color: [u8; N] = cast::into_array(color);
            for c in 0..N {
                min[c] = min[c].min(color[c]);
                max[c] = max[c].max(color[c]);
            }
        }

        Self { colors, min, max }
    }

    /// The number of pixels in this box.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.colors.len()
    }

    /// The component-wise minimum of the pixels in this box.
    #[must_use]
    pub fn min_channel(&self) -> [u8; N] {
        self.min
    }

    /// The component-wise maximum of the pixels in this box.
    #[must_use]
    pub fn max_channel(&self) -> [u8; N] {
        self.max
    }

    /// The per-channel ranges (`max - min`).
    fn ranges(&self) -> [u8; N] {
        let Self { min, max, .. } = self;
        [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
    }

    /// The product of the per-channel ranges, used to pick which box to split next.
    #[must_use]
    pub fn volume(&self) -> u32 {
        self.ranges().into_iter().map(u32::from).product()
    }

    /// The channel with the widest range. Ties go to the lowest channel index.
    #[must_use]
    pub fn dominant_channel(&self) -> usize {
        let ranges = self.ranges();
        let mut dominant = 0;
        for c in 1..N {
            if ranges[c] > ranges[dominant] {
                dominant = c;
            }
        }
        dominant
    }

    /// Whether splitting this box would separate distinct colors.
    #[must_use]
    pub fn is_splittable(&self) -> bool {
        self.pixel_count() >= 2 && self.min != self.max
    }

    /// The per-channel mean of the pixels in this box, rounded to the nearest integer.
    #[must_use]
    pub fn average(&self) -> Srgb<u8> {
        let mut sums = [0u64; N];
        for &color in &self.colors {
            let color: [u8; N] = cast::into_array(color);
            for c in 0..N {
                sums[c] += u64::from(color[c]);
            }
        }

        let n = self.colors.len() as u64;

        #[allow(clippy::cast_possible_truncation)]
        let mean = sums.map(|sum| ((sum + n / 2) / n) as u8);

        cast::from_array(mean)
    }

    /// Cuts this box in two at the median pixel along the dominant channel.
    ///
    /// The pixels are stably sorted by the dominant channel. The lower box receives the first
    /// `count / 2` pixels and the upper box the rest, so for odd counts the upper box is larger.
    ///
    /// # Errors
    /// Returns the box unchanged if it holds fewer than two pixels.
    pub fn split(self) -> Result<(Self, Self), Self> {
        if self.pixel_count() < 2 {
            return Err(self);
        }

        let channel = self.dominant_channel();
        let mut colors = self.colors;
        colors.sort_by_key(|&color| cast::into_array(color)[channel]);

        let upper = colors.split_off(colors.len() / 2);

        Ok((Self::with_bounds(colors), Self::with_bounds(upper)))
    }
}

/// Returns the index of the splittable box with the largest volume.
///
/// The first box wins among boxes with equal volume.
fn largest_splittable(boxes: &[ColorBox]) -> Option<usize> {
    let mut largest: Option<(usize, u32)> = None;
    for (i, b) in boxes.iter().enumerate() {
        if !b.is_splittable() {
            continue;
        }

        let volume = b.volume();
        if largest.map_or(true, |(_, max)| volume > max) {
            largest = Some((i, volume));
        }
    }
    largest.map(|(i, _)| i)
}

/// Computes the final boxes for the given pixels.
///
/// Returns an empty `Vec` if `colors` is empty.
#[must_use]
pub fn boxes(colors: Vec<Srgb<u8>>, palette_size: PaletteSize) -> Vec<ColorBox> {
    let Some(initial) = ColorBox::new(colors) else {
        return Vec::new();
    };

    let k = palette_size.as_usize();
    let mut boxes = Vec::with_capacity(k);
    boxes.push(initial);

    while boxes.len() < k {
        let Some(i) = largest_splittable(&boxes) else {
            debug!(
                "median cut stopped at {} of {k} colors: no box has distinct colors left to split",
                boxes.len()
            );
            break;
        };

        match boxes.remove(i).split() {
            Ok((lower, upper)) => {
                boxes.insert(i, upper);
                boxes.insert(i, lower);
            }
            Err(unsplit) => {
                boxes.insert(i, unsplit);
                break;
            }
        }
    }

    boxes
}

/// Computes a color palette for the given pixels using median cut.
///
/// Each color's frequency is the fraction of `colors` in its box,
/// so the frequencies sum to `1`. The palette is in box order (unsorted).
/// Fewer than `palette_size` colors are returned if the pixels do not have enough distinct colors.
#[must_use]
pub fn palette(colors: Vec<Srgb<u8>>, palette_size: PaletteSize) -> Vec<Color> {
    #[allow(clippy::cast_precision_loss)]
    let total = colors.len() as f64;

    boxes(colors, palette_size)
        .iter()
        .map(|b| {
            #[allow(clippy::cast_precision_loss)]
            let frequency = b.pixel_count() as f64 / total;
            Color::new(b.average(), frequency)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn size(k: u16) -> PaletteSize {
        PaletteSize::try_from(k).unwrap()
    }

    #[test]
    fn empty_input() {
        assert!(ColorBox::new(Vec::new()).is_none());
        assert!(palette(Vec::new(), size(4)).is_empty());
    }

    #[test]
    fn box_bounds_and_volume() {
        let b = ColorBox::new(vec![Srgb::new(10, 0, 5), Srgb::new(20, 100, 5)]).unwrap();
        assert_eq!(b.min_channel(), [10, 0, 5]);
        assert_eq!(b.max_channel(), [20, 100, 5]);
        assert_eq!(b.volume(), 0);
        assert_eq!(b.dominant_channel(), 1);
        assert!(b.is_splittable());
    }

    #[test]
    fn dominant_channel_ties_go_to_lowest_index() {
        let b = ColorBox::new(vec![Srgb::new(0, 50, 0), Srgb::new(50, 0, 50)]).unwrap();
        assert_eq!(b.dominant_channel(), 0);

        let b = ColorBox::new(vec![Srgb::new(0, 0, 0), Srgb::new(0, 50, 50)]).unwrap();
        assert_eq!(b.dominant_channel(), 1);
    }

    #[test]
    fn average_rounds_to_nearest() {
        let b = ColorBox::new(vec![Srgb::new(0, 0, 0), Srgb::new(1, 2, 255), Srgb::new(1, 2, 0)])
            .unwrap();
        // means: 2/3, 4/3, 85
        assert_eq!(b.average(), Srgb::new(1, 1, 85));
    }

    #[test]
    fn split_upper_half_takes_extra_pixel() {
        let colors = vec![
            Srgb::new(40, 0, 0),
            Srgb::new(10, 0, 0),
            Srgb::new(30, 0, 0),
            Srgb::new(20, 0, 0),
            Srgb::new(0, 0, 0),
        ];
        let (lower, upper) = ColorBox::new(colors).unwrap().split().unwrap();
        assert_eq!(lower.pixel_count(), 2);
        assert_eq!(upper.pixel_count(), 3);
        assert_eq!(lower.max_channel()[0], 10);
        assert_eq!(upper.min_channel()[0], 20);
    }

    #[test]
    fn split_is_stable() {
        let colors = vec![Srgb::new(5, 1, 0), Srgb::new(5, 2, 0), Srgb::new(0, 3, 0)];
        let (lower, upper) = ColorBox::new(colors).unwrap().split().unwrap();
        assert_eq!(lower.colors, vec![Srgb::new(0, 3, 0)]);
        assert_eq!(upper.colors, vec![Srgb::new(5, 1, 0), Srgb::new(5, 2, 0)]);
    }

    #[test]
    fn single_pixel_box_cannot_split() {
        let b = ColorBox::new(vec![Srgb::new(1, 2, 3)]).unwrap();
        assert!(!b.is_splittable());
        assert!(b.split().is_err());
    }

    #[test]
    fn black_and_white() {
        let colors = vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)];
        let palette = palette(colors, size(2));
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[0], Color::new(Srgb::new(0, 0, 0), 0.5));
        assert_eq!(palette[1], Color::new(Srgb::new(255, 255, 255), 0.5));
    }

    #[test]
    fn not_enough_colors_stops_early() {
        let gray = Srgb::new(7, 7, 7);
        let red = Srgb::new(200, 10, 10);
        let mut colors = vec![gray; 50];
        colors.extend(vec![red; 30]);

        // 40 gray | 10 gray + 30 red => 40 gray | 10 gray | 10 red | 20 red
        let palette = palette(colors, size(10));
        assert_eq!(palette.len(), 4);
        assert!(palette.iter().all(|c| c.rgb() == gray || c.rgb() == red));
        assert_frequencies_sum_to_one(&palette);

        let palette = super::palette(vec![Srgb::new(1, 1, 1); 16], size(100));
        assert_eq!(palette, vec![Color::new(Srgb::new(1, 1, 1), 1.0)]);
    }

    #[test]
    fn zero_volume_boxes_still_split() {
        // a gradient along the red channel only: every box has zero volume
        let colors = (0..=255).map(|r| Srgb::new(r, 0, 0)).collect::<Vec<_>>();
        let palette = palette(colors, size(8));
        assert_eq!(palette.len(), 8);
        assert_frequencies_sum_to_one(&palette);
    }

    #[test]
    fn requested_size_and_frequency_sum() {
        let colors = test_data_1024();
        for k in [1, 5, 10, 100] {
            let palette = palette(colors.clone(), size(k));
            assert_eq!(palette.len(), usize::from(k));
            assert_frequencies_sum_to_one(&palette);
        }
    }

    #[test]
    fn largest_box_is_split_first() {
        let boxes = vec![
            ColorBox::new(vec![Srgb::new(0, 0, 0), Srgb::new(10, 10, 10)]).unwrap(),
            ColorBox::new(vec![Srgb::new(0, 0, 0), Srgb::new(20, 20, 20)]).unwrap(),
            ColorBox::new(vec![Srgb::new(0, 0, 0), Srgb::new(20, 20, 20)]).unwrap(),
            ColorBox::new(vec![Srgb::new(9, 9, 9)]).unwrap(),
        ];
        assert_eq!(largest_splittable(&boxes), Some(1));
        assert_eq!(largest_splittable(&boxes[3..]), None);
    }
}
