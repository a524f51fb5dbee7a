//! Flattens a [`Bitmap`] into the color samples that take part in quantization.

use crate::{Bitmap, ExtractError, PixelLayout};

use ::palette::{cast::ComponentsAs, Srgb, Srgba};

/// The opaque-enough pixels of an image as a flat list of sRGB samples.
///
/// A [`PixelBuffer`] is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// The samples that passed the alpha mask.
    colors: Vec<Srgb<u8>>,
    /// The number of pixels in the source image before masking.
    total_pixels: usize,
}

impl PixelBuffer {
    /// Collects the pixels of `bitmap` whose alpha value is greater than `alpha_mask_threshold`.
    ///
    /// A threshold of `None` or `Some(0)` keeps every pixel.
    /// Bitmaps without an alpha channel are never masked.
    ///
    /// # Errors
    /// Returns [`ExtractError::EmptyImage`] if the bitmap has no pixels,
    /// or [`ExtractError::EmptyAfterMask`] if every pixel was masked out.
    pub fn from_bitmap(
        bitmap: &Bitmap,
        alpha_mask_threshold: Option<u8>,
    ) -> Result<Self, ExtractError> {
        let total_pixels = bitmap.pixel_count();
        if total_pixels == 0 {
            return Err(ExtractError::EmptyImage);
        }

        let raw = bitmap.as_raw();
        let colors: Vec<Srgb<u8>> = match (bitmap.layout(), alpha_mask_threshold) {
            (PixelLayout::Rgb, _) => {
                let pixels: &[Srgb<u8>] = raw.components_as();
                pixels.to_vec()
            }
            (PixelLayout::Rgba, None | Some(0)) => {
                let pixels: &[Srgba<u8>] = raw.components_as();
                pixels.iter().map(|pixel| pixel.color).collect()
            }
            (PixelLayout::Rgba, Some(threshold)) => {
                let pixels: &[Srgba<u8>] = raw.components_as();
                let colors = pixels
                    .iter()
                    .filter(|pixel| pixel.alpha > threshold)
                    .map(|pixel| pixel.color)
                    .collect::<Vec<_>>();

                if colors.is_empty() {
                    return Err(ExtractError::EmptyAfterMask { threshold });
                }

                colors
            }
        };

        Ok(Self { colors, total_pixels })
    }

    /// Creates a [`PixelBuffer`] directly from unmasked samples.
    ///
    /// # Errors
    /// Returns [`ExtractError::EmptyImage`] if `colors` is empty.
    pub fn from_colors(colors: Vec<Srgb<u8>>) -> Result<Self, ExtractError> {
        if colors.is_empty() {
            Err(ExtractError::EmptyImage)
        } else {
            let total_pixels = colors.len();
            Ok(Self { colors, total_pixels })
        }
    }

    /// The samples that passed the alpha mask.
    #[must_use]
    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.colors
    }

    /// Consumes the buffer, returning the samples.
    #[must_use]
    pub fn into_colors(self) -> Vec<Srgb<u8>> {
        self.colors
    }

    /// The number of samples that passed the alpha mask.
    #[must_use]
    pub fn valid_pixels(&self) -> usize {
        self.colors.len()
    }

    /// The number of pixels in the source image before masking.
    #[must_use]
    pub fn total_pixels(&self) -> usize {
        self.total_pixels
    }
}
