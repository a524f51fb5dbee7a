//! Single image extraction: options and entry points.

use super::metadata::{ExtractionParams, ImageInfo, PaletteMetadata, ProcessingStats};
use crate::{
    bitmap::format_name, kmeans, median_cut, Bitmap, DecodedImage, ExtractError, ImageSource,
    Palette, PaletteSize, PixelBuffer, QuantizeMethod, SortMode, UniqueColorCounts,
};

use std::time::Instant;

use log::debug;

/// The `(width, height)` images are downsampled to before quantization when resizing is on.
pub const RESIZE_DIMENSIONS: (u32, u32) = (256, 256);

/// A builder struct to specify the parameters for palette extraction.
///
/// # Examples
/// ```
/// # use swatch::{ExtractOptions, QuantizeMethod, SortMode, PaletteSize};
/// # fn main() -> Result<(), swatch::ExtractError> {
/// let options = ExtractOptions::new()
///     .palette_size(PaletteSize::try_from(8u16)?)
///     .quantize_method(QuantizeMethod::MedianCut)
///     .sort_mode(Some(SortMode::Frequency))
///     .alpha_mask_threshold(Some(128));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// The (maximum) number of colors to extract.
    pub(crate) palette_size: PaletteSize,
    /// Whether to downsample the image to [`RESIZE_DIMENSIONS`] first.
    pub(crate) resize: bool,
    /// The quantization method to use.
    pub(crate) quantize_method: QuantizeMethod,
    /// The order to put the palette in, or `None` to keep the quantizer's order.
    pub(crate) sort_mode: Option<SortMode>,
    /// Pixels with an alpha value at or below this threshold are ignored.
    pub(crate) alpha_mask_threshold: Option<u8>,
    /// The number of worker threads for batch extraction. `0` lets rayon decide.
    pub(crate) threads: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Creates a new [`ExtractOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            palette_size: PaletteSize::DEFAULT,
            resize: true,
            quantize_method: QuantizeMethod::kmeans(),
            sort_mode: Some(SortMode::Luminance),
            alpha_mask_threshold: None,
            threads: 0,
        }
    }

    /// Sets the (maximum) number of colors to extract.
    ///
    /// The default palette size is `5`.
    #[must_use]
    pub const fn palette_size(mut self, palette_size: PaletteSize) -> Self {
        self.palette_size = palette_size;
        self
    }

    /// Sets whether to downsample the image to [`RESIZE_DIMENSIONS`] before quantization.
    ///
    /// Resizing makes extraction much faster for large images. The default is `true`.
    #[must_use]
    pub const fn resize(mut self, resize: bool) -> Self {
        self.resize = resize;
        self
    }

    /// Sets the quantization method. The default is k-means with the default [`KmeansOptions`](crate::KmeansOptions).
    #[must_use]
    pub const fn quantize_method(mut self, quantize_method: QuantizeMethod) -> Self {
        self.quantize_method = quantize_method;
        self
    }

    /// Sets the order of the resulting palette. The default is [`SortMode::Luminance`].
    #[must_use]
    pub const fn sort_mode(mut self, sort_mode: Option<SortMode>) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    /// Sets the alpha threshold: only pixels with an alpha value greater than this take part.
    ///
    /// `None` or `Some(0)` keeps every pixel. The default is `None`.
    #[must_use]
    pub const fn alpha_mask_threshold(mut self, alpha_mask_threshold: Option<u8>) -> Self {
        self.alpha_mask_threshold = alpha_mask_threshold;
        self
    }

    /// Sets the number of worker threads used by
    /// [`batch_extract_colors`](crate::batch_extract_colors).
    ///
    /// The default is `0`, which uses the number of available CPUs.
    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Records these options for palette metadata.
    fn params(&self) -> ExtractionParams {
        ExtractionParams::new(
            self.palette_size.into_inner(),
            &self.quantize_method,
            self.sort_mode,
            self.resize,
            self.alpha_mask_threshold,
        )
    }
}

/// A palette along with the numbers that went into it.
struct Extraction {
    /// The sorted palette.
    palette: Palette,
    /// The dimensions after the optional resize.
    processed_size: (u32, u32),
    /// The number of pixels before masking.
    total_pixels: usize,
    /// The number of pixels after masking.
    valid_pixels: usize,
}

/// Runs the resize, mask, quantize, and sort steps.
fn extract(bitmap: &Bitmap, options: &ExtractOptions) -> Result<Extraction, ExtractError> {
    if bitmap.pixel_count() == 0 {
        return Err(ExtractError::EmptyImage);
    }

    let resized;
    let bitmap = if options.resize {
        let (width, height) = RESIZE_DIMENSIONS;
        resized = bitmap.resized(width, height);
        &resized
    } else {
        bitmap
    };

    let pixels = PixelBuffer::from_bitmap(bitmap, options.alpha_mask_threshold)?;
    let total_pixels = pixels.total_pixels();
    let valid_pixels = pixels.valid_pixels();

    debug!(
        "quantizing {valid_pixels} of {total_pixels} pixels into {} colors using {}",
        options.palette_size, options.quantize_method
    );

    let colors = match &options.quantize_method {
        QuantizeMethod::MedianCut => median_cut::palette(pixels.into_colors(), options.palette_size),
        QuantizeMethod::Kmeans(kmeans_options) => {
            let color_counts = UniqueColorCounts::new(pixels.colors());
            kmeans::palette(&color_counts, options.palette_size, kmeans_options)
        }
    };

    if colors.is_empty() {
        return Err(ExtractError::DegeneratePalette);
    }

    let mut palette = Palette::new(colors);
    if let Some(sort_mode) = options.sort_mode {
        palette.sort(sort_mode);
    }

    Ok(Extraction {
        palette,
        processed_size: bitmap.dimensions(),
        total_pixels,
        valid_pixels,
    })
}

/// Extracts a color palette from a decoded image.
///
/// The returned palette has at most `palette_size` colors whose frequencies sum to `1`.
/// No metadata is attached; see [`extract_from_source`] for that.
///
/// # Errors
/// Returns [`ExtractError::EmptyImage`] if the bitmap has no pixels, or
/// [`ExtractError::EmptyAfterMask`] if no pixel passes the alpha mask.
///
/// # Examples
/// ```
/// # use swatch::{extract_colors, Bitmap, ExtractOptions, PixelLayout, PaletteSize};
/// # fn main() -> Result<(), swatch::ExtractError> {
/// let data = [255, 0, 0].repeat(100 * 100);
/// let bitmap = Bitmap::new(100, 100, PixelLayout::Rgb, data)?;
///
/// let palette = extract_colors(&bitmap, &ExtractOptions::new().palette_size(PaletteSize::MIN))?;
/// assert_eq!(palette.len(), 1);
/// assert_eq!(palette[0].hex(), "#FF0000");
/// # Ok(())
/// # }
/// ```
pub fn extract_colors(bitmap: &Bitmap, options: &ExtractOptions) -> Result<Palette, ExtractError> {
    extract(bitmap, options).map(|extraction| extraction.palette)
}

/// Loads an image from a file, encoded bytes, or a bitmap and extracts its color palette.
///
/// The returned palette carries [`PaletteMetadata`] describing the source and the extraction.
///
/// # Errors
/// Returns [`ExtractError::Io`] or [`ExtractError::Image`] if the source could not be loaded,
/// and otherwise the same errors as [`extract_colors`].
pub fn extract_from_source(
    source: impl Into<ImageSource>,
    options: &ExtractOptions,
) -> Result<Palette, ExtractError> {
    let start = Instant::now();

    let source = source.into();
    let image_source = source.describe();
    let source_type = source.source_type();

    let DecodedImage { bitmap, format } = source.decode()?;
    let Extraction {
        palette,
        processed_size,
        total_pixels,
        valid_pixels,
    } = extract(&bitmap, options)?;

    let layout = bitmap.layout();
    let metadata = PaletteMetadata {
        image_source,
        source_type,
        extraction_params: options.params(),
        image_info: ImageInfo {
            original_size: bitmap.dimensions(),
            processed_size,
            format: format.map(format_name),
            mode: layout,
            has_alpha: layout.has_alpha(),
        },
        processing_stats: ProcessingStats::new(total_pixels, valid_pixels, start.elapsed()),
    };

    Ok(palette.with_metadata(metadata))
}
