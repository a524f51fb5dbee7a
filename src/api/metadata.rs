//! Describes where a palette came from and how it was extracted.

use crate::{PixelLayout, QuantizeMethod, SortMode, SourceType};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The extraction options a palette was produced with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractionParams {
    /// The requested number of colors.
    pub palette_size: u16,
    /// The quantization method name: `"MedianCut"` or `"KMeans"`.
    pub mode: String,
    /// The k-means seed, if k-means was used.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub seed: Option<u64>,
    /// The sort mode applied to the palette, if any.
    pub sort_mode: Option<SortMode>,
    /// Whether the image was downsampled before quantization.
    pub resize: bool,
    /// The alpha threshold used to mask out transparent pixels, if any.
    pub alpha_mask_threshold: Option<u8>,
}

impl ExtractionParams {
    /// Records the given options.
    #[must_use]
    pub fn new(
        palette_size: u16,
        method: &QuantizeMethod,
        sort_mode: Option<SortMode>,
        resize: bool,
        alpha_mask_threshold: Option<u8>,
    ) -> Self {
        let seed = match method {
            QuantizeMethod::MedianCut => None,
            QuantizeMethod::Kmeans(options) => Some(options.get_seed()),
        };

        Self {
            palette_size,
            mode: method.name().to_owned(),
            seed,
            sort_mode,
            resize,
            alpha_mask_threshold,
        }
    }
}

/// The source image as seen by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageInfo {
    /// `(width, height)` of the decoded image.
    pub original_size: (u32, u32),
    /// `(width, height)` of the image after the optional resize.
    pub processed_size: (u32, u32),
    /// The encoded format (e.g., `"PNG"`), if the image was decoded from a file or bytes.
    pub format: Option<String>,
    /// The channel layout of the decoded pixels.
    pub mode: PixelLayout,
    /// Whether the decoded pixels carry an alpha channel.
    pub has_alpha: bool,
}

/// Pixel counts and timing for a single extraction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessingStats {
    /// The number of pixels that went into the alpha mask.
    pub total_pixels: usize,
    /// The number of pixels that passed the alpha mask.
    pub valid_pixels: usize,
    /// Wall-clock time spent on the extraction in seconds.
    pub extraction_time: f64,
    /// When the extraction finished, as an RFC 3339 UTC timestamp (e.g., `2024-01-31T12:00:00Z`).
    pub timestamp: String,
}

impl ProcessingStats {
    /// Creates stats for an extraction that took `elapsed` and finished just now.
    #[must_use]
    pub fn new(total_pixels: usize, valid_pixels: usize, elapsed: Duration) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| since.as_secs());
        let timestamp = rfc3339(timestamp);

        Self {
            total_pixels,
            valid_pixels,
            extraction_time: elapsed.as_secs_f64(),
            timestamp,
        }
    }
}

/// Formats seconds since the Unix epoch as an RFC 3339 UTC timestamp.
fn rfc3339(secs: u64) -> String {
    let (year, month, day) = civil_from_days(secs / 86_400);
    let time = secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        time / 3600,
        time % 3600 / 60,
        time % 60
    )
}

/// Converts days since 1970-01-01 to a proleptic Gregorian `(year, month, day)`.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    // shift the epoch to 0000-03-01 so leap days fall at the end of each year
    let z = days + 719_468;
    let era = z / 146_097;
    let day_of_era = z % 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = era * 400 + year_of_era + u64::from(month <= 2);
    (year, month, day)
}

/// Everything known about how a [`Palette`](crate::Palette) was made.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaletteMetadata {
    /// A short human readable description of the source (e.g., the file path).
    pub image_source: String,
    /// What kind of source the image came from.
    pub source_type: SourceType,
    /// The options used for extraction.
    pub extraction_params: ExtractionParams,
    /// The dimensions and format of the image.
    pub image_info: ImageInfo,
    /// Pixel counts and timing.
    pub processing_stats: ProcessingStats,
}
