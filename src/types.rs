//! Contains various types needed across the crate.

use std::fmt::Display;

use thiserror::Error;

/// The number of colors extracted when no palette size is given.
pub const DEFAULT_PALETTE_SIZE: u16 = 5;

/// The errors that can occur while extracting a palette.
///
/// Conditions that only shrink the resulting palette (e.g., clusters that end up empty
/// or median cut boxes that cannot be split any further) are not errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The image has a width or height of zero.
    #[error("image has no pixels")]
    EmptyImage,

    /// No pixel passed the alpha mask.
    #[error("no pixels left after masking pixels with alpha <= {threshold}")]
    EmptyAfterMask {
        /// The alpha threshold that was used.
        threshold: u8,
    },

    /// The raw pixel buffer does not match the given dimensions and layout.
    #[error("pixel buffer length {len} does not match {width}x{height} with {channels} channels")]
    DimensionMismatch {
        /// The length of the provided buffer.
        len: usize,
        /// The image width.
        width: u32,
        /// The image height.
        height: u32,
        /// The number of channels per pixel.
        channels: usize,
    },

    /// A palette size of zero was requested.
    #[error("palette size must be at least 1")]
    ZeroPaletteSize,

    /// An extraction method other than median cut or k-means was requested.
    #[error("unsupported extraction mode `{0}`, expected one of: MC, MedianCut, KM, KMeans")]
    UnsupportedMode(String),

    /// An unknown sort mode, sample mode, or colorspace name was given.
    #[error("unknown {kind} `{value}`")]
    UnknownName {
        /// What kind of name was being parsed.
        kind: &'static str,
        /// The value that could not be parsed.
        value: String,
    },

    /// Quantization produced no colors at all.
    #[error("quantization produced an empty palette")]
    DegeneratePalette,

    /// A hex color string could not be parsed.
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),

    /// The image could not be decoded.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// The image source could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A palette could not be serialized or deserialized.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ExtractError {
    /// Whether this error was caused by the input image itself
    /// (as opposed to a failure to read or decode the source).
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyImage
                | Self::EmptyAfterMask { .. }
                | Self::DimensionMismatch { .. }
                | Self::DegeneratePalette
        )
    }
}

/// This type is used to specify the (maximum) number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it is not zero.
///
/// # Examples
/// Use `try_into` or [`PaletteSize::from_clamped`] to create [`PaletteSize`]s.
///
/// ```
/// # use swatch::{ExtractError, PaletteSize};
/// # fn main() -> Result<(), ExtractError> {
/// let size = PaletteSize::try_from(8u16)?;
/// let size: PaletteSize = 8u16.try_into()?;
/// let size = PaletteSize::from_clamped(0);
/// assert_eq!(size.into_inner(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u16", into = "u16"))]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The smallest supported palette size.
    pub const MIN: Self = Self(1);

    /// The largest supported palette size.
    pub const MAX: Self = Self(u16::MAX);

    /// The palette size used when none is given.
    pub const DEFAULT: Self = Self(DEFAULT_PALETTE_SIZE);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Gets the inner value as a `usize` for lengths and capacities.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Creates a [`PaletteSize`] by clamping the given `u16` to be at least `1`.
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value == 0 {
            Self::MIN
        } else {
            Self(value)
        }
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = ExtractError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(ExtractError::ZeroPaletteSize)
        } else {
            Ok(Self(value))
        }
    }
}

impl TryFrom<u8> for PaletteSize {
    type Error = ExtractError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        u16::from(value).try_into()
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}
