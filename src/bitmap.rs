//! Decoded images and the sources they can be loaded from.

use crate::ExtractError;

use std::{
    fmt::Display,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{
    imageops::{self, FilterType},
    DynamicImage, ImageFormat, ImageReader, Rgba, Rgba32FImage, RgbImage, RgbaImage,
};

/// The channel layout of a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelLayout {
    /// Three interleaved channels: red, green, blue.
    #[cfg_attr(feature = "serde", serde(rename = "RGB"))]
    Rgb,
    /// Four interleaved channels: red, green, blue, alpha.
    #[cfg_attr(feature = "serde", serde(rename = "RGBA"))]
    Rgba,
}

impl PixelLayout {
    /// The number of bytes per pixel.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }

    /// Whether the layout carries an alpha channel.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelLayout::Rgba)
    }
}

impl Display for PixelLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PixelLayout::Rgb => "RGB",
            PixelLayout::Rgba => "RGBA",
        })
    }
}

/// The pixel storage of a [`Bitmap`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pixels {
    /// 8-bit RGB pixels.
    Rgb(RgbImage),
    /// 8-bit RGBA pixels.
    Rgba(RgbaImage),
}

/// A decoded image: its dimensions, channel layout, and raw interleaved bytes.
///
/// This is the input handed to [`extract_colors`](crate::extract_colors).
/// Use [`Bitmap::new`] for raw buffers, or convert from the `image` crate's buffer types.
///
/// # Examples
/// ```
/// # use swatch::{Bitmap, PixelLayout, ExtractError};
/// # fn main() -> Result<(), ExtractError> {
/// let bitmap = Bitmap::new(2, 1, PixelLayout::Rgb, vec![0, 0, 0, 255, 255, 255])?;
/// assert_eq!(bitmap.dimensions(), (2, 1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap(Pixels);

impl Bitmap {
    /// Creates a [`Bitmap`] from raw interleaved bytes.
    ///
    /// # Errors
    /// Returns [`ExtractError::DimensionMismatch`] if `data` does not hold exactly
    /// `width * height` pixels of the given layout.
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, ExtractError> {
        let mismatch = |len| ExtractError::DimensionMismatch {
            len,
            width,
            height,
            channels: layout.channels(),
        };

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(layout.channels()));

        if expected != Some(data.len()) {
            return Err(mismatch(data.len()));
        }

        let len = data.len();
        let pixels = match layout {
            PixelLayout::Rgb => RgbImage::from_raw(width, height, data).map(Pixels::Rgb),
            PixelLayout::Rgba => RgbaImage::from_raw(width, height, data).map(Pixels::Rgba),
        };

        pixels.map(Self).ok_or_else(|| mismatch(len))
    }

    /// The width and height of the image.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match &self.0 {
            Pixels::Rgb(image) => image.dimensions(),
            Pixels::Rgba(image) => image.dimensions(),
        }
    }

    /// The number of pixels in the image.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        let (width, height) = self.dimensions();
        width as usize * height as usize
    }

    /// The channel layout of the raw bytes.
    #[must_use]
    pub fn layout(&self) -> PixelLayout {
        match &self.0 {
            Pixels::Rgb(_) => PixelLayout::Rgb,
            Pixels::Rgba(_) => PixelLayout::Rgba,
        }
    }

    /// The raw interleaved bytes, row-major.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        match &self.0 {
            Pixels::Rgb(image) => image.as_raw(),
            Pixels::Rgba(image) => image.as_raw(),
        }
    }

    /// Returns a copy of the image resampled to exactly `width` by `height` pixels.
    ///
    /// A Catmull-Rom (bicubic) filter is used. The layout is preserved.
    /// RGBA images are resampled with premultiplied alpha, so the color of
    /// fully transparent pixels does not bleed into their neighbors.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        const FILTER: FilterType = FilterType::CatmullRom;

        Self(match &self.0 {
            Pixels::Rgb(image) => Pixels::Rgb(imageops::resize(image, width, height, FILTER)),
            Pixels::Rgba(image) => Pixels::Rgba(resize_premultiplied(image, width, height, FILTER)),
        })
    }
}

/// Resamples an RGBA image in premultiplied alpha.
fn resize_premultiplied(
    image: &RgbaImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> RgbaImage {
    let premultiplied = Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });

    let resized = imageops::resize(&premultiplied, width, height, filter);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let a = a.clamp(0.0, 1.0);
        let unmultiply = |c: f32| if a > 0.0 { c / a } else { 0.0 };
        Rgba([to_u8(unmultiply(r)), to_u8(unmultiply(g)), to_u8(unmultiply(b)), to_u8(a)])
    })
}

impl From<RgbImage> for Bitmap {
    fn from(image: RgbImage) -> Self {
        Self(Pixels::Rgb(image))
    }
}

impl From<RgbaImage> for Bitmap {
    fn from(image: RgbaImage) -> Self {
        Self(Pixels::Rgba(image))
    }
}

impl From<DynamicImage> for Bitmap {
    /// Converts to 8-bit RGB, or 8-bit RGBA if the image has an alpha channel.
    fn from(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            image.into_rgba8().into()
        } else {
            image.into_rgb8().into()
        }
    }
}

/// The kind of source an image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SourceType {
    /// A path to an encoded image file.
    FilePath,
    /// An in-memory encoded image.
    Bytes,
    /// An already decoded bitmap.
    Bitmap,
}

/// Where to load an image from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An encoded image file on disk.
    Path(PathBuf),
    /// An encoded image held in memory.
    Bytes(Vec<u8>),
    /// An already decoded image.
    Bitmap(Bitmap),
}

/// A decoded image together with the encoding it was decoded from (if known).
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The decoded pixels.
    pub bitmap: Bitmap,
    /// The encoding of the source, if the source was encoded.
    pub format: Option<ImageFormat>,
}

impl ImageSource {
    /// The kind of this source.
    #[must_use]
    pub fn source_type(&self) -> SourceType {
        match self {
            ImageSource::Path(_) => SourceType::FilePath,
            ImageSource::Bytes(_) => SourceType::Bytes,
            ImageSource::Bitmap(_) => SourceType::Bitmap,
        }
    }

    /// A short human readable description of this source.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<bytes: {} bytes>", bytes.len()),
            ImageSource::Bitmap(bitmap) => {
                let (width, height) = bitmap.dimensions();
                format!("<bitmap: {width}x{height} {}>", bitmap.layout())
            }
        }
    }

    /// Reads and decodes the image.
    ///
    /// # Errors
    /// Returns [`ExtractError::Io`] if a file could not be read,
    /// or [`ExtractError::Image`] if the data could not be decoded.
    pub fn decode(self) -> Result<DecodedImage, ExtractError> {
        match self {
            ImageSource::Path(path) => decode_path(&path),
            ImageSource::Bytes(bytes) => {
                let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
                let format = reader.format();
                let bitmap = reader.decode()?.into();
                Ok(DecodedImage { bitmap, format })
            }
            ImageSource::Bitmap(bitmap) => Ok(DecodedImage { bitmap, format: None }),
        }
    }
}

/// Decodes an image file, guessing the format from its contents if the extension is unknown.
fn decode_path(path: &Path) -> Result<DecodedImage, ExtractError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let bitmap = reader.decode()?.into();
    Ok(DecodedImage { bitmap, format })
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Bitmap> for ImageSource {
    fn from(bitmap: Bitmap) -> Self {
        Self::Bitmap(bitmap)
    }
}

/// The uppercase name of an image format, e.g. `PNG`.
#[must_use]
pub fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map_or_else(|| "UNKNOWN".to_owned(), |ext| ext.to_ascii_uppercase())
}
