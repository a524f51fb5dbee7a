//! A single extracted palette color and the colorspaces it can be reported in.

use crate::ExtractError;

use std::{fmt::Display, str::FromStr};

use ::palette::{cast, encoding, FromColor, Hsl, Hsv, Srgb};

/// The colorspaces a [`Color`] can be represented in when exporting a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorSpace {
    /// Red, green, and blue as integers in `0..=255`.
    #[default]
    Rgb,
    /// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
    Hsv,
    /// Hue in degrees `[0, 360)`, lightness and saturation in `[0, 1]`.
    Hls,
}

impl ColorSpace {
    /// The lowercase name of the colorspace.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ColorSpace::Rgb => "rgb",
            ColorSpace::Hsv => "hsv",
            ColorSpace::Hls => "hls",
        }
    }
}

impl Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSpace {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorSpace::Rgb),
            "hsv" => Ok(ColorSpace::Hsv),
            "hls" => Ok(ColorSpace::Hls),
            _ => Err(ExtractError::UnknownName { kind: "colorspace", value: s.to_owned() }),
        }
    }
}

/// A representative color of an image together with the fraction of pixels it stands for.
///
/// Colors are created by the quantizers and never modified afterwards.
/// Derived representations (hex, HSV, HLS, luminance) are computed on demand.
///
/// # Examples
/// ```
/// # use swatch::Color;
/// # use palette::Srgb;
/// let color = Color::new(Srgb::new(255, 128, 0), 0.25);
/// assert_eq!(color.hex(), "#FF8000");
/// assert!(color.luminance() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// The sRGB value of the color.
    rgb: Srgb<u8>,
    /// The fraction of (unmasked) pixels represented by this color.
    frequency: f64,
}

impl Color {
    /// The perceptual weights for the red, green, and blue channels used by [`Color::luminance`].
    pub const LUMINANCE_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

    /// Creates a new [`Color`] from an sRGB value and a frequency.
    #[must_use]
    pub const fn new(rgb: Srgb<u8>, frequency: f64) -> Self {
        Self { rgb, frequency }
    }

    /// Parses a `#RRGGBB` (or `RRGGBB`) hex string into a [`Color`] with the given frequency.
    ///
    /// # Errors
    /// Returns [`ExtractError::InvalidHex`] if the string is not six hex digits.
    pub fn from_hex(hex: &str, frequency: f64) -> Result<Self, ExtractError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ExtractError::InvalidHex(hex.to_owned()));
        }

        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| ExtractError::InvalidHex(hex.to_owned()))?;

        let [_, r, g, b] = value.to_be_bytes();
        Ok(Self::new(Srgb::new(r, g, b), frequency))
    }

    /// The sRGB value of this color.
    #[must_use]
    pub const fn rgb(&self) -> Srgb<u8> {
        self.rgb
    }

    /// The red, green, and blue channels as an array.
    #[must_use]
    pub fn components(&self) -> [u8; 3] {
        cast::into_array(self.rgb)
    }

    /// The fraction of pixels represented by this color, in `[0, 1]`.
    #[must_use]
    pub const fn frequency(&self) -> f64 {
        self.frequency
    }

    /// The uppercase `#RRGGBB` encoding of this color.
    #[must_use]
    pub fn hex(&self) -> String {
        let Srgb { red, green, blue, .. } = self.rgb;
        format!("#{red:02X}{green:02X}{blue:02X}")
    }

    /// The color as hue (degrees), saturation, and value.
    #[must_use]
    pub fn hsv(&self) -> [f64; 3] {
        let hsv: Hsv<encoding::Srgb, f64> = Hsv::from_color(self.rgb.into_format::<f64>());
        [hsv.hue.into_positive_degrees(), hsv.saturation, hsv.value]
    }

    /// The color as hue (degrees), lightness, and saturation.
    #[must_use]
    pub fn hls(&self) -> [f64; 3] {
        let hsl: Hsl<encoding::Srgb, f64> = Hsl::from_color(self.rgb.into_format::<f64>());
        [hsl.hue.into_positive_degrees(), hsl.lightness, hsl.saturation]
    }

    /// The weighted brightness of the color on the `0..=255` scale.
    #[must_use]
    pub fn luminance(&self) -> f64 {
        self.components()
            .iter()
            .zip(Self::LUMINANCE_WEIGHTS)
            .map(|(&c, w)| f64::from(c) * w)
            .sum()
    }

    /// The three channel values of this color in the given colorspace.
    #[must_use]
    pub fn values(&self, colorspace: ColorSpace) -> [f64; 3] {
        match colorspace {
            ColorSpace::Rgb => self.components().map(f64::from),
            ColorSpace::Hsv => self.hsv(),
            ColorSpace::Hls => self.hls(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn hex_is_uppercase_and_padded() {
        let color = Color::new(Srgb::new(10, 171, 255), 1.0);
        assert_eq!(color.hex(), "#0AABFF");
        assert_eq!(Color::from_hex("#0AABFF", 1.0).unwrap(), color);
        assert_eq!(Color::from_hex("0aabff", 1.0).unwrap(), color);
        assert!(Color::from_hex("#0AAB", 1.0).is_err());
        assert!(Color::from_hex("#0AABFG", 1.0).is_err());
    }

    #[test]
    fn luminance_weights() {
        let white = Color::new(Srgb::new(255, 255, 255), 1.0);
        assert!((white.luminance() - 255.0).abs() < EPSILON);

        let green = Color::new(Srgb::new(0, 255, 0), 1.0);
        let blue = Color::new(Srgb::new(0, 0, 255), 1.0);
        assert!(green.luminance() > blue.luminance());
    }

    #[test]
    fn hsv_and_hls_of_primaries() {
        let red = Color::new(Srgb::new(255, 0, 0), 1.0);
        let [h, s, v] = red.hsv();
        assert!(h.abs() < EPSILON);
        assert!((s - 1.0).abs() < EPSILON);
        assert!((v - 1.0).abs() < EPSILON);

        let blue = Color::new(Srgb::new(0, 0, 255), 1.0);
        let [h, l, s] = blue.hls();
        assert!((h - 240.0).abs() < 1e-6);
        assert!((l - 0.5).abs() < EPSILON);
        assert!((s - 1.0).abs() < EPSILON);
    }

    #[test]
    fn hsv_and_hls_bounds() {
        for color in crate::tests::test_data_1024() {
            let color = Color::new(color, 0.0);
            for [h, a, b] in [color.hsv(), color.hls()] {
                assert!((0.0..=360.0).contains(&h), "hue {h} out of range");
                assert!((0.0..=1.0).contains(&a));
                assert!((0.0..=1.0).contains(&b));
            }
        }
    }

    #[test]
    fn rgb_values_are_channels() {
        let color = Color::new(Srgb::new(1, 2, 3), 0.5);
        assert_eq!(color.values(ColorSpace::Rgb), [1.0, 2.0, 3.0]);
        assert_eq!("HLS".parse::<ColorSpace>().unwrap(), ColorSpace::Hls);
        assert!("lab".parse::<ColorSpace>().is_err());
    }
}
