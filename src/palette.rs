//! The extracted palette: an ordered list of [`Color`]s and what can be done with it.

use crate::{Color, ColorSpace, ExtractError, PaletteMetadata};

use std::{fmt::Display, io, ops::Index, slice, str::FromStr, vec};

use ordered_float::OrderedFloat;
use rand::{distributions::Distribution, SeedableRng};
use rand_distr::{weighted_alias::WeightedAliasIndex, Uniform};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// The order to put palette colors in after quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SortMode {
    /// Darkest to brightest according to [`Color::luminance`].
    #[default]
    Luminance,
    /// Most to least frequent. Colors with equal frequency are ordered darkest first.
    Frequency,
}

impl SortMode {
    /// The lowercase name of the sort mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SortMode::Luminance => "luminance",
            SortMode::Frequency => "frequency",
        }
    }
}

impl Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortMode {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "luminance" => Ok(SortMode::Luminance),
            "frequency" => Ok(SortMode::Frequency),
            _ => Err(ExtractError::UnknownName { kind: "sort mode", value: s.to_owned() }),
        }
    }
}

/// How [`Palette::random_colors`] picks colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleMode {
    /// Each color is picked with probability equal to its frequency.
    #[default]
    Frequency,
    /// Every color is equally likely.
    Uniform,
}

impl FromStr for SampleMode {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frequency" => Ok(SampleMode::Frequency),
            "uniform" => Ok(SampleMode::Uniform),
            _ => Err(ExtractError::UnknownName { kind: "sample mode", value: s.to_owned() }),
        }
    }
}

/// An ordered collection of representative colors extracted from an image.
///
/// For palettes returned by extraction the frequencies sum to `1` (up to rounding error).
///
/// # Examples
/// ```
/// # use swatch::{Color, Palette, SortMode};
/// # use palette::Srgb;
/// let mut palette = Palette::new(vec![
///     Color::new(Srgb::new(250, 250, 250), 0.25),
///     Color::new(Srgb::new(10, 10, 10), 0.75),
/// ]);
///
/// palette.sort(SortMode::Luminance);
/// assert_eq!(palette[0].hex(), "#0A0A0A");
/// assert_eq!(palette.frequencies(), &[0.75, 0.25]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Palette {
    /// The colors in their current order.
    colors: Vec<Color>,
    /// The frequency of each color in `colors`, in the same order.
    frequencies: Vec<f64>,
    /// Where and how the palette was extracted, if known.
    metadata: Option<PaletteMetadata>,
}

impl Palette {
    /// Creates a new [`Palette`] holding the given colors in the given order.
    #[must_use]
    pub fn new(colors: Vec<Color>) -> Self {
        let frequencies = colors.iter().map(Color::frequency).collect();
        Self { colors, frequencies, metadata: None }
    }

    /// Attaches extraction metadata to this palette.
    #[must_use]
    pub fn with_metadata(mut self, metadata: PaletteMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The extraction metadata, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&PaletteMetadata> {
        self.metadata.as_ref()
    }

    /// The number of colors in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The colors of the palette.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// The frequency of each color, in palette order.
    #[must_use]
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Returns an iterator over the colors of the palette.
    pub fn iter(&self) -> slice::Iter<'_, Color> {
        self.colors.iter()
    }

    /// Reorders the palette according to `sort_mode`.
    ///
    /// The sort is stable, so colors that compare equal keep their relative order.
    pub fn sort(&mut self, sort_mode: SortMode) {
        let luminance = |c: &Color| OrderedFloat(c.luminance());

        match sort_mode {
            SortMode::Luminance => self.colors.sort_by_key(luminance),
            SortMode::Frequency => self.colors.sort_by(|a, b| {
                OrderedFloat(b.frequency())
                    .cmp(&OrderedFloat(a.frequency()))
                    .then_with(|| luminance(a).cmp(&luminance(b)))
            }),
        }

        self.frequencies = self.colors.iter().map(Color::frequency).collect();
    }

    /// Picks `n` colors at random (with replacement) using a generator seeded with `seed`.
    ///
    /// # Errors
    /// Returns [`ExtractError::DegeneratePalette`] if the palette is empty, or if `mode` is
    /// [`SampleMode::Frequency`] and no color has a positive frequency.
    pub fn random_colors(
        &self,
        n: usize,
        mode: SampleMode,
        seed: u64,
    ) -> Result<Vec<Color>, ExtractError> {
        if self.is_empty() {
            return Err(ExtractError::DegeneratePalette);
        }

        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);

        let colors = match mode {
            SampleMode::Frequency => {
                let distribution = WeightedAliasIndex::new(self.frequencies.clone())
                    .map_err(|_| ExtractError::DegeneratePalette)?;

                distribution
                    .sample_iter(rng)
                    .take(n)
                    .map(|i| self.colors[i])
                    .collect()
            }
            SampleMode::Uniform => Uniform::new(0, self.len())
                .sample_iter(rng)
                .take(n)
                .map(|i| self.colors[i])
                .collect(),
        };

        Ok(colors)
    }

    /// Writes the palette as CSV, one color per line.
    ///
    /// Each line holds the three channel values of the color in `colorspace`,
    /// followed by its frequency if `frequency` is `true`.
    ///
    /// # Errors
    /// Returns any error from writing to `writer`.
    pub fn write_csv(
        &self,
        mut writer: impl io::Write,
        colorspace: ColorSpace,
        frequency: bool,
    ) -> io::Result<()> {
        for color in &self.colors {
            let [a, b, c] = color.values(colorspace);
            write!(writer, "{a},{b},{c}")?;
            if frequency {
                write!(writer, ",{}", color.frequency())?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }
}

impl Index<usize> for Palette {
    type Output = Color;

    fn index(&self, index: usize) -> &Self::Output {
        &self.colors[index]
    }
}

impl IntoIterator for Palette {
    type Item = Color;
    type IntoIter = vec::IntoIter<Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a Color;
    type IntoIter = slice::Iter<'a, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

impl From<Vec<Color>> for Palette {
    fn from(colors: Vec<Color>) -> Self {
        Self::new(colors)
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;

    use serde::{Deserialize, Serialize};

    /// The serialized form of a single [`Color`].
    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct ColorEntry {
        /// The sRGB channels.
        rgb: [u8; 3],
        /// The HSV values, present if the palette was exported as HSV.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hsv: Option<[f64; 3]>,
        /// The HLS values, present if the palette was exported as HLS.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hls: Option<[f64; 3]>,
        /// The uppercase `#RRGGBB` value.
        hex: String,
        /// The fraction of pixels the color represents.
        frequency: f64,
    }

    impl ColorEntry {
        /// Records `color` for export in `colorspace`.
        fn new(color: &Color, colorspace: ColorSpace) -> Self {
            Self {
                rgb: color.components(),
                hsv: (colorspace == ColorSpace::Hsv).then(|| color.hsv()),
                hls: (colorspace == ColorSpace::Hls).then(|| color.hls()),
                hex: color.hex(),
                frequency: color.frequency(),
            }
        }
    }

    /// The serialized form of a [`Palette`].
    #[derive(Debug, Serialize, Deserialize)]
    pub(super) struct PaletteDocument {
        /// The colors in palette order.
        colors: Vec<ColorEntry>,
        /// The number of colors.
        palette_size: usize,
        /// The colorspace the colors were exported in.
        colorspace: ColorSpace,
        /// The extraction metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<PaletteMetadata>,
    }

    impl PaletteDocument {
        /// Records `palette` for export in `colorspace`.
        pub(super) fn new(palette: &Palette, colorspace: ColorSpace) -> Self {
            Self {
                colors: palette
                    .iter()
                    .map(|color| ColorEntry::new(color, colorspace))
                    .collect(),
                palette_size: palette.len(),
                colorspace,
                metadata: palette.metadata.clone(),
            }
        }

        /// Rebuilds the palette from the exported hex values and frequencies.
        pub(super) fn into_palette(self) -> Result<Palette, ExtractError> {
            let colors = self
                .colors
                .into_iter()
                .map(|entry| Color::from_hex(&entry.hex, entry.frequency))
                .collect::<Result<Vec<_>, _>>()?;

            let palette = Palette::new(colors);
            Ok(match self.metadata {
                Some(metadata) => palette.with_metadata(metadata),
                None => palette,
            })
        }
    }

    /// The serialized form of several palettes exported together.
    #[derive(Debug, Serialize)]
    pub(super) struct BatchDocument {
        /// The palettes in input order.
        pub(super) palettes: Vec<PaletteDocument>,
        /// The number of palettes.
        pub(super) total_count: usize,
        /// The colorspace the colors were exported in.
        pub(super) colorspace: ColorSpace,
    }
}

#[cfg(feature = "serde")]
impl Palette {
    /// Serializes the palette (and its metadata, if any) as pretty-printed JSON.
    ///
    /// Every color carries its `rgb` channels, `hex` value, and `frequency`.
    /// For [`ColorSpace::Hsv`] or [`ColorSpace::Hls`] an additional `hsv` or `hls` entry is included.
    ///
    /// # Errors
    /// Returns [`ExtractError::Serialization`] if serialization fails.
    pub fn to_json(&self, colorspace: ColorSpace) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(&json::PaletteDocument::new(self, colorspace))?)
    }

    /// Reads a palette previously written by [`Palette::to_json`].
    ///
    /// Colors are reconstructed from their `hex` value and `frequency`.
    ///
    /// # Errors
    /// Returns [`ExtractError::Serialization`] for malformed JSON
    /// or [`ExtractError::InvalidHex`] for a bad color value.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        serde_json::from_str::<json::PaletteDocument>(json)?.into_palette()
    }
}

/// Serializes several palettes into a single pretty-printed JSON document
/// with the keys `palettes`, `total_count`, and `colorspace`.
///
/// # Errors
/// Returns [`ExtractError::Serialization`] if serialization fails.
#[cfg(feature = "serde")]
pub fn palettes_to_json<'a>(
    palettes: impl IntoIterator<Item = &'a Palette>,
    colorspace: ColorSpace,
) -> Result<String, ExtractError> {
    let palettes = palettes
        .into_iter()
        .map(|palette| json::PaletteDocument::new(palette, colorspace))
        .collect::<Vec<_>>();

    let document = json::BatchDocument {
        total_count: palettes.len(),
        palettes,
        colorspace,
    };

    Ok(serde_json::to_string_pretty(&document)?)
}
