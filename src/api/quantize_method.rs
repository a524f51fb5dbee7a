//! Contains the builder structs for the supported quantization methods.

use crate::ExtractError;

use std::{fmt::Display, str::FromStr};

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use swatch::KmeansOptions;
/// let options = KmeansOptions::new()
///     .max_iterations(50)
///     .seed(42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KmeansOptions {
    /// The seed value for the random number generator.
    pub(crate) seed: u64,
    /// The maximum number of Lloyd iterations.
    pub(crate) max_iterations: u32,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// The default seed value.
    pub const DEFAULT_SEED: u64 = 2024;

    /// The default iteration cap.
    pub const DEFAULT_MAX_ITERATIONS: u32 = 300;

    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the seed value for the random number generator used to pick the initial centroids.
    ///
    /// The default seed is `2024`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the maximum number of assignment and update rounds to run.
    ///
    /// K-means stops earlier if no color changes cluster between two rounds.
    /// A value of `0` is treated as `1`.
    ///
    /// The default is `300`.
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns the current seed.
    #[must_use]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Returns the current iteration cap.
    #[must_use]
    pub const fn get_max_iterations(&self) -> u32 {
        self.max_iterations
    }
}

/// The set of supported color quantization methods.
///
/// Methods can also be parsed from their names:
/// `"MC"` or `"MedianCut"` for median cut, and `"KM"` or `"KMeans"` for k-means (case-insensitive).
///
/// # Examples
/// ```
/// # use swatch::QuantizeMethod;
/// let method: QuantizeMethod = "mc".parse().unwrap();
/// assert_eq!(method, QuantizeMethod::MedianCut);
/// assert!("octree".parse::<QuantizeMethod>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantizeMethod {
    /// Median cut: recursively split the box of colors with the largest volume.
    ///
    /// See the [`median_cut`](crate::median_cut) module for more details.
    MedianCut,
    /// Color quantization using k-means clustering.
    ///
    /// This method is slower than median cut but its colors better match the image.
    ///
    /// See the [`kmeans`](crate::kmeans) module for more details.
    Kmeans(KmeansOptions),
}

impl Default for QuantizeMethod {
    fn default() -> Self {
        Self::kmeans()
    }
}

impl QuantizeMethod {
    /// Creates a new [`QuantizeMethod::Kmeans`] with the default [`KmeansOptions`].
    #[must_use]
    pub const fn kmeans() -> Self {
        Self::Kmeans(KmeansOptions::new())
    }

    /// The name of the method as reported in palette metadata.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            QuantizeMethod::MedianCut => "MedianCut",
            QuantizeMethod::Kmeans(_) => "KMeans",
        }
    }
}

impl From<KmeansOptions> for QuantizeMethod {
    fn from(options: KmeansOptions) -> Self {
        Self::Kmeans(options)
    }
}

impl Display for QuantizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuantizeMethod {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mc" | "mediancut" | "median_cut" => Ok(Self::MedianCut),
            "km" | "kmeans" | "k-means" => Ok(Self::kmeans()),
            _ => Err(ExtractError::UnsupportedMode(s.to_owned())),
        }
    }
}
