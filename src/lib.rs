//! A library for extracting small, representative color palettes from images.
//!
//! `swatch` reduces an image to a handful of colors, each weighted by the fraction of pixels
//! it stands for. Two quantization methods are available:
//! - [median cut](median_cut), which recursively splits the box of colors with the largest volume.
//! - [k-means](kmeans), which clusters the colors around centroids seeded by k-means++.
//!
//! # Features
//! `swatch` has several `cargo` features that can be turned off or on:
//! - `threads`: runs [`batch_extract_colors`] in parallel via [`rayon`].
//! - `serde`: adds JSON export and import of palettes and their metadata.
//! - `cli`: builds the `swatch` command line tool.
//!
//! # High-Level API
//! To get started, see [`extract_from_source`] and [`ExtractOptions`]:
//! ```no_run
//! # use swatch::{extract_from_source, ExtractOptions, QuantizeMethod, SortMode, PaletteSize};
//! # use std::path::Path;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ExtractOptions::new()
//!     .palette_size(PaletteSize::try_from(8u16)?) // set the max number of colors in the palette
//!     .quantize_method(QuantizeMethod::MedianCut)
//!     .sort_mode(Some(SortMode::Frequency)) // most common colors first
//!     .alpha_mask_threshold(Some(127)); // ignore mostly transparent pixels
//!
//! let palette = extract_from_source(Path::new("some image"), &options)?;
//! for color in &palette {
//!     println!("{} {:.3}", color.hex(), color.frequency());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The quantizers themselves are also public and work on plain `Srgb<u8>` slices,
//! see [`median_cut::palette`] and [`kmeans::palette`].

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod bitmap;
mod color;
mod color_counts;
mod palette;
mod pixels;
mod types;

pub mod kmeans;
pub mod median_cut;

pub use api::*;
pub use bitmap::{format_name, Bitmap, DecodedImage, ImageSource, PixelLayout, SourceType};
pub use color::{Color, ColorSpace};
pub use color_counts::UniqueColorCounts;
pub use pixels::PixelBuffer;
pub use types::*;

pub use self::palette::{Palette, SampleMode, SortMode};

#[cfg(feature = "serde")]
pub use self::palette::palettes_to_json;
