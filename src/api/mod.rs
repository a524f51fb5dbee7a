//! Contains the options and entry points of the high level extraction API.

mod batch;
mod extract;
mod metadata;
mod quantize_method;

pub use batch::{batch_extract_colors, BatchResult};
pub use extract::{extract_colors, extract_from_source, ExtractOptions, RESIZE_DIMENSIONS};
pub use metadata::{ExtractionParams, ImageInfo, PaletteMetadata, ProcessingStats};
pub use quantize_method::{KmeansOptions, QuantizeMethod};
