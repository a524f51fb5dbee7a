//! Extracting palettes from many images at once.

use super::extract::{extract_from_source, ExtractOptions};
use crate::{ExtractError, ImageSource, Palette};

use log::{debug, warn};

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The outcome of extracting a palette from one image of a batch.
#[derive(Debug)]
pub struct BatchResult {
    /// The description of the source.
    source: String,
    /// The palette, or why it could not be extracted.
    result: Result<Palette, ExtractError>,
}

impl BatchResult {
    /// The description of the source this result is for.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether a palette was extracted.
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// The extracted palette, if any.
    #[must_use]
    pub fn palette(&self) -> Option<&Palette> {
        self.result.as_ref().ok()
    }

    /// The error that occurred, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ExtractError> {
        self.result.as_ref().err()
    }

    /// Consumes the result, returning the palette or the error.
    #[allow(clippy::missing_errors_doc)]
    pub fn into_result(self) -> Result<Palette, ExtractError> {
        self.result
    }
}

/// Extracts a palette from a single source, logging failures.
fn extract_one(source: ImageSource, options: &ExtractOptions) -> BatchResult {
    let description = source.describe();
    let result = extract_from_source(source, options);
    if let Err(err) = &result {
        warn!("failed to extract a palette from {description}: {err}");
    }

    BatchResult { source: description, result }
}

/// Extracts a palette from each source sequentially.
fn extract_sequential(sources: Vec<ImageSource>, options: &ExtractOptions) -> Vec<BatchResult> {
    sources
        .into_iter()
        .map(|source| extract_one(source, options))
        .collect()
}

/// Extracts a palette from each source on a rayon thread pool of the configured size.
#[cfg(feature = "threads")]
fn extract_parallel(sources: Vec<ImageSource>, options: &ExtractOptions) -> Vec<BatchResult> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
    {
        Ok(pool) => pool.install(|| {
            sources
                .into_par_iter()
                .map(|source| extract_one(source, options))
                .collect()
        }),
        Err(err) => {
            warn!("could not start a thread pool, extracting sequentially: {err}");
            extract_sequential(sources, options)
        }
    }
}

/// Extracts a palette from every source.
///
/// Each source is handled independently: a failure for one source is recorded in its
/// [`BatchResult`] and does not affect the others. Results are returned in input order.
///
/// With the `threads` feature, sources are processed in parallel using
/// [`ExtractOptions::threads`] worker threads. Otherwise they are processed one after another.
/// Either way, the results are the same.
#[must_use]
pub fn batch_extract_colors<S>(
    sources: impl IntoIterator<Item = S>,
    options: &ExtractOptions,
) -> Vec<BatchResult>
where
    S: Into<ImageSource>,
{
    let sources = sources.into_iter().map(Into::into).collect::<Vec<_>>();
    let count = sources.len();

    #[cfg(feature = "threads")]
    let results = extract_parallel(sources, options);

    #[cfg(not(feature = "threads"))]
    let results = extract_sequential(sources, options);

    let failed = results.iter().filter(|result| !result.success()).count();
    debug!("batch extraction finished: {} of {count} succeeded", count - failed);

    results
}
