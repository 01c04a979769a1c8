//! Bounded bisection over candidate quality.
//!
//! The search assumes candidate byte size is non-decreasing in quality. Real
//! encoders do not guarantee that for every image, so the result is the best
//! value *observed* within at most `floor(log2(n)) + 1` probes (7 for
//! 1..=100), not a proven optimum. Probes are kept on the result and checked
//! for monotonicity afterwards so a violation is visible instead of silent.

use super::template::CandidateTemplate;
use crate::fetch::{FetchError, Fetcher};
use crate::types::Dimensions;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("reference fetch failed: {0}")]
    Reference(#[source] FetchError),
    #[error("all {attempts} candidate probes failed, last: {source}")]
    NoUsableProbe {
        attempts: usize,
        #[source]
        source: FetchError,
    },
}

/// Inclusive range of candidate quality values to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRange {
    pub min: u8,
    pub max: u8,
}

impl QualityRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn is_empty(self) -> bool {
        self.min > self.max
    }

    /// Upper bound on the number of probes a bisection of this range makes.
    pub fn max_probes(self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        let len = u32::from(self.max - self.min) + 1;
        u32::BITS - len.leading_zeros()
    }
}

impl Default for QualityRange {
    fn default() -> Self {
        Self { min: 1, max: 100 }
    }
}

/// One candidate fetch: the quality asked for and the size returned.
/// `size` is `None` when the fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityProbe {
    pub quality: u8,
    pub size: Option<u64>,
}

/// The closest candidate seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityMatch {
    pub quality: u8,
    pub size: u64,
    /// `|size - reference_size|`
    pub difference: u64,
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityResult {
    /// `None` when the range was empty and nothing was probed.
    pub best: Option<QualityMatch>,
    pub reference_size: u64,
    /// Probes in the order they were made.
    pub probes: Vec<QualityProbe>,
    /// Whether successful probes had size non-decreasing in quality.
    pub monotonic: bool,
}

impl QualityResult {
    pub fn best_quality(&self) -> Option<u8> {
        self.best.map(|m| m.quality)
    }

    pub fn difference(&self) -> Option<u64> {
        self.best.map(|m| m.difference)
    }
}

fn sizes_are_monotonic(probes: &[QualityProbe]) -> bool {
    let mut observed: Vec<(u8, u64)> = probes
        .iter()
        .filter_map(|p| p.size.map(|s| (p.quality, s)))
        .collect();
    observed.sort_by_key(|&(quality, _)| quality);
    observed.windows(2).all(|w| w[0].1 <= w[1].1)
}

/// Bisect `range` for the quality whose probed size is closest to
/// `reference_size`.
///
/// The first strictly smaller difference wins, so on ties the value probed
/// earlier is kept regardless of magnitude. A failed probe narrows toward
/// lower quality; if every probe fails the search fails with
/// [`JobError::NoUsableProbe`].
pub fn bisect_quality<F>(
    range: QualityRange,
    reference_size: u64,
    mut probe: F,
) -> Result<QualityResult, JobError>
where
    F: FnMut(u8) -> Result<u64, FetchError>,
{
    let mut low = i32::from(range.min);
    let mut high = i32::from(range.max);
    let mut best: Option<QualityMatch> = None;
    let mut probes = Vec::new();
    let mut last_error = None;

    while low <= high {
        let mid = (low + high) / 2;
        let quality = mid as u8;

        match probe(quality) {
            Ok(size) => {
                probes.push(QualityProbe {
                    quality,
                    size: Some(size),
                });
                let difference = size.abs_diff(reference_size);
                let improves = match best {
                    Some(current) => difference < current.difference,
                    None => true,
                };
                if improves {
                    best = Some(QualityMatch {
                        quality,
                        size,
                        difference,
                    });
                }
                if size < reference_size {
                    low = mid + 1;
                } else {
                    high = mid - 1;
                }
            }
            Err(e) => {
                probes.push(QualityProbe {
                    quality,
                    size: None,
                });
                last_error = Some(e);
                high = mid - 1;
            }
        }
    }

    if let (None, Some(source)) = (best, last_error) {
        return Err(JobError::NoUsableProbe {
            attempts: probes.len(),
            source,
        });
    }

    let monotonic = sizes_are_monotonic(&probes);
    Ok(QualityResult {
        best,
        reference_size,
        probes,
        monotonic,
    })
}

/// Size in bytes of the reference rendition. One fetch, never retried.
pub fn measure_reference_size(fetcher: &impl Fetcher, url: &str) -> Result<u64, FetchError> {
    fetcher.body_len(url)
}

/// Fetch the reference rendition, then bisect the candidate pipeline's
/// quality for `image_path` at `size`.
pub fn search_quality(
    fetcher: &impl Fetcher,
    reference_url: &str,
    candidate: &CandidateTemplate,
    size: Dimensions,
    image_path: &str,
    range: QualityRange,
) -> Result<QualityResult, JobError> {
    let reference_size =
        measure_reference_size(fetcher, reference_url).map_err(JobError::Reference)?;
    tracing::debug!(
        image = image_path,
        size = %size,
        reference_size,
        "Measured reference"
    );

    let result = bisect_quality(range, reference_size, |quality| {
        let url = candidate.render(image_path, size, quality);
        match fetcher.body_len(&url) {
            Ok(bytes) => {
                tracing::debug!(image = image_path, size = %size, quality, bytes, "Probe");
                Ok(bytes)
            }
            Err(e) => {
                tracing::warn!(image = image_path, size = %size, quality, error = %e, "Probe failed");
                Err(e)
            }
        }
    })?;

    if !result.monotonic {
        tracing::warn!(
            image = image_path,
            size = %size,
            probes = ?result.probes,
            "Candidate size is not monotonic in quality; best match is the best observed"
        );
    }
    Ok(result)
}
