//! Quality-parity search between two image delivery pipelines.
//!
//! For every configured image and target size, fetch the reference
//! rendition once and then bisect the candidate pipeline's quality knob to
//! find the value whose output size is closest in bytes.
//!
//! - **Templates**: how each pipeline spells "this image at this size"
//! - **Bisect**: the per-(image, size) search, see [`search_quality`]
//! - **Batch**: fan-out over a bounded worker pool, see [`run_batch`]

pub mod batch;
pub mod bisect;
pub mod template;

pub use batch::{
    BatchError, DimensionOutcome, ImageJob, JobOutcome, JobReport, SearchEvent, run_batch,
    run_job,
};
pub use bisect::{
    JobError, QualityMatch, QualityProbe, QualityRange, QualityResult, bisect_quality,
    search_quality,
};
pub use template::{CandidateTemplate, ReferenceTemplate};
