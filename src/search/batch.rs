//! Batch execution of quality searches over a bounded worker pool.
//!
//! Each [`ImageJob`] is handled start to finish by one worker: the worker
//! walks the job's dimensions in order, running an independent
//! [`search_quality`] for each. Jobs share nothing mutable, so the order in
//! which they finish cannot change any job's result. Errors are recorded
//! against the dimension that produced them and never stop the pool.

use super::bisect::{JobError, QualityRange, QualityResult, search_quality};
use super::template::{CandidateTemplate, ReferenceTemplate};
use crate::fetch::Fetcher;
use crate::types::Dimensions;
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("max_concurrency must be at least 1")]
    NoWorkers,
}

/// One unit of search work: an image, the sizes to match it at, and the two
/// pipelines to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub image_path: String,
    pub dimensions: Vec<Dimensions>,
    pub reference: ReferenceTemplate,
    pub candidate: CandidateTemplate,
    pub range: QualityRange,
}

impl ImageJob {
    pub fn new(
        image_path: impl Into<String>,
        dimensions: Vec<Dimensions>,
        reference: ReferenceTemplate,
        candidate: CandidateTemplate,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            dimensions,
            reference,
            candidate,
            range: QualityRange::default(),
        }
    }
}

/// Result of one (image, dimensions) search.
#[derive(Debug)]
pub struct DimensionOutcome {
    pub dimensions: Dimensions,
    pub result: Result<QualityResult, JobError>,
}

/// Every dimension of one job, in the job's own order.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: ImageJob,
    pub results: Vec<DimensionOutcome>,
}

impl JobOutcome {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    pub fn report(&self) -> JobReport {
        JobReport {
            image_path: self.job.image_path.clone(),
            results: self
                .results
                .iter()
                .map(|dim| {
                    let result = match &dim.result {
                        Ok(found) => Ok(found.clone()),
                        Err(e) => Err(e.to_string()),
                    };
                    (dim.dimensions, result)
                })
                .collect(),
        }
    }
}

/// Cloneable snapshot of a finished job, with errors rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub image_path: String,
    pub results: Vec<(Dimensions, Result<QualityResult, String>)>,
}

impl JobReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Notifications sent while a batch runs, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// A job finished; carries its full results for live reporting.
    JobFinished(JobReport),
}

/// Run every dimension of `job` sequentially, each with fresh search state.
pub fn run_job(fetcher: &impl Fetcher, job: &ImageJob) -> Vec<DimensionOutcome> {
    job.dimensions
        .iter()
        .map(|&size| {
            let reference_url = job.reference.render(&job.image_path, size);
            let result = search_quality(
                fetcher,
                &reference_url,
                &job.candidate,
                size,
                &job.image_path,
                job.range,
            );
            match &result {
                Ok(found) => tracing::info!(
                    image = %job.image_path,
                    size = %size,
                    quality = ?found.best_quality(),
                    difference = ?found.difference(),
                    reference_size = found.reference_size,
                    "Search finished"
                ),
                Err(e) => tracing::warn!(
                    image = %job.image_path,
                    size = %size,
                    error = %e,
                    "Search failed"
                ),
            }
            DimensionOutcome {
                dimensions: size,
                result,
            }
        })
        .collect()
}

/// Run `jobs` on a dedicated pool of exactly `max_concurrency` workers.
///
/// Outcomes come back in submission order with every job accounted for.
/// `events`, when given, receives each job's report as soon as it finishes.
pub fn run_batch<F: Fetcher>(
    fetcher: &F,
    jobs: Vec<ImageJob>,
    max_concurrency: usize,
    events: Option<Sender<SearchEvent>>,
) -> Result<Vec<JobOutcome>, BatchError> {
    if max_concurrency == 0 {
        return Err(BatchError::NoWorkers);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_concurrency)
        .thread_name(|i| format!("imgparity-search-{i}"))
        .build()?;

    tracing::info!(jobs = jobs.len(), workers = max_concurrency, "Starting batch");

    let outcomes = pool.install(|| {
        jobs.into_par_iter()
            .with_max_len(1)
            .map_with(events, |events, job| {
                let results = run_job(fetcher, &job);
                let outcome = JobOutcome { job, results };
                if let Some(tx) = events {
                    // A dropped receiver only means nobody is watching.
                    let _ = tx.send(SearchEvent::JobFinished(outcome.report()));
                }
                outcome
            })
            .collect()
    });
    Ok(outcomes)
}
