//! # imgparity
//!
//! Compare two image delivery pipelines and stand in for one of them.
//!
//! Two independent tools share this crate:
//!
//! ```text
//! search     reference URL ─┐
//!                           ├─ bisect candidate quality until byte sizes match
//!            candidate URL ─┘
//!
//! transform  bytes → decode → cover-crop | scale | pass-through → encode
//! ```
//!
//! The **search** answers "which quality setting on the candidate pipeline
//! produces files the same size as the reference pipeline, for this image at
//! this size?" It never decodes anything; byte count is the only signal.
//!
//! The **transform** pipeline is a drop-in resize service: given an image and
//! an optional target width, height, and quality, it produces exactly the
//! output a front end built on the `url/w/h/q` contract expects.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`search`] | URL templates, bounded bisection, and the batch runner |
//! | [`imaging`] | Transform geometry, codec backend, and the transform operation |
//! | [`fetch`] | Blocking HTTP fetch behind the [`fetch::Fetcher`] trait |
//! | [`config`] | `imgparity.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared value types ([`types::Dimensions`]) |
//! | [`output`] | CLI report formatting, text and JSON |
//!
//! # Design Decisions
//!
//! ## Bounded Search, Observed Best
//!
//! Bisection over 1..=100 makes at most seven candidate requests per size.
//! It assumes size grows with quality, which real encoders only roughly honor,
//! so the result is the closest size *observed*. Every probe is kept on the
//! result and a monotonicity violation is flagged rather than hidden.
//!
//! ## Cover Crop That Always Fits
//!
//! A box request scales by the axis matching the box's orientation, then
//! center-crops. When that factor would leave the scaled image short on the
//! other axis, the larger factor is used instead, so the crop box always lies
//! inside the scaled raster and the output is exactly the requested size.
//!
//! ## Dedicated Worker Pool
//!
//! The batch runs on its own `rayon` pool of exactly `max_concurrency`
//! threads, not the global pool, so the concurrency limit is exact and the
//! embedding program's pool is left alone. Fetches block inside workers; there
//! is no async runtime.

pub mod config;
pub mod fetch;
pub mod imaging;
pub mod output;
pub mod search;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
