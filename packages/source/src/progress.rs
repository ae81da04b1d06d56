//! Progress reporting for the download, clean and sample steps.
//!
//! Library code reports through [`ProgressCallback`] and never draws
//! anything itself. The terminal bars live in `collision_prep_cli_utils`;
//! tests pass [`NullProgress`].

use std::sync::Arc;
use std::time::Instant;

/// Receives progress from a pipeline step.
///
/// Units depend on the step: bytes while downloading, records while
/// sampling, stages while cleaning.
pub trait ProgressCallback: Send + Sync {
    /// Sets the expected number of units and restarts from zero.
    fn set_total(&self, total: u64);

    /// Advances by `delta` units.
    fn inc(&self, delta: u64);

    /// Replaces the label shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the step as done.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Runs `work` as one stage of a multi-stage step.
///
/// Shows `label`, then advances by one unit if `work` succeeds. A failed
/// stage leaves the indicator where it was.
///
/// # Errors
///
/// Returns whatever `work` returns.
pub fn stage<T, E>(
    progress: &dyn ProgressCallback,
    label: &str,
    work: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    progress.set_message(label.to_string());
    let start = Instant::now();

    let value = work()?;

    log::debug!("{label}: {:.2}s", start.elapsed().as_secs_f64());
    progress.inc(1);
    Ok(value)
}
