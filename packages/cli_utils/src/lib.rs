#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the collision prep binaries.
//!
//! [`IndicatifProgress`] draws a [`ProgressCallback`] as an `indicatif` bar
//! whose units follow the step ([`BarKind`]). [`init_logger`] routes `log`
//! output through `indicatif-log-bridge` so log lines print above the bars
//! instead of through them.

use std::sync::Arc;
use std::time::Duration;

use collision_prep_source::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// What a bar counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    /// Bytes received for one dataset. The length arrives with
    /// `Content-Length`, if at all.
    Bytes,
    /// CSV records scanned by the sampler. The length arrives once the
    /// input has been counted.
    Records,
    /// A fixed number of pipeline stages, known up front.
    Stages(u64),
}

impl BarKind {
    /// Template used while the length is unknown.
    const fn spinner_template(self) -> &'static str {
        match self {
            Self::Bytes => "{spinner:.cyan} {msg} {bytes} [{bytes_per_sec}]",
            Self::Records => "{spinner:.yellow} {msg} {human_pos} records",
            Self::Stages(_) => "{spinner:.green} {msg}",
        }
    }

    /// Template used once the length is known.
    const fn bar_template(self) -> &'static str {
        match self {
            Self::Bytes => {
                "  {msg} {wide_bar:.cyan/dim} {bytes}/{total_bytes} [{bytes_per_sec}, {eta}]"
            }
            Self::Records => "  {msg} {wide_bar:.yellow/dim} {human_pos}/{human_len} [{eta}]",
            Self::Stages(_) => "{msg} {wide_bar:.green/dim} stage {pos}/{len} [{elapsed}]",
        }
    }
}

/// An `indicatif` bar behind [`ProgressCallback`].
///
/// Bars without a known length start as spinners and switch to the
/// [`BarKind::bar_template`] style on `set_total`.
pub struct IndicatifProgress {
    bar: ProgressBar,
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Adds a bar of `kind` labelled `message` to `multi`.
    #[must_use]
    pub fn add_to(
        multi: &MultiProgress,
        kind: BarKind,
        message: &str,
    ) -> Arc<dyn ProgressCallback> {
        Arc::new(Self::build(multi, kind, message))
    }

    fn build(multi: &MultiProgress, kind: BarKind, message: &str) -> Self {
        let bar_style = ProgressStyle::with_template(kind.bar_template())
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        let bar = if let BarKind::Stages(total) = kind {
            let bar = multi.add(ProgressBar::new(total));
            bar.set_style(bar_style.clone());
            bar
        } else {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_style(
                ProgressStyle::with_template(kind.spinner_template())
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        };
        bar.set_message(message.to_string());

        Self { bar, bar_style }
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// Defaults to `info` level; `RUST_LOG` overrides it. Returns the
/// [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Logger may already be set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn record_bar_gets_its_length_from_set_total() {
        let progress = IndicatifProgress::build(&hidden(), BarKind::Records, "Sampling");
        assert_eq!(progress.bar.length(), None);

        progress.set_total(500);
        progress.inc(120);
        assert_eq!(progress.bar.length(), Some(500));
        assert_eq!(progress.bar.position(), 120);
    }

    #[test]
    fn stage_bar_starts_with_its_length() {
        let progress = IndicatifProgress::build(&hidden(), BarKind::Stages(5), "Cleaning");
        assert_eq!(progress.bar.length(), Some(5));

        progress.inc(1);
        progress.finish("Clean complete".to_string());
        assert_eq!(progress.bar.position(), 1);
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn set_total_restarts_a_byte_bar() {
        let progress = IndicatifProgress::build(&hidden(), BarKind::Bytes, "Crashes");
        progress.inc(64);
        progress.set_total(1_024);
        assert_eq!(progress.bar.position(), 0);
    }
}
