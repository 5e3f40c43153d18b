//! Event-rate anomaly detection
//!
//! This module provides:
//! - Time-bin histograms over a trailing scan window
//! - Dispersion (sample standard deviation) of the bin counts
//! - The detector that gates notifications behind a threshold and a cooldown

mod detector;
mod histogram;

pub use detector::{AnomalyDetector, DetectionOutcome, DetectorConfig};
pub use histogram::{bin_counts, sample_std_dev};
