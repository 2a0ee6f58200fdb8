//! Thread-safe metrics collection system
//!
//! Atomic counters for normalization passes and their failure kinds, plus a bounded,
//! mutex-protected window of pass durations.

use crate::error::NormalizerError;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of pass durations kept for percentile computation
const MAX_DURATION_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and a mutex
pub struct MetricsCollector {
    passes_started: AtomicU64,
    passes_in_flight: AtomicU64,
    passes_completed: AtomicU64,
    passes_failed: AtomicU64,
    dispatches_issued: AtomicU64,

    missing_parameter: AtomicU64,
    strategy_failures: AtomicU64,
    dispatch_failures: AtomicU64,

    // in microseconds
    pass_durations: Mutex<Vec<u64>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            passes_started: AtomicU64::new(0),
            passes_in_flight: AtomicU64::new(0),
            passes_completed: AtomicU64::new(0),
            passes_failed: AtomicU64::new(0),
            dispatches_issued: AtomicU64::new(0),
            missing_parameter: AtomicU64::new(0),
            strategy_failures: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            pass_durations: Mutex::new(Vec::new()),
        }
    }

    pub fn pass_started(&self) {
        self.passes_started.fetch_add(1, Ordering::Relaxed);
        self.passes_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pass_completed(&self, duration: Duration) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
        self.passes_in_flight.fetch_sub(1, Ordering::Relaxed);
        self.record_duration(duration);
    }

    /// Count a failed pass under the failure kind of `error`
    pub fn pass_failed(&self, error: &NormalizerError) {
        self.passes_failed.fetch_add(1, Ordering::Relaxed);
        self.passes_in_flight.fetch_sub(1, Ordering::Relaxed);

        let counter = match error {
            NormalizerError::MissingInputParameter { .. } => &self.missing_parameter,
            NormalizerError::Strategy(_) => &self.strategy_failures,
            NormalizerError::Dispatch(_) => &self.dispatch_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dispatch_issued(&self) {
        self.dispatches_issued.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duration(&self, duration: Duration) {
        if let Ok(mut durations) = self.pass_durations.lock() {
            durations.push(duration.as_micros() as u64);

            if durations.len() > MAX_DURATION_SAMPLES {
                durations.remove(0);
            }
        }
    }

    /// Reset all metrics (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.passes_started,
            &self.passes_in_flight,
            &self.passes_completed,
            &self.passes_failed,
            &self.dispatches_issued,
            &self.missing_parameter,
            &self.strategy_failures,
            &self.dispatch_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }

        if let Ok(mut durations) = self.pass_durations.lock() {
            durations.clear();
        }
    }

    /// Average, p50, p95 and p99 of the recorded pass durations
    fn duration_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(durations) = self.pass_durations.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if durations.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted = durations.clone();
        sorted.sort_unstable();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        (
            avg,
            percentile(&sorted, 50.0),
            percentile(&sorted, 95.0),
            percentile(&sorted, 99.0),
        )
    }

    /// Get complete metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg_duration_us, p50, p95, p99) = self.duration_statistics();

        MetricsSnapshot {
            passes: PassMetrics {
                started: self.passes_started.load(Ordering::Relaxed),
                in_flight: self.passes_in_flight.load(Ordering::Relaxed),
                completed: self.passes_completed.load(Ordering::Relaxed),
                failed: self.passes_failed.load(Ordering::Relaxed),
                dispatches_issued: self.dispatches_issued.load(Ordering::Relaxed),
                avg_duration_us,
                duration_p50_us: p50,
                duration_p95_us: p95,
                duration_p99_us: p99,
            },
            failures: FailureMetrics {
                missing_parameter: self.missing_parameter.load(Ordering::Relaxed),
                strategy: self.strategy_failures.load(Ordering::Relaxed),
                dispatch: self.dispatch_failures.load(Ordering::Relaxed),
            },
            timestamp: current_timestamp(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// Public metrics structures
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub passes: PassMetrics,
    pub failures: FailureMetrics,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassMetrics {
    pub started: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    pub dispatches_issued: u64,
    pub avg_duration_us: f64,
    pub duration_p50_us: f64,
    pub duration_p95_us: f64,
    pub duration_p99_us: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureMetrics {
    pub missing_parameter: u64,
    pub strategy: u64,
    pub dispatch: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_value = sorted_data[index.floor() as usize] as f64;
        let upper_value = sorted_data[index.ceil() as usize] as f64;

        lower_value + (upper_value - lower_value) * index.fract()
    }
}
