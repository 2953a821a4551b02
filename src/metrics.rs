//! Request counters and latency statistics for the prediction service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

use crate::models::family::{Family, Target};

/// Keep at most this many latency samples; the oldest half is dropped on overflow
const MAX_SAMPLES: usize = 10_000;
const MAX_MODEL_SAMPLES: usize = 1_000;

/// Metrics collector shared by all request handlers
pub struct ServiceMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Predictions routed to family A
    pub family_a_requests: AtomicU64,
    /// Predictions routed to family B
    pub family_b_requests: AtomicU64,
    /// Queries whose blade count had no reference rows
    pub blade_fallbacks: AtomicU64,
    /// Queries with a blade count outside the trained range
    pub unusual_blade_counts: AtomicU64,
    /// Rejected requests
    pub input_errors: AtomicU64,
    /// Regressor failures
    pub inference_errors: AtomicU64,
    /// End-to-end prediction times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Per-target inference times (in microseconds)
    model_times: RwLock<HashMap<Target, Vec<u64>>>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            family_a_requests: AtomicU64::new(0),
            family_b_requests: AtomicU64::new(0),
            blade_fallbacks: AtomicU64::new(0),
            unusual_blade_counts: AtomicU64::new(0),
            input_errors: AtomicU64::new(0),
            inference_errors: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, family: Family, processing_time: Duration) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        match family {
            Family::A => self.family_a_requests.fetch_add(1, Ordering::Relaxed),
            Family::B => self.family_b_requests.fetch_add(1, Ordering::Relaxed),
        };

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }
    }

    pub fn record_blade_fallback(&self) {
        self.blade_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unusual_blade_count(&self) {
        self.unusual_blade_counts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_input_error(&self) {
        self.input_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_error(&self) {
        self.inference_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one regressor call
    pub fn record_model_time(&self, target: Target, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let target_times = times.entry(target).or_default();
            target_times.push(duration.as_micros() as u64);
            if target_times.len() > MAX_MODEL_SAMPLES {
                target_times.drain(0..MAX_MODEL_SAMPLES / 2);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        self.processing_times
            .read()
            .map(|times| ProcessingStats::from_samples(&times))
            .unwrap_or_default()
    }

    /// Get per-target inference statistics
    pub fn get_model_stats(&self) -> HashMap<Target, ProcessingStats> {
        let Ok(times) = self.model_times.read() else {
            return HashMap::new();
        };

        times
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(target, samples)| (*target, ProcessingStats::from_samples(samples)))
            .collect()
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let family_a = self.family_a_requests.load(Ordering::Relaxed);
        let family_b = self.family_b_requests.load(Ordering::Relaxed);
        let fallbacks = self.blade_fallbacks.load(Ordering::Relaxed);
        let unusual = self.unusual_blade_counts.load(Ordering::Relaxed);
        let input_errors = self.input_errors.load(Ordering::Relaxed);
        let inference_errors = self.inference_errors.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          PROPELLER PREDICTION SERVICE - METRICS SUMMARY      ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>7.2} req/s  ║",
            served,
            self.get_throughput()
        );
        info!(
            "║ Family A: {:>8}  │  Family B: {:>8}                    ║",
            family_a, family_b
        );
        info!(
            "║ Blade Fallbacks: {:>6}  │  Unusual Blade Counts: {:>6}      ║",
            fallbacks, unusual
        );
        info!(
            "║ Input Errors: {:>9}  │  Inference Errors: {:>9}        ║",
            input_errors, inference_errors
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╚══════════════════════════════════════════════════════════════╝");

        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            info!("Model Inference Times (μs):");
            for target in Target::ALL {
                if let Some(stats) = model_stats.get(&target) {
                    info!(
                        "  {}: mean={} p50={} p99={} (calls={})",
                        target, stats.mean_us, stats.p50_us, stats.p99_us, stats.count
                    );
                }
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics over a sample window
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Family::A, Duration::from_micros(100));
        metrics.record_prediction(Family::B, Duration::from_micros(300));
        metrics.record_prediction(Family::B, Duration::from_micros(200));
        metrics.record_blade_fallback();
        metrics.record_input_error();

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.family_a_requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.family_b_requests.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.blade_fallbacks.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.input_errors.load(Ordering::Relaxed), 1);

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_us, 200);
        assert_eq!(stats.p50_us, 200);
        assert_eq!(stats.max_us, 300);
    }

    #[test]
    fn test_empty_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats(), ProcessingStats::default());
        assert!(metrics.get_model_stats().is_empty());
    }

    #[test]
    fn test_model_times_per_target() {
        let metrics = ServiceMetrics::new();
        metrics.record_model_time(Target::Thrust, Duration::from_micros(40));
        metrics.record_model_time(Target::Thrust, Duration::from_micros(60));
        metrics.record_model_time(Target::Efficiency, Duration::from_micros(10));

        let stats = metrics.get_model_stats();
        assert_eq!(stats[&Target::Thrust].count, 2);
        assert_eq!(stats[&Target::Thrust].mean_us, 50);
        assert_eq!(stats[&Target::Efficiency].count, 1);
        assert!(!stats.contains_key(&Target::Power));
    }

    #[test]
    fn test_sample_window_is_bounded() {
        let metrics = ServiceMetrics::new();
        for _ in 0..(MAX_SAMPLES + 1) {
            metrics.record_prediction(Family::A, Duration::from_micros(1));
        }
        assert_eq!(
            metrics.get_processing_stats().count as usize,
            MAX_SAMPLES + 1 - MAX_SAMPLES / 2
        );
    }
}
