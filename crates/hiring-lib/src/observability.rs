//! Observability for the hiring service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, served/error counts, model state, training runs)
//! - Structured JSON logging with tracing

use crate::training::TrainingReport;
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge, Gauge, GaugeVec, Histogram, IntCounter,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Registered once per process; `None` when registration failed
static GLOBAL_METRICS: OnceLock<Option<HiringMetricsInner>> = OnceLock::new();

struct HiringMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_served: IntCounterVec,
    prediction_errors: IntCounterVec,
    model_loaded: IntGauge,
    model_version_info: GaugeVec,
    training_runs: IntCounter,
    last_holdout_accuracy: Gauge,
}

impl HiringMetricsInner {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            prediction_latency_seconds: register_histogram!(
                "hiring_prediction_latency_seconds",
                "Time spent scoring a candidate",
                LATENCY_BUCKETS.to_vec()
            )?,
            predictions_served: register_int_counter_vec!(
                "hiring_predictions_served_total",
                "Predictions served, by source",
                &["source"]
            )?,
            prediction_errors: register_int_counter_vec!(
                "hiring_prediction_errors_total",
                "Failed prediction requests, by error kind",
                &["kind"]
            )?,
            model_loaded: register_int_gauge!(
                "hiring_model_loaded",
                "1 when a trained model is loaded"
            )?,
            model_version_info: register_gauge_vec!(
                "hiring_model_version_info",
                "Currently loaded model",
                &["version", "schema"]
            )?,
            training_runs: register_int_counter!(
                "hiring_training_runs_total",
                "Completed training runs"
            )?,
            last_holdout_accuracy: register_gauge!(
                "hiring_last_holdout_accuracy",
                "Holdout accuracy of the most recent training run"
            )?,
        })
    }
}

/// Handle to the process-wide hiring metrics
///
/// Clones share the same underlying metrics. When registration fails the
/// handle is inert and every recording call is a no-op.
#[derive(Clone)]
pub struct HiringMetrics {
    inner: Option<&'static HiringMetricsInner>,
}

impl Default for HiringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HiringMetrics {
    pub fn new() -> Self {
        let inner = GLOBAL_METRICS
            .get_or_init(|| {
                HiringMetricsInner::new()
                    .map_err(|e| warn!(error = %e, "Failed to register hiring metrics"))
                    .ok()
            })
            .as_ref();
        Self { inner }
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        if let Some(m) = self.inner {
            m.prediction_latency_seconds.observe(duration_secs);
        }
    }

    /// `source` is `model` or `fallback`
    pub fn inc_predictions_served(&self, source: &str) {
        if let Some(m) = self.inner {
            m.predictions_served.with_label_values(&[source]).inc();
        }
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        if let Some(m) = self.inner {
            m.prediction_errors.with_label_values(&[kind]).inc();
        }
    }

    pub fn set_model(&self, version: Option<&str>, schema: &str) {
        if let Some(m) = self.inner {
            m.model_version_info.reset();
            match version {
                Some(version) => {
                    m.model_loaded.set(1);
                    m.model_version_info.with_label_values(&[version, schema]).set(1.0);
                }
                None => m.model_loaded.set(0),
            }
        }
    }

    pub fn record_training(&self, report: Option<&TrainingReport>) {
        if let Some(m) = self.inner {
            m.training_runs.inc();
            if let Some(accuracy) = report.and_then(TrainingReport::holdout_accuracy) {
                m.last_holdout_accuracy.set(accuracy);
            }
        }
    }
}

/// Emits the service's named log events with consistent fields
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str, model_version: Option<&str>) {
        info!(
            event = "server_started",
            instance = %self.instance,
            server_version = %version,
            addr = %addr,
            model_version = ?model_version,
            "Hiring prediction server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Hiring prediction server shutting down"
        );
    }

    pub fn log_model_trained(&self, version: &str, schema: &str, report: Option<&TrainingReport>) {
        info!(
            event = "model_trained",
            instance = %self.instance,
            model_version = %version,
            schema = %schema,
            train_rows = report.map(|r| r.train_rows),
            holdout_rows = report.map(|r| r.holdout_rows),
            holdout_accuracy = report.and_then(TrainingReport::holdout_accuracy),
            "Model trained"
        );
    }

    pub fn log_model_loaded(&self, version: &str, path: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            model_version = %version,
            path = %path,
            "Model loaded"
        );
    }

    pub fn log_model_load_failed(&self, path: &str, error: &str) {
        warn!(
            event = "model_load_failed",
            instance = %self.instance,
            path = %path,
            error = %error,
            "Model load failed"
        );
    }

    pub fn log_prediction(&self, label: u8, probability: f64, model_version: &str, elapsed_secs: f64) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            prediction = label,
            probability = probability,
            model_version = %model_version,
            elapsed_ms = elapsed_secs * 1000.0,
            "Prediction served"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let a = HiringMetrics::new();
        let b = HiringMetrics::new();
        assert!(a.inner.is_some());
        assert!(std::ptr::eq(a.inner.unwrap(), b.inner.unwrap()));

        a.observe_prediction_latency(0.0004);
        a.inc_predictions_served("model");
        b.inc_prediction_errors("invalid_input");
        a.set_model(Some("rf-0123456789ab"), "smart_hiring");
        a.set_model(None, "smart_hiring");
        b.record_training(None);
    }

    #[test]
    fn test_concurrent_handles_are_all_live() {
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    HiringMetrics::new()
                })
            })
            .collect();

        let metrics: Vec<HiringMetrics> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = metrics[0].inner.unwrap();
        assert!(metrics
            .iter()
            .all(|m| m.inner.map_or(false, |inner| std::ptr::eq(inner, first))));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("hiring-test");
        assert_eq!(logger.instance, "hiring-test");
        logger.log_prediction(1, 0.82, "rf-0123456789ab", 0.0003);
    }
}
