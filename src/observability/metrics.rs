use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::service::ServiceError;

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total API requests handled
    pub requests_total: AtomicU64,

    /// Failed requests by cause
    pub validation_failures: AtomicU64,
    pub not_found: AtomicU64,
    pub store_errors: AtomicU64,

    /// Record writes
    pub records_created: AtomicU64,
    pub records_updated: AtomicU64,
    pub records_deleted: AtomicU64,
    pub records_imported: AtomicU64,
    pub batch_imports_failed: AtomicU64,

    /// Request latency buckets
    pub latency_under_5ms: AtomicU64,
    pub latency_5_25ms: AtomicU64,
    pub latency_25_100ms: AtomicU64,
    pub latency_100_500ms: AtomicU64,
    pub latency_over_500ms: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a failed service call.
    pub fn record_error(&self, error: &ServiceError) {
        let counter = match error {
            ServiceError::Validation(_) => &self.validation_failures,
            ServiceError::NotFound(_) => &self.not_found,
            ServiceError::Store(_) => &self.store_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_updated(&self) {
        self.records_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deleted(&self) {
        self.records_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch import outcome.
    pub fn record_batch_import(&self, success: bool, records: usize) {
        if success {
            self.records_imported
                .fetch_add(records as u64, Ordering::Relaxed);
        } else {
            self.batch_imports_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record request latency.
    pub fn record_latency(&self, start: Instant) {
        let millis = start.elapsed().as_millis() as u64;

        let bucket = if millis < 5 {
            &self.latency_under_5ms
        } else if millis < 25 {
            &self.latency_5_25ms
        } else if millis < 100 {
            &self.latency_25_100ms
        } else if millis < 500 {
            &self.latency_100_500ms
        } else {
            &self.latency_over_500ms
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self, uptime_secs: u64) -> String {
        format!(
            r#"# HELP salesr_uptime_seconds Application uptime in seconds
# TYPE salesr_uptime_seconds counter
salesr_uptime_seconds {}

# HELP salesr_requests_total Total API requests
# TYPE salesr_requests_total counter
salesr_requests_total {}

# HELP salesr_request_errors Failed API requests by cause
# TYPE salesr_request_errors counter
salesr_request_errors{{cause="validation"}} {}
salesr_request_errors{{cause="not_found"}} {}
salesr_request_errors{{cause="store"}} {}

# HELP salesr_records Sales record writes by operation
# TYPE salesr_records counter
salesr_records{{op="create"}} {}
salesr_records{{op="update"}} {}
salesr_records{{op="delete"}} {}
salesr_records{{op="import"}} {}

# HELP salesr_batch_imports_failed_total Batch imports that inserted fewer rows than requested
# TYPE salesr_batch_imports_failed_total counter
salesr_batch_imports_failed_total {}

# HELP salesr_request_latency_bucket Request latency histogram
# TYPE salesr_request_latency_bucket counter
salesr_request_latency_bucket{{le="0.005"}} {}
salesr_request_latency_bucket{{le="0.025"}} {}
salesr_request_latency_bucket{{le="0.1"}} {}
salesr_request_latency_bucket{{le="0.5"}} {}
salesr_request_latency_bucket{{le="+Inf"}} {}
"#,
            uptime_secs,
            self.requests_total.load(Ordering::Relaxed),
            self.validation_failures.load(Ordering::Relaxed),
            self.not_found.load(Ordering::Relaxed),
            self.store_errors.load(Ordering::Relaxed),
            self.records_created.load(Ordering::Relaxed),
            self.records_updated.load(Ordering::Relaxed),
            self.records_deleted.load(Ordering::Relaxed),
            self.records_imported.load(Ordering::Relaxed),
            self.batch_imports_failed.load(Ordering::Relaxed),
            self.latency_under_5ms.load(Ordering::Relaxed),
            self.latency_5_25ms.load(Ordering::Relaxed),
            self.latency_25_100ms.load(Ordering::Relaxed),
            self.latency_100_500ms.load(Ordering::Relaxed),
            self.latency_over_500ms.load(Ordering::Relaxed),
        )
    }
}

/// Guard for timing a request. Counts the request and records its latency on drop.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        registry.requests_total.fetch_add(1, Ordering::Relaxed);
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ValidationError;

    #[test]
    fn test_record_errors() {
        let metrics = MetricsRegistry::new();

        metrics.record_error(&ServiceError::Validation(ValidationError::new("bad")));
        metrics.record_error(&ServiceError::NotFound(3));
        metrics.record_error(&ServiceError::NotFound(4));

        assert_eq!(metrics.validation_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.not_found.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.store_errors.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_batch_import_counts() {
        let metrics = MetricsRegistry::new();

        metrics.record_batch_import(true, 250);
        metrics.record_batch_import(false, 10);

        assert_eq!(metrics.records_imported.load(Ordering::Relaxed), 250);
        assert_eq!(metrics.batch_imports_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_timing_guard() {
        let metrics = MetricsRegistry::new();

        {
            let _guard = TimingGuard::new(&metrics);
        }

        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_under_5ms.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = MetricsRegistry::new();
        metrics.record_created();

        let output = metrics.to_prometheus(42);

        assert!(output.contains("salesr_uptime_seconds 42"));
        assert!(output.contains("salesr_records{op=\"create\"} 1"));
    }
}
