use commonware_runtime::Metrics as RuntimeMetrics;
use prometheus_client::metrics::{counter::Counter, gauge::Gauge};

/// Metrics for the [super::Relay].
#[derive(Default)]
pub struct Metrics {
    /// Number of withdraws submitted
    pub submitted: Counter,
    /// Number of failed chain queries or submissions
    pub failures: Counter,
    /// Next height to relay
    pub height: Gauge,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given context.
    pub fn init<E: RuntimeMetrics>(context: E) -> Self {
        let metrics = Self::default();
        context.register(
            "submitted",
            "Number of withdraws submitted",
            metrics.submitted.clone(),
        );
        context.register(
            "failures",
            "Number of failed chain queries or submissions",
            metrics.failures.clone(),
        );
        context.register(
            "height",
            "Next height to relay",
            metrics.height.clone(),
        );
        metrics
    }
}
