use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Request counters exposed on /metrics in Prometheus text format.
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests received"),
            &["endpoint"],
        )
        .context("Failed to create request counter")?;

        registry
            .register(Box::new(http_requests.clone()))
            .context("Failed to register request counter")?;

        Ok(Self {
            registry,
            http_requests,
        })
    }

    pub fn record_request(&self, endpoint: &str) {
        self.http_requests.with_label_values(&[endpoint]).inc();
    }

    /// Render the registry in the Prometheus exposition format.
    pub fn render(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output was not valid UTF-8")
    }
}
