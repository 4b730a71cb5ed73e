//! Prometheus text exposition of the core metrics.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Registry holding every core metric.
static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in rasterbridge_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Renders all metrics in the Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_core_metrics() {
        rasterbridge_core::metrics::STAGING_CLEANUP_FAILURES.inc_by(0);
        let text = render().unwrap();
        assert!(text.contains("rasterbridge_staging_cleanup_failures_total"));
    }
}
