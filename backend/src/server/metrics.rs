//! Prometheus endpoint and request collectors for the `metrics` feature.

use std::io;

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use phonebook::middleware::RequestMetrics;

/// Middleware serving `/metrics` from its own registry.
pub(crate) fn prometheus_metrics() -> io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("phonebook")
        .endpoint("/metrics")
        .build()
        .map_err(|err| io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Per-operation collectors registered with the registry `prometheus` serves.
pub(crate) fn request_metrics(prometheus: &PrometheusMetrics) -> io::Result<RequestMetrics> {
    RequestMetrics::register(&prometheus.registry)
        .map_err(|err| io::Error::other(format!("request metrics registration failed: {err}")))
}
