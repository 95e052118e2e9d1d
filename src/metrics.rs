//! Prometheus request metrics exposed at `/metrics`.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Global Prometheus handle; every series carries `service="ground-booking"`.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    let mut labels = HashMap::new();
    labels.insert("service".to_string(), "ground-booking".to_string());
    PrometheusMetricsBuilder::new("booking_api")
        .endpoint("/metrics")
        .const_labels(labels)
        .build()
        .expect("metrics builder")
});
