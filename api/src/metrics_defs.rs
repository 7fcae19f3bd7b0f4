//! Metrics definitions for the HTTP surface.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_ERRORS: MetricDef = MetricDef {
    name: "api.errors",
    metric_type: MetricType::Counter,
    description: "Number of requests answered with an error, tagged by status",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUEST_ERRORS];
