//! Metrics definitions for the survey core.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SURVEYS_CREATED: MetricDef = MetricDef {
    name: "surveys.created",
    metric_type: MetricType::Counter,
    description: "Number of surveys created, including duplicates",
};

pub const SURVEYS_RECONCILED: MetricDef = MetricDef {
    name: "surveys.reconciled",
    metric_type: MetricType::Counter,
    description: "Number of successful structural survey updates",
};

pub const RECONCILE_FAILED: MetricDef = MetricDef {
    name: "surveys.reconcile.failed",
    metric_type: MetricType::Counter,
    description: "Number of structural updates rolled back",
};

pub const RESPONSES_SUBMITTED: MetricDef = MetricDef {
    name: "responses.submitted",
    metric_type: MetricType::Counter,
    description: "Number of responses persisted",
};

pub const SUBMISSIONS_REJECTED: MetricDef = MetricDef {
    name: "responses.rejected",
    metric_type: MetricType::Counter,
    description: "Number of submissions rejected, tagged by reason",
};

pub const ANALYTICS_DURATION: MetricDef = MetricDef {
    name: "analytics.duration",
    metric_type: MetricType::Histogram,
    description: "Time to aggregate a survey's responses in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SURVEYS_CREATED,
    SURVEYS_RECONCILED,
    RECONCILE_FAILED,
    RESPONSES_SUBMITTED,
    SUBMISSIONS_REJECTED,
    ANALYTICS_DURATION,
];
