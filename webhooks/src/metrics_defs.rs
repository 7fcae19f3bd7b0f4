//! Metrics definitions for webhook delivery.

use shared::metrics_defs::{MetricDef, MetricType};

pub const DELIVERIES: MetricDef = MetricDef {
    name: "webhooks.deliveries",
    metric_type: MetricType::Counter,
    description: "Number of webhook delivery attempts, tagged by outcome",
};

pub const DELIVERY_DURATION: MetricDef = MetricDef {
    name: "webhooks.delivery.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent on a single webhook delivery in seconds",
};

pub const DISPATCH_FANOUT: MetricDef = MetricDef {
    name: "webhooks.dispatch.fanout",
    metric_type: MetricType::Histogram,
    description: "Number of subscribed webhooks per submission",
};

pub const DISPATCH_LOOKUP_FAILED: MetricDef = MetricDef {
    name: "webhooks.dispatch.lookup_failed",
    metric_type: MetricType::Counter,
    description: "Number of dispatches abandoned because webhooks could not be loaded",
};

pub const ALL_METRICS: &[MetricDef] = &[
    DELIVERIES,
    DELIVERY_DURATION,
    DISPATCH_FANOUT,
    DISPATCH_LOOKUP_FAILED,
];
