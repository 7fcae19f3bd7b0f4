pub mod admin_service;
pub mod http;
pub mod listener;
pub mod metrics_defs;
