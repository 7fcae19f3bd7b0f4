//! Survey aggregate: structural writes, submission, analytics and export.

pub mod analytics;
pub mod conditions;
pub mod errors;
pub mod export;
pub mod input;
pub mod links;
pub mod metrics_defs;
mod reconciler;
pub mod responses;
mod service;
pub mod submission;

#[cfg(test)]
mod testutils;

pub use errors::{SurveyError, ValidationError};
pub use service::Surveys;
