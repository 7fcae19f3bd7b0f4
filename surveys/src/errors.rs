use store::StoreError;
use store::types::Id;

/// Malformed input, detected before anything is persisted.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("question {index}: min value {min} exceeds max value {max}")]
    InvalidRange { index: usize, min: i64, max: i64 },

    #[error("close date must be after release date")]
    InvalidSchedule,

    #[error("response limit must be positive")]
    InvalidResponseLimit,

    #[error("question {index}: condition has no dependency")]
    MissingDependency { index: usize },

    #[error("question {0} appears more than once")]
    DuplicateQuestion(Id),

    #[error("question {0} does not belong to this survey")]
    UnknownQuestion(Id),

    #[error("question {0} requires an answer")]
    MissingAnswer(Id),
}

#[derive(thiserror::Error, Debug)]
pub enum SurveyError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("survey link not found")]
    LinkNotFound,

    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("survey is closed")]
    Closed,

    #[error("survey is not open yet")]
    NotOpen,

    #[error("survey has reached its response limit")]
    LimitReached,

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl SurveyError {
    pub fn survey_not_found(id: Id) -> Self {
        SurveyError::NotFound {
            entity: "survey",
            id,
        }
    }

    /// Short label for submissions turned away by survey state or input.
    pub fn rejection_reason(&self) -> Option<&'static str> {
        match self {
            SurveyError::Closed => Some("closed"),
            SurveyError::NotOpen => Some("not_open"),
            SurveyError::LimitReached => Some("limit_reached"),
            SurveyError::Invalid(_) => Some("invalid"),
            _ => None,
        }
    }
}

impl From<StoreError> for SurveyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => SurveyError::NotFound { entity, id },
            other => SurveyError::Store(other),
        }
    }
}

pub type Result<T, E = SurveyError> = std::result::Result<T, E>;
