use super::domain::EntityId;
use super::repository::RepositoryError;

/// Malformed or missing caller input. Never defaulted away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("entity identifier is required")]
    MissingEntityId,
    #[error("invalid annual turnover '{raw}': expected a non-negative whole number")]
    InvalidTurnover { raw: String },
    #[error("invalid date '{raw}': expected YYYY-MM-DD or DD-MM-YYYY")]
    InvalidDate { raw: String },
    #[error("invalid return period '{raw}': expected MMYYYY or YYYY-MM")]
    InvalidReturnPeriod { raw: String },
    #[error("jurisdiction state is required for {return_type} returns with turnover at or below {threshold}")]
    MissingState { return_type: String, threshold: u64 },
    #[error("due day {due_day} does not exist in {year:04}-{month:02}")]
    InvalidDueDay { due_day: u32, year: i32, month: u32 },
    #[error("invalid verdict '{raw}': expected Pass or Fail")]
    InvalidVerdict { raw: String },
}

/// Error raised by the scoring engine and its orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no filing records found for entity {0}")]
    NotFound(EntityId),
    #[error("scoring invariant violated: {0}")]
    Computation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
