//! Filing compliance scoring: due dates, delays, rolling history, and the Pass/Fail verdict.

pub mod config;
pub(crate) mod delay;
pub mod domain;
pub mod error;
pub(crate) mod history;
pub mod import;
pub(crate) mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod verdict;

#[cfg(test)]
mod tests;

pub use config::{DueDaySchedule, ScoringConfig, UnknownDelayPolicy, DESIGNATED_STATES};
pub use delay::{assess_delay, DelayAssessment};
pub use domain::{
    parse_filing_date, DelayFlag, DelayStatus, EntityId, EntityProfile, FilingRecord,
    FilingRecordView, FilingSubmission, RecordId, ReturnPeriod, ReturnType, Turnover,
    TurnoverInput, Verdict,
};
pub use error::{ScoringError, ValidationError};
pub use history::{HistoryAggregator, HistorySummary};
pub use import::{FilingCsvImporter, FilingImportError};
pub use policy::DueDatePolicy;
pub use repository::{FilingRepository, RepositoryError, UpdateSummary};
pub use router::scoring_router;
pub use service::{ComplianceScore, ComplianceService};
pub use verdict::{FailureReason, VerdictEvaluator, VerdictOutcome};
