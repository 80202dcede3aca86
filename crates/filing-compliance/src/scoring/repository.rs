use serde::Serialize;

use super::domain::{EntityId, FilingRecord};

/// Record store the engine reads from and writes back to.
///
/// `commit_entity` must apply the whole batch or nothing: callers rely on it to avoid leaving an
/// entity's verdicts half rewritten.
pub trait FilingRepository: Send + Sync {
    fn insert(&self, record: FilingRecord) -> Result<FilingRecord, RepositoryError>;
    fn load_entity(&self, entity_id: &EntityId) -> Result<Vec<FilingRecord>, RepositoryError>;
    fn commit_entity(
        &self,
        entity_id: &EntityId,
        records: Vec<FilingRecord>,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an orchestrated entity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub updated_count: usize,
}
