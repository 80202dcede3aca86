use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::scoring::domain::{
    DelayStatus, EntityId, FilingRecord, FilingSubmission, RecordId, ReturnPeriod, ReturnType,
    Turnover, TurnoverInput,
};
use crate::scoring::repository::{FilingRepository, RepositoryError};
use crate::scoring::{ComplianceService, ScoringConfig};

pub(super) const ENTITY: &str = "29ABCDE1234F1Z5";

/// Seeded record ids start here so they never collide with ids assigned at intake.
pub(super) const SEED_BASE: u64 = 1_000_000;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn entity() -> EntityId {
    EntityId(ENTITY.to_string())
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig::default()
}

/// Stored record with an already-derived delay, bypassing intake.
pub(super) fn record(id: u64, entity: &str, filed: NaiveDate, delay: DelayStatus) -> FilingRecord {
    FilingRecord {
        id: RecordId(id),
        entity_id: EntityId(entity.to_string()),
        return_type: ReturnType::PeriodicSummary,
        filing_date: filed,
        return_period: ReturnPeriod::containing(filed).previous(),
        state: Some("Delhi".to_string()),
        turnover: Turnover::Known(1_000_000),
        delay,
        verdict: None,
    }
}

/// As-of date used by the monthly history fixtures; the prior calendar month is November 2024.
pub(super) fn history_as_of() -> NaiveDate {
    date(2024, 12, 15)
}

/// Twelve monthly filings inside the window ending [`history_as_of`], none in November 2024.
pub(super) fn monthly_history(entity: &str, delays: [u32; 12]) -> Vec<FilingRecord> {
    let mut filed_on: Vec<NaiveDate> = (0..11)
        .map(|offset| {
            let month0 = 11 + offset;
            date(2023 + (month0 / 12) as i32, month0 % 12 + 1, 20)
        })
        .collect();
    filed_on.push(date(2024, 12, 10));

    filed_on
        .into_iter()
        .zip(delays)
        .enumerate()
        .map(|(index, (filed, days))| {
            let delay = if days == 0 {
                DelayStatus::OnTime
            } else {
                DelayStatus::Delayed(days)
            };
            record(SEED_BASE + index as u64, entity, filed, delay)
        })
        .collect()
}

pub(super) fn submission(filing_date: &str, state: Option<&str>, turnover: Option<&str>) -> FilingSubmission {
    FilingSubmission {
        entity_id: ENTITY.to_string(),
        return_type: ReturnType::PeriodicSummary,
        filing_date: filing_date.to_string(),
        return_period: "012024".to_string(),
        state: state.map(str::to_string),
        turnover: turnover.map(TurnoverInput::from),
    }
}

pub(super) fn build_service() -> (ComplianceService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = ComplianceService::new(repository.clone(), &scoring_config());
    (service, repository)
}

pub(super) fn seeded_service(
    records: Vec<FilingRecord>,
) -> (ComplianceService<MemoryRepository>, Arc<MemoryRepository>) {
    let (service, repository) = build_service();
    for record in records {
        repository.insert(record).expect("seed record");
    }
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<BTreeMap<RecordId, FilingRecord>>>,
    commits: Arc<Mutex<usize>>,
}

impl MemoryRepository {
    pub(super) fn snapshot(&self, entity_id: &EntityId) -> Vec<FilingRecord> {
        self.load_entity(entity_id).expect("snapshot")
    }

    pub(super) fn commit_count(&self) -> usize {
        *self.commits.lock().expect("commit mutex poisoned")
    }
}

impl FilingRepository for MemoryRepository {
    fn insert(&self, record: FilingRecord) -> Result<FilingRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn load_entity(&self, entity_id: &EntityId) -> Result<Vec<FilingRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.entity_id == *entity_id)
            .cloned()
            .collect())
    }

    fn commit_entity(
        &self,
        entity_id: &EntityId,
        records: Vec<FilingRecord>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if records
            .iter()
            .any(|record| record.entity_id != *entity_id || !guard.contains_key(&record.id))
        {
            return Err(RepositoryError::NotFound);
        }
        for record in records {
            guard.insert(record.id, record);
        }
        *self.commits.lock().expect("commit mutex poisoned") += 1;
        Ok(())
    }
}

/// Reads succeed but every commit fails, as if the transaction were rolled back.
#[derive(Default)]
pub(super) struct RollbackRepository {
    pub(super) inner: MemoryRepository,
}

impl FilingRepository for RollbackRepository {
    fn insert(&self, record: FilingRecord) -> Result<FilingRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn load_entity(&self, entity_id: &EntityId) -> Result<Vec<FilingRecord>, RepositoryError> {
        self.inner.load_entity(entity_id)
    }

    fn commit_entity(
        &self,
        _entity_id: &EntityId,
        _records: Vec<FilingRecord>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("transaction rolled back".to_string()))
    }
}

/// Tracks how many callers sit between `load_entity` and `commit_entity` at once.
///
/// Loads are slowed down so that unserialized updates would overlap.
#[derive(Default)]
pub(super) struct OverlapRepository {
    pub(super) inner: MemoryRepository,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl OverlapRepository {
    pub(super) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl FilingRepository for OverlapRepository {
    fn insert(&self, record: FilingRecord) -> Result<FilingRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn load_entity(&self, entity_id: &EntityId) -> Result<Vec<FilingRecord>, RepositoryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let records = self.inner.load_entity(entity_id);
        std::thread::sleep(Duration::from_millis(30));
        records
    }

    fn commit_entity(
        &self,
        entity_id: &EntityId,
        records: Vec<FilingRecord>,
    ) -> Result<(), RepositoryError> {
        let result = self.inner.commit_entity(entity_id, records);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub(super) fn scoring_router_with_service(
    service: ComplianceService<MemoryRepository>,
) -> axum::Router {
    crate::scoring::scoring_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
