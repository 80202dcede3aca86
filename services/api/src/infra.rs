use chrono::NaiveDate;
use filing_compliance::scoring::{
    parse_filing_date, EntityId, FilingRecord, FilingRepository, RecordId, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFilingRepository {
    records: Arc<Mutex<HashMap<RecordId, FilingRecord>>>,
}

impl InMemoryFilingRepository {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<RecordId, FilingRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("filing store mutex poisoned".to_string()))
    }
}

impl FilingRepository for InMemoryFilingRepository {
    fn insert(&self, record: FilingRecord) -> Result<FilingRecord, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn load_entity(&self, entity_id: &EntityId) -> Result<Vec<FilingRecord>, RepositoryError> {
        let guard = self.guard()?;
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
        let mut guard = self.guard()?;
        // Validate the whole batch before writing any of it.
        let known = records.iter().all(|record| {
            record.entity_id == *entity_id
                && guard
                    .get(&record.id)
                    .is_some_and(|stored| stored.entity_id == *entity_id)
        });
        if !known {
            return Err(RepositoryError::NotFound);
        }
        for record in records {
            guard.insert(record.id, record);
        }
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_filing_date(raw).map_err(|err| err.to_string())
}
