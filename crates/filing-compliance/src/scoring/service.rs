use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::config::ScoringConfig;
use super::delay::assess_delay;
use super::domain::{
    normalize_state, parse_filing_date, DelayStatus, EntityId, EntityProfile, FilingRecord,
    FilingSubmission, RecordId, ReturnPeriod, ReturnType, Turnover, TurnoverInput, Verdict,
};
use super::error::ScoringError;
use super::history::{HistoryAggregator, HistorySummary};
use super::policy::DueDatePolicy;
use super::repository::{FilingRepository, UpdateSummary};
use super::verdict::{VerdictEvaluator, VerdictOutcome};

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_record_id() -> RecordId {
    RecordId(RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Point-in-time compliance score for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceScore {
    pub profile: EntityProfile,
    pub summary: HistorySummary,
    pub outcome: VerdictOutcome,
}

/// Per-entity mutexes so two updates to the same entity never interleave their load and commit.
///
/// An entry lives only while some caller holds or waits on it.
#[derive(Default)]
struct EntityLocks {
    table: Mutex<HashMap<EntityId, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    fn with_entity<T>(&self, entity_id: &EntityId, work: impl FnOnce() -> T) -> T {
        let handle = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(entity_id.clone()).or_default().clone()
        };

        let result = {
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            work()
        };

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under the table lock, so two owners means the table and us.
        if Arc::strong_count(&handle) == 2 {
            table.remove(entity_id);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Service composing the due-date policy, history aggregator, verdict evaluator, and record store.
pub struct ComplianceService<R> {
    repository: Arc<R>,
    policy: DueDatePolicy,
    aggregator: HistoryAggregator,
    evaluator: VerdictEvaluator,
    locks: EntityLocks,
}

impl<R> ComplianceService<R>
where
    R: FilingRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: &ScoringConfig) -> Self {
        Self {
            repository,
            policy: DueDatePolicy::from_config(config),
            aggregator: HistoryAggregator::from_config(config),
            evaluator: VerdictEvaluator::from_config(config),
            locks: EntityLocks::default(),
        }
    }

    pub fn compute_due_date(
        &self,
        return_type: &ReturnType,
        state: Option<&str>,
        turnover: Turnover,
    ) -> Result<u32, ScoringError> {
        Ok(self.policy.due_day(return_type, state, turnover)?)
    }

    /// Re-derive the delay fields of a record from its own turnover, state, and filing date.
    pub fn recompute_record(&self, record: &FilingRecord) -> Result<FilingRecord, ScoringError> {
        let due_day =
            self.policy
                .due_day(&record.return_type, record.state.as_deref(), record.turnover)?;
        let due_date = self.policy.due_date(record.filing_date, due_day)?;
        let assessment = assess_delay(record.filing_date, due_date)?;

        let mut updated = record.clone();
        updated.delay = assessment.status();
        Ok(updated)
    }

    /// Validate and store a newly filed return. Delay and verdict are only derived once turnover
    /// is known.
    pub fn record_filing(
        &self,
        submission: FilingSubmission,
        as_of: NaiveDate,
    ) -> Result<FilingRecord, ScoringError> {
        let mut record = self.draft_record(&submission, next_record_id())?;
        let entity_id = record.entity_id.clone();

        let stored = self.locks.with_entity(&entity_id, || {
            if matches!(record.turnover, Turnover::Known(_)) {
                let mut history = self.repository.load_entity(&entity_id)?;
                history.push(record.clone());
                record.verdict = Some(self.score(&entity_id, &history, as_of).verdict);
            }
            self.repository.insert(record)
        })?;

        info!(
            entity = %stored.entity_id,
            record = stored.id.0,
            return_type = stored.return_type.code(),
            period = %stored.return_period,
            "filing recorded"
        );
        Ok(stored)
    }

    /// Run every intake check of [`Self::record_filing`] without storing anything.
    pub fn validate_submission(&self, submission: &FilingSubmission) -> Result<(), ScoringError> {
        self.draft_record(submission, RecordId(0)).map(|_| ())
    }

    fn draft_record(
        &self,
        submission: &FilingSubmission,
        id: RecordId,
    ) -> Result<FilingRecord, ScoringError> {
        let entity_id = EntityId::parse(&submission.entity_id)?;
        let turnover = Turnover::parse(submission.turnover.as_ref())?;
        let filing_date = parse_filing_date(&submission.filing_date)?;
        let return_period = ReturnPeriod::parse(&submission.return_period)?;

        let record = FilingRecord {
            id,
            entity_id,
            return_type: submission.return_type.clone(),
            filing_date,
            return_period,
            state: normalize_state(submission.state.clone()),
            turnover,
            delay: DelayStatus::Unknown,
            verdict: None,
        };

        match turnover {
            Turnover::Known(_) => self.recompute_record(&record),
            Turnover::Unknown => Ok(record),
        }
    }

    /// Propagate a corrected turnover to every record of the entity and rescore the changed ones.
    ///
    /// Records already carrying the turnover are left untouched, so re-applying the same value is
    /// a no-op. A null or blank turnover is a no-op too. All changed records are committed in a
    /// single write.
    pub fn apply_turnover_update(
        &self,
        entity_id: &EntityId,
        turnover: Option<&TurnoverInput>,
        as_of: NaiveDate,
    ) -> Result<UpdateSummary, ScoringError> {
        self.locks
            .with_entity(entity_id, || self.turnover_update(entity_id, turnover, as_of))
            .map_err(|err| log_failure(entity_id, "turnover update", err))
    }

    fn turnover_update(
        &self,
        entity_id: &EntityId,
        turnover: Option<&TurnoverInput>,
        as_of: NaiveDate,
    ) -> Result<UpdateSummary, ScoringError> {
        let mut records = self.repository.load_entity(entity_id)?;
        if records.is_empty() {
            return Err(ScoringError::NotFound(entity_id.clone()));
        }

        let turnover = Turnover::parse(turnover)?;
        if turnover == Turnover::Unknown {
            debug!(entity = %entity_id, "no turnover supplied, records left as stored");
            return Ok(UpdateSummary { updated_count: 0 });
        }

        let mut changed = Vec::new();
        for (index, record) in records.iter_mut().enumerate() {
            if record.turnover == turnover {
                continue;
            }

            record.turnover = turnover;
            *record = self.recompute_record(record)?;
            changed.push(index);
        }

        if changed.is_empty() {
            debug!(entity = %entity_id, "turnover unchanged, nothing to rescore");
            return Ok(UpdateSummary { updated_count: 0 });
        }

        let outcome = self.score(entity_id, &records, as_of);
        let updated: Vec<FilingRecord> = changed
            .into_iter()
            .map(|index| {
                let mut record = records[index].clone();
                record.verdict = Some(outcome.verdict);
                record
            })
            .collect();
        let updated_count = updated.len();

        self.repository.commit_entity(entity_id, updated)?;
        info!(
            entity = %entity_id,
            updated_count,
            verdict = outcome.verdict.label(),
            "turnover update applied"
        );

        Ok(UpdateSummary { updated_count })
    }

    /// Manual override: stamp every record of the entity with `verdict`, skipping the scoring.
    pub fn apply_status_override(
        &self,
        entity_id: &EntityId,
        verdict: &str,
    ) -> Result<UpdateSummary, ScoringError> {
        Verdict::parse(verdict)
            .map_err(ScoringError::from)
            .and_then(|verdict| {
                self.locks
                    .with_entity(entity_id, || self.status_override(entity_id, verdict))
            })
            .map_err(|err| log_failure(entity_id, "status override", err))
    }

    fn status_override(
        &self,
        entity_id: &EntityId,
        verdict: Verdict,
    ) -> Result<UpdateSummary, ScoringError> {
        let mut records = self.repository.load_entity(entity_id)?;
        if records.is_empty() {
            return Err(ScoringError::NotFound(entity_id.clone()));
        }

        for record in &mut records {
            record.verdict = Some(verdict);
        }
        let updated_count = records.len();

        self.repository.commit_entity(entity_id, records)?;
        info!(
            entity = %entity_id,
            updated_count,
            verdict = verdict.label(),
            "verdict overridden"
        );

        Ok(UpdateSummary { updated_count })
    }

    /// All records of an entity ordered by filing date.
    pub fn entity_records(&self, entity_id: &EntityId) -> Result<Vec<FilingRecord>, ScoringError> {
        let mut records = self.repository.load_entity(entity_id)?;
        if records.is_empty() {
            return Err(ScoringError::NotFound(entity_id.clone()));
        }
        records.sort_by_key(|record| (record.filing_date, record.id));
        Ok(records)
    }

    /// Read-only scoring snapshot; nothing is persisted.
    pub fn entity_score(
        &self,
        entity_id: &EntityId,
        as_of: NaiveDate,
    ) -> Result<ComplianceScore, ScoringError> {
        let records = self.entity_records(entity_id)?;
        let profile = EntityProfile::from_records(&records)
            .ok_or_else(|| ScoringError::NotFound(entity_id.clone()))?;
        let summary = self.aggregator.aggregate(entity_id, &records, as_of);
        let outcome = self.evaluator.evaluate(&summary);

        Ok(ComplianceScore {
            profile,
            summary,
            outcome,
        })
    }

    #[cfg(test)]
    pub(crate) fn tracked_entity_locks(&self) -> usize {
        self.locks.len()
    }

    fn score(&self, entity_id: &EntityId, records: &[FilingRecord], as_of: NaiveDate) -> VerdictOutcome {
        let summary = self.aggregator.aggregate(entity_id, records, as_of);
        debug!(
            entity = %entity_id,
            window_size = summary.window_size,
            mean_delay = summary.mean_delay,
            long_delays = summary.long_delay_count,
            filed_in_prior_month = summary.filed_in_prior_month,
            "history aggregated"
        );
        self.evaluator.evaluate(&summary)
    }
}

fn log_failure(entity_id: &EntityId, operation: &'static str, err: ScoringError) -> ScoringError {
    match &err {
        ScoringError::Computation(_) | ScoringError::Repository(_) => {
            error!(entity = %entity_id, operation, error = %err, "entity update aborted");
        }
        ScoringError::Validation(_) | ScoringError::NotFound(_) => {
            warn!(entity = %entity_id, operation, error = %err, "entity update rejected");
        }
    }
    err
}
