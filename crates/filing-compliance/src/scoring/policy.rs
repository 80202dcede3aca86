use chrono::{Datelike, NaiveDate};

use super::config::{DueDaySchedule, ScoringConfig};
use super::domain::{ReturnType, Turnover};
use super::error::ValidationError;

/// Maps a return's kind, jurisdiction, and turnover onto its statutory due day.
#[derive(Debug, Clone)]
pub struct DueDatePolicy {
    high_turnover_threshold: u64,
    designated_states: Vec<String>,
    due_days: DueDaySchedule,
}

impl DueDatePolicy {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            high_turnover_threshold: config.high_turnover_threshold,
            designated_states: config
                .designated_states
                .iter()
                .map(|state| state.trim().to_lowercase())
                .collect(),
            due_days: config.due_days,
        }
    }

    pub fn due_day(
        &self,
        return_type: &ReturnType,
        state: Option<&str>,
        turnover: Turnover,
    ) -> Result<u32, ValidationError> {
        match return_type {
            ReturnType::PeriodicSummary => self.summary_due_day(return_type, state, turnover),
            ReturnType::PeriodicDetail => Ok(self.due_days.detail),
            ReturnType::Other(_) => Ok(self.due_days.fallback),
        }
    }

    fn summary_due_day(
        &self,
        return_type: &ReturnType,
        state: Option<&str>,
        turnover: Turnover,
    ) -> Result<u32, ValidationError> {
        let small_taxpayer = matches!(
            turnover,
            Turnover::Known(amount) if amount <= self.high_turnover_threshold
        );
        if !small_taxpayer {
            return Ok(self.due_days.summary_high_turnover);
        }

        let state = state
            .map(str::trim)
            .filter(|state| !state.is_empty())
            .ok_or_else(|| ValidationError::MissingState {
                return_type: return_type.code().to_string(),
                threshold: self.high_turnover_threshold,
            })?;

        if self.is_designated(state) {
            Ok(self.due_days.summary_designated_state)
        } else {
            Ok(self.due_days.summary_other_state)
        }
    }

    pub fn is_designated(&self, state: &str) -> bool {
        let needle = state.trim().to_lowercase();
        self.designated_states.iter().any(|state| *state == needle)
    }

    /// Substitute the due day into the filing month. Days past the month's end are rejected.
    pub fn due_date(&self, filing_date: NaiveDate, due_day: u32) -> Result<NaiveDate, ValidationError> {
        filing_date
            .with_day(due_day)
            .ok_or(ValidationError::InvalidDueDay {
                due_day,
                year: filing_date.year(),
                month: filing_date.month(),
            })
    }
}
