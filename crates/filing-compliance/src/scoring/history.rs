use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::config::{ScoringConfig, UnknownDelayPolicy};
use super::domain::{EntityId, FilingRecord, ReturnPeriod};

/// Rolling statistics over an entity's trailing filing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub entity_id: EntityId,
    pub as_of: NaiveDate,
    pub window_start: NaiveDate,
    pub window_size: usize,
    pub known_delay_count: usize,
    pub unknown_delay_count: usize,
    pub delayed_count: usize,
    pub mean_delay: f64,
    pub long_delay_count: usize,
    pub prior_month: ReturnPeriod,
    pub filed_in_prior_month: bool,
}

/// Selects an entity's filings within the window and reduces them to [`HistorySummary`].
#[derive(Debug, Clone)]
pub struct HistoryAggregator {
    window_days: u32,
    long_delay_days: u32,
    unknown_delay_policy: UnknownDelayPolicy,
}

impl HistoryAggregator {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            window_days: config.window_days,
            long_delay_days: config.long_delay_days,
            unknown_delay_policy: config.unknown_delay_policy,
        }
    }

    /// First date inside the window (inclusive).
    pub fn window_start(&self, as_of: NaiveDate) -> NaiveDate {
        as_of
            .checked_sub_days(Days::new(u64::from(self.window_days)))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn aggregate<'a, I>(&self, entity_id: &EntityId, records: I, as_of: NaiveDate) -> HistorySummary
    where
        I: IntoIterator<Item = &'a FilingRecord>,
    {
        let window_start = self.window_start(as_of);
        let prior_month = ReturnPeriod::containing(as_of).previous();

        let mut window_size = 0usize;
        let mut known_delay_count = 0usize;
        let mut delayed_count = 0usize;
        let mut long_delay_count = 0usize;
        let mut total_delay: u64 = 0;
        let mut filed_in_prior_month = false;

        for record in records {
            if record.entity_id != *entity_id || record.filing_date < window_start {
                continue;
            }

            window_size += 1;
            if ReturnPeriod::containing(record.filing_date) == prior_month {
                filed_in_prior_month = true;
            }

            if let Some(days) = record.delay.magnitude() {
                known_delay_count += 1;
                total_delay += u64::from(days);
                if days > 0 {
                    delayed_count += 1;
                }
                if days > self.long_delay_days {
                    long_delay_count += 1;
                }
            }
        }

        let denominator = match self.unknown_delay_policy {
            UnknownDelayPolicy::CountAsZero => window_size,
            UnknownDelayPolicy::Exclude => known_delay_count,
        };
        let mean_delay = if denominator == 0 {
            0.0
        } else {
            total_delay as f64 / denominator as f64
        };

        HistorySummary {
            entity_id: entity_id.clone(),
            as_of,
            window_start,
            window_size,
            known_delay_count,
            unknown_delay_count: window_size - known_delay_count,
            delayed_count,
            mean_delay,
            long_delay_count,
            prior_month,
            filed_in_prior_month,
        }
    }
}
