use serde::Serialize;

use super::config::ScoringConfig;
use super::domain::{ReturnPeriod, Verdict};
use super::history::HistorySummary;

/// Why an entity failed its compliance check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    MeanDelayExceeded { mean_delay: f64, limit: f64 },
    TooManyLongDelays { count: usize, limit: usize },
    FiledInPriorMonth { period: ReturnPeriod },
}

impl FailureReason {
    pub fn summary(&self) -> String {
        match self {
            FailureReason::MeanDelayExceeded { mean_delay, limit } => format!(
                "mean delay {:.2} days exceeds {:.2}",
                mean_delay, limit
            ),
            FailureReason::TooManyLongDelays { count, limit } => {
                format!("{count} long delay(s) exceeds allowance of {limit}")
            }
            FailureReason::FiledInPriorMonth { period } => {
                format!("filing recorded in prior month {period}")
            }
        }
    }
}

/// Verdict plus the audit trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictOutcome {
    pub verdict: Verdict,
    pub reasons: Vec<FailureReason>,
}

impl VerdictOutcome {
    pub fn summary(&self) -> String {
        if self.reasons.is_empty() {
            return self.verdict.label().to_string();
        }

        let reasons: Vec<String> = self.reasons.iter().map(FailureReason::summary).collect();
        format!("{}: {}", self.verdict.label(), reasons.join("; "))
    }
}

/// Stateless evaluator; every call recomputes the verdict from scratch.
#[derive(Debug, Clone)]
pub struct VerdictEvaluator {
    max_mean_delay_days: f64,
    max_long_delays: usize,
}

impl VerdictEvaluator {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            max_mean_delay_days: config.max_mean_delay_days,
            max_long_delays: config.max_long_delays,
        }
    }

    pub fn evaluate(&self, summary: &HistorySummary) -> VerdictOutcome {
        let mut reasons = Vec::new();

        if summary.mean_delay > self.max_mean_delay_days {
            reasons.push(FailureReason::MeanDelayExceeded {
                mean_delay: summary.mean_delay,
                limit: self.max_mean_delay_days,
            });
        }

        if summary.long_delay_count > self.max_long_delays {
            reasons.push(FailureReason::TooManyLongDelays {
                count: summary.long_delay_count,
                limit: self.max_long_delays,
            });
        }

        // Pass requires that none of the window's filings landed in the previous month.
        if summary.filed_in_prior_month {
            reasons.push(FailureReason::FiledInPriorMonth {
                period: summary.prior_month,
            });
        }

        let verdict = if reasons.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail
        };

        VerdictOutcome { verdict, reasons }
    }
}
