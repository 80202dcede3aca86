use chrono::NaiveDate;
use serde::Serialize;

use super::domain::DelayStatus;
use super::error::ScoringError;

/// Lateness of a single filing against its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayAssessment {
    pub is_delayed: bool,
    pub days: u32,
}

impl DelayAssessment {
    pub fn status(&self) -> DelayStatus {
        if self.is_delayed {
            DelayStatus::Delayed(self.days)
        } else {
            DelayStatus::OnTime
        }
    }
}

/// Day-granular comparison; filing on the due date itself is on time.
pub fn assess_delay(filing_date: NaiveDate, due_date: NaiveDate) -> Result<DelayAssessment, ScoringError> {
    if filing_date <= due_date {
        return Ok(DelayAssessment {
            is_delayed: false,
            days: 0,
        });
    }

    let elapsed = filing_date.signed_duration_since(due_date).num_days();
    let days = u32::try_from(elapsed)
        .ok()
        .filter(|days| *days > 0)
        .ok_or_else(|| {
            ScoringError::Computation(format!(
                "derived delay of {elapsed} days between filing {filing_date} and due {due_date}"
            ))
        })?;

    Ok(DelayAssessment {
        is_delayed: true,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn filing_on_due_date_is_not_delayed() {
        let due = date(2024, 2, 24);
        let assessment = assess_delay(due, due).expect("assessment");
        assert!(!assessment.is_delayed);
        assert_eq!(assessment.days, 0);
        assert_eq!(assessment.status(), DelayStatus::OnTime);
    }

    #[test]
    fn late_filing_counts_calendar_days() {
        let assessment = assess_delay(date(2024, 3, 2), date(2024, 2, 20)).expect("assessment");
        assert!(assessment.is_delayed);
        // 2024 is a leap year.
        assert_eq!(assessment.days, 11);
        assert_eq!(assessment.status(), DelayStatus::Delayed(11));
    }

    #[test]
    fn early_filing_is_zero_not_negative() {
        let assessment = assess_delay(date(2024, 2, 3), date(2024, 2, 20)).expect("assessment");
        assert_eq!(assessment.days, 0);
        assert!(!assessment.is_delayed);
    }

    proptest! {
        #[test]
        fn delay_is_never_negative(filing_offset in -400i64..400, due_offset in -400i64..400) {
            let base = date(2024, 1, 1);
            let filing = base + chrono::Duration::days(filing_offset);
            let due = base + chrono::Duration::days(due_offset);
            let assessment = assess_delay(filing, due).expect("assessment");

            prop_assert_eq!(assessment.is_delayed, filing > due);
            if assessment.is_delayed {
                prop_assert_eq!(i64::from(assessment.days), filing_offset - due_offset);
            } else {
                prop_assert_eq!(assessment.days, 0);
            }
        }
    }
}
