use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Registration number identifying a tracked entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingEntityId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned identifier for a single filing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

/// Kind of return filed. Unrecognized codes are kept verbatim and fall back to the default due day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    PeriodicSummary,
    PeriodicDetail,
    Other(String),
}

impl ReturnType {
    pub fn from_code(raw: &str) -> Self {
        let code = raw.trim();
        match code.to_ascii_uppercase().as_str() {
            "GSTR3B" | "GSTR-3B" | "PERIODIC-SUMMARY" | "PERIODIC_SUMMARY" => Self::PeriodicSummary,
            "GSTR1" | "GSTR-1" | "PERIODIC-DETAIL" | "PERIODIC_DETAIL" => Self::PeriodicDetail,
            _ => Self::Other(code.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ReturnType::PeriodicSummary => "GSTR3B",
            ReturnType::PeriodicDetail => "GSTR1",
            ReturnType::Other(code) => code,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ReturnType::PeriodicSummary => "periodic summary",
            ReturnType::PeriodicDetail => "periodic detail",
            ReturnType::Other(code) => code,
        }
    }
}

impl Serialize for ReturnType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ReturnType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_code(&raw))
    }
}

/// Calendar month a return covers; also used to name the month a filing landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReturnPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReturnPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidReturnPeriod {
                raw: format!("{year:04}-{month:02}"),
            });
        }
        Ok(Self { year, month })
    }

    /// Accepts the registry's `MMYYYY` form (`022024`) or `YYYY-MM`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let invalid = || ValidationError::InvalidReturnPeriod {
            raw: raw.to_string(),
        };

        let (year, month) = if let Some((year, month)) = trimmed.split_once('-') {
            (
                year.parse::<i32>().map_err(|_| invalid())?,
                month.parse::<u32>().map_err(|_| invalid())?,
            )
        } else if trimmed.len() == 6 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            (
                trimmed[2..].parse::<i32>().map_err(|_| invalid())?,
                trimmed[..2].parse::<u32>().map_err(|_| invalid())?,
            )
        } else {
            return Err(invalid());
        };

        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:04}", self.month, self.year)
    }
}

impl Serialize for ReturnPeriod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Declared annual turnover. `Unknown` is distinct from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum Turnover {
    Known(u64),
    #[default]
    Unknown,
}

impl Turnover {
    pub fn parse(input: Option<&TurnoverInput>) -> Result<Self, ValidationError> {
        match input {
            None => Ok(Self::Unknown),
            Some(TurnoverInput::Text(raw)) => Self::parse_str(raw),
            Some(TurnoverInput::Number(number)) => {
                number
                    .as_u64()
                    .map(Self::Known)
                    .ok_or_else(|| ValidationError::InvalidTurnover {
                        raw: number.to_string(),
                    })
            }
        }
    }

    pub fn parse_str(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unknown);
        }

        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidTurnover {
                raw: raw.to_string(),
            });
        }

        trimmed
            .parse::<u64>()
            .map(Self::Known)
            .map_err(|_| ValidationError::InvalidTurnover {
                raw: raw.to_string(),
            })
    }

    pub fn amount(&self) -> Option<u64> {
        match self {
            Turnover::Known(amount) => Some(*amount),
            Turnover::Unknown => None,
        }
    }
}

impl From<Option<u64>> for Turnover {
    fn from(value: Option<u64>) -> Self {
        value.map(Self::Known).unwrap_or(Self::Unknown)
    }
}

impl From<Turnover> for Option<u64> {
    fn from(value: Turnover) -> Self {
        value.amount()
    }
}

/// Turnover exactly as a caller sent it: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnoverInput {
    Number(serde_json::Number),
    Text(String),
}

impl From<u64> for TurnoverInput {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for TurnoverInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Derived lateness of a filing.
///
/// `Unknown` means the delay was never computed (for example, turnover was missing at intake) and
/// must not be confused with an on-time filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "days", rename_all = "snake_case")]
pub enum DelayStatus {
    #[default]
    Unknown,
    OnTime,
    Delayed(u32),
}

impl DelayStatus {
    pub fn flag(&self) -> DelayFlag {
        match self {
            DelayStatus::Unknown => DelayFlag::Unknown,
            DelayStatus::OnTime => DelayFlag::No,
            DelayStatus::Delayed(_) => DelayFlag::Yes,
        }
    }

    pub fn magnitude(&self) -> Option<u32> {
        match self {
            DelayStatus::Unknown => None,
            DelayStatus::OnTime => Some(0),
            DelayStatus::Delayed(days) => Some(*days),
        }
    }
}

/// Tri-state "was it late" answer published alongside each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayFlag {
    Yes,
    No,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("pass") {
            Ok(Self::Pass)
        } else if trimmed.eq_ignore_ascii_case("fail") {
            Ok(Self::Fail)
        } else {
            Err(ValidationError::InvalidVerdict {
                raw: raw.to_string(),
            })
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
        }
    }
}

/// One filed return for one entity in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingRecord {
    pub id: RecordId,
    pub entity_id: EntityId,
    pub return_type: ReturnType,
    pub filing_date: NaiveDate,
    pub return_period: ReturnPeriod,
    pub state: Option<String>,
    pub turnover: Turnover,
    pub delay: DelayStatus,
    pub verdict: Option<Verdict>,
}

impl FilingRecord {
    /// Serializable view adding the `delayed` flag next to the stored fields.
    pub fn view(&self) -> FilingRecordView<'_> {
        FilingRecordView {
            record: self,
            delayed: self.delay.flag(),
        }
    }
}

/// Public representation of a [`FilingRecord`] returned over HTTP.
#[derive(Debug, Serialize)]
pub struct FilingRecordView<'a> {
    #[serde(flatten)]
    pub record: &'a FilingRecord,
    pub delayed: DelayFlag,
}

/// Raw intake payload, validated by the service before it becomes a [`FilingRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingSubmission {
    pub entity_id: String,
    pub return_type: ReturnType,
    pub filing_date: String,
    pub return_period: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub turnover: Option<TurnoverInput>,
}

/// Turnover and jurisdiction context shared by all of an entity's filings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityProfile {
    pub entity_id: EntityId,
    pub turnover: Turnover,
    pub state: Option<String>,
}

impl EntityProfile {
    /// Profile as of the most recent filing.
    pub fn from_records(records: &[FilingRecord]) -> Option<Self> {
        records
            .iter()
            .max_by_key(|record| (record.filing_date, record.id))
            .map(|latest| Self {
                entity_id: latest.entity_id.clone(),
                turnover: latest.turnover,
                state: latest.state.clone(),
            })
    }
}

/// Parse a calendar date in `YYYY-MM-DD` or the registry's `DD-MM-YYYY` form.
pub fn parse_filing_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d-%m-%Y"))
        .map_err(|_| ValidationError::InvalidDate {
            raw: raw.to_string(),
        })
}

pub(crate) fn normalize_state(state: Option<String>) -> Option<String> {
    state
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
