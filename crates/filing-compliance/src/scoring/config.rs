use serde::{Deserialize, Serialize};

/// South and west zone states and union territories granted the later summary-return deadline.
pub const DESIGNATED_STATES: [&str; 15] = [
    "Chhattisgarh",
    "Madhya Pradesh",
    "Gujarat",
    "Daman and Diu",
    "Dadra and Nagar Haveli",
    "Maharashtra",
    "Karnataka",
    "Goa",
    "Lakshadweep",
    "Kerala",
    "Tamil Nadu",
    "Puducherry",
    "Andaman and Nicobar Islands",
    "Telangana",
    "Andhra Pradesh",
];

/// How records whose delay was never computed enter the mean delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownDelayPolicy {
    /// Contributes zero days and still counts toward the denominator.
    #[default]
    CountAsZero,
    /// Left out of both numerator and denominator.
    Exclude,
}

impl UnknownDelayPolicy {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zero" | "count_as_zero" | "count-as-zero" => Some(Self::CountAsZero),
            "exclude" | "skip" => Some(Self::Exclude),
            _ => None,
        }
    }
}

/// Day-of-month deadlines per return kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDaySchedule {
    pub summary_high_turnover: u32,
    pub summary_designated_state: u32,
    pub summary_other_state: u32,
    pub detail: u32,
    pub fallback: u32,
}

impl Default for DueDaySchedule {
    fn default() -> Self {
        Self {
            summary_high_turnover: 20,
            summary_designated_state: 22,
            summary_other_state: 24,
            detail: 11,
            fallback: 13,
        }
    }
}

/// Immutable scoring thresholds, loaded once at startup and handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub high_turnover_threshold: u64,
    pub designated_states: Vec<String>,
    pub due_days: DueDaySchedule,
    pub window_days: u32,
    pub long_delay_days: u32,
    pub max_mean_delay_days: f64,
    pub max_long_delays: usize,
    pub unknown_delay_policy: UnknownDelayPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_turnover_threshold: 50_000_000,
            designated_states: DESIGNATED_STATES.iter().map(|s| s.to_string()).collect(),
            due_days: DueDaySchedule::default(),
            window_days: 365,
            long_delay_days: 15,
            max_mean_delay_days: 7.0,
            max_long_delays: 3,
            unknown_delay_policy: UnknownDelayPolicy::default(),
        }
    }
}
