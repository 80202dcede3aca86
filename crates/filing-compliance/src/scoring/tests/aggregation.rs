use super::common::*;

use crate::scoring::config::UnknownDelayPolicy;
use crate::scoring::domain::{DelayStatus, ReturnPeriod, Verdict};
use crate::scoring::{FailureReason, HistoryAggregator, ScoringConfig, VerdictEvaluator};

fn aggregator() -> HistoryAggregator {
    HistoryAggregator::from_config(&scoring_config())
}

fn evaluator() -> VerdictEvaluator {
    VerdictEvaluator::from_config(&scoring_config())
}

#[test]
fn punctual_year_with_one_long_delay_passes() {
    let records = monthly_history(ENTITY, [16, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4]);
    let summary = aggregator().aggregate(&entity(), &records, history_as_of());

    assert_eq!(summary.window_size, 12);
    assert!((summary.mean_delay - 5.0).abs() < f64::EPSILON);
    assert_eq!(summary.long_delay_count, 1);
    assert!(!summary.filed_in_prior_month);

    let outcome = evaluator().evaluate(&summary);
    assert_eq!(outcome.verdict, Verdict::Pass);
    assert!(outcome.reasons.is_empty());
    assert_eq!(outcome.summary(), "Pass");
}

#[test]
fn fourth_long_delay_fails() {
    let three_long = monthly_history(ENTITY, [16, 16, 16, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    let summary = aggregator().aggregate(&entity(), &three_long, history_as_of());
    assert_eq!(summary.long_delay_count, 3);
    assert_eq!(evaluator().evaluate(&summary).verdict, Verdict::Pass);

    let four_long = monthly_history(ENTITY, [16, 16, 16, 20, 0, 0, 0, 0, 0, 0, 0, 0]);
    let summary = aggregator().aggregate(&entity(), &four_long, history_as_of());
    assert_eq!(summary.long_delay_count, 4);
    assert!(summary.mean_delay <= 7.0);

    let outcome = evaluator().evaluate(&summary);
    assert_eq!(outcome.verdict, Verdict::Fail);
    assert_eq!(
        outcome.reasons,
        vec![FailureReason::TooManyLongDelays { count: 4, limit: 3 }]
    );
}

#[test]
fn delay_exactly_at_threshold_is_not_long() {
    let records = monthly_history(ENTITY, [15, 15, 15, 15, 0, 0, 0, 0, 0, 0, 0, 0]);
    let summary = aggregator().aggregate(&entity(), &records, history_as_of());
    assert_eq!(summary.long_delay_count, 0);
    assert_eq!(summary.delayed_count, 4);
}

#[test]
fn high_mean_delay_fails() {
    let records = monthly_history(ENTITY, [8; 12]);
    let summary = aggregator().aggregate(&entity(), &records, history_as_of());
    let outcome = evaluator().evaluate(&summary);

    assert_eq!(outcome.verdict, Verdict::Fail);
    assert!(matches!(
        outcome.reasons.as_slice(),
        [FailureReason::MeanDelayExceeded { .. }]
    ));
    assert!(outcome.summary().starts_with("Fail: mean delay 8.00"));
}

#[test]
fn any_filing_in_the_prior_month_fails() {
    let mut records = monthly_history(ENTITY, [0; 12]);
    records.push(record(SEED_BASE + 50, ENTITY, date(2024, 11, 18), DelayStatus::OnTime));

    let summary = aggregator().aggregate(&entity(), &records, history_as_of());
    assert!(summary.filed_in_prior_month);
    assert_eq!(summary.prior_month, ReturnPeriod::new(2024, 11).expect("valid"));

    let outcome = evaluator().evaluate(&summary);
    assert_eq!(outcome.verdict, Verdict::Fail);
    assert!(outcome.summary().contains("112024"));
}

#[test]
fn prior_month_compares_year_as_well_as_month() {
    // A January as-of looks back to December of the previous year.
    let records = vec![record(SEED_BASE, ENTITY, date(2023, 12, 20), DelayStatus::OnTime)];
    let summary = aggregator().aggregate(&entity(), &records, date(2024, 1, 10));
    assert!(summary.filed_in_prior_month);

    let summary = aggregator().aggregate(&entity(), &records, date(2024, 12, 10));
    assert!(!summary.filed_in_prior_month);
}

#[test]
fn empty_window_has_zero_mean() {
    let stale = vec![record(SEED_BASE, ENTITY, date(2022, 3, 20), DelayStatus::Delayed(30))];
    let summary = aggregator().aggregate(&entity(), &stale, history_as_of());

    assert_eq!(summary.window_size, 0);
    assert_eq!(summary.mean_delay, 0.0);
    assert!(!summary.mean_delay.is_nan());
    assert_eq!(evaluator().evaluate(&summary).verdict, Verdict::Pass);
}

#[test]
fn window_start_is_inclusive() {
    let as_of = history_as_of();
    let start = aggregator().window_start(as_of);
    assert_eq!(start, date(2023, 12, 16));

    let records = vec![
        record(SEED_BASE, ENTITY, start, DelayStatus::Delayed(3)),
        record(SEED_BASE + 1, ENTITY, start.pred_opt().expect("valid"), DelayStatus::Delayed(40)),
    ];
    let summary = aggregator().aggregate(&entity(), &records, as_of);
    assert_eq!(summary.window_size, 1);
    assert!((summary.mean_delay - 3.0).abs() < f64::EPSILON);
}

#[test]
fn other_entities_are_ignored() {
    let mut records = monthly_history(ENTITY, [0; 12]);
    records.push(record(SEED_BASE + 90, "07AAGCD1764K1ZH", date(2024, 6, 20), DelayStatus::Delayed(60)));

    let summary = aggregator().aggregate(&entity(), &records, history_as_of());
    assert_eq!(summary.window_size, 12);
    assert_eq!(summary.long_delay_count, 0);
}

#[test]
fn unknown_delay_counts_as_zero_by_default() {
    let records = vec![
        record(SEED_BASE, ENTITY, date(2024, 6, 20), DelayStatus::Delayed(10)),
        record(SEED_BASE + 1, ENTITY, date(2024, 7, 20), DelayStatus::Unknown),
    ];
    let summary = aggregator().aggregate(&entity(), &records, history_as_of());

    assert_eq!(summary.window_size, 2);
    assert_eq!(summary.known_delay_count, 1);
    assert_eq!(summary.unknown_delay_count, 1);
    assert!((summary.mean_delay - 5.0).abs() < f64::EPSILON);
}

#[test]
fn unknown_delay_can_be_excluded_from_the_mean() {
    let config = ScoringConfig {
        unknown_delay_policy: UnknownDelayPolicy::Exclude,
        ..ScoringConfig::default()
    };
    let records = vec![
        record(SEED_BASE, ENTITY, date(2024, 6, 20), DelayStatus::Delayed(10)),
        record(SEED_BASE + 1, ENTITY, date(2024, 7, 20), DelayStatus::Unknown),
    ];
    let summary = HistoryAggregator::from_config(&config).aggregate(&entity(), &records, history_as_of());

    assert!((summary.mean_delay - 10.0).abs() < f64::EPSILON);
    assert_eq!(summary.window_size, 2);
}

#[test]
fn only_unknown_delays_under_exclusion_yield_zero_mean() {
    let config = ScoringConfig {
        unknown_delay_policy: UnknownDelayPolicy::Exclude,
        ..ScoringConfig::default()
    };
    let records = vec![record(SEED_BASE, ENTITY, date(2024, 6, 20), DelayStatus::Unknown)];
    let summary = HistoryAggregator::from_config(&config).aggregate(&entity(), &records, history_as_of());
    assert_eq!(summary.mean_delay, 0.0);
}
