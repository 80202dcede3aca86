use crate::infra::InMemoryFilingRepository;
use chrono::{Local, NaiveDate};
use clap::Args;
use filing_compliance::config::AppConfig;
use filing_compliance::error::AppError;
use filing_compliance::scoring::{
    ComplianceScore, ComplianceService, DelayStatus, EntityId, FilingCsvImporter, FilingRecord,
    ScoringError, Turnover,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreReportArgs {
    /// CSV export of filed returns
    #[arg(long)]
    pub(crate) records: PathBuf,
    /// Entity to score
    #[arg(long)]
    pub(crate) entity: String,
    /// Evaluation date (YYYY-MM-DD or DD-MM-YYYY, defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Include every stored record of the entity in the output
    #[arg(long)]
    pub(crate) list_records: bool,
}

pub(crate) fn run_score_report(args: ScoreReportArgs) -> Result<(), AppError> {
    let ScoreReportArgs {
        records,
        entity,
        as_of,
        list_records,
    } = args;

    let config = AppConfig::load()?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let service = ComplianceService::new(
        Arc::new(InMemoryFilingRepository::default()),
        &config.scoring,
    );

    let imported = FilingCsvImporter::from_path(&records, &service, as_of)?;
    let entity_id = EntityId::parse(&entity).map_err(ScoringError::from)?;
    let score = service.entity_score(&entity_id, as_of)?;

    println!(
        "Loaded {} filings from {}",
        imported,
        records.display()
    );
    for line in score_lines(&score) {
        println!("{line}");
    }

    if list_records {
        println!("\nRecords");
        for record in service.entity_records(&entity_id)? {
            println!("- {}", record_line(&record));
        }
    }

    Ok(())
}

fn score_lines(score: &ComplianceScore) -> Vec<String> {
    let summary = &score.summary;
    let turnover = match score.profile.turnover {
        Turnover::Known(amount) => amount.to_string(),
        Turnover::Unknown => "unknown".to_string(),
    };

    let mut lines = vec![
        format!(
            "Compliance score for {} as of {}",
            summary.entity_id, summary.as_of
        ),
        format!(
            "Profile: state {}, annual turnover {}",
            score.profile.state.as_deref().unwrap_or("unknown"),
            turnover
        ),
        format!(
            "Window {} -> {}: {} filings ({} with unknown delay)",
            summary.window_start, summary.as_of, summary.window_size, summary.unknown_delay_count
        ),
        format!(
            "Delayed filings: {} | mean delay {:.2} days | long delays {}",
            summary.delayed_count, summary.mean_delay, summary.long_delay_count
        ),
        format!(
            "Filed in {}: {}",
            summary.prior_month,
            if summary.filed_in_prior_month { "yes" } else { "no" }
        ),
        format!("Verdict: {}", score.outcome.verdict.label()),
    ];

    for reason in &score.outcome.reasons {
        lines.push(format!("  - {}", reason.summary()));
    }

    lines
}

fn record_line(record: &FilingRecord) -> String {
    let delay = match record.delay {
        DelayStatus::Unknown => "delay unknown".to_string(),
        DelayStatus::OnTime => "on time".to_string(),
        DelayStatus::Delayed(days) => format!("{days} days late"),
    };
    let verdict = record
        .verdict
        .map(|verdict| verdict.label())
        .unwrap_or("unscored");

    format!(
        "#{} {} period {} filed {}: {}, {}",
        record.id.0,
        record.return_type.code(),
        record.return_period,
        record.filing_date,
        delay,
        verdict
    )
}
