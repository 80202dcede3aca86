use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::domain::{FilingSubmission, ReturnType, TurnoverInput};
use super::error::ScoringError;
use super::repository::FilingRepository;
use super::service::ComplianceService;

#[derive(Debug)]
pub enum FilingImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Scoring { line: usize, source: ScoringError },
}

impl std::fmt::Display for FilingImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilingImportError::Io(err) => write!(f, "failed to read filing export: {}", err),
            FilingImportError::Csv(err) => write!(f, "invalid filing CSV data: {}", err),
            FilingImportError::Scoring { line, source } => {
                write!(f, "could not record filing on line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for FilingImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilingImportError::Io(err) => Some(err),
            FilingImportError::Csv(err) => Some(err),
            FilingImportError::Scoring { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for FilingImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for FilingImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads a CSV export of filed returns into a [`ComplianceService`].
///
/// Expected headers: `Entity ID`, `Return Type`, `Filing Date`, `Return Period`, `State`,
/// `Annual Turnover`. The last two may be blank.
///
/// Every row is validated before the first one is stored, so a malformed export leaves the store
/// untouched. A store failure midway through the insert pass can still leave earlier rows behind.
pub struct FilingCsvImporter;

impl FilingCsvImporter {
    pub fn from_path<P, R>(
        path: P,
        service: &ComplianceService<R>,
        as_of: NaiveDate,
    ) -> Result<usize, FilingImportError>
    where
        P: AsRef<Path>,
        R: FilingRepository + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service, as_of)
    }

    pub fn from_reader<T, R>(
        reader: T,
        service: &ComplianceService<R>,
        as_of: NaiveDate,
    ) -> Result<usize, FilingImportError>
    where
        T: Read,
        R: FilingRepository + 'static,
    {
        let submissions = parse_submissions(reader)?;
        let count = submissions.len();

        for (index, submission) in submissions.iter().enumerate() {
            service
                .validate_submission(submission)
                .map_err(|source| FilingImportError::Scoring {
                    // header is line 1
                    line: index + 2,
                    source,
                })?;
        }

        for (index, submission) in submissions.into_iter().enumerate() {
            service
                .record_filing(submission, as_of)
                .map_err(|source| FilingImportError::Scoring {
                    line: index + 2,
                    source,
                })?;
        }

        Ok(count)
    }
}

pub fn parse_submissions<R: Read>(reader: R) -> Result<Vec<FilingSubmission>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for row in csv_reader.deserialize::<FilingRow>() {
        submissions.push(row?.into_submission());
    }

    Ok(submissions)
}

#[derive(Debug, Deserialize)]
struct FilingRow {
    #[serde(rename = "Entity ID")]
    entity_id: String,
    #[serde(rename = "Return Type")]
    return_type: String,
    #[serde(rename = "Filing Date")]
    filing_date: String,
    #[serde(rename = "Return Period")]
    return_period: String,
    #[serde(rename = "State", default, deserialize_with = "empty_string_as_none")]
    state: Option<String>,
    #[serde(
        rename = "Annual Turnover",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    annual_turnover: Option<String>,
}

impl FilingRow {
    fn into_submission(self) -> FilingSubmission {
        FilingSubmission {
            entity_id: self.entity_id,
            return_type: ReturnType::from_code(&self.return_type),
            filing_date: self.filing_date,
            return_period: self.return_period,
            state: self.state,
            turnover: self.annual_turnover.map(TurnoverInput::Text),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
