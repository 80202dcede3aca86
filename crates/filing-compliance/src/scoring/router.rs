use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use super::domain::{
    parse_filing_date, EntityId, FilingRecord, FilingSubmission, ReturnType, Turnover,
    TurnoverInput,
};
use super::error::ScoringError;
use super::repository::{FilingRepository, RepositoryError};
use super::service::ComplianceService;

/// Router builder exposing the scoring engine's operations over HTTP.
pub fn scoring_router<R>(service: Arc<ComplianceService<R>>) -> Router
where
    R: FilingRepository + 'static,
{
    Router::new()
        .route("/api/v1/filings", post(record_filing_handler::<R>))
        .route("/api/v1/due-date", get(due_date_handler::<R>))
        .route(
            "/api/v1/entities/:entity_id/filings",
            get(entity_records_handler::<R>),
        )
        .route(
            "/api/v1/entities/:entity_id/score",
            get(entity_score_handler::<R>),
        )
        .route(
            "/api/v1/entities/:entity_id/turnover",
            put(turnover_update_handler::<R>),
        )
        .route(
            "/api/v1/entities/:entity_id/status",
            put(status_override_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default)]
    pub(crate) as_of: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DueDateQuery {
    pub(crate) return_type: String,
    #[serde(default)]
    pub(crate) state: Option<String>,
    #[serde(default)]
    pub(crate) turnover: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TurnoverUpdateRequest {
    /// Must be present; an explicit `null` leaves the records untouched.
    #[serde(deserialize_with = "present_or_null")]
    pub(crate) turnover: Option<TurnoverInput>,
    #[serde(default)]
    pub(crate) as_of: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusOverrideRequest {
    pub(crate) verdict: String,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<TurnoverInput>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TurnoverInput>::deserialize(deserializer)
}

pub(crate) async fn record_filing_handler<R>(
    State(service): State<Arc<ComplianceService<R>>>,
    Query(query): Query<AsOfQuery>,
    Json(submission): Json<FilingSubmission>,
) -> Response
where
    R: FilingRepository + 'static,
{
    let result = resolve_as_of(query.as_of.as_deref())
        .and_then(|as_of| service.record_filing(submission, as_of));

    match result {
        Ok(record) => (StatusCode::CREATED, Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn due_date_handler<R>(
    State(service): State<Arc<ComplianceService<R>>>,
    Query(query): Query<DueDateQuery>,
) -> Response
where
    R: FilingRepository + 'static,
{
    let return_type = ReturnType::from_code(&query.return_type);
    let result = Turnover::parse_str(query.turnover.as_deref().unwrap_or_default())
        .map_err(ScoringError::from)
        .and_then(|turnover| {
            service.compute_due_date(&return_type, query.state.as_deref(), turnover)
        });

    match result {
        Ok(due_day) => {
            let payload = json!({
                "return_type": return_type.code(),
                "due_day": due_day,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn entity_records_handler<R>(
    State(service): State<Arc<ComplianceService<R>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    R: FilingRepository + 'static,
{
    let result = EntityId::parse(&entity_id)
        .map_err(ScoringError::from)
        .and_then(|id| service.entity_records(&id));

    match result {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(FilingRecord::view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn entity_score_handler<R>(
    State(service): State<Arc<ComplianceService<R>>>,
    Path(entity_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    R: FilingRepository + 'static,
{
    let result = EntityId::parse(&entity_id)
        .map_err(ScoringError::from)
        .and_then(|id| {
            let as_of = resolve_as_of(query.as_of.as_deref())?;
            service.entity_score(&id, as_of)
        });

    match result {
        Ok(score) => (StatusCode::OK, Json(score)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn turnover_update_handler<R>(
    State(service): State<Arc<ComplianceService<R>>>,
    Path(entity_id): Path<String>,
    Json(request): Json<TurnoverUpdateRequest>,
) -> Response
where
    R: FilingRepository + 'static,
{
    let result = EntityId::parse(&entity_id)
        .map_err(ScoringError::from)
        .and_then(|id| {
            let as_of = resolve_as_of(request.as_of.as_deref())?;
            service.apply_turnover_update(&id, request.turnover.as_ref(), as_of)
        });

    match result {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_override_handler<R>(
    State(service): State<Arc<ComplianceService<R>>>,
    Path(entity_id): Path<String>,
    Json(request): Json<StatusOverrideRequest>,
) -> Response
where
    R: FilingRepository + 'static,
{
    let result = EntityId::parse(&entity_id)
        .map_err(ScoringError::from)
        .and_then(|id| service.apply_status_override(&id, &request.verdict));

    match result {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

fn resolve_as_of(raw: Option<&str>) -> Result<NaiveDate, ScoringError> {
    match raw {
        Some(raw) => Ok(parse_filing_date(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

pub(crate) fn error_response(err: ScoringError) -> Response {
    let status = match &err {
        ScoringError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScoringError::NotFound(_) | ScoringError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        ScoringError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ScoringError::Computation(_) | ScoringError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
