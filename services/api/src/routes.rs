use crate::infra::{AppState, DocumentSelection, ImportRequest, TrackerContext};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Local};
use jc_tracker::error::AppError;
use jc_tracker::workflows::quip::{DropSummary, PeriodFailure, PeriodTables};
use jc_tracker::workflows::tracker::{
    owners, rank_specialists, records_csv_file_name, status_counts, write_records_csv,
    RankingRow, ReportBook, SnapshotComparison, SnapshotId, SnapshotRepository, StatusCount,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct TablesResponse {
    pub(crate) periods: Vec<PeriodTables>,
    pub(crate) weeks: Vec<String>,
    pub(crate) failures: Vec<PeriodFailure>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportResponse {
    pub(crate) weeks: Vec<String>,
    pub(crate) captured_at: DateTime<Local>,
    pub(crate) total_records: usize,
    pub(crate) dropped: DropSummary,
    pub(crate) failures: Vec<PeriodFailure>,
    pub(crate) owners: Vec<String>,
    pub(crate) status_distribution: Vec<StatusCount>,
    pub(crate) rankings: Vec<RankingRow>,
    pub(crate) book: ReportBook,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSnapshotRequest {
    #[serde(flatten)]
    pub(crate) import: ImportRequest,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SnapshotCreated {
    pub(crate) id: SnapshotId,
    pub(crate) total_tasks: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct SnapshotSummary {
    pub(crate) id: SnapshotId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    pub(crate) created_at: DateTime<Local>,
    pub(crate) total_tasks: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareQuery {
    pub(crate) before: String,
    pub(crate) after: String,
}

/// Tracker endpoints sharing one context (document source plus snapshot store).
pub(crate) fn tracker_router<R>(context: Arc<TrackerContext<R>>) -> Router
where
    R: SnapshotRepository + 'static,
{
    Router::new()
        .route("/api/v1/tables", post(tables_endpoint::<R>))
        .route("/api/v1/report", post(report_endpoint::<R>))
        .route("/api/v1/records/export", post(export_endpoint::<R>))
        .route(
            "/api/v1/snapshots",
            post(create_snapshot_endpoint::<R>).get(list_snapshots_endpoint::<R>),
        )
        .route(
            "/api/v1/snapshots/compare",
            get(compare_snapshots_endpoint::<R>),
        )
        .with_state(context)
}

pub(crate) fn with_tracker_routes<R>(context: Arc<TrackerContext<R>>) -> Router
where
    R: SnapshotRepository + 'static,
{
    tracker_router(context)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn tables_endpoint<R>(
    State(context): State<Arc<TrackerContext<R>>>,
    Json(selection): Json<DocumentSelection>,
) -> Result<Json<TablesResponse>, AppError>
where
    R: SnapshotRepository + 'static,
{
    let loaded = context.load(&selection)?;
    loaded.ensure_loaded()?;

    Ok(Json(TablesResponse {
        periods: context.importer.tables_by_period(&loaded),
        weeks: context.importer.available_weeks(&loaded),
        failures: loaded.failures().to_vec(),
    }))
}

pub(crate) async fn report_endpoint<R>(
    State(context): State<Arc<TrackerContext<R>>>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ReportResponse>, AppError>
where
    R: SnapshotRepository + 'static,
{
    let outcome = context.import(&request)?;
    let records = &outcome.records;

    Ok(Json(ReportResponse {
        total_records: records.len(),
        owners: owners(records),
        status_distribution: status_counts(records),
        rankings: rank_specialists(records),
        book: ReportBook::build(records, &outcome.weeks),
        weeks: outcome.weeks,
        captured_at: outcome.captured_at,
        dropped: outcome.dropped,
        failures: outcome.failures,
    }))
}

pub(crate) async fn export_endpoint<R>(
    State(context): State<Arc<TrackerContext<R>>>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError>
where
    R: SnapshotRepository + 'static,
{
    let outcome = context.import(&request)?;
    let mut body = Vec::new();
    write_records_csv(&outcome.records, &mut body)?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        records_csv_file_name(outcome.captured_at)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub(crate) async fn create_snapshot_endpoint<R>(
    State(context): State<Arc<TrackerContext<R>>>,
    Json(request): Json<CreateSnapshotRequest>,
) -> Result<(StatusCode, Json<SnapshotCreated>), AppError>
where
    R: SnapshotRepository + 'static,
{
    let outcome = context.import(&request.import)?;
    let total_tasks = outcome.records.len();
    let id = context
        .snapshots
        .create(outcome.records, request.description)?;

    Ok((StatusCode::CREATED, Json(SnapshotCreated { id, total_tasks })))
}

pub(crate) async fn list_snapshots_endpoint<R>(
    State(context): State<Arc<TrackerContext<R>>>,
) -> Result<Json<Vec<SnapshotSummary>>, AppError>
where
    R: SnapshotRepository + 'static,
{
    let mut summaries = Vec::new();
    for id in context.snapshots.list_ids()? {
        if let Some(snapshot) = context.snapshots.get(&id)? {
            summaries.push(SnapshotSummary {
                id,
                description: snapshot.description.clone(),
                created_at: snapshot.created_at,
                total_tasks: snapshot.metrics.total_tasks,
            });
        }
    }
    Ok(Json(summaries))
}

pub(crate) async fn compare_snapshots_endpoint<R>(
    State(context): State<Arc<TrackerContext<R>>>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<SnapshotComparison>, AppError>
where
    R: SnapshotRepository + 'static,
{
    let comparison = context
        .snapshots
        .compare(&SnapshotId(query.before), &SnapshotId(query.after))?;
    Ok(Json(comparison))
}
