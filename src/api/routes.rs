use crate::analyzer::calendar::{self, MonthGrid};
use crate::analyzer::estimate::preview_one_rm;
use crate::analyzer::history::HistoryGroup;
use crate::analyzer::progress::ProgressSeries;
use crate::analyzer::{DerivedViews, LogSummary};
use crate::config::Config;
use crate::record::{LogForm, LogRecord};
use crate::store::Session;
use crate::tracker::Tracker;
use crate::transfer::{self, ImportSummary};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{Datelike, Local};
use http::{HeaderValue, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub tracker: Tracker,
    pub views: watch::Receiver<Arc<DerivedViews>>,
}

impl ApiState {
    fn views(&self) -> Arc<DerivedViews> {
        Arc::clone(&self.views.borrow())
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/logs", get(logs).post(create_log))
        .route("/api/v1/logs/:id", delete(delete_log))
        .route("/api/v1/history", get(history))
        .route("/api/v1/calendar", get(calendar_month))
        .route("/api/v1/progress/:exercise", get(progress))
        .route("/api/v1/preview", get(preview))
        .route("/api/v1/exercises", get(exercises).post(add_exercise))
        .route("/api/v1/export", get(export))
        .route("/api/v1/import", post(import))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    month: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    weight: Option<String>,
    reps: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExercisePayload {
    name: String,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    session: Option<Session>,
    last_written_at: Option<i64>,
    summary: LogSummary,
    api_port: u16,
}

#[derive(Debug, Serialize)]
struct LogsPayload {
    count: usize,
    logs: Vec<LogRecord>,
}

#[derive(Debug, Serialize)]
struct HistoryPayload {
    days: usize,
    groups: Vec<HistoryGroup>,
}

#[derive(Debug, Serialize)]
struct CalendarPayload {
    previous: String,
    next: String,
    #[serde(flatten)]
    grid: MonthGrid,
}

#[derive(Debug, Serialize)]
struct ExercisesPayload {
    exercises: Vec<String>,
    custom: Vec<String>,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let store = state.tracker.store();

    Ok(Json(StatusPayload {
        session: store.session().cloned(),
        last_written_at: store.latest_write_timestamp().await?,
        summary: state.views().summary.clone(),
        api_port: state.config.api_port,
    }))
}

async fn logs(State(state): State<ApiState>) -> Json<LogsPayload> {
    let views = state.views();

    Json(LogsPayload {
        count: views.records.len(),
        logs: views.records.to_vec(),
    })
}

async fn create_log(State(state): State<ApiState>, Json(form): Json<LogForm>) -> Json<Value> {
    let id = state.tracker.save_log(&form).await;

    Json(json!({
        "saved": id.is_some(),
        "id": id,
        "estimated_one_rm": preview_one_rm(&form.weight, &form.reps),
    }))
}

async fn delete_log(State(state): State<ApiState>, Path(id): Path<i64>) -> Json<Value> {
    let deleted = state.tracker.delete_log(id).await;
    Json(json!({ "deleted": deleted, "id": id }))
}

async fn history(State(state): State<ApiState>) -> Json<HistoryPayload> {
    let groups = state.views().history.clone();

    Json(HistoryPayload {
        days: groups.len(),
        groups,
    })
}

async fn calendar_month(
    State(state): State<ApiState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarPayload>> {
    let (year, month) = match query.month.as_deref() {
        Some(raw) => {
            calendar::parse_month(raw).map_err(|error| ApiError::BadRequest(error.to_string()))?
        }
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };

    let grid = calendar::month_grid(year, month, &state.views().training_days)?;
    let (previous_year, previous_month) = calendar::shift_month(year, month, -1)?;
    let (next_year, next_month) = calendar::shift_month(year, month, 1)?;

    Ok(Json(CalendarPayload {
        previous: format!("{previous_year:04}-{previous_month:02}"),
        next: format!("{next_year:04}-{next_month:02}"),
        grid,
    }))
}

async fn progress(
    State(state): State<ApiState>,
    Path(exercise): Path<String>,
) -> Json<ProgressSeries> {
    Json(state.views().progress_for(&exercise))
}

async fn preview(Query(query): Query<PreviewQuery>) -> Json<Value> {
    let one_rm = preview_one_rm(
        query.weight.as_deref().unwrap_or_default(),
        query.reps.as_deref().unwrap_or_default(),
    );
    Json(json!({ "estimated_one_rm": one_rm }))
}

async fn exercises(State(state): State<ApiState>) -> Json<ExercisesPayload> {
    let registry = state.tracker.registry();

    Json(ExercisesPayload {
        exercises: registry.names(),
        custom: registry.custom().to_vec(),
    })
}

async fn add_exercise(
    State(state): State<ApiState>,
    Json(payload): Json<ExercisePayload>,
) -> Json<Value> {
    let added = state.tracker.add_exercise(&payload.name).await;
    Json(json!({ "added": added, "name": payload.name }))
}

async fn export(State(state): State<ApiState>) -> ApiResult<Response> {
    let content = transfer::export_csv(&state.views().records)?;
    let filename = transfer::export_file_name(Local::now().date_naive());

    let mut response = Response::new(content.into_response().into_body());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))?,
    );

    Ok(response)
}

async fn import(State(state): State<ApiState>, body: String) -> ApiResult<Json<ImportSummary>> {
    let summary = state
        .tracker
        .import_csv(&body)
        .await
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(summary))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<http::header::InvalidHeaderValue> for ApiError {
    fn from(value: http::header::InvalidHeaderValue) -> Self {
        Self::Internal(value.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}
