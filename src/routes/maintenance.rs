// ABOUTME: Maintenance route handlers: logs, tags, aggregates, quick-add,
// ABOUTME: and the last-oil-change lookup

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::types::{
    CostSummary, MaintenanceLog, MaintenanceLogPatch, MaintenanceLogWithTags, NewMaintenanceLog,
    NewTag, QuickAddRequest, Tag, TagWithUsage,
};

use super::RecentQuery;

#[derive(Debug, Deserialize)]
struct CostSummaryQuery {
    vehicle_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/recent", get(recent))
        .route("/cost-summary", get(cost_summary))
        .route("/date-range", get(date_range))
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/:tag_id/logs", get(logs_by_tag))
        .route("/vehicle/:vehicle_id", get(for_vehicle).post(create))
        .route("/vehicle/:vehicle_id/quick-add", post(quick_add))
        .route("/vehicle/:vehicle_id/last-oil-change", get(last_oil_change))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<MaintenanceLogWithTags>>> {
    let logs = state
        .storage
        .get_all_logs()
        .await
        .map_err(|e| e.action("fetch maintenance logs"))?;
    Ok(Json(logs))
}

async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<MaintenanceLogWithTags>>> {
    let logs = state
        .storage
        .get_recent_logs(query.limit())
        .await
        .map_err(|e| e.action("fetch recent maintenance"))?;
    Ok(Json(logs))
}

async fn cost_summary(
    State(state): State<AppState>,
    Query(query): Query<CostSummaryQuery>,
) -> Result<Json<CostSummary>> {
    let summary = state
        .storage
        .get_cost_summary(query.vehicle_id)
        .await
        .map_err(|e| e.action("fetch cost summary"))?;
    Ok(Json(summary))
}

async fn date_range(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<MaintenanceLogWithTags>>> {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return Err(AppError::Validation(
            "Start date and end date required".to_string(),
        ));
    };

    let logs = state
        .storage
        .get_logs_by_date_range(start, end)
        .await
        .map_err(|e| e.action("fetch maintenance logs"))?;
    Ok(Json(logs))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagWithUsage>>> {
    let tags = state
        .storage
        .get_all_tags()
        .await
        .map_err(|e| e.action("fetch tags"))?;
    Ok(Json(tags))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(data): Json<NewTag>,
) -> Result<(StatusCode, Json<Tag>)> {
    let tag = state
        .storage
        .create_tag(&data)
        .await
        .map_err(|e| e.action("create tag"))?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn logs_by_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> Result<Json<Vec<MaintenanceLogWithTags>>> {
    let logs = state
        .storage
        .get_logs_by_tag(tag_id)
        .await
        .map_err(|e| e.action("fetch maintenance logs"))?;
    Ok(Json(logs))
}

async fn for_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
) -> Result<Json<Vec<MaintenanceLogWithTags>>> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("fetch maintenance logs"))?;

    let logs = state
        .storage
        .get_logs_for_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("fetch maintenance logs"))?;
    Ok(Json(logs))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceLogWithTags>> {
    let log = state
        .storage
        .get_log(id)
        .await
        .map_err(|e| e.action("fetch maintenance log"))?;
    Ok(Json(log))
}

async fn create(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
    Json(data): Json<NewMaintenanceLog>,
) -> Result<(StatusCode, Json<MaintenanceLogWithTags>)> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("create maintenance log"))?;

    let log = state
        .storage
        .create_log(vehicle_id, &data)
        .await
        .map_err(|e| e.action("create maintenance log"))?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MaintenanceLogPatch>,
) -> Result<Json<MaintenanceLogWithTags>> {
    let log = state
        .storage
        .update_log(id, &patch)
        .await
        .map_err(|e| e.action("update maintenance log"))?;
    Ok(Json(log))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state
        .storage
        .delete_log(id)
        .await
        .map_err(|e| e.action("delete maintenance log"))?;
    Ok(Json(json!({ "message": "Maintenance log deleted successfully" })))
}

async fn quick_add(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
    Json(request): Json<QuickAddRequest>,
) -> Result<(StatusCode, Json<MaintenanceLogWithTags>)> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("create maintenance log"))?;

    let today = chrono::Local::now().date_naive();
    let log = state
        .storage
        .quick_add_log(vehicle_id, &request.kind, request.mileage, today)
        .await
        .map_err(|e| e.action("create maintenance log"))?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn last_oil_change(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
) -> Result<Json<Option<MaintenanceLog>>> {
    let log = state
        .storage
        .get_last_oil_change(vehicle_id)
        .await
        .map_err(|e| e.action("fetch last oil change"))?;
    Ok(Json(log))
}
