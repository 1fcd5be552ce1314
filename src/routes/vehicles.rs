// ABOUTME: Vehicle route handlers: grouped listing, stats, search, CRUD,
// ABOUTME: image upload, and the fleet oil-change due report

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::oil::{self, OilStatusEntry};
use crate::types::{
    GroupedVehicles, NewVehicle, Vehicle, VehiclePatch, VehicleStats, VehicleType,
    VehicleWithCounts,
};
use crate::uploads::{self, UploadKind};

use super::{RecentQuery, SearchQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/recent", get(recent))
        .route("/stats", get(stats))
        .route("/search", get(search))
        .route("/oil-status", get(oil_status))
        .route("/type/:vehicle_type", get(by_type))
        .route("/:id", get(get_one).put(update).delete(remove))
        .route("/:id/image", post(upload_image))
}

async fn list(State(state): State<AppState>) -> Result<Json<GroupedVehicles>> {
    let grouped = state
        .storage
        .get_vehicles_grouped()
        .await
        .map_err(|e| e.action("fetch vehicles"))?;
    Ok(Json(grouped))
}

async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Vehicle>>> {
    let vehicles = state
        .storage
        .get_recent_vehicles(query.limit())
        .await
        .map_err(|e| e.action("fetch recent vehicles"))?;
    Ok(Json(vehicles))
}

async fn stats(State(state): State<AppState>) -> Result<Json<VehicleStats>> {
    let stats = state
        .storage
        .get_vehicle_stats()
        .await
        .map_err(|e| e.action("fetch statistics"))?;
    Ok(Json(stats))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Vehicle>>> {
    let term = query
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query required".to_string()))?;

    let vehicles = state
        .storage
        .search_vehicles(&term)
        .await
        .map_err(|e| e.action("search vehicles"))?;
    Ok(Json(vehicles))
}

/// Due report for every car and motorcycle, most urgent first. Bikes
/// have no oil and are excluded.
async fn oil_status(State(state): State<AppState>) -> Result<Json<Vec<OilStatusEntry>>> {
    let vehicles = state
        .storage
        .get_all_vehicles()
        .await
        .map_err(|e| e.action("fetch vehicles"))?;

    let mut with_last = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        if !matches!(
            vehicle.vehicle_type,
            VehicleType::Car | VehicleType::Motorcycle
        ) {
            continue;
        }
        let last = state
            .storage
            .get_last_oil_change(vehicle.id)
            .await
            .map_err(|e| e.action("fetch last oil change"))?;
        with_last.push((vehicle, last));
    }

    let today = chrono::Local::now().date_naive();
    Ok(Json(oil::report(with_last, today)))
}

async fn by_type(
    State(state): State<AppState>,
    Path(vehicle_type): Path<String>,
) -> Result<Json<Vec<VehicleWithCounts>>> {
    let vehicle_type = VehicleType::parse(&vehicle_type)
        .ok_or_else(|| AppError::Validation("Invalid vehicle type".to_string()))?;

    let vehicles = state
        .storage
        .get_vehicles_by_type(vehicle_type)
        .await
        .map_err(|e| e.action("fetch vehicles"))?;
    Ok(Json(vehicles))
}

async fn get_one(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Vehicle>> {
    let vehicle = state
        .storage
        .get_vehicle(id)
        .await
        .map_err(|e| e.action("fetch vehicle"))?;
    Ok(Json(vehicle))
}

async fn create(
    State(state): State<AppState>,
    Json(data): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>)> {
    let vehicle = state
        .storage
        .create_vehicle(&data)
        .await
        .map_err(|e| e.action("create vehicle"))?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<VehiclePatch>,
) -> Result<Json<Vehicle>> {
    let vehicle = state
        .storage
        .update_vehicle(id, &patch)
        .await
        .map_err(|e| e.action("update vehicle"))?;
    Ok(Json(vehicle))
}

/// Replaces the vehicle's image: writes the new file, points the row
/// at it, then unlinks the previous one. A failed row update discards
/// the freshly written file.
async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Vehicle>> {
    let existing = state
        .storage
        .get_vehicle(id)
        .await
        .map_err(|e| e.action("fetch vehicle"))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            let file_name = field
                .file_name()
                .map(|f| f.to_string())
                .unwrap_or_else(|| "image".to_string());
            let data = field.bytes().await?;
            upload = Some((file_name, data));
        }
    }
    let (file_name, data) = upload
        .ok_or_else(|| AppError::Validation("Image file required".to_string()))?;

    let saved =
        uploads::save_upload(&state.upload_dir, UploadKind::VehicleImage, &file_name, &data)
            .await?;

    if let Err(err) = state.storage.set_vehicle_image(id, Some(&saved.url_path)).await {
        uploads::discard(&saved).await;
        return Err(err.action("update vehicle"));
    }

    if let Some(old) = &existing.image_path {
        uploads::remove_stored(&state.upload_dir, old).await;
    }

    let vehicle = state
        .storage
        .get_vehicle(id)
        .await
        .map_err(|e| e.action("fetch vehicle"))?;
    Ok(Json(vehicle))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let vehicle = state
        .storage
        .get_vehicle(id)
        .await
        .map_err(|e| e.action("delete vehicle"))?;

    state
        .storage
        .delete_vehicle(id)
        .await
        .map_err(|e| e.action("delete vehicle"))?;

    if let Some(image) = &vehicle.image_path {
        uploads::remove_stored(&state.upload_dir, image).await;
    }

    Ok(Json(json!({ "message": "Vehicle deleted successfully" })))
}
