// ABOUTME: Manual route handlers: listings, search, PDF upload, rename, delete
// ABOUTME: Uploads are written to disk first and discarded if the insert fails

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::types::{ManualPatch, ManualWithVehicle, NewManual, TypeCounts};
use crate::uploads::{self, UploadKind};

use super::{RecentQuery, SearchQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/recent", get(recent))
        .route("/count-by-type", get(count_by_type))
        .route("/search", get(search))
        .route("/vehicle/:vehicle_id", get(for_vehicle).post(upload))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<ManualWithVehicle>>> {
    let manuals = state
        .storage
        .get_all_manuals()
        .await
        .map_err(|e| e.action("fetch manuals"))?;
    Ok(Json(manuals))
}

async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ManualWithVehicle>>> {
    let manuals = state
        .storage
        .get_recent_manuals(query.limit())
        .await
        .map_err(|e| e.action("fetch recent manuals"))?;
    Ok(Json(manuals))
}

async fn count_by_type(State(state): State<AppState>) -> Result<Json<TypeCounts>> {
    let counts = state
        .storage
        .count_manuals_by_vehicle_type()
        .await
        .map_err(|e| e.action("fetch manual counts"))?;
    Ok(Json(counts))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ManualWithVehicle>>> {
    let term = query
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query required".to_string()))?;

    let manuals = state
        .storage
        .search_manuals(&term)
        .await
        .map_err(|e| e.action("search manuals"))?;
    Ok(Json(manuals))
}

async fn for_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
) -> Result<Json<Vec<ManualWithVehicle>>> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("fetch manuals"))?;

    let manuals = state
        .storage
        .get_manuals_for_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("fetch manuals"))?;
    Ok(Json(manuals))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ManualWithVehicle>> {
    let manual = state
        .storage
        .get_manual(id)
        .await
        .map_err(|e| e.action("fetch manual"))?;
    Ok(Json(manual))
}

async fn upload(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ManualWithVehicle>)> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("upload manual"))?;

    let mut title = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => title = Some(field.text().await?),
            Some("manual") => {
                let file_name = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "manual.pdf".to_string());
                let data = field.bytes().await?;
                file = Some((file_name, data));
            }
            _ => {}
        }
    }
    let (file_name, data) =
        file.ok_or_else(|| AppError::Validation("Manual file required".to_string()))?;

    // default the title to the uploaded file's stem
    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| uploads::file_stem(&file_name));

    let saved = uploads::save_upload(&state.upload_dir, UploadKind::Manual, &file_name, &data).await?;

    let manual = state
        .storage
        .create_manual(&NewManual {
            vehicle_id,
            title,
            file_path: saved.url_path.clone(),
            file_type: Some("pdf".to_string()),
        })
        .await;

    match manual {
        Ok(manual) => Ok((StatusCode::CREATED, Json(manual))),
        Err(err) => {
            uploads::discard(&saved).await;
            Err(err.action("upload manual"))
        }
    }
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ManualPatch>,
) -> Result<Json<ManualWithVehicle>> {
    let title = patch
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Title required".to_string()))?;

    let manual = state
        .storage
        .update_manual(id, &title)
        .await
        .map_err(|e| e.action("update manual"))?;
    Ok(Json(manual))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let manual = state
        .storage
        .get_manual(id)
        .await
        .map_err(|e| e.action("delete manual"))?;

    state
        .storage
        .delete_manual(id)
        .await
        .map_err(|e| e.action("delete manual"))?;

    uploads::remove_stored(&state.upload_dir, &manual.manual.file_path).await;

    Ok(Json(json!({ "message": "Manual deleted successfully" })))
}
