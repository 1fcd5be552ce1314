// ABOUTME: Video route handlers: YouTube links and local uploads per vehicle
// ABOUTME: Uploaded media and thumbnails are discarded if the insert fails

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::types::{NewVideo, VideoPatch, VideoType, VideoTypeCounts, TypeCounts, VideoWithVehicle};
use crate::uploads::{self, SavedUpload, UploadKind};

use super::{RecentQuery, SearchQuery};

static YOUTUBE_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
            .expect("valid pattern"),
        Regex::new(r"youtube\.com/v/([^&\n?#]+)").expect("valid pattern"),
    ]
});

fn extract_youtube_id(url: &str) -> Option<String> {
    YOUTUBE_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|captures| captures[1].to_string())
}

fn youtube_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/recent", get(recent))
        .route("/count-by-vehicle-type", get(count_by_vehicle_type))
        .route("/count-by-video-type", get(count_by_video_type))
        .route("/search", get(search))
        .route("/type/:video_type", get(by_type))
        .route("/vehicle/:vehicle_id", get(for_vehicle))
        .route("/vehicle/:vehicle_id/youtube", post(add_youtube))
        .route("/vehicle/:vehicle_id/upload", post(upload_local))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<VideoWithVehicle>>> {
    let videos = state
        .storage
        .get_all_videos()
        .await
        .map_err(|e| e.action("fetch videos"))?;
    Ok(Json(videos))
}

async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<VideoWithVehicle>>> {
    let videos = state
        .storage
        .get_recent_videos(query.limit())
        .await
        .map_err(|e| e.action("fetch recent videos"))?;
    Ok(Json(videos))
}

async fn count_by_vehicle_type(State(state): State<AppState>) -> Result<Json<TypeCounts>> {
    let counts = state
        .storage
        .count_videos_by_vehicle_type()
        .await
        .map_err(|e| e.action("fetch video counts"))?;
    Ok(Json(counts))
}

async fn count_by_video_type(State(state): State<AppState>) -> Result<Json<VideoTypeCounts>> {
    let counts = state
        .storage
        .count_videos_by_video_type()
        .await
        .map_err(|e| e.action("fetch video type counts"))?;
    Ok(Json(counts))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<VideoWithVehicle>>> {
    let term = query
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query required".to_string()))?;

    let videos = state
        .storage
        .search_videos(&term)
        .await
        .map_err(|e| e.action("search videos"))?;
    Ok(Json(videos))
}

async fn by_type(
    State(state): State<AppState>,
    Path(video_type): Path<String>,
) -> Result<Json<Vec<VideoWithVehicle>>> {
    let video_type = VideoType::parse(&video_type)
        .ok_or_else(|| AppError::Validation("Invalid video type".to_string()))?;

    let videos = state
        .storage
        .get_videos_by_type(video_type)
        .await
        .map_err(|e| e.action("fetch videos"))?;
    Ok(Json(videos))
}

async fn for_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
) -> Result<Json<Vec<VideoWithVehicle>>> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("fetch videos"))?;

    let videos = state
        .storage
        .get_videos_for_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("fetch videos"))?;
    Ok(Json(videos))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VideoWithVehicle>> {
    let video = state
        .storage
        .get_video(id)
        .await
        .map_err(|e| e.action("fetch video"))?;
    Ok(Json(video))
}

/// Stores a YouTube link as an embed URL; the thumbnail is a custom
/// upload when given, otherwise the img.youtube.com default.
async fn add_youtube(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoWithVehicle>)> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("add YouTube video"))?;

    let mut title = None;
    let mut description = None;
    let mut youtube_url = None;
    let mut thumbnail = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => title = Some(field.text().await?),
            Some("description") => description = Some(field.text().await?),
            Some("youtube_url") => youtube_url = Some(field.text().await?),
            Some("thumbnail") => {
                let file_name = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "thumbnail".to_string());
                let data = field.bytes().await?;
                thumbnail = Some((file_name, data));
            }
            _ => {}
        }
    }

    let youtube_url = youtube_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("YouTube URL required".to_string()))?;
    let video_id = extract_youtube_id(&youtube_url)
        .ok_or_else(|| AppError::Validation("Invalid YouTube URL".to_string()))?;

    let saved_thumbnail = match thumbnail {
        Some((file_name, data)) => Some(
            uploads::save_upload(&state.upload_dir, UploadKind::Thumbnail, &file_name, &data)
                .await?,
        ),
        None => None,
    };
    let thumbnail_path = saved_thumbnail
        .as_ref()
        .map(|s| s.url_path.clone())
        .unwrap_or_else(|| youtube_thumbnail(&video_id));

    let video = state
        .storage
        .create_video(&NewVideo {
            vehicle_id,
            title: title.filter(|t| !t.is_empty()).unwrap_or_else(|| "YouTube Video".to_string()),
            description: Some(description.unwrap_or_default()),
            video_type: VideoType::Youtube,
            path_or_url: format!("https://www.youtube.com/embed/{}", video_id),
            thumbnail_path: Some(thumbnail_path),
        })
        .await;

    match video {
        Ok(video) => Ok((StatusCode::CREATED, Json(video))),
        Err(err) => {
            if let Some(saved) = &saved_thumbnail {
                uploads::discard(saved).await;
            }
            Err(err.action("add YouTube video"))
        }
    }
}

async fn upload_local(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoWithVehicle>)> {
    state
        .storage
        .get_vehicle(vehicle_id)
        .await
        .map_err(|e| e.action("upload video"))?;

    let mut title = None;
    let mut description = None;
    let mut video_file = None;
    let mut thumbnail_file = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => title = Some(field.text().await?),
            Some("description") => description = Some(field.text().await?),
            Some("video") => {
                let file_name = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "video".to_string());
                let data = field.bytes().await?;
                video_file = Some((file_name, data));
            }
            Some("thumbnail") => {
                let file_name = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "thumbnail".to_string());
                let data = field.bytes().await?;
                thumbnail_file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let (video_name, video_data) =
        video_file.ok_or_else(|| AppError::Validation("Video file required".to_string()))?;

    let saved_video =
        uploads::save_upload(&state.upload_dir, UploadKind::Video, &video_name, &video_data)
            .await?;
    let saved_thumbnail = match &thumbnail_file {
        Some((file_name, data)) => {
            match uploads::save_upload(&state.upload_dir, UploadKind::Thumbnail, file_name, data)
                .await
            {
                Ok(saved) => Some(saved),
                Err(err) => {
                    uploads::discard(&saved_video).await;
                    return Err(err);
                }
            }
        }
        None => None,
    };

    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| uploads::file_stem(&video_name));

    let video = state
        .storage
        .create_video(&NewVideo {
            vehicle_id,
            title,
            description: Some(description.unwrap_or_default()),
            video_type: VideoType::Local,
            path_or_url: saved_video.url_path.clone(),
            thumbnail_path: saved_thumbnail.as_ref().map(|s| s.url_path.clone()),
        })
        .await;

    match video {
        Ok(video) => Ok((StatusCode::CREATED, Json(video))),
        Err(err) => {
            discard_all(&saved_video, saved_thumbnail.as_ref()).await;
            Err(err.action("upload video"))
        }
    }
}

async fn discard_all(video: &SavedUpload, thumbnail: Option<&SavedUpload>) {
    uploads::discard(video).await;
    if let Some(thumbnail) = thumbnail {
        uploads::discard(thumbnail).await;
    }
}

/// Edits title/description and optionally swaps the thumbnail.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<VideoWithVehicle>> {
    let existing = state
        .storage
        .get_video(id)
        .await
        .map_err(|e| e.action("update video"))?;

    let mut patch = VideoPatch::default();
    let mut saved_thumbnail = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => patch.title = Some(field.text().await?),
            Some("description") => patch.description = Some(field.text().await?),
            Some("thumbnail") => {
                let file_name = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "thumbnail".to_string());
                let data = field.bytes().await?;
                let saved = uploads::save_upload(
                    &state.upload_dir,
                    UploadKind::Thumbnail,
                    &file_name,
                    &data,
                )
                .await?;
                patch.thumbnail_path = Some(saved.url_path.clone());
                saved_thumbnail = Some(saved);
            }
            _ => {}
        }
    }

    match state.storage.update_video(id, &patch).await {
        Ok(video) => {
            // the old thumbnail is dead once a new one is referenced
            if saved_thumbnail.is_some() {
                if let Some(old) = &existing.video.thumbnail_path {
                    uploads::remove_stored(&state.upload_dir, old).await;
                }
            }
            Ok(Json(video))
        }
        Err(err) => {
            if let Some(saved) = &saved_thumbnail {
                uploads::discard(saved).await;
            }
            Err(err.action("update video"))
        }
    }
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let video = state
        .storage
        .get_video(id)
        .await
        .map_err(|e| e.action("delete video"))?;

    state
        .storage
        .delete_video(id)
        .await
        .map_err(|e| e.action("delete video"))?;

    if video.video.video_type == VideoType::Local {
        uploads::remove_stored(&state.upload_dir, &video.video.path_or_url).await;
    }
    if let Some(thumbnail) = &video.video.thumbnail_path {
        uploads::remove_stored(&state.upload_dir, thumbnail).await;
    }

    Ok(Json(json!({ "message": "Video deleted successfully" })))
}
