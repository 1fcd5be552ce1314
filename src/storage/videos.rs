// ABOUTME: Video repository: local uploads and YouTube links tied to a vehicle
// ABOUTME: Listings join vehicle identity; counts split by vehicle and video type

use sqlx::{Row, sqlite::SqliteRow};

use super::Storage;
use crate::error::{AppError, Result};
use crate::types::{NewVideo, TypeCounts, VehicleType, Video, VideoPatch, VideoType,
    VideoTypeCounts, VideoWithVehicle};

fn video_from_row(row: &SqliteRow) -> Result<Video> {
    let type_str: String = row.get("type");
    let video_type = VideoType::parse(&type_str)
        .ok_or_else(|| AppError::Internal(format!("unknown video type '{}'", type_str)))?;

    Ok(Video {
        id: row.get("id"),
        vehicle_id: row.get("vehicle_id"),
        title: row.get("title"),
        description: row.get("description"),
        video_type,
        path_or_url: row.get("path_or_url"),
        thumbnail_path: row.get("thumbnail_path"),
        created_at: row.get("created_at"),
    })
}

fn with_vehicle_from_row(row: &SqliteRow) -> Result<VideoWithVehicle> {
    let type_str: String = row.get("vehicle_type");
    let vehicle_type = VehicleType::parse(&type_str)
        .ok_or_else(|| AppError::Internal(format!("unknown vehicle type '{}'", type_str)))?;

    Ok(VideoWithVehicle {
        video: video_from_row(row)?,
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        vehicle_type,
    })
}

const JOINED_SELECT: &str = r#"
    SELECT v.*, vh.make, vh.model, vh.year, vh.type as vehicle_type
    FROM videos v
    JOIN vehicles vh ON v.vehicle_id = vh.id
"#;

impl Storage {
    pub async fn get_videos_for_vehicle(&self, vehicle_id: i64) -> Result<Vec<VideoWithVehicle>> {
        let query = format!("{} WHERE v.vehicle_id = ? ORDER BY v.created_at DESC", JOINED_SELECT);
        let rows = sqlx::query(&query)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn get_video(&self, id: i64) -> Result<VideoWithVehicle> {
        let query = format!("{} WHERE v.id = ?", JOINED_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        with_vehicle_from_row(&row)
    }

    pub async fn create_video(&self, data: &NewVideo) -> Result<VideoWithVehicle> {
        let result = sqlx::query(
            r#"
            INSERT INTO videos (vehicle_id, title, description, type, path_or_url, thumbnail_path)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.vehicle_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.video_type.as_str())
        .bind(&data.path_or_url)
        .bind(&data.thumbnail_path)
        .execute(&self.pool)
        .await?;

        self.get_video(result.last_insert_rowid()).await
    }

    /// Title, description and thumbnail are editable; the media itself
    /// and its type are immutable.
    pub async fn update_video(&self, id: i64, patch: &VideoPatch) -> Result<VideoWithVehicle> {
        let existing = self.get_video(id).await?;

        let title = patch.title.clone().unwrap_or(existing.video.title);
        let description = patch
            .description
            .clone()
            .or(existing.video.description);
        let thumbnail_path = patch
            .thumbnail_path
            .clone()
            .or(existing.video.thumbnail_path);

        let result =
            sqlx::query("UPDATE videos SET title = ?, description = ?, thumbnail_path = ? WHERE id = ?")
                .bind(&title)
                .bind(&description)
                .bind(&thumbnail_path)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        self.get_video(id).await
    }

    pub async fn delete_video(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_all_videos(&self) -> Result<Vec<VideoWithVehicle>> {
        let query = format!("{} ORDER BY v.created_at DESC", JOINED_SELECT);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn get_videos_by_type(&self, video_type: VideoType) -> Result<Vec<VideoWithVehicle>> {
        let query = format!("{} WHERE v.type = ? ORDER BY v.created_at DESC", JOINED_SELECT);
        let rows = sqlx::query(&query)
            .bind(video_type.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn search_videos(&self, term: &str) -> Result<Vec<VideoWithVehicle>> {
        let pattern = format!("%{}%", term);
        let query = format!(
            "{} WHERE v.title LIKE ? OR v.description LIKE ? OR vh.make LIKE ? OR vh.model LIKE ? ORDER BY v.created_at DESC",
            JOINED_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn get_recent_videos(&self, limit: i64) -> Result<Vec<VideoWithVehicle>> {
        let query = format!("{} ORDER BY v.created_at DESC, v.id DESC LIMIT ?", JOINED_SELECT);
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn count_videos_by_vehicle_type(&self) -> Result<TypeCounts> {
        let rows = sqlx::query(
            r#"
            SELECT vh.type, COUNT(v.id) as count
            FROM videos v
            JOIN vehicles vh ON v.vehicle_id = vh.id
            GROUP BY vh.type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = TypeCounts::default();
        for row in rows {
            let type_str: String = row.get("type");
            let count: i64 = row.get("count");
            match VehicleType::parse(&type_str) {
                Some(VehicleType::Bike) => counts.bike = count,
                Some(VehicleType::Motorcycle) => counts.motorcycle = count,
                Some(VehicleType::Car) => counts.car = count,
                None => {}
            }
        }

        Ok(counts)
    }

    pub async fn count_videos_by_video_type(&self) -> Result<VideoTypeCounts> {
        let rows = sqlx::query("SELECT type, COUNT(id) as count FROM videos GROUP BY type")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = VideoTypeCounts::default();
        for row in rows {
            let type_str: String = row.get("type");
            let count: i64 = row.get("count");
            match VideoType::parse(&type_str) {
                Some(VideoType::Local) => counts.local = count,
                Some(VideoType::Youtube) => counts.youtube = count,
                None => {}
            }
        }

        Ok(counts)
    }
}
