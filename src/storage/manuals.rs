// ABOUTME: Manual repository: vehicle-scoped PDF manual records
// ABOUTME: Listings join the owning vehicle's identity fields onto each row

use sqlx::{Row, sqlite::SqliteRow};

use super::Storage;
use crate::error::{AppError, Result};
use crate::types::{Manual, ManualWithVehicle, NewManual, TypeCounts, VehicleType};

fn manual_from_row(row: &SqliteRow) -> Manual {
    Manual {
        id: row.get("id"),
        vehicle_id: row.get("vehicle_id"),
        title: row.get("title"),
        file_path: row.get("file_path"),
        file_type: row.get("file_type"),
        created_at: row.get("created_at"),
    }
}

fn with_vehicle_from_row(row: &SqliteRow) -> Result<ManualWithVehicle> {
    let type_str: String = row.get("vehicle_type");
    let vehicle_type = VehicleType::parse(&type_str)
        .ok_or_else(|| AppError::Internal(format!("unknown vehicle type '{}'", type_str)))?;

    Ok(ManualWithVehicle {
        manual: manual_from_row(row),
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        vehicle_type,
    })
}

const JOINED_SELECT: &str = r#"
    SELECT m.*, v.make, v.model, v.year, v.type as vehicle_type
    FROM manuals m
    JOIN vehicles v ON m.vehicle_id = v.id
"#;

impl Storage {
    pub async fn get_manuals_for_vehicle(&self, vehicle_id: i64) -> Result<Vec<ManualWithVehicle>> {
        let query = format!("{} WHERE m.vehicle_id = ? ORDER BY m.created_at DESC", JOINED_SELECT);
        let rows = sqlx::query(&query)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn get_manual(&self, id: i64) -> Result<ManualWithVehicle> {
        let query = format!("{} WHERE m.id = ?", JOINED_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Manual not found".to_string()))?;

        with_vehicle_from_row(&row)
    }

    pub async fn create_manual(&self, data: &NewManual) -> Result<ManualWithVehicle> {
        let result = sqlx::query(
            "INSERT INTO manuals (vehicle_id, title, file_path, file_type) VALUES (?, ?, ?, ?)",
        )
        .bind(data.vehicle_id)
        .bind(&data.title)
        .bind(&data.file_path)
        .bind(&data.file_type)
        .execute(&self.pool)
        .await?;

        self.get_manual(result.last_insert_rowid()).await
    }

    /// Only the title is editable; the file itself is immutable.
    pub async fn update_manual(&self, id: i64, title: &str) -> Result<ManualWithVehicle> {
        let result = sqlx::query("UPDATE manuals SET title = ? WHERE id = ?")
            .bind(title)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Manual not found".to_string()));
        }

        self.get_manual(id).await
    }

    pub async fn delete_manual(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM manuals WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Manual not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_all_manuals(&self) -> Result<Vec<ManualWithVehicle>> {
        let query = format!("{} ORDER BY m.created_at DESC", JOINED_SELECT);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn search_manuals(&self, term: &str) -> Result<Vec<ManualWithVehicle>> {
        let pattern = format!("%{}%", term);
        let query = format!(
            "{} WHERE m.title LIKE ? OR v.make LIKE ? OR v.model LIKE ? ORDER BY m.created_at DESC",
            JOINED_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn get_recent_manuals(&self, limit: i64) -> Result<Vec<ManualWithVehicle>> {
        let query = format!("{} ORDER BY m.created_at DESC, m.id DESC LIMIT ?", JOINED_SELECT);
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(with_vehicle_from_row).collect()
    }

    pub async fn count_manuals_by_vehicle_type(&self) -> Result<TypeCounts> {
        let rows = sqlx::query(
            r#"
            SELECT v.type, COUNT(m.id) as count
            FROM manuals m
            JOIN vehicles v ON m.vehicle_id = v.id
            GROUP BY v.type
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
}
