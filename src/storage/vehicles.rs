// ABOUTME: Vehicle repository: CRUD, grouped listings, search, and fleet stats
// ABOUTME: Partial updates merge an explicit patch struct over the stored row

use sqlx::{Row, sqlite::SqliteRow};

use super::Storage;
use crate::error::{AppError, Result};
use crate::types::{
    GroupedVehicles, NewVehicle, Vehicle, VehiclePatch, VehicleStats, VehicleType,
    VehicleWithCounts,
};

pub(crate) fn vehicle_from_row(row: &SqliteRow) -> Result<Vehicle> {
    let type_str: String = row.get("type");
    let vehicle_type = VehicleType::parse(&type_str)
        .ok_or_else(|| AppError::Internal(format!("unknown vehicle type '{}'", type_str)))?;

    Ok(Vehicle {
        id: row.get("id"),
        vehicle_type,
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        vin: row.get("vin"),
        color: row.get("color"),
        purchase_date: row.get("purchase_date"),
        purchase_price: row.get("purchase_price"),
        current_mileage: row.get("current_mileage"),
        license_plate: row.get("license_plate"),
        insurance_policy: row.get("insurance_policy"),
        insurance_expiry: row.get("insurance_expiry"),
        oil_type: row.get("oil_type"),
        oil_change_interval_miles: row.get("oil_change_interval_miles"),
        oil_change_interval_months: row.get("oil_change_interval_months"),
        notes: row.get("notes"),
        image_path: row.get("image_path"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const COUNTED_SELECT: &str = r#"
    SELECT v.*,
           COUNT(DISTINCT m.id) as manual_count,
           COUNT(DISTINCT vid.id) as video_count,
           COUNT(DISTINCT ml.id) as maintenance_count
    FROM vehicles v
    LEFT JOIN manuals m ON v.id = m.vehicle_id
    LEFT JOIN videos vid ON v.id = vid.vehicle_id
    LEFT JOIN maintenance_logs ml ON v.id = ml.vehicle_id
"#;

fn counted_from_row(row: &SqliteRow) -> Result<VehicleWithCounts> {
    Ok(VehicleWithCounts {
        vehicle: vehicle_from_row(row)?,
        manual_count: row.get("manual_count"),
        video_count: row.get("video_count"),
        maintenance_count: row.get("maintenance_count"),
    })
}

impl Storage {
    /// All vehicles with dependent-record counts, bucketed by type.
    pub async fn get_vehicles_grouped(&self) -> Result<GroupedVehicles> {
        let query = format!(
            "{} GROUP BY v.id ORDER BY v.type, v.year DESC, v.make, v.model",
            COUNTED_SELECT
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut grouped = GroupedVehicles::default();
        for row in rows {
            let type_str: String = row.get("type");
            let Some(vehicle_type) = VehicleType::parse(&type_str) else {
                continue;
            };
            let counted = counted_from_row(&row)?;
            match vehicle_type {
                VehicleType::Bike => grouped.bike.push(counted),
                VehicleType::Motorcycle => grouped.motorcycle.push(counted),
                VehicleType::Car => grouped.car.push(counted),
            }
        }

        Ok(grouped)
    }

    pub async fn get_vehicle(&self, id: i64) -> Result<Vehicle> {
        let row = sqlx::query("SELECT * FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        vehicle_from_row(&row)
    }

    pub async fn create_vehicle(&self, data: &NewVehicle) -> Result<Vehicle> {
        let vehicle_type = VehicleType::parse(&data.vehicle_type)
            .ok_or_else(|| AppError::Validation("Invalid vehicle type".to_string()))?;
        if data.make.is_empty() || data.model.is_empty() {
            return Err(AppError::Validation(
                "Type, make, and model are required".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO vehicles (type, make, model, year, vin, color, purchase_date,
                purchase_price, current_mileage, license_plate, insurance_policy,
                insurance_expiry, oil_type, oil_change_interval_miles,
                oil_change_interval_months, notes, image_path)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(vehicle_type.as_str())
        .bind(&data.make)
        .bind(&data.model)
        .bind(data.year)
        .bind(&data.vin)
        .bind(&data.color)
        .bind(data.purchase_date)
        .bind(data.purchase_price)
        .bind(data.current_mileage)
        .bind(&data.license_plate)
        .bind(&data.insurance_policy)
        .bind(data.insurance_expiry)
        .bind(&data.oil_type)
        .bind(data.oil_change_interval_miles)
        .bind(data.oil_change_interval_months)
        .bind(&data.notes)
        .bind(&data.image_path)
        .execute(&self.pool)
        .await?;

        self.get_vehicle(result.last_insert_rowid()).await
    }

    /// Merges the patch over the stored row: omitted fields keep their
    /// stored value, explicit nulls clear the nullable fields.
    pub async fn update_vehicle(&self, id: i64, patch: &VehiclePatch) -> Result<Vehicle> {
        let existing = self.get_vehicle(id).await?;

        let vehicle_type = match patch.vehicle_type.as_deref() {
            Some(s) if !s.is_empty() => VehicleType::parse(s)
                .ok_or_else(|| AppError::Validation("Invalid vehicle type".to_string()))?,
            _ => existing.vehicle_type,
        };
        let make = match patch.make.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => existing.make,
        };
        let model = match patch.model.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => existing.model,
        };
        let year = patch.year.or(existing.year);
        let vin = patch.vin.clone().unwrap_or(existing.vin);
        let color = patch.color.clone().unwrap_or(existing.color);
        let purchase_date = patch.purchase_date.unwrap_or(existing.purchase_date);
        let purchase_price = patch.purchase_price.unwrap_or(existing.purchase_price);
        let current_mileage = patch.current_mileage.unwrap_or(existing.current_mileage);
        let license_plate = patch.license_plate.clone().unwrap_or(existing.license_plate);
        let insurance_policy = patch
            .insurance_policy
            .clone()
            .unwrap_or(existing.insurance_policy);
        let insurance_expiry = patch.insurance_expiry.unwrap_or(existing.insurance_expiry);
        let oil_type = patch.oil_type.clone().unwrap_or(existing.oil_type);
        let oil_change_interval_miles = patch
            .oil_change_interval_miles
            .unwrap_or(existing.oil_change_interval_miles);
        let oil_change_interval_months = patch
            .oil_change_interval_months
            .unwrap_or(existing.oil_change_interval_months);
        let notes = patch.notes.clone().unwrap_or(existing.notes);

        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET type = ?, make = ?, model = ?, year = ?, vin = ?, color = ?,
                purchase_date = ?, purchase_price = ?, current_mileage = ?,
                license_plate = ?, insurance_policy = ?, insurance_expiry = ?,
                oil_type = ?, oil_change_interval_miles = ?, oil_change_interval_months = ?,
                notes = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
            WHERE id = ?
            "#,
        )
        .bind(vehicle_type.as_str())
        .bind(&make)
        .bind(&model)
        .bind(year)
        .bind(&vin)
        .bind(&color)
        .bind(purchase_date)
        .bind(purchase_price)
        .bind(current_mileage)
        .bind(&license_plate)
        .bind(&insurance_policy)
        .bind(insurance_expiry)
        .bind(&oil_type)
        .bind(oil_change_interval_miles)
        .bind(oil_change_interval_months)
        .bind(&notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        self.get_vehicle(id).await
    }

    pub async fn set_vehicle_image(&self, id: i64, image_path: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE vehicles SET image_path = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now') WHERE id = ?",
        )
        .bind(image_path)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        Ok(())
    }

    /// Dependent manuals, videos and maintenance logs go with the row
    /// via the store's cascading foreign keys.
    pub async fn delete_vehicle(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_vehicles_by_type(
        &self,
        vehicle_type: VehicleType,
    ) -> Result<Vec<VehicleWithCounts>> {
        let query = format!(
            "{} WHERE v.type = ? GROUP BY v.id ORDER BY v.year DESC, v.make, v.model",
            COUNTED_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(vehicle_type.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(counted_from_row).collect()
    }

    pub async fn search_vehicles(&self, term: &str) -> Result<Vec<Vehicle>> {
        let pattern = format!("%{}%", term);
        let rows = sqlx::query(
            r#"
            SELECT * FROM vehicles
            WHERE make LIKE ? OR model LIKE ? OR year LIKE ?
            ORDER BY type, year DESC, make, model
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(vehicle_from_row).collect()
    }

    pub async fn get_all_vehicles(&self) -> Result<Vec<Vehicle>> {
        let rows = sqlx::query("SELECT * FROM vehicles ORDER BY type, year DESC, make, model")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(vehicle_from_row).collect()
    }

    pub async fn get_recent_vehicles(&self, limit: i64) -> Result<Vec<Vehicle>> {
        let rows = sqlx::query("SELECT * FROM vehicles ORDER BY created_at DESC, id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(vehicle_from_row).collect()
    }

    pub async fn get_vehicle_stats(&self) -> Result<VehicleStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(CASE WHEN type = 'bike' THEN 1 END) as bike_count,
                COUNT(CASE WHEN type = 'motorcycle' THEN 1 END) as motorcycle_count,
                COUNT(CASE WHEN type = 'car' THEN 1 END) as car_count,
                COUNT(*) as total_count,
                (SELECT COUNT(*) FROM manuals) as total_manuals,
                (SELECT COUNT(*) FROM videos) as total_videos,
                (SELECT COUNT(*) FROM maintenance_logs) as total_maintenance
            FROM vehicles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(VehicleStats {
            bike_count: row.get("bike_count"),
            motorcycle_count: row.get("motorcycle_count"),
            car_count: row.get("car_count"),
            total_count: row.get("total_count"),
            total_manuals: row.get("total_manuals"),
            total_videos: row.get("total_videos"),
            total_maintenance: row.get("total_maintenance"),
        })
    }
}
