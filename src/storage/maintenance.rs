// ABOUTME: Maintenance repository: transactional log + tag CRUD, aggregates,
// ABOUTME: and the last-oil-change heuristic query

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{Row, sqlite::SqliteRow};

use super::Storage;
use crate::error::{AppError, Result};
use crate::types::{
    CostSummary, MaintenanceLog, MaintenanceLogPatch, MaintenanceLogWithTags, NewMaintenanceLog,
    NewTag, Tag, TagWithUsage, VehicleType,
};

/// Quick-add template: canned description plus the canonical tag names
/// resolved against existing tags by exact match.
const QUICK_ADD_TEMPLATES: &[(&str, &str, &[&str])] = &[
    ("oil-change", "Oil Change", &["Oil Change"]),
    ("tire-rotation", "Tire Rotation", &["Tire Rotation"]),
    ("brake-service", "Brake Service", &["Brake Service"]),
    ("inspection", "Vehicle Inspection", &["Inspection"]),
];

fn log_from_row(row: &SqliteRow) -> MaintenanceLog {
    MaintenanceLog {
        id: row.get("id"),
        vehicle_id: row.get("vehicle_id"),
        date: row.get("date"),
        description: row.get("description"),
        mileage: row.get("mileage"),
        cost: row.get("cost"),
        created_at: row.get("created_at"),
    }
}

fn log_with_vehicle_from_row(row: &SqliteRow) -> Result<MaintenanceLogWithTags> {
    let type_str: String = row.get("vehicle_type");
    let vehicle_type = VehicleType::parse(&type_str)
        .ok_or_else(|| AppError::Internal(format!("unknown vehicle type '{}'", type_str)))?;

    Ok(MaintenanceLogWithTags {
        log: log_from_row(row),
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        vehicle_type,
        tags: Vec::new(),
    })
}

const LOG_SELECT: &str = r#"
    SELECT ml.*, v.make, v.model, v.year, v.type as vehicle_type
    FROM maintenance_logs ml
    JOIN vehicles v ON ml.vehicle_id = v.id
"#;

/// Ordering for log listings: newest service date first, same-day
/// entries newest-created first, row id as deterministic tie-break.
const LOG_ORDER: &str = "ORDER BY ml.date DESC, ml.created_at DESC, ml.id DESC";

impl Storage {
    /// Maps each joined row and attaches its tag list, assembled in
    /// application code from one query over the collected log ids.
    async fn collect_logs(&self, rows: &[SqliteRow]) -> Result<Vec<MaintenanceLogWithTags>> {
        let mut logs = rows
            .iter()
            .map(log_with_vehicle_from_row)
            .collect::<Result<Vec<_>>>()?;

        let ids: Vec<i64> = logs.iter().map(|l| l.log.id).collect();
        let mut tag_map = self.tags_for_logs(&ids).await?;
        for log in &mut logs {
            if let Some(tags) = tag_map.remove(&log.log.id) {
                log.tags = tags;
            }
        }

        Ok(logs)
    }

    async fn tags_for_logs(&self, log_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        if log_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; log_ids.len()].join(", ");
        let query = format!(
            r#"
            SELECT mlt.log_id, mt.id as tag_id, mt.name, mt.color, mt.icon
            FROM maintenance_log_tags mlt
            JOIN maintenance_tags mt ON mlt.tag_id = mt.id
            WHERE mlt.log_id IN ({})
            ORDER BY mt.name
            "#,
            placeholders
        );

        let mut q = sqlx::query(&query);
        for id in log_ids {
            q = q.bind(id);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut map: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            let log_id: i64 = row.get("log_id");
            map.entry(log_id).or_default().push(Tag {
                id: row.get("tag_id"),
                name: row.get("name"),
                color: row.get("color"),
                icon: row.get("icon"),
            });
        }

        Ok(map)
    }

    /// Inserts the log and its tag associations in one transaction; a
    /// failed tag insert rolls back the log insert too.
    pub async fn create_log(
        &self,
        vehicle_id: i64,
        data: &NewMaintenanceLog,
    ) -> Result<MaintenanceLogWithTags> {
        let (Some(date), Some(description)) = (
            data.date,
            data.description.as_deref().filter(|d| !d.is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Date and description are required".to_string(),
            ));
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO maintenance_logs (vehicle_id, date, description, mileage, cost) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(vehicle_id)
        .bind(date)
        .bind(description)
        .bind(data.mileage)
        .bind(data.cost)
        .execute(&mut *tx)
        .await?;
        let log_id = result.last_insert_rowid();

        for tag_id in &data.tag_ids {
            sqlx::query("INSERT INTO maintenance_log_tags (log_id, tag_id) VALUES (?, ?)")
                .bind(log_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_log(log_id).await
    }

    /// Merges the patch over the stored log, then fully replaces the
    /// tag set (delete-then-reinsert). All in one transaction: any
    /// failure leaves both the scalar fields and the previous tag set
    /// intact.
    pub async fn update_log(
        &self,
        id: i64,
        patch: &MaintenanceLogPatch,
    ) -> Result<MaintenanceLogWithTags> {
        let existing = self.get_log(id).await?;

        let date = patch.date.unwrap_or(existing.log.date);
        let description = match patch.description.as_deref() {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => existing.log.description,
        };
        let mileage = patch.mileage.unwrap_or(existing.log.mileage);
        let cost = patch.cost.unwrap_or(existing.log.cost);
        let tag_ids = patch
            .tag_ids
            .clone()
            .unwrap_or_else(|| existing.tags.iter().map(|t| t.id).collect());

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE maintenance_logs SET date = ?, description = ?, mileage = ?, cost = ? WHERE id = ?",
        )
        .bind(date)
        .bind(&description)
        .bind(mileage)
        .bind(cost)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Maintenance log not found".to_string()));
        }

        sqlx::query("DELETE FROM maintenance_log_tags WHERE log_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for tag_id in &tag_ids {
            sqlx::query("INSERT INTO maintenance_log_tags (log_id, tag_id) VALUES (?, ?)")
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_log(id).await
    }

    /// Join-table rows go with the log via the cascading foreign key.
    pub async fn delete_log(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM maintenance_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Maintenance log not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_log(&self, id: i64) -> Result<MaintenanceLogWithTags> {
        let query = format!("{} WHERE ml.id = ?", LOG_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Maintenance log not found".to_string()))?;

        let logs = self.collect_logs(std::slice::from_ref(&row)).await?;
        logs.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Maintenance log not found".to_string()))
    }

    pub async fn get_all_logs(&self) -> Result<Vec<MaintenanceLogWithTags>> {
        let query = format!("{} {}", LOG_SELECT, LOG_ORDER);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        self.collect_logs(&rows).await
    }

    pub async fn get_logs_for_vehicle(
        &self,
        vehicle_id: i64,
    ) -> Result<Vec<MaintenanceLogWithTags>> {
        let query = format!("{} WHERE ml.vehicle_id = ? {}", LOG_SELECT, LOG_ORDER);
        let rows = sqlx::query(&query)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;
        self.collect_logs(&rows).await
    }

    pub async fn get_logs_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MaintenanceLogWithTags>> {
        let query = format!(
            "{} WHERE ml.date BETWEEN ? AND ? ORDER BY ml.date DESC",
            LOG_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        self.collect_logs(&rows).await
    }

    pub async fn get_recent_logs(&self, limit: i64) -> Result<Vec<MaintenanceLogWithTags>> {
        let query = format!("{} {} LIMIT ?", LOG_SELECT, LOG_ORDER);
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        self.collect_logs(&rows).await
    }

    /// Logs carrying the given tag, each with its full tag set.
    pub async fn get_logs_by_tag(&self, tag_id: i64) -> Result<Vec<MaintenanceLogWithTags>> {
        let query = format!(
            "{} WHERE ml.id IN (SELECT log_id FROM maintenance_log_tags WHERE tag_id = ?) ORDER BY ml.date DESC",
            LOG_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(tag_id)
            .fetch_all(&self.pool)
            .await?;
        self.collect_logs(&rows).await
    }

    /// Null costs are skipped by the SQL aggregates but still count
    /// toward total_logs.
    pub async fn get_cost_summary(&self, vehicle_id: Option<i64>) -> Result<CostSummary> {
        let mut query = String::from(
            r#"
            SELECT
                COUNT(*) as total_logs,
                SUM(cost) as total_cost,
                AVG(cost) as average_cost,
                MIN(cost) as min_cost,
                MAX(cost) as max_cost,
                MIN(date) as first_maintenance,
                MAX(date) as last_maintenance
            FROM maintenance_logs
            "#,
        );
        if vehicle_id.is_some() {
            query.push_str(" WHERE vehicle_id = ?");
        }

        let mut q = sqlx::query(&query);
        if let Some(id) = vehicle_id {
            q = q.bind(id);
        }
        let row = q.fetch_one(&self.pool).await?;

        Ok(CostSummary {
            total_logs: row.get("total_logs"),
            total_cost: row.get("total_cost"),
            average_cost: row.get("average_cost"),
            min_cost: row.get("min_cost"),
            max_cost: row.get("max_cost"),
            first_maintenance: row.get("first_maintenance"),
            last_maintenance: row.get("last_maintenance"),
        })
    }

    /// Every tag with the number of logs referencing it, zero included.
    pub async fn get_all_tags(&self) -> Result<Vec<TagWithUsage>> {
        let rows = sqlx::query(
            r#"
            SELECT mt.id, mt.name, mt.color, mt.icon, COUNT(mlt.log_id) as usage_count
            FROM maintenance_tags mt
            LEFT JOIN maintenance_log_tags mlt ON mt.id = mlt.tag_id
            GROUP BY mt.id
            ORDER BY mt.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TagWithUsage {
                tag: Tag {
                    id: row.get("id"),
                    name: row.get("name"),
                    color: row.get("color"),
                    icon: row.get("icon"),
                },
                usage_count: row.get("usage_count"),
            })
            .collect())
    }

    pub async fn create_tag(&self, data: &NewTag) -> Result<Tag> {
        if data.name.is_empty() {
            return Err(AppError::Validation("Tag name required".to_string()));
        }

        let color = data.color.clone().unwrap_or_else(|| "#6b7280".to_string());
        let icon = data.icon.clone().unwrap_or_else(|| "tag".to_string());

        let result = sqlx::query("INSERT INTO maintenance_tags (name, color, icon) VALUES (?, ?, ?)")
            .bind(&data.name)
            .bind(&color)
            .bind(&icon)
            .execute(&self.pool)
            .await;

        let result = match result {
            Ok(r) => r,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AppError::Conflict("Tag name already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: data.name.clone(),
            color,
            icon: Some(icon),
        })
    }

    /// Heuristic: most recent log whose description mentions "oil
    /// change" or whose tag name mentions "oil". Wording that differs
    /// is missed; an unrelated tag containing "oil" matches.
    pub async fn get_last_oil_change(&self, vehicle_id: i64) -> Result<Option<MaintenanceLog>> {
        let row = sqlx::query(
            r#"
            SELECT ml.*
            FROM maintenance_logs ml
            LEFT JOIN maintenance_log_tags mlt ON ml.id = mlt.log_id
            LEFT JOIN maintenance_tags mt ON mlt.tag_id = mt.id
            WHERE ml.vehicle_id = ?
              AND (
                LOWER(ml.description) LIKE '%oil change%'
                OR LOWER(mt.name) LIKE '%oil%'
              )
            ORDER BY ml.date DESC, ml.id DESC
            LIMIT 1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| log_from_row(&row)))
    }

    /// Canned log creation: preset description, today's date, no cost,
    /// tags resolved by exact name against existing tags (absent
    /// canonical tags are skipped, not an error).
    pub async fn quick_add_log(
        &self,
        vehicle_id: i64,
        kind: &str,
        mileage: Option<i64>,
        today: NaiveDate,
    ) -> Result<MaintenanceLogWithTags> {
        let (_, description, tag_names) = QUICK_ADD_TEMPLATES
            .iter()
            .find(|(key, _, _)| *key == kind)
            .ok_or_else(|| AppError::Validation("Invalid maintenance type".to_string()))?;

        let placeholders = vec!["?"; tag_names.len()].join(", ");
        let query = format!(
            "SELECT id FROM maintenance_tags WHERE name IN ({})",
            placeholders
        );
        let mut q = sqlx::query(&query);
        for name in *tag_names {
            q = q.bind(name);
        }
        let tag_ids: Vec<i64> = q
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.get("id"))
            .collect();

        self.create_log(
            vehicle_id,
            &NewMaintenanceLog {
                date: Some(today),
                description: Some(description.to_string()),
                mileage,
                cost: None,
                tag_ids,
            },
        )
        .await
    }
}
