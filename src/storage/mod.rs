// ABOUTME: SQLite storage handle shared by all repositories
// ABOUTME: Owns the connection pool, schema creation, and default tag seeding

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

mod maintenance;
mod manuals;
mod vehicles;
mod videos;

pub struct Storage {
    pub pool: SqlitePool,
}

impl Storage {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        // foreign_keys must be ON for the cascade deletes to fire
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// In-memory database for tests. A single connection keeps the
    /// database alive for the pool's lifetime.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vehicles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL CHECK(type IN ('bike', 'motorcycle', 'car')),
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER,
                vin TEXT,
                color TEXT,
                purchase_date DATE,
                purchase_price REAL,
                current_mileage INTEGER,
                license_plate TEXT,
                insurance_policy TEXT,
                insurance_expiry DATE,
                oil_type TEXT,
                oil_change_interval_miles INTEGER,
                oil_change_interval_months INTEGER,
                notes TEXT,
                image_path TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS manuals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vehicle_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                FOREIGN KEY (vehicle_id) REFERENCES vehicles(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vehicle_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                type TEXT NOT NULL CHECK(type IN ('local', 'youtube')),
                path_or_url TEXT NOT NULL,
                thumbnail_path TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                FOREIGN KEY (vehicle_id) REFERENCES vehicles(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS maintenance_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vehicle_id INTEGER NOT NULL,
                date DATE NOT NULL,
                description TEXT NOT NULL,
                mileage INTEGER,
                cost REAL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                FOREIGN KEY (vehicle_id) REFERENCES vehicles(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS maintenance_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                color TEXT NOT NULL DEFAULT '#6b7280',
                icon TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS maintenance_log_tags (
                log_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (log_id, tag_id),
                FOREIGN KEY (log_id) REFERENCES maintenance_logs(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES maintenance_tags(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts the canonical tag set the quick-add templates resolve
    /// against. Idempotent; existing names are left untouched.
    pub async fn seed_default_tags(&self) -> Result<()> {
        const DEFAULT_TAGS: &[(&str, &str, &str)] = &[
            ("Oil Change", "#f59e0b", "droplet"),
            ("Tire Rotation", "#3b82f6", "refresh-cw"),
            ("Brake Service", "#ef4444", "disc"),
            ("Filter Replacement", "#8b5cf6", "wind"),
            ("Battery", "#10b981", "battery"),
            ("Inspection", "#6366f1", "search"),
            ("Fluid Check", "#06b6d4", "droplets"),
            ("Tune Up", "#ec4899", "wrench"),
            ("Chain/Belt", "#84cc16", "link"),
            ("Electrical", "#f97316", "zap"),
        ];

        for (name, color, icon) in DEFAULT_TAGS {
            sqlx::query("INSERT OR IGNORE INTO maintenance_tags (name, color, icon) VALUES (?, ?, ?)")
                .bind(name)
                .bind(color)
                .bind(icon)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}
