// ABOUTME: Environment-driven configuration for the garage server
// ABOUTME: Reads .env plus GARAGE_* variables with local-development defaults

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bind = std::env::var("GARAGE_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("GARAGE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);
        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("garage.db"));
        let upload_dir = std::env::var("UPLOAD_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        Self {
            bind,
            port,
            database_path,
            upload_dir,
        }
    }
}
