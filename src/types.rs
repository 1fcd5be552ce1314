// ABOUTME: Domain types for vehicles, manuals, videos, maintenance logs and tags
// ABOUTME: Includes request payloads, explicit patch structs, and aggregate summaries

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Distinguishes a field that was omitted from a patch (outer `None`,
/// keep the stored value) from one explicitly set to null (inner `None`,
/// clear the stored value).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Bike,
    Motorcycle,
    Car,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Bike => "bike",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Car => "car",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bike" => Some(VehicleType::Bike),
            "motorcycle" => Some(VehicleType::Motorcycle),
            "car" => Some(VehicleType::Car),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Local,
    Youtube,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Local => "local",
            VideoType::Youtube => "youtube",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(VideoType::Local),
            "youtube" => Some(VideoType::Youtube),
            _ => None,
        }
    }
}

// Vehicles

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub current_mileage: Option<i64>,
    pub license_plate: Option<String>,
    pub insurance_policy: Option<String>,
    pub insurance_expiry: Option<NaiveDate>,
    pub oil_type: Option<String>,
    pub oil_change_interval_miles: Option<i64>,
    pub oil_change_interval_months: Option<i64>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Vehicle row joined with counts of its dependent records.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleWithCounts {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub manual_count: i64,
    pub video_count: i64,
    pub maintenance_count: i64,
}

/// All vehicles bucketed by type. Rows whose stored type is not one of
/// the three known kinds are dropped from the grouping.
#[derive(Debug, Default, Serialize)]
pub struct GroupedVehicles {
    pub bike: Vec<VehicleWithCounts>,
    pub motorcycle: Vec<VehicleWithCounts>,
    pub car: Vec<VehicleWithCounts>,
}

#[derive(Debug, Serialize)]
pub struct VehicleStats {
    pub bike_count: i64,
    pub motorcycle_count: i64,
    pub car_count: i64,
    pub total_count: i64,
    pub total_manuals: i64,
    pub total_videos: i64,
    pub total_maintenance: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewVehicle {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    pub year: Option<i64>,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub current_mileage: Option<i64>,
    pub license_plate: Option<String>,
    pub insurance_policy: Option<String>,
    pub insurance_expiry: Option<NaiveDate>,
    pub oil_type: Option<String>,
    pub oil_change_interval_miles: Option<i64>,
    pub oil_change_interval_months: Option<i64>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
}

/// Partial vehicle update. Omitted fields keep the stored value; the
/// nullable fields use double-`Option` so an explicit null clears them.
#[derive(Debug, Default, Deserialize)]
pub struct VehiclePatch {
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub vin: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub current_mileage: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub license_plate: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub insurance_policy: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub insurance_expiry: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub oil_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub oil_change_interval_miles: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub oil_change_interval_months: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

// Manuals

#[derive(Debug, Clone, Serialize)]
pub struct Manual {
    pub id: i64,
    pub vehicle_id: i64,
    pub title: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualWithVehicle {
    #[serde(flatten)]
    pub manual: Manual,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
}

#[derive(Debug)]
pub struct NewManual {
    pub vehicle_id: i64,
    pub title: String,
    pub file_path: String,
    pub file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManualPatch {
    pub title: Option<String>,
}

/// Counts keyed by vehicle type, all three keys always present.
#[derive(Debug, Default, Serialize)]
pub struct TypeCounts {
    pub bike: i64,
    pub motorcycle: i64,
    pub car: i64,
}

// Videos

#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: i64,
    pub vehicle_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub video_type: VideoType,
    pub path_or_url: String,
    pub thumbnail_path: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoWithVehicle {
    #[serde(flatten)]
    pub video: Video,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    pub vehicle_type: VehicleType,
}

#[derive(Debug)]
pub struct NewVideo {
    pub vehicle_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub video_type: VideoType,
    pub path_or_url: String,
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Default)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct VideoTypeCounts {
    pub local: i64,
    pub youtube: i64,
}

// Maintenance

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceLog {
    pub id: i64,
    pub vehicle_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub mileage: Option<i64>,
    pub cost: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceLogWithTags {
    #[serde(flatten)]
    pub log: MaintenanceLog,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    pub vehicle_type: VehicleType,
    /// Always a list, empty when the log has no tags.
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagWithUsage {
    #[serde(flatten)]
    pub tag: Tag,
    pub usage_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewTag {
    #[serde(default)]
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewMaintenanceLog {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub mileage: Option<i64>,
    pub cost: Option<f64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Partial maintenance-log update; `tag_ids`, when present, fully
/// replaces the log's tag set.
#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceLogPatch {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub mileage: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cost: Option<Option<f64>>,
    pub tag_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct QuickAddRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub mileage: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CostSummary {
    pub total_logs: i64,
    pub total_cost: Option<f64>,
    pub average_cost: Option<f64>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    pub first_maintenance: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
}
