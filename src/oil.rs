// ABOUTME: Oil-change due projection derived from interval config and the
// ABOUTME: last matching maintenance log; pure functions of an injected "today"

use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::types::{MaintenanceLog, Vehicle, VehicleType};

const SOON_MILES: i64 = 500;
const SOON_DAYS: i64 = 30;

/// Urgency buckets; variant order is the report sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OilChangeStatus {
    Overdue,
    Soon,
    Ok,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct OilChangeProjection {
    pub status: OilChangeStatus,
    pub next_due_miles: Option<i64>,
    pub next_due_date: Option<NaiveDate>,
    pub miles_remaining: Option<i64>,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OilStatusEntry {
    pub vehicle_id: i64,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub current_mileage: Option<i64>,
    #[serde(flatten)]
    pub projection: OilChangeProjection,
    pub last_oil_change: Option<MaintenanceLog>,
}

/// Classifies a vehicle's oil-change due status from its configured
/// intervals and the last matching log. Status is `unknown` when there
/// is no last change, no interval configured, or neither leg yields a
/// remaining amount to classify on.
pub fn project(
    vehicle: &Vehicle,
    last_change: Option<&MaintenanceLog>,
    today: NaiveDate,
) -> OilChangeProjection {
    let Some(last) = last_change else {
        return OilChangeProjection {
            status: OilChangeStatus::Unknown,
            next_due_miles: None,
            next_due_date: None,
            miles_remaining: None,
            days_remaining: None,
        };
    };

    let next_due_miles = match (vehicle.oil_change_interval_miles, last.mileage) {
        (Some(interval), Some(at_miles)) => Some(at_miles + interval),
        _ => None,
    };
    let miles_remaining = match (next_due_miles, vehicle.current_mileage) {
        (Some(due), Some(current)) => Some(due - current),
        _ => None,
    };

    let next_due_date = vehicle
        .oil_change_interval_months
        .and_then(|months| u32::try_from(months).ok())
        .and_then(|months| last.date.checked_add_months(Months::new(months)));
    let days_remaining = next_due_date.map(|due| (due - today).num_days());

    let overdue = miles_remaining.is_some_and(|m| m <= 0) || days_remaining.is_some_and(|d| d <= 0);
    let soon = miles_remaining.is_some_and(|m| m <= SOON_MILES)
        || days_remaining.is_some_and(|d| d <= SOON_DAYS);

    let status = if miles_remaining.is_none() && days_remaining.is_none() {
        // a due point may exist, but nothing to measure it against
        OilChangeStatus::Unknown
    } else if overdue {
        OilChangeStatus::Overdue
    } else if soon {
        OilChangeStatus::Soon
    } else {
        OilChangeStatus::Ok
    };

    OilChangeProjection {
        status,
        next_due_miles,
        next_due_date,
        miles_remaining,
        days_remaining,
    }
}

/// Builds the fleet-wide due report: cars and motorcycles only (bikes
/// have no oil), sorted most urgent first.
pub fn report(
    vehicles: Vec<(Vehicle, Option<MaintenanceLog>)>,
    today: NaiveDate,
) -> Vec<OilStatusEntry> {
    let mut entries: Vec<OilStatusEntry> = vehicles
        .into_iter()
        .filter(|(v, _)| {
            matches!(v.vehicle_type, VehicleType::Car | VehicleType::Motorcycle)
        })
        .map(|(vehicle, last)| {
            let projection = project(&vehicle, last.as_ref(), today);
            OilStatusEntry {
                vehicle_id: vehicle.id,
                make: vehicle.make,
                model: vehicle.model,
                year: vehicle.year,
                vehicle_type: vehicle.vehicle_type,
                current_mileage: vehicle.current_mileage,
                projection,
                last_oil_change: last,
            }
        })
        .collect();

    entries.sort_by_key(|e| e.projection.status);
    entries
}
