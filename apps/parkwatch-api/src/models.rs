//! Data models for the parkwatch API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use parkwatch_core::PlateToken;

/// Registered vehicle slot, as stored.
///
/// `license_plate` is the raw comma-delimited field; interpret it through
/// `parkwatch_core::slot`, never by substring.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OwnerVehicleRow {
    pub id: i64,
    pub license_plate: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub building_number: Option<String>,
    pub unit_number: Option<String>,
    pub parking_space: Option<String>,
}

/// Violation report, as stored.
#[derive(Debug, Clone, FromRow)]
pub struct ViolationRow {
    pub id: i64,
    pub license_plate: String,
    pub reporter_id: i64,
    pub photo_path: Option<String>,
    pub location: String,
    pub description: String,
    pub violation_time: DateTime<Utc>,
}

/// A validated report ready for the ledger.
#[derive(Debug, Clone)]
pub struct NewViolation {
    pub plate: PlateToken,
    pub reporter_id: i64,
    pub photo_reference: Option<String>,
    pub location: String,
    pub description: String,
}

/// Owner details returned by the ownership check.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerInfo {
    pub license_plate: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub building_number: Option<String>,
    pub unit_number: Option<String>,
    pub parking_space: Option<String>,
}

impl From<OwnerVehicleRow> for OwnerInfo {
    fn from(row: OwnerVehicleRow) -> Self {
        Self {
            license_plate: row.license_plate,
            owner_name: row.owner_name,
            phone: row.phone,
            building_number: row.building_number,
            unit_number: row.unit_number,
            parking_space: row.parking_space,
        }
    }
}

/// Response for GET /api/vehicles/check/:plate
#[derive(Debug, Clone, Serialize)]
pub struct CheckOwnershipResponse {
    pub owned: bool,
    pub owner: Option<OwnerInfo>,
    pub violation_count: i64,
    pub has_reported_today: bool,
}

impl CheckOwnershipResponse {
    /// The answer for any plate no resident registered.
    pub fn not_owned() -> Self {
        Self {
            owned: false,
            owner: None,
            violation_count: 0,
            has_reported_today: false,
        }
    }
}

/// Request body for POST /api/violations/report
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReportRequest {
    pub license_plate: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Base64-encoded photo bytes, PNG or JPEG.
    #[serde(default)]
    pub photo_base64: Option<String>,
}

/// Response for POST /api/violations/report
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReportResponse {
    pub id: i64,
    pub photo_reference: Option<String>,
}

/// Query parameters for GET /api/violations/list
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub license_plate: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// One listed report with reporter and owner context attached.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedViolation {
    pub id: i64,
    pub license_plate: String,
    pub reporter_id: i64,
    pub reporter_name: String,
    pub photo_reference: Option<String>,
    pub location: String,
    pub description: String,
    pub violation_time: DateTime<Utc>,
    pub owner_name: Option<String>,
    pub building_number: Option<String>,
    pub unit_number: Option<String>,
}

/// Response for GET /api/violations/list
#[derive(Debug, Clone, Serialize)]
pub struct ListReportsResponse {
    pub violations: Vec<EnrichedViolation>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Response for DELETE /api/violations/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReportResponse {
    pub deleted: bool,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
