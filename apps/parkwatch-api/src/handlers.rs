//! HTTP handlers for the parkwatch API

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use std::sync::Arc;

use parkwatch_core::PlateToken;

use crate::error::ApiError;
use crate::identity;
use crate::models::*;
use crate::photos::{PhotoFormat, MAX_PHOTO_BYTES};
use crate::state::AppState;

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "parkwatch-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /api/vehicles/check/:plate
///
/// Read-only ownership probe. Tells the caller whether the plate belongs
/// to a registered vehicle, how many reports it has drawn, and whether the
/// caller already reported it today.
pub async fn check_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plate): Path<String>,
) -> Result<Json<CheckOwnershipResponse>, ApiError> {
    let reporter_id = identity::require_reporter(&headers)?;

    // A plate that does not normalize cannot be registered; that is this
    // endpoint's normal "not owned" answer, not an error.
    let Ok(plate) = PlateToken::parse(&plate) else {
        return Ok(Json(CheckOwnershipResponse::not_owned()));
    };

    let Some(owner) = state.matcher.resolve(&plate).await? else {
        return Ok(Json(CheckOwnershipResponse::not_owned()));
    };

    let violation_count = state.ledger.count_for_plate(&plate).await?;
    let has_reported_today = state
        .gate
        .already_reported(&plate, reporter_id, Utc::now())
        .await?;

    tracing::debug!(
        "Ownership check for {}: registered, {} prior reports",
        plate,
        violation_count
    );

    Ok(Json(CheckOwnershipResponse {
        owned: true,
        owner: Some(owner.into()),
        violation_count,
        has_reported_today,
    }))
}

/// Handler: GET /api/vehicles/owners
///
/// The full vehicle roster, ordered by building and unit.
pub async fn list_owner_vehicles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OwnerVehicleRow>>, ApiError> {
    identity::require_reporter(&headers)?;

    let vehicles: Vec<OwnerVehicleRow> = sqlx::query_as(
        r#"
        SELECT id, license_plate, owner_name, phone, building_number, unit_number, parking_space
        FROM owner_vehicles
        ORDER BY building_number, unit_number
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(vehicles))
}

/// Handler: POST /api/violations/report
///
/// The whole submission flow: identity, field validation, ownership,
/// the per-day gate, photo storage, and finally the atomic ledger append.
/// If anything fails after the photo hit disk, the photo is removed again;
/// a report either commits with its photo or leaves nothing behind.
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SubmitReportRequest>,
) -> Result<(StatusCode, Json<SubmitReportResponse>), ApiError> {
    let reporter_id = identity::require_reporter(&headers)?;
    identity::ensure_resident(&state.db, reporter_id).await?;

    if req.location.trim().is_empty() {
        return Err(ApiError::Validation("location is required".to_string()));
    }
    let plate = PlateToken::parse(&req.license_plate)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let description = req.description.unwrap_or_default();

    let now = Utc::now();

    // Only registered vehicles can be reported.
    if state.matcher.resolve(&plate).await?.is_none() {
        return Err(ApiError::NotOwned(plate.to_string()));
    }

    // Fast-fail before the photo is written. The append below still
    // enforces the gate; this probe just keeps the common duplicate from
    // ever touching the blob store.
    if state
        .gate
        .already_reported(&plate, reporter_id, now)
        .await?
    {
        return Err(ApiError::DuplicateReport(plate.to_string()));
    }

    let photo_reference = match req.photo_base64.as_deref() {
        Some(encoded) => Some(store_photo(&state, encoded).await?),
        None => None,
    };

    let report = NewViolation {
        plate: plate.clone(),
        reporter_id,
        photo_reference: photo_reference.clone(),
        location: req.location,
        description,
    };

    match state.ledger.append(&report, now).await {
        Ok(id) => {
            tracing::info!(
                "Report {} filed for plate {} by resident {}",
                id,
                plate,
                reporter_id
            );
            Ok((
                StatusCode::CREATED,
                Json(SubmitReportResponse {
                    id,
                    photo_reference,
                }),
            ))
        }
        Err(e) => {
            // Lost the append (usually a duplicate race): the photo must
            // not stay behind as an orphan.
            if let Some(reference) = &photo_reference {
                if let Err(cleanup) = state.photos.remove(reference).await {
                    tracing::error!(
                        "Failed to remove photo {} after failed append: {}",
                        reference,
                        cleanup
                    );
                }
            }
            Err(e)
        }
    }
}

/// Decode, sniff, and persist a submitted photo.
async fn store_photo(state: &AppState, encoded: &str) -> Result<String, ApiError> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| ApiError::Validation(format!("Invalid photo base64: {}", e)))?;

    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(ApiError::Validation(format!(
            "Photo exceeds {} bytes",
            MAX_PHOTO_BYTES
        )));
    }

    let format = PhotoFormat::sniff(&bytes)
        .ok_or_else(|| ApiError::Validation("Photo must be a PNG or JPEG image".to_string()))?;

    state.photos.store(&bytes, format).await
}

/// Handler: GET /api/violations/list
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListReportsResponse>, ApiError> {
    identity::require_reporter(&headers)?;

    // An empty filter parameter means "no filter"; a malformed one is an
    // error rather than an empty result set.
    let plate_filter = match query.license_plate.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(
            PlateToken::parse(raw).map_err(|e| ApiError::Validation(e.to_string()))?,
        ),
        _ => None,
    };

    let (violations, total) = state
        .ledger
        .list(plate_filter.as_ref(), query.page, query.limit)
        .await?;

    Ok(Json(ListReportsResponse {
        violations,
        total,
        page: query.page,
        limit: query.limit,
    }))
}

/// Handler: DELETE /api/violations/:id
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<DeleteReportResponse>, ApiError> {
    let reporter_id = identity::require_reporter(&headers)?;

    let photo_reference = state.ledger.delete(id, reporter_id).await?;

    if let Some(reference) = photo_reference {
        if let Err(e) = state.photos.remove(&reference).await {
            tracing::warn!("Report {} deleted but photo {} remains: {}", id, reference, e);
        }
    }

    tracing::info!("Report {} deleted by resident {}", id, reporter_id);

    Ok(Json(DeleteReportResponse { deleted: true }))
}
