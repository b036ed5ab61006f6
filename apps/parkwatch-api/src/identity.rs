//! Reporter identity from trusted headers.
//!
//! Credential handling lives upstream: the gateway fronting this service
//! authenticates residents and forwards the resulting id in a header.
//! Nothing here verifies passwords or tokens.

use axum::http::HeaderMap;
use sqlx::SqlitePool;

use crate::error::ApiError;

/// Header the fronting gateway puts the authenticated resident id in.
pub const RESIDENT_ID_HEADER: &str = "x-resident-id";

/// Extract the reporter id, rejecting requests without one.
pub fn require_reporter(headers: &HeaderMap) -> Result<i64, ApiError> {
    headers
        .get(RESIDENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(ApiError::Unauthorized)
}

/// Check the resident behind a forwarded id actually exists.
pub async fn ensure_resident(pool: &SqlitePool, reporter_id: i64) -> Result<(), ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM residents WHERE id = ?)")
        .bind(reporter_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
