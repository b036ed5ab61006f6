//! Plate-to-owner resolution.

use std::collections::HashMap;

use sqlx::SqlitePool;

use parkwatch_core::{slot, PlateToken};

use crate::error::ApiError;
use crate::models::OwnerVehicleRow;

/// Resolves normalized plates against the registered vehicle roster.
///
/// A slot row may carry several comma-delimited plates. The database only
/// narrows candidates with a containment prefilter (normalized plates hold
/// no LIKE wildcards, so binding them into a pattern is safe); whether a
/// candidate actually matches is decided by whole-token equality. A plate
/// that merely appears inside a longer registered plate never resolves.
#[derive(Debug, Clone)]
pub struct PlateMatcher {
    pool: SqlitePool,
}

impl PlateMatcher {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the slot whose plate set contains `plate`.
    ///
    /// An unregistered plate is a normal outcome, not an error; callers
    /// decide whether that means "reject the report" or "answer owned: false".
    pub async fn resolve(&self, plate: &PlateToken) -> Result<Option<OwnerVehicleRow>, ApiError> {
        let candidates: Vec<OwnerVehicleRow> = sqlx::query_as(
            r#"
            SELECT id, license_plate, owner_name, phone, building_number, unit_number, parking_space
            FROM owner_vehicles
            WHERE license_plate LIKE ?
            ORDER BY id
            "#,
        )
        .bind(format!("%{}%", plate.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(candidates
            .into_iter()
            .find(|row| slot::contains(&row.license_plate, plate.as_str())))
    }

    /// Resolve a batch of plates in one roster query, keyed by plate text.
    ///
    /// This is what keeps list enrichment bounded: one call per page, not
    /// one per row. Plates that resolve to nothing are simply absent from
    /// the map.
    pub async fn resolve_many(
        &self,
        plates: &[PlateToken],
    ) -> Result<HashMap<String, OwnerVehicleRow>, ApiError> {
        if plates.is_empty() {
            return Ok(HashMap::new());
        }

        let prefilter = vec!["license_plate LIKE ?"; plates.len()].join(" OR ");
        let query = format!(
            "SELECT id, license_plate, owner_name, phone, building_number, unit_number, parking_space \
             FROM owner_vehicles WHERE {} ORDER BY id",
            prefilter
        );

        let mut candidates = sqlx::query_as::<_, OwnerVehicleRow>(&query);
        for plate in plates {
            candidates = candidates.bind(format!("%{}%", plate.as_str()));
        }
        let candidates = candidates.fetch_all(&self.pool).await?;

        let mut resolved = HashMap::new();
        for plate in plates {
            if let Some(row) = candidates
                .iter()
                .find(|row| slot::contains(&row.license_plate, plate.as_str()))
            {
                resolved.insert(plate.as_str().to_string(), row.clone());
            }
        }

        Ok(resolved)
    }
}
