//! The violation ledger: append, list, delete.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use parkwatch_core::PlateToken;

use crate::error::ApiError;
use crate::gate::ReportGate;
use crate::matcher::PlateMatcher;
use crate::models::{EnrichedViolation, NewViolation, ViolationRow};

/// Largest page a single list call returns.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Append-mostly store of violation reports.
pub struct ViolationLedger {
    pool: SqlitePool,
    matcher: PlateMatcher,
}

impl ViolationLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            matcher: PlateMatcher::new(pool.clone()),
            pool,
        }
    }

    /// Append one report.
    ///
    /// The insert carries the report-day key and yields to the UNIQUE
    /// constraint in a single statement, so a lost per-day race surfaces
    /// here as `DuplicateReport` no matter how requests interleaved.
    /// There is deliberately no separate existence check on this path.
    pub async fn append(&self, report: &NewViolation, now: DateTime<Utc>) -> Result<i64, ApiError> {
        let window = ReportGate::window_containing(now);

        // Fixed-width UTC timestamps keep lexicographic TEXT order equal
        // to chronological order, which the list ORDER BY relies on.
        let violation_time = now.to_rfc3339_opts(SecondsFormat::Micros, true);

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO violation_records
                (license_plate, reporter_id, photo_path, location, description, violation_time, report_day)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (license_plate, reporter_id, report_day) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(report.plate.as_str())
        .bind(report.reporter_id)
        .bind(report.photo_reference.as_deref())
        .bind(&report.location)
        .bind(&report.description)
        .bind(&violation_time)
        .bind(window.day())
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or_else(|| ApiError::DuplicateReport(report.plate.to_string()))
    }

    /// How many reports a plate has accumulated, across all reporters and days.
    pub async fn count_for_plate(&self, plate: &PlateToken) -> Result<i64, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM violation_records WHERE license_plate = ?")
                .bind(plate.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// One page of reports, newest first, enriched with reporter and owner
    /// context. Returns the page and the total row count under the filter.
    ///
    /// Ordering is total: ties on `violation_time` fall back to id, so the
    /// same data always pages the same way.
    pub async fn list(
        &self,
        plate_filter: Option<&PlateToken>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<EnrichedViolation>, i64), ApiError> {
        if page < 1 {
            return Err(ApiError::Validation("page must be at least 1".to_string()));
        }
        if limit < 1 || limit > MAX_PAGE_SIZE {
            return Err(ApiError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let offset = i64::from(page - 1) * i64::from(limit);

        let (total, rows): (i64, Vec<ViolationRow>) = match plate_filter {
            Some(plate) => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM violation_records WHERE license_plate = ?",
                )
                .bind(plate.as_str())
                .fetch_one(&self.pool)
                .await?;

                let rows = sqlx::query_as(
                    r#"
                    SELECT id, license_plate, reporter_id, photo_path, location, description, violation_time
                    FROM violation_records
                    WHERE license_plate = ?
                    ORDER BY violation_time DESC, id DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(plate.as_str())
                .bind(i64::from(limit))
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM violation_records")
                    .fetch_one(&self.pool)
                    .await?;

                let rows = sqlx::query_as(
                    r#"
                    SELECT id, license_plate, reporter_id, photo_path, location, description, violation_time
                    FROM violation_records
                    ORDER BY violation_time DESC, id DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(i64::from(limit))
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                (total, rows)
            }
        };

        let enriched = self.enrich(rows).await?;
        Ok((enriched, total))
    }

    /// Attach reporter names and owner context to one page of rows.
    ///
    /// Two batched lookups for the whole page: one over residents, one
    /// over the vehicle roster. Rows whose context is gone (deleted
    /// resident, unregistered plate) still list, just without it.
    async fn enrich(&self, rows: Vec<ViolationRow>) -> Result<Vec<EnrichedViolation>, ApiError> {
        let mut reporter_ids: Vec<i64> = rows.iter().map(|r| r.reporter_id).collect();
        reporter_ids.sort_unstable();
        reporter_ids.dedup();
        let reporter_names = self.reporter_names(&reporter_ids).await?;

        let mut plates: Vec<PlateToken> = Vec::new();
        for row in &rows {
            if let Ok(plate) = PlateToken::parse(&row.license_plate) {
                if !plates.contains(&plate) {
                    plates.push(plate);
                }
            }
        }
        let owners = self.matcher.resolve_many(&plates).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let owner = owners.get(row.license_plate.as_str());
                let owner_name = owner.map(|o| o.owner_name.clone());
                let building_number = owner.and_then(|o| o.building_number.clone());
                let unit_number = owner.and_then(|o| o.unit_number.clone());
                let reporter_name = reporter_names
                    .get(&row.reporter_id)
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string());

                EnrichedViolation {
                    id: row.id,
                    license_plate: row.license_plate,
                    reporter_id: row.reporter_id,
                    reporter_name,
                    photo_reference: row.photo_path,
                    location: row.location,
                    description: row.description,
                    violation_time: row.violation_time,
                    owner_name,
                    building_number,
                    unit_number,
                }
            })
            .collect())
    }

    async fn reporter_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, ApiError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "SELECT id, username FROM residents WHERE id IN ({})",
            placeholders
        );

        let mut lookup = sqlx::query_as::<_, (i64, String)>(&query);
        for id in ids {
            lookup = lookup.bind(id);
        }

        Ok(lookup.fetch_all(&self.pool).await?.into_iter().collect())
    }

    /// Hard-delete a report, but only for the reporter who filed it.
    ///
    /// Ownership is part of the DELETE predicate, so "someone else's
    /// record" and "no such record" are indistinguishable by design.
    /// Returns the stored photo reference so the caller can remove the blob.
    pub async fn delete(&self, id: i64, requester_id: i64) -> Result<Option<String>, ApiError> {
        let deleted: Option<Option<String>> = sqlx::query_scalar(
            "DELETE FROM violation_records WHERE id = ? AND reporter_id = ? RETURNING photo_path",
        )
        .bind(id)
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?;

        deleted.ok_or(ApiError::NotFoundOrForbidden)
    }
}
