//! Per-day report gating.

use chrono::{DateTime, Local, Utc};
use sqlx::SqlitePool;

use parkwatch_core::{PlateToken, ReportWindow};

use crate::error::ApiError;

/// Answers whether a (plate, reporter) pair already reported today.
///
/// This probe is read-only and advisory. The authoritative enforcement is
/// the UNIQUE constraint on `(license_plate, reporter_id, report_day)`
/// together with the ledger's conflict-aware append; two racing
/// submissions can both pass the probe, but only one insert commits.
#[derive(Debug, Clone)]
pub struct ReportGate {
    pool: SqlitePool,
}

impl ReportGate {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The report window containing `now`, on the server-local calendar.
    ///
    /// Reporters and the residents they report live in the same place, so
    /// "one report per day" follows the wall clock of the deployment, not
    /// UTC.
    pub fn window_containing(now: DateTime<Utc>) -> ReportWindow {
        ReportWindow::containing(now.with_timezone(&Local))
    }

    /// Has `reporter_id` already filed a report for `plate` within the
    /// window containing `now`?
    pub async fn already_reported(
        &self,
        plate: &PlateToken,
        reporter_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        let window = Self::window_containing(now);

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM violation_records
                WHERE license_plate = ? AND reporter_id = ? AND report_day = ?
            )
            "#,
        )
        .bind(plate.as_str())
        .bind(reporter_id)
        .bind(window.day())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
