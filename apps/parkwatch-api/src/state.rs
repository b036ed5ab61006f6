//! Application state for the parkwatch API

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use parkwatch_core::{slot, PlateToken};

use crate::gate::ReportGate;
use crate::ledger::ViolationLedger;
use crate::matcher::PlateMatcher;
use crate::photos::FsPhotoStore;

pub struct AppState {
    pub db: SqlitePool,
    pub matcher: PlateMatcher,
    pub gate: ReportGate,
    pub ledger: ViolationLedger,
    pub photos: FsPhotoStore,
}

impl AppState {
    pub async fn new(database_url: &str, uploads_root: &Path) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to {}", database_url))?;

        Self::run_migrations(&pool).await?;

        let photos = FsPhotoStore::new(uploads_root)
            .await
            .with_context(|| format!("Failed to open uploads root {}", uploads_root.display()))?;

        Ok(Self {
            matcher: PlateMatcher::new(pool.clone()),
            gate: ReportGate::new(pool.clone()),
            ledger: ViolationLedger::new(pool.clone()),
            photos,
            db: pool,
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS residents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                phone TEXT,
                building_number TEXT,
                unit_number TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS owner_vehicles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                license_plate TEXT NOT NULL,
                owner_name TEXT NOT NULL,
                phone TEXT,
                building_number TEXT,
                unit_number TEXT,
                parking_space TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        // The UNIQUE triple is what makes "one report per plate per
        // reporter per day" hold under concurrency; the ledger relies on
        // it instead of checking first.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS violation_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                license_plate TEXT NOT NULL,
                reporter_id INTEGER NOT NULL REFERENCES residents(id),
                photo_path TEXT,
                location TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                violation_time TEXT NOT NULL,
                report_day TEXT NOT NULL,
                UNIQUE (license_plate, reporter_id, report_day)
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Index matching the list order
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_violations_time
            ON violation_records (violation_time DESC, id DESC)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Load residents and vehicles from a JSON seed file into empty tables.
    ///
    /// Plate fields are normalized token by token before storage so that
    /// lookups against normalized query plates compare like with like.
    /// Tables that already hold rows are left alone.
    pub async fn seed_from_file(&self, path: &Path) -> Result<()> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: SeedFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

        let residents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM residents")
            .fetch_one(&self.db)
            .await?;
        if residents == 0 {
            for resident in &seed.residents {
                sqlx::query(
                    "INSERT INTO residents (username, phone, building_number, unit_number) VALUES (?, ?, ?, ?)",
                )
                .bind(&resident.username)
                .bind(&resident.phone)
                .bind(&resident.building_number)
                .bind(&resident.unit_number)
                .execute(&self.db)
                .await?;
            }
            tracing::info!("Seeded {} residents", seed.residents.len());
        } else {
            tracing::info!("Residents table already populated, skipping seed");
        }

        let vehicles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM owner_vehicles")
            .fetch_one(&self.db)
            .await?;
        if vehicles == 0 {
            for vehicle in &seed.owner_vehicles {
                let field = normalize_plate_field(&vehicle.license_plate)?;
                sqlx::query(
                    "INSERT INTO owner_vehicles (license_plate, owner_name, phone, building_number, unit_number, parking_space) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&field)
                .bind(&vehicle.owner_name)
                .bind(&vehicle.phone)
                .bind(&vehicle.building_number)
                .bind(&vehicle.unit_number)
                .bind(&vehicle.parking_space)
                .execute(&self.db)
                .await?;
            }
            tracing::info!("Seeded {} owner vehicles", seed.owner_vehicles.len());
        } else {
            tracing::info!("Vehicle roster already populated, skipping seed");
        }

        Ok(())
    }
}

/// Rebuild a delimited plate field from its normalized tokens.
fn normalize_plate_field(field: &str) -> Result<String> {
    let mut normalized = Vec::new();
    for token in slot::tokens(field) {
        match PlateToken::parse(token) {
            Ok(plate) => normalized.push(plate.to_string()),
            Err(e) => bail!("Invalid plate {:?} in seed data: {}", token, e),
        }
    }
    if normalized.is_empty() {
        bail!("Empty plate field in seed data");
    }
    Ok(normalized.join(","))
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    residents: Vec<SeedResident>,
    #[serde(default)]
    owner_vehicles: Vec<SeedVehicle>,
}

#[derive(Debug, Deserialize)]
struct SeedResident {
    username: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    building_number: Option<String>,
    #[serde(default)]
    unit_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedVehicle {
    license_plate: String,
    owner_name: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    building_number: Option<String>,
    #[serde(default)]
    unit_number: Option<String>,
    #[serde(default)]
    parking_space: Option<String>,
}
