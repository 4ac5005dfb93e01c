//! Database Test Utilities
//!
//! On-disk SQLite databases in a temp dir, seeded with a small set of
//! jurisdictions, positions and parties.

#![allow(dead_code)]

use anyhow::Result;
use civic_positions::config::ImportConfig;
use civic_positions::db::directory::SqliteDirectory;
use civic_positions::db::reference::{insert_jurisdiction, insert_party, insert_position};
use civic_positions::directory::Directories;
use civic_positions::models::{
    Branch, Jurisdiction, JurisdictionKind, Party, Position, PositionLevel,
};
use civic_positions::services::{ImportLogRecorder, ImportPipeline, PositionHistoryStore};
use civic_positions::spreadsheet::CsvRowReader;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Create temporary test database with all tables
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_civic.db");
    let pool =
        civic_positions::db::init_database_pool(&db_path, ImportConfig::default().max_lock_wait())
            .await?;
    Ok((temp_dir, pool))
}

/// Reference data written by `seed_reference_data`
pub struct SeedData {
    pub governor: Position,
    pub vice_governor: Position,
    pub mayor: Position,
    pub president: Position,
    pub board_member: Position,

    pub ilocos_norte: Jurisdiction,
    pub ilocos_sur: Jurisdiction,
    pub cebu: Jurisdiction,
    pub bohol: Jurisdiction,
    pub pampanga: Jurisdiction,
    pub laoag: Jurisdiction,
    /// "Some Province" under Region I
    pub some_province_north: Jurisdiction,
    /// "Some Province" under Region II
    pub some_province_south: Jurisdiction,

    pub liberal: Party,
}

fn position(name: &str, level: PositionLevel, branch: Branch) -> Position {
    Position {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        level,
        branch,
        term_years: if level == PositionLevel::National { 6 } else { 3 },
        max_terms: Some(3),
        is_elected: true,
    }
}

pub async fn seed_reference_data(pool: &SqlitePool) -> Result<SeedData> {
    let governor = position("Governor", PositionLevel::Provincial, Branch::Executive);
    let vice_governor = position("Vice Governor", PositionLevel::Provincial, Branch::Executive);
    let mayor = position("Mayor", PositionLevel::City, Branch::Executive);
    let president = position("President", PositionLevel::National, Branch::Executive);
    let board_member = position("Provincial Board Member", PositionLevel::Provincial, Branch::Legislative);
    for p in [&governor, &vice_governor, &mayor, &president, &board_member] {
        insert_position(pool, p).await?;
    }

    let liberal = Party {
        id: Uuid::new_v4(),
        name: "Liberal Party".to_string(),
        abbreviation: Some("LP".to_string()),
        color: Some("#ffd700".to_string()),
    };
    insert_party(pool, &liberal).await?;

    let region_1 = insert_jurisdiction(pool, JurisdictionKind::Region, "Region I", None).await?;
    let region_2 = insert_jurisdiction(pool, JurisdictionKind::Region, "Region II", None).await?;
    let region_7 = insert_jurisdiction(pool, JurisdictionKind::Region, "Region VII", None).await?;

    let ilocos_norte = insert_jurisdiction(pool, JurisdictionKind::Province, "Ilocos Norte", Some(region_1)).await?;
    let ilocos_sur = insert_jurisdiction(pool, JurisdictionKind::Province, "Ilocos Sur", Some(region_1)).await?;
    let cebu = insert_jurisdiction(pool, JurisdictionKind::Province, "Cebu", Some(region_7)).await?;
    let bohol = insert_jurisdiction(pool, JurisdictionKind::Province, "Bohol", Some(region_7)).await?;
    let pampanga = insert_jurisdiction(pool, JurisdictionKind::Province, "Pampanga", Some(region_2)).await?;
    let some_province_north =
        insert_jurisdiction(pool, JurisdictionKind::Province, "Some Province", Some(region_1)).await?;
    let some_province_south =
        insert_jurisdiction(pool, JurisdictionKind::Province, "Some Province", Some(region_2)).await?;

    let laoag = insert_jurisdiction(pool, JurisdictionKind::City, "Laoag", Some(ilocos_norte)).await?;

    Ok(SeedData {
        governor,
        vice_governor,
        mayor,
        president,
        board_member,
        ilocos_norte,
        ilocos_sur,
        cebu,
        bohol,
        pampanga,
        laoag,
        some_province_north,
        some_province_south,
        liberal,
    })
}

/// Pipeline, store and recorder over `pool`, wired like the service does
pub fn create_test_pipeline(pool: &SqlitePool, config: ImportConfig) -> (Arc<ImportPipeline>, Arc<PositionHistoryStore>) {
    let store = Arc::new(PositionHistoryStore::new(pool.clone(), config.max_lock_wait()));
    let recorder = Arc::new(ImportLogRecorder::new(pool.clone(), config.max_lock_wait()));
    let pipeline = Arc::new(ImportPipeline::new(
        Directories::shared(Arc::new(SqliteDirectory::new(pool.clone()))),
        store.clone(),
        recorder,
        Arc::new(CsvRowReader::new()),
        config,
    ));
    (pipeline, store)
}
