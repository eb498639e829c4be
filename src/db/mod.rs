//! PostgreSQL persistence for ingested photos.
//!
//! One ingest is one transaction: the picture row plus its three 1:1
//! satellite rows are written all-or-nothing, keywords are linked best-effort
//! per tag, and the caller's finalize hook (the physical file move) runs as
//! the transaction's last success criterion before commit.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use postgres::{NoTls, Transaction};
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::Config;
use crate::metadata::PhotoMetadata;

mod schema;

use schema::POSTGRES_SCHEMA;

/// Everything the store needs to record one ingested file. Immutable once
/// built; the sole input to persistence.
#[derive(Debug, Clone)]
pub struct IngestPayload {
    /// Clean display name.
    pub file_name: String,
    /// Destination directory relative to the photos root.
    pub relative_dir: PathBuf,
    /// Absolute destination path.
    pub full_path: PathBuf,
    pub owner: String,
    pub file_size: u64,
    /// Resolved capture date (metadata → filename → mtime cascade).
    pub file_datetime: NaiveDateTime,
    pub metadata: PhotoMetadata,
}

pub struct PhotoStore {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

impl PhotoStore {
    pub fn connect(config: &Config) -> Result<Self> {
        let manager = PostgresConnectionManager::new(config.pg_config(), NoTls);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .context("building postgres connection pool")?;
        Ok(Self { pool })
    }

    /// Apply the idempotent schema.
    pub fn initialize(&self) -> Result<()> {
        let mut client = self.pool.get()?;
        client.batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    /// Record one photo and its metadata in a single transaction.
    ///
    /// `finalize` runs after every insert and before commit; a finalize
    /// failure rolls the rows back, and an insert failure means finalize
    /// never runs. Returns the generated picture id.
    pub fn store(
        &self,
        payload: &IngestPayload,
        finalize: impl FnOnce() -> Result<()>,
    ) -> Result<i64> {
        let mut client = self.pool.get().context("checking out database connection")?;
        let mut tx = client.transaction().context("starting transaction")?;

        let picture_id = insert_picture(&mut tx, payload)?;
        insert_location(&mut tx, picture_id, &payload.metadata)?;
        insert_exif(&mut tx, picture_id, &payload.metadata)?;
        insert_iptc(&mut tx, picture_id, &payload.metadata)?;
        link_keywords(&mut tx, picture_id, &payload.metadata.keywords);

        finalize()?;
        tx.commit().context("committing transaction")?;

        debug!("stored picture id {picture_id}");
        Ok(picture_id)
    }
}

fn insert_picture(tx: &mut Transaction, payload: &IngestPayload) -> Result<i64> {
    let file_path = payload.relative_dir.to_string_lossy().into_owned();
    let full_path = payload.full_path.to_string_lossy().into_owned();
    let row = tx
        .query_one(
            "INSERT INTO pictures \
             (file_name, file_path, full_path, file_size, width, height, file_datetime, upload_user) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
            &[
                &payload.file_name,
                &file_path,
                &full_path,
                &(payload.file_size as i64),
                &(payload.metadata.width as i32),
                &(payload.metadata.height as i32),
                &payload.file_datetime,
                &payload.owner,
            ],
        )
        .context("inserting picture row")?;
    Ok(row.get(0))
}

fn insert_location(tx: &mut Transaction, picture_id: i64, meta: &PhotoMetadata) -> Result<()> {
    tx.execute(
        "INSERT INTO meta_location (ref_picture, country, country_code, province, city) \
         VALUES ($1, $2, $3, $4, $5)",
        &[
            &picture_id,
            &meta.country,
            &meta.country_code,
            &meta.province,
            &meta.city,
        ],
    )
    .context("inserting location row")?;
    Ok(())
}

fn insert_exif(tx: &mut Transaction, picture_id: i64, meta: &PhotoMetadata) -> Result<()> {
    tx.execute(
        "INSERT INTO meta_exif \
         (ref_picture, make, model, iso, aperture, exposure_time, gps_latitude, gps_longitude, datetime_original) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        &[
            &picture_id,
            &meta.make,
            &meta.model,
            &meta.iso,
            &meta.aperture,
            &meta.exposure_time,
            &meta.gps_latitude,
            &meta.gps_longitude,
            &meta.captured_at,
        ],
    )
    .context("inserting exif row")?;
    Ok(())
}

fn insert_iptc(tx: &mut Transaction, picture_id: i64, meta: &PhotoMetadata) -> Result<()> {
    tx.execute(
        "INSERT INTO meta_iptc (ref_picture, object_name, caption, copyright) \
         VALUES ($1, $2, $3, $4)",
        &[&picture_id, &meta.title, &meta.caption, &meta.copyright],
    )
    .context("inserting iptc row")?;
    Ok(())
}

/// Link every non-empty keyword to the picture. Best-effort per tag: each
/// link runs under its own savepoint so one failing tag never poisons the
/// surrounding transaction.
fn link_keywords(tx: &mut Transaction, picture_id: i64, keywords: &[String]) {
    for raw in keywords {
        let tag = raw.trim();
        if tag.is_empty() {
            continue;
        }
        if let Err(e) = link_one(tx, picture_id, tag) {
            warn!("keyword link failed for {tag:?}: {e:#}");
        }
    }
}

fn link_one(tx: &mut Transaction, picture_id: i64, tag: &str) -> Result<()> {
    let mut savepoint = tx.savepoint("keyword_link")?;
    let keyword_id = keyword_id(&mut savepoint, tag)?;
    savepoint.execute(
        "INSERT INTO picture_keywords (picture_id, keyword_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
        &[&picture_id, &keyword_id],
    )?;
    savepoint.commit()?;
    Ok(())
}

/// Resolve the id for a tag, creating it on first occurrence.
///
/// Lookup, then a duplicate-safe insert, then a re-lookup: a concurrent
/// writer may insert the same tag between the first two steps, in which case
/// the conflict-suppressed insert returns no row and the final lookup finds
/// the winner. Exactly one row per unique tag text regardless of race
/// outcome.
fn keyword_id(tx: &mut Transaction, tag: &str) -> Result<i64> {
    if let Some(row) = tx.query_opt("SELECT id FROM keywords WHERE tag = $1", &[&tag])? {
        return Ok(row.get(0));
    }
    if let Some(row) = tx.query_opt(
        "INSERT INTO keywords (tag) VALUES ($1) ON CONFLICT (tag) DO NOTHING RETURNING id",
        &[&tag],
    )? {
        return Ok(row.get(0));
    }
    let row = tx
        .query_one("SELECT id FROM keywords WHERE tag = $1", &[&tag])
        .context("keyword vanished after conflicting insert")?;
    Ok(row.get(0))
}
