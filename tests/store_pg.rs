//! Persistence tests against a live PostgreSQL. They only run when
//! `PHOTOINBOX_TEST_PG` is set; connection parameters come from the usual
//! `PG_*` environment variables. Row names and tags carry a per-run suffix so
//! repeated runs never collide.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, NaiveDateTime};
use postgres::{Client, NoTls};

use photoinbox::config::Config;
use photoinbox::db::{IngestPayload, PhotoStore};
use photoinbox::metadata::PhotoMetadata;

fn pg_enabled() -> bool {
    std::env::var("PHOTOINBOX_TEST_PG").is_ok()
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{nanos}", std::process::id())
}

fn open_store(config: &Config) -> PhotoStore {
    let store = PhotoStore::connect(config).unwrap();
    store.initialize().unwrap();
    store
}

fn raw_client(config: &Config) -> Client {
    config.pg_config().connect(NoTls).unwrap()
}

fn file_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn payload(file_name: &str, keyword: &str) -> IngestPayload {
    let mut metadata = PhotoMetadata {
        city: "Lisbon".to_string(),
        ..Default::default()
    };
    metadata.add_keywords(keyword);

    IngestPayload {
        file_name: file_name.to_string(),
        relative_dir: PathBuf::from("2023/trip"),
        full_path: PathBuf::from(format!("/photos/2023/trip/{file_name}")),
        owner: "alice".to_string(),
        file_size: 42,
        file_datetime: file_datetime(),
        metadata,
    }
}

#[test]
fn failed_finalize_leaves_no_rows_behind() {
    if !pg_enabled() {
        return;
    }
    let config = Config::from_env();
    let store = open_store(&config);

    let suffix = unique_suffix();
    let file_name = format!("rollback-{suffix}.jpg");
    let tag = format!("rollback-tag-{suffix}");

    let stored = store.store(&payload(&file_name, &tag), || {
        anyhow::bail!("simulated move failure")
    });
    assert!(stored.is_err());

    // No picture row survived, so no satellite row can reference one either;
    // the keyword created mid-transaction rolled back with it.
    let mut client = raw_client(&config);
    let pictures = client
        .query("SELECT id FROM pictures WHERE file_name = $1", &[&file_name])
        .unwrap();
    assert!(pictures.is_empty());

    let keywords = client
        .query("SELECT id FROM keywords WHERE tag = $1", &[&tag])
        .unwrap();
    assert!(keywords.is_empty());
}

#[test]
fn shared_tag_creates_exactly_one_keyword_row() {
    if !pg_enabled() {
        return;
    }
    let config = Config::from_env();
    let store = open_store(&config);

    let suffix = unique_suffix();
    let tag = format!("shared-tag-{suffix}");

    let first = store
        .store(&payload(&format!("first-{suffix}.jpg"), &tag), || Ok(()))
        .unwrap();
    let second = store
        .store(&payload(&format!("second-{suffix}.jpg"), &tag), || Ok(()))
        .unwrap();
    assert_ne!(first, second);

    let mut client = raw_client(&config);
    let keywords = client
        .query("SELECT id FROM keywords WHERE tag = $1", &[&tag])
        .unwrap();
    assert_eq!(keywords.len(), 1);

    let keyword_id: i64 = keywords[0].get(0);
    let links = client
        .query(
            "SELECT picture_id FROM picture_keywords WHERE keyword_id = $1 ORDER BY picture_id",
            &[&keyword_id],
        )
        .unwrap();
    let linked: Vec<i64> = links.iter().map(|row| row.get(0)).collect();
    assert_eq!(linked, vec![first.min(second), first.max(second)]);
}

#[test]
fn successful_store_writes_picture_and_satellites() {
    if !pg_enabled() {
        return;
    }
    let config = Config::from_env();
    let store = open_store(&config);

    let suffix = unique_suffix();
    let file_name = format!("commit-{suffix}.jpg");
    let tag = format!("commit-tag-{suffix}");

    let picture_id = store
        .store(&payload(&file_name, &tag), || Ok(()))
        .unwrap();

    let mut client = raw_client(&config);
    let picture = client
        .query_one("SELECT upload_user, file_size FROM pictures WHERE id = $1", &[&picture_id])
        .unwrap();
    assert_eq!(picture.get::<_, String>(0), "alice");
    assert_eq!(picture.get::<_, i64>(1), 42);

    let location = client
        .query_one(
            "SELECT city FROM meta_location WHERE ref_picture = $1",
            &[&picture_id],
        )
        .unwrap();
    assert_eq!(location.get::<_, String>(0), "Lisbon");
}
