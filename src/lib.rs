//! Photo inbox ingestion worker.
//!
//! Watches an inbox directory for dropped image files, recovers ownership and a
//! clean display name from the filename, extracts metadata with an
//! EXIF → IPTC → XMP fallback cascade, mirrors each file into a photos tree and
//! records it as normalized rows in PostgreSQL. A small HTTP surface reports
//! progress and can stop the loop.

pub mod config;
pub mod dates;
pub mod db;
pub mod filename;
pub mod logging;
pub mod metadata;
pub mod planner;
pub mod server;
pub mod worker;
