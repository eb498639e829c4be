pub const POSTGRES_SCHEMA: &str = r#"
-- PostgreSQL schema for photoinbox

CREATE TABLE IF NOT EXISTS pictures (
    id BIGSERIAL PRIMARY KEY,
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    full_path TEXT NOT NULL,
    file_size BIGINT NOT NULL,
    width INTEGER NOT NULL DEFAULT 0,
    height INTEGER NOT NULL DEFAULT 0,
    file_datetime TIMESTAMP NOT NULL,
    upload_user TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pictures_file_datetime ON pictures(file_datetime);
CREATE INDEX IF NOT EXISTS idx_pictures_upload_user ON pictures(upload_user);

CREATE TABLE IF NOT EXISTS meta_location (
    ref_picture BIGINT PRIMARY KEY REFERENCES pictures(id) ON DELETE CASCADE,
    country TEXT,
    country_code TEXT,
    province TEXT,
    city TEXT
);

CREATE TABLE IF NOT EXISTS meta_exif (
    ref_picture BIGINT PRIMARY KEY REFERENCES pictures(id) ON DELETE CASCADE,
    make TEXT,
    model TEXT,
    iso TEXT,
    aperture TEXT,
    exposure_time TEXT,
    gps_latitude DOUBLE PRECISION,
    gps_longitude DOUBLE PRECISION,
    datetime_original TIMESTAMP
);

CREATE TABLE IF NOT EXISTS meta_iptc (
    ref_picture BIGINT PRIMARY KEY REFERENCES pictures(id) ON DELETE CASCADE,
    object_name TEXT,
    caption TEXT,
    copyright TEXT
);

CREATE TABLE IF NOT EXISTS keywords (
    id BIGSERIAL PRIMARY KEY,
    tag TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS picture_keywords (
    picture_id BIGINT NOT NULL REFERENCES pictures(id) ON DELETE CASCADE,
    keyword_id BIGINT NOT NULL REFERENCES keywords(id) ON DELETE CASCADE,
    PRIMARY KEY (picture_id, keyword_id)
);

CREATE INDEX IF NOT EXISTS idx_picture_keywords_keyword ON picture_keywords(keyword_id);
"#;
