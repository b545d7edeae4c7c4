//! SQL schema for the traceability store.
//!
//! Table and column names follow the layout consumed by the reporting side.
//! [`SCHEMA`] runs on open and before every reset; it is idempotent thanks to
//! `IF NOT EXISTS`, so it never alters a table that already exists. Changes to
//! existing files go through migrations gated on `PRAGMA user_version`.

/// Version a file has after every migration below has run.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per scanned document that produced at least one match.
CREATE TABLE IF NOT EXISTS xml_metadata (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    xml_file_path TEXT NOT NULL UNIQUE,   -- absolute path
    xml_file_name TEXT NOT NULL,          -- bare file name
    physical_port TEXT,
    message_name  TEXT,
    dp_name       TEXT,
    full_name     TEXT,
    parse_time    TIMESTAMP NOT NULL      -- 'YYYY-MM-DD HH:MM:SS', local time
);

-- One row per (guid, document, node path, attribute) occurrence.
CREATE TABLE IF NOT EXISTS guid_xml_mapping (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    guid            TEXT NOT NULL,
    xml_file_path   TEXT NOT NULL,        -- xml_metadata.xml_file_path
    match_node_path TEXT NOT NULL,
    match_attribute TEXT NOT NULL
);

-- Record metadata, written the first time a GUID is matched.
CREATE TABLE IF NOT EXISTS excel_metadata (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    guid          TEXT NOT NULL UNIQUE,
    physical_port TEXT,
    message_name  TEXT,
    dp_name       TEXT,
    full_name     TEXT,
    source_row    INTEGER
);

CREATE INDEX IF NOT EXISTS idx_guid       ON guid_xml_mapping(guid);
CREATE INDEX IF NOT EXISTS idx_xml_path   ON guid_xml_mapping(xml_file_path);
CREATE INDEX IF NOT EXISTS idx_xml_name   ON xml_metadata(xml_file_name);
CREATE INDEX IF NOT EXISTS idx_excel_guid ON excel_metadata(guid);
";

/// Version 1: one mapping row per (guid, document, node path, attribute).
/// Files written before this constraint may hold duplicates; the earliest
/// row of each tuple is kept.
pub const UNIQUE_MATCHES: &str = "
DELETE FROM guid_xml_mapping
 WHERE id NOT IN (
   SELECT MIN(id) FROM guid_xml_mapping
    GROUP BY guid, xml_file_path, match_node_path, match_attribute
 );

CREATE UNIQUE INDEX IF NOT EXISTS idx_match_unique
    ON guid_xml_mapping(guid, xml_file_path, match_node_path, match_attribute);

PRAGMA user_version = 1;
";

/// Clears every table; the schema stays in place.
pub const RESET: &str = "
DELETE FROM guid_xml_mapping;
DELETE FROM xml_metadata;
DELETE FROM excel_metadata;
";
