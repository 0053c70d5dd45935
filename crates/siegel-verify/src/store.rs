// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent fingerprint record store backed by SQLite.
//
// Every publication of a document appends a record; nothing is ever
// overwritten.  The newest non-revoked record for a name is the current
// fingerprint, older ones are superseded but still authentic, and revoked
// records never vouch for anything.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{debug, info, instrument};

use siegel_core::error::{Result, SiegelError};
use siegel_core::types::Fingerprint;

/// SQLite schema for the record store.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS hash_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_name TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        revoked INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_hash_records_name ON hash_records(document_name);
"#;

/// One recorded publication of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashRecord {
    pub id: i64,
    pub document_name: String,
    pub fingerprint: Fingerprint,
    pub recorded_at: DateTime<Utc>,
    pub revoked: bool,
}

/// Append-only fingerprint store backed by a SQLite database.
///
/// All methods are synchronous because `rusqlite` does not support async
/// natively.  In an async context, wrap calls in `tokio::task::spawn_blocking`
/// or hold the store behind a mutex.
pub struct HashStore {
    /// The open SQLite connection.
    conn: Connection,
}

impl HashStore {
    /// Open (or create) the record store database at the given path.
    ///
    /// Applies WAL journal mode and creates the `hash_records` table if it
    /// does not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| SiegelError::Database(format!("open: {e}")))?;

        // WAL mode is better for concurrent readers (check service + CLI
        // administration on the same database) and survives unclean
        // shutdowns more gracefully.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| SiegelError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| SiegelError::Database(format!("create table: {e}")))?;

        info!("record store database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SiegelError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| SiegelError::Database(format!("create table: {e}")))?;

        debug!("in-memory record store database opened");
        Ok(Self { conn })
    }

    /// Append a new record for `name`, making `fingerprint` its current
    /// value. Earlier records for the same name become superseded.
    #[instrument(skip(self, fingerprint), fields(name = %name))]
    pub fn record(&self, name: &str, fingerprint: &Fingerprint) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO hash_records (document_name, fingerprint, recorded_at, revoked)
                 VALUES (?1, ?2, ?3, 0)",
                params![name, fingerprint.as_str(), Utc::now().to_rfc3339()],
            )
            .map_err(|e| SiegelError::Database(format!("insert record: {e}")))?;

        info!(name = %name, "hash record inserted");
        Ok(())
    }

    /// Revoke records for `name`: the one matching `fingerprint`, or every
    /// record of the name when no fingerprint is given.
    ///
    /// Returns the number of records newly revoked (idempotent: already
    /// revoked records do not count again).
    #[instrument(skip(self, fingerprint), fields(name = %name))]
    pub fn revoke(&self, name: &str, fingerprint: Option<&Fingerprint>) -> Result<usize> {
        let revoked = match fingerprint {
            Some(fingerprint) => self
                .conn
                .execute(
                    "UPDATE hash_records SET revoked = 1
                     WHERE document_name = ?1 AND fingerprint = ?2 AND revoked = 0",
                    params![name, fingerprint.as_str()],
                )
                .map_err(|e| SiegelError::Database(format!("revoke record: {e}")))?,
            None => self
                .conn
                .execute(
                    "UPDATE hash_records SET revoked = 1
                     WHERE document_name = ?1 AND revoked = 0",
                    params![name],
                )
                .map_err(|e| SiegelError::Database(format!("revoke records: {e}")))?,
        };

        info!(name = %name, count = revoked, "records revoked");
        Ok(revoked)
    }

    /// All records for `name`, newest first, revoked ones included.
    #[instrument(skip(self), fields(name = %name))]
    pub fn history(&self, name: &str) -> Result<Vec<HashRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, document_name, fingerprint, recorded_at, revoked
                 FROM hash_records WHERE document_name = ?1 ORDER BY id DESC",
            )
            .map_err(|e| SiegelError::Database(format!("prepare history: {e}")))?;

        let records = stmt
            .query_map(params![name], row_to_record)
            .map_err(|e| SiegelError::Database(format!("query history: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SiegelError::Database(format!("collect rows: {e}")))?;

        debug!(count = records.len(), "retrieved record history");
        Ok(records)
    }

    /// Non-revoked fingerprints for `name`, newest first. The first entry,
    /// when present, is the current fingerprint.
    pub fn active_fingerprints(&self, name: &str) -> Result<Vec<Fingerprint>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT fingerprint FROM hash_records
                 WHERE document_name = ?1 AND revoked = 0 ORDER BY id DESC",
            )
            .map_err(|e| SiegelError::Database(format!("prepare active: {e}")))?;

        let fingerprints = stmt
            .query_map(params![name], |row| {
                let hex: String = row.get(0)?;
                Fingerprint::from_hex(&hex).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .map_err(|e| SiegelError::Database(format!("query active: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SiegelError::Database(format!("collect rows: {e}")))?;

        Ok(fingerprints)
    }

    /// Whether any record (revoked or not) exists for `name`.
    pub fn has_records(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM hash_records WHERE document_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| SiegelError::Database(format!("count records: {e}")))?;
        Ok(count > 0)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a SQLite row to a `HashRecord`.
///
/// Column indices must match the SELECT order used in `history`.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<HashRecord> {
    let id: i64 = row.get(0)?;
    let document_name: String = row.get(1)?;
    let fingerprint_hex: String = row.get(2)?;
    let recorded_at_str: String = row.get(3)?;
    let revoked: bool = row.get::<_, i64>(4)? != 0;

    let fingerprint = Fingerprint::from_hex(&fingerprint_hex).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let recorded_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(HashRecord {
        id,
        document_name,
        fingerprint,
        recorded_at,
        revoked,
    })
}
