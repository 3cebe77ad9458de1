// Record sources: the one-shot snapshot pull that feeds an index build

use crate::error::{Result, SourceError};
use crate::model::{CapturedRequest, SourceEntry};
use rusqlite::{Connection, OpenFlags, params};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Anything that can hand over a snapshot of captured requests.
///
/// `fetch` is called once per build. An error means the whole source is
/// unavailable; an entry that cannot be decoded comes back as
/// `SourceEntry::Invalid` in its position and the index skips it.
pub trait RecordSource: Send + Sync {
    fn name(&self) -> String;
    fn fetch(&self) -> Result<Vec<SourceEntry>>;
}

impl RecordSource for Vec<CapturedRequest> {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn fetch(&self) -> Result<Vec<SourceEntry>> {
        Ok(self.iter().cloned().map(SourceEntry::from).collect())
    }
}

/// Open the right source for a file: SQLite capture databases by extension,
/// JSON for everything else
pub fn open_source(path: &Path) -> Box<dyn RecordSource> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("db" | "sqlite" | "sqlite3") => Box::new(SqliteSource::new(path)),
        _ => Box::new(JsonFileSource::new(path)),
    }
}

/// Captured requests stored as a JSON array or as JSON lines
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<SourceEntry>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            SourceError::Unavailable(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        // Only a document that is not an array at all makes the file unusable
        if content.trim_start().starts_with('[') {
            let values: Vec<Value> = serde_json::from_str(&content)?;
            return Ok(values
                .into_iter()
                .map(|value| {
                    let raw = value.to_string();
                    decode_json(serde_json::from_value(value), raw)
                })
                .collect());
        }

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| decode_json(serde_json::from_str(line), line.to_string()))
            .collect())
    }
}

fn decode_json(parsed: serde_json::Result<CapturedRequest>, raw: String) -> SourceEntry {
    match parsed {
        Ok(request) => SourceEntry::Request(request),
        Err(e) => SourceEntry::Invalid {
            raw,
            detail: e.to_string(),
        },
    }
}

/// Requests logged into a capture database's `http_transactions` table
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for SqliteSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<SourceEntry>> {
        // Opening a missing file would silently create an empty database
        if !self.path.exists() {
            return Err(SourceError::Unavailable(format!(
                "Capture database not found: {}",
                self.path.display()
            )));
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare(
            "SELECT id, request_method, request_url, request_body IS NOT NULL
             FROM http_transactions
             ORDER BY id",
        )?;

        let entries = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let has_body: bool = row.get(3)?;
                let method = row.get_ref(1)?.as_str().map(str::to_string);
                let url = row.get_ref(2)?.as_str().map(str::to_string);

                Ok(match (method, url) {
                    (Ok(method), Ok(url)) => SourceEntry::Request(CapturedRequest {
                        url,
                        method,
                        has_body,
                    }),
                    (Err(e), _) | (_, Err(e)) => SourceEntry::Invalid {
                        raw: format!("http_transactions row {}", id),
                        detail: e.to_string(),
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Loaded {} requests from {}", entries.len(), self.path.display());
        Ok(entries)
    }
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Writer side of the capture database, used to seed a `SqliteSource`
pub struct CaptureDb {
    conn: Connection,
}

impl CaptureDb {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = CaptureDb { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS http_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,

                -- Request
                request_method TEXT NOT NULL,
                request_url TEXT NOT NULL,
                request_headers TEXT,
                request_body TEXT,

                -- Response
                response_code INTEGER,

                -- Metadata
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_http_transactions_timestamp ON http_transactions(timestamp);
            ",
        )?;
        Ok(())
    }

    pub fn log_request(
        &self,
        method: &str,
        url: &str,
        request_headers: Option<&str>,
        request_body: Option<&str>,
        response_code: Option<u16>,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO http_transactions (
                request_method, request_url, request_headers, request_body,
                response_code, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                method,
                url,
                request_headers,
                request_body,
                response_code.map(|c| c as i64),
                current_timestamp(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn request_count(&self) -> rusqlite::Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM http_transactions", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|count| count as usize)
    }
}
