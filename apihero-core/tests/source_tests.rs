// Tests for record sources

use apihero_core::{
    CaptureDb, CapturedRequest, JsonFileSource, RecordSource, SiteIndex, SkipReason, SourceEntry,
    SourceError, SqliteSource, open_source,
};
use rusqlite::Connection;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

/// Decoded requests, failing the test on any invalid entry
fn requests(entries: Vec<SourceEntry>) -> Vec<CapturedRequest> {
    entries
        .into_iter()
        .map(|entry| match entry {
            SourceEntry::Request(request) => request,
            SourceEntry::Invalid { raw, detail } => panic!("invalid entry {}: {}", raw, detail),
        })
        .collect()
}

// ============================================================================
// JSON Source Tests
// ============================================================================

#[test]
fn test_json_array_source() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    write!(
        temp_file,
        r#"[
            {{"url": "https://h/a", "method": "POST", "has_body": true}},
            {{"url": "https://h/b"}}
        ]"#
    )?;

    let requests = requests(JsonFileSource::new(temp_file.path()).fetch()?);

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], CapturedRequest::new("https://h/a", "POST", true));
    assert_eq!(requests[1], CapturedRequest::new("https://h/b", "GET", false));
    Ok(())
}

#[test]
fn test_json_lines_source() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{"url": "https://h/1", "has_body": true}}"#)?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, r#"{{"url": "https://h/2", "method": "PUT"}}"#)?;

    let requests = requests(JsonFileSource::new(temp_file.path()).fetch()?);

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "https://h/1");
    assert!(requests[0].has_body);
    assert_eq!(requests[1].method, "PUT");
    Ok(())
}

#[test]
fn test_json_source_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let source = JsonFileSource::new(temp_dir.path().join("missing.json"));
    let result = source.fetch();
    assert!(matches!(result, Err(SourceError::Unavailable(_))));
}

#[test]
fn test_json_source_malformed_array() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, r#"[{{"url": "https://h/a"}}"#).unwrap();

    let result = JsonFileSource::new(temp_file.path()).fetch();
    assert!(matches!(result, Err(SourceError::Json(_))));
}

#[test]
fn test_json_lines_bad_line_is_kept_in_position() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{"url": "https://h/users/1", "has_body": true}}"#)?;
    writeln!(temp_file, r#"{{"url": 42}}"#)?;
    writeln!(temp_file, "not json at all")?;
    writeln!(temp_file, r#"{{"url": "https://h/users/2", "has_body": true}}"#)?;

    let entries = JsonFileSource::new(temp_file.path()).fetch()?;

    assert_eq!(entries.len(), 4);
    assert!(matches!(&entries[1], SourceEntry::Invalid { raw, .. } if raw == r#"{"url": 42}"#));
    assert!(matches!(&entries[2], SourceEntry::Invalid { .. }));

    let (index, report) = SiteIndex::build(entries);
    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped_count(), 2);
    assert_eq!(report.skipped[0].id.0, 1);
    assert_eq!(report.skipped[0].reason, SkipReason::InvalidEntry);
    assert_eq!(index.query_str(&["https://h/users"]).len(), 2);
    Ok(())
}

#[test]
fn test_json_array_bad_element() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    write!(
        temp_file,
        r#"[{{"url": "https://h/a"}}, {{"url": ["nope"]}}, {{"url": "https://h/b"}}]"#
    )?;

    let entries = JsonFileSource::new(temp_file.path()).fetch()?;
    assert_eq!(entries.len(), 3);

    let (_, report) = SiteIndex::build(entries);
    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped[0].id.0, 1);
    assert_eq!(report.skipped[0].reason, SkipReason::InvalidEntry);
    Ok(())
}

// ============================================================================
// SQLite Source Tests
// ============================================================================

#[test]
fn test_sqlite_source_reads_in_insert_order() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("capture.db");

    {
        let db = CaptureDb::new(&db_path).unwrap();
        db.log_request("GET", "https://h/users/5", None, Some(""), Some(200))
            .unwrap();
        db.log_request("POST", "https://h/users", Some("{}"), None, None)
            .unwrap();
        assert_eq!(db.request_count().unwrap(), 2);
    }

    let requests = requests(SqliteSource::new(&db_path).fetch().unwrap());

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], CapturedRequest::new("https://h/users/5", "GET", true));
    assert_eq!(requests[1], CapturedRequest::new("https://h/users", "POST", false));
}

#[test]
fn test_sqlite_source_missing_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("missing.db");

    let result = SqliteSource::new(&db_path).fetch();

    assert!(matches!(result, Err(SourceError::Unavailable(_))));
    assert!(!CaptureDb::exists(&db_path));
}

#[test]
fn test_sqlite_source_without_table() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("empty.db");
    create_empty_file(&db_path);

    let result = SqliteSource::new(&db_path).fetch();
    assert!(matches!(result, Err(SourceError::Database(_))));
}

#[test]
fn test_sqlite_source_bad_row() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("capture.db");

    {
        let db = CaptureDb::new(&db_path).unwrap();
        db.log_request("GET", "https://h/users/5", None, Some("x"), None)
            .unwrap();
    }
    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO http_transactions (request_method, request_url, timestamp)
             VALUES ('GET', X'FFFE', 0)",
            [],
        )
        .unwrap();
    }

    let entries = SqliteSource::new(&db_path).fetch().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(matches!(&entries[1], SourceEntry::Invalid { raw, .. } if raw.contains("row 2")));

    let (index, report) = SiteIndex::build(entries);
    assert_eq!(index.records().len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::InvalidEntry);
}

fn create_empty_file(path: &std::path::Path) {
    // A zero-length file is a valid, empty SQLite database
    std::fs::File::create(path).unwrap();
}

// ============================================================================
// Source Selection Tests
// ============================================================================

#[test]
fn test_open_source_by_extension() {
    let temp_dir = TempDir::new().unwrap();

    let db_path = temp_dir.path().join("capture.sqlite");
    CaptureDb::new(&db_path)
        .unwrap()
        .log_request("GET", "https://h/a", None, None, None)
        .unwrap();
    assert_eq!(open_source(&db_path).fetch().unwrap().len(), 1);

    let json_path = temp_dir.path().join("capture.json");
    std::fs::write(&json_path, r#"[{"url": "https://h/a"}, {"url": "https://h/b"}]"#).unwrap();
    assert_eq!(open_source(&json_path).fetch().unwrap().len(), 2);
}

#[test]
fn test_memory_source() {
    let source = vec![CapturedRequest::new("https://h/a", "GET", true)];
    assert_eq!(source.name(), "memory");
    assert_eq!(requests(source.fetch().unwrap()), source);
}
