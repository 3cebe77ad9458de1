// Endpoint export: selected records grouped by host and top-level folder,
// with identifier segments folded so equivalent endpoints line up.

use crate::error::ExportError;
use crate::model::RawRecord;
use crate::normalize::{authority, normalize, top_segment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: &str = "Host,Top-Level Folder,Method,Endpoint";

/// Default file name offered for CSV exports
pub const DEFAULT_EXPORT_FILE: &str = "apihero_export.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRow {
    pub host: String,
    pub top_segment: String,
    pub method: String,
    pub endpoint: String,
}

/// Export formats understood by `EndpointExport::save`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

type Folders = BTreeMap<String, Vec<(String, String)>>;

/// `host -> top-level folder -> (method, endpoint)` rows.
///
/// Rows are not deduplicated: two captured requests that normalize to the
/// same endpoint produce two rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointExport {
    grouped: BTreeMap<String, Folders>,
}

impl EndpointExport {
    /// Group the body-bearing records; the rest are dropped.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let mut grouped: BTreeMap<String, Folders> = BTreeMap::new();

        for record in records.into_iter().filter(|record| record.has_body) {
            let host = authority(&record.url).unwrap_or(record.host.as_str());
            let endpoint = normalize(&record.path);
            let folder = top_segment(&endpoint).to_string();
            let method = match record.method.trim() {
                "" => "GET".to_string(),
                method => method.to_string(),
            };

            grouped
                .entry(host.to_string())
                .or_default()
                .entry(folder)
                .or_default()
                .push((method, endpoint));
        }

        Self { grouped }
    }

    pub fn len(&self) -> usize {
        self.grouped
            .values()
            .flat_map(|folders| folders.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grouped.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.grouped.keys().map(String::as_str)
    }

    /// Rows ordered by host, then folder, then the order records were seen
    pub fn rows(&self) -> impl Iterator<Item = EndpointRow> + '_ {
        self.grouped.iter().flat_map(|(host, folders)| {
            folders.iter().flat_map(move |(folder, endpoints)| {
                endpoints.iter().map(move |(method, endpoint)| EndpointRow {
                    host: host.clone(),
                    top_segment: folder.clone(),
                    method: method.clone(),
                    endpoint: endpoint.clone(),
                })
            })
        })
    }

    /// CSV with every field quoted. Quotes inside values are written as-is.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", CSV_HEADER)?;
        for row in self.rows() {
            writeln!(
                writer,
                "\"{}\",\"{}\",\"{}\",\"{}\"",
                row.host, row.top_segment, row.method, row.endpoint
            )?;
        }
        Ok(())
    }

    pub fn to_csv(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Human readable summary of the grouped endpoints
    pub fn preview(&self) -> String {
        let mut lines = Vec::new();

        for (host, folders) in &self.grouped {
            lines.push(format!("Host: {}", host));
            for (folder, endpoints) in folders {
                lines.push(format!("  Folder: {} ({} endpoints)", folder, endpoints.len()));
                for (method, endpoint) in endpoints {
                    lines.push(format!("    {}  {}", method, endpoint));
                }
            }
        }

        format!("Endpoints Loaded: {}\n\n{}", self.len(), lines.join("\n"))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let rows: Vec<EndpointRow> = self.rows().collect();
        let document = serde_json::json!({
            "export": {
                "metadata": {
                    "generator": "APIHero",
                    "version": env!("CARGO_PKG_VERSION"),
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "format": "json"
                },
                "summary": {
                    "hosts": self.grouped.len(),
                    "endpoints": rows.len()
                },
                "endpoints": rows
            }
        });

        serde_json::to_string_pretty(&document)
    }

    pub fn save(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let mut file = BufWriter::new(File::create(path)?);
        match format {
            ExportFormat::Csv => self.write_csv(&mut file)?,
            ExportFormat::Json => file.write_all(self.to_json()?.as_bytes())?,
        }
        file.flush()?;
        Ok(())
    }
}
