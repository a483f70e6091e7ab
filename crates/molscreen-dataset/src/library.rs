//! Reference-library download, normalization, and cache.
//!
//! The screening candidates come from the Drug Repurposing Hub sample
//! annotations: a fixed tab-separated file with a 9-line preamble. The
//! loader normalizes the `smiles` column, drops rows that fail
//! normalization, deduplicates by normalized SMILES (first occurrence
//! wins), and writes the result as CSV next to the other pipeline
//! artifacts. The written file doubles as the cache: if it exists, the
//! loader never touches the network.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use molscreen_common::error::{MolscreenError, Result};
use molscreen_common::net::NetClient;
use molscreen_common::smiles;

/// Comment lines ahead of the header row in the upstream file.
pub const PREAMBLE_LINES: usize = 9;

const SMILES_COLUMN: &str = "smiles";

/// Outcome of an [`LibraryLoader::ensure`] call.
#[derive(Debug, Clone, Copy)]
pub struct LibrarySummary {
    /// Rows in the normalized library.
    pub rows: usize,
    pub dropped_invalid: usize,
    pub dropped_duplicate: usize,
    /// True when the local file already existed and no download happened.
    pub cached: bool,
}

/// Downloads and caches the reference compound library.
pub struct LibraryLoader {
    client: NetClient,
    url: String,
}

impl LibraryLoader {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: NetClient::new()?,
            url: url.into(),
        })
    }

    /// Ensure the normalized library CSV exists at `path`.
    ///
    /// Idempotent by file existence: a present file short-circuits with
    /// no network access, regardless of its age or content.
    pub async fn ensure(&self, path: &Path) -> Result<LibrarySummary> {
        if path.exists() {
            let rows = count_rows(path)?;
            debug!(path = %path.display(), rows, "Reference library found in cache");
            return Ok(LibrarySummary {
                rows,
                dropped_invalid: 0,
                dropped_duplicate: 0,
                cached: true,
            });
        }

        info!(url = %self.url, "Downloading reference library");
        let resp = self.client.get(&self.url)?.send().await?.error_for_status()?;
        let text = resp.text().await?;

        let table = parse_library(&text)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_library(&table, path)?;

        info!(
            path = %path.display(),
            rows = table.rows.len(),
            dropped_invalid = table.dropped_invalid,
            dropped_duplicate = table.dropped_duplicate,
            "Reference library written"
        );

        Ok(LibrarySummary {
            rows: table.rows.len(),
            dropped_invalid: table.dropped_invalid,
            dropped_duplicate: table.dropped_duplicate,
            cached: false,
        })
    }
}

/// Normalized library table; all columns besides `smiles` pass through.
#[derive(Debug)]
pub struct LibraryTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub dropped_invalid: usize,
    pub dropped_duplicate: usize,
}

/// Parse the raw upstream text: skip the preamble, read tab-separated
/// records, normalize SMILES, drop failures, deduplicate keeping the
/// first occurrence.
pub fn parse_library(text: &str) -> Result<LibraryTable> {
    let body = text
        .lines()
        .skip(PREAMBLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(body.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let smiles_idx = header
        .iter()
        .position(|c| c == SMILES_COLUMN)
        .ok_or_else(|| {
            MolscreenError::Pipeline(format!(
                "reference library has no '{}' column",
                SMILES_COLUMN
            ))
        })?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut dropped_invalid = 0;
    let mut dropped_duplicate = 0;

    for record in reader.records() {
        let record = record?;
        let mut fields: Vec<String> = record.iter().map(String::from).collect();

        let Some(normalized) = fields
            .get(smiles_idx)
            .and_then(|raw| smiles::normalize(raw))
        else {
            dropped_invalid += 1;
            continue;
        };

        if !seen.insert(normalized.clone()) {
            dropped_duplicate += 1;
            continue;
        }

        fields[smiles_idx] = normalized;
        rows.push(fields);
    }

    Ok(LibraryTable {
        header,
        rows,
        dropped_invalid,
        dropped_duplicate,
    })
}

fn write_library(table: &LibraryTable, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn count_rows(path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut n = 0;
    for record in reader.records() {
        record?;
        n += 1;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        let mut text = String::new();
        for i in 0..PREAMBLE_LINES {
            text.push_str(&format!("! preamble line {}\n", i));
        }
        text.push_str("broad_id\tpert_iname\tsmiles\n");
        text.push_str("BRD-1\taspirin\tCC(=O)OC1=CC=CC=C1C(=O)O\n");
        text.push_str("BRD-2\tbroken\tnot a smiles\n");
        text.push_str("BRD-3\tethanol\tCCO\n");
        text.push_str("BRD-4\tethanol again\tCCO\n");
        text
    }

    #[test]
    fn test_parse_skips_preamble_and_keeps_header() {
        let table = parse_library(&fixture()).unwrap();
        assert_eq!(table.header, vec!["broad_id", "pert_iname", "smiles"]);
    }

    #[test]
    fn test_parse_drops_invalid_and_duplicate_smiles() {
        let table = parse_library(&fixture()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.dropped_invalid, 1);
        assert_eq!(table.dropped_duplicate, 1);

        // First occurrence wins
        assert_eq!(table.rows[1][0], "BRD-3");
        assert_eq!(table.rows[1][2], "CCO");
    }

    #[test]
    fn test_parse_smiles_column_is_unique_and_non_empty() {
        let table = parse_library(&fixture()).unwrap();
        let mut seen = HashSet::new();
        for row in &table.rows {
            assert!(!row[2].is_empty());
            assert!(seen.insert(row[2].clone()));
        }
    }

    #[test]
    fn test_parse_requires_smiles_column() {
        let mut text = String::new();
        for _ in 0..PREAMBLE_LINES {
            text.push_str("!\n");
        }
        text.push_str("broad_id\tpert_iname\nBRD-1\taspirin\n");
        let err = parse_library(&text).unwrap_err();
        assert!(matches!(err, MolscreenError::Pipeline(_)));
    }

    #[tokio::test]
    async fn test_ensure_short_circuits_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.csv");
        std::fs::write(&path, "broad_id,smiles\nBRD-1,CCO\n").unwrap();

        // URL is never fetched: the loader must return before any
        // network access when the file exists.
        let loader = LibraryLoader::new("https://s3.amazonaws.com/does-not-exist").unwrap();
        let summary = loader.ensure(&path).await.unwrap();

        assert!(summary.cached);
        assert_eq!(summary.rows, 1);
        let unchanged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(unchanged, "broad_id,smiles\nBRD-1,CCO\n");
    }
}
