use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::OutputConfig;
use crate::models::ListingRecord;
use crate::processor::ListingFlattener;

const BOM: char = '\u{feff}';

/// Writes collected listings to local CSV and JSON files.
///
/// Each file is written to a temporary sibling first and renamed over the
/// target, so a crash never leaves a half-written output behind.
pub struct FileStorage {
    csv_path: PathBuf,
    json_path: PathBuf,
    flattener: ListingFlattener,
}

impl FileStorage {
    pub fn new(csv_path: impl Into<PathBuf>, json_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            json_path: json_path.into(),
            flattener: ListingFlattener::new(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.csv_path, &config.json_path)
    }

    /// Stores the records in both formats, returning the written paths
    pub fn store_all(&self, records: &[ListingRecord]) -> Result<(PathBuf, PathBuf)> {
        let csv = self.store_csv(records)?;
        let json = self.store_json(records)?;
        Ok((csv, json))
    }

    /// UTF-8 CSV with a byte order mark, one column per label
    pub fn store_csv(&self, records: &[ListingRecord]) -> Result<PathBuf> {
        let mut df = self.flattener.flatten_to_dataframe(records)?;

        write_atomically(&self.csv_path, |writer| {
            CsvWriter::new(writer)
                .include_bom(true)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| anyhow!("Failed to write CSV: {}", e))
        })?;

        info!("Stored {} listings as CSV: {}", df.height(), self.csv_path.display());
        Ok(self.csv_path.clone())
    }

    /// Pretty-printed JSON array of flat record objects
    pub fn store_json(&self, records: &[ListingRecord]) -> Result<PathBuf> {
        write_atomically(&self.json_path, |writer| {
            serde_json::to_writer_pretty(writer, records).context("Failed to serialize listings")
        })?;

        info!("Stored {} listings as JSON: {}", records.len(), self.json_path.display());
        Ok(self.json_path.clone())
    }

    /// Reads a listings CSV back into a DataFrame
    pub fn load_csv(path: &str) -> Result<DataFrame> {
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to open dataset: {}", path))?
            .finish()
            .with_context(|| format!("Failed to parse dataset: {}", path))?;

        strip_bom_from_header(&mut df)?;

        info!("Loaded {} rows and {} columns from {}", df.height(), df.width(), path);
        Ok(df)
    }
}

fn strip_bom_from_header(df: &mut DataFrame) -> Result<()> {
    let first = df
        .get_column_names()
        .first()
        .map(|name| name.to_string());

    if let Some(name) = first {
        if let Some(stripped) = name.strip_prefix(BOM) {
            warn!("Removing byte order mark from column '{}'", stripped);
            df.rename(&name, stripped.into())?;
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}

fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = temp_path(path);
    let result = (|| -> Result<()> {
        let file = File::create(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush {}: {}", tmp.display(), e))?
            .sync_all()?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move output into place: {}", path.display()))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{District, PropertyMap};

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("unegui-storage-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn records() -> Vec<ListingRecord> {
        vec![
            ListingRecord {
                properties: [("Талбай", "80 м2"), ("Гараж", "Байгаа")].into_iter().collect::<PropertyMap>(),
                price_text: "250,000,000₮".to_string(),
                price_numeric: Some(250_000_000.0),
                area_numeric: Some(80.0),
                address_text: Some("Баянгол, 3-р хороо".to_string()),
                district: Some(District::Bayangol),
                url: "https://www.unegui.mn/adv/1/".to_string(),
            },
            ListingRecord {
                properties: [("Талбай", "тодорхойгүй")].into_iter().collect::<PropertyMap>(),
                price_text: String::new(),
                price_numeric: None,
                area_numeric: None,
                address_text: None,
                district: None,
                url: "https://www.unegui.mn/adv/2/".to_string(),
            },
        ]
    }

    #[test]
    fn test_csv_has_bom_and_reads_back() {
        let dir = scratch_dir();
        let storage = FileStorage::new(dir.join("out.csv"), dir.join("out.json"));

        let path = storage.store_csv(&records()).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

        let df = FileStorage::load_csv(path.to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 2);
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names[0], "Талбай");
        assert!(names.contains(&"url".to_string()));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_json_keeps_non_ascii() {
        let dir = scratch_dir();
        let storage = FileStorage::new(dir.join("out.csv"), dir.join("out.json"));

        let path = storage.store_json(&records()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"Талбай\": \"80 м2\""));

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert!(parsed[1]["price_numeric"].is_null());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = scratch_dir();
        let storage = FileStorage::new(dir.join("out.csv"), dir.join("out.json"));

        storage.store_all(&records()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_failed_write_keeps_previous_output() {
        let dir = scratch_dir();
        let target = dir.join("out.json");
        fs::write(&target, "previous").unwrap();

        let result = write_atomically(&target, |_| Err(anyhow!("boom")));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "previous");

        fs::remove_dir_all(dir).unwrap();
    }
}
