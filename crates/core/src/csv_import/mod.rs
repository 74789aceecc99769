//! CSV lead import.
//!
//! Sweeps an import directory for CSV files, turns valid rows into
//! `Pending` leads, and renames processed files out of the way so a sweep
//! never sees the same file twice.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::lead::{BatchInsertReport, LeadError, LeadStore, NewLead};

/// Columns a CSV file must carry. Everything else is optional.
pub const REQUIRED_COLUMNS: [&str; 4] = ["first_name", "last_name", "phone", "email"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Parse(String),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error(transparent)]
    Store(#[from] LeadError),
}

/// Result of importing a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub imported: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one directory sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub files_processed: usize,
    pub files_failed: usize,
    pub leads_imported: usize,
    pub rows_skipped: usize,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    first_name: String,
    last_name: String,
    phone: String,
    email: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    zip_code: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl CsvRow {
    /// A row is only usable if every required field is non-blank.
    fn into_new_lead(self) -> Option<NewLead> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let phone = self.phone.trim().to_string();
        let email = self.email.trim().to_string();

        if first_name.is_empty() || last_name.is_empty() || phone.is_empty() || email.is_empty() {
            return None;
        }

        Some(NewLead {
            first_name,
            last_name,
            phone,
            email,
            address: blank_to_none(self.address),
            city: blank_to_none(self.city),
            state: blank_to_none(self.state),
            zip_code: blank_to_none(self.zip_code),
            notes: blank_to_none(self.notes),
        })
    }
}

/// Imports lead CSV files from a directory into the store.
pub struct CsvImporter {
    store: Arc<dyn LeadStore>,
    directory: PathBuf,
}

impl CsvImporter {
    pub fn new(store: Arc<dyn LeadStore>, config: &ImportConfig) -> Self {
        Self {
            store,
            directory: config.directory.clone(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Import every `.csv` file currently in the import directory.
    ///
    /// Files that import cleanly are renamed into `processed/`; files that
    /// fail stay put and are reported with their error.
    pub fn process_new_files(&self) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)?;
            return Ok(report);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        paths.sort();

        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match self.import_file(&path) {
                Ok(batch) => {
                    if let Err(e) = self.archive_file(&path) {
                        warn!(file = %file_name, error = %e, "Failed to archive imported file");
                    }
                    info!(
                        file = %file_name,
                        imported = batch.inserted,
                        skipped = batch.failed,
                        "Imported CSV file"
                    );
                    report.files_processed += 1;
                    report.leads_imported += batch.inserted;
                    report.rows_skipped += batch.failed;
                    report.files.push(FileReport {
                        file_name,
                        imported: batch.inserted,
                        skipped: batch.failed,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Failed to import CSV file");
                    report.files_failed += 1;
                    report.files.push(FileReport {
                        file_name,
                        imported: 0,
                        skipped: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Import a single CSV file. Rows with blank required fields are
    /// counted as failures, not errors.
    pub fn import_file(&self, path: &Path) -> Result<BatchInsertReport, ImportError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ImportError::Parse(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| ImportError::Parse(e.to_string()))?;
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h.trim() == **col))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing.join(", ")));
        }

        let mut new_leads = Vec::new();
        let mut skipped = 0;
        for row in reader.deserialize::<CsvRow>() {
            match row {
                Ok(row) => match row.into_new_lead() {
                    Some(lead) => new_leads.push(lead),
                    None => skipped += 1,
                },
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping unreadable CSV row");
                    skipped += 1;
                }
            }
        }

        let mut batch = self.store.create_batch(new_leads)?;
        batch.failed += skipped;
        Ok(batch)
    }

    /// Move a processed file into `processed/`, timestamped so repeated
    /// file names never collide.
    fn archive_file(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let processed_dir = self.directory.join("processed");
        fs::create_dir_all(&processed_dir)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "import".to_string());
        let target = processed_dir.join(format!(
            "{}_{}.csv",
            stem,
            Utc::now().format("%Y%m%d%H%M%S")
        ));

        fs::rename(path, &target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{LeadFilter, LeadStatus, SqliteLeadStore};
    use std::io::Write;

    fn setup() -> (Arc<SqliteLeadStore>, CsvImporter, tempfile::TempDir) {
        let store = Arc::new(SqliteLeadStore::in_memory().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let importer = CsvImporter::new(
            store.clone(),
            &ImportConfig {
                directory: dir.path().to_path_buf(),
            },
        );
        (store, importer, dir)
    }

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_import_file_creates_pending_leads() {
        let (store, importer, dir) = setup();
        let path = write_csv(
            dir.path(),
            "leads.csv",
            "first_name,last_name,phone,email,address,city,state,zip_code\n\
             John,Doe,555-123-4567,john@example.com,,,,\n\
             Jane,Smith,555-765-4321,jane@example.com,1 Main St,Springfield,IL,62704\n",
        );

        let batch = importer.import_file(&path).unwrap();
        assert_eq!(batch.inserted, 2);
        assert_eq!(batch.failed, 0);

        let leads = store
            .list(&LeadFilter::new().with_status(LeadStatus::Pending))
            .unwrap();
        assert_eq!(leads.len(), 2);

        let john = leads.iter().find(|l| l.first_name == "John").unwrap();
        assert!(john.address.is_none());
        let jane = leads.iter().find(|l| l.first_name == "Jane").unwrap();
        assert_eq!(jane.city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_import_file_skips_incomplete_rows() {
        let (_, importer, dir) = setup();
        let path = write_csv(
            dir.path(),
            "leads.csv",
            "first_name,last_name,phone,email\n\
             John,Doe,555-123-4567,john@example.com\n\
             ,Smith,555-765-4321,jane@example.com\n\
             Bob,Jones,,bob@example.com\n",
        );

        let batch = importer.import_file(&path).unwrap();
        assert_eq!(batch.inserted, 1);
        assert_eq!(batch.failed, 2);
    }

    #[test]
    fn test_import_file_rejects_missing_columns() {
        let (_, importer, dir) = setup();
        let path = write_csv(
            dir.path(),
            "leads.csv",
            "first_name,last_name\nJohn,Doe\n",
        );

        let result = importer.import_file(&path);
        match result {
            Err(ImportError::MissingColumns(cols)) => {
                assert!(cols.contains("phone"));
                assert!(cols.contains("email"));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_process_new_files_archives_and_reports() {
        let (store, importer, dir) = setup();
        write_csv(
            dir.path(),
            "batch1.csv",
            "first_name,last_name,phone,email\nJohn,Doe,555-0100,john@example.com\n",
        );
        write_csv(
            dir.path(),
            "batch2.csv",
            "first_name,last_name,phone,email\nJane,Smith,555-0101,jane@example.com\n",
        );

        let report = importer.process_new_files().unwrap();
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.leads_imported, 2);

        let leads = store.list(&LeadFilter::new()).unwrap();
        assert_eq!(leads.len(), 2);

        // Originals are gone; archives exist under processed/
        assert!(!dir.path().join("batch1.csv").exists());
        let processed: Vec<_> = fs::read_dir(dir.path().join("processed"))
            .unwrap()
            .collect();
        assert_eq!(processed.len(), 2);

        // A second sweep finds nothing new
        let report = importer.process_new_files().unwrap();
        assert_eq!(report.files_processed, 0);
        assert_eq!(report.leads_imported, 0);
    }

    #[test]
    fn test_process_new_files_reports_bad_file_and_keeps_it() {
        let (_, importer, dir) = setup();
        write_csv(dir.path(), "bad.csv", "first_name,last_name\nJohn,Doe\n");

        let report = importer.process_new_files().unwrap();
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_processed, 0);
        assert!(report.files[0].error.is_some());
        assert!(dir.path().join("bad.csv").exists());
    }

    #[test]
    fn test_process_new_files_creates_missing_directory() {
        let store = Arc::new(SqliteLeadStore::in_memory().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist-yet");
        let importer = CsvImporter::new(
            store,
            &ImportConfig {
                directory: missing.clone(),
            },
        );

        let report = importer.process_new_files().unwrap();
        assert_eq!(report.files_processed, 0);
        assert!(missing.exists());
    }
}
