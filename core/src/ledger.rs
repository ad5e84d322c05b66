//! Review ledger: the CSV of reviewer decisions
//!
//! One row per filename key with columns `filename,status,notes`. The file
//! is rewritten in full on every update.

use crate::error::Result;
use crate::types::QcStatus;
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One reviewer decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub filename: String,
    pub status: String,
    pub notes: String,
}

impl LedgerEntry {
    /// Parsed status; unrecognized values read as UNKNOWN
    pub fn qc_status(&self) -> QcStatus {
        QcStatus::parse(&self.status).unwrap_or_default()
    }
}

/// Review ledger backed by a CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Creates an empty ledger that will be written to `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Loads the ledger at `path`, or starts an empty one if it does not exist
    ///
    /// Rows keep their file order. When a filename appears more than once,
    /// the later row wins. Columns are matched by header name; fields a
    /// short row lacks read as empty, and rows without a filename are skipped.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let mut ledger = Self::new(path);
        if !ledger.path.exists() {
            debug!("No ledger at {}, starting empty", ledger.path.display());
            return Ok(ledger);
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&ledger.path)?;
        let headers = reader.headers()?.clone();
        let column = |name: &str, fallback: usize| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .unwrap_or(fallback)
        };
        let (filename_col, status_col, notes_col) =
            (column("filename", 0), column("status", 1), column("notes", 2));

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let field = |col: usize| record.get(col).unwrap_or("").to_string();
            let entry = LedgerEntry {
                filename: field(filename_col),
                status: field(status_col),
                notes: field(notes_col),
            };
            if entry.filename.is_empty() {
                warn!(
                    "{}: skipping row {} without a filename",
                    ledger.path.display(),
                    i + 2
                );
                continue;
            }
            ledger.insert(entry);
        }
        Ok(ledger)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the entry for `filename`
    pub fn get(&self, filename: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    /// Entries in file order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Sets the status and notes of `filename` and rewrites the file
    ///
    /// Creates the entry when absent; otherwise both fields are replaced.
    /// The in-memory ledger is left untouched when the write fails.
    pub fn upsert(&mut self, filename: &str, status: QcStatus, notes: &str) -> Result<()> {
        let mut updated = self.clone();
        updated.insert(LedgerEntry {
            filename: filename.to_string(),
            status: status.to_string(),
            notes: notes.to_string(),
        });
        updated.save()?;
        *self = updated;
        Ok(())
    }

    /// Writes every entry to the backing file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        if self.entries.is_empty() {
            writer.write_record(["filename", "status", "notes"])?;
        }
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn insert(&mut self, entry: LedgerEntry) {
        match self.entries.iter_mut().find(|e| e.filename == entry.filename) {
            Some(existing) => {
                if existing.status != entry.status {
                    debug!(
                        "{}: {} -> {}",
                        entry.filename, existing.status, entry.status
                    );
                }
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }
}
