//! Local review server
//!
//! Pages are assembled once at startup from the results tree. Images are
//! served by numeric id so the browser never needs `file://` access.
//! Review decisions are written to the ledger through a mutex, and each
//! page shows the ledger's current status for its key.

pub mod error;
pub mod routes;

pub use error::{ReviewError, ReviewResult};
pub use routes::configure;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::report::{collect_artifacts, Nav, ReportPage, ReviewWidget, Section};
use crate::types::{ArtifactSet, Phase, QcStatus, ScanKey};
use actix_web::{web, App, HttpServer};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Ledger key of a page: basename of its first available artifact
///
/// Falls back to `<sub>_<ses>_<run>` for an empty set.
pub fn ledger_key(key: &ScanKey, artifacts: &ArtifactSet) -> String {
    artifacts
        .first_available()
        .and_then(|(_, path)| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}_{}_{}", key.subject, key.session, key.run))
}

/// State shared by every request of one review session
#[derive(Debug)]
pub struct ReviewSession {
    phase: Phase,
    pages: Vec<ReportPage>,
    files: Vec<PathBuf>,
    ledger: Mutex<Ledger>,
}

impl ReviewSession {
    /// Scans `results_root` and prepares one page per scan key
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory or the ledger
    /// cannot be read
    pub fn build(results_root: &Path, phase: Phase, ledger_path: &Path) -> Result<Self> {
        let groups = collect_artifacts(results_root)?;
        let ledger = Ledger::load(ledger_path)?;

        let total = groups.len();
        let mut files = Vec::new();
        let mut pages = Vec::with_capacity(total);

        for (i, (key, artifacts)) in groups.into_iter().enumerate() {
            let nav = Nav {
                prev: i.checked_sub(1).map(|p| format!("/report/{}", p)),
                next: (i + 1 < total).then(|| format!("/report/{}", i + 1)),
            };
            let sections = Section::for_artifacts(&artifacts, |_, path| {
                files.push(path.to_path_buf());
                format!("/get_image/{}", files.len() - 1)
            });
            let filename = ledger_key(&key, &artifacts);

            pages.push(ReportPage {
                key,
                phase,
                nav,
                sections,
                review: ReviewWidget::Server {
                    filename,
                    status: QcStatus::Unknown,
                    notes: String::new(),
                },
            });
        }

        info!(
            "Found {} pages under {} ({} files)",
            pages.len(),
            results_root.display(),
            files.len()
        );

        Ok(Self {
            phase,
            pages,
            files,
            ledger: Mutex::new(ledger),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Renders page `id` with the ledger's current status and notes
    pub fn render_page(&self, id: usize) -> Option<String> {
        let mut page = self.pages.get(id)?.clone();
        if let ReviewWidget::Server {
            filename,
            status,
            notes,
        } = &mut page.review
        {
            let ledger = self.lock_ledger();
            if let Some(entry) = ledger.get(filename) {
                *status = entry.qc_status();
                *notes = entry.notes.clone();
            }
        }
        Some(page.to_string())
    }

    /// Path registered under file id `id`
    pub fn file(&self, id: usize) -> Option<&Path> {
        self.files.get(id).map(PathBuf::as_path)
    }

    /// Records a decision in the ledger
    pub fn record(&self, filename: &str, status: QcStatus, notes: &str) -> Result<()> {
        self.lock_ledger().upsert(filename, status, notes)
    }

    /// Ledger key of page `id`
    pub fn page_filename(&self, id: usize) -> Option<&str> {
        match &self.pages.get(id)?.review {
            ReviewWidget::Server { filename, .. } => Some(filename),
            ReviewWidget::LocalStorage { .. } => None,
        }
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        // Recover the ledger from a poisoned lock
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Serves a review session on `host:port` with a single worker
pub async fn serve(session: ReviewSession, host: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(session);
    info!("Open your browser at http://{}:{}", host, port);

    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .workers(1)
        .bind((host, port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;
    use std::fs;
    use tempfile::TempDir;

    pub(super) fn results_tree(root: &Path) {
        let anat = root.join("sub-1/anat");
        fs::create_dir_all(&anat).unwrap();
        fs::write(anat.join("sub-1_T1w_original_slices.png"), b"\x89PNG").unwrap();
        fs::write(anat.join("sub-1_T1w_density.svg"), b"<svg></svg>").unwrap();
        fs::write(
            anat.join("sub-1_T1w_stats.csv"),
            "mean,median,max,min,std\n1,2,3,4,5\n",
        )
        .unwrap();

        let anat = root.join("sub-2/anat");
        fs::create_dir_all(&anat).unwrap();
        fs::write(anat.join("sub-2_T1w_density.svg"), b"<svg></svg>").unwrap();
    }

    #[test]
    fn test_ledger_key_prefers_first_slot() {
        let key = ScanKey::new("sub-1", "ses-01", "");
        let mut artifacts = ArtifactSet::new();
        assert_eq!(ledger_key(&key, &artifacts), "sub-1_ses-01_");

        artifacts.set(ArtifactKind::Stats, PathBuf::from("/r/sub-1_T1w_stats.csv"));
        assert_eq!(ledger_key(&key, &artifacts), "sub-1_T1w_stats.csv");

        artifacts.set(
            ArtifactKind::OriginalSlices,
            PathBuf::from("/r/sub-1_T1w_original_slices.png"),
        );
        assert_eq!(ledger_key(&key, &artifacts), "sub-1_T1w_original_slices.png");
    }

    #[test]
    fn test_build_session() {
        let temp_dir = TempDir::new().unwrap();
        results_tree(temp_dir.path());
        let ledger = temp_dir.path().join("QC_data.csv");

        let session = ReviewSession::build(temp_dir.path(), Phase::Initial, &ledger).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.page_filename(0), Some("sub-1_T1w_original_slices.png"));
        assert_eq!(session.page_filename(1), Some("sub-2_T1w_density.svg"));

        // Original, density of sub-1, then density of sub-2
        assert!(session.file(0).unwrap().ends_with("sub-1_T1w_original_slices.png"));
        assert!(session.file(2).unwrap().ends_with("sub-2_T1w_density.svg"));
        assert!(session.file(3).is_none());

        let page = session.render_page(0).unwrap();
        assert!(page.contains("src=\"/get_image/0\""));
        assert!(page.contains("<a href=\"/report/1\">Next</a>"));
        assert!(session.render_page(2).is_none());
    }

    #[test]
    fn test_render_reflects_ledger() {
        let temp_dir = TempDir::new().unwrap();
        results_tree(temp_dir.path());
        let ledger = temp_dir.path().join("QC_data.csv");
        fs::write(&ledger, "filename,status,notes\nsub-2_T1w_density.svg,UNCLEAR,blurry\n").unwrap();

        let session = ReviewSession::build(temp_dir.path(), Phase::Final, &ledger).unwrap();
        let page = session.render_page(1).unwrap();
        assert!(page.contains("Status: UNCLEAR</span>"));
        assert!(page.contains("value=\"blurry\""));

        session
            .record("sub-2_T1w_density.svg", QcStatus::Good, "")
            .unwrap();
        assert!(session.render_page(1).unwrap().contains("Status: GOOD</span>"));
    }
}
