use super::{collect_scans, PipelineSummary, ScanOutcome, ScanOutputs};
use crate::error::Result;
use crate::skullstrip::{stripped_path_for, SkullStripper};
use crate::types::{ArtifactKind, Phase, QcConfig, ScanKey, DEFAULT_SESSION};
use crate::volume::{find_slices_of_interest, Volume};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct AcceptedRow {
    subject_id: String,
    #[serde(default)]
    session_id: String,
}

/// (subject, session) pairs cleared for the final pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedList {
    entries: HashSet<(String, String)>,
}

impl AcceptedList {
    /// Reads a CSV with `subject_id` and `session_id` columns
    ///
    /// Values are trimmed. An empty session means the default session.
    /// Extra columns are ignored.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut entries = HashSet::new();
        for row in reader.deserialize() {
            let row: AcceptedRow = row?;
            let session = if row.session_id.is_empty() {
                DEFAULT_SESSION.to_string()
            } else {
                row.session_id
            };
            entries.insert((row.subject_id, session));
        }
        Ok(Self { entries })
    }

    /// Adds a (subject, session) pair
    pub fn insert(&mut self, subject: impl Into<String>, session: impl Into<String>) {
        self.entries.insert((subject.into(), session.into()));
    }

    /// Returns whether the key's (subject, session) is accepted
    pub fn contains(&self, key: &ScanKey) -> bool {
        let (subject, session) = key.subject_session();
        self.entries
            .contains(&(subject.to_string(), session.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final QC of one volume
///
/// Reuses `<base>_skullstripped.nii.gz` next to the scan when present,
/// otherwise asks `stripper` to produce it; if that fails the scan is
/// skipped. Slices are chosen on the stripped volume and the same indices
/// are rendered for both volumes. Statistics and density describe the
/// original volume.
pub fn process_scan_final(
    root: &Path,
    scan: &Path,
    config: &QcConfig,
    stripper: &dyn SkullStripper,
) -> Result<ScanOutcome> {
    info!("[Final QC] Processing {}", scan.display());

    let stripped_path = stripped_path_for(scan);
    if stripped_path.exists() {
        info!("Found existing skull-stripped file: {}", stripped_path.display());
    } else if let Err(e) = stripper.strip(scan, &stripped_path) {
        warn!("No skull-stripped file for {}: {}", scan.display(), e);
        return Ok(ScanOutcome::Skipped(format!("skull stripping unavailable: {}", e)));
    }

    let stripped = Volume::open(&stripped_path)?;
    let indices = find_slices_of_interest(&stripped, config.num_slices);
    let original = Volume::open(scan)?;

    let mut outputs = ScanOutputs::create(root, scan, config)?;
    outputs.write_montage(ArtifactKind::StrippedSlices, &stripped, &indices, config)?;
    outputs.write_montage(ArtifactKind::OriginalSlices, &original, &indices, config)?;
    outputs.write_intensity_outputs(&original)?;

    info!("[Final QC] Finished processing {}", scan.display());
    Ok(ScanOutcome::Processed(outputs))
}

/// Runs the final pass over the accepted volumes under `root`
///
/// # Errors
///
/// Returns an error for an invalid configuration, an unreadable root, or
/// an unreadable accepted list
pub fn run_final(
    root: &Path,
    accepted: &AcceptedList,
    config: &QcConfig,
    stripper: &dyn SkullStripper,
) -> Result<PipelineSummary> {
    config.validate()?;
    info!(
        "[Final QC] Starting traversal of {} for scan type {} ({} accepted sessions)",
        root.display(),
        config.scan_type,
        accepted.len()
    );

    let mut summary = PipelineSummary::new(Phase::Final);
    for scan in collect_scans(root, config)? {
        let name = scan
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = match ScanKey::parse(&name) {
            Ok(key) if accepted.contains(&key) => {
                process_scan_final(root, &scan, config, stripper)
            }
            _ => {
                info!("Skipping {} (not in accepted list)", scan.display());
                Ok(ScanOutcome::Skipped("not in accepted list".to_string()))
            }
        };
        summary.record(&scan, outcome);
    }

    info!("[Final QC] Finished processing all files");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QcError;
    use crate::pipeline::test_support::write_volume;
    use ndarray::Array3;
    use nifti::writer::WriterOptions;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    /// Writes a volume with only the lower half of the slices kept
    struct FakeStripper {
        calls: Cell<usize>,
    }

    impl FakeStripper {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl SkullStripper for FakeStripper {
        fn strip(&self, input: &Path, output: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            let _ = Volume::open(input)?;
            let data = Array3::from_shape_fn((6, 5, 12), |(_, _, z)| if z < 4 { 1.0f32 } else { 0.0 });
            WriterOptions::new(output)
                .write_nifti(&data)
                .map_err(|e| QcError::SkullStrip(e.to_string()))
        }
    }

    struct FailingStripper;

    impl SkullStripper for FailingStripper {
        fn strip(&self, _input: &Path, _output: &Path) -> Result<()> {
            Err(QcError::SkullStrip("docker not available".into()))
        }
    }

    #[test]
    fn test_accepted_list_from_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("accepted.csv");
        fs::write(
            &path,
            "subject_id, session_id\nsub-001, ses-01\nsub-002,ses-02\nsub-003,\n",
        )
        .unwrap();

        let accepted = AcceptedList::from_csv(&path).unwrap();
        assert_eq!(accepted.len(), 3);
        assert!(accepted.contains(&ScanKey::parse("sub-001_T1w.nii").unwrap()));
        assert!(accepted.contains(&ScanKey::parse("sub-002_ses-02_T1w.nii").unwrap()));
        assert!(accepted.contains(&ScanKey::parse("sub-003_T1w.nii").unwrap()));
        assert!(!accepted.contains(&ScanKey::parse("sub-002_ses-01_T1w.nii").unwrap()));
    }

    #[test]
    fn test_accepted_list_missing_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("accepted.csv");
        fs::write(&path, "participant\nsub-001\n").unwrap();
        assert!(AcceptedList::from_csv(&path).is_err());
    }

    #[test]
    fn test_process_scan_final_writes_both_montages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let scan = root.join("sub-1/anat/sub-1_T1w.nii");
        write_volume(&scan, 0.0);

        let stripper = FakeStripper::new();
        let outcome = process_scan_final(root, &scan, &QcConfig::default(), &stripper).unwrap();
        let ScanOutcome::Processed(outputs) = outcome else {
            panic!("scan was not processed");
        };

        assert_eq!(stripper.calls.get(), 1);
        assert!(root.join("sub-1/anat/sub-1_T1w_skullstripped.nii.gz").is_file());
        for kind in crate::types::ARTIFACT_KINDS {
            assert!(outputs.written.get(kind).unwrap().is_file());
        }
    }

    #[test]
    fn test_existing_stripped_file_is_reused() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let scan = root.join("sub-1/anat/sub-1_T1w.nii");
        write_volume(&scan, 0.0);
        write_volume(&stripped_path_for(&scan), 0.0);

        let outcome = process_scan_final(root, &scan, &QcConfig::default(), &FailingStripper);
        assert!(matches!(outcome, Ok(ScanOutcome::Processed(_))));
    }

    #[test]
    fn test_strip_failure_skips_scan() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let scan = root.join("sub-1/anat/sub-1_T1w.nii");
        write_volume(&scan, 0.0);

        let outcome = process_scan_final(root, &scan, &QcConfig::default(), &FailingStripper);
        assert!(matches!(outcome, Ok(ScanOutcome::Skipped(_))));
        assert!(!root.join("results").exists());
    }

    #[test]
    fn test_run_final_filters_on_accepted_list() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_volume(&root.join("sub-1/ses-1/anat/sub-1_ses-1_T1w.nii"), 0.0);
        write_volume(&root.join("sub-2/ses-1/anat/sub-2_ses-1_T1w.nii"), 0.0);
        write_volume(&root.join("sub-1/ses-2/anat/sub-1_ses-2_T1w.nii"), 0.0);

        let mut accepted = AcceptedList::default();
        accepted.insert("sub-1", "ses-1");

        let stripper = FakeStripper::new();
        let summary = run_final(root, &accepted, &QcConfig::default(), &stripper).unwrap();

        assert_eq!(summary.phase, Phase::Final);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(stripper.calls.get(), 1);

        // The stripped output sits next to the input but is not picked up again
        let again = run_final(root, &accepted, &QcConfig::default(), &stripper).unwrap();
        assert_eq!(again.total(), 3);
        assert_eq!(stripper.calls.get(), 1);
    }
}
