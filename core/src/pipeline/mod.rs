//! Dataset traversal and per-scan artifact generation
//!
//! Both passes walk the dataset root in file-name order, skip the results
//! tree, and process one volume at a time. A failing scan is logged and
//! counted; it never stops the traversal.

pub mod final_pass;
pub mod initial;

pub use final_pass::{process_scan_final, run_final, AcceptedList};
pub use initial::{process_scan_initial, run_initial};

use crate::error::{QcError, Result};
use crate::render::{save_density_plot, SliceMontage};
use crate::skullstrip::is_stripped_output;
use crate::types::{ArtifactKind, ArtifactSet, Phase, QcConfig};
use crate::volume::{is_nifti, strip_nifti_ext, IntensityStats, Volume};
use log::{debug, error, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the volumes a pass should process, in sorted traversal order
///
/// A file qualifies when it has a NIfTI extension, contains
/// `config.scan_type` in its name, and is not a skull-stripped output. The
/// `<root>/<results_dir_name>` subtree is never entered.
///
/// # Errors
///
/// Returns an error if `root` is not a directory
pub fn collect_scans(root: &Path, config: &QcConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(QcError::Config(format!(
            "dataset root {} is not a directory",
            root.display()
        )));
    }

    let results_dir = root.join(&config.results_dir_name);
    let mut scans = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.path() != results_dir);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        if is_scan_file(&entry.file_name().to_string_lossy(), &config.scan_type) {
            scans.push(entry.into_path());
        }
    }

    debug!("Found {} {} scans under {}", scans.len(), config.scan_type, root.display());
    Ok(scans)
}

/// Returns whether a file name is an input volume of the given scan type
pub fn is_scan_file(file_name: &str, scan_type: &str) -> bool {
    is_nifti(file_name) && file_name.contains(scan_type) && !is_stripped_output(file_name)
}

/// Mirror of a scan's directory under the results tree
///
/// `<root>/<rel>/<file>` maps to `<root>/<results_dir_name>/<rel>`.
pub fn results_dir_for(root: &Path, scan: &Path, results_dir_name: &str) -> PathBuf {
    let parent = scan.parent().unwrap_or(root);
    let rel = parent.strip_prefix(root).unwrap_or(Path::new(""));
    root.join(results_dir_name).join(rel)
}

/// Output location of one scan's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutputs {
    /// Scan file name without its NIfTI extension
    pub base: String,

    /// Directory artifacts are written to
    pub dir: PathBuf,

    /// Artifacts written so far
    pub written: ArtifactSet,
}

impl ScanOutputs {
    /// Resolves and creates the results directory of `scan`
    pub fn create(root: &Path, scan: &Path, config: &QcConfig) -> Result<Self> {
        let name = scan
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| QcError::Processing(format!("{} has no file name", scan.display())))?;

        let dir = results_dir_for(root, scan, &config.results_dir_name);
        fs::create_dir_all(&dir)?;

        Ok(Self {
            base: strip_nifti_ext(&name).to_string(),
            dir,
            written: ArtifactSet::new(),
        })
    }

    /// Path of the artifact of `kind` for this scan
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name(&self.base))
    }

    /// Renders a slice montage into the slot of `kind`
    pub(crate) fn write_montage(
        &mut self,
        kind: ArtifactKind,
        volume: &Volume,
        indices: &[usize],
        config: &QcConfig,
    ) -> Result<()> {
        let path = self.path(kind);
        SliceMontage::new(config.grid_rows, config.grid_cols).save(volume, indices, &path)?;
        self.written.set(kind, path);
        Ok(())
    }

    /// Writes the statistics record and density plot of a volume
    ///
    /// Both are skipped when statistics are unavailable.
    pub(crate) fn write_intensity_outputs(&mut self, volume: &Volume) -> Result<()> {
        let Some(stats) = IntensityStats::from_volume(volume) else {
            warn!("Statistics unavailable for {}, skipping stats and density", self.base);
            return Ok(());
        };

        let stats_path = self.path(ArtifactKind::Stats);
        stats.write_csv(&stats_path)?;
        self.written.set(ArtifactKind::Stats, stats_path);

        let density_path = self.path(ArtifactKind::Density);
        save_density_plot(volume, &self.base, &density_path)?;
        self.written.set(ArtifactKind::Density, density_path);
        Ok(())
    }
}

/// Result of processing one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Artifacts were written
    Processed(ScanOutputs),
    /// The scan was deliberately not processed
    Skipped(String),
}

/// Counts of what happened during one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub phase: Phase,
    pub processed: usize,
    pub skipped: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

impl PipelineSummary {
    /// Creates an empty summary for `phase`
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            ..Default::default()
        }
    }

    /// Records the outcome of one scan
    pub fn record(&mut self, scan: &Path, outcome: Result<ScanOutcome>) {
        match outcome {
            Ok(ScanOutcome::Processed(_)) => self.processed += 1,
            Ok(ScanOutcome::Skipped(reason)) => self.skipped.push((scan.to_path_buf(), reason)),
            Err(e) => {
                error!("Failed to process {}: {}", scan.display(), e);
                self.failed.push((scan.to_path_buf(), e.to_string()));
            }
        }
    }

    /// Total number of scans seen
    pub fn total(&self) -> usize {
        self.processed + self.skipped.len() + self.failed.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use ndarray::Array3;
    use nifti::writer::WriterOptions;
    use std::path::Path;

    /// Writes a small volume whose densest slice is in the middle
    pub fn write_volume(path: &Path, offset: f32) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let data = Array3::from_shape_fn((6, 5, 12), |(x, y, z)| {
            offset + (x + y) as f32 + 12.0 - (z as f32 - 6.0).abs()
        });
        WriterOptions::new(path).write_nifti(&data).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[rstest]
    #[case("sub-1_T1w.nii.gz", true)]
    #[case("sub-1_T1w.nii", true)]
    #[case("sub-1_T2w.nii.gz", false)]
    #[case("sub-1_T1w.json", false)]
    #[case("sub-1_T1w_skullstripped.nii.gz", false)]
    fn test_is_scan_file(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_scan_file(name, "T1w"), expected);
    }

    #[test]
    fn test_collect_scans_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("sub-2/anat/sub-2_T1w.nii.gz"));
        touch(&root.join("sub-1/anat/sub-1_T1w.nii"));
        touch(&root.join("sub-1/anat/sub-1_T1w_skullstripped.nii.gz"));
        touch(&root.join("sub-1/anat/sub-1_T2w.nii.gz"));
        touch(&root.join("results/sub-1/anat/sub-1_T1w.nii.gz"));
        touch(&root.join("sub-3/results_T1w.nii"));

        let scans = collect_scans(root, &QcConfig::default()).unwrap();
        let rel: Vec<_> = scans
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            rel,
            vec![
                PathBuf::from("sub-1/anat/sub-1_T1w.nii"),
                PathBuf::from("sub-2/anat/sub-2_T1w.nii.gz"),
                PathBuf::from("sub-3/results_T1w.nii"),
            ]
        );
    }

    #[test]
    fn test_collect_scans_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(collect_scans(&temp_dir.path().join("nope"), &QcConfig::default()).is_err());
    }

    #[test]
    fn test_results_dir_for_mirrors_tree() {
        let root = Path::new("/bids");
        assert_eq!(
            results_dir_for(root, Path::new("/bids/sub-1/ses-1/anat/sub-1_T1w.nii"), "results"),
            PathBuf::from("/bids/results/sub-1/ses-1/anat")
        );
        assert_eq!(
            results_dir_for(root, Path::new("/bids/sub-1_T1w.nii"), "qc"),
            PathBuf::from("/bids/qc")
        );
    }

    #[test]
    fn test_scan_outputs_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let scan = root.join("sub-1/anat/sub-1_T1w.nii.gz");

        let outputs = ScanOutputs::create(root, &scan, &QcConfig::default()).unwrap();
        assert_eq!(outputs.base, "sub-1_T1w");
        assert!(outputs.dir.is_dir());
        assert_eq!(
            outputs.path(ArtifactKind::Stats),
            root.join("results/sub-1/anat/sub-1_T1w_stats.csv")
        );
    }

    #[test]
    fn test_summary_record() {
        let mut summary = PipelineSummary::new(Phase::Final);
        summary.record(Path::new("a.nii"), Ok(ScanOutcome::Skipped("not accepted".into())));
        summary.record(Path::new("b.nii"), Err(QcError::Processing("boom".into())));

        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.total(), 2);
    }
}
