use crate::error::{QcError, Result};
use crate::types::{ArtifactKind, ArtifactSet, ScanKey};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Groups the artifacts under `root` by scan key
///
/// Files are visited in sorted file-name order. A file whose name carries
/// no subject segment is logged and left out. When two files fill the same
/// slot of a key, the one visited last wins. Paths are absolute when `root`
/// can be canonicalized.
///
/// # Errors
///
/// Returns an error if `root` is not a directory
pub fn collect_artifacts(root: &Path) -> Result<Vec<(ScanKey, ArtifactSet)>> {
    if !root.is_dir() {
        return Err(QcError::Config(format!(
            "results root {} is not a directory",
            root.display()
        )));
    }
    let root = root.canonicalize()?;

    let mut groups: BTreeMap<ScanKey, ArtifactSet> = BTreeMap::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
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

        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(kind) = ArtifactKind::from_file_name(&name) else {
            continue;
        };
        let key = match ScanKey::parse(&name) {
            Ok(key) => key,
            Err(_) => {
                warn!("Ignoring {}: no subject in file name", entry.path().display());
                continue;
            }
        };

        let path = entry.into_path();
        if let Some(previous) = groups.entry(key).or_default().set(kind, path.clone()) {
            debug!(
                "{} replaces {} for {}",
                path.display(),
                previous.display(),
                kind
            );
        }
    }

    let mut grouped: Vec<_> = groups.into_iter().collect();
    sort_keys(&mut grouped);
    Ok(grouped)
}

/// Orders groups by the numeric (subject, session, run) key
///
/// The sort is stable, so keys with equal numbers keep their incoming
/// order.
pub fn sort_keys<T>(groups: &mut [(ScanKey, T)]) {
    groups.sort_by_key(|(key, _)| key.numeric_sort_key());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_groups_by_key_in_numeric_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "sub-10/anat/sub-10_T1w_original_slices.png");
        touch(root, "sub-2/anat/sub-2_T1w_density.svg");
        touch(root, "sub-2/anat/sub-2_T1w_stats.csv");
        touch(root, "sub-1/ses-2/anat/sub-1_ses-2_T1w_stats.csv");
        touch(root, "sub-1/ses-1/anat/sub-1_ses-1_run-2_T1w_stats.csv");
        touch(root, "sub-1/ses-1/anat/sub-1_ses-1_run-1_T1w_stats.csv");
        touch(root, "sub-1/ses-1/anat/notes.txt");
        touch(root, "misc/T1w_density.svg");

        let groups = collect_artifacts(root).unwrap();
        let keys: Vec<String> = groups.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "sub-1_ses-1_run-1",
                "sub-1_ses-1_run-2",
                "sub-1_ses-2",
                "sub-2_ses-01",
                "sub-10_ses-01",
            ]
        );

        let sub2 = &groups[3].1;
        assert!(sub2.get(ArtifactKind::Density).is_some());
        assert!(sub2.get(ArtifactKind::Stats).is_some());
        assert!(sub2.get(ArtifactKind::OriginalSlices).is_none());
        assert!(sub2.get(ArtifactKind::Density).unwrap().is_absolute());
    }

    #[test]
    fn test_last_writer_wins_in_sorted_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "b/sub-1_T1w_density.svg");
        touch(root, "a/sub-1_T1w_density.svg");

        let groups = collect_artifacts(root).unwrap();
        assert_eq!(groups.len(), 1);
        let density = groups[0].1.get(ArtifactKind::Density).unwrap();
        assert!(density.ends_with("b/sub-1_T1w_density.svg"));
    }

    #[test]
    fn test_numeric_ties_fall_back_to_string_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "sub-1_T1w_stats.csv");
        touch(root, "sub-01_T1w_stats.csv");

        let groups = collect_artifacts(root).unwrap();
        let subjects: Vec<_> = groups.iter().map(|(k, _)| k.subject.as_str()).collect();
        assert_eq!(subjects, vec!["sub-01", "sub-1"]);
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(collect_artifacts(&temp_dir.path().join("results")).is_err());
    }
}
