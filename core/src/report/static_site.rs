use super::grouping::collect_artifacts;
use super::html::{Nav, ReportPage, ReviewWidget, Section};
use crate::error::Result;
use crate::types::{Phase, ScanKey};
use log::info;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name of a static report
///
/// `<sub>_<ses>[_<run>]_<label>_report_<phase>.html`, leaving out the
/// session when it is the default one.
pub fn report_file_name(key: &ScanKey, label: &str, phase: Phase) -> String {
    let mut parts = vec![key.subject.as_str()];
    if !key.has_default_session() {
        parts.push(&key.session);
    }
    if !key.run.is_empty() {
        parts.push(&key.run);
    }
    format!("{}_{}_report_{}.html", parts.join("_"), label, phase)
}

/// URL path from directory `from_dir` to `to`, using `/` separators
///
/// Both paths should be absolute (or both relative to the same base).
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat("..".to_string()).take(from.len() - common);
    let downs = to[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

/// Writes one static review page per scan key found under `root`
///
/// Each page goes next to the first available artifact of its key and
/// links to its neighbours in key order. Review decisions are kept in the
/// browser's local storage. Returns the written paths in key order.
pub fn generate_static_reports(root: &Path, phase: Phase, label: &str) -> Result<Vec<PathBuf>> {
    let groups = collect_artifacts(root)?;

    let mut planned = Vec::with_capacity(groups.len());
    for (key, artifacts) in groups {
        let Some((_, first)) = artifacts.first_available() else {
            continue;
        };
        let dir = first.parent().map(Path::to_path_buf).unwrap_or_default();
        let html_path = dir.join(report_file_name(&key, label, phase));
        planned.push((key, artifacts, dir, html_path));
    }

    let mut written = Vec::with_capacity(planned.len());
    for (i, (key, artifacts, dir, html_path)) in planned.iter().enumerate() {
        let nav = Nav {
            prev: i
                .checked_sub(1)
                .map(|p| relative_path(dir, &planned[p].3)),
            next: planned.get(i + 1).map(|n| relative_path(dir, &n.3)),
        };

        let page = ReportPage {
            key: key.clone(),
            phase,
            nav,
            sections: Section::for_artifacts(artifacts, |_, path| relative_path(dir, path)),
            review: ReviewWidget::LocalStorage {
                storage_key: format!("{}_{}", key, phase),
            },
        };

        fs::write(html_path, page.to_string())?;
        written.push(html_path.clone());
    }

    info!("Generated {} HTML reports under {}", written.len(), root.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case(ScanKey::new("sub-1", "ses-01", ""), Phase::Initial, "sub-1_T1w_report_initial.html")]
    #[case(ScanKey::new("sub-1", "ses-02", ""), Phase::Final, "sub-1_ses-02_T1w_report_final.html")]
    #[case(ScanKey::new("sub-1", "ses-02", "run-3"), Phase::Initial, "sub-1_ses-02_run-3_T1w_report_initial.html")]
    #[case(ScanKey::new("sub-1", "ses-01", "run-3"), Phase::Initial, "sub-1_run-3_T1w_report_initial.html")]
    fn test_report_file_name(#[case] key: ScanKey, #[case] phase: Phase, #[case] expected: &str) {
        assert_eq!(report_file_name(&key, "T1w", phase), expected);
    }

    #[rstest]
    #[case("/r/sub-1/anat", "/r/sub-1/anat/a.png", "a.png")]
    #[case("/r/sub-1/anat", "/r/sub-2/anat/b.html", "../../sub-2/anat/b.html")]
    #[case("/r/sub-1", "/r/sub-1/anat/c.svg", "anat/c.svg")]
    fn test_relative_path(#[case] from: &str, #[case] to: &str, #[case] expected: &str) {
        assert_eq!(relative_path(Path::new(from), Path::new(to)), expected);
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
    }

    #[test]
    fn test_generate_static_reports() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "sub-2/anat/sub-2_T1w_original_slices.png");
        touch(root, "sub-10/anat/sub-10_T1w_density.svg");
        touch(root, "sub-1/ses-2/anat/sub-1_ses-2_T1w_original_slices.png");
        fs::write(
            root.join("sub-1/ses-2/anat/sub-1_ses-2_T1w_stats.csv"),
            "mean,median,max,min,std\n1,2,3,4,5\n",
        )
        .unwrap();

        let written = generate_static_reports(root, Phase::Initial, "T1w").unwrap();
        let root = root.canonicalize().unwrap();
        assert_eq!(
            written,
            vec![
                root.join("sub-1/ses-2/anat/sub-1_ses-2_T1w_report_initial.html"),
                root.join("sub-2/anat/sub-2_T1w_report_initial.html"),
                root.join("sub-10/anat/sub-10_T1w_report_initial.html"),
            ]
        );

        let first = fs::read_to_string(&written[0]).unwrap();
        assert!(first.contains("<span style=\"color:gray;\">Previous</span>"));
        assert!(first.contains("<a href=\"../../../sub-2/anat/sub-2_T1w_report_initial.html\">Next</a>"));
        assert!(first.contains("src=\"sub-1_ses-2_T1w_original_slices.png\""));
        assert!(first.contains("<td>1</td>"));
        assert!(first.contains("No file found."));

        let last = fs::read_to_string(&written[2]).unwrap();
        assert!(last.contains("<a href=\"../../sub-2/anat/sub-2_T1w_report_initial.html\">Previous</a>"));
        assert!(last.contains("<span style=\"color:gray;\">Next</span>"));
        assert!(last.contains("data=\"sub-10_T1w_density.svg\""));
    }

    #[test]
    fn test_empty_results_tree() {
        let temp_dir = TempDir::new().unwrap();
        assert!(generate_static_reports(temp_dir.path(), Phase::Final, "T1w")
            .unwrap()
            .is_empty());
    }
}
