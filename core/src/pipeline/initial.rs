use super::{collect_scans, PipelineSummary, ScanOutcome, ScanOutputs};
use crate::error::Result;
use crate::types::{ArtifactKind, Phase, QcConfig};
use crate::volume::{find_slices_of_interest, Volume};
use log::info;
use std::path::Path;

/// Initial QC of one volume
///
/// Writes the original-slices montage, then the statistics record and
/// density plot when statistics are available.
pub fn process_scan_initial(root: &Path, scan: &Path, config: &QcConfig) -> Result<ScanOutcome> {
    info!("[Initial QC] Processing {}", scan.display());

    let volume = Volume::open(scan)?;
    let indices = find_slices_of_interest(&volume, config.num_slices);

    let mut outputs = ScanOutputs::create(root, scan, config)?;
    outputs.write_montage(ArtifactKind::OriginalSlices, &volume, &indices, config)?;
    outputs.write_intensity_outputs(&volume)?;

    info!("[Initial QC] Finished processing {}", scan.display());
    Ok(ScanOutcome::Processed(outputs))
}

/// Runs the initial pass over every matching volume under `root`
///
/// # Errors
///
/// Returns an error only for an invalid configuration or an unreadable
/// root; per-scan failures are recorded in the summary.
pub fn run_initial(root: &Path, config: &QcConfig) -> Result<PipelineSummary> {
    config.validate()?;
    info!(
        "[Initial QC] Starting traversal of {} for scan type {}",
        root.display(),
        config.scan_type
    );

    let mut summary = PipelineSummary::new(Phase::Initial);
    for scan in collect_scans(root, config)? {
        let outcome = process_scan_initial(root, &scan, config);
        summary.record(&scan, outcome);
    }

    info!("[Initial QC] Finished processing all files");
    Ok(summary)
}
