use crate::pipeline::PipelineSummary;
use std::fmt;

/// Text report of one pipeline run
pub struct SummaryReport<'a> {
    summary: &'a PipelineSummary,
}

impl<'a> SummaryReport<'a> {
    /// Creates a new summary report
    pub fn new(summary: &'a PipelineSummary) -> Self {
        Self { summary }
    }
}

impl<'a> fmt::Display for SummaryReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("QC Summary ({})", self.summary.phase);
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f)?;
        writeln!(f, "Scans:      {}", self.summary.total())?;
        writeln!(f, "Processed:  {}", self.summary.processed)?;
        writeln!(f, "Skipped:    {}", self.summary.skipped.len())?;
        writeln!(f, "Failed:     {}", self.summary.failed.len())?;

        if !self.summary.failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures")?;
            writeln!(f, "--------")?;
            for (path, reason) in &self.summary.failed {
                writeln!(f, "{}: {}", path.display(), reason)?;
            }
        }

        Ok(())
    }
}
