use super::Volume;
use crate::error::Result;
use log::error;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Column names of the statistics record, in file order
pub const STATS_HEADERS: [&str; 5] = ["mean", "median", "max", "min", "std"];

/// Whole-volume intensity statistics
///
/// Field order is the column order of the `_stats.csv` record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityStats {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub std: f64,
}

impl IntensityStats {
    /// Computes statistics over every voxel of a volume
    pub fn from_volume(volume: &Volume) -> Option<Self> {
        Self::from_values(volume.voxels().collect())
    }

    /// Computes population statistics over a set of values
    ///
    /// The standard deviation uses the population formula (divides by n).
    /// The median of an even count is the mean of the two middle values.
    /// Returns `None` when `values` is empty.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        values.sort_unstable_by(|a, b| a.total_cmp(b));
        let n = values.len();
        let min = values[0];
        let max = values[n - 1];

        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };

        // Offsets from the minimum keep a constant volume exact
        let offsets: Array1<f64> = values.iter().map(|v| v - min).collect();
        let mean = min + offsets.mean()?;
        let std = offsets.std(0.0);

        Some(Self {
            mean,
            median,
            max,
            min,
            std,
        })
    }

    /// Writes the statistics as a one-row CSV with a header
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.serialize(self)?;
        writer.flush()?;
        Ok(())
    }

    /// Values in column order
    pub fn values(&self) -> [f64; 5] {
        [self.mean, self.median, self.max, self.min, self.std]
    }
}

impl fmt::Display for IntensityStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in STATS_HEADERS.iter().zip(self.values()) {
            writeln!(f, "{:<7} {}", format!("{}:", name), value)?;
        }
        Ok(())
    }
}

/// Loads a volume and computes its statistics
///
/// Load or decode failures are logged and reported as `None`, so callers
/// can skip statistics-dependent outputs for this scan and carry on.
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Option<IntensityStats> {
    let path = path.as_ref();
    match Volume::open(path) {
        Ok(volume) => IntensityStats::from_volume(&volume),
        Err(e) => {
            error!("Statistics unavailable for {}: {}", path.display(), e);
            None
        }
    }
}
