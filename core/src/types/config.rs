use crate::error::{QcError, Result};

/// Configuration for the initial and final QC pipelines
///
/// # Example
///
/// ```
/// use bidsqc_core::QcConfig;
///
/// let config = QcConfig::default()
///     .with_scan_type("T2w")
///     .with_num_slices(6)
///     .with_grid(2, 3);
///
/// assert_eq!(config.scan_type, "T2w");
/// assert_eq!(config.num_slices, 6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QcConfig {
    /// Substring a volume filename must contain, e.g. "T1w"
    pub scan_type: String,

    /// Number of slices to select per volume
    pub num_slices: usize,

    /// Montage grid rows
    pub grid_rows: u32,

    /// Montage grid columns
    pub grid_cols: u32,

    /// Name of the mirrored output directory under the dataset root
    pub results_dir_name: String,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            scan_type: "T1w".to_string(),
            num_slices: 10,
            grid_rows: 2,
            grid_cols: 5,
            results_dir_name: "results".to_string(),
        }
    }
}

impl QcConfig {
    /// Builder: Set the scan type substring
    pub fn with_scan_type(mut self, scan_type: impl Into<String>) -> Self {
        self.scan_type = scan_type.into();
        self
    }

    /// Builder: Set the number of slices of interest
    pub fn with_num_slices(mut self, num_slices: usize) -> Self {
        self.num_slices = num_slices;
        self
    }

    /// Builder: Set the montage grid shape
    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.grid_rows = rows;
        self.grid_cols = cols;
        self
    }

    /// Builder: Set the results directory name
    pub fn with_results_dir_name(mut self, name: impl Into<String>) -> Self {
        self.results_dir_name = name.into();
        self
    }

    /// Checks that every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Config`] if the slice count or a grid dimension is
    /// zero, or the results directory name is empty
    pub fn validate(&self) -> Result<()> {
        if self.num_slices == 0 {
            return Err(QcError::Config("num_slices must be at least 1".into()));
        }
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(QcError::Config(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_rows, self.grid_cols
            )));
        }
        if self.results_dir_name.is_empty() {
            return Err(QcError::Config("results directory name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QcConfig::default();
        assert_eq!(config.scan_type, "T1w");
        assert_eq!(config.num_slices, 10);
        assert_eq!((config.grid_rows, config.grid_cols), (2, 5));
        assert_eq!(config.results_dir_name, "results");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(QcConfig::default().with_num_slices(0).validate().is_err());
        assert!(QcConfig::default().with_grid(0, 5).validate().is_err());
        assert!(QcConfig::default().with_grid(2, 0).validate().is_err());
        assert!(QcConfig::default()
            .with_results_dir_name("")
            .validate()
            .is_err());
    }
}
