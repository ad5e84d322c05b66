use thiserror::Error;

/// Result type for bidsqc operations
pub type Result<T> = std::result::Result<T, QcError>;

/// Error types for bidsqc operations
#[derive(Error, Debug)]
pub enum QcError {
    /// NIfTI reading error
    #[error("NIfTI error: {0}")]
    Nifti(String),

    /// Volume has an unusable shape or no voxels
    #[error("Malformed volume: {0}")]
    MalformedVolume(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(String),

    /// Directory traversal error
    #[error("Walk error: {0}")]
    Walk(String),

    /// Filename carries no subject segment
    #[error("Unrecognized filename: {0}")]
    UnrecognizedFilename(String),

    /// External skull-stripping tool failed or is unavailable
    #[error("Skull stripping failed: {0}")]
    SkullStrip(String),

    /// Review status outside GOOD/BAD/UNCLEAR/UNKNOWN
    #[error("Invalid QC status: {0}")]
    InvalidStatus(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic processing error
    #[error("Processing error: {0}")]
    Processing(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper conversions
impl From<String> for QcError {
    fn from(s: String) -> Self {
        QcError::Processing(s)
    }
}

impl From<&str> for QcError {
    fn from(s: &str) -> Self {
        QcError::Processing(s.to_string())
    }
}

impl From<nifti::NiftiError> for QcError {
    fn from(e: nifti::NiftiError) -> Self {
        QcError::Nifti(format!("{}", e))
    }
}

impl From<image::ImageError> for QcError {
    fn from(e: image::ImageError) -> Self {
        QcError::Image(format!("{}", e))
    }
}

impl From<csv::Error> for QcError {
    fn from(e: csv::Error) -> Self {
        QcError::Csv(format!("{}", e))
    }
}

impl From<walkdir::Error> for QcError {
    fn from(e: walkdir::Error) -> Self {
        QcError::Walk(format!("{}", e))
    }
}

impl From<ndarray::ShapeError> for QcError {
    fn from(e: ndarray::ShapeError) -> Self {
        QcError::MalformedVolume(format!("{}", e))
    }
}
