use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reviewer decision for one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QcStatus {
    Good,
    Bad,
    Unclear,
    #[default]
    Unknown,
}

impl QcStatus {
    /// Returns the ledger spelling of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            QcStatus::Good => "GOOD",
            QcStatus::Bad => "BAD",
            QcStatus::Unclear => "UNCLEAR",
            QcStatus::Unknown => "UNKNOWN",
        }
    }

    /// Parses a status, ignoring case and surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidStatus`] for anything other than the four
    /// known values
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GOOD" => Ok(QcStatus::Good),
            "BAD" => Ok(QcStatus::Bad),
            "UNCLEAR" => Ok(QcStatus::Unclear),
            "UNKNOWN" => Ok(QcStatus::Unknown),
            _ => Err(QcError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for QcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// QC pass a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Original volumes only
    #[default]
    Initial,
    /// Accepted scans with skull stripping
    Final,
}

impl Phase {
    /// Returns the lowercase phase name used in titles and file names
    pub fn simple_name(&self) -> &'static str {
        match self {
            Phase::Initial => "initial",
            Phase::Final => "final",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(QcStatus::parse("GOOD").unwrap(), QcStatus::Good);
        assert_eq!(QcStatus::parse("bad").unwrap(), QcStatus::Bad);
        assert_eq!(QcStatus::parse(" Unclear ").unwrap(), QcStatus::Unclear);
        assert_eq!(QcStatus::parse("UNKNOWN").unwrap(), QcStatus::Unknown);
        assert!(matches!(
            QcStatus::parse("MAYBE"),
            Err(QcError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_status_display_matches_parse() {
        for status in [
            QcStatus::Good,
            QcStatus::Bad,
            QcStatus::Unclear,
            QcStatus::Unknown,
        ] {
            assert_eq!(QcStatus::parse(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Initial.to_string(), "initial");
        assert_eq!(Phase::Final.to_string(), "final");
        assert_eq!(Phase::default(), Phase::Initial);
    }
}
