use crate::error::{QcError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Session used when a filename carries no `ses-` segment
pub const DEFAULT_SESSION: &str = "ses-01";

/// Identifier of one scan, parsed from a BIDS-style filename
///
/// Tokens keep the case they had in the filename. Ordering on the struct
/// itself is plain string ordering; use [`ScanKey::numeric_sort_key`] for
/// the subject/session/run numeric order used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanKey {
    /// Subject segment, e.g. `sub-001`
    pub subject: String,

    /// Session segment, e.g. `ses-02`; [`DEFAULT_SESSION`] when absent
    pub session: String,

    /// Run segment, e.g. `run-3`; empty when absent
    pub run: String,
}

impl ScanKey {
    /// Creates a new ScanKey
    pub fn new(
        subject: impl Into<String>,
        session: impl Into<String>,
        run: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            session: session.into(),
            run: run.into(),
        }
    }

    /// Parses a scan key from a filename
    ///
    /// Recognizes `sub-<token>` optionally followed by `_ses-<token>` and
    /// `_run-<token>`, where a token is any run of characters other than `_`.
    /// Matching is case-insensitive and may start anywhere in the name.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::UnrecognizedFilename`] if no subject segment is found
    pub fn parse(file_name: &str) -> Result<Self> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"(?i)(sub-[^_]+)(?:_(ses-[^_]+))?(?:_(run-[^_]+))?")
                .expect("Failed to compile regex")
        });

        let caps = re
            .captures(file_name)
            .ok_or_else(|| QcError::UnrecognizedFilename(file_name.to_string()))?;

        // Group 1 always participates when the pattern matches
        let subject = caps
            .get(1)
            .map(|m| m.as_str())
            .ok_or_else(|| QcError::UnrecognizedFilename(file_name.to_string()))?;
        let session = caps.get(2).map_or(DEFAULT_SESSION, |m| m.as_str());
        let run = caps.get(3).map_or("", |m| m.as_str());

        Ok(Self::new(subject, session, run))
    }

    /// Returns whether the session is the default placeholder
    pub fn has_default_session(&self) -> bool {
        self.session.eq_ignore_ascii_case(DEFAULT_SESSION)
    }

    /// Returns the (subject, session) pair used for accepted-list lookups
    pub fn subject_session(&self) -> (&str, &str) {
        (&self.subject, &self.session)
    }

    /// Numeric ordering key: first digit run of each token, or 0
    ///
    /// Distinct tokens can share a key (`sub-01` and `sub-1`, `ses-6mo` and
    /// `ses-6`); callers that need a total order must break ties themselves.
    pub fn numeric_sort_key(&self) -> (u64, u64, u64) {
        (
            leading_number(&self.subject),
            leading_number(&self.session),
            leading_number(&self.run),
        )
    }
}

impl fmt::Display for ScanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.run.is_empty() {
            write!(f, "{}_{}", self.subject, self.session)
        } else {
            write!(f, "{}_{}_{}", self.subject, self.session, self.run)
        }
    }
}

/// Extracts the first run of ASCII digits in `token` as an integer
///
/// Returns 0 when the token has no digits. Values too large for `u64`
/// saturate.
pub fn leading_number(token: &str) -> u64 {
    let digits: String = token
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return 0;
    }

    digits.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sub-001_ses-02_run-3_T1w.nii.gz", "sub-001", "ses-02", "run-3")]
    #[case("sub-007_T1w.nii.gz", "sub-007", DEFAULT_SESSION, "")]
    #[case("sub-011228_ses-6mo_T1w_original_slices.png", "sub-011228", "ses-6mo", "")]
    #[case("sub-12_run-02_T2w_density.svg", "sub-12", DEFAULT_SESSION, "run-02")]
    #[case("SUB-5_SES-1_T1w_stats.csv", "SUB-5", "SES-1", "")]
    fn test_parse_scan_key(
        #[case] name: &str,
        #[case] subject: &str,
        #[case] session: &str,
        #[case] run: &str,
    ) {
        let key = ScanKey::parse(name).unwrap();
        assert_eq!(key, ScanKey::new(subject, session, run));
    }

    #[test]
    fn test_parse_unrecognized() {
        assert!(matches!(
            ScanKey::parse("T1w_original_slices.png"),
            Err(QcError::UnrecognizedFilename(_))
        ));
        assert!(ScanKey::parse("").is_err());
    }

    #[test]
    fn test_parse_session_must_follow_subject() {
        // A session segment separated from the subject is not picked up
        let key = ScanKey::parse("sub-01_acq-fast_ses-02_T1w.nii").unwrap();
        assert_eq!(key.session, DEFAULT_SESSION);
    }

    #[rstest]
    #[case("sub-001", 1)]
    #[case("ses-6mo", 6)]
    #[case("run-", 0)]
    #[case("", 0)]
    #[case("sub-abc", 0)]
    #[case("sub-a12b34", 12)]
    #[case("sub-99999999999999999999999", u64::MAX)]
    fn test_leading_number(#[case] token: &str, #[case] expected: u64) {
        assert_eq!(leading_number(token), expected);
    }

    #[test]
    fn test_numeric_sort_key_orders_numbers_not_strings() {
        let mut keys = vec![
            ScanKey::new("sub-2", DEFAULT_SESSION, ""),
            ScanKey::new("sub-10", DEFAULT_SESSION, ""),
            ScanKey::new("sub-1", DEFAULT_SESSION, ""),
        ];
        keys.sort_by_key(|k| k.numeric_sort_key());

        let subjects: Vec<_> = keys.iter().map(|k| k.subject.as_str()).collect();
        assert_eq!(subjects, vec!["sub-1", "sub-2", "sub-10"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ScanKey::new("sub-1", "ses-2", "").to_string(),
            "sub-1_ses-2"
        );
        assert_eq!(
            ScanKey::new("sub-1", "ses-2", "run-3").to_string(),
            "sub-1_ses-2_run-3"
        );
    }

    #[test]
    fn test_default_session() {
        assert!(ScanKey::parse("sub-1_T1w.nii").unwrap().has_default_session());
        assert!(!ScanKey::parse("sub-1_ses-2_T1w.nii")
            .unwrap()
            .has_default_session());
    }
}
