//! Core type definitions for scan QC
//!
//! This module provides the fundamental types used throughout the bidsqc library:
//! - [`ScanKey`]: (subject, session, run) identifier parsed from a filename
//! - [`ArtifactKind`] / [`ArtifactSet`]: derived output files grouped per scan
//! - [`QcStatus`]: reviewer decision stored in the ledger
//! - [`Phase`]: initial or final QC pass
//! - [`QcConfig`]: pipeline configuration

mod artifact;
mod config;
mod enums;
mod scan_key;

pub use artifact::{ArtifactKind, ArtifactSet, ARTIFACT_KINDS};
pub use config::QcConfig;
pub use enums::{Phase, QcStatus};
pub use scan_key::{leading_number, ScanKey, DEFAULT_SESSION};
