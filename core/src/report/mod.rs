//! Review reports built from the artifacts of a results tree
//!
//! Artifacts are grouped by scan key and rendered as one page per key,
//! either written to disk as static HTML or served by the review server.

pub mod grouping;
pub mod html;
pub mod static_site;
pub mod stats_embed;

pub use grouping::{collect_artifacts, sort_keys};
pub use html::{not_found, Nav, ReportPage, ReviewWidget, Section};
pub use static_site::{generate_static_reports, relative_path, report_file_name};
pub use stats_embed::embed_stats;
