pub mod cli;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod server;
pub mod skullstrip;
pub mod types;
pub mod volume;

pub use cli::report::SummaryReport;
pub use error::{QcError, Result};
pub use ledger::{Ledger, LedgerEntry};
pub use pipeline::{run_final, run_initial, AcceptedList, PipelineSummary};
pub use skullstrip::{SkullStripper, SynthStrip};
pub use types::*;
pub use volume::{find_slices_of_interest, IntensityStats, Volume};
