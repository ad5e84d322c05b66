pub mod report;

use crate::skullstrip::SynthStrip;
use crate::types::{Phase, QcConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for bidsqc
#[derive(Parser, Debug)]
#[command(name = "bidsqc")]
#[command(about = "Quality-control triage of structural MRI in a BIDS dataset")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Slices, statistics and density plots for every matching scan
    Initial {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Skull-stripped comparison for scans in an accepted list
    Final {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// CSV with `subject_id` and `session_id` columns
        #[arg(long, value_name = "CSV")]
        accepted: PathBuf,

        /// SynthStrip docker image
        #[arg(long, default_value = "freesurfer/synthstrip:latest")]
        docker_image: String,
    },

    /// Print intensity statistics of one volume
    Stats {
        /// NIfTI file (.nii or .nii.gz)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Options shared by both pipeline passes
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// BIDS dataset root
    #[arg(value_name = "BIDS_ROOT")]
    pub bids_root: PathBuf,

    /// Substring a scan file name must contain
    #[arg(value_name = "SCAN_TYPE", default_value = "T1w")]
    pub scan_type: String,

    /// Number of slices to select per scan
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub num_slices: u32,

    /// Montage rows
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub rows: u32,

    /// Montage columns
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub cols: u32,

    /// Name of the results directory under the dataset root
    #[arg(long, default_value = "results")]
    pub results_dir: String,
}

impl From<&PipelineArgs> for QcConfig {
    fn from(args: &PipelineArgs) -> Self {
        QcConfig::default()
            .with_scan_type(args.scan_type.clone())
            .with_num_slices(args.num_slices as usize)
            .with_grid(args.rows, args.cols)
            .with_results_dir_name(args.results_dir.clone())
    }
}

/// Builds the skull stripper for the final pass
pub fn synthstrip_for(docker_image: &str) -> SynthStrip {
    SynthStrip::default().with_image(docker_image)
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// QC phase as given on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PhaseArg {
    Initial,
    Final,
}

impl From<PhaseArg> for Phase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Initial => Phase::Initial,
            PhaseArg::Final => Phase::Final,
        }
    }
}

/// Initializes env_logger at info level, or debug when `verbose`
///
/// `RUST_LOG` still applies on top of the chosen level.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_initial_defaults() {
        let cli = Cli::try_parse_from(["bidsqc", "initial", "/data/bids"]).unwrap();
        let Command::Initial { pipeline } = cli.command else {
            panic!("expected initial");
        };
        let config = QcConfig::from(&pipeline);
        assert_eq!(config, QcConfig::default());
    }

    #[test]
    fn test_final_arguments() {
        let cli = Cli::try_parse_from([
            "bidsqc",
            "final",
            "/data/bids",
            "T2w",
            "--accepted",
            "accepted.csv",
            "--num-slices",
            "6",
            "--rows",
            "3",
            "--cols",
            "2",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);

        let Command::Final {
            pipeline,
            accepted,
            docker_image,
        } = cli.command
        else {
            panic!("expected final");
        };
        let config = QcConfig::from(&pipeline);
        assert_eq!(config.scan_type, "T2w");
        assert_eq!(config.num_slices, 6);
        assert_eq!((config.grid_rows, config.grid_cols), (3, 2));
        assert_eq!(accepted, PathBuf::from("accepted.csv"));
        assert_eq!(synthstrip_for(&docker_image).image, "freesurfer/synthstrip:latest");
    }

    #[test]
    fn test_zero_slices_rejected() {
        assert!(Cli::try_parse_from(["bidsqc", "initial", "/d", "--num-slices", "0"]).is_err());
    }

    #[test]
    fn test_phase_arg() {
        assert_eq!(Phase::from(PhaseArg::Final), Phase::Final);
        assert_eq!(Phase::from(PhaseArg::Initial), Phase::Initial);
    }
}
