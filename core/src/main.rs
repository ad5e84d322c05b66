use bidsqc_core::cli::report::SummaryReport;
use bidsqc_core::cli::{setup_logging, synthstrip_for, Cli, Command, OutputFormat};
use bidsqc_core::pipeline::{run_final, run_initial, AcceptedList, PipelineSummary};
use bidsqc_core::volume::analyze_file;
use bidsqc_core::{QcConfig, Result};
use clap::Parser;
use log::{error, info};
use serde::Serialize;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    match cli.command {
        Command::Initial { pipeline } => {
            let config = QcConfig::from(&pipeline);
            let summary = exit_on_error(run_initial(&pipeline.bids_root, &config));
            output_summary(&summary, &cli.format);
        }
        Command::Final {
            pipeline,
            accepted,
            docker_image,
        } => {
            let config = QcConfig::from(&pipeline);
            let accepted = exit_on_error(AcceptedList::from_csv(&accepted));
            info!("Loaded {} accepted subject/session pairs", accepted.len());

            let stripper = synthstrip_for(&docker_image);
            let summary = exit_on_error(run_final(
                &pipeline.bids_root,
                &accepted,
                &config,
                &stripper,
            ));
            output_summary(&summary, &cli.format);
        }
        Command::Stats { file } => match analyze_file(&file) {
            Some(stats) => match cli.format {
                OutputFormat::Text => print!("{}", stats),
                OutputFormat::Json => print_json(&stats),
            },
            None => {
                eprintln!("Error: statistics unavailable for {}", file.display());
                process::exit(1);
            }
        },
    }
}

fn exit_on_error<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn output_summary(summary: &PipelineSummary, format: &OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", SummaryReport::new(summary)),
        OutputFormat::Json => print_json(summary),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}
