use bidsqc_core::cli::{setup_logging, PhaseArg};
use bidsqc_core::report::generate_static_reports;
use bidsqc_core::server::{serve, ReviewSession};
use bidsqc_core::Phase;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process;

/// Review QC artifacts as HTML reports
#[derive(Parser, Debug)]
#[command(name = "bidsqc-review")]
#[command(about = "Build or serve HTML review pages for a bidsqc results tree")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: ReviewCommand,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum ReviewCommand {
    /// Write one static HTML page per scan next to its artifacts
    Static {
        /// Results directory (usually BIDS_ROOT/results)
        #[arg(value_name = "RESULTS_DIR")]
        root: PathBuf,

        /// QC phase shown in titles and file names
        #[arg(short, long, default_value = "initial")]
        phase: PhaseArg,

        /// Scan label used in report file names
        #[arg(short, long, default_value = "T1w")]
        label: String,
    },

    /// Serve the pages locally and record decisions in a CSV ledger
    Serve {
        /// Results directory (usually BIDS_ROOT/results)
        #[arg(value_name = "RESULTS_DIR")]
        root: PathBuf,

        /// QC phase shown in titles
        #[arg(short, long, default_value = "initial")]
        phase: PhaseArg,

        /// Ledger CSV storing review decisions
        #[arg(long, default_value = "QC_data.csv")]
        csv: PathBuf,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    match cli.command {
        ReviewCommand::Static { root, phase, label } => {
            let phase: Phase = phase.into();
            match generate_static_reports(&root, phase, &label) {
                Ok(written) => {
                    println!("Generated {} HTML reports", written.len());
                    for path in written {
                        println!("{}", path.display());
                    }
                }
                Err(e) => {
                    error!("Failed to generate reports: {}", e);
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ReviewCommand::Serve {
            root,
            phase,
            csv,
            host,
            port,
        } => {
            info!("Scanning {} ...", root.display());
            let session = match ReviewSession::build(&root, phase.into(), &csv) {
                Ok(session) => session,
                Err(e) => {
                    error!("Failed to prepare review session: {}", e);
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            println!(
                "Found {} pages (subject/session/run combinations)",
                session.len()
            );

            if let Err(e) = serve(session, &host, port).await {
                error!("Server error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
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
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["bidsqc-review", "serve", "results"]).unwrap();
        let ReviewCommand::Serve {
            phase,
            csv,
            host,
            port,
            ..
        } = cli.command
        else {
            panic!("expected serve");
        };
        assert_eq!(Phase::from(phase), Phase::Initial);
        assert_eq!(csv, PathBuf::from("QC_data.csv"));
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_static_phase() {
        let cli =
            Cli::try_parse_from(["bidsqc-review", "static", "results", "--phase", "final"]).unwrap();
        let ReviewCommand::Static { phase, label, .. } = cli.command else {
            panic!("expected static");
        };
        assert_eq!(Phase::from(phase), Phase::Final);
        assert_eq!(label, "T1w");
    }
}
