mod classify;
mod cli;
mod compose;
mod config;
mod download;
mod orchestrate;
mod retrieve;
mod week;

use std::process::ExitCode;

use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vhi=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            week,
            lookback,
            output_dir,
        } => match command::fetch(week, lookback, output_dir).await {
            Ok(summary) => {
                println!("Reference week: {}", summary.reference_week);
                println!(
                    "Combined images for {} of {} regions",
                    summary.combined_regions.len(),
                    summary.combined_regions.len() + summary.empty_regions.len()
                );
                for (region, year) in &summary.failed_slots {
                    eprintln!("No image for {} {}", region, year);
                }
                for (top, bottom) in &summary.skipped_compositions {
                    eprintln!("Vertical composite {}+{} skipped", top, bottom);
                }
                // A region with no output at all surfaces as a non-zero
                // exit so automation notices; slot-level gaps do not.
                if !summary.empty_regions.is_empty() {
                    eprintln!("No images produced for: {}", summary.empty_regions.join(", "));
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Commands::Probe { week, lookback } => match command::probe(week, lookback).await {
            Ok(found) => println!("{}", found),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Commands::Regions {} => command::regions(),
    }

    ExitCode::SUCCESS
}
