//! Command line interface.

pub mod command;

use std::path::PathBuf;
use std::time::Duration;

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the full region/year image matrix and write composites
    Fetch {
        /// Initial ISO week (1-53); defaults to $VHI_WEEK, then the current week
        #[arg(short, long)]
        week: Option<u32>,
        /// Maximum weeks to fall back; defaults to $VHI_MAX_LOOKBACK, then 10
        #[arg(short, long)]
        lookback: Option<u32>,
        /// Directory the images and week.txt are written to
        #[arg(short, long, default_value = "vhi_images")]
        output_dir: PathBuf,
    },
    /// Probe for the most recent week with published data
    Probe {
        /// Initial ISO week (1-53); defaults to $VHI_WEEK, then the current week
        #[arg(short, long)]
        week: Option<u32>,
        /// Maximum weeks to fall back; defaults to $VHI_MAX_LOOKBACK, then 10
        #[arg(short, long)]
        lookback: Option<u32>,
    },
    /// List the configured regions, years and composite pairs
    Regions {},
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}
