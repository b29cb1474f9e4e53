//! The full matrix run: probe the reference week, then download and
//! composite every configured region and year.

use std::path::PathBuf;

use anyhow::Result;

use crate::classify::BannerDetector;
use crate::cli::create_progress_bar;
use crate::config::{self, Settings};
use crate::download::HttpFetcher;
use crate::orchestrate::{Orchestrator, RunSummary};
use crate::retrieve::Retriever;

pub async fn fetch(
    week: Option<u32>,
    lookback: Option<u32>,
    output_dir: PathBuf,
) -> Result<RunSummary> {
    let settings = Settings::resolve(week, lookback);
    let regions = config::regions();
    let years = config::years();

    let bar = create_progress_bar(regions.len() as u64, "Fetching regions...".to_string());

    let fetcher = HttpFetcher::new()?;
    let retriever = Retriever::new(fetcher, BannerDetector::default(), years.clone());
    let orchestrator = Orchestrator::new(retriever, regions, years, config::vertical_pairs());

    let summary = orchestrator.run(&settings, &output_dir, &bar).await?;
    bar.finish_with_message("Regions fetched");

    Ok(summary)
}
