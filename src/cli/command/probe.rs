//! Probe for the most recent week with published data.

use anyhow::{Context, Result};

use crate::classify::BannerDetector;
use crate::cli::create_spinner;
use crate::config::{self, Settings};
use crate::download::HttpFetcher;
use crate::retrieve::Retriever;
use crate::week::Week;

pub async fn probe(week: Option<u32>, lookback: Option<u32>) -> Result<Week> {
    let settings = Settings::resolve(week, lookback);
    let regions = config::regions();
    let reference = regions.first().context("No regions configured")?;

    let fetcher = HttpFetcher::new()?;
    let retriever = Retriever::new(fetcher, BannerDetector::default(), config::years());

    let bar = create_spinner("Probing for the latest published week...".to_string());
    let found = retriever
        .find_available_week(reference, settings.initial_week, settings.max_lookback)
        .await?;
    bar.finish_with_message(format!("Week {} has published data", found));

    Ok(found)
}
