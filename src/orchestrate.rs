//! Drives the retrieval engine across the region/year matrix and writes
//! every output artifact: per-slot images, horizontal composites per
//! region, the configured vertical composites and `week.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;
use indicatif::ProgressBar;
use tracing::{error, info, warn};

use crate::classify::Classify;
use crate::compose::{combine_horizontal, combine_vertical};
use crate::config::{Region, Settings};
use crate::download::Fetch;
use crate::retrieve::{RetrievalRequest, RetrievalResult, Retriever};
use crate::week::Week;

/// A satisfied (region, requested year) slot.
struct Slot {
    image: DynamicImage,
    actual_year: i32,
    actual_week: Week,
}

/// What one run produced; the command layer turns this into user output
/// and the process exit status.
#[derive(Debug)]
pub struct RunSummary {
    pub reference_week: Week,
    pub combined_regions: Vec<String>,
    pub empty_regions: Vec<String>,
    pub failed_slots: Vec<(String, i32)>,
    pub skipped_compositions: Vec<(String, String)>,
}

pub struct Orchestrator<F, C> {
    retriever: Retriever<F, C>,
    regions: Vec<Region>,
    years: Vec<i32>,
    vertical_pairs: Vec<(String, String)>,
}

impl<F: Fetch, C: Classify> Orchestrator<F, C> {
    pub fn new(
        retriever: Retriever<F, C>,
        regions: Vec<Region>,
        years: Vec<i32>,
        vertical_pairs: Vec<(String, String)>,
    ) -> Self {
        Orchestrator {
            retriever,
            regions,
            years,
            vertical_pairs,
        }
    }

    /// Runs the full matrix. Only a failed reference-week probe (or an
    /// unwritable output directory) aborts; per-slot failures are absorbed
    /// into the summary and the run degrades to whatever subset of outputs
    /// it can produce.
    pub async fn run(
        &self,
        settings: &Settings,
        output_dir: &Path,
        progress: &ProgressBar,
    ) -> Result<RunSummary> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let reference = self.regions.first().context("No regions configured")?;
        let reference_week = self
            .retriever
            .find_available_week(reference, settings.initial_week, settings.max_lookback)
            .await?;
        info!("reference week: {}", reference_week);

        let mut summary = RunSummary {
            reference_week,
            combined_regions: Vec::new(),
            empty_regions: Vec::new(),
            failed_slots: Vec::new(),
            skipped_compositions: Vec::new(),
        };

        for region in &self.regions {
            let slots = self
                .fetch_region(region, reference_week, settings, output_dir, &mut summary)
                .await?;
            self.combine_region(region, slots, output_dir, &mut summary)?;
            progress.inc(1);
        }

        self.compose_vertical_pairs(output_dir, &mut summary);

        let week_file = output_dir.join("week.txt");
        fs::write(&week_file, reference_week.to_string())
            .with_context(|| format!("Failed to write {}", week_file.display()))?;
        info!("final reference week: {}", reference_week);

        Ok(summary)
    }

    /// Retrieves every year slot for one region, saving each satisfied
    /// image under its *actual* year. Failures are logged and recorded,
    /// never fatal.
    async fn fetch_region(
        &self,
        region: &Region,
        reference_week: Week,
        settings: &Settings,
        output_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<Vec<Slot>> {
        let most_recent = self.years.first().copied();
        let mut slots = Vec::new();

        for &year in &self.years {
            let request = RetrievalRequest {
                region,
                base_year: year,
                start_week: reference_week,
                max_lookback_weeks: settings.max_lookback,
                allow_year_fallback: Some(year) == most_recent,
            };

            match self.retriever.download_with_fallback(&request).await {
                RetrievalResult::Success {
                    image,
                    year: actual_year,
                    week: actual_week,
                } => {
                    // Fixed file name keyed on the satisfied year, no week.
                    let path = output_dir.join(format!("{}_{}.png", region.name, actual_year));
                    image
                        .save(&path)
                        .with_context(|| format!("Failed to save {}", path.display()))?;
                    info!(
                        "saved {} ({} week {})",
                        path.display(),
                        actual_year,
                        actual_week
                    );
                    slots.push(Slot {
                        image,
                        actual_year,
                        actual_week,
                    });
                }
                RetrievalResult::Failure { region, base_year } => {
                    warn!("ignoring {} {}", region, base_year);
                    summary.failed_slots.push((region, base_year));
                }
            }
        }

        Ok(slots)
    }

    /// Horizontal composite for one region. Slots arrive most-recent-first;
    /// the composite runs oldest to newest, left to right.
    fn combine_region(
        &self,
        region: &Region,
        slots: Vec<Slot>,
        output_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if slots.is_empty() {
            warn!("no valid images for {}", region.name);
            summary.empty_regions.push(region.name.clone());
            return Ok(());
        }

        let mut images = Vec::new();
        let mut years = Vec::new();
        let mut weeks = Vec::new();
        for slot in slots.into_iter().rev() {
            images.push(slot.image);
            years.push(slot.actual_year);
            weeks.push(slot.actual_week.number());
        }

        let combined = combine_horizontal(&images);
        let path = combined_path(output_dir, &region.name);
        combined
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        info!(
            "combined {}: years {:?} weeks {:?} (left to right)",
            path.display(),
            years,
            weeks
        );
        summary.combined_regions.push(region.name.clone());

        Ok(())
    }

    /// Vertical composites for the configured pairs, read back from disk.
    /// A missing or unreadable input skips that pair only.
    fn compose_vertical_pairs(&self, output_dir: &Path, summary: &mut RunSummary) {
        for (top, bottom) in &self.vertical_pairs {
            let top_path = combined_path(output_dir, top);
            let bottom_path = combined_path(output_dir, bottom);

            let result = (|| -> Result<PathBuf> {
                let top_image = image::open(&top_path)
                    .with_context(|| format!("Missing input {}", top_path.display()))?;
                let bottom_image = image::open(&bottom_path)
                    .with_context(|| format!("Missing input {}", bottom_path.display()))?;
                let combined = combine_vertical(&[top_image, bottom_image]);
                let path = output_dir.join(format!("combined_{}_{}.png", top, bottom));
                combined.save(&path)?;
                Ok(path)
            })();

            match result {
                Ok(path) => info!("vertical composite: {}", path.display()),
                Err(e) => {
                    error!("skipping vertical composite {}+{}: {:#}", top, bottom, e);
                    summary.skipped_compositions.push((top.clone(), bottom.clone()));
                }
            }
        }
    }
}

fn combined_path(output_dir: &Path, region_name: &str) -> PathBuf {
    output_dir.join(format!("{}_combined.png", region_name))
}

// -- Tests -------------------------------------------------------------------
