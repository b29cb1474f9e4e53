//! Week-validity probing and image download with week/year fallback.

use std::time::Duration;

use anyhow::{anyhow, Result};
use image::DynamicImage;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::classify::{Availability, Classify};
use crate::config::Region;
use crate::download::{Fetch, FetchResponse, DOWNLOAD_TIMEOUT, PROBE_TIMEOUT};
use crate::week::{countdown, Week};

/// Courtesy pause after a network error before the next week is tried.
const NETWORK_RETRY_DELAY: Duration = Duration::from_millis(500);
/// Courtesy pause after a malformed response before the next week is tried.
const RESPONSE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// One (region, base year) unit of work.
#[derive(Debug, Clone)]
pub struct RetrievalRequest<'a> {
    pub region: &'a Region,
    pub base_year: i32,
    pub start_week: Week,
    pub max_lookback_weeks: u32,
    /// Set by the orchestrator, true only for the most recent configured
    /// year. Never inferred from the position of `base_year` downstream.
    pub allow_year_fallback: bool,
}

/// Outcome of one retrieval: a usable image tagged with the (year, week)
/// actually satisfied, or a definitive per-slot failure.
#[derive(Debug)]
pub enum RetrievalResult {
    Success {
        image: DynamicImage,
        year: i32,
        week: Week,
    },
    Failure {
        region: String,
        base_year: i32,
    },
}

/// Retrieval engine: drives the fetcher and the classifier over the
/// week/year fallback search. Stateless between calls.
pub struct Retriever<F, C> {
    fetcher: F,
    classifier: C,
    years: Vec<i32>,
    network_delay: Duration,
    response_delay: Duration,
}

impl<F: Fetch, C: Classify> Retriever<F, C> {
    pub fn new(fetcher: F, classifier: C, years: Vec<i32>) -> Self {
        Retriever {
            fetcher,
            classifier,
            years,
            network_delay: NETWORK_RETRY_DELAY,
            response_delay: RESPONSE_RETRY_DELAY,
        }
    }

    #[cfg(test)]
    pub fn without_delays(fetcher: F, classifier: C, years: Vec<i32>) -> Self {
        Retriever {
            fetcher,
            classifier,
            years,
            network_delay: Duration::ZERO,
            response_delay: Duration::ZERO,
        }
    }

    /// Finds the most recent week, at or before `start_week`, for which
    /// the upstream has published data, judged against `reference` and the
    /// most recent configured year.
    ///
    /// Exhausting the lookback here is fatal for a run: every subsequent
    /// request depends on the reference week.
    pub async fn find_available_week(
        &self,
        reference: &Region,
        start_week: Week,
        max_lookback: u32,
    ) -> Result<Week> {
        let year = *self
            .years
            .first()
            .ok_or_else(|| anyhow!("No years configured"))?;

        for week in countdown(start_week, max_lookback + 1) {
            info!("probing week {} (ref: {} {})", week, reference.name, year);
            let url = reference.url(year, week);
            match self.fetcher.fetch(&url, PROBE_TIMEOUT).await {
                Ok(response) => {
                    if let Some(image) = decode_image(&response) {
                        if self.classifier.classify(&image) == Availability::Data {
                            info!("valid week: {}", week);
                            return Ok(week);
                        }
                        info!("week {} has no data (banner)", week);
                    }
                }
                Err(e) => warn!("network: {:#}", e),
            }
        }

        Err(anyhow!(
            "No valid week within a lookback of {} from week {}",
            max_lookback,
            start_week
        ))
    }

    /// Obtains a valid image for one request, trying the target week first
    /// and earlier weeks on each miss. When year fallback is allowed, the
    /// search moves to successively older configured years, restarting at
    /// the original target week for each.
    pub async fn download_with_fallback(&self, request: &RetrievalRequest<'_>) -> RetrievalResult {
        let region = request.region;

        for year in self.candidate_years(request) {
            for (attempt, week) in countdown(request.start_week, request.max_lookback_weeks + 1)
                .enumerate()
            {
                info!(
                    "downloading {} - year {} - week {} (attempt {})",
                    region.name,
                    year,
                    week,
                    attempt + 1
                );
                let url = region.url(year, week);

                let response = match self.fetcher.fetch(&url, DOWNLOAD_TIMEOUT).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("network: {:#}", e);
                        sleep(self.network_delay).await;
                        continue;
                    }
                };

                if !response.is_image() {
                    warn!(
                        "invalid response (status {}, type {:?})",
                        response.status, response.content_type
                    );
                    sleep(self.response_delay).await;
                    continue;
                }

                let image = match image::load_from_memory(&response.body) {
                    Ok(image) => image,
                    Err(_) => {
                        warn!("response body is not a decodable image");
                        sleep(self.response_delay).await;
                        continue;
                    }
                };

                if self.classifier.classify(&image) == Availability::NoData {
                    info!("{} {} week {}: no data (banner)", region.name, year, week);
                    continue;
                }

                return RetrievalResult::Success { image, year, week };
            }
            warn!("no valid week in {} for {}", year, region.name);
        }

        warn!(
            "giving up on {} from base year {}{}",
            region.name,
            request.base_year,
            if request.allow_year_fallback {
                " (week and year fallback exhausted)"
            } else {
                " (week fallback exhausted)"
            }
        );
        RetrievalResult::Failure {
            region: region.name.clone(),
            base_year: request.base_year,
        }
    }

    /// Candidate years for one request, most recent first. Fallback walks
    /// the configured sequence without skipping; without the flag the base
    /// year stands alone.
    fn candidate_years(&self, request: &RetrievalRequest<'_>) -> Vec<i32> {
        if !request.allow_year_fallback {
            return vec![request.base_year];
        }
        match self.years.iter().position(|&y| y == request.base_year) {
            Some(idx) => self.years[idx..].to_vec(),
            None => vec![request.base_year],
        }
    }
}

fn decode_image(response: &FetchResponse) -> Option<DynamicImage> {
    if !response.is_image() {
        return None;
    }
    image::load_from_memory(&response.body).ok()
}

// -- Tests -------------------------------------------------------------------


#[cfg(test)]
mod tests {

    use super::testing::*;
    use super::*;
    use crate::classify::BannerDetector;

    fn region() -> Region {
        Region::new("Testlandia", "https://example.org/map/{year}/{week}")
    }

    fn week(n: u32) -> Week {
        Week::new(n).unwrap()
    }

    fn retriever(stub: StubFetch, years: Vec<i32>) -> Retriever<StubFetch, BannerDetector> {
        Retriever::without_delays(stub, BannerDetector::default(), years)
    }

    #[tokio::test]
    async fn should_find_first_valid_week() {
        // Weeks 30 and 29 carry the banner, 28 has data.
        let stub = StubFetch::new(|url| {
            if url.ends_with("/30") || url.ends_with("/29") {
                StubReply::Response(image_response(banner_png()))
            } else {
                StubReply::Response(image_response(data_png()))
            }
        });
        let retriever = retriever(stub, vec![2025, 2024]);

        let found = retriever
            .find_available_week(&region(), week(30), 10)
            .await
            .unwrap();

        assert_eq!(found, week(28));
        assert_eq!(retriever.fetcher.call_count(), 3);
        assert!(retriever.fetcher.calls()[0].contains("/2025/30"));
    }

    #[tokio::test]
    async fn should_fail_probe_when_lookback_exhausts() {
        let stub = StubFetch::new(|_| StubReply::Response(image_response(banner_png())));
        let retriever = retriever(stub, vec![2025]);

        let result = retriever.find_available_week(&region(), week(20), 4).await;

        assert!(result.is_err());
        assert_eq!(retriever.fetcher.call_count(), 5);
    }

    #[tokio::test]
    async fn should_probe_idempotently() {
        let stub = StubFetch::new(|url| {
            if url.ends_with("/18") {
                StubReply::Response(image_response(data_png()))
            } else {
                StubReply::Response(image_response(banner_png()))
            }
        });
        let retriever = retriever(stub, vec![2025]);

        let first = retriever
            .find_available_week(&region(), week(20), 10)
            .await
            .unwrap();
        let second = retriever
            .find_available_week(&region(), week(20), 10)
            .await
            .unwrap();

        assert_eq!(first, week(18));
        assert_eq!(second, first);
        let calls = retriever.fetcher.calls();
        assert_eq!(&calls[..3], &calls[3..]);
    }

    #[tokio::test]
    async fn should_not_cross_years_without_fallback() {
        // Everything misses: a non-first base year must fail without ever
        // probing another year.
        let stub = StubFetch::new(|_| StubReply::Response(image_response(banner_png())));
        let retriever = retriever(stub, vec![2025, 2024, 2023]);
        let region = region();
        let request = RetrievalRequest {
            region: &region,
            base_year: 2024,
            start_week: week(10),
            max_lookback_weeks: 3,
            allow_year_fallback: false,
        };

        let result = retriever.download_with_fallback(&request).await;

        assert!(matches!(
            result,
            RetrievalResult::Failure { base_year: 2024, .. }
        ));
        let calls = retriever.fetcher.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|url| url.contains("/2024/")));
    }

    #[tokio::test]
    async fn should_fall_back_to_older_years_in_order() {
        // 2025 has no data at all, 2024 satisfies the original target week.
        let stub = StubFetch::new(|url| {
            if url.contains("/2025/") {
                StubReply::Response(image_response(banner_png()))
            } else {
                StubReply::Response(image_response(data_png()))
            }
        });
        let retriever = retriever(stub, vec![2025, 2024, 2023]);
        let region = region();
        let request = RetrievalRequest {
            region: &region,
            base_year: 2025,
            start_week: week(15),
            max_lookback_weeks: 2,
            allow_year_fallback: true,
        };

        let result = retriever.download_with_fallback(&request).await;

        match result {
            RetrievalResult::Success { year, week: w, .. } => {
                assert_eq!(year, 2024);
                // The week countdown restarts at the original target week
                // for the new year.
                assert_eq!(w, week(15));
            }
            RetrievalResult::Failure { .. } => panic!("expected success"),
        }
        let calls = retriever.fetcher.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[3].contains("/2024/15"));
    }

    #[tokio::test]
    async fn should_terminate_after_exact_attempt_count() {
        // Every probe is a network error: candidate_years x (lookback + 1)
        // attempts, then a definitive failure.
        let stub = StubFetch::new(|_| StubReply::NetworkError);
        let retriever = retriever(stub, vec![2025, 2024, 2023, 2022]);
        let region = region();
        let request = RetrievalRequest {
            region: &region,
            base_year: 2025,
            start_week: week(33),
            max_lookback_weeks: 2,
            allow_year_fallback: true,
        };

        let result = retriever.download_with_fallback(&request).await;

        assert!(matches!(result, RetrievalResult::Failure { .. }));
        assert_eq!(retriever.fetcher.call_count(), 4 * 3);
    }

    #[tokio::test]
    async fn should_wrap_week_countdown_below_one() {
        let stub = StubFetch::new(|url| {
            if url.ends_with("/53") {
                StubReply::Response(image_response(data_png()))
            } else {
                StubReply::Response(image_response(banner_png()))
            }
        });
        let retriever = retriever(stub, vec![2025]);
        let region = region();
        let request = RetrievalRequest {
            region: &region,
            base_year: 2025,
            start_week: week(1),
            max_lookback_weeks: 1,
            allow_year_fallback: true,
        };

        let result = retriever.download_with_fallback(&request).await;

        match result {
            RetrievalResult::Success { year, week: w, .. } => {
                assert_eq!(year, 2025);
                assert_eq!(w, week(53));
            }
            RetrievalResult::Failure { .. } => panic!("expected success"),
        }
        let calls = retriever.fetcher.calls();
        assert!(calls[0].contains("/2025/1"));
        assert!(calls[1].contains("/2025/53"));
    }

    #[tokio::test]
    async fn should_treat_html_and_undecodable_bodies_as_misses() {
        // Week 12 returns HTML, week 11 a corrupt body, week 10 real data.
        let stub = StubFetch::new(|url| {
            if url.ends_with("/12") {
                StubReply::Response(html_response())
            } else if url.ends_with("/11") {
                let mut broken = image_response(data_png());
                broken.body.truncate(8);
                StubReply::Response(broken)
            } else {
                StubReply::Response(image_response(data_png()))
            }
        });
        let retriever = retriever(stub, vec![2025]);
        let region = region();
        let request = RetrievalRequest {
            region: &region,
            base_year: 2025,
            start_week: week(12),
            max_lookback_weeks: 5,
            allow_year_fallback: false,
        };

        let result = retriever.download_with_fallback(&request).await;

        match result {
            RetrievalResult::Success { week: w, .. } => assert_eq!(w, week(10)),
            RetrievalResult::Failure { .. } => panic!("expected success"),
        }
    }
}
