//! Region catalogue, year sequence and run settings.
//!
//! Regions map to NOAA STAR `imageMercator.php` URLs templated on
//! `{year}` and `{week}`. The set is fixed at startup.

use std::env;

use tracing::{info, warn};

use crate::week::Week;

pub const WEEK_ENV: &str = "VHI_WEEK";
pub const MAX_LOOKBACK_ENV: &str = "VHI_MAX_LOOKBACK";
pub const DEFAULT_MAX_LOOKBACK: u32 = 10;

/// A named map region and its upstream URL template.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    url_template: String,
}

impl Region {
    pub fn new(name: &str, url_template: &str) -> Self {
        Region {
            name: name.to_string(),
            url_template: url_template.to_string(),
        }
    }

    pub fn url(&self, year: i32, week: Week) -> String {
        self.url_template
            .replace("{year}", &year.to_string())
            .replace("{week}", &week.to_string())
    }
}

/// The Brazilian coffee-belt states, in reference order: the first region
/// is the one used by the week-validity probe.
pub fn regions() -> Vec<Region> {
    vec![
        Region::new(
            "Minas_Gerais",
            "https://www.star.nesdis.noaa.gov/smcd/emb/vci/VH/imageMercator.php?\
             &country=31,BRA&source=Blended&options=1,1,1,1,0,1,0,1,1\
             &provinceID=13&latlonRange=-22.922747,-51.045883,-14.233427,-39.856762\
             &title=VHI%20of%20current%20year&type=VHI&week={year},{week}",
        ),
        Region::new(
            "Sao_Paulo",
            "https://www.star.nesdis.noaa.gov/smcd/emb/vci/VH/imageMercator.php?\
             &country=31,BRA&source=Blended&options=1,1,1,1,0,1,0,1,1\
             &provinceID=25&latlonRange=-25.303192,-53.109604,-19.779652,-43.859108\
             &title=VHI%20of%20current%20year&type=VHI&week={year},{week}",
        ),
        Region::new(
            "Espirito_Santo",
            "https://www.star.nesdis.noaa.gov/smcd/emb/vci/VH/imageMercator.php?\
             &country=31,BRA&source=Blended&options=1,1,1,1,0,1,0,1,1\
             &provinceID=8&latlonRange=-21.297190,-41.878914,-17.891941,-39.6\
             &title=VHI%20of%20current%20year&type=VHI&week={year},{week}",
        ),
        Region::new(
            "Rondonia",
            "https://www.star.nesdis.noaa.gov/smcd/emb/vci/VH/imageMercator.php?\
             &country=31,BRA&source=Blended&options=1,1,1,1,0,1,0,1,1\
             &provinceID=22&latlonRange=-13.557581,-66.806473,-7.969309,-59.774288\
             &title=VHI%20of%20current%20year&type=VHI&week={year},{week}",
        ),
        Region::new(
            "Bahia",
            "https://www.star.nesdis.noaa.gov/smcd/emb/vci/VH/imageMercator.php?\
             &country=31,BRA&source=Blended&options=1,1,1,1,0,1,0,1,1\
             &provinceID=5&latlonRange=-18.349859,-46.617046,-8.533636,-37.349030\
             &title=VHI%20of%20current%20year&type=VHI&week={year},{week}",
        ),
    ]
}

/// Configured years, most recent first. Year fallback is only ever allowed
/// for the first entry.
pub fn years() -> Vec<i32> {
    vec![2025, 2024, 2023, 2022]
}

/// Cross-region vertical composites, (top, bottom) by region name.
pub fn vertical_pairs() -> Vec<(String, String)> {
    vec![
        ("Minas_Gerais".to_string(), "Sao_Paulo".to_string()),
        ("Rondonia".to_string(), "Espirito_Santo".to_string()),
    ]
}

/// Week/lookback settings for one run.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub initial_week: Week,
    pub max_lookback: u32,
}

impl Settings {
    /// Resolves settings from CLI arguments, falling back to the
    /// environment and then to defaults.
    pub fn resolve(week: Option<u32>, lookback: Option<u32>) -> Self {
        let initial_week = match week.and_then(Week::new) {
            Some(w) => {
                info!("initial week {} from command line", w);
                w
            }
            None => initial_week_from_env(env::var(WEEK_ENV).ok().as_deref()),
        };
        let max_lookback = lookback
            .unwrap_or_else(|| max_lookback_from_env(env::var(MAX_LOOKBACK_ENV).ok().as_deref()));

        Settings {
            initial_week,
            max_lookback,
        }
    }
}

/// Lenient parse of the `VHI_WEEK` override: anything out of range falls
/// back to the current ISO week with a warning rather than aborting.
fn initial_week_from_env(value: Option<&str>) -> Week {
    if let Some(raw) = value {
        let raw = raw.trim();
        if !raw.is_empty() {
            match raw.parse::<u32>().ok().and_then(Week::new) {
                Some(week) => {
                    info!("initial week {} from {}", week, WEEK_ENV);
                    return week;
                }
                None => {
                    warn!("invalid {} ({:?}), using current ISO week", WEEK_ENV, raw);
                }
            }
        }
    }
    let week = Week::current_sao_paulo();
    info!("current ISO week (America/Sao_Paulo): {}", week);
    week
}

fn max_lookback_from_env(value: Option<&str>) -> u32 {
    value
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_LOOKBACK)
}

// -- Tests -------------------------------------------------------------------
