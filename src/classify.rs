//! Heuristic detection of the upstream "Sorry, data are not available!" banner.
//!
//! The placeholder arrives as HTTP 200 with a valid image content type, so
//! the only distinguishing feature is the red banner text itself. This is a
//! best-effort classification, not ground truth: thresholds stay
//! configurable and the whole strategy is swappable behind [`Classify`].

use image::{DynamicImage, Rgb};

/// Outcome of classifying a decoded map image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Data,
    NoData,
}

/// Classification strategy for a decoded raster image.
pub trait Classify {
    fn classify(&self, image: &DynamicImage) -> Availability;
}

/// Pixel-color banner detector.
///
/// Inspects a horizontal band at the top and at the bottom of the image
/// (the banner moved between layouts) and counts pixels in a tolerant
/// "banner red" range. A small ratio of matches in either band is enough.
#[derive(Debug, Clone)]
pub struct BannerDetector {
    /// Fraction of image height inspected at each edge.
    pub band_fraction: f64,
    /// Lower bound for the red channel of a banner pixel.
    pub red_min: u8,
    /// Upper bound for the green channel of a banner pixel.
    pub green_max: u8,
    /// Upper bound for the blue channel of a banner pixel.
    pub blue_max: u8,
    /// Ratio of banner pixels to band area above which the image counts
    /// as "no data".
    pub ratio_threshold: f64,
}

impl Default for BannerDetector {
    fn default() -> Self {
        BannerDetector {
            band_fraction: 0.12,
            red_min: 180,
            green_max: 100,
            blue_max: 100,
            ratio_threshold: 0.00025,
        }
    }
}

impl BannerDetector {
    fn is_banner_red(&self, pixel: &Rgb<u8>) -> bool {
        let Rgb([r, g, b]) = *pixel;
        r >= self.red_min && g <= self.green_max && b <= self.blue_max
    }

    /// Red-pixel ratio over the rows `[row_start, row_end)`.
    fn band_red_ratio(&self, image: &image::RgbImage, row_start: u32, row_end: u32) -> f64 {
        let width = image.width();
        let mut red_pixels = 0u64;
        for y in row_start..row_end {
            for x in 0..width {
                if self.is_banner_red(image.get_pixel(x, y)) {
                    red_pixels += 1;
                }
            }
        }
        let area = (width as u64 * (row_end - row_start) as u64).max(1);
        red_pixels as f64 / area as f64
    }
}

impl Classify for BannerDetector {
    fn classify(&self, image: &DynamicImage) -> Availability {
        let rgb = image.to_rgb8();
        let height = rgb.height();
        let band = ((height as f64 * self.band_fraction) as u32).max(1);

        let bands = [(0, band.min(height)), (height.saturating_sub(band), height)];
        for (start, end) in bands {
            if self.band_red_ratio(&rgb, start, end) > self.ratio_threshold {
                return Availability::NoData;
            }
        }
        Availability::Data
    }
}

// -- Tests -------------------------------------------------------------------
