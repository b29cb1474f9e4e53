//! Concatenation of map images onto a white canvas.

use image::imageops::overlay;
use image::{DynamicImage, Rgb, RgbImage};

const FILL: Rgb<u8> = Rgb([255, 255, 255]);

/// Concatenates images left to right, center-aligned vertically.
pub fn combine_horizontal(images: &[DynamicImage]) -> RgbImage {
    let max_height = images.iter().map(|i| i.height()).max().unwrap_or(1);
    let total_width = images.iter().map(|i| i.width()).sum::<u32>().max(1);

    let mut canvas = RgbImage::from_pixel(total_width, max_height, FILL);
    let mut x = 0i64;
    for image in images {
        let y = (max_height - image.height()) / 2;
        overlay(&mut canvas, &image.to_rgb8(), x, y as i64);
        x += image.width() as i64;
    }
    canvas
}

/// Concatenates images top to bottom, center-aligned horizontally.
pub fn combine_vertical(images: &[DynamicImage]) -> RgbImage {
    let max_width = images.iter().map(|i| i.width()).max().unwrap_or(1);
    let total_height = images.iter().map(|i| i.height()).sum::<u32>().max(1);

    let mut canvas = RgbImage::from_pixel(max_width, total_height, FILL);
    let mut y = 0i64;
    for image in images {
        let x = (max_width - image.width()) / 2;
        overlay(&mut canvas, &image.to_rgb8(), x as i64, y);
        y += image.height() as i64;
    }
    canvas
}

// -- Tests -------------------------------------------------------------------
