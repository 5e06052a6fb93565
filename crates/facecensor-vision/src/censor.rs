//! Pixelation of face regions.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::detector::FaceRect;

/// Smallest pixelation block, in pixels.
pub const MIN_BLOCK_SIZE: u32 = 8;

/// Region to pixelate, already clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, at least 1.
    pub width: u32,
    /// Height, at least 1.
    pub height: u32,
}

/// Grow `rect` by a quarter of its longer side on every edge and clip the
/// result to a `width × height` image.
///
/// Returns `None` when the clipped region is empty.
#[must_use]
pub fn padded_region(rect: &FaceRect, width: u32, height: u32) -> Option<Region> {
    let pad = rect.width.max(rect.height) / 4;

    let x0 = rect.x.saturating_sub(pad);
    let y0 = rect.y.saturating_sub(pad);
    let x1 = rect.x.saturating_add(rect.width).saturating_add(pad).min(width);
    let y1 = rect.y.saturating_add(rect.height).saturating_add(pad).min(height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Region {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// Pixelation block size for a `width × height` region.
#[must_use]
pub fn block_size(width: u32, height: u32) -> u32 {
    (width.min(height) / 6).max(MIN_BLOCK_SIZE)
}

/// Replace one region with a blocky version of itself.
fn pixelate(image: &mut RgbaImage, region: Region) {
    let Region {
        x,
        y,
        width,
        height,
    } = region;
    let block = block_size(width, height);

    let patch = imageops::crop_imm(&*image, x, y, width, height).to_image();
    let small = imageops::resize(
        &patch,
        (width / block).max(1),
        (height / block).max(1),
        FilterType::Triangle,
    );
    let blocky = imageops::resize(&small, width, height, FilterType::Nearest);
    imageops::replace(image, &blocky, i64::from(x), i64::from(y));
}

/// Pixelate every face rectangle in place.
///
/// Returns the number of regions censored; rectangles that fall entirely
/// outside the image are skipped and not counted.
pub fn censor(image: &mut RgbaImage, rects: &[FaceRect]) -> u32 {
    let (width, height) = image.dimensions();
    let mut applied = 0;
    for rect in rects {
        if let Some(region) = padded_region(rect, width, height) {
            pixelate(image, region);
            applied += 1;
        }
    }
    applied
}
