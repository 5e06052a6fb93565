use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use facecensor_core::MediaType;

use crate::error::{Result, VisionError};

/// JPEG output quality (0-100).
pub const JPEG_QUALITY: u8 = 90;

/// Decode input bytes into a `DynamicImage`.
///
/// # Errors
///
/// - `VisionError::Decode` if the bytes are not a supported image.
/// - `VisionError::ZeroDimensions` for an empty image.
pub fn decode(input: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(input).map_err(|e| VisionError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(VisionError::ZeroDimensions);
    }
    Ok(image)
}

/// Encode an RGBA image in the given format.
///
/// JPEG has no alpha channel, so the alpha is dropped for it.
///
/// # Errors
///
/// Returns `VisionError::Encode` if the encoder fails.
pub fn encode(image: &RgbaImage, media_type: MediaType) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let (width, height) = image.dimensions();

    let written = match media_type {
        MediaType::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        MediaType::Png => PngEncoder::new(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        // The pure-Rust WebP encoder only supports lossless output.
        MediaType::Webp => WebPEncoder::new_lossless(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    written.map_err(|e| VisionError::Encode(e.to_string()))?;

    Ok(buffer)
}
