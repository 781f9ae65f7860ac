//! Image thumbnail rendering.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::error::MediaResult;

/// Width that keeps the aspect ratio of a `width`x`height` image scaled to
/// `target_height`. Never zero.
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return target_height.max(1);
    }
    let scaled = (u64::from(width) * u64::from(target_height) + u64::from(height) / 2)
        / u64::from(height);
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

/// Decode an image (honoring its EXIF orientation), scale it to
/// `target_height` keeping the aspect ratio and encode it as JPEG.
///
/// CPU bound; call from `spawn_blocking`.
pub fn render_thumbnail(data: &[u8], target_height: u32, quality: u8) -> MediaResult<Vec<u8>> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    let width = scaled_width(image.width(), image.height(), target_height);
    let resized = image.resize_exact(width, target_height.max(1), FilterType::Triangle);

    let mut out = Vec::new();
    resized
        .to_rgb8()
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)))?;
    Ok(out)
}
