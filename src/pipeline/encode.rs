//! Image encoding: `DynamicImage` → JPEG or PNG bytes.
//!
//! JPEG has no alpha channel, so the bitmap is flattened to RGB first. PNG
//! keeps whatever channels the renderer produced.

use crate::config::RasterFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder};
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page in `format`; `jpeg_quality` (1–100) applies to JPEG only.
pub fn encode_page(
    img: &DynamicImage,
    format: RasterFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Jpeg => {
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
        RasterFormat::Png => {
            let rgba = img.to_rgba8();
            PngEncoder::new(Cursor::new(&mut buf)).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ExtendedColorType::Rgba8,
            )?;
        }
    }

    debug!(
        "Encoded {}x{} page as {:?} → {} bytes",
        img.width(),
        img.height(),
        format,
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    fn red_square(size: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn encode_png_is_lossless() {
        let img = red_square(10);
        let bytes = encode_page(&img, RasterFormat::Png, 95).expect("encode should succeed");
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (10, 10));
        assert_eq!(decoded.to_rgba8().get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn encode_jpeg_drops_alpha_and_keeps_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            24,
            16,
            Rgba([0, 128, 255, 100]),
        ));
        let bytes = encode_page(&img, RasterFormat::Jpeg, 95).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (24, 16));
    }

    #[test]
    fn lower_quality_jpeg_is_not_larger() {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
        let img = DynamicImage::ImageRgba8(img);
        let high = encode_page(&img, RasterFormat::Jpeg, 95).unwrap();
        let low = encode_page(&img, RasterFormat::Jpeg, 20).unwrap();
        assert!(low.len() <= high.len());
    }
}
