use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma};

use crate::config::OcrConfig;
use crate::error::{DocLensError, Result};
use crate::loader::LoadedImage;

/// Prepare a loaded image for OCR.
///
/// Rejects images below the configured minimum dimension, downsizes anything
/// above the maximum (aspect ratio kept), flattens to 8-bit grayscale without
/// alpha and stretches the histogram to the full range. The result is
/// re-encoded as PNG.
pub fn preprocess_image(image: &LoadedImage, config: &OcrConfig) -> Result<LoadedImage> {
    let decoded = image::load_from_memory(&image.bytes)
        .map_err(|e| DocLensError::Image(format!("failed to decode image: {e}")))?;

    let (width, height) = decoded.dimensions();
    let min = config.min_image_dimension;
    if width < min || height < min {
        return Err(DocLensError::Image(format!(
            "image too small: {width}x{height}, minimum {min}x{min}"
        )));
    }

    let gray = resize_if_needed(decoded, config.max_image_dimension).to_luma8();
    let gray = stretch_contrast(gray);
    let (width, height) = gray.dimensions();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| DocLensError::Image(format!("failed to encode image: {e}")))?;

    Ok(LoadedImage {
        path: image.path.clone(),
        bytes,
        format: ImageFormat::Png,
        mime_type: "image/png".to_string(),
        width,
        height,
    })
}

fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = max_dim as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Map the darkest pixel to 0 and the lightest to 255.
fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min_val, max_val) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if max_val <= min_val {
        return gray;
    }

    let range = (max_val - min_val) as f32;
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0];
        Luma([((value - min_val) as f32 / range * 255.0).round() as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::decode_image;
    use std::path::Path;

    fn loaded(img: DynamicImage, format: ImageFormat) -> LoadedImage {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        decode_image(Path::new("test-image"), bytes).unwrap()
    }

    fn config() -> OcrConfig {
        OcrConfig::default()
    }

    #[test]
    fn test_preprocess_outputs_grayscale_png() {
        let image = loaded(DynamicImage::new_rgba8(100, 100), ImageFormat::Png);

        let processed = preprocess_image(&image, &config()).unwrap();

        assert_eq!(processed.format, ImageFormat::Png);
        let decoded = image::load_from_memory(&processed.bytes).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_reject_tiny_image() {
        let image = loaded(DynamicImage::new_rgb8(10, 200), ImageFormat::Png);

        let err = preprocess_image(&image, &config()).unwrap_err().to_string();

        assert!(err.contains("too small"), "unexpected error: {err}");
        assert!(err.contains("10x200"), "unexpected error: {err}");
    }

    #[test]
    fn test_min_dimension_exactly_at_limit() {
        let image = loaded(DynamicImage::new_rgb8(50, 50), ImageFormat::Jpeg);
        assert!(preprocess_image(&image, &config()).is_ok());
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let config = OcrConfig {
            max_image_dimension: 500,
            ..config()
        };
        let image = loaded(DynamicImage::new_rgb8(2000, 1000), ImageFormat::Png);

        let processed = preprocess_image(&image, &config).unwrap();

        assert_eq!((processed.width, processed.height), (500, 250));
    }

    #[test]
    fn test_resize_keeps_aspect_ratio_for_tall_images() {
        let resized = resize_if_needed(DynamicImage::new_rgb8(500, 2000), 1000);
        assert_eq!(resized.dimensions(), (250, 1000));
    }

    #[test]
    fn test_resize_skips_small_images() {
        let resized = resize_if_needed(DynamicImage::new_rgb8(500, 500), 1000);
        assert_eq!(resized.dimensions(), (500, 500));
    }

    #[test]
    fn test_stretch_contrast_uses_full_range() {
        let mut gray = GrayImage::new(10, 1);
        for (x, _, pixel) in gray.enumerate_pixels_mut() {
            *pixel = Luma([100 + x as u8 * 5]);
        }

        let stretched = stretch_contrast(gray);

        assert_eq!(stretched.get_pixel(0, 0)[0], 0);
        assert_eq!(stretched.get_pixel(9, 0)[0], 255);
    }

    #[test]
    fn test_stretch_contrast_leaves_flat_image() {
        let gray = GrayImage::from_pixel(4, 4, Luma([128]));
        let stretched = stretch_contrast(gray);
        assert!(stretched.pixels().all(|p| p[0] == 128));
    }
}
