//! Company logo placement on report covers.

use std::path::Path;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::{Alignment, Mm, Scale};
use image::GenericImageView;

use crate::layout::{mm, mm_to_f64};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

/// Natural width in millimetres of `image` when printed at `dpi`.
pub fn natural_width_mm(image: &image::DynamicImage, dpi: f64) -> f64 {
    let (px_width, _) = image.dimensions();
    MM_PER_INCH * f64::from(px_width) / dpi
}

/// Loads an image from the given path, guessing its format from the contents.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open logo file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine logo image format")?
        .decode()
        .with_context(|| format!("Failed to decode logo file {}", path.display()))
}

/// Scale factor that renders an image of `natural_mm` width at `width`.
pub fn scale_for_width(natural_mm: f64, width: Mm) -> f64 {
    if natural_mm > f64::EPSILON {
        mm_to_f64(width) / natural_mm
    } else {
        1.0
    }
}

/// Builds a logo element scaled to `width_mm` and aligned as requested.
pub fn logo(
    image: image::DynamicImage,
    width_mm: f64,
    alignment: Alignment,
) -> Result<Image, Error> {
    let natural = natural_width_mm(&image, DEFAULT_IMAGE_DPI);
    let scale = scale_for_width(natural, mm(width_mm));
    let mut element = Image::from_dynamic_image(image)?;
    element.set_alignment(alignment);
    element.set_scale(Scale::new(scale, scale));
    Ok(element)
}

/// Loads `path` and builds a logo element from it.
pub fn logo_from_path(
    path: impl AsRef<Path>,
    width_mm: f64,
    alignment: Alignment,
) -> Result<Image, Error> {
    logo(decode_image_from_path(path)?, width_mm, alignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb};

    #[test]
    fn natural_width_follows_dpi() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(600, 10, Rgb([0, 0, 0])));
        let width = natural_width_mm(&image, 300.0);
        assert!((width - 50.8).abs() < 1e-9);
        assert!((scale_for_width(width, mm(25.4)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_width_images_are_not_scaled() {
        assert_eq!(scale_for_width(0.0, mm(40.0)), 1.0);
    }

    #[test]
    fn missing_logo_reports_the_path() {
        let err = decode_image_from_path("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }
}
