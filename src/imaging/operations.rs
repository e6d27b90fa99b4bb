//! High-level padding operations.
//!
//! These functions combine calculations with pixel work. [`plan_padding`]
//! decides what to build (ratio, fitted size, offset) without touching pixels;
//! [`pad_image`] executes a plan.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{FitError, MatchResult, RatioMatcher, centered_offset, fit_size};
use super::params::FitPolicy;
use super::pixels::{Fill, PixelBuffer, PixelError, PixelMode};
use crate::types::Dimensions;
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions, BackendError> {
    backend.identify(path)
}

/// Everything needed to pad one image, computed from its size alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PadPlan {
    /// Native image size.
    pub source: Dimensions,
    pub matched: MatchResult,
    /// Background size: a multiple of `matched.ratio` covering `source`.
    pub fitted: Dimensions,
    /// Top-left corner of the image on the background.
    pub offset: (u32, u32),
}

/// Plan a padding operation without executing it.
pub fn plan_padding(
    matcher: &RatioMatcher,
    policy: FitPolicy,
    source: Dimensions,
) -> Result<PadPlan, FitError> {
    let matched = matcher.closest(source)?;
    let fitted = fit_size(matched.ratio, source, policy)?;
    Ok(PadPlan {
        source,
        matched,
        fitted,
        offset: centered_offset(fitted, source),
    })
}

/// Allocate the fitted background and paste `image` centered on it.
///
/// The image is converted into `mode` first; in `RGBA` its alpha channel is
/// composited over `background`.
pub fn pad_image(
    image: &DynamicImage,
    plan: &PadPlan,
    mode: PixelMode,
    background: &Fill,
) -> Result<PixelBuffer, PixelError> {
    let mut padded = PixelBuffer::new(plan.fitted, mode, background)?;
    let source = PixelBuffer::from_image(image, mode)?;
    padded.paste(&source, plan.offset)?;
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::types::AspectRatio;
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        }))
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_images(vec![("/test.png", gradient(192, 108))]);

        let dims = get_dimensions(&backend, Path::new("/test.png")).unwrap();
        assert_eq!(dims, Dimensions::new(192, 108));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("/test.png".to_string())]
        );
    }

    #[test]
    fn plan_portrait_sample() {
        let plan = plan_padding(
            &RatioMatcher::default(),
            FitPolicy::default(),
            Dimensions::new(124, 169),
        )
        .unwrap();

        assert_eq!(plan.matched.ratio, AspectRatio::new(3, 4));
        assert_eq!(plan.fitted, Dimensions::new(129, 172));
        assert_eq!(plan.offset, (2, 1));
    }

    #[test]
    fn plan_propagates_invalid_dimensions() {
        let result = plan_padding(
            &RatioMatcher::default(),
            FitPolicy::default(),
            Dimensions::new(0, 169),
        );
        assert!(matches!(result, Err(FitError::InvalidDimensions { .. })));
    }

    #[test]
    fn pad_reproduces_source_and_fills_the_rest() {
        let image = gradient(124, 169);
        let plan = plan_padding(
            &RatioMatcher::default(),
            FitPolicy::default(),
            Dimensions::new(124, 169),
        )
        .unwrap();
        let red = Fill::Channels(vec![255, 0, 0, 255]);

        let padded = pad_image(&image, &plan, PixelMode::Rgba, &red).unwrap();
        assert_eq!(padded.dimensions(), plan.fitted);

        let source = image.to_rgba8();
        let (ox, oy) = plan.offset;
        for y in 0..plan.fitted.height {
            for x in 0..plan.fitted.width {
                let px = padded.u8_pixel(x, y).unwrap();
                let inside = x >= ox && x < ox + 124 && y >= oy && y < oy + 169;
                if inside {
                    assert_eq!(px, &source.get_pixel(x - ox, y - oy).0[..]);
                } else {
                    assert_eq!(px, &[255, 0, 0, 255][..]);
                }
            }
        }
    }

    #[test]
    fn pad_rejects_background_for_wrong_mode() {
        let plan = plan_padding(
            &RatioMatcher::default(),
            FitPolicy::default(),
            Dimensions::new(16, 9),
        )
        .unwrap();
        let result = pad_image(
            &gradient(16, 9),
            &plan,
            PixelMode::Grayscale,
            &Fill::Channels(vec![0, 0, 0, 0]),
        );
        assert!(matches!(result, Err(PixelError::ChannelMismatch { .. })));
    }

    #[test]
    fn pad_into_lab_mode() {
        let plan = plan_padding(
            &RatioMatcher::default(),
            FitPolicy::default(),
            Dimensions::new(16, 9),
        )
        .unwrap();
        let white = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 9, Rgba([255; 4])));

        let padded = pad_image(&white, &plan, PixelMode::Lab, &Fill::transparent(PixelMode::Lab))
            .unwrap();
        assert_eq!(padded.dimensions(), Dimensions::new(32, 18));
        assert_eq!(padded.u8_pixel(0, 0), Some(&[0, 0, 0][..]));
        assert_eq!(padded.u8_pixel(8, 4), Some(&[255, 128, 128][..]));
    }
}
