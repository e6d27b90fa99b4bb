//! The gallery: a canvas preset and the padded images built for it.
//!
//! A [`Gallery`] is created once from a [`GalleryConfig`]. It owns the canvas
//! buffer (size and pixel mode), the ratio matcher, and the fit policy. Each
//! image added to it goes through the same three steps:
//!
//! ```text
//! image dims ──RatioMatcher──▶ ratio ──fit_size──▶ fitted size
//!                                                       │
//! background fill ──▶ PixelBuffer(fitted, canvas mode) ─┴─▶ paste at centered offset
//! ```
//!
//! Results are appended in order and never reordered or removed. The canvas
//! itself is never drawn on; it only fixes the mode every padded image uses.

use crate::config::GalleryConfig;
use crate::imaging::{
    Fill, FitError, FitPolicy, PadPlan, PixelBuffer, PixelError, PixelMode, RatioMatcher,
    pad_image, plan_padding,
};
use crate::types::Dimensions;
use image::DynamicImage;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Failed to allocate canvas: {0}")]
    Canvas(#[source] PixelError),
    #[error("Size fitting failed: {0}")]
    Fit(#[from] FitError),
    #[error("Composition failed: {0}")]
    CompositionFailure(#[source] PixelError),
}

/// One image padded onto its fitted background.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedImage {
    pub plan: PadPlan,
    pub buffer: PixelBuffer,
}

impl PaddedImage {
    /// Render for saving.
    pub fn to_image(&self) -> Result<DynamicImage, PixelError> {
        self.buffer.to_image()
    }
}

pub struct Gallery {
    canvas: PixelBuffer,
    matcher: RatioMatcher,
    policy: FitPolicy,
    images: Vec<PaddedImage>,
}

impl Gallery {
    /// Allocate the canvas and build the matcher from `config`.
    pub fn new(config: &GalleryConfig) -> Result<Self, GalleryError> {
        let mode = config.canvas.mode;
        let canvas = PixelBuffer::new(config.canvas_dimensions(), mode, &Fill::transparent(mode))
            .map_err(GalleryError::Canvas)?;
        Ok(Self::with_parts(canvas, config.matcher()?, config.fit_policy()))
    }

    pub fn with_parts(canvas: PixelBuffer, matcher: RatioMatcher, policy: FitPolicy) -> Self {
        Self {
            canvas,
            matcher,
            policy,
            images: Vec::new(),
        }
    }

    /// Ratio, fitted size, and offset for an image of `dims`, without pixels.
    pub fn plan(&self, dims: Dimensions) -> Result<PadPlan, GalleryError> {
        Ok(plan_padding(&self.matcher, self.policy, dims)?)
    }

    /// Pad `image` without appending it.
    pub fn prepare(&self, image: &DynamicImage, background: &Fill) -> Result<PaddedImage, GalleryError> {
        let plan = self.plan(Dimensions::new(image.width(), image.height()))?;
        let buffer = pad_image(image, &plan, self.mode(), background)
            .map_err(GalleryError::CompositionFailure)?;
        Ok(PaddedImage { plan, buffer })
    }

    /// Pad `image` and append it to the gallery.
    pub fn add_image(
        &mut self,
        image: &DynamicImage,
        background: &Fill,
    ) -> Result<&PaddedImage, GalleryError> {
        let padded = self.prepare(image, background)?;
        self.push(padded)
    }

    /// Pad `images` in parallel and append the successes in input order.
    ///
    /// Each result holds the appended image's gallery index, or the error
    /// for that input.
    pub fn add_images(
        &mut self,
        images: &[DynamicImage],
        background: &Fill,
    ) -> Vec<Result<usize, GalleryError>> {
        let prepared: Vec<Result<PaddedImage, GalleryError>> = images
            .par_iter()
            .map(|image| self.prepare(image, background))
            .collect();

        prepared
            .into_iter()
            .map(|result| {
                let padded = result?;
                self.push(padded)?;
                Ok(self.images.len() - 1)
            })
            .collect()
    }

    /// Append an already padded image. Its mode must be the canvas mode.
    pub fn push(&mut self, padded: PaddedImage) -> Result<&PaddedImage, GalleryError> {
        if padded.buffer.mode() != self.mode() {
            return Err(GalleryError::CompositionFailure(PixelError::ModeMismatch {
                dst: self.mode(),
                src: padded.buffer.mode(),
            }));
        }
        let index = self.images.len();
        self.images.push(padded);
        Ok(&self.images[index])
    }

    pub fn images(&self) -> &[PaddedImage] {
        &self.images
    }

    pub fn canvas(&self) -> &PixelBuffer {
        &self.canvas
    }

    pub fn mode(&self) -> PixelMode {
        self.canvas.mode()
    }

    pub fn matcher(&self) -> &RatioMatcher {
        &self.matcher
    }

    pub fn policy(&self) -> FitPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
