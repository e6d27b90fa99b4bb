//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the rest of the
//! crate needs from the filesystem: identify, load, and save. Ratio matching,
//! fitting, and compositing never touch files; they only see decoded images.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure-Rust codecs.

use crate::types::Dimensions;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image I/O backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where the format allows.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image file.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode an image, choosing the format from the path's extension.
    fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError>;
}
