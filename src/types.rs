//! Shared value types used across all stages.
//!
//! These types flow from the ratio matcher through the size fitter into the
//! compositor, and are serialized into the batch `manifest.json`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pixel size: either an image's native size or a computed canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both components are non-zero.
    pub fn is_positive(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Number of pixels, or `None` if it does not fit in `usize`.
    pub fn area(self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}px", self.width, self.height)
    }
}

/// An aspect ratio as `x` units wide by `y` units high.
///
/// Ratios are kept in their catalog form (16:10 stays 16:10, not 8:5) because
/// the size fitter scales the pair itself: the smallest fitted canvas is a
/// multiple of exactly these units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    pub x: u32,
    pub y: u32,
}

impl AspectRatio {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The same ratio with the axes swapped (16:9 → 9:16).
    pub const fn reciprocal(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }

    /// `i * (x, y)`, or `None` on overflow.
    pub fn scaled(self, multiplier: u32) -> Option<Dimensions> {
        Some(Dimensions {
            width: self.x.checked_mul(multiplier)?,
            height: self.y.checked_mul(multiplier)?,
        })
    }
}

impl From<[u32; 2]> for AspectRatio {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}
