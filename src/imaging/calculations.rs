//! Pure calculation functions for ratio matching and size fitting.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! - [`RatioMatcher::closest`] picks the catalog ratio closest to an image's proportions.
//! - [`fit_size`] finds the smallest multiple of that ratio covering the image.
//! - [`centered_offset`] positions the image on the fitted background.

use super::params::{Domination, FitPolicy, FitStrategy};
use crate::types::{AspectRatio, Dimensions};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    #[error("Invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid aspect ratio {0}: both components must be positive")]
    InvalidRatio(AspectRatio),
    #[error("Ratio catalog is empty")]
    EmptyCatalog,
    #[error("Scan limit must be positive")]
    InvalidLimit,
    #[error("No multiple of {ratio} below {limit} covers the image")]
    NoFitFound { ratio: AspectRatio, limit: u32 },
    #[error("Multiple {multiplier} of {ratio} does not fit in 32-bit pixel dimensions")]
    Overflow { ratio: AspectRatio, multiplier: u64 },
}

/// Canonical landscape ratios, in matching priority order.
pub const DEFAULT_CATALOG: [AspectRatio; 10] = [
    AspectRatio::new(32, 9),
    AspectRatio::new(21, 9),
    AspectRatio::new(16, 9),
    AspectRatio::new(16, 10),
    AspectRatio::new(4, 3),
    AspectRatio::new(1, 1),
    AspectRatio::new(5, 4),
    AspectRatio::new(3, 2),
    AspectRatio::new(5, 3),
    AspectRatio::new(3, 1),
];

/// The ratio chosen for an image and how well it matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub ratio: AspectRatio,
    /// `(width / rx) / (height / ry)`; exactly `1.0` for a perfect match.
    pub closeness: f64,
}

/// `|1 - r|` held as the exact fraction `|y*rx - x*ry| / (y*rx)`.
#[derive(Debug, Clone, Copy)]
struct Deviation {
    num: u64,
    den: u64,
}

impl Deviation {
    fn of(sizes: Dimensions, ratio: AspectRatio) -> Self {
        let scaled_width = u64::from(sizes.width) * u64::from(ratio.y);
        let scaled_height = u64::from(sizes.height) * u64::from(ratio.x);
        Self {
            num: scaled_width.abs_diff(scaled_height),
            den: scaled_height,
        }
    }

    fn is_less_than(self, other: Deviation) -> bool {
        u128::from(self.num) * u128::from(other.den) < u128::from(other.num) * u128::from(self.den)
    }
}

/// Selects the closest aspect ratio from an immutable candidate list.
///
/// The candidate list is the catalog followed by each entry's reciprocal, so
/// both landscape and portrait images have a match. Duplicates (1:1 and its
/// own reciprocal) are kept; the first one encountered wins ties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioMatcher {
    candidates: Vec<AspectRatio>,
}

impl Default for RatioMatcher {
    fn default() -> Self {
        let mut candidates = DEFAULT_CATALOG.to_vec();
        candidates.extend(DEFAULT_CATALOG.iter().map(|r| r.reciprocal()));
        Self { candidates }
    }
}

impl RatioMatcher {
    /// Build a matcher from a catalog of ratios.
    pub fn new(catalog: &[AspectRatio], include_reciprocals: bool) -> Result<Self, FitError> {
        if catalog.is_empty() {
            return Err(FitError::EmptyCatalog);
        }
        if let Some(&bad) = catalog.iter().find(|r| r.x == 0 || r.y == 0) {
            return Err(FitError::InvalidRatio(bad));
        }
        let mut candidates = catalog.to_vec();
        if include_reciprocals {
            candidates.extend(catalog.iter().map(|r| r.reciprocal()));
        }
        Ok(Self { candidates })
    }

    pub fn candidates(&self) -> &[AspectRatio] {
        &self.candidates
    }

    /// Find the candidate minimizing `|1 - r|` where `r = (x/rx) / (y/ry)`.
    ///
    /// The metric is not symmetric: stretching an image 2× scores `|1 - 2| = 1`
    /// while squeezing it 0.5× scores `0.5`. Candidates are compared exactly,
    /// so the result is invariant under uniform scaling of `sizes`.
    ///
    /// # Examples
    /// ```
    /// # use banner_gal::imaging::RatioMatcher;
    /// # use banner_gal::types::{AspectRatio, Dimensions};
    /// let matched = RatioMatcher::default().closest(Dimensions::new(1920, 1080)).unwrap();
    /// assert_eq!(matched.ratio, AspectRatio::new(16, 9));
    /// assert_eq!(matched.closeness, 1.0);
    /// ```
    pub fn closest(&self, sizes: Dimensions) -> Result<MatchResult, FitError> {
        if !sizes.is_positive() {
            return Err(FitError::InvalidDimensions {
                width: sizes.width,
                height: sizes.height,
            });
        }

        let mut best: Option<(AspectRatio, Deviation)> = None;
        for &ratio in &self.candidates {
            let deviation = Deviation::of(sizes, ratio);
            if best.is_none_or(|(_, current)| deviation.is_less_than(current)) {
                best = Some((ratio, deviation));
            }
        }
        let (ratio, _) = best.ok_or(FitError::EmptyCatalog)?;

        let closeness = (u64::from(sizes.width) * u64::from(ratio.y)) as f64
            / (u64::from(sizes.height) * u64::from(ratio.x)) as f64;
        Ok(MatchResult { ratio, closeness })
    }
}

/// Find the smallest multiple of `ratio` that covers `sizes` on both axes.
///
/// # Arguments
/// * `ratio` - The matched aspect ratio, in catalog units
/// * `sizes` - The image's native dimensions
/// * `policy` - Domination rule and search strategy
///
/// # Returns
/// * `i * (rx, ry)` for the smallest accepted multiplier `i`
///
/// # Examples
/// ```
/// # use banner_gal::imaging::{FitPolicy, fit_size};
/// # use banner_gal::types::{AspectRatio, Dimensions};
/// let fitted = fit_size(
///     AspectRatio::new(3, 4),
///     Dimensions::new(124, 169),
///     FitPolicy::default(),
/// ).unwrap();
/// assert_eq!(fitted, Dimensions::new(129, 172));
/// ```
pub fn fit_size(
    ratio: AspectRatio,
    sizes: Dimensions,
    policy: FitPolicy,
) -> Result<Dimensions, FitError> {
    if ratio.x == 0 || ratio.y == 0 {
        return Err(FitError::InvalidRatio(ratio));
    }
    if !sizes.is_positive() {
        return Err(FitError::InvalidDimensions {
            width: sizes.width,
            height: sizes.height,
        });
    }

    match policy.strategy {
        FitStrategy::Direct => fit_direct(ratio, sizes, policy.domination),
        FitStrategy::Scan { limit } => fit_scan(ratio, sizes, policy.domination, limit),
    }
}

fn fit_direct(
    ratio: AspectRatio,
    sizes: Dimensions,
    domination: Domination,
) -> Result<Dimensions, FitError> {
    let per_axis = |target: u32, unit: u32| {
        let (target, unit) = (u64::from(target), u64::from(unit));
        match domination {
            Domination::Inclusive => target.div_ceil(unit),
            Domination::Strict => target / unit + 1,
        }
    };
    let multiplier = per_axis(sizes.width, ratio.x).max(per_axis(sizes.height, ratio.y));

    u32::try_from(multiplier)
        .ok()
        .and_then(|m| ratio.scaled(m))
        .ok_or(FitError::Overflow { ratio, multiplier })
}

/// Bounded scan over `0..limit`.
///
/// A candidate is accepted only if it is closer than the previous best on
/// both axes, starting from `(0, 0)`. A first covering multiple that is at
/// least twice the image on some axis is therefore never accepted.
fn fit_scan(
    ratio: AspectRatio,
    sizes: Dimensions,
    domination: Domination,
    limit: u32,
) -> Result<Dimensions, FitError> {
    if limit == 0 {
        return Err(FitError::InvalidLimit);
    }
    let (w, h) = (u64::from(sizes.width), u64::from(sizes.height));

    let (mut best_x, mut best_y) = (0u64, 0u64);
    let mut accepted: Option<u64> = None;
    for i in 0..u64::from(limit) {
        let (x, y) = (i * u64::from(ratio.x), i * u64::from(ratio.y));
        let covers = domination.covers(x, w) && domination.covers(y, h);
        if covers && w.abs_diff(x) < w.abs_diff(best_x) && h.abs_diff(y) < h.abs_diff(best_y) {
            (best_x, best_y) = (x, y);
            accepted = Some(i);
        }
        // Past the first covering multiple every candidate moves away on both axes.
        if covers {
            break;
        }
    }

    let multiplier = accepted.ok_or(FitError::NoFitFound { ratio, limit })?;
    u32::try_from(multiplier)
        .ok()
        .and_then(|m| ratio.scaled(m))
        .ok_or(FitError::Overflow { ratio, multiplier })
}

/// Offset that centers `inner` on `outer`, rounding toward the top-left.
pub fn centered_offset(outer: Dimensions, inner: Dimensions) -> (u32, u32) {
    (
        outer.width.saturating_sub(inner.width) / 2,
        outer.height.saturating_sub(inner.height) / 2,
    )
}
