//! Parameter types for size fitting.
//!
//! These types describe *how* a fitted size is searched for, not the search
//! itself. They are the interface between [`config`](crate::config) (which
//! reads them from `config.toml`) and [`calculations`](super::calculations)
//! (which does the arithmetic).
//!
//! ## Types
//!
//! - [`Domination`] — Whether the fitted size must be `>=` or strictly `>` the image on both axes.
//! - [`FitStrategy`] — Closed-form ceiling division, or the bounded multiplier scan.
//! - [`FitPolicy`] — Both of the above, passed to [`fit_size`](super::fit_size).

use serde::{Deserialize, Serialize};

/// Default multiplier bound for [`FitStrategy::Scan`].
pub const DEFAULT_SCAN_LIMIT: u32 = 1000;

/// How a candidate size must relate to the image on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domination {
    /// `candidate >= image` on both axes. An image that already is a ratio
    /// multiple keeps its size.
    Inclusive,
    /// `candidate > image` on both axes. Every image gets at least one pixel
    /// of padding per axis.
    #[default]
    Strict,
}

impl Domination {
    /// Whether `candidate` covers `target` on one axis.
    pub fn covers(self, candidate: u64, target: u64) -> bool {
        match self {
            Domination::Inclusive => candidate >= target,
            Domination::Strict => candidate > target,
        }
    }
}

/// How the ratio multiplier is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitStrategy {
    /// `i = max(ceil(w / rx), ceil(h / ry))` (or the strict equivalent), O(1).
    #[default]
    Direct,
    /// Linear scan over `0..limit`, accepting only candidates that move
    /// closer to the target on both axes.
    Scan { limit: u32 },
}

/// Full specification of a size fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FitPolicy {
    pub domination: Domination,
    pub strategy: FitStrategy,
}

impl FitPolicy {
    pub fn new(domination: Domination, strategy: FitStrategy) -> Self {
        Self {
            domination,
            strategy,
        }
    }

    /// The bounded scan with the historical default limit.
    pub fn scan() -> Self {
        Self {
            domination: Domination::default(),
            strategy: FitStrategy::Scan {
                limit: DEFAULT_SCAN_LIMIT,
            },
        }
    }
}
