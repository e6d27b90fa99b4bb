//! # Banner Gal
//!
//! Pads images onto the closest standard aspect ratio without cropping or
//! resampling. Each image is matched to a ratio from a curated catalog, the
//! ratio is scaled up to the smallest integer multiple that covers the image,
//! and the image is centered on a background of that size.
//!
//! # Architecture: Match → Fit → Composite
//!
//! ```text
//! 1. Match      124x169     →  3:4        (closest catalog ratio, exact integer compare)
//! 2. Fit        3:4         →  129x172    (smallest multiple covering the image)
//! 3. Composite  background  →  padded     (image pasted at the centered offset)
//! ```
//!
//! Steps 1 and 2 are pure arithmetic on dimensions and can be previewed
//! without decoding pixels (`banner-gal fit`). Step 3 works on decoded images
//! in the canvas preset's pixel mode.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Ratio matching, size fitting, pixel buffers, and the `image`-crate backend |
//! | [`gallery`] | Canvas preset plus the ordered list of padded images |
//! | [`batch`] | Parallel padding of files and directories, with a JSON manifest |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`types`] | `Dimensions` and `AspectRatio`, shared by every stage |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Exact Ratio Comparison
//!
//! Closeness is `(w / rx) / (h / ry)`, compared by cross-multiplying in `u64`
//! rather than in floating point. The chosen ratio is therefore identical
//! for `124x169` and `248x338`, and ties always go to the earlier catalog
//! entry.
//!
//! ## Strict Domination
//!
//! By default a fitted size is strictly larger than the image on both axes,
//! so every image gets at least one pixel of padding per axis, even one that
//! already has standard proportions. `[fit] domination = "inclusive"` lets
//! such an image keep its size.
//!
//! ## Typed Failures
//!
//! Invalid inputs, exhausted searches, overflow, and allocation failures are
//! each their own error variant with the cause attached. Nothing is reported
//! through sentinel sizes or boolean flags.

pub mod batch;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod output;
pub mod types;
