//! Image padding: ratio matching, size fitting, and pixel compositing.
//!
//! | Operation | Where |
//! |---|---|
//! | **Identify / decode / encode** | [`RustBackend`] on the `image` crate |
//! | **Closest ratio** | [`RatioMatcher::closest`], exact integer comparison |
//! | **Fitted size** | [`fit_size`], direct or bounded scan |
//! | **Background + paste** | [`PixelBuffer`], one buffer per pixel mode |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for ratio and dimension math (unit testable)
//! - **Parameters**: Data structures describing how sizes are fitted
//! - **Pixels**: Mode-aware pixel buffers with fallible allocation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining the above

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod pixels;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    DEFAULT_CATALOG, FitError, MatchResult, RatioMatcher, centered_offset, fit_size,
};
pub use operations::{PadPlan, get_dimensions, pad_image, plan_padding};
pub use params::{DEFAULT_SCAN_LIMIT, Domination, FitPolicy, FitStrategy};
pub use pixels::{Fill, PixelBuffer, PixelError, PixelMode, Samples, WebPalette};
pub use rust_backend::RustBackend;
