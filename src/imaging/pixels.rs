//! Mode-aware pixel buffers.
//!
//! A [`PixelBuffer`] stores pixels in one of the eleven [`PixelMode`]s a
//! canvas can be created with. Decoded images (always available as RGBA via
//! the `image` crate) are converted into the canvas mode before pasting, and
//! converted back to an `image::DynamicImage` for saving. Storage is an
//! `image::ImageBuffer` per channel layout, and pastes go through
//! `image::imageops`. `LAB` and `HSV` conversions use the `palette` crate.
//!
//! | Mode | Channels | Sample | From RGB | To RGB |
//! |---|---|---|---|---|
//! | `1` | 1 | u8 (0/255) | luma ≥ 128 | gray |
//! | `L` | 1 | u8 | ITU-R 601-2 luma | gray |
//! | `P` | 1 | u8 | nearest web-safe color | palette lookup |
//! | `RGB` | 3 | u8 | identity | identity |
//! | `RGBA` | 4 | u8 | identity | identity |
//! | `CMYK` | 4 | u8 | `255 - c`, `k = 0` | undercolor-aware inverse |
//! | `YCbCr` | 3 | u8 | JPEG full-range BT.601 | BT.601 |
//! | `LAB` | 3 | u8 | D65 Lab, `L` scaled to 0–255, `a`/`b` offset by 128 | Lab → sRGB |
//! | `HSV` | 3 | u8 | hue scaled to 0–255 | HSV → sRGB |
//! | `I` | 1 | i32 | luma | 16-bit gray, clamped |
//! | `F` | 1 | f32 | unrounded luma | 8-bit gray, clamped |

use crate::types::Dimensions;
use image::imageops::{self, BiLevel, ColorMap};
use image::{
    DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, Rgba,
    RgbaImage,
};
use palette::{FromColor, Hsv, Lab, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PixelError {
    #[error("Unknown pixel mode {0:?}")]
    UnknownMode(String),
    #[error("Invalid color {0:?}")]
    InvalidColor(String),
    #[error("Color has {got} channels, {mode} needs {expected}")]
    ChannelMismatch {
        mode: PixelMode,
        expected: usize,
        got: usize,
    },
    #[error("Background value is not a {0} sample")]
    FillKind(PixelMode),
    #[error("Cannot allocate a {dims} {mode} buffer")]
    Allocation { dims: Dimensions, mode: PixelMode },
    #[error("Sample data does not match a {dims} {mode} buffer")]
    Layout { dims: Dimensions, mode: PixelMode },
    #[error("{inner} at ({x}, {y}) does not fit inside {outer}")]
    OutOfBounds {
        outer: Dimensions,
        inner: Dimensions,
        x: u32,
        y: u32,
    },
    #[error("Cannot paste {src} pixels onto a {dst} buffer")]
    ModeMismatch { dst: PixelMode, src: PixelMode },
}

/// Pixel layout of a canvas and of every buffer derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelMode {
    /// 1-bit black and white, one byte per pixel.
    #[serde(rename = "1")]
    Bilevel,
    /// 8-bit grayscale.
    #[serde(rename = "L")]
    Grayscale,
    /// 8-bit palette indices.
    #[serde(rename = "P")]
    Palette,
    #[serde(rename = "RGB")]
    Rgb,
    #[default]
    #[serde(rename = "RGBA")]
    Rgba,
    #[serde(rename = "CMYK")]
    Cmyk,
    /// JPEG YCbCr, not ITU-R BT.2020.
    #[serde(rename = "YCbCr")]
    YCbCr,
    #[serde(rename = "LAB")]
    Lab,
    #[serde(rename = "HSV")]
    Hsv,
    /// 32-bit signed integer pixels.
    #[serde(rename = "I")]
    Int32,
    /// 32-bit floating point pixels.
    #[serde(rename = "F")]
    Float32,
}

impl PixelMode {
    pub const ALL: [PixelMode; 11] = [
        PixelMode::Bilevel,
        PixelMode::Grayscale,
        PixelMode::Palette,
        PixelMode::Rgb,
        PixelMode::Rgba,
        PixelMode::Cmyk,
        PixelMode::YCbCr,
        PixelMode::Lab,
        PixelMode::Hsv,
        PixelMode::Int32,
        PixelMode::Float32,
    ];

    /// The short identifier used in config files and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            PixelMode::Bilevel => "1",
            PixelMode::Grayscale => "L",
            PixelMode::Palette => "P",
            PixelMode::Rgb => "RGB",
            PixelMode::Rgba => "RGBA",
            PixelMode::Cmyk => "CMYK",
            PixelMode::YCbCr => "YCbCr",
            PixelMode::Lab => "LAB",
            PixelMode::Hsv => "HSV",
            PixelMode::Int32 => "I",
            PixelMode::Float32 => "F",
        }
    }

    pub fn channels(self) -> usize {
        match self {
            PixelMode::Bilevel
            | PixelMode::Grayscale
            | PixelMode::Palette
            | PixelMode::Int32
            | PixelMode::Float32 => 1,
            PixelMode::Rgb | PixelMode::YCbCr | PixelMode::Lab | PixelMode::Hsv => 3,
            PixelMode::Rgba | PixelMode::Cmyk => 4,
        }
    }

    /// Whether pastes composite over the background instead of overwriting it.
    pub fn has_alpha(self) -> bool {
        self == PixelMode::Rgba
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PixelMode {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelMode::ALL
            .into_iter()
            .find(|mode| mode.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| PixelError::UnknownMode(s.to_string()))
    }
}

/// A single background pixel value.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// One byte per channel, for every 8-bit mode.
    Channels(Vec<u8>),
    Int(i32),
    Float(f32),
}

impl Fill {
    /// All-zero fill for `mode`: transparent black in `RGBA`.
    pub fn transparent(mode: PixelMode) -> Self {
        match mode {
            PixelMode::Int32 => Fill::Int(0),
            PixelMode::Float32 => Fill::Float(0.0),
            other => Fill::Channels(vec![0; other.channels()]),
        }
    }

    /// Parse a background color for `mode`.
    ///
    /// 8-bit modes take hex with two digits per channel (`#ff000080` for
    /// RGBA, `#80` for L). `#rrggbb` is also accepted for RGBA and gets full
    /// opacity. `I` and `F` take a plain number.
    pub fn parse(text: &str, mode: PixelMode) -> Result<Self, PixelError> {
        let text = text.trim();
        let invalid = || PixelError::InvalidColor(text.to_string());
        match mode {
            PixelMode::Int32 => return text.parse().map(Fill::Int).map_err(|_| invalid()),
            PixelMode::Float32 => return text.parse().map(Fill::Float).map_err(|_| invalid()),
            _ => {}
        }

        let hex = text.strip_prefix('#').ok_or_else(invalid)?;
        if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut channels = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid()))
            .collect::<Result<Vec<u8>, _>>()?;
        if mode == PixelMode::Rgba && channels.len() == 3 {
            channels.push(u8::MAX);
        }
        if channels.len() != mode.channels() {
            return Err(PixelError::ChannelMismatch {
                mode,
                expected: mode.channels(),
                got: channels.len(),
            });
        }
        Ok(Fill::Channels(channels))
    }
}

/// 32-bit signed integer pixels (`I`).
pub type IntImage = ImageBuffer<Luma<i32>, Vec<i32>>;
/// 32-bit floating point pixels (`F`).
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Pixel storage, by channel layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// `1`, `L` and `P`.
    Gray(GrayImage),
    /// `RGB`, `YCbCr`, `LAB` and `HSV`.
    Rgb(RgbImage),
    /// `RGBA` and `CMYK`.
    Rgba(RgbaImage),
    Int(IntImage),
    Float(FloatImage),
}

/// A rectangular pixel buffer in a fixed [`PixelMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    dims: Dimensions,
    mode: PixelMode,
    samples: Samples,
}

impl PixelBuffer {
    /// Allocate a buffer filled with `fill`.
    ///
    /// Allocation is fallible: an oversized request is reported as
    /// [`PixelError::Allocation`] instead of aborting the process.
    pub fn new(dims: Dimensions, mode: PixelMode, fill: &Fill) -> Result<Self, PixelError> {
        let samples = match (mode, fill) {
            (PixelMode::Int32, Fill::Int(value)) => {
                Samples::Int(filled(dims, mode, Luma([*value]))?)
            }
            (PixelMode::Float32, Fill::Float(value)) => {
                Samples::Float(filled(dims, mode, Luma([*value]))?)
            }
            (PixelMode::Int32 | PixelMode::Float32, _) => return Err(PixelError::FillKind(mode)),
            (_, Fill::Channels(channels)) => match (mode.channels(), channels.as_slice()) {
                (1, &[v]) => Samples::Gray(filled(dims, mode, Luma([v]))?),
                (3, &[r, g, b]) => Samples::Rgb(filled(dims, mode, Rgb([r, g, b]))?),
                (4, &[r, g, b, a]) => Samples::Rgba(filled(dims, mode, Rgba([r, g, b, a]))?),
                (expected, got) => {
                    return Err(PixelError::ChannelMismatch {
                        mode,
                        expected,
                        got: got.len(),
                    });
                }
            },
            (_, _) => return Err(PixelError::FillKind(mode)),
        };

        Ok(Self {
            dims,
            mode,
            samples,
        })
    }

    /// Convert a decoded image into `mode`.
    ///
    /// `P` maps every pixel to the nearest [`WebPalette`] entry.
    pub fn from_image(image: &DynamicImage, mode: PixelMode) -> Result<Self, PixelError> {
        let rgba = image.to_rgba8();
        let dims = Dimensions::new(rgba.width(), rgba.height());

        let samples = match mode {
            PixelMode::Bilevel => Samples::Gray(convert(&rgba, mode, |px| {
                let mut gray = Luma([luma(px)]);
                BiLevel.map_color(&mut gray);
                gray
            })?),
            PixelMode::Grayscale => Samples::Gray(convert(&rgba, mode, |px| Luma([luma(px)]))?),
            PixelMode::Palette => {
                Samples::Gray(imageops::index_colors(&image.to_rgb8(), &WebPalette))
            }
            PixelMode::Rgb => Samples::Rgb(image.to_rgb8()),
            PixelMode::Rgba => Samples::Rgba(rgba),
            PixelMode::Cmyk => Samples::Rgba(convert(&rgba, mode, |[r, g, b, _]| {
                Rgba([255 - r, 255 - g, 255 - b, 0])
            })?),
            PixelMode::YCbCr => Samples::Rgb(convert(&rgba, mode, |px| Rgb(rgb_to_ycbcr(px)))?),
            PixelMode::Lab => Samples::Rgb(convert(&rgba, mode, |px| Rgb(rgb_to_lab(px)))?),
            PixelMode::Hsv => Samples::Rgb(convert(&rgba, mode, |px| Rgb(rgb_to_hsv(px)))?),
            PixelMode::Int32 => {
                Samples::Int(convert(&rgba, mode, |px| Luma([i32::from(luma(px))]))?)
            }
            PixelMode::Float32 => {
                Samples::Float(convert(&rgba, mode, |px| Luma([luma_f32(px)]))?)
            }
        };

        Ok(Self {
            dims,
            mode,
            samples,
        })
    }

    /// Render the buffer as an `image` crate image, for saving or display.
    pub fn to_image(&self) -> Result<DynamicImage, PixelError> {
        let image = match (&self.samples, self.mode) {
            (Samples::Gray(gray), PixelMode::Bilevel | PixelMode::Grayscale) => {
                DynamicImage::ImageLuma8(gray.clone())
            }
            (Samples::Gray(indices), PixelMode::Palette) => {
                DynamicImage::ImageRgb8(map_pixels(indices, |p| {
                    WebPalette.lookup(usize::from(p[0])).unwrap_or(Rgb([0, 0, 0]))
                }))
            }
            (Samples::Rgb(rgb), PixelMode::Rgb) => DynamicImage::ImageRgb8(rgb.clone()),
            (Samples::Rgb(encoded), PixelMode::YCbCr) => {
                DynamicImage::ImageRgb8(map_pixels(encoded, |p| Rgb(ycbcr_to_rgb(p.0))))
            }
            (Samples::Rgb(encoded), PixelMode::Lab) => {
                DynamicImage::ImageRgb8(map_pixels(encoded, |p| Rgb(lab_to_rgb(p.0))))
            }
            (Samples::Rgb(encoded), PixelMode::Hsv) => {
                DynamicImage::ImageRgb8(map_pixels(encoded, |p| Rgb(hsv_to_rgb(p.0))))
            }
            (Samples::Rgba(rgba), PixelMode::Rgba) => DynamicImage::ImageRgba8(rgba.clone()),
            (Samples::Rgba(cmyk), PixelMode::Cmyk) => {
                DynamicImage::ImageRgb8(map_pixels(cmyk, |p| Rgb(cmyk_to_rgb(p.0))))
            }
            (Samples::Int(int), _) => DynamicImage::ImageLuma16(map_pixels(int, |p| {
                Luma([p[0].clamp(0, i32::from(u16::MAX)) as u16])
            })),
            (Samples::Float(float), _) => {
                DynamicImage::ImageLuma8(map_pixels(float, |p| Luma([clamp_u8(p[0])])))
            }
            _ => {
                return Err(PixelError::Layout {
                    dims: self.dims,
                    mode: self.mode,
                });
            }
        };
        Ok(image)
    }

    /// Paste `src` with its top-left corner at `(x, y)`.
    ///
    /// In `RGBA` the source is alpha-composited with `imageops::overlay`.
    /// Over a fully transparent region the source replaces it, so translucent
    /// pixels keep their exact values there. Other modes overwrite.
    pub fn paste(&mut self, src: &PixelBuffer, (x, y): (u32, u32)) -> Result<(), PixelError> {
        let mismatch = PixelError::ModeMismatch {
            dst: self.mode,
            src: src.mode,
        };
        if src.mode != self.mode {
            return Err(mismatch);
        }
        let fits = u64::from(x) + u64::from(src.dims.width) <= u64::from(self.dims.width)
            && u64::from(y) + u64::from(src.dims.height) <= u64::from(self.dims.height);
        if !fits {
            return Err(PixelError::OutOfBounds {
                outer: self.dims,
                inner: src.dims,
                x,
                y,
            });
        }

        let composite = self.mode.has_alpha();
        let (ox, oy) = (i64::from(x), i64::from(y));
        match (&mut self.samples, &src.samples) {
            (Samples::Rgba(dst), Samples::Rgba(top)) if composite => {
                let (w, h) = top.dimensions();
                let transparent = dst.view(x, y, w, h).pixels().all(|(_, _, p)| p[3] == 0);
                if transparent {
                    imageops::replace(dst, top, ox, oy);
                } else {
                    imageops::overlay(dst, top, ox, oy);
                }
            }
            (Samples::Rgba(dst), Samples::Rgba(top)) => imageops::replace(dst, top, ox, oy),
            (Samples::Rgb(dst), Samples::Rgb(top)) => imageops::replace(dst, top, ox, oy),
            (Samples::Gray(dst), Samples::Gray(top)) => imageops::replace(dst, top, ox, oy),
            (Samples::Int(dst), Samples::Int(top)) => imageops::replace(dst, top, ox, oy),
            (Samples::Float(dst), Samples::Float(top)) => imageops::replace(dst, top, ox, oy),
            _ => return Err(mismatch),
        }
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn mode(&self) -> PixelMode {
        self.mode
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Channel bytes of the pixel at `(x, y)` for 8-bit modes.
    pub fn u8_pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        match &self.samples {
            Samples::Gray(img) => img.get_pixel_checked(x, y).map(|p| p.channels()),
            Samples::Rgb(img) => img.get_pixel_checked(x, y).map(|p| p.channels()),
            Samples::Rgba(img) => img.get_pixel_checked(x, y).map(|p| p.channels()),
            Samples::Int(_) | Samples::Float(_) => None,
        }
    }

    pub fn i32_pixel(&self, x: u32, y: u32) -> Option<i32> {
        let Samples::Int(img) = &self.samples else {
            return None;
        };
        img.get_pixel_checked(x, y).map(|p| p[0])
    }

    pub fn f32_pixel(&self, x: u32, y: u32) -> Option<f32> {
        let Samples::Float(img) = &self.samples else {
            return None;
        };
        img.get_pixel_checked(x, y).map(|p| p[0])
    }
}

/// The 216-color web-safe palette used for `P` buffers.
///
/// Six levels per channel (multiples of 51), index `36 * r + 6 * g + b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPalette;

impl WebPalette {
    pub const LEN: usize = 216;
}

impl ColorMap for WebPalette {
    type Color = Rgb<u8>;

    fn index_of(&self, color: &Rgb<u8>) -> usize {
        let [r, g, b] = color.0.map(|c| usize::from(web_level(c)));
        36 * r + 6 * g + b
    }

    fn lookup(&self, index: usize) -> Option<Rgb<u8>> {
        (index < Self::LEN).then(|| {
            let level = |i: usize| (i % 6) as u8 * 51;
            Rgb([level(index / 36), level(index / 6), level(index)])
        })
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgb<u8>) {
        if let Some(mapped) = self.lookup(self.index_of(color)) {
            *color = mapped;
        }
    }
}

fn web_level(c: u8) -> u8 {
    ((u16::from(c) + 25) / 51) as u8
}

/// Fallibly allocate an image buffer with every pixel set to `fill`.
fn filled<P: Pixel>(
    dims: Dimensions,
    mode: PixelMode,
    fill: P,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, PixelError> {
    let alloc_err = || PixelError::Allocation { dims, mode };
    let len = dims
        .area()
        .and_then(|pixels| pixels.checked_mul(usize::from(P::CHANNEL_COUNT)))
        .ok_or_else(alloc_err)?;

    let mut raw = Vec::new();
    raw.try_reserve_exact(len).map_err(|_| alloc_err())?;
    raw.resize(len, fill.channels()[0]);

    let mut buffer = ImageBuffer::from_raw(dims.width, dims.height, raw)
        .ok_or(PixelError::Layout { dims, mode })?;
    for pixel in buffer.pixels_mut() {
        *pixel = fill;
    }
    Ok(buffer)
}

fn convert<P: Pixel>(
    rgba: &RgbaImage,
    mode: PixelMode,
    encode: impl Fn([u8; 4]) -> P,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, PixelError> {
    let dims = Dimensions::new(rgba.width(), rgba.height());
    let mut out = filled(dims, mode, encode([0; 4]))?;
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        *dst = encode(src.0);
    }
    Ok(out)
}

fn map_pixels<P: Pixel, Q: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    f: impl Fn(&P) -> Q,
) -> ImageBuffer<Q, Vec<Q::Subpixel>> {
    ImageBuffer::from_fn(src.width(), src.height(), |x, y| f(src.get_pixel(x, y)))
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// ITU-R 601-2 luma, `L = R*299/1000 + G*587/1000 + B*114/1000`, rounded.
fn luma([r, g, b, _]: [u8; 4]) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

fn luma_f32([r, g, b, _]: [u8; 4]) -> f32 {
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

fn srgb([r, g, b, _]: [u8; 4]) -> Srgb {
    Srgb::new(r, g, b).into_format()
}

fn srgb_bytes(rgb: Srgb) -> [u8; 3] {
    [rgb.red, rgb.green, rgb.blue].map(|c| clamp_u8(c * 255.0))
}

fn cmyk_to_rgb([c, m, y, k]: [u8; 4]) -> [u8; 3] {
    let k = 255 - u32::from(k);
    [c, m, y].map(|v| (((255 - u32::from(v)) * k + 127) / 255) as u8)
}

/// JPEG (full-range BT.601) YCbCr.
fn rgb_to_ycbcr([r, g, b, _]: [u8; 4]) -> [u8; 3] {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    [
        clamp_u8(0.299 * r + 0.587 * g + 0.114 * b),
        clamp_u8(128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b),
        clamp_u8(128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b),
    ]
}

fn ycbcr_to_rgb([y, cb, cr]: [u8; 3]) -> [u8; 3] {
    let y = f32::from(y);
    let cb = f32::from(cb) - 128.0;
    let cr = f32::from(cr) - 128.0;
    [
        clamp_u8(y + 1.402 * cr),
        clamp_u8(y - 0.344136 * cb - 0.714136 * cr),
        clamp_u8(y + 1.772 * cb),
    ]
}

/// CIE L*a*b* (D65) packed into bytes: `L * 255 / 100`, `a + 128`, `b + 128`.
fn rgb_to_lab(px: [u8; 4]) -> [u8; 3] {
    let lab: Lab = Lab::from_color(srgb(px));
    [
        clamp_u8(lab.l * 255.0 / 100.0),
        clamp_u8(lab.a + 128.0),
        clamp_u8(lab.b + 128.0),
    ]
}

fn lab_to_rgb([l, a, b]: [u8; 3]) -> [u8; 3] {
    let lab: Lab = Lab::new(
        f32::from(l) * 100.0 / 255.0,
        f32::from(a) - 128.0,
        f32::from(b) - 128.0,
    );
    srgb_bytes(Srgb::from_color(lab))
}

/// Hue is scaled from degrees to 0..=255.
fn rgb_to_hsv(px: [u8; 4]) -> [u8; 3] {
    let hsv: Hsv = Hsv::from_color(srgb(px));
    let hue = hsv.hue.into_positive_degrees() / 360.0 * 255.0;
    [
        clamp_u8(hue),
        clamp_u8(hsv.saturation * 255.0),
        clamp_u8(hsv.value * 255.0),
    ]
}

fn hsv_to_rgb([h, s, v]: [u8; 3]) -> [u8; 3] {
    let hsv: Hsv = Hsv::new(
        f32::from(h) / 255.0 * 360.0,
        f32::from(s) / 255.0,
        f32::from(v) / 255.0,
    );
    srgb_bytes(Srgb::from_color(hsv))
}
