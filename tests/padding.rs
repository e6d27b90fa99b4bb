//! End-to-end padding properties against the public library API.
//!
//! Run with: `cargo test --test padding`

use banner_gal::config::GalleryConfig;
use banner_gal::gallery::Gallery;
use banner_gal::imaging::{
    Domination, Fill, FitPolicy, FitStrategy, PixelBuffer, PixelMode, RatioMatcher, fit_size,
};
use banner_gal::types::{AspectRatio, Dimensions};
use image::{DynamicImage, Rgba, RgbaImage};

fn pattern(width: u32, height: u32, alpha: impl Fn(u32, u32) -> u8) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x.wrapping_mul(31) ^ y) as u8,
            (y.wrapping_mul(17) + x) as u8,
            (x + y) as u8,
            alpha(x, y),
        ])
    }))
}

// ===========================================================================
// Compositing
// ===========================================================================

/// Padded size equals the fit, the source is bit-exact at the offset, and
/// every other pixel is the background.
fn assert_padded_exactly(image: &DynamicImage, background: [u8; 4]) {
    let mut gallery = Gallery::new(&GalleryConfig::default()).unwrap();
    let fill = Fill::Channels(background.to_vec());
    let padded = gallery.add_image(image, &fill).unwrap();

    let source = image.to_rgba8();
    let dims = Dimensions::new(source.width(), source.height());
    let fitted = fit_size(padded.plan.matched.ratio, dims, FitPolicy::default()).unwrap();
    assert_eq!(padded.buffer.dimensions(), fitted);

    let (ox, oy) = padded.plan.offset;
    for y in 0..fitted.height {
        for x in 0..fitted.width {
            let got = padded.buffer.u8_pixel(x, y).unwrap();
            let inside = (ox..ox + dims.width).contains(&x) && (oy..oy + dims.height).contains(&y);
            if inside {
                assert_eq!(got, &source.get_pixel(x - ox, y - oy).0[..], "at ({x}, {y})");
            } else {
                assert_eq!(got, &background[..], "at ({x}, {y})");
            }
        }
    }
}

#[test]
fn opaque_images_are_reproduced_exactly() {
    for (w, h) in [(124, 169), (200, 50), (37, 41), (1, 1), (301, 97)] {
        assert_padded_exactly(&pattern(w, h, |_, _| 255), [12, 34, 56, 255]);
    }
}

#[test]
fn translucent_images_over_transparent_background_are_exact() {
    let image = pattern(90, 61, |x, y| ((x * 3 + y * 5) % 256) as u8);
    assert_padded_exactly(&image, [0, 0, 0, 0]);
}

#[test]
fn translucent_pixels_blend_over_opaque_background() {
    let mut gallery = Gallery::new(&GalleryConfig::default()).unwrap();
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 9, Rgba([255, 255, 255, 128])));
    let padded = gallery
        .add_image(&image, &Fill::Channels(vec![0, 0, 0, 255]))
        .unwrap();

    let px = padded.buffer.u8_pixel(0, 0).unwrap();
    assert!(px[3] >= 254, "got {px:?}");
    assert!((127..=129).contains(&px[0]), "got {px:?}");
}

/// A background value that differs from the mode's zero fill.
fn background_for(mode: PixelMode) -> Fill {
    match mode {
        PixelMode::Int32 => Fill::Int(-7),
        PixelMode::Float32 => Fill::Float(0.25),
        other => Fill::Channels(vec![17; other.channels()]),
    }
}

fn same_sample(
    a: &PixelBuffer,
    (ax, ay): (u32, u32),
    b: &PixelBuffer,
    (bx, by): (u32, u32),
) -> bool {
    a.u8_pixel(ax, ay) == b.u8_pixel(bx, by)
        && a.i32_pixel(ax, ay) == b.i32_pixel(bx, by)
        && a.f32_pixel(ax, ay) == b.f32_pixel(bx, by)
}

#[test]
fn every_mode_pads_with_its_background() {
    let image = pattern(37, 23, |_, _| 255);
    for mode in PixelMode::ALL {
        let mut config = GalleryConfig::default();
        config.canvas.mode = mode;
        let mut gallery = Gallery::new(&config).unwrap();
        let background = background_for(mode);
        let padded = gallery.add_image(&image, &background).unwrap();

        let buffer = &padded.buffer;
        let plan = padded.plan;
        assert_eq!(buffer.mode(), mode);
        assert_eq!(buffer.dimensions(), plan.fitted, "{mode}");

        let source = PixelBuffer::from_image(&image, mode).unwrap();
        let fill = PixelBuffer::new(Dimensions::new(1, 1), mode, &background).unwrap();
        let (ox, oy) = plan.offset;
        for y in 0..plan.fitted.height {
            for x in 0..plan.fitted.width {
                let inside = (ox..ox + 37).contains(&x) && (oy..oy + 23).contains(&y);
                let matches = if inside {
                    same_sample(buffer, (x, y), &source, (x - ox, y - oy))
                } else {
                    same_sample(buffer, (x, y), &fill, (0, 0))
                };
                assert!(matches, "{mode} at ({x}, {y})");
            }
        }
    }
}

#[test]
fn gallery_preserves_append_order() {
    let mut gallery = Gallery::new(&GalleryConfig::default()).unwrap();
    let sizes = [(1200, 480), (124, 169), (640, 640), (90, 300)];
    for (w, h) in sizes {
        gallery
            .add_image(&pattern(w, h, |_, _| 255), &Fill::transparent(PixelMode::Rgba))
            .unwrap();
    }

    let sources: Vec<Dimensions> = gallery.images().iter().map(|p| p.plan.source).collect();
    let expected: Vec<Dimensions> = sizes.iter().map(|&s| s.into()).collect();
    assert_eq!(sources, expected);
}

// ===========================================================================
// Matching and fitting
// ===========================================================================

#[test]
fn reference_scenarios() {
    let gallery = Gallery::new(&GalleryConfig::default()).unwrap();

    let portrait = gallery.plan(Dimensions::new(124, 169)).unwrap();
    assert_eq!(portrait.matched.ratio, AspectRatio::new(3, 4));
    assert!((portrait.matched.closeness - 496.0 / 507.0).abs() < 1e-12);
    assert_eq!(portrait.fitted, Dimensions::new(129, 172));

    let banner = gallery.plan(Dimensions::new(1200, 480)).unwrap();
    assert_eq!(banner.matched.ratio, AspectRatio::new(21, 9));
    assert!((banner.matched.closeness - 10800.0 / 10080.0).abs() < 1e-12);
    assert_eq!(banner.fitted, Dimensions::new(1218, 522));
}

#[test]
fn matching_ignores_uniform_scale() {
    let matcher = RatioMatcher::default();
    for w in (7..400).step_by(13) {
        for h in (5..400).step_by(11) {
            let base = matcher.closest(Dimensions::new(w, h)).unwrap().ratio;
            for k in [2, 3, 10] {
                let scaled = matcher.closest(Dimensions::new(w * k, h * k)).unwrap().ratio;
                assert_eq!(base, scaled, "{w}x{h} scaled by {k}");
            }
        }
    }
}

#[test]
fn fitted_sizes_are_minimal_dominating_multiples() {
    let matcher = RatioMatcher::default();
    for domination in [Domination::Inclusive, Domination::Strict] {
        let policy = FitPolicy::new(domination, FitStrategy::Direct);
        for w in (1..500).step_by(17) {
            for h in (1..500).step_by(19) {
                let dims = Dimensions::new(w, h);
                let ratio = matcher.closest(dims).unwrap().ratio;
                let fitted = fit_size(ratio, dims, policy).unwrap();

                assert_eq!(fitted.width % ratio.x, 0);
                let i = fitted.width / ratio.x;
                assert_eq!(fitted.height, i * ratio.y);
                assert!(domination.covers(fitted.width.into(), w.into()));
                assert!(domination.covers(fitted.height.into(), h.into()));

                let smaller = i - 1;
                let covers_smaller = domination.covers((smaller * ratio.x).into(), w.into())
                    && domination.covers((smaller * ratio.y).into(), h.into());
                assert!(!covers_smaller, "{dims} → {fitted} is not minimal");
            }
        }
    }
}

#[test]
fn fitting_is_monotonic() {
    let ratio = AspectRatio::new(16, 10);
    let policy = FitPolicy::default();
    let mut previous = fit_size(ratio, Dimensions::new(1, 100), policy).unwrap();
    for w in 2..600 {
        let next = fit_size(ratio, Dimensions::new(w, 100), policy).unwrap();
        assert!(next.width >= previous.width);
        assert!(next.height >= previous.height);
        previous = next;
    }
}

#[test]
fn strict_domination_always_pads() {
    let mut config = GalleryConfig::default();
    config.fit.domination = Domination::Strict;
    let gallery = Gallery::new(&config).unwrap();

    let plan = gallery.plan(Dimensions::new(1600, 900)).unwrap();
    assert_eq!(plan.matched.ratio, AspectRatio::new(16, 9));
    assert_eq!(plan.fitted, Dimensions::new(1616, 909));
}

#[test]
fn default_config_pads_images_already_in_catalog_proportions() {
    let gallery = Gallery::new(&GalleryConfig::default()).unwrap();
    for ((w, h), fitted) in [
        ((1600, 900), (1616, 909)),
        ((400, 300), (404, 303)),
        ((1920, 1080), (1936, 1089)),
    ] {
        let plan = gallery.plan(Dimensions::new(w, h)).unwrap();
        assert_eq!(plan.fitted, Dimensions::from(fitted), "{w}x{h}");
    }
}
