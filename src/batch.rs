//! Batch padding of files and directories.
//!
//! Takes a list of input paths, pads every image onto the configured canvas
//! preset, and writes the results plus a JSON manifest to an output directory.
//!
//! ## Input Discovery
//!
//! Files are used as given. Directories are walked recursively and only files
//! with a [supported extension](crate::imaging::rust_backend::supported_input_extensions)
//! are kept, sorted by path. Inputs keep the order they were listed in.
//!
//! ## Output Structure
//!
//! ```text
//! padded/
//! ├── manifest.json        # Ratio, fitted size, and offset per image
//! ├── 001-sunset.png       # 1-based input position + source stem
//! ├── 002-portrait.png
//! └── ...
//! ```
//!
//! PNG is used for every mode since it stores alpha losslessly.
//!
//! ## Parallel Processing
//!
//! Images are decoded, padded, and encoded in parallel using
//! [rayon](https://docs.rs/rayon). The gallery and the manifest are assembled
//! afterwards in input order, so output is deterministic regardless of which
//! worker finishes first. A failing image is reported and skipped; the rest
//! of the batch still runs.

use crate::config::{ConfigError, GalleryConfig};
use crate::gallery::{Gallery, GalleryError, PaddedImage};
use crate::imaging::rust_backend::is_supported_input;
use crate::imaging::{BackendError, Fill, ImageBackend, PadPlan, PixelError, PixelMode};
use crate::types::{AspectRatio, Dimensions};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),
    #[error("No supported images found in the given inputs")]
    NoInputs,
}

/// Why a single image was skipped.
#[derive(Error, Debug)]
pub enum ImageFailure {
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Gallery(#[from] GalleryError),
    #[error("Render failed: {0}")]
    Render(#[from] PixelError),
}

/// Progress events, sent as each image completes.
///
/// Image events may arrive out of input order; `index` is the 1-based
/// input position.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ImagePadded {
        index: usize,
        source: PathBuf,
        output: PathBuf,
        plan: PadPlan,
    },
    ImageFailed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

/// Written to `manifest.json` in the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub canvas: Dimensions,
    pub mode: PixelMode,
    pub images: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source: String,
    pub output: String,
    pub dimensions: Dimensions,
    pub ratio: AspectRatio,
    pub closeness: f64,
    pub fitted: Dimensions,
    pub offset: (u32, u32),
}

impl ManifestEntry {
    fn new(source: &Path, output: &Path, plan: &PadPlan) -> Self {
        Self {
            source: source.to_string_lossy().into_owned(),
            output: output.to_string_lossy().into_owned(),
            dimensions: plan.source,
            ratio: plan.matched.ratio,
            closeness: plan.matched.closeness,
            fitted: plan.fitted,
            offset: plan.offset,
        }
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    pub source: PathBuf,
    pub error: ImageFailure,
}

pub struct BatchResult {
    pub manifest: BatchManifest,
    pub failures: Vec<BatchFailure>,
    pub gallery: Gallery,
}

/// Expand `inputs` into the ordered list of image files to pad.
///
/// Anything that is not a directory is passed through unchecked; a missing
/// or unreadable file surfaces later as that image's own failure.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input) {
                let entry = entry?;
                if entry.file_type().is_file() && is_supported_input(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// Output file name for the image at 1-based `index`.
pub fn output_name(index: usize, source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{:0>3}-{}.png", index, stem)
}

/// Pad every image in `inputs` and write the results to `output_dir`.
pub fn run(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &GalleryConfig,
    background: &Fill,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, BatchError> {
    config.validate()?;
    let files = collect_inputs(inputs)?;
    if files.is_empty() {
        return Err(BatchError::NoInputs);
    }

    std::fs::create_dir_all(output_dir)?;
    let mut gallery = Gallery::new(config)?;

    if let Some(tx) = &events {
        tx.send(BatchEvent::Started { total: files.len() }).ok();
    }

    let outcomes: Vec<Result<(PaddedImage, PathBuf), ImageFailure>> = files
        .par_iter()
        .enumerate()
        .map(|(i, source)| {
            let index = i + 1;
            let output = output_dir.join(output_name(index, source));
            let outcome = pad_one(backend, &gallery, source, &output, background);

            if let Some(tx) = &events {
                let event = match &outcome {
                    Ok(padded) => BatchEvent::ImagePadded {
                        index,
                        source: source.clone(),
                        output: output.clone(),
                        plan: padded.plan,
                    },
                    Err(e) => BatchEvent::ImageFailed {
                        index,
                        source: source.clone(),
                        error: e.to_string(),
                    },
                };
                tx.send(event).ok();
            }

            outcome.map(|padded| (padded, output))
        })
        .collect();

    let mut manifest = BatchManifest {
        canvas: gallery.canvas().dimensions(),
        mode: gallery.mode(),
        images: Vec::new(),
    };
    let mut failures = Vec::new();

    for (source, outcome) in files.into_iter().zip(outcomes) {
        match outcome {
            Ok((padded, output)) => {
                manifest
                    .images
                    .push(ManifestEntry::new(&source, &output, &padded.plan));
                gallery.push(padded)?;
            }
            Err(error) => failures.push(BatchFailure { source, error }),
        }
    }

    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(output_dir.join("manifest.json"), json)?;

    Ok(BatchResult {
        manifest,
        failures,
        gallery,
    })
}

fn pad_one(
    backend: &impl ImageBackend,
    gallery: &Gallery,
    source: &Path,
    output: &Path,
    background: &Fill,
) -> Result<PaddedImage, ImageFailure> {
    let image = backend.load(source)?;
    let padded = gallery.prepare(&image, background)?;
    backend.save(&padded.to_image()?, output)?;
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([9, 9, 9, 255])))
    }

    fn transparent() -> Fill {
        Fill::transparent(PixelMode::Rgba)
    }

    // =========================================================================
    // Input discovery
    // =========================================================================

    #[test]
    fn collect_inputs_walks_directories_sorted() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::create_dir(dir.join("nested")).unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "nested/c.webp"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let files = collect_inputs(&[dir.to_path_buf()]).unwrap();
        assert_eq!(
            files,
            vec![dir.join("a.JPG"), dir.join("b.png"), dir.join("nested/c.webp")]
        );
    }

    #[test]
    fn collect_inputs_keeps_explicit_files_in_order() {
        let tmp = TempDir::new().unwrap();
        let z = tmp.path().join("z.png");
        let a = tmp.path().join("a.png");
        fs::write(&z, b"").unwrap();
        fs::write(&a, b"").unwrap();

        let files = collect_inputs(&[z.clone(), a.clone()]).unwrap();
        assert_eq!(files, vec![z, a]);
    }

    #[test]
    fn collect_inputs_passes_missing_files_through() {
        let missing = PathBuf::from("/nonexistent/input.png");
        let files = collect_inputs(&[missing.clone()]).unwrap();
        assert_eq!(files, vec![missing]);
    }

    #[test]
    fn output_name_uses_index_and_stem() {
        assert_eq!(output_name(1, Path::new("/in/sunset.jpg")), "001-sunset.png");
        assert_eq!(output_name(42, Path::new("shot.tar.gz")), "042-shot.tar.png");
    }

    // =========================================================================
    // run with mock backend
    // =========================================================================

    #[test]
    fn run_pads_and_saves_every_image() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_images(vec![
            ("/in/wide.png", solid(1200, 480)),
            ("/in/tall.png", solid(124, 169)),
        ]);
        let inputs = vec![PathBuf::from("/in/wide.png"), PathBuf::from("/in/tall.png")];

        let result = run(
            &backend,
            &inputs,
            tmp.path(),
            &GalleryConfig::default(),
            &transparent(),
            None,
        )
        .unwrap();

        assert!(result.failures.is_empty());
        assert_eq!(result.gallery.len(), 2);
        assert_eq!(result.manifest.images[0].fitted, Dimensions::new(1218, 522));
        assert_eq!(result.manifest.images[1].ratio, AspectRatio::new(3, 4));

        let mut saves: Vec<RecordedOp> = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Save { .. }))
            .collect();
        saves.sort_by_key(|op| format!("{op:?}"));
        assert_eq!(
            saves,
            vec![
                RecordedOp::Save {
                    output: tmp.path().join("001-wide.png").to_string_lossy().to_string(),
                    width: 1218,
                    height: 522,
                },
                RecordedOp::Save {
                    output: tmp.path().join("002-tall.png").to_string_lossy().to_string(),
                    width: 129,
                    height: 172,
                },
            ]
        );
    }

    #[test]
    fn run_skips_failures_and_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_images(vec![
            ("/in/1.png", solid(160, 90)),
            ("/in/3.png", solid(90, 160)),
        ]);
        let inputs = vec![
            PathBuf::from("/in/1.png"),
            PathBuf::from("/in/2.png"),
            PathBuf::from("/in/3.png"),
        ];

        let result = run(
            &backend,
            &inputs,
            tmp.path(),
            &GalleryConfig::default(),
            &transparent(),
            None,
        )
        .unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source, PathBuf::from("/in/2.png"));
        assert!(matches!(result.failures[0].error, ImageFailure::Backend(_)));

        let sources: Vec<&str> = result
            .manifest
            .images
            .iter()
            .map(|e| e.source.as_str())
            .collect();
        assert_eq!(sources, vec!["/in/1.png", "/in/3.png"]);
        assert_eq!(result.gallery.images()[1].plan.matched.ratio, AspectRatio::new(9, 16));
    }

    #[test]
    fn run_writes_manifest() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_images(vec![("/in/a.png", solid(400, 300))]);

        run(
            &backend,
            &[PathBuf::from("/in/a.png")],
            tmp.path(),
            &GalleryConfig::default(),
            &transparent(),
            None,
        )
        .unwrap();

        let content = fs::read_to_string(tmp.path().join("manifest.json")).unwrap();
        let manifest: BatchManifest = serde_json::from_str(&content).unwrap();
        assert_eq!(manifest.canvas, Dimensions::new(1200, 480));
        assert_eq!(manifest.mode, PixelMode::Rgba);
        assert_eq!(manifest.images.len(), 1);
        assert_eq!(manifest.images[0].ratio, AspectRatio::new(4, 3));
        assert_eq!(manifest.images[0].closeness, 1.0);
        // already 4:3, still padded by one multiple
        assert_eq!(manifest.images[0].fitted, Dimensions::new(404, 303));
        assert_eq!(manifest.images[0].offset, (2, 1));
    }

    #[test]
    fn run_sends_one_event_per_image() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_images(vec![("/in/ok.png", solid(64, 64))]);
        let inputs = vec![PathBuf::from("/in/ok.png"), PathBuf::from("/in/missing.png")];
        let (tx, rx) = std::sync::mpsc::channel();

        run(
            &backend,
            &inputs,
            tmp.path(),
            &GalleryConfig::default(),
            &transparent(),
            Some(tx),
        )
        .unwrap();

        let events: Vec<BatchEvent> = rx.into_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], BatchEvent::Started { total: 2 }));
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::ImagePadded { index: 1, .. }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::ImageFailed { index: 2, .. }
        )));
    }

    #[test]
    fn run_empty_directory_is_no_inputs() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty");
        fs::create_dir(&empty).unwrap();

        let result = run(
            &MockBackend::new(),
            &[empty],
            &tmp.path().join("out"),
            &GalleryConfig::default(),
            &transparent(),
            None,
        );
        assert!(matches!(result, Err(BatchError::NoInputs)));
    }

    #[test]
    fn run_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = GalleryConfig::default();
        config.fit.scan_limit = 0;

        let result = run(
            &MockBackend::new(),
            &[PathBuf::from("/in/a.png")],
            tmp.path(),
            &config,
            &transparent(),
            None,
        );
        assert!(matches!(result, Err(BatchError::Config(_))));
    }

    // =========================================================================
    // run with the real backend
    // =========================================================================

    #[test]
    fn run_with_rust_backend_writes_pngs() {
        use crate::imaging::RustBackend;

        let tmp = TempDir::new().unwrap();
        let input_dir = tmp.path().join("in");
        let output_dir = tmp.path().join("out");
        fs::create_dir(&input_dir).unwrap();
        solid(124, 169).save(input_dir.join("portrait.png")).unwrap();

        let result = run(
            &RustBackend::new(),
            &[input_dir],
            &output_dir,
            &GalleryConfig::default(),
            &transparent(),
            None,
        )
        .unwrap();

        assert!(result.failures.is_empty());
        let written = image::open(output_dir.join("001-portrait.png")).unwrap();
        assert_eq!((written.width(), written.height()), (129, 172));
        assert!(output_dir.join("manifest.json").exists());
    }

    #[test]
    fn run_with_rust_backend_skips_missing_file() {
        use crate::imaging::RustBackend;

        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("present.png");
        let missing = tmp.path().join("missing.png");
        let output_dir = tmp.path().join("out");
        solid(160, 90).save(&present).unwrap();

        let result = run(
            &RustBackend::new(),
            &[missing.clone(), present.clone()],
            &output_dir,
            &GalleryConfig::default(),
            &transparent(),
            None,
        )
        .unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source, missing);
        assert!(matches!(result.failures[0].error, ImageFailure::Backend(_)));
        assert_eq!(result.manifest.images.len(), 1);
        assert!(output_dir.join("002-present.png").exists());
    }
}
