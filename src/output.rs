//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Fit
//!
//! ```text
//! For size (124x169px)
//! Aspect Ratio (3:4)
//! Last size (129x172px)
//!     Closeness: 0.9783
//!     Offset: (2, 1)
//! ```
//!
//! ## Batch
//!
//! ```text
//! Padding 3 images
//!     001 sunset.jpg → 001-sunset.png
//!         21:9 → 1218x522px at (9, 21)
//!     002 broken.png
//!         Failed: Processing failed: ...
//!
//! Padded 2 of 3 images → padded/
//! ```
//!
//! ## Check
//!
//! ```text
//! Canvas
//!     1200x480px RGBA
//! Ratios
//!     32:9, 21:9, 16:9, ... (+ reciprocals)
//! Fit
//!     strict, direct
//! Background
//!     transparent
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure — no I/O, no side effects.

use crate::batch::{BatchEvent, BatchResult};
use crate::config::GalleryConfig;
use crate::imaging::{Domination, FitStrategy, PadPlan};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

// ============================================================================
// Fit
// ============================================================================

/// Format the ratio match and fitted size for one image.
pub fn format_fit_report(plan: &PadPlan) -> Vec<String> {
    vec![
        format!("For size ({})", plan.source),
        format!("Aspect Ratio ({})", plan.matched.ratio),
        format!("Last size ({})", plan.fitted),
        format!("{}Closeness: {:.4}", indent(1), plan.matched.closeness),
        format!("{}Offset: ({}, {})", indent(1), plan.offset.0, plan.offset.1),
    ]
}

pub fn print_fit_report(plan: &PadPlan) {
    for line in format_fit_report(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            vec![format!("Padding {} image{}", total, plural(*total))]
        }
        BatchEvent::ImagePadded {
            index,
            source,
            output,
            plan,
        } => vec![
            format!(
                "{}{} {} → {}",
                indent(1),
                format_index(*index),
                file_name(source),
                file_name(output)
            ),
            format!(
                "{}{} → {} at ({}, {})",
                indent(2),
                plan.matched.ratio,
                plan.fitted,
                plan.offset.0,
                plan.offset.1
            ),
        ],
        BatchEvent::ImageFailed {
            index,
            source,
            error,
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), file_name(source)),
            format!("{}Failed: {}", indent(2), error),
        ],
    }
}

/// Format the closing summary of a batch run.
pub fn format_batch_summary(result: &BatchResult, output_dir: &Path) -> Vec<String> {
    let padded = result.manifest.images.len();
    let total = padded + result.failures.len();
    let mut lines = vec![format!(
        "Padded {} of {} image{} → {}",
        padded,
        total,
        plural(total),
        output_dir.display()
    )];
    for failure in &result.failures {
        lines.push(format!(
            "{}Skipped {}: {}",
            indent(1),
            failure.source.display(),
            failure.error
        ));
    }
    lines
}

pub fn print_batch_summary(result: &BatchResult, output_dir: &Path) {
    println!();
    for line in format_batch_summary(result, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the effective configuration.
pub fn format_config_summary(config: &GalleryConfig) -> Vec<String> {
    let ratios = config
        .catalog()
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let reciprocals = if config.ratios.include_reciprocals {
        " (+ reciprocals)"
    } else {
        ""
    };

    let policy = config.fit_policy();
    let domination = match policy.domination {
        Domination::Inclusive => "inclusive",
        Domination::Strict => "strict",
    };
    let strategy = match policy.strategy {
        FitStrategy::Direct => "direct".to_string(),
        FitStrategy::Scan { limit } => format!("scan (limit {})", limit),
    };

    let background = config
        .background
        .color
        .clone()
        .unwrap_or_else(|| "transparent".to_string());

    let workers = crate::config::effective_threads(&config.processing);

    vec![
        "Canvas".to_string(),
        format!("{}{} {}", indent(1), config.canvas_dimensions(), config.canvas.mode),
        "Ratios".to_string(),
        format!("{}{}{}", indent(1), ratios, reciprocals),
        "Fit".to_string(),
        format!("{}{}, {}", indent(1), domination, strategy),
        "Background".to_string(),
        format!("{}{}", indent(1), background),
        "Processing".to_string(),
        format!("{}{} worker{}", indent(1), workers, plural(workers)),
    ]
}

pub fn print_config_summary(config: &GalleryConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
