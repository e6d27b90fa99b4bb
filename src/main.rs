use banner_gal::gallery::Gallery;
use banner_gal::imaging::{ImageBackend, RustBackend, get_dimensions};
use banner_gal::types::Dimensions;
use banner_gal::{batch, config, output};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Shared flags for commands that compose images.
#[derive(clap::Args, Clone)]
struct BackgroundArgs {
    /// Background color, overriding `[background] color` (e.g. "#ffffffff")
    #[arg(long)]
    background: Option<String>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "banner-gal")]
#[command(about = "Pad images onto the closest standard aspect ratio")]
#[command(long_about = "\
Pad images onto the closest standard aspect ratio

Every image is matched against a catalog of aspect ratios (32:9, 21:9, 16:9,
16:10, 4:3, 1:1, 5:4, 3:2, 5:3, 3:1 and their portrait flips). The image is
then centered on the smallest multiple of that ratio that covers it, so the
result has exact standard proportions without cropping or resampling.

  124x169 photo  →  3:4  →  129x172 canvas, image at (2, 1)
  1200x480 banner → 21:9 → 1218x522 canvas, image at (9, 21)

Padded images share the canvas preset's pixel mode (default: 1200x480 RGBA).

Run 'banner-gal gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the matched ratio and fitted size for an image
    Fit {
        /// Image to inspect
        image: PathBuf,
    },
    /// Pad a single image and write it as PNG
    Pad {
        /// Image to pad
        image: PathBuf,
        /// Output file (default: <stem>-padded.png next to the input)
        #[arg(short = 'o', long = "output")]
        out: Option<PathBuf>,
        #[command(flatten)]
        background: BackgroundArgs,
        /// Wait for Enter after showing the fit, before composing
        #[arg(long)]
        confirm: bool,
    },
    /// Pad every image in the given files and directories
    Batch {
        /// Image files and/or directories (walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(short = 'o', long = "output", default_value = "padded")]
        out: PathBuf,
        #[command(flatten)]
        background: BackgroundArgs,
    },
    /// Validate config.toml and show the effective settings
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fit { image } => {
            let config = config::load_config(&cli.config)?;
            let gallery = Gallery::new(&config)?;
            let dims = get_dimensions(&RustBackend::new(), &image)?;
            output::print_fit_report(&gallery.plan(dims)?);
        }
        Command::Pad {
            image,
            out,
            background,
            confirm,
        } => {
            let config = load_with_background(&cli.config, background)?;
            let fill = config.background_fill()?;
            let mut gallery = Gallery::new(&config)?;
            let backend = RustBackend::new();

            let decoded = backend.load(&image)?;
            let plan = gallery.plan(Dimensions::new(decoded.width(), decoded.height()))?;
            output::print_fit_report(&plan);
            if confirm {
                wait_for_enter()?;
            }

            let padded = gallery.add_image(&decoded, &fill)?;
            let out = out.unwrap_or_else(|| default_output(&image));
            backend.save(&padded.to_image()?, &out)?;
            println!("==> Wrote {}", out.display());
        }
        Command::Batch {
            inputs,
            out,
            background,
        } => {
            let config = load_with_background(&cli.config, background)?;
            let fill = config.background_fill()?;
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run(&RustBackend::new(), &inputs, &out, &config, &fill, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;
            output::print_batch_summary(&result, &out);
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.join("config.toml").display());
            let config = config::load_config(&cli.config)?;
            output::print_config_summary(&config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config and apply a `--background` override, re-validating the color
/// against the canvas mode.
fn load_with_background(
    dir: &Path,
    background: BackgroundArgs,
) -> Result<config::GalleryConfig, config::ConfigError> {
    let mut config = config::load_config(dir)?;
    if let Some(color) = background.background {
        config.background.color = Some(color);
        config.validate()?;
    }
    Ok(config)
}

/// `photos/sunset.jpg` → `photos/sunset-padded.png`.
fn default_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image.with_file_name(format!("{stem}-padded.png"))
}

fn wait_for_enter() -> std::io::Result<()> {
    print!("Press Enter to compose...");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
