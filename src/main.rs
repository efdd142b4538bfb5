use clap::{Parser, Subcommand};
use listing_mark::config::{self, WatermarkOptions};
use listing_mark::imaging::{
    Anchor, Dimensions, OutputFormat, OverlayMode, RustBackend, Typeface, apply_watermark,
    decode_bitmap, plan_watermark,
};
use listing_mark::output;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-mark")]
#[command(about = "Watermark listing photos with a logo and/or text")]
#[command(long_about = "\
Watermark listing photos with a logo and/or text

The overlay is sized relative to the photo (logo width as a percentage of
the shortest edge), placed at one of nine anchors or tiled across the whole
frame, and can be rotated and faded:

  top_left     top_center     top_right
  middle_left  middle_center  middle_right
  bottom_left  bottom_center  bottom_right

Options come from stock defaults, then an --options file (TOML or JSON,
snake_case or camelCase keys), then individual flags.

Run 'listing-mark gen-config' to generate a documented options file.")]
#[command(version)]
struct Cli {
    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Inputs and option overrides shared by `apply` and `check`.
#[derive(clap::Args, Clone)]
struct WatermarkArgs {
    /// Photo to watermark (JPEG, PNG or WebP)
    photo: PathBuf,

    /// Logo image
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Options file (.toml or .json)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Bold font for text overlays (default: first system font found)
    #[arg(long)]
    font: Option<PathBuf>,

    /// logo, text, or both
    #[arg(long)]
    mode: Option<OverlayMode>,

    /// Overlay text (a literal \n starts a new line)
    #[arg(long)]
    text: Option<String>,

    /// Anchor such as bottom_right or middle_center
    #[arg(long)]
    position: Option<Anchor>,

    /// Repeat the overlay across the whole frame
    #[arg(long)]
    tile: bool,

    /// Downscale so the longer edge is at most this many pixels
    #[arg(long)]
    max_long_edge: Option<u32>,

    /// jpeg, png, or webp
    #[arg(long)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Command {
    /// Watermark a photo and write the encoded result
    Apply {
        #[command(flatten)]
        args: WatermarkArgs,

        /// Output path (default: <photo>-watermarked.<ext> next to the photo)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print output size, overlay box and placements without encoding
    Check {
        #[command(flatten)]
        args: WatermarkArgs,
    },
    /// Print a stock options file with all keys documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Apply { args, output: out } => {
            let options = resolve_options(&args)?;
            let backend = build_backend(args.font.as_deref(), &options)?;
            let photo = decode_bitmap(&std::fs::read(&args.photo)?)?;
            let logo = match &args.logo {
                Some(path) => Some(decode_bitmap(&std::fs::read(path)?)?),
                None => None,
            };

            let encoded = apply_watermark(&backend, &photo, logo.as_ref(), &options)?;
            let output_path =
                out.unwrap_or_else(|| default_output_path(&args.photo, options.output_format));
            std::fs::write(&output_path, &encoded.bytes)?;
            info!(path = %output_path.display(), "wrote watermarked image");
            output::print_applied(&output_path, &encoded);
        }
        Command::Check { args } => {
            let options = resolve_options(&args)?;
            let backend = build_backend(args.font.as_deref(), &options)?;
            let (width, height) = image::image_dimensions(&args.photo)?;
            let logo = match &args.logo {
                Some(path) => {
                    let (w, h) = image::image_dimensions(path)?;
                    Some(Dimensions::new(w, h))
                }
                None => None,
            };

            let source = Dimensions::new(width, height);
            let plan = plan_watermark(&backend, source, logo, &options)?;
            output::print_plan(&plan, source, &options);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the fmt subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Stock defaults, then the options file, then flags.
fn resolve_options(args: &WatermarkArgs) -> Result<WatermarkOptions, config::ConfigError> {
    let mut options = match &args.options {
        Some(path) => config::load_options(path)?,
        None => WatermarkOptions::default(),
    };
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if let Some(text) = &args.text {
        options.text = text.replace("\\n", "\n");
    }
    if let Some(position) = args.position {
        options.position = position;
    }
    if args.tile {
        options.tile = true;
    }
    if let Some(max) = args.max_long_edge {
        options.max_long_edge_px = Some(max);
    }
    if let Some(format) = args.format {
        options.output_format = format;
    }
    Ok(options)
}

/// Load the typeface only when the options actually draw text.
fn build_backend(
    font: Option<&Path>,
    options: &WatermarkOptions,
) -> Result<RustBackend, listing_mark::imaging::TypefaceError> {
    if !options.mode.includes_text() || options.text.trim().is_empty() {
        return Ok(RustBackend::new());
    }
    match font {
        Some(path) => Ok(RustBackend::with_typeface(Typeface::from_path(path)?)),
        None => Ok(RustBackend::with_system_font()),
    }
}

/// `photos/house.jpg` → `photos/house-watermarked.webp`
fn default_output_path(photo: &Path, format: OutputFormat) -> PathBuf {
    let stem = photo
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    photo.with_file_name(format!("{stem}-watermarked.{}", format.extension()))
}
