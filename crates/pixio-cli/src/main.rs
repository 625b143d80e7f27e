//! pixio - camera image inspection and conversion
//!
//! Reads plain, MIPI packed raw, PNG, TIFF and JPEG images together with
//! their JSON metadata sidecars.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod logger;

#[derive(Parser)]
#[command(name = "pixio")]
#[command(author, version, about = "Camera image inspection and conversion")]
#[command(long_about = "
Inspects and converts camera images. Headerless formats (.plain, .raw,
.raw10, .raw12) are described by a JSON sidecar next to the image, and
Bayer images written to PNG or TIFF keep their pattern in one.

Examples:
  pixio info shot.raw10                  # Geometry from shot.json
  pixio info shot.png --json             # Full metadata as JSON
  pixio exif photo.jpg                   # EXIF fields
  pixio convert shot.raw10 shot.tif      # Unpack to 16-bit TIFF
  pixio convert in.png out.raw --packing raw12
  pixio split bayer.raw -o planes/       # r, gr, gb, b planes
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Display image geometry and metadata
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Display EXIF fields of a JPEG or TIFF
    Exif(ExifArgs),

    /// Convert between formats
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Write each channel (or Bayer site) to its own image
    Split(SplitArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Metadata file (default: sidecar next to each image)
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Print the full metadata as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ExifArgs {
    /// Input image
    input: PathBuf,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    output: PathBuf,

    /// Metadata file for the input (default: sidecar)
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "95")]
    quality: u8,

    /// TIFF compression
    #[arg(long, value_enum, default_value = "none")]
    compression: Compression,

    /// Packing for .plain/.raw outputs
    #[arg(long, value_enum)]
    packing: Option<Packing>,
}

#[derive(Args)]
struct SplitArgs {
    /// Input image
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Metadata file for the input (default: sidecar)
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Extension of the written planes (default: input's)
    #[arg(short, long)]
    ext: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Deflate,
}

#[derive(Clone, Copy, ValueEnum)]
enum Packing {
    Plain,
    Raw10,
    Raw12,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Exif(args) => commands::exif::run(args),
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Split(args) => commands::split::run(args),
    }
}
