use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use qrcraft::helper::{save_png, save_svg, to_ascii, to_png_bytes, to_svg_string};
use qrcraft::{EncodeOptions, QrCode, QrCodeEcc, Version};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "qrcraft", version, about = "Generate QR codes as PNG, SVG or ASCII art")]
struct Cli {
    /// Log encoder decisions (version, mask) at debug level
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct EncodeArgs {
    /// Text to encode
    #[arg(long)]
    data: String,
    /// Error correction level: L, M, Q or H
    #[arg(long, default_value = "L")]
    ecc: QrCodeEcc,
    /// Smallest version to use (1-40); larger versions are used when the data needs them
    #[arg(long)]
    version: Option<u8>,
}

#[derive(Subcommand)]
enum Command {
    /// Write a PNG image, to stdout when no output path is given
    Png {
        #[command(flatten)]
        encode: EncodeArgs,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Pixels per module
        #[arg(long, default_value_t = 10)]
        size: u32,
        /// Quiet zone in modules
        #[arg(long, default_value_t = 4)]
        border: u8,
    },
    /// Write an SVG document, to stdout when no output path is given
    Svg {
        #[command(flatten)]
        encode: EncodeArgs,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 4)]
        border: u8,
    },
    /// Print the code as text
    Ascii {
        #[command(flatten)]
        encode: EncodeArgs,
        #[arg(long, default_value_t = 2)]
        border: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Png { encode, output, size, border } => {
            let qr = encode_qr(&encode, border)?;
            match output {
                Some(path) => {
                    save_png(&qr, &path, size).with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), version = qr.version().value(), "saved PNG");
                }
                None => write_stdout(&to_png_bytes(&qr, size)?)?,
            }
        }
        Command::Svg { encode, output, border } => {
            let qr = encode_qr(&encode, border)?;
            match output {
                Some(path) => {
                    save_svg(&qr, &path).with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), version = qr.version().value(), "saved SVG");
                }
                None => write_stdout(to_svg_string(&qr).as_bytes())?,
            }
        }
        Command::Ascii { encode, border } => {
            let qr = encode_qr(&encode, border)?;
            write_stdout(to_ascii(&qr).as_bytes())?;
        }
    }
    Ok(())
}

fn encode_qr(args: &EncodeArgs, border: u8) -> Result<QrCode> {
    let mut opts = EncodeOptions::default().with_ecl(args.ecc).with_border(border);
    if let Some(v) = args.version {
        opts = opts.with_version(Version::try_new(v)?);
    }
    QrCode::encode_text(&args.data, &opts).context("encoding QR code")
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}
