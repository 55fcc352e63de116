use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use qr_compose::{
    logging, render_terminal, timestamp_ms, CenterStyle, LogoShape, LogoSize, ScanSafety, Studio,
};

#[derive(Parser)]
#[command(name = "qr-compose")]
#[command(author, version, about = "Generate QR codes with logo cut-outs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OverlayArgs {
    /// Logo image (png, jpeg or svg)
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Shape of the logo and of the centre cut-out
    #[arg(long, value_enum, default_value_t = LogoShape::Rounded)]
    shape: LogoShape,

    /// Logo size when drawn without a cut-out
    #[arg(long, value_enum, default_value_t = LogoSize::Medium)]
    logo_size: LogoSize,

    /// Centre style
    #[arg(short, long, value_enum, default_value_t = CenterStyle::None)]
    center: CenterStyle,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the QR code as a PNG image
    Png {
        /// URL or text to encode
        text: String,

        /// Edge length of the exported image in pixels (256, 512, 1024, ...)
        #[arg(short, long)]
        size: Option<u32>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Decode the exported image to check it still scans
        #[arg(long)]
        verify: bool,

        #[command(flatten)]
        overlay: OverlayArgs,
    },

    /// Export the QR code on an A4 PDF page
    #[cfg(feature = "pdf")]
    Pdf {
        /// URL or text to encode
        text: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        overlay: OverlayArgs,
    },

    /// Show the QR code in the terminal
    Preview {
        /// URL or text to encode
        text: String,

        /// Blank the centre as an empty cut-out would
        #[arg(long)]
        cutout: bool,
    },

    /// Print cut-out geometry and scan safety for the given options
    Inspect {
        #[command(flatten)]
        overlay: OverlayArgs,
    },
}

fn build_studio(text: Option<&str>, overlay: &OverlayArgs) -> Result<Studio> {
    let mut studio = Studio::new();

    if let Some(text) = text {
        if !studio.generate(text)? {
            anyhow::bail!("Nothing to encode: input is empty");
        }
    }

    if let Some(path) = &overlay.logo {
        studio
            .load_logo(path)
            .with_context(|| format!("Failed to load logo {}", path.display()))?;
    }

    studio.set_shape(overlay.shape);
    studio.set_size(overlay.logo_size);
    studio
        .set_center_style(overlay.center)
        .context("Invalid centre style")?;

    Ok(studio)
}

fn print_safety(studio: &Studio) {
    let safety = studio.scan_safety();
    println!("Scan safety: {}", safety);
    if safety == ScanSafety::Risky {
        println!("Large logos may reduce scan reliability");
    }
}

fn write_artifact(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose)?;

    match cli.command {
        Commands::Png {
            text,
            size,
            output,
            verify,
            overlay,
        } => {
            let studio = build_studio(Some(&text), &overlay)?;
            let png = studio
                .export_png(size, timestamp_ms())
                .context("PNG export failed")?;

            if verify {
                verify_png(&png.bytes, &text)?;
            }

            let path = write_artifact(&output, &png.file_name, &png.bytes)?;
            println!("Created {}x{} PNG: {}", png.width, png.height, path.display());
            print_safety(&studio);
        }

        #[cfg(feature = "pdf")]
        Commands::Pdf {
            text,
            output,
            overlay,
        } => {
            let studio = build_studio(Some(&text), &overlay)?;
            let pdf = studio
                .export_pdf(timestamp_ms())
                .context("PDF export failed")?;

            let path = write_artifact(&output, &pdf.file_name, &pdf.bytes)?;
            println!("Created PDF ({} page(s)): {}", pdf.pages, path.display());
            print_safety(&studio);
        }

        Commands::Preview { text, cutout } => {
            let mut studio = Studio::new();
            if !studio.generate(&text)? {
                anyhow::bail!("Nothing to encode: input is empty");
            }
            let payload = studio
                .payload()
                .context("No QR code was generated")?;
            let fraction = cutout.then(|| {
                studio.geometry().cutout_size / studio.config().canvas_size as f64
            });
            print!("{}", render_terminal(payload.code(), fraction));
        }

        Commands::Inspect { overlay } => {
            let studio = build_studio(None, &overlay)?;
            let geometry = studio.geometry();
            println!("Canvas size: {}px", studio.config().canvas_size);
            println!("Cut-out size: {:.3}px", geometry.cutout_size);
            println!("Padding: {:.3}px", geometry.padding);
            println!("Logo area: {:.3}px", geometry.logo_area_size);
            if let Some(warning) = geometry.warning {
                println!("Warning: {}", warning);
            }
            println!("Logo size: {}px", studio.style().size.pixels());
            print_safety(&studio);
        }
    }

    Ok(())
}

#[cfg(feature = "verify")]
fn verify_png(bytes: &[u8], text: &str) -> Result<()> {
    let image = image::load_from_memory(bytes)
        .context("Failed to reload exported PNG")?
        .to_rgba8();
    let decoded = qr_compose::decode_payload(&image).context("Exported QR code does not scan")?;
    if decoded != text.trim() {
        anyhow::bail!("Exported QR code decodes to {:?}", decoded);
    }
    println!("Verified: QR code decodes to the input text");
    Ok(())
}

#[cfg(not(feature = "verify"))]
fn verify_png(_bytes: &[u8], _text: &str) -> Result<()> {
    anyhow::bail!("--verify needs the `verify` feature")
}
