// Writes a test logo PNG for trying out png2svg
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Generate a test logo PNG", long_about = None)]
struct Args {
    /// Where to write the PNG
    #[arg(default_value = "test_logo.png")]
    output: PathBuf,

    /// Edge length in pixels (default: 200, or 100 with --plain)
    #[arg(long)]
    size: Option<u32>,

    /// Solid blue circle on white instead of the full logo
    #[arg(long)]
    plain: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let img = if args.plain {
        test_logo::draw_plain_circle(args.size.unwrap_or(100))
    } else {
        test_logo::draw_logo(args.size.unwrap_or(200))
    };

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    img.save(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;

    println!("✓ Created {} ({}x{})", args.output.display(), img.width(), img.height());
    Ok(())
}
