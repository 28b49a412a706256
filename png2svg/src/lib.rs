use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use logo_vectorizer::segmenter::{DEFAULT_REMBG_MODEL, DEFAULT_REMBG_URL};
use logo_vectorizer::{
    resolve_output_path, ColorMode, ConversionParams, ConversionReport, Converter, CurveMode,
    EnhancementLevel, Hierarchical, OutputTarget, ParamError, RembgCommand, RembgServer,
    Segmenter, TraceSettings, VtracerTracer,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const EXAMPLES: &str = "\
Examples:
  # Convert with background removal (default)
  png2svg input.png output.svg

  # Keep the background
  png2svg input.png output.svg --keep-bg

  # Write generated/input.svg
  png2svg input.png --output-dir generated

  # Maximum quality preprocessing
  png2svg input.png output.svg --ultra-quality

  # Black and white output
  png2svg input.png output.svg --colormode binary

  # Adjust quality settings
  png2svg input.png output.svg --color-precision 8 --filter-speckle 2";

/// Which rembg front end performs background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BgBackend {
    /// Spawn `rembg i` for each image
    Command,
    /// POST to a running `rembg s` server
    Server,
}

#[derive(Parser, Debug)]
#[command(
    name = "png2svg",
    version,
    about = "Convert PNG images to SVG format with optional background removal",
    after_help = EXAMPLES
)]
pub struct Args {
    /// Path to input image
    pub input: PathBuf,

    /// Path to output SVG file (optional if --output-dir is specified)
    #[arg(required_unless_present = "output_dir", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Output directory; the SVG is named after the input
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Keep the background (don't remove it)
    #[arg(long)]
    pub keep_bg: bool,

    /// Disable quality enhancement preprocessing
    #[arg(long)]
    pub no_enhance: bool,

    /// Maximum quality preprocessing (wins over --no-enhance)
    #[arg(long)]
    pub ultra_quality: bool,

    #[arg(long, value_enum, default_value_t = ColorMode::Color)]
    pub colormode: ColorMode,

    /// Hierarchical grouping mode
    #[arg(long, value_enum, default_value_t = Hierarchical::Stacked)]
    pub hierarchical: Hierarchical,

    /// Curve fitting mode
    #[arg(long, value_enum, default_value_t = CurveMode::Spline)]
    pub mode: CurveMode,

    /// Suppress speckles of this size or smaller, 0-255
    #[arg(long, default_value_t = 12, allow_negative_numbers = true)]
    pub filter_speckle: i64,

    /// Number of significant bits for RGB, 1-8
    #[arg(long, default_value_t = 7, allow_negative_numbers = true)]
    pub color_precision: i64,

    /// Color difference threshold, 0-255
    #[arg(long, default_value_t = 32, allow_negative_numbers = true)]
    pub layer_difference: i64,

    /// Corner detection threshold in degrees, 0-180
    #[arg(long, default_value_t = 60, allow_negative_numbers = true)]
    pub corner_threshold: i64,

    /// Curve length threshold, >= 0
    #[arg(long, default_value_t = 4.0, allow_negative_numbers = true)]
    pub length_threshold: f64,

    /// Maximum optimization iterations, >= 1
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub max_iterations: i64,

    /// Splice angle threshold in degrees, 0-180
    #[arg(long, default_value_t = 45, allow_negative_numbers = true)]
    pub splice_threshold: i64,

    /// Decimal places in path coordinates, >= 0
    #[arg(long, default_value_t = 8, allow_negative_numbers = true)]
    pub path_precision: i64,

    /// Background removal backend
    #[arg(long, value_enum, default_value_t = BgBackend::Command)]
    pub bg_backend: BgBackend,

    /// rembg executable for the `command` backend
    #[arg(long, env = "REMBG_BIN", default_value = "rembg")]
    pub rembg_bin: PathBuf,

    /// rembg server address for the `server` backend
    #[arg(long, env = "REMBG_URL", default_value = DEFAULT_REMBG_URL)]
    pub rembg_url: String,

    /// Segmentation model name passed to rembg
    #[arg(long, env = "REMBG_MODEL", default_value = DEFAULT_REMBG_MODEL)]
    pub rembg_model: String,

    /// Print a JSON report instead of the summary line
    #[arg(long)]
    pub json: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn enhancement(&self) -> EnhancementLevel {
        if self.no_enhance && self.ultra_quality {
            warn!("Both --no-enhance and --ultra-quality given, using ultra quality");
        }
        EnhancementLevel::from_flags(self.no_enhance, self.ultra_quality)
    }

    pub fn trace_settings(&self) -> TraceSettings {
        TraceSettings {
            color_mode: self.colormode,
            hierarchical: self.hierarchical,
            mode: self.mode,
            filter_speckle: self.filter_speckle,
            color_precision: self.color_precision,
            layer_difference: self.layer_difference,
            corner_threshold: self.corner_threshold,
            length_threshold: self.length_threshold,
            max_iterations: self.max_iterations,
            splice_threshold: self.splice_threshold,
            path_precision: self.path_precision,
        }
    }

    /// Validate every option into an immutable parameter set
    pub fn params(&self) -> Result<ConversionParams, ParamError> {
        ConversionParams::new(self.trace_settings(), self.enhancement(), !self.keep_bg)
    }

    pub fn output_target(&self) -> Option<OutputTarget> {
        match (&self.output_dir, &self.output) {
            (Some(dir), _) => Some(OutputTarget::Directory(dir.clone())),
            (None, Some(file)) => Some(OutputTarget::File(file.clone())),
            (None, None) => None,
        }
    }

    fn segmenter(&self) -> Result<Box<dyn Segmenter>> {
        Ok(match self.bg_backend {
            BgBackend::Command => Box::new(RembgCommand::new(&self.rembg_bin, &self.rembg_model)),
            BgBackend::Server => Box::new(
                RembgServer::new(&self.rembg_url, &self.rembg_model)
                    .context("Failed to set up rembg client")?,
            ),
        })
    }
}

/// `RUST_LOG` if set, otherwise info/debug/trace by verbosity
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Validate, resolve the output path, and run the conversion
pub fn run(args: &Args) -> Result<ConversionReport> {
    let params = args.params()?;
    debug!("Conversion parameters: {:?}", params);

    let Some(target) = args.output_target() else {
        bail!("Either output path or --output-dir must be specified");
    };
    let output = resolve_output_path(&args.input, &target)?;

    let converter = Converter::new(args.segmenter()?, VtracerTracer);
    let report = converter
        .convert(&args.input, &output, &params)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["png2svg", "logo.png", "logo.svg"]);
        let params = args.params().unwrap();

        assert!(params.remove_background());
        assert_eq!(params.enhancement(), EnhancementLevel::Standard);
        assert_eq!(params.trace(), &logo_vectorizer::TraceOptions::default());
        assert_eq!(args.bg_backend, BgBackend::Command);
        assert_eq!(args.output_target(), Some(OutputTarget::File(PathBuf::from("logo.svg"))));
    }

    #[test]
    fn test_flags() {
        let args = parse(&[
            "png2svg",
            "logo.png",
            "-o",
            "generated",
            "--keep-bg",
            "--no-enhance",
            "--colormode",
            "binary",
            "--hierarchical",
            "cutout",
            "--mode",
            "polygon",
            "--filter-speckle",
            "0",
        ]);
        let params = args.params().unwrap();

        assert!(!params.remove_background());
        assert_eq!(params.enhancement(), EnhancementLevel::None);
        assert_eq!(params.trace().color_mode, ColorMode::Binary);
        assert_eq!(params.trace().hierarchical, Hierarchical::Cutout);
        assert_eq!(params.trace().mode, CurveMode::Polygon);
        assert_eq!(params.trace().filter_speckle, 0);
        assert_eq!(
            args.output_target(),
            Some(OutputTarget::Directory(PathBuf::from("generated")))
        );
    }

    #[test]
    fn test_ultra_wins_over_no_enhance() {
        let args = parse(&["png2svg", "a.png", "a.svg", "--no-enhance", "--ultra-quality"]);
        assert_eq!(args.enhancement(), EnhancementLevel::Ultra);
    }

    #[test]
    fn test_negative_value_reaches_validation() {
        let args = parse(&["png2svg", "a.png", "a.svg", "--filter-speckle", "-1"]);
        assert_eq!(args.filter_speckle, -1);
        assert!(args.params().is_err());
    }

    #[test]
    fn test_parse_errors() {
        // unknown enum value
        assert!(Args::try_parse_from(["png2svg", "a.png", "a.svg", "--mode", "bezier"]).is_err());
        // neither output nor --output-dir
        assert!(Args::try_parse_from(["png2svg", "a.png"]).is_err());
        // both output and --output-dir
        assert!(Args::try_parse_from(["png2svg", "a.png", "a.svg", "-o", "dir"]).is_err());
    }

    #[test]
    fn test_invalid_params_fail_before_reading_input() {
        let args = parse(&["png2svg", "/does/not/exist.png", "a.svg", "--color-precision", "9"]);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("color_precision"), "{err:#}");
    }
}
