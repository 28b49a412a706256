//! The conversion pipeline: load, remove background, enhance, trace, write.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbaImage;
use serde::Serialize;
use tracing::info;

use crate::enhance::{enhance, EnhancementLevel};
use crate::error::ConvertError;
use crate::output::write_svg;
use crate::params::ConversionParams;
use crate::segmenter::Segmenter;
use crate::tracer::{SvgDocument, Tracer};

/// Summary of one finished conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub paths: usize,
    pub bytes_written: u64,
    pub background_removed: bool,
    pub enhancement: EnhancementLevel,
    pub execution_time_ms: u64,
}

/// Decoded input plus the bytes it came from
pub struct SourceImage {
    pub path: PathBuf,
    pub encoded: Vec<u8>,
    pub pixels: RgbaImage,
}

/// Read and decode `path`. Fails before anything else if the file is
/// missing or not a supported raster format.
pub fn load_image(path: &Path) -> Result<SourceImage, ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::InputNotFound(path.to_path_buf()));
    }

    let encoded = fs::read(path).map_err(|source| ConvertError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    let pixels = image::load_from_memory(&encoded)
        .map_err(|source| ConvertError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgba8();

    info!("Loaded {} ({}x{}, {} bytes)", path.display(), pixels.width(), pixels.height(), encoded.len());

    Ok(SourceImage {
        path: path.to_path_buf(),
        encoded,
        pixels,
    })
}

pub struct Converter<S, T> {
    segmenter: S,
    tracer: T,
}

impl<S: Segmenter, T: Tracer> Converter<S, T> {
    pub fn new(segmenter: S, tracer: T) -> Self {
        Self { segmenter, tracer }
    }

    /// Background removal, enhancement and tracing on an already loaded image
    pub fn vectorize(
        &self,
        source: &SourceImage,
        params: &ConversionParams,
    ) -> Result<SvgDocument, ConvertError> {
        let pixels = if params.remove_background() {
            let segmented = self.segmenter.remove_background(&source.encoded)?;
            image::load_from_memory(&segmented)
                .map_err(ConvertError::SegmentedDecode)?
                .into_rgba8()
        } else {
            info!("Keeping background");
            source.pixels.clone()
        };

        let enhanced = enhance(&pixels, params.enhancement());
        let document = self.tracer.trace(&enhanced, params.trace())?;
        Ok(document)
    }

    /// Convert `input` into an SVG at `output`. The output file is only
    /// touched once tracing has succeeded.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        params: &ConversionParams,
    ) -> Result<ConversionReport, ConvertError> {
        let start_time = Instant::now();

        let source = load_image(input)?;
        let document = self.vectorize(&source, params)?;
        let bytes_written = write_svg(output, &document)?;

        let (width, height) = document.dimensions();
        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Converted {} -> {} ({} paths) in {}ms",
            input.display(),
            output.display(),
            document.path_count(),
            execution_time_ms
        );

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            width,
            height,
            paths: document.path_count(),
            bytes_written,
            background_removed: params.remove_background(),
            enhancement: params.enhancement(),
            execution_time_ms,
        })
    }
}
