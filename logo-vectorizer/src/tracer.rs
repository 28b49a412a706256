use image::{Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};
use visioncortex::{ColorImage, PathSimplifyMode};
use vtracer::{convert, Config};

use crate::params::{ColorMode, CurveMode, Hierarchical, TraceOptions};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("cannot trace an empty {0}x{1} image")]
    EmptyImage(u32, u32),
    #[error("vtracer: {0}")]
    Vtracer(String),
}

/// Traced vector output
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    svg: String,
    width: u32,
    height: u32,
}

impl SvgDocument {
    pub fn new(svg: String, width: u32, height: u32) -> Self {
        Self { svg, width, height }
    }

    pub fn as_str(&self) -> &str {
        &self.svg
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of `<path` elements in the document
    pub fn path_count(&self) -> usize {
        self.svg.matches("<path").count()
    }
}

/// Turns pixels into vector paths
pub trait Tracer {
    fn trace(&self, image: &RgbaImage, options: &TraceOptions) -> Result<SvgDocument, TraceError>;
}

impl<T: Tracer + ?Sized> Tracer for &T {
    fn trace(&self, image: &RgbaImage, options: &TraceOptions) -> Result<SvgDocument, TraceError> {
        (**self).trace(image, options)
    }
}

/// In-memory tracing through the `vtracer` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct VtracerTracer;

impl VtracerTracer {
    fn config(options: &TraceOptions) -> Config {
        Config {
            color_mode: match options.color_mode {
                ColorMode::Color => vtracer::ColorMode::Color,
                ColorMode::Binary => vtracer::ColorMode::Binary,
            },
            hierarchical: match options.hierarchical {
                Hierarchical::Stacked => vtracer::Hierarchical::Stacked,
                Hierarchical::Cutout => vtracer::Hierarchical::Cutout,
            },
            mode: match options.mode {
                CurveMode::Spline => PathSimplifyMode::Spline,
                CurveMode::Polygon => PathSimplifyMode::Polygon,
                CurveMode::None => PathSimplifyMode::None,
            },
            filter_speckle: options.filter_speckle as usize,
            color_precision: options.color_precision as i32,
            layer_difference: options.layer_difference as i32,
            corner_threshold: options.corner_threshold as i32,
            length_threshold: options.length_threshold,
            max_iterations: options.max_iterations as usize,
            splice_threshold: options.splice_threshold as i32,
            path_precision: Some(options.path_precision),
        }
    }
}

impl Tracer for VtracerTracer {
    fn trace(&self, image: &RgbaImage, options: &TraceOptions) -> Result<SvgDocument, TraceError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TraceError::EmptyImage(width, height));
        }

        info!(
            "Tracing {}x{} image (colormode: {}, hierarchical: {}, mode: {})",
            width, height, options.color_mode, options.hierarchical, options.mode
        );

        let pixels = match options.color_mode {
            ColorMode::Binary => flatten_onto_white(image).into_raw(),
            ColorMode::Color => image.as_raw().clone(),
        };
        let color_image = ColorImage {
            pixels,
            width: width as usize,
            height: height as usize,
        };

        let svg_file = convert(color_image, Self::config(options)).map_err(TraceError::Vtracer)?;
        let document = SvgDocument::new(svg_file.to_string(), width, height);

        debug!("Traced {} paths", document.path_count());
        Ok(document)
    }
}

/// Binary tracing thresholds on RGB alone, so transparent pixels must not
/// keep whatever color sits under a zero alpha.
fn flatten_onto_white(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        *px = Rgba([over(r), over(g), over(b), 255]);
    }
    out
}
