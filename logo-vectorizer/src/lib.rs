//! Raster logo to SVG conversion.
//!
//! [`Converter`] runs the pipeline: load the image, optionally strip its
//! background through a [`Segmenter`], apply an [`EnhancementLevel`], trace
//! it with a [`Tracer`] and write the SVG.

pub mod enhance;
pub mod error;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod segmenter;
pub mod tracer;

pub use enhance::{enhance, EnhancementLevel};
pub use error::ConvertError;
pub use output::{resolve_output_path, write_svg, OutputTarget};
pub use params::{ColorMode, ConversionParams, CurveMode, Hierarchical, ParamError, TraceOptions, TraceSettings};
pub use pipeline::{load_image, ConversionReport, Converter, SourceImage};
pub use segmenter::{RembgCommand, RembgServer, SegmentError, Segmenter};
pub use tracer::{SvgDocument, TraceError, Tracer, VtracerTracer};
