use std::path::PathBuf;

use thiserror::Error;

use crate::params::ParamError;
use crate::segmenter::SegmentError;
use crate::tracer::TraceError;

/// Anything that stops a conversion. Nothing is retried.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    InvalidParameter(#[from] ParamError),
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("background removal failed: {0}")]
    Segmentation(#[from] SegmentError),
    #[error("background removal returned an undecodable image: {0}")]
    SegmentedDecode(image::ImageError),
    #[error("vectorization failed: {0}")]
    Trace(#[from] TraceError),
    #[error("cannot derive an output file name from {}", .0.display())]
    NoFileName(PathBuf),
    #[error("failed to write {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}
