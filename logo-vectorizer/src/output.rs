use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConvertError;
use crate::tracer::SvgDocument;

/// Where the SVG should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Exact file path
    File(PathBuf),
    /// Directory; the file name is derived from the input
    Directory(PathBuf),
}

/// `Directory(d)` resolves to `d/<input stem>.svg`
pub fn resolve_output_path(input: &Path, target: &OutputTarget) -> Result<PathBuf, ConvertError> {
    match target {
        OutputTarget::File(path) => Ok(path.clone()),
        OutputTarget::Directory(dir) => {
            let stem = input
                .file_stem()
                .ok_or_else(|| ConvertError::NoFileName(input.to_path_buf()))?;
            let mut name = stem.to_os_string();
            name.push(".svg");
            Ok(dir.join(name))
        }
    }
}

/// Write `document` to `path`, creating parent directories and replacing
/// any existing file. Returns the number of bytes written.
pub fn write_svg(path: &Path, document: &SvgDocument) -> Result<u64, ConvertError> {
    let write_err = |source: std::io::Error| ConvertError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            debug!("Creating output directory {}", parent.display());
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    fs::write(path, document.as_str()).map_err(write_err)?;
    Ok(document.as_str().len() as u64)
}
