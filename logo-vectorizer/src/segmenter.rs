//! Background removal backends.
//!
//! A [`Segmenter`] takes an encoded image and returns an encoded image whose
//! background has been made transparent. The model behind it is opaque; both
//! backends here talk to `rembg`, one by spawning its CLI and one over its
//! HTTP server.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use reqwest::blocking::{multipart, Client};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_REMBG_MODEL: &str = "u2net";
pub const DEFAULT_REMBG_URL: &str = "http://127.0.0.1:7000";

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("failed to exchange data with {program}: {source}")]
    Pipe {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("request to rembg server failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rembg server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("background removal produced no image data")]
    EmptyOutput,
}

/// Strips the background from an encoded image
pub trait Segmenter {
    fn remove_background(&self, encoded: &[u8]) -> Result<Vec<u8>, SegmentError>;
}

impl<S: Segmenter + ?Sized> Segmenter for &S {
    fn remove_background(&self, encoded: &[u8]) -> Result<Vec<u8>, SegmentError> {
        (**self).remove_background(encoded)
    }
}

impl<S: Segmenter + ?Sized> Segmenter for Box<S> {
    fn remove_background(&self, encoded: &[u8]) -> Result<Vec<u8>, SegmentError> {
        (**self).remove_background(encoded)
    }
}

/// Runs `rembg i -m <model> - -`, piping the image through stdin/stdout
#[derive(Debug, Clone)]
pub struct RembgCommand {
    program: PathBuf,
    model: String,
}

impl RembgCommand {
    pub fn new(program: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for RembgCommand {
    fn default() -> Self {
        Self::new("rembg", DEFAULT_REMBG_MODEL)
    }
}

impl Segmenter for RembgCommand {
    fn remove_background(&self, encoded: &[u8]) -> Result<Vec<u8>, SegmentError> {
        info!("Removing background with {} (model: {})", self.program_name(), self.model);

        let mut child = Command::new(&self.program)
            .args(["i", "-m", &self.model, "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SegmentError::Spawn {
                program: self.program_name(),
                source,
            })?;

        // rembg reads all of stdin before it writes anything, so the pipe
        // is closed here before waiting on output.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(encoded).map_err(|source| SegmentError::Pipe {
                program: self.program_name(),
                source,
            })?;
        }

        let output = child.wait_with_output().map_err(|source| SegmentError::Pipe {
            program: self.program_name(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} failed: {}", self.program_name(), stderr);
            return Err(SegmentError::Exit {
                program: self.program_name(),
                status: output.status,
                stderr,
            });
        }

        if output.stdout.is_empty() {
            return Err(SegmentError::EmptyOutput);
        }

        debug!("Background removed, {} bytes returned", output.stdout.len());
        Ok(output.stdout)
    }
}

/// Client for a running `rembg s` server
#[derive(Debug, Clone)]
pub struct RembgServer {
    client: Client,
    base_url: String,
    model: String,
}

impl RembgServer {
    /// The client carries no timeout of its own; the server decides how long
    /// a removal may take.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, SegmentError> {
        let client = Client::builder().timeout(None).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/remove", self.base_url.trim_end_matches('/'))
    }
}

impl Segmenter for RembgServer {
    fn remove_background(&self, encoded: &[u8]) -> Result<Vec<u8>, SegmentError> {
        let url = self.endpoint();
        info!("Removing background via {} (model: {})", url, self.model);

        // POST /api/remove takes its options as form fields, not query params
        let part = multipart::Part::bytes(encoded.to_vec()).file_name("input.png");
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let response = self.client.post(&url).multipart(form).send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            warn!("rembg server error: {} - {}", status, body);
            return Err(SegmentError::Status { status, body });
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(SegmentError::EmptyOutput);
        }

        debug!("Background removed, {} bytes returned", bytes.len());
        Ok(bytes.to_vec())
    }
}
