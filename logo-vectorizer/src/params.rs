use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::enhance::EnhancementLevel;

/// Color handling of the tracer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Color,
    /// Black and white only
    Binary,
}

/// How overlapping color layers are nested in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Hierarchical {
    #[default]
    Stacked,
    Cutout,
}

/// Curve fitting style for path segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CurveMode {
    #[default]
    Spline,
    Polygon,
    None,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("length_threshold must be a finite number >= 0, got {0}")]
    LengthThreshold(f64),
}

/// Unchecked tracer settings, as they arrive from the command line.
///
/// Integers are signed so negative input reaches validation instead of
/// failing somewhere in argument parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSettings {
    pub color_mode: ColorMode,
    pub hierarchical: Hierarchical,
    pub mode: CurveMode,
    pub filter_speckle: i64,
    pub color_precision: i64,
    pub layer_difference: i64,
    pub corner_threshold: i64,
    pub length_threshold: f64,
    pub max_iterations: i64,
    pub splice_threshold: i64,
    pub path_precision: i64,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchical::Stacked,
            mode: CurveMode::Spline,
            filter_speckle: 12,
            color_precision: 7,
            layer_difference: 32,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 8,
        }
    }
}

/// Validated tracer options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceOptions {
    pub color_mode: ColorMode,
    pub hierarchical: Hierarchical,
    pub mode: CurveMode,
    pub filter_speckle: u32,
    pub color_precision: u32,
    pub layer_difference: u32,
    pub corner_threshold: u32,
    pub length_threshold: f64,
    pub max_iterations: u32,
    pub splice_threshold: u32,
    pub path_precision: u32,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchical::Stacked,
            mode: CurveMode::Spline,
            filter_speckle: 12,
            color_precision: 7,
            layer_difference: 32,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: 8,
        }
    }
}

fn in_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<u32, ParamError> {
    if value < min || value > max {
        return Err(ParamError::OutOfRange { name, value, min, max });
    }
    Ok(value as u32)
}

fn at_least(name: &'static str, value: i64, min: i64) -> Result<u32, ParamError> {
    in_range(name, value, min, u32::MAX as i64)
}

impl TryFrom<TraceSettings> for TraceOptions {
    type Error = ParamError;

    fn try_from(s: TraceSettings) -> Result<Self, Self::Error> {
        if !s.length_threshold.is_finite() || s.length_threshold < 0.0 {
            return Err(ParamError::LengthThreshold(s.length_threshold));
        }

        Ok(Self {
            color_mode: s.color_mode,
            hierarchical: s.hierarchical,
            mode: s.mode,
            filter_speckle: in_range("filter_speckle", s.filter_speckle, 0, 255)?,
            color_precision: in_range("color_precision", s.color_precision, 1, 8)?,
            layer_difference: in_range("layer_difference", s.layer_difference, 0, 255)?,
            corner_threshold: in_range("corner_threshold", s.corner_threshold, 0, 180)?,
            length_threshold: s.length_threshold,
            max_iterations: at_least("max_iterations", s.max_iterations, 1)?,
            splice_threshold: in_range("splice_threshold", s.splice_threshold, 0, 180)?,
            path_precision: at_least("path_precision", s.path_precision, 0)?,
        })
    }
}

/// Everything one conversion needs, checked once up front
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionParams {
    trace: TraceOptions,
    enhancement: EnhancementLevel,
    remove_background: bool,
}

impl ConversionParams {
    pub fn new(
        settings: TraceSettings,
        enhancement: EnhancementLevel,
        remove_background: bool,
    ) -> Result<Self, ParamError> {
        Ok(Self {
            trace: TraceOptions::try_from(settings)?,
            enhancement,
            remove_background,
        })
    }

    pub fn trace(&self) -> &TraceOptions {
        &self.trace
    }

    pub fn enhancement(&self) -> EnhancementLevel {
        self.enhancement
    }

    pub fn remove_background(&self) -> bool {
        self.remove_background
    }
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            trace: TraceOptions::default(),
            enhancement: EnhancementLevel::default(),
            remove_background: true,
        }
    }
}
