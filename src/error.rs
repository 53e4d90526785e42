//! Error types for derived state reconstruction.

use std::path::PathBuf;

use thiserror::Error;

use crate::tile::TileIndex;

/// A physically invalid result from one of the property derivations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// Node moisture larger than the node can hold.
    #[error("node {node} moisture {moist:.5} exceeds maximum node moisture {max_moist:.5}")]
    NodeMoistureExceedsMaximum { node: usize, moist: f64, max_moist: f64 },

    /// A derived property came out NaN, infinite or outside its admissible range.
    #[error("{property} at index {index} is out of range: {value}")]
    OutOfRange {
        property: &'static str,
        index: usize,
        value: f64,
    },

    /// Depth coordinates that do not increase strictly with index.
    #[error("{0} depths are not strictly increasing")]
    NonMonotonicDepths(&'static str),

    /// Array whose length disagrees with the configured count.
    #[error("{field} has {actual} entries, expected {expected}")]
    Length {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0}")]
    Invalid(String),
}

impl PropertyError {
    pub fn length(field: &'static str, expected: usize, actual: usize) -> Self {
        Self::Length {
            field,
            expected,
            actual,
        }
    }

    /// Check a computed value is finite and, if given, inside `[min, max]`.
    pub fn check_range(
        property: &'static str,
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<f64, Self> {
        if value.is_finite() && value >= min && value <= max {
            Ok(value)
        } else {
            Err(Self::OutOfRange {
                property,
                index,
                value,
            })
        }
    }
}

/// The step of cell processing that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NodeGrid,
    NodeMoisture,
    IceContent,
    FreezeThawFronts,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::NodeGrid => "node grid parameterization",
            Stage::NodeMoisture => "node moisture distribution",
            Stage::IceContent => "layer ice content estimation",
            Stage::FreezeThawFronts => "freeze/thaw front location",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal failure of a cell's derived state computation.
///
/// When this is returned none of the cell's derived state may be trusted.
#[derive(Error, Debug)]
pub enum DerivedStateError {
    #[error("property derivation failed during {stage}{}: {source}", tile_suffix(.tile))]
    PropertyDerivation {
        stage: Stage,
        tile: Option<TileIndex>,
        #[source]
        source: PropertyError,
    },

    /// Caller-supplied inputs disagree with the configured dimensions.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(#[from] PropertyError),

    /// Soil parameters outside their physical range.
    #[error("invalid soil parameters: {0}")]
    InvalidSoil(#[source] PropertyError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl DerivedStateError {
    pub fn property(stage: Stage, tile: Option<TileIndex>, source: PropertyError) -> Self {
        Self::PropertyDerivation {
            stage,
            tile,
            source,
        }
    }

    /// Length errors are dimension mismatches, anything else is bad soil data
    pub fn soil(source: PropertyError) -> Self {
        match source {
            PropertyError::Length { .. } => Self::DimensionMismatch(source),
            other => Self::InvalidSoil(other),
        }
    }
}

fn tile_suffix(tile: &Option<TileIndex>) -> String {
    match tile {
        Some(t) => format!(" for tile (veg {}, band {})", t.veg, t.band),
        None => String::new(),
    }
}

/// Failure to load or validate model options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid option {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
