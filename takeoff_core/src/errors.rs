//! # Error Types
//!
//! Structured error types for takeoff_core. Every calculator raises one of
//! these synchronously and the caller decides how to present it. Nothing in
//! the engine recovers from an error or substitutes a default: a missing grid
//! reference silently defaulted to zero would corrupt a cost estimate.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::errors::{CalcError, CalcResult};
//!
//! fn validate_depth(depth_m: f64) -> CalcResult<()> {
//!     if depth_m <= 0.0 {
//!         return Err(CalcError::invalid_dimension(
//!             "depth_m",
//!             depth_m,
//!             "Depth must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(validate_depth(-1.0).unwrap_err().error_code(), "INVALID_DIMENSION");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for takeoff_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
///
/// Each variant carries enough context for an editor to point the user at
/// the offending input without re-running the calculation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// One or more grid labels are missing from the axis they were looked up on
    #[error("Grid line(s) {labels:?} not found on axis {axis}; available: {available:?}")]
    GridLineNotFound {
        axis: String,
        labels: Vec<String>,
        available: Vec<String>,
    },

    /// Level label is not defined
    #[error("Level '{label}' not found; available: {available:?}")]
    LevelNotFound {
        label: String,
        available: Vec<String>,
    },

    /// Polygon boundary with fewer than three points
    #[error("Invalid polygon: {point_count} point(s) supplied, at least 3 required")]
    InvalidPolygon { point_count: usize },

    /// Boundary tag other than gridRect/polygon
    #[error("Unknown boundary type: '{tag}'")]
    UnknownBoundaryType { tag: String },

    /// Not enough cross-section stations for the requested volume method
    #[error("Insufficient stations for {method}: {found} supplied, {required} required")]
    InsufficientStations {
        method: String,
        required: usize,
        found: usize,
    },

    /// A dimension, waste or slope value is outside its valid range
    #[error("Invalid dimension '{field}': {value} - {reason}")]
    InvalidDimension {
        field: String,
        value: f64,
        reason: String,
    },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// An entity referenced by id (finish type, template, space, ...) does not exist
    #[error("{kind} not found: '{id}'")]
    NotFound { kind: String, id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create a GridLineNotFound error for a single label
    pub fn grid_line_not_found(
        axis: impl Into<String>,
        label: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        CalcError::GridLineNotFound {
            axis: axis.into(),
            labels: vec![label.into()],
            available,
        }
    }

    /// Create a LevelNotFound error
    pub fn level_not_found(label: impl Into<String>, available: Vec<String>) -> Self {
        CalcError::LevelNotFound {
            label: label.into(),
            available,
        }
    }

    /// Create an InsufficientStations error
    pub fn insufficient_stations(method: impl Into<String>, required: usize, found: usize) -> Self {
        CalcError::InsufficientStations {
            method: method.into(),
            required,
            found,
        }
    }

    /// Create an InvalidDimension error
    pub fn invalid_dimension(field: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        CalcError::InvalidDimension {
            field: field.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CalcError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::GridLineNotFound { .. } => "GRID_LINE_NOT_FOUND",
            CalcError::LevelNotFound { .. } => "LEVEL_NOT_FOUND",
            CalcError::InvalidPolygon { .. } => "INVALID_POLYGON",
            CalcError::UnknownBoundaryType { .. } => "UNKNOWN_BOUNDARY_TYPE",
            CalcError::InsufficientStations { .. } => "INSUFFICIENT_STATIONS",
            CalcError::InvalidDimension { .. } => "INVALID_DIMENSION",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
