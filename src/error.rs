//! Error types for loading, indexing and evaluation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the loader, the grid index and the join pipeline.
///
/// Per-row errors ([`InvalidDataType`](GeoRelateError::InvalidDataType),
/// [`InvalidGeometry`](GeoRelateError::InvalidGeometry)) are recoverable:
/// the loader drops the offending row, counts it and keeps going. Every
/// other variant aborts the run.
#[derive(Error, Debug)]
pub enum GeoRelateError {
    /// Invalid command-line arguments or argument combination.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// A configured file path does not exist.
    #[error("no file at path: {}", .0.display())]
    InvalidFilepath(PathBuf),

    /// A file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the output file failed.
    #[error("failed to write output: {0}")]
    FileWrite(#[source] io::Error),

    /// Missing or malformed entry in the datasets INI catalogue.
    #[error("INI configuration error: {0}")]
    Ini(String),

    /// A WKT literal with an unrecognized geometry prefix.
    #[error("invalid data type: {0}")]
    InvalidDataType(String),

    /// A WKT literal that parsed to an empty or invalid geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A computed partition id fell outside the grid. Always indicates an
    /// inconsistent dataspace, never bad input.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// Vertex index out of range for the shape being edited.
    #[error("vertex index {index} out of bounds for shape with {len} vertices")]
    OutOfBounds { index: usize, len: usize },

    /// An operation the shape kind does not support.
    #[error("unsupported shape operation: {0}")]
    InvalidOperation(&'static str),
}

impl GeoRelateError {
    /// True for per-row errors that drop the row instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeoRelateError::InvalidDataType(_) | GeoRelateError::InvalidGeometry(_)
        )
    }
}

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, GeoRelateError>;
