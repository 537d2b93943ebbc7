//! Error types for outline extraction.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for outline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting an outline.
///
/// The heuristic stages themselves are total; errors only come from I/O,
/// the PDF layer, configuration, or a span stream that breaks the ordering
/// contract.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The PDF could not be loaded or decoded.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// A span dump or config file was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spans were not delivered in ascending (page, order) sequence.
    #[error(
        "Invalid input order: span (page {page}, order {order}) follows (page {previous_page}, order {previous_order})"
    )]
    InvalidInputOrder {
        page: usize,
        order: usize,
        previous_page: usize,
        previous_order: usize,
    },

    /// Two inputs of a batch map to the same output file.
    #[error("Output {} is already written for {}", .output.display(), .first.display())]
    OutputConflict { output: PathBuf, first: PathBuf },

    /// The input path is neither a PDF, a span dump, nor a directory.
    #[error("Unsupported input: {}", .0.display())]
    UnsupportedInput(PathBuf),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
