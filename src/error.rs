use crate::format::BookFormat;
use std::io;

/// Result type alias for book parsing operations
pub type Result<T> = std::result::Result<T, BookError>;

/// Errors raised inside the parsing core.
///
/// Public façade operations never return these directly except through
/// `try_*` entry points; everything else converts them into the soft
/// sentinels callers expect (`ParseResult`, `None`, `[]`, `""`).
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// Extension not in the recognized set
    #[error("Unsupported file format")]
    UnsupportedFormat,

    /// A parser was handed a path whose extension it does not accept
    #[error("Invalid {label} file format", label = .expected.as_str().to_uppercase())]
    InvalidFormatForParser { expected: BookFormat, path: String },

    /// Detection succeeded but nothing is registered for the tag
    #[error("No parser available for {0} format")]
    NoParser(BookFormat),

    /// Structural or content corruption
    #[error("Parse error: {0}")]
    ParseFailure(String),

    #[error("EPUB error: {0}")]
    Epub(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    /// A blocking decode task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<tokio::task::JoinError> for BookError {
    fn from(err: tokio::task::JoinError) -> Self {
        BookError::Join(err.to_string())
    }
}

impl From<lopdf::Error> for BookError {
    fn from(err: lopdf::Error) -> Self {
        BookError::Pdf(err.to_string())
    }
}
