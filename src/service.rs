//! Format-agnostic entry point.
//!
//! Every operation detects the format from the path, dispatches to the
//! registered parser and converts any failure into the operation's
//! "nothing" value. No operation returns an error or panics on bad input.

use crate::config::ParserConfig;
use crate::epub_reader::EpubParser;
use crate::error::{BookError, Result};
use crate::format::{self, BookFormat, FormatCapabilities, SUPPORTED_FORMATS};
use crate::pdf_reader::PdfParser;
use crate::reader::{Chapter, CoverRef, FormatParser, ParseResult, ValidationVerdict};
use crate::txt_reader::TxtParser;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Holds one parser per format; construct once and share
#[derive(Clone)]
pub struct BookParsingService {
    parsers: HashMap<BookFormat, Arc<dyn FormatParser>>,
}

impl Default for BookParsingService {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl BookParsingService {
    /// Service with the EPUB, PDF and TXT parsers
    pub fn new(config: &ParserConfig) -> Self {
        Self::empty()
            .with_parser(Arc::new(EpubParser::new(config)))
            .with_parser(Arc::new(PdfParser::new(config)))
            .with_parser(Arc::new(TxtParser::new(config)))
    }

    /// Service with no parsers registered
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register `parser` for its format, replacing any previous one
    pub fn with_parser(mut self, parser: Arc<dyn FormatParser>) -> Self {
        self.register(parser);
        self
    }

    pub fn register(&mut self, parser: Arc<dyn FormatParser>) {
        self.parsers.insert(parser.format(), parser);
    }

    fn resolve(&self, path: &Path) -> Result<&dyn FormatParser> {
        let format = format::detect_format(path).ok_or(BookError::UnsupportedFormat)?;
        let parser = self
            .parsers
            .get(&format)
            .ok_or(BookError::NoParser(format))?;
        debug!("dispatching {} to {} parser", path.display(), format);
        Ok(parser.as_ref())
    }

    pub fn detect_file_format(&self, path: &Path) -> Option<BookFormat> {
        format::detect_format(path)
    }

    pub async fn parse_book_metadata(&self, path: &Path) -> ParseResult {
        match self.resolve(path) {
            Ok(parser) => parser.parse_metadata(path).await,
            Err(e) => ParseResult::failed(e.to_string()),
        }
    }

    pub async fn extract_book_cover(&self, path: &Path) -> Option<CoverRef> {
        match self.resolve(path) {
            Ok(parser) => parser.extract_cover(path).await,
            Err(e) => {
                debug!("no cover for {}: {}", path.display(), e);
                None
            }
        }
    }

    pub async fn get_book_table_of_contents(&self, path: &Path) -> Vec<Chapter> {
        match self.resolve(path) {
            Ok(parser) => parser.get_table_of_contents(path).await,
            Err(e) => {
                debug!("no table of contents for {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Content from `position` onward; empty when unavailable.
    ///
    /// An empty string does not prove the book is empty. Use
    /// [`try_get_book_content`](Self::try_get_book_content) to tell the two apart.
    pub async fn get_book_content(&self, path: &Path, position: Option<&str>) -> String {
        match self.resolve(path) {
            Ok(parser) => parser.get_content(path, position).await,
            Err(e) => {
                debug!("no content for {}: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Like [`get_book_content`](Self::get_book_content) but reports why content is missing
    pub async fn try_get_book_content(&self, path: &Path, position: Option<&str>) -> Result<String> {
        let parser = self.resolve(path)?;
        parser.check_extension(path)?;
        parser.read_content(path, position).await
    }

    /// Valid when the detected format's metadata parses
    pub async fn validate_book_file(&self, path: &Path) -> ValidationVerdict {
        let detected = format::detect_format(path);
        let result = self.parse_book_metadata(path).await;
        if let Some(error) = result.error() {
            warn!("{} failed validation: {}", path.display(), error);
        }

        ValidationVerdict {
            is_valid: result.is_success(),
            format: detected,
            error: result.error().map(str::to_string),
        }
    }

    pub fn get_supported_formats(&self) -> Vec<&'static str> {
        SUPPORTED_FORMATS.iter().map(|f| f.as_str()).collect()
    }

    pub fn is_format_supported(&self, format: &str) -> bool {
        format
            .parse::<BookFormat>()
            .map(|f| SUPPORTED_FORMATS.contains(&f))
            .unwrap_or(false)
    }

    pub fn get_format_display_name(&self, format: &str) -> String {
        format::display_name_for(format)
    }

    pub fn get_format_capabilities(&self, format: &str) -> FormatCapabilities {
        FormatCapabilities::for_format(format.parse().ok())
    }
}
