use crate::error::{BookError, Result};
use crate::format::BookFormat;
use crate::metadata::BookMetadata;
use async_trait::async_trait;
use log::warn;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::path::Path;

/// One navigable entry in a book's table of contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    /// Unique per parse; not stable across parses
    pub id: String,
    pub title: String,
    /// Position token understood only by the parser that issued it
    pub href: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Chapter>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    /// Count of this chapter and all descendants
    pub fn len_recursive(&self) -> usize {
        1 + self.children.iter().map(Chapter::len_recursive).sum::<usize>()
    }
}

/// Cover image bytes as stored in the book
#[derive(Debug, Clone, PartialEq)]
pub struct CoverRef {
    /// Location of the image inside the book
    pub href: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Outcome of a metadata parse: either metadata or an error message, never both.
///
/// Serializes as `{"success": true, "metadata": …}` or
/// `{"success": false, "error": …}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Success(BookMetadata),
    Failure(String),
}

impl ParseResult {
    pub fn ok(metadata: BookMetadata) -> Self {
        ParseResult::Success(metadata)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ParseResult::Failure(error.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn metadata(&self) -> Option<&BookMetadata> {
        match self {
            ParseResult::Success(metadata) => Some(metadata),
            ParseResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ParseResult::Success(_) => None,
            ParseResult::Failure(error) => Some(error),
        }
    }
}

impl Serialize for ParseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParseResult", 2)?;
        state.serialize_field("success", &self.is_success())?;
        match self {
            ParseResult::Success(metadata) => state.serialize_field("metadata", metadata)?,
            ParseResult::Failure(error) => state.serialize_field("error", error)?,
        }
        state.end()
    }
}

impl From<Result<BookMetadata>> for ParseResult {
    fn from(result: Result<BookMetadata>) -> Self {
        match result {
            Ok(metadata) => ParseResult::ok(metadata),
            Err(e) => ParseResult::failed(e.to_string()),
        }
    }
}

/// Whether a file looks like a readable book of its detected format
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<BookFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Uniform contract every format parser satisfies.
///
/// Implementors provide the fallible `read_*` methods. The provided
/// methods wrap them with the soft-failure contract callers rely on:
/// metadata errors become a `ParseResult`, while cover, table of
/// contents and content degrade to `None`, `[]` and `""`.
#[async_trait]
pub trait FormatParser: Send + Sync {
    fn format(&self) -> BookFormat;

    /// Extensions this parser accepts, lowercase, without the dot
    fn extensions(&self) -> &[&'static str];

    async fn read_metadata(&self, path: &Path) -> Result<BookMetadata>;

    async fn read_cover(&self, path: &Path) -> Result<Option<CoverRef>>;

    async fn read_table_of_contents(&self, path: &Path) -> Result<Vec<Chapter>>;

    /// Content from `position` to the end; all of it when `position` is `None`
    async fn read_content(&self, path: &Path, position: Option<&str>) -> Result<String>;

    async fn parse_metadata(&self, path: &Path) -> ParseResult {
        if let Err(e) = self.check_extension(path) {
            return ParseResult::failed(e.to_string());
        }
        self.read_metadata(path).await.into()
    }

    async fn extract_cover(&self, path: &Path) -> Option<CoverRef> {
        let result = match self.check_extension(path) {
            Ok(()) => self.read_cover(path).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!("Error extracting {} cover from {}: {}", self.format(), path.display(), e);
            None
        })
    }

    async fn get_table_of_contents(&self, path: &Path) -> Vec<Chapter> {
        let result = match self.check_extension(path) {
            Ok(()) => self.read_table_of_contents(path).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!(
                "Error getting {} table of contents for {}: {}",
                self.format(),
                path.display(),
                e
            );
            Vec::new()
        })
    }

    async fn get_content(&self, path: &Path, position: Option<&str>) -> String {
        let result = match self.check_extension(path) {
            Ok(()) => self.read_content(path, position).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!("Error getting {} content from {}: {}", self.format(), path.display(), e);
            String::new()
        })
    }

    fn check_extension(&self, path: &Path) -> Result<()> {
        if validate_extension(path, self.extensions()) {
            Ok(())
        } else {
            Err(BookError::InvalidFormatForParser {
                expected: self.format(),
                path: path.display().to_string(),
            })
        }
    }
}

/// Whether the path's final extension is one of `expected` (case-insensitive)
pub fn validate_extension(path: &Path, expected: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| expected.iter().any(|x| x.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Opaque identifier for a chapter produced by one parse
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Run a synchronous decoder without blocking the async executor
pub(crate) async fn blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}
