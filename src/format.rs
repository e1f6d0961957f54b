use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Container format of a book file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Epub,
    Pdf,
    Txt,
    /// Recognized on detection, but no parser handles it
    Mobi,
}

/// Formats with a parser behind them
pub const SUPPORTED_FORMATS: [BookFormat; 3] = [BookFormat::Epub, BookFormat::Pdf, BookFormat::Txt];

impl BookFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            BookFormat::Epub => "epub",
            BookFormat::Pdf => "pdf",
            BookFormat::Txt => "txt",
            BookFormat::Mobi => "mobi",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BookFormat::Epub => "EPUB电子书",
            BookFormat::Pdf => "PDF文档",
            BookFormat::Txt => "文本文件",
            BookFormat::Mobi => "Kindle电子书",
        }
    }
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "epub" => Ok(BookFormat::Epub),
            "pdf" => Ok(BookFormat::Pdf),
            "txt" => Ok(BookFormat::Txt),
            "mobi" => Ok(BookFormat::Mobi),
            _ => Err(()),
        }
    }
}

/// Map a path to its format tag using only the final extension.
///
/// Pure: the file is never touched.
pub fn detect_format(path: &Path) -> Option<BookFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
}

/// Display name for an arbitrary tag; unknown tags are upper-cased
pub fn display_name_for(format: &str) -> String {
    match format.parse::<BookFormat>() {
        Ok(known) => known.display_name().to_string(),
        Err(()) => format.to_uppercase(),
    }
}

/// Which optional operations return meaningful results for a format.
///
/// Static per format, never per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatCapabilities {
    pub has_table_of_contents: bool,
    pub has_cover: bool,
    pub supports_bookmarks: bool,
    pub supports_search: bool,
}

impl FormatCapabilities {
    pub fn for_format(format: Option<BookFormat>) -> Self {
        match format {
            Some(BookFormat::Epub) => Self {
                has_table_of_contents: true,
                has_cover: true,
                supports_bookmarks: true,
                supports_search: true,
            },
            Some(BookFormat::Pdf) => Self {
                has_table_of_contents: true,
                has_cover: false,
                supports_bookmarks: true,
                supports_search: false,
            },
            Some(BookFormat::Txt) => Self {
                has_table_of_contents: true,
                has_cover: false,
                supports_bookmarks: true,
                supports_search: true,
            },
            Some(BookFormat::Mobi) | None => Self::default(),
        }
    }
}
