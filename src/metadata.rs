use serde::Serialize;
use std::path::Path;

/// Sentinel used when a book names no author
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Descriptive metadata for one book, produced fresh by each parse
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    /// Never empty; falls back to the file name
    pub title: String,
    pub author: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Position of the cover image inside the book, when it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl BookMetadata {
    /// Metadata with only the filename-derived title and defaults filled in
    pub fn fallback(path: &Path, language: &str) -> Self {
        Self {
            title: title_from_path(path),
            author: UNKNOWN_AUTHOR.to_string(),
            language: language.to_string(),
            description: None,
            publisher: None,
            identifier: None,
            cover: None,
            created: None,
            modified: None,
        }
    }
}

/// File name minus extension, underscores turned into spaces
pub fn title_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default();
    let stem = stem.trim();
    if stem.is_empty() {
        "Unknown".to_string()
    } else {
        stem.to_string()
    }
}

/// Trimmed value, `None` when blank
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Human-readable summary block, one field per line
pub fn format_metadata(metadata: &BookMetadata) -> String {
    let mut lines = Vec::new();

    lines.push(format!("# {}", metadata.title));
    lines.push(String::new());
    lines.push(format!("**Author:** {}", metadata.author));
    lines.push(format!("**Language:** {}", metadata.language));

    if let Some(publisher) = &metadata.publisher {
        lines.push(format!("**Publisher:** {}", publisher));
    }

    if let Some(identifier) = &metadata.identifier {
        lines.push(format!("**Identifier:** {}", identifier));
    }

    if let Some(created) = &metadata.created {
        lines.push(format!("**Created:** {}", created));
    }

    if let Some(description) = &metadata.description {
        if !description.is_empty() {
            lines.push(String::new());
            lines.push(format!("> {}", description));
        }
    }

    lines.join("\n") + "\n"
}
