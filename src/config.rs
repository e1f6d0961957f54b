use crate::error::{BookError, Result};
use serde::Deserialize;
use std::path::Path;

/// Tunable constants for the parsing heuristics.
///
/// Every field has a default; a JSON file may override any subset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Non-blank lines scanned for an author label in plain text
    pub txt_scan_lines: usize,
    /// A line must be longer than this to become the description
    pub description_min_len: usize,
    /// Description is cut to this many characters before the ellipsis
    pub description_max_len: usize,
    /// CJK fraction above which text is tagged `zh-CN`
    pub cjk_threshold: f64,
    pub chapter_title_min: usize,
    pub chapter_title_max: usize,
    /// Lower bound on the fallback chunk size, in characters
    pub min_chunk_chars: usize,
    /// Desired number of fallback chunks for long texts
    pub target_chunks: usize,
    /// Number of page ranges synthesized when a PDF has no outline
    pub pdf_target_ranges: usize,
    /// Page-count estimate per megabyte for unreadable PDFs
    pub pdf_pages_per_mb: f64,
    /// Language reported when nothing better is known
    pub default_language: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            txt_scan_lines: 20,
            description_min_len: 50,
            description_max_len: 200,
            cjk_threshold: 0.3,
            chapter_title_min: 2,
            chapter_title_max: 100,
            min_chunk_chars: 5000,
            target_chunks: 20,
            pdf_target_ranges: 10,
            pdf_pages_per_mb: 10.0,
            default_language: "zh-CN".to_string(),
        }
    }
}

impl ParserConfig {
    /// Load a config from a JSON file, filling gaps with defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| BookError::ParseFailure(format!("invalid config {}: {}", path.display(), e)))
    }
}
