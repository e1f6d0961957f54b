use crate::config::ParserConfig;
use crate::error::Result;
use crate::format::BookFormat;
use crate::metadata::{title_from_path, BookMetadata, UNKNOWN_AUTHOR};
use crate::reader::{Chapter, CoverRef, FormatParser};
use crate::segmenter::{self, TextChapterSegmenter};
use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static AUTHOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"作者[：:]\s*(.+)",
        r"著[：:]\s*(.+)",
        r"(?i)Author[：:]\s*(.+)",
        r"(?i)By[：:]\s*(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Plain-text books
pub struct TxtParser {
    config: ParserConfig,
    segmenter: TextChapterSegmenter,
}

impl TxtParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            config: config.clone(),
            segmenter: TextChapterSegmenter::new(config),
        }
    }

    async fn read_text(path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("{} is not valid UTF-8, decoding lossily", path.display());
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }

    /// First labeled author among the leading non-blank lines
    pub fn extract_author(&self, content: &str) -> Option<String> {
        for line in non_blank_lines(content).take(self.config.txt_scan_lines) {
            for pattern in AUTHOR_PATTERNS.iter() {
                let found = pattern
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim())
                    .filter(|name| !name.is_empty());
                if let Some(name) = found {
                    return Some(name.to_string());
                }
            }
        }
        None
    }

    /// First long line, truncated, with a trailing ellipsis
    pub fn extract_description(&self, content: &str) -> Option<String> {
        non_blank_lines(content)
            .map(str::trim)
            .find(|line| line.chars().count() > self.config.description_min_len)
            .map(|line| {
                let head: String = line.chars().take(self.config.description_max_len).collect();
                head + "..."
            })
    }

    /// Content from a position rendered as a minimal HTML page
    pub async fn formatted_content(&self, path: &Path, position: Option<&str>) -> String {
        let raw = self.get_content(path, position).await;
        let body = split_paragraphs(&raw)
            .iter()
            .map(|p| format!("<p>{}</p>", escape_html(p)))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
             </head>\n<body>\n{body}\n</body>\n</html>\n"
        )
    }
}

#[async_trait]
impl FormatParser for TxtParser {
    fn format(&self) -> BookFormat {
        BookFormat::Txt
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    async fn read_metadata(&self, path: &Path) -> Result<BookMetadata> {
        let content = Self::read_text(path).await?;

        Ok(BookMetadata {
            title: title_from_path(path),
            author: self
                .extract_author(&content)
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            language: detect_language(&content, self.config.cjk_threshold).to_string(),
            description: self.extract_description(&content),
            publisher: None,
            identifier: None,
            cover: None,
            created: None,
            modified: None,
        })
    }

    async fn read_cover(&self, _path: &Path) -> Result<Option<CoverRef>> {
        Ok(None)
    }

    async fn read_table_of_contents(&self, path: &Path) -> Result<Vec<Chapter>> {
        let content = Self::read_text(path).await?;
        let chapters = self.segmenter.segment(&content);
        debug!("{}: {} chapters", path.display(), chapters.len());
        Ok(chapters)
    }

    async fn read_content(&self, path: &Path, position: Option<&str>) -> Result<String> {
        let content = Self::read_text(path).await?;
        Ok(segmenter::content_from(&content, position))
    }
}

fn non_blank_lines(content: &str) -> impl Iterator<Item = &str> {
    content.split('\n').filter(|line| !line.trim().is_empty())
}

/// `zh-CN` when CJK ideographs make up more than `threshold` of all characters
pub fn detect_language(content: &str, threshold: f64) -> &'static str {
    let total = content.chars().count();
    if total == 0 {
        return "en";
    }
    let cjk = content
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c))
        .count();

    if cjk as f64 / total as f64 > threshold {
        "zh-CN"
    } else {
        "en"
    }
}

/// Blank-line separated paragraphs, trimmed, empties dropped
pub fn split_paragraphs(content: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(content)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_txt(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    fn parser() -> TxtParser {
        TxtParser::new(&ParserConfig::default())
    }

    #[test]
    fn language_threshold_is_exclusive() {
        let at = format!("{}{}", "中".repeat(300), "a".repeat(700));
        assert_eq!(detect_language(&at, 0.3), "en");

        let above = format!("{}{}", "中".repeat(310), "a".repeat(690));
        assert_eq!(detect_language(&above, 0.3), "zh-CN");

        assert_eq!(detect_language("", 0.3), "en");
    }

    #[test]
    fn author_first_match_wins() {
        let text = "\n\nThe Title\nBy: Jane Roe\nAuthor: Someone Else\n";
        assert_eq!(parser().extract_author(text).as_deref(), Some("Jane Roe"));

        let cn = "书名\n作者：张三\n";
        assert_eq!(parser().extract_author(cn).as_deref(), Some("张三"));
    }

    #[test]
    fn author_scan_stops_after_twenty_lines() {
        let mut text = "filler\n".repeat(20);
        text.push_str("Author: Too Late\n");
        assert_eq!(parser().extract_author(&text), None);

        let mut blanks = "\n\n".repeat(30);
        blanks.push_str("Author: Found\n");
        assert_eq!(parser().extract_author(&blanks).as_deref(), Some("Found"));
    }

    #[test]
    fn description_is_truncated_with_ellipsis() {
        let long = "w".repeat(300);
        let text = format!("short\n{long}\n");
        let desc = parser().extract_description(&text).unwrap();
        assert_eq!(desc.chars().count(), 203);
        assert!(desc.ends_with("..."));

        assert_eq!(parser().extract_description("tiny\nlines\n"), None);
    }

    #[tokio::test]
    async fn metadata_from_file() {
        let body = format!("作者：李四\n\n{}\n", "这是一个很长的开头段落，".repeat(10));
        let (_dir, path) = write_txt("my_great_book.txt", &body);

        let meta = parser().read_metadata(&path).await.unwrap();
        assert_eq!(meta.title, "my great book");
        assert_eq!(meta.author, "李四");
        assert_eq!(meta.language, "zh-CN");
        assert!(meta.description.unwrap().ends_with("..."));
    }

    #[tokio::test]
    async fn wrong_extension_fails_metadata() {
        let (_dir, path) = write_txt("book.md", "hello");
        let result = parser().parse_metadata(&path).await;
        assert_eq!(result.error(), Some("Invalid TXT file format"));
    }

    #[tokio::test]
    async fn missing_file_degrades_softly() {
        let path = Path::new("/definitely/not/here.txt");
        let p = parser();
        assert!(!p.parse_metadata(path).await.is_success());
        assert!(p.get_table_of_contents(path).await.is_empty());
        assert_eq!(p.get_content(path, None).await, "");
        assert!(p.extract_cover(path).await.is_none());
    }

    #[tokio::test]
    async fn content_round_trips_positions() {
        let text = "line zero\nline one\nline two\nline three";
        let (_dir, path) = write_txt("a.txt", text);
        let p = parser();

        assert_eq!(p.get_content(&path, None).await, text);
        assert_eq!(p.get_content(&path, Some("char_10")).await, &text[10..]);
        assert_eq!(p.get_content(&path, Some("line_2")).await, "line two\nline three");
    }

    #[tokio::test]
    async fn formatted_content_wraps_paragraphs() {
        let (_dir, path) = write_txt("a.txt", "first <para>\n\n  \nsecond & last");
        let html = parser().formatted_content(&path, None).await;
        assert!(html.contains("<p>first &lt;para&gt;</p>\n<p>second &amp; last</p>"));
    }
}
