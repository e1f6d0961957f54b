//! Chapter detection for unstructured plain text.
//!
//! Lines that look like chapter headings become chapters addressed as
//! `line_<index>`. Text without any heading is cut into fixed-size
//! character chunks addressed as `char_<offset>`.

use crate::config::ParserConfig;
use crate::reader::Chapter;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static CHAPTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^第[一二三四五六七八九十百千万0-9]+章",
        r"(?i)^Chapter\s+[0-9]+",
        r"^章节\s*[0-9]+",
        r"^[0-9]+\.",
        r"^[一二三四五六七八九十百千万]+[、.]",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A resolved position token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPosition {
    /// 0-based line index
    Line(usize),
    /// 0-based character offset
    Char(usize),
}

impl TextPosition {
    /// Parse `line_<n>` or `char_<n>`; anything else is `None`
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(n) = token.strip_prefix("line_") {
            return leading_number(n).map(TextPosition::Line);
        }
        if let Some(n) = token.strip_prefix("char_") {
            return leading_number(n).map(TextPosition::Char);
        }
        None
    }

    pub fn href(self) -> String {
        match self {
            TextPosition::Line(n) => format!("line_{n}"),
            TextPosition::Char(n) => format!("char_{n}"),
        }
    }
}

fn leading_number(s: &str) -> Option<usize> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Splits plain text into a flat chapter list
#[derive(Debug, Clone)]
pub struct TextChapterSegmenter {
    title_min: usize,
    title_max: usize,
    min_chunk_chars: usize,
    target_chunks: usize,
}

impl Default for TextChapterSegmenter {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl TextChapterSegmenter {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            title_min: config.chapter_title_min,
            title_max: config.chapter_title_max,
            min_chunk_chars: config.min_chunk_chars.max(1),
            target_chunks: config.target_chunks.max(1),
        }
    }

    /// Whether an already-trimmed line reads as a chapter heading
    pub fn is_chapter_title(&self, line: &str) -> bool {
        let len = line.chars().count();
        if len < self.title_min || len > self.title_max {
            return false;
        }
        CHAPTER_PATTERNS.iter().any(|p| p.is_match(line))
    }

    /// Chapters from headings, or length-based parts when there are none
    pub fn segment(&self, content: &str) -> Vec<Chapter> {
        let mut chapters = Vec::new();

        for (index, raw) in content.split('\n').enumerate() {
            let line = raw.trim();
            if self.is_chapter_title(line) {
                let title = if line.is_empty() {
                    format!("第 {} 章", chapters.len() + 1)
                } else {
                    line.to_string()
                };
                chapters.push(Chapter::new(title, TextPosition::Line(index).href()));
            }
        }

        if chapters.is_empty() {
            debug!("no chapter headings found, splitting by length");
            return self.split_by_length(content);
        }

        debug!("found {} chapter headings", chapters.len());
        chapters
    }

    /// Size of each fallback part, in characters
    pub fn chunk_len(&self, total_chars: usize) -> usize {
        self.min_chunk_chars.max(total_chars / self.target_chunks)
    }

    fn split_by_length(&self, content: &str) -> Vec<Chapter> {
        let total = content.chars().count();
        let chunk = self.chunk_len(total);

        if total == 0 {
            return vec![Chapter::new("第 1 部分", TextPosition::Char(0).href())];
        }

        (0..total)
            .step_by(chunk)
            .enumerate()
            .map(|(i, start)| Chapter::new(format!("第 {} 部分", i + 1), TextPosition::Char(start).href()))
            .collect()
    }
}

/// Content from a position token to the end.
///
/// `line_<n>` yields lines `n..` joined by `\n`, `char_<n>` the text from
/// character `n`. Missing or unrecognized tokens yield everything.
pub fn content_from(content: &str, position: Option<&str>) -> String {
    match position.and_then(TextPosition::parse) {
        Some(TextPosition::Line(n)) => content
            .split('\n')
            .skip(n)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(TextPosition::Char(n)) => content
            .char_indices()
            .nth(n)
            .map(|(i, _)| content[i..].to_string())
            .unwrap_or_default(),
        None => content.to_string(),
    }
}
