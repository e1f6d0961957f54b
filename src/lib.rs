//! # bookparse
//!
//! Detects, validates and reads ebooks in EPUB, PDF and plain-text form.
//!
//! | Format | Metadata source | Table of contents | Cover |
//! |--------|-----------------|-------------------|-------|
//! | EPUB | package document | navigation document (nested) | manifest cover image |
//! | PDF | Info dictionary | outline, else ~10 page ranges | none |
//! | TXT | leading lines + heuristics | chapter headings, else length chunks | none |
//!
//! Positions are opaque tokens taken from [`Chapter::href`]: an archive
//! path with optional fragment for EPUB, `page_<n>` for PDF and
//! `line_<n>` / `char_<n>` for plain text.
//!
//! ```rust,no_run
//! use bookparse::BookParsingService;
//! use std::path::Path;
//!
//! # async fn run() {
//! let service = BookParsingService::default();
//! let path = Path::new("novel.txt");
//!
//! let verdict = service.validate_book_file(path).await;
//! if verdict.is_valid {
//!     for chapter in service.get_book_table_of_contents(path).await {
//!         println!("{} -> {}", chapter.title, chapter.href);
//!     }
//! }
//! # }
//! ```

pub mod config;
pub mod epub_reader;
pub mod error;
pub mod format;
pub mod image;
pub mod markdown;
pub mod metadata;
pub mod pdf_reader;
pub mod reader;
pub mod segmenter;
pub mod service;
pub mod txt_reader;

pub use config::ParserConfig;
pub use error::{BookError, Result};
pub use format::{detect_format, BookFormat, FormatCapabilities};
pub use metadata::BookMetadata;
pub use reader::{Chapter, CoverRef, FormatParser, ParseResult, ValidationVerdict};
pub use segmenter::TextChapterSegmenter;
pub use service::BookParsingService;
