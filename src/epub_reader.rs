use crate::config::ParserConfig;
use crate::error::{BookError, Result};
use crate::format::BookFormat;
use crate::markdown;
use crate::metadata::{non_empty, title_from_path, BookMetadata, UNKNOWN_AUTHOR};
use crate::reader::{blocking, Chapter, CoverRef, FormatParser};
use async_trait::async_trait;
use log::{debug, warn};
use rbook::prelude::*;
use rbook::Epub;
use std::path::Path;

/// EPUB 2 and 3 books, read through `rbook`
pub struct EpubParser {
    default_language: String,
}

/// An opened archive, owned by one blocking task and dropped with it
struct EpubData {
    epub: Epub,
}

impl EpubData {
    fn open(path: &Path) -> Result<Self> {
        let epub = Epub::options()
            .strict(false)
            .open(path)
            .map_err(|e| BookError::Epub(format!("failed to open {}: {}", path.display(), e)))?;
        Ok(Self { epub })
    }

    fn title(&self) -> Option<String> {
        self.epub
            .metadata()
            .title()
            .map(|t| t.value().to_string())
    }

    fn authors(&self) -> Vec<String> {
        let mut authors = Vec::new();
        for creator in self.epub.metadata().creators() {
            let name = creator.value().trim();
            if !name.is_empty() {
                authors.push(name.to_string());
            }
        }
        authors
    }

    fn language(&self) -> Option<String> {
        let mut langs = self.epub.metadata().languages();
        langs.next().map(|l| l.value().to_string())
    }

    fn description(&self) -> Option<String> {
        let mut descs = self.epub.metadata().descriptions();
        descs
            .next()
            .map(|d| markdown::extract_text_from_html(d.value()))
    }

    fn publisher(&self) -> Option<String> {
        let mut pubs = self.epub.metadata().publishers();
        pubs.next().map(|p| p.value().to_string())
    }

    fn identifier(&self) -> Option<String> {
        self.epub
            .metadata()
            .identifier()
            .map(|i| i.value().to_string())
    }

    /// Manifest item declared as cover, else the first image whose id mentions "cover"
    fn cover_href(&self) -> Option<String> {
        let manifest = self.epub.manifest();

        if let Some(cover) = manifest.cover_image() {
            return Some(cover.href().to_string());
        }

        for item in manifest.images() {
            if item.id().to_lowercase().contains("cover") {
                return Some(item.href().to_string());
            }
        }

        None
    }

    fn cover(&self) -> Result<Option<CoverRef>> {
        let Some(href) = self.cover_href() else {
            return Ok(None);
        };
        let manifest = self.epub.manifest();
        let Some(item) = manifest.by_href(&href) else {
            return Ok(None);
        };

        let data = item
            .read_bytes()
            .map_err(|e| BookError::Epub(format!("failed to read cover {}: {}", href, e)))?;

        Ok(Some(CoverRef {
            href: normalize_href(&href).to_string(),
            media_type: item.media_type().to_string(),
            data,
        }))
    }

    /// Navigation document as a chapter tree
    fn toc(&self) -> Vec<Chapter> {
        let toc = self.epub.toc();

        let Some(root) = toc.contents() else {
            return Vec::new();
        };

        fn convert_entry<'a>(entry: impl rbook::prelude::TocEntry<'a>) -> Chapter {
            let href = entry
                .resource()
                .map(|r| {
                    use rbook::ebook::resource::ResourceKey;
                    match r.key() {
                        ResourceKey::Value(s) => normalize_href(&s.to_string()).to_string(),
                        ResourceKey::Position(pos) => pos.to_string(),
                    }
                })
                .unwrap_or_default();

            let mut chapter = Chapter::new(entry.label().trim(), href);
            chapter.children = entry.children().iter().map(convert_entry).collect();
            chapter
        }

        root.children().iter().map(convert_entry).collect()
    }

    /// Spine documents in reading order as (archive path, xhtml)
    fn spine_documents(&self) -> Result<Vec<(String, String)>> {
        let spine = self.epub.spine();
        let manifest = self.epub.manifest();

        let mut documents = Vec::new();
        for entry in spine.entries() {
            let Some(item) = manifest.by_id(entry.idref()) else {
                warn!("spine references missing manifest item {}", entry.idref());
                continue;
            };
            let html = self
                .epub
                .read_resource_str(item.href())
                .map_err(|e| BookError::Epub(format!("failed to read {}: {}", item.href(), e)))?;
            documents.push((normalize_href(&item.href().to_string()).to_string(), html));
        }

        Ok(documents)
    }

    /// One chapter per spine document, for books with an empty navigation document
    fn spine_chapters(&self) -> Result<Vec<Chapter>> {
        Ok(self
            .spine_documents()?
            .into_iter()
            .enumerate()
            .map(|(i, (href, html))| {
                let title = markdown::document_title(&html)
                    .unwrap_or_else(|| format!("Chapter {}", i + 1));
                Chapter::new(title, href)
            })
            .collect())
    }

    /// Whole book, document by document, in spine order
    fn full_text(&self) -> Result<String> {
        let mut parts = Vec::new();
        let mut reader = self.epub.reader();

        while let Some(result) = reader.read_next() {
            let data = result.map_err(|e| BookError::Epub(format!("failed to read chapter content: {}", e)))?;
            let text = markdown::html_to_markdown(data.content());

            // Skip empty or near-empty content
            if text.trim().is_empty() {
                continue;
            }
            parts.push(text);
        }

        Ok(parts.join("\n"))
    }

    /// From the document named by `position` (and its anchor) to the end
    fn text_from(&self, position: &str) -> Result<String> {
        let (target, fragment) = split_fragment(position);
        let documents = self.spine_documents()?;

        let Some(start) = documents
            .iter()
            .position(|(href, _)| same_resource(href, target))
        else {
            debug!("position {} not in spine, returning full content", position);
            return self.full_text();
        };

        let mut parts = Vec::new();
        for (i, (_, html)) in documents.iter().enumerate().skip(start) {
            let html = match fragment {
                Some(id) if i == start => markdown::slice_from_anchor(html, id),
                _ => html.as_str(),
            };
            let text = markdown::html_to_markdown(html);
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }

        Ok(parts.join("\n"))
    }
}

impl EpubParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            default_language: config.default_language.clone(),
        }
    }
}

fn metadata_from(epub: &EpubData, path: &Path, default_language: &str) -> BookMetadata {
    let authors = epub.authors();

    BookMetadata {
        title: non_empty(epub.title()).unwrap_or_else(|| title_from_path(path)),
        author: if authors.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            authors.join(", ")
        },
        language: non_empty(epub.language()).unwrap_or_else(|| default_language.to_string()),
        description: non_empty(epub.description()),
        publisher: non_empty(epub.publisher()),
        identifier: non_empty(epub.identifier()),
        cover: epub.cover_href().map(|h| normalize_href(&h).to_string()),
        created: None,
        modified: None,
    }
}

#[async_trait]
impl FormatParser for EpubParser {
    fn format(&self) -> BookFormat {
        BookFormat::Epub
    }

    fn extensions(&self) -> &[&'static str] {
        &["epub"]
    }

    async fn read_metadata(&self, path: &Path) -> Result<BookMetadata> {
        let path = path.to_path_buf();
        let default_language = self.default_language.clone();
        blocking(move || {
            let epub = EpubData::open(&path)?;
            Ok(metadata_from(&epub, &path, &default_language))
        })
        .await
    }

    async fn read_cover(&self, path: &Path) -> Result<Option<CoverRef>> {
        let path = path.to_path_buf();
        blocking(move || EpubData::open(&path)?.cover()).await
    }

    async fn read_table_of_contents(&self, path: &Path) -> Result<Vec<Chapter>> {
        let path = path.to_path_buf();
        blocking(move || {
            let epub = EpubData::open(&path)?;
            let chapters = epub.toc();
            if !chapters.is_empty() {
                return Ok(chapters);
            }
            debug!("{} has no navigation entries, using spine", path.display());
            epub.spine_chapters()
        })
        .await
    }

    async fn read_content(&self, path: &Path, position: Option<&str>) -> Result<String> {
        let path = path.to_path_buf();
        let position = position.map(str::to_string);
        blocking(move || {
            let epub = EpubData::open(&path)?;
            match position.as_deref() {
                Some(p) => epub.text_from(p),
                None => epub.full_text(),
            }
        })
        .await
    }
}

/// Archive path without leading slash
fn normalize_href(href: &str) -> &str {
    href.trim_start_matches('/')
}

/// Split `path#fragment` into its parts
fn split_fragment(position: &str) -> (&str, Option<&str>) {
    match position.split_once('#') {
        Some((path, frag)) if !frag.is_empty() => (normalize_href(path), Some(frag)),
        Some((path, _)) => (normalize_href(path), None),
        None => (normalize_href(position), None),
    }
}

/// Whether two archive paths name the same file, tolerating a missing directory prefix
fn same_resource(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_href(a), normalize_href(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.ends_with(&format!("/{b}")) || b.ends_with(&format!("/{a}"))
}
