use crate::config::ParserConfig;
use crate::error::{BookError, Result};
use crate::format::BookFormat;
use crate::metadata::{non_empty, title_from_path, BookMetadata, UNKNOWN_AUTHOR};
use crate::reader::{blocking, Chapter, CoverRef, FormatParser};
use crate::txt_reader::detect_language;
use async_trait::async_trait;
use log::{debug, warn};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Description used when the document declares no subject
const DEFAULT_DESCRIPTION: &str = "PDF文档";

/// Pages sampled for language detection
const LANGUAGE_SAMPLE_PAGES: usize = 3;

/// Page separator in extracted text
const PAGE_BREAK: &str = "\x0C";

/// PDF documents, read through `lopdf`
pub struct PdfParser {
    config: ParserConfig,
}

impl PdfParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    async fn load(path: &Path) -> Result<Document> {
        let path = path.to_path_buf();
        blocking(move || Document::load(&path).map_err(BookError::from)).await
    }

    /// Page count guessed from file size.
    ///
    /// Only an approximation for documents lopdf cannot open; never ground truth.
    pub async fn estimate_page_count(&self, path: &Path) -> usize {
        match tokio::fs::metadata(path).await {
            Ok(meta) => estimate_pages(meta.len(), self.config.pdf_pages_per_mb),
            Err(e) => {
                warn!("Error getting PDF page count for {}: {}", path.display(), e);
                1
            }
        }
    }

    fn synthesize_ranges(&self, page_count: usize) -> Vec<Chapter> {
        page_ranges(page_count, self.config.pdf_target_ranges)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| {
                Chapter::new(
                    format!("第 {} 章 (页 {}-{})", i + 1, start, end),
                    format!("page_{start}"),
                )
            })
            .collect()
    }
}

#[async_trait]
impl FormatParser for PdfParser {
    fn format(&self) -> BookFormat {
        BookFormat::Pdf
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    async fn read_metadata(&self, path: &Path) -> Result<BookMetadata> {
        let path = path.to_path_buf();
        let config = self.config.clone();
        blocking(move || {
            let doc = Document::load(&path)?;
            Ok(metadata_from(&doc, &path, &config))
        })
        .await
    }

    async fn read_cover(&self, _path: &Path) -> Result<Option<CoverRef>> {
        Ok(None)
    }

    async fn read_table_of_contents(&self, path: &Path) -> Result<Vec<Chapter>> {
        let doc = match Self::load(path).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("{}: {}, synthesizing chapters from estimated pages", path.display(), e);
                let pages = self.estimate_page_count(path).await;
                return Ok(self.synthesize_ranges(pages));
            }
        };

        let page_count = doc.get_pages().len().max(1);
        let bookmarks = blocking(move || Ok(outline_chapters(&doc)))
            .await
            .unwrap_or_else(|e| {
                warn!("{}: unreadable outline: {}", path.display(), e);
                Vec::new()
            });
        if !bookmarks.is_empty() {
            debug!("{}: {} bookmarks", path.display(), bookmarks.len());
            return Ok(bookmarks);
        }

        Ok(self.synthesize_ranges(page_count))
    }

    async fn read_content(&self, path: &Path, position: Option<&str>) -> Result<String> {
        let doc = Self::load(path).await?;
        let first = position.and_then(parse_page).unwrap_or(1);
        blocking(move || Ok(text_from_page(&doc, first))).await
    }
}

/// `max(1, floor(MB * pages_per_mb))`
fn estimate_pages(bytes: u64, pages_per_mb: f64) -> usize {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    ((mb * pages_per_mb).floor() as usize).max(1)
}

/// Inclusive 1-based page ranges, `max(1, pages / target)` pages each
fn page_ranges(page_count: usize, target: usize) -> Vec<(usize, usize)> {
    let page_count = page_count.max(1);
    let per = (page_count / target.max(1)).max(1);
    (1..=page_count)
        .step_by(per)
        .map(|start| (start, (start + per - 1).min(page_count)))
        .collect()
}

/// `page_<n>` with n >= 1
fn parse_page(position: &str) -> Option<usize> {
    let digits = position.strip_prefix("page_")?;
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok().filter(|&n| n >= 1)
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn dict_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Text strings are UTF-16BE with a byte-order mark, else UTF-8 or Latin-1
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE_u8, 0xFF][..]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

/// `D:YYYYMMDDHHmmSS…` without the prefix
fn pdf_date(raw: &str) -> String {
    raw.strip_prefix("D:").unwrap_or(raw).to_string()
}

/// Bookmarks flattened in reading order, addressed by page.
///
/// Entries whose destination does not resolve to a page are dropped;
/// their children are still visited.
fn outline_chapters(doc: &Document) -> Vec<Chapter> {
    let first = doc
        .catalog()
        .ok()
        .and_then(|catalog| dict_entry(doc, catalog, b"Outlines"))
        .and_then(|outlines| outlines.get(b"First").ok());
    let Some(first) = first else {
        debug!("no outline");
        return Vec::new();
    };

    let page_numbers: HashMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect();
    let mut visited = HashSet::new();
    let mut chapters = Vec::new();
    walk_outline(doc, first, &page_numbers, &mut visited, &mut chapters);
    chapters
}

/// Visit `node` and its `Next` siblings, descending into `First` children
fn walk_outline(
    doc: &Document,
    node: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
    visited: &mut HashSet<ObjectId>,
    chapters: &mut Vec<Chapter>,
) {
    let mut next = node.as_reference().ok();
    while let Some(id) = next {
        if !visited.insert(id) {
            warn!("outline item {:?} visited twice, stopping", id);
            return;
        }
        let Ok(item) = doc.get_dictionary(id) else {
            warn!("outline item {:?} is not a dictionary", id);
            return;
        };

        match outline_page(doc, item, page_numbers) {
            Some(page) => {
                let title = item
                    .get(b"Title")
                    .ok()
                    .and_then(|t| string_value(doc, t))
                    .and_then(|t| non_empty(Some(t)))
                    .unwrap_or_else(|| format!("第 {page} 页"));
                chapters.push(Chapter::new(title, format!("page_{page}")));
            }
            None => debug!("outline item {:?} has no page destination", id),
        }

        if let Ok(child) = item.get(b"First") {
            walk_outline(doc, child, page_numbers, visited, chapters);
        }
        next = item.get(b"Next").ok().and_then(|n| n.as_reference().ok());
    }
}

/// Page number targeted by an outline item's `Dest` or `GoTo` action
fn outline_page(doc: &Document, item: &Dictionary, page_numbers: &HashMap<ObjectId, u32>) -> Option<u32> {
    let dest = match item.get(b"Dest") {
        Ok(dest) => dest,
        Err(_) => dict_entry(doc, item, b"A")?.get(b"D").ok()?,
    };
    destination_page(doc, dest, page_numbers, 0)
}

fn destination_page(
    doc: &Document,
    dest: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
    depth: usize,
) -> Option<u32> {
    if depth > 4 {
        return None;
    }
    match resolve(doc, dest)? {
        Object::Array(items) => {
            let page_id = items.first()?.as_reference().ok()?;
            page_numbers.get(&page_id).copied()
        }
        Object::Dictionary(dict) => destination_page(doc, dict.get(b"D").ok()?, page_numbers, depth + 1),
        Object::String(name, _) | Object::Name(name) => {
            destination_page(doc, named_destination(doc, name)?, page_numbers, depth + 1)
        }
        _ => None,
    }
}

/// Look a named destination up in the catalog `Dests` dictionary or the `Names` tree
fn named_destination<'a>(doc: &'a Document, name: &[u8]) -> Option<&'a Object> {
    let catalog = doc.catalog().ok()?;
    if let Some(dest) = dict_entry(doc, catalog, b"Dests").and_then(|dests| dests.get(name).ok()) {
        return Some(dest);
    }
    let tree = dict_entry(doc, catalog, b"Names").and_then(|names| dict_entry(doc, names, b"Dests"))?;
    name_tree_lookup(doc, tree, name, 0)
}

fn name_tree_lookup<'a>(doc: &'a Document, node: &'a Dictionary, name: &[u8], depth: usize) -> Option<&'a Object> {
    if depth > 32 {
        return None;
    }
    if let Some(Object::Array(names)) = node.get(b"Names").ok().and_then(|n| resolve(doc, n)) {
        for pair in names.chunks_exact(2) {
            if pair[0].as_str().ok() == Some(name) {
                return Some(&pair[1]);
            }
        }
    }
    if let Some(Object::Array(kids)) = node.get(b"Kids").ok().and_then(|k| resolve(doc, k)) {
        for kid in kids {
            let found = resolve(doc, kid)
                .and_then(|k| k.as_dict().ok())
                .and_then(|k| name_tree_lookup(doc, k, name, depth + 1));
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    doc.dereference(object).ok().map(|(_, object)| object)
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    resolve(doc, dict.get(key).ok()?)?.as_dict().ok()
}

fn string_value(doc: &Document, object: &Object) -> Option<String> {
    match resolve(doc, object)? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Text of pages `first..`, pages separated by form feeds
fn text_from_page(doc: &Document, first: usize) -> String {
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    pages
        .iter()
        .filter(|&&n| n as usize >= first)
        .map(|&n| {
            doc.extract_text(&[n]).unwrap_or_else(|e| {
                warn!("Error extracting PDF text content from page {}: {}", n, e);
                String::new()
            })
        })
        .collect::<Vec<_>>()
        .join(PAGE_BREAK)
}

fn metadata_from(doc: &Document, path: &Path, config: &ParserConfig) -> BookMetadata {
    let info = info_dictionary(doc);
    let field = |key: &[u8]| info.and_then(|dict| dict_string(dict, key));

    let sample = sample_text(doc);
    let language = if sample.trim().is_empty() {
        config.default_language.clone()
    } else {
        detect_language(&sample, config.cjk_threshold).to_string()
    };

    BookMetadata {
        title: non_empty(field(b"Title")).unwrap_or_else(|| title_from_path(path)),
        author: non_empty(field(b"Author")).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        language,
        description: Some(
            non_empty(field(b"Subject")).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        ),
        publisher: None,
        identifier: None,
        cover: None,
        created: non_empty(field(b"CreationDate")).map(|d| pdf_date(&d)),
        modified: non_empty(field(b"ModDate")).map(|d| pdf_date(&d)),
    }
}

/// Text of the first few pages, empty when extraction fails
fn sample_text(doc: &Document) -> String {
    let pages: Vec<u32> = doc
        .get_pages()
        .keys()
        .copied()
        .take(LANGUAGE_SAMPLE_PAGES)
        .collect();
    doc.extract_text(&pages).unwrap_or_default()
}
