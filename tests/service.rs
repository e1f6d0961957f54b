mod common;

use bookparse::{BookFormat, BookParsingService, ParserConfig};
use std::path::Path;

fn service() -> BookParsingService {
    BookParsingService::new(&ParserConfig::default())
}

#[tokio::test]
async fn unsupported_extension_returns_sentinels() {
    let s = service();
    let path = Path::new("cover.jpg");

    assert_eq!(s.detect_file_format(path), None);

    let result = s.parse_book_metadata(path).await;
    assert!(!result.is_success());
    assert_eq!(result.error(), Some("Unsupported file format"));

    assert!(s.extract_book_cover(path).await.is_none());
    assert!(s.get_book_table_of_contents(path).await.is_empty());
    assert_eq!(s.get_book_content(path, None).await, "");
    assert_eq!(s.get_book_content(path, Some("line_3")).await, "");
    assert!(s.try_get_book_content(path, None).await.is_err());

    let verdict = s.validate_book_file(path).await;
    assert!(!verdict.is_valid);
    assert_eq!(verdict.format, None);
    assert_eq!(verdict.error.as_deref(), Some("Unsupported file format"));
}

#[tokio::test]
async fn validation_agrees_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let epub = dir.path().join("good.epub");
    common::write_epub(&epub, Some("Good"));
    let pdf = dir.path().join("good.pdf");
    common::write_pdf(&pdf, 2, "Good");

    let paths = vec![
        common::write_file(&dir, "story.txt", "Author: Someone\n\nOnce upon a time.".as_bytes()),
        common::write_file(&dir, "bad.pdf", b"%PDF-garbage"),
        common::write_file(&dir, "bad.epub", b"garbage"),
        dir.path().join("missing.txt"),
        dir.path().join("book.mobi"),
        dir.path().join("notes.doc"),
        epub,
        pdf,
    ];

    let s = service();
    for path in &paths {
        let verdict = s.validate_book_file(path).await;
        let metadata = s.parse_book_metadata(path).await;
        assert_eq!(verdict.is_valid, metadata.is_success(), "{}", path.display());
        assert_eq!(verdict.error.as_deref(), metadata.error(), "{}", path.display());
        assert_eq!(verdict.format, s.detect_file_format(path), "{}", path.display());
    }
}

#[tokio::test]
async fn text_book_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let body = "My_Novel\n作者：王五\n\n第一章 出发\n他们出发了。\n\n第二章 到达\n他们到达了。\n";
    let path = common::write_file(&dir, "my_novel.TXT", body.as_bytes());
    let s = service();

    assert_eq!(s.detect_file_format(&path), Some(BookFormat::Txt));

    let result = s.parse_book_metadata(&path).await;
    let meta = result.metadata().unwrap();
    assert_eq!(meta.title, "my novel");
    assert_eq!(meta.author, "王五");
    assert_eq!(meta.language, "zh-CN");

    let toc = s.get_book_table_of_contents(&path).await;
    let hrefs: Vec<_> = toc.iter().map(|c| c.href.as_str()).collect();
    assert_eq!(hrefs, ["line_3", "line_6"]);

    let from_two = s.get_book_content(&path, Some(&toc[1].href)).await;
    assert_eq!(from_two, "第二章 到达\n他们到达了。\n");
    assert_eq!(s.get_book_content(&path, None).await, body);
    assert!(s.extract_book_cover(&path).await.is_none());
}

#[tokio::test]
async fn text_without_headings_is_chunked() {
    let dir = tempfile::tempdir().unwrap();
    let body = "lorem ipsum ".repeat(2000);
    let path = common::write_file(&dir, "plain.txt", body.as_bytes());

    let toc = service().get_book_table_of_contents(&path).await;
    let total = body.chars().count();
    let chunk = 5000usize.max(total / 20);
    assert_eq!(toc.len(), total.div_ceil(chunk));
    assert_eq!(toc[1].href, format!("char_{chunk}"));
    assert_eq!(toc[1].title, "第 2 部分");
}

#[tokio::test]
async fn pdf_through_the_facade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Manual.PDF");
    common::write_pdf(&path, 30, "Operator Manual");
    let s = service();

    let meta = s.parse_book_metadata(&path).await;
    assert_eq!(meta.metadata().unwrap().title, "Operator Manual");

    let toc = s.get_book_table_of_contents(&path).await;
    assert_eq!(toc.len(), 10);
    assert_eq!(toc[9].href, "page_28");
    assert!(s.extract_book_cover(&path).await.is_none());
}

#[tokio::test]
async fn epub_through_the_facade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.epub");
    common::write_epub(&path, Some("Engine"));
    let s = service();

    assert!(s.validate_book_file(&path).await.is_valid);
    assert!(s.extract_book_cover(&path).await.is_some());
    assert_eq!(s.get_book_table_of_contents(&path).await.len(), 2);
    assert!(s.try_get_book_content(&path, None).await.unwrap().contains("First chapter text."));
}

#[tokio::test]
async fn concurrent_calls_on_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.epub");
    common::write_epub(&path, Some("Engine"));
    let s = service();

    let (meta, cover, toc, content) = tokio::join!(
        s.parse_book_metadata(&path),
        s.extract_book_cover(&path),
        s.get_book_table_of_contents(&path),
        s.get_book_content(&path, None),
    );
    assert!(meta.is_success());
    assert!(cover.is_some());
    assert_eq!(toc.len(), 2);
    assert!(!content.is_empty());
}

#[test]
fn capability_table_is_static() {
    let s = service();
    let epub = s.get_format_capabilities("epub");
    assert!(epub.has_cover && epub.supports_search);
    let pdf = s.get_format_capabilities("PDF");
    assert!(!pdf.has_cover && !pdf.supports_search);
    assert_eq!(s.get_format_display_name("pdf"), "PDF文档");
    assert_eq!(s.get_format_display_name("cbz"), "CBZ");
}
