use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());

/// Render an XHTML content document as readable markdown text
pub fn html_to_markdown(html: &str) -> String {
    let md = html2md::parse_html(&clean_html(html), false);
    clean_markdown(&md)
}

/// Drop scripts, stylesheets and comments
pub fn clean_html(html: &str) -> String {
    let html = SCRIPT.replace_all(html, "");
    let html = STYLE.replace_all(&html, "");
    COMMENT.replace_all(&html, "").trim().to_string()
}

/// Tag-free text with whitespace collapsed
pub fn extract_text_from_html(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title for an untitled document: first heading, else `<title>`
pub fn document_title(html: &str) -> Option<String> {
    let html = clean_html(html);
    [&*HEADING, &*TITLE]
        .iter()
        .filter_map(|re| re.captures(&html))
        .filter_map(|caps| caps.get(1).map(|m| extract_text_from_html(m.as_str())))
        .find(|t| !t.is_empty())
}

/// Cut a document so it starts at the element carrying `id`.
///
/// Returns the whole document when the anchor is not found.
pub fn slice_from_anchor<'a>(html: &'a str, id: &str) -> &'a str {
    for quote in ['"', '\''] {
        let needle = format!("id={quote}{id}{quote}");
        let found = html
            .match_indices(&needle)
            .map(|(at, _)| at)
            .find(|&at| html[..at].ends_with(|c: char| c.is_ascii_whitespace()));
        if let Some(at) = found {
            let start = html[..at].rfind('<').unwrap_or(0);
            return &html[start..];
        }
    }
    html
}

pub fn clean_markdown(md: &str) -> String {
    let mut result = md.to_string();

    // Collapse 3+ consecutive blank lines to 2
    while result.contains("\n\n\n") {
        result = result.replace("\n\n\n", "\n\n");
    }

    // Trim trailing whitespace per line
    result = result
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    let trimmed = result.trim().to_string();
    if trimmed.is_empty() {
        String::new()
    } else {
        trimmed + "\n"
    }
}
