use crate::url::ResolvedUrl;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1").expect("BUG: hardcoded CSS selector 'h1' is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static OG_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[property='og:title']")
        .expect("BUG: hardcoded CSS selector \"meta[property='og:title']\" is invalid")
});

/// Title used when nothing better can be derived
pub const UNTITLED: &str = "Untitled";

/// Derives a human-readable title for a page
///
/// # Sources, in order
///
/// 1. The first `<h1>` text
/// 2. The `<title>` text with any trailing `| Site Name` removed
/// 3. `<meta property="og:title">`
/// 4. The last URL path segment, with `-` and `_` turned into spaces
/// 5. `"Untitled"`
pub fn extract_title(document: &Html, url: &ResolvedUrl) -> String {
    let candidates = [
        first_text(document, &H1_SELECTOR),
        first_text(document, &TITLE_SELECTOR).map(|t| strip_site_suffix(&t)),
        document
            .select(&OG_TITLE_SELECTOR)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(|content| content.trim().to_string()),
        title_from_url(url),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(|element| {
        element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// "Setup | VS Code" -> "Setup"
fn strip_site_suffix(title: &str) -> String {
    match title.rfind('|') {
        Some(idx) => title[..idx].trim().to_string(),
        None => title.trim().to_string(),
    }
}

fn title_from_url(url: &ResolvedUrl) -> Option<String> {
    let path = url.path();
    let last = path.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| last.to_string());
    Some(decoded.replace(['-', '_'], " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::resolve;

    fn url(s: &str) -> ResolvedUrl {
        resolve(s, "https://x.com/").into_resolved().unwrap()
    }

    fn title(html: &str, page: &str) -> String {
        extract_title(&Html::parse_document(html), &url(page))
    }

    #[test]
    fn test_h1_wins() {
        let html = "<html><head><title>Other | Site</title></head><body><h1> Getting   Started </h1></body></html>";
        assert_eq!(title(html, "/docs/start"), "Getting Started");
    }

    #[test]
    fn test_title_suffix_removed() {
        let html = "<html><head><title>Editing | Docs | VS Code</title></head></html>";
        assert_eq!(title(html, "/docs/edit"), "Editing | Docs");
    }

    #[test]
    fn test_og_title() {
        let html = r#"<html><head><meta property="og:title" content=" Graph Title "></head></html>"#;
        assert_eq!(title(html, "/docs/x"), "Graph Title");
    }

    #[test]
    fn test_from_url() {
        assert_eq!(title("<html></html>", "/docs/getting-started_now"), "getting started now");
    }

    #[test]
    fn test_untitled() {
        assert_eq!(title("<html></html>", "/"), UNTITLED);
    }

    #[test]
    fn test_empty_h1_falls_through() {
        let html = "<html><head><title>Real</title></head><body><h1>  </h1></body></html>";
        assert_eq!(title(html, "/a"), "Real");
    }
}
