//! Structured plain-text rendering of documentation pages
//!
//! The renderer is a heuristic: it picks a main content container, skips
//! boilerplate subtrees, and walks the remaining DOM emitting headings,
//! paragraphs, list items, code blocks and links as plain text. Partial or
//! oddly formatted output is acceptable; rendering never fails.

use crate::config::ContentConfig;
use crate::ConfigError;
use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1").expect("BUG: hardcoded CSS selector 'h1' is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});

/// Renders a parsed page into structured plain text
#[derive(Debug)]
pub struct ContentExtractor {
    containers: Vec<Selector>,
    strip: Vec<Selector>,
    code_open: String,
    code_close: String,
    bullet: String,
}

impl ContentExtractor {
    /// Builds an extractor from the content configuration
    pub fn new(config: &ContentConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            containers: parse_selectors(&config.container_selectors)?,
            strip: parse_selectors(&config.strip_selectors)?,
            code_open: config.code_open_marker.clone(),
            code_close: config.code_close_marker.clone(),
            bullet: config.bullet.clone(),
        })
    }

    /// Extracts the text of a page
    ///
    /// The first `h1` is written as a title underlined with `=`, then the
    /// main content container is rendered depth-first without that `h1`.
    pub fn extract(&self, document: &Html) -> String {
        let mut out = String::new();
        let title = document.select(&H1_SELECTOR).next();

        if let Some(h1) = title {
            let heading = normalized_text(h1, &HashSet::new());
            out.push_str(&heading);
            out.push('\n');
            out.push_str(&"=".repeat(heading.chars().count()));
            out.push_str("\n\n");
        }

        let container = self.main_container(document);
        let mut skipped = self.stripped_nodes(container);
        if let Some(h1) = title {
            skipped.insert(h1.id());
        }
        self.render_children(container, &skipped, &mut out);

        out.trim().to_string()
    }

    /// Picks the main content element, falling back to `<body>`
    fn main_container<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        for selector in &self.containers {
            if let Some(element) = document.select(selector).next() {
                return element;
            }
        }

        tracing::debug!("No content container matched, using page body");
        document
            .select(&BODY_SELECTOR)
            .next()
            .unwrap_or_else(|| document.root_element())
    }

    /// Collects the ids of every subtree that must not be rendered
    fn stripped_nodes(&self, container: ElementRef<'_>) -> HashSet<NodeId> {
        self.strip
            .iter()
            .flat_map(|selector| container.select(selector))
            .map(|element| element.id())
            .collect()
    }

    fn render_children(&self, element: ElementRef<'_>, skipped: &HashSet<NodeId>, out: &mut String) {
        for child in element.children() {
            if skipped.contains(&child.id()) {
                continue;
            }

            match child.value() {
                Node::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        out.push_str(text);
                        out.push('\n');
                    }
                }
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.render_element(child_element, skipped, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn render_element(&self, element: ElementRef<'_>, skipped: &HashSet<NodeId>, out: &mut String) {
        match element.value().name() {
            "h2" | "h3" | "h4" | "h5" | "h6" => {
                let text = normalized_text(element, skipped);
                out.push('\n');
                out.push_str(&text);
                out.push('\n');
                out.push_str(&"-".repeat(text.chars().count()));
                out.push('\n');
            }
            "p" => {
                out.push_str(&normalized_text(element, skipped));
                out.push_str("\n\n");
            }
            "li" => {
                out.push_str(&self.bullet);
                out.push_str(&normalized_text(element, skipped));
                out.push('\n');
            }
            "code" | "pre" => {
                out.push_str(&self.code_open);
                out.push('\n');
                out.push_str(raw_text(element, skipped).trim_matches('\n'));
                out.push('\n');
                out.push_str(&self.code_close);
                out.push('\n');
            }
            "a" => {
                out.push_str(&normalized_text(element, skipped));
                match element.value().attr("href") {
                    Some(href) if !href.is_empty() => {
                        out.push_str(" (");
                        out.push_str(href);
                        out.push(')');
                    }
                    _ => {}
                }
            }
            "br" => out.push('\n'),
            _ => self.render_children(element, skipped, out),
        }
    }
}

/// Parses a list of selectors, reporting the first invalid one
pub(crate) fn parse_selectors(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|s| {
            Selector::parse(s).map_err(|e| ConfigError::InvalidSelector {
                selector: s.clone(),
                message: format!("{:?}", e),
            })
        })
        .collect()
}

/// Concatenates the text below `element` verbatim, skipping stripped subtrees
fn raw_text(element: ElementRef<'_>, skipped: &HashSet<NodeId>) -> String {
    let mut buf = String::new();
    collect_text(element, skipped, &mut buf);
    buf
}

/// Text below `element` with whitespace runs collapsed to single spaces
pub(crate) fn normalized_text(element: ElementRef<'_>, skipped: &HashSet<NodeId>) -> String {
    raw_text(element, skipped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text(element: ElementRef<'_>, skipped: &HashSet<NodeId>, buf: &mut String) {
    for child in element.children() {
        if skipped.contains(&child.id()) {
            continue;
        }
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, skipped, buf);
                }
            }
            _ => {}
        }
    }
}
