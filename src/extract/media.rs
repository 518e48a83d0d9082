//! Media reference detection
//!
//! A page is scanned by an ordered list of independent [`MediaStrategy`]
//! implementations. Every candidate they report is resolved against the
//! page URL, filtered by extension and merged into a [`MediaSet`] keyed by
//! absolute URL. One strategy failing is logged and does not stop the rest.

use crate::config::MediaConfig;
use crate::url::{resolve, ResolvedUrl};
use crate::{ConfigError, ExtractError};
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static MEDIA_SRC_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("audio[src], video[src], audio source[src], video source[src]")
        .expect("BUG: hardcoded CSS selector for media sources is invalid")
});

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script").expect("BUG: hardcoded CSS selector 'script' is invalid")
});

/// A binary resource found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    /// Absolute URL of the media file
    pub url: ResolvedUrl,

    /// Page the reference was found on
    pub source_page: ResolvedUrl,
}

/// Insertion-ordered set of media references, unique by absolute URL
///
/// URLs are stored without their `#fragment`, so `a.mp3#t=10` and `a.mp3`
/// are one reference. When the same URL is inserted twice the first source
/// page is kept.
#[derive(Debug, Default)]
pub struct MediaSet {
    items: Vec<MediaReference>,
    keys: HashSet<ResolvedUrl>,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference; returns false if its URL is already present
    pub fn insert(&mut self, mut reference: MediaReference) -> bool {
        reference.url = reference.url.without_fragment();
        if !self.keys.insert(reference.url.clone()) {
            return false;
        }
        self.items.push(reference);
        true
    }

    /// Merges another set into this one, keeping existing source pages
    pub fn extend(&mut self, other: MediaSet) {
        for reference in other.items {
            self.insert(reference);
        }
    }

    pub fn contains(&self, url: &ResolvedUrl) -> bool {
        self.keys.contains(&url.without_fragment())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaReference> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<MediaReference> {
        self.items
    }
}

/// Decides whether a URL points at a media file by its extension
#[derive(Debug, Clone)]
pub struct MediaMatcher {
    extensions: Vec<String>,
}

impl MediaMatcher {
    /// Creates a matcher for the given extensions (without the dot)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty() && seen.insert(e.clone()))
            .collect();
        Self { extensions }
    }

    /// Returns true if the path of `url` (query and fragment ignored)
    /// ends in a known media extension
    pub fn is_media(&self, url: &str) -> bool {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        let path = url[..end].to_lowercase();
        self.extensions
            .iter()
            .any(|ext| path.len() > ext.len() && path.ends_with(ext.as_str()) && {
                path[..path.len() - ext.len()].ends_with('.')
            })
    }

    /// Returns true if `extension` (without the dot) is a known media extension
    pub fn is_media_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.extensions.iter().any(|e| *e == extension)
    }

    /// Regex alternation of the extensions, e.g. `mp3|mp4`
    fn alternation(&self) -> String {
        self.extensions
            .iter()
            .map(|e| regex::escape(e))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Everything a strategy may look at for one page
pub struct PageContext<'a> {
    /// Parsed page
    pub document: &'a Html,

    /// Unparsed markup as fetched or rendered
    pub markup: &'a str,

    /// URL the page was loaded from
    pub page_url: &'a ResolvedUrl,
}

/// One independent way of spotting media references on a page
///
/// Strategies return raw candidates exactly as they appear in the page.
/// Resolution, filtering and deduplication are done by [`MediaExtractor`].
pub trait MediaStrategy: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Collects candidate references from a page
    fn candidates(&self, page: &PageContext<'_>) -> Result<Vec<String>, ExtractError>;
}

/// Source attributes of `<audio>`/`<video>` elements and their nested
/// `<source>` elements, plus plain links to media files
#[derive(Debug, Default)]
pub struct ElementSourceStrategy;

impl MediaStrategy for ElementSourceStrategy {
    fn name(&self) -> &'static str {
        "element-source"
    }

    fn candidates(&self, page: &PageContext<'_>) -> Result<Vec<String>, ExtractError> {
        let sources = page
            .document
            .select(&MEDIA_SRC_SELECTOR)
            .filter_map(|el| el.value().attr("src"));
        let links = page
            .document
            .select(&LINK_SELECTOR)
            .filter_map(|el| el.value().attr("href"));

        Ok(sources
            .chain(links)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Quoted absolute media URLs inside inline `<script>` payloads
#[derive(Debug)]
pub struct ScriptPayloadStrategy {
    quoted: Regex,
    assigned: Regex,
}

impl ScriptPayloadStrategy {
    pub fn new(matcher: &MediaMatcher) -> Result<Self, ConfigError> {
        let exts = matcher.alternation();
        let quoted = Regex::new(&format!(r#""(https?://[^"\s]+\.(?:{exts}))""#))?;
        let assigned = RegexBuilder::new(&format!(
            r#"(?:url|src|source|media)\s*[:=]\s*["']+(https?://[^"'\s;,]+\.(?:{exts}))"#
        ))
        .case_insensitive(true)
        .build()?;
        Ok(Self { quoted, assigned })
    }
}

impl MediaStrategy for ScriptPayloadStrategy {
    fn name(&self) -> &'static str {
        "script-payload"
    }

    fn candidates(&self, page: &PageContext<'_>) -> Result<Vec<String>, ExtractError> {
        let mut found = Vec::new();
        for script in page.document.select(&SCRIPT_SELECTOR) {
            let text: String = script.text().collect();
            found.extend(captures(&self.quoted, &text));
            found.extend(captures(&self.assigned, &text));
        }
        Ok(found)
    }
}

/// Pattern scan over the raw markup for references the DOM does not expose
///
/// Three patterns are used: absolute URLs on the page's own host,
/// quoted root-relative asset paths, and `src`/`data-src`/`href`/`data-href`
/// attribute values.
#[derive(Debug)]
pub struct RawMarkupStrategy {
    exts: String,
    root_relative: Regex,
    attribute: Regex,
}

impl RawMarkupStrategy {
    pub fn new(matcher: &MediaMatcher) -> Result<Self, ConfigError> {
        let exts = matcher.alternation();
        let root_relative = Regex::new(&format!(
            r#"["'](/[^/"'\s<>][^"'\s<>]*\.(?:{exts}))(?:[?#][^"'\s<>]*)?["']"#
        ))?;
        let attribute = RegexBuilder::new(&format!(
            r#"\b(?:data-src|data-href|src|href)\s*=\s*["']([^"'\s<>]+\.(?:{exts}))["']"#
        ))
        .case_insensitive(true)
        .build()?;
        Ok(Self {
            exts,
            root_relative,
            attribute,
        })
    }

    /// Absolute URLs on the host of the page, with an optional port
    fn same_host_pattern(&self, page_url: &ResolvedUrl) -> Result<Option<Regex>, ExtractError> {
        let Some(host) = page_url.host() else {
            return Ok(None);
        };
        let pattern = format!(
            r#"https?://{}(?::\d+)?/[^"'\s<>]*\.(?:{})"#,
            regex::escape(&host),
            self.exts
        );
        RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|source| ExtractError::Pattern {
                page: page_url.to_string(),
                source,
            })
    }
}

impl MediaStrategy for RawMarkupStrategy {
    fn name(&self) -> &'static str {
        "raw-markup"
    }

    fn candidates(&self, page: &PageContext<'_>) -> Result<Vec<String>, ExtractError> {
        let mut found = Vec::new();
        if let Some(same_host) = self.same_host_pattern(page.page_url)? {
            found.extend(same_host.find_iter(page.markup).map(|m| m.as_str().to_string()));
        }
        found.extend(captures(&self.root_relative, page.markup));
        found.extend(captures(&self.attribute, page.markup));
        Ok(found)
    }
}

fn captures(regex: &Regex, haystack: &str) -> Vec<String> {
    regex
        .captures_iter(haystack)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Runs every strategy over a page and unions their results
pub struct MediaExtractor {
    matcher: MediaMatcher,
    strategies: Vec<Box<dyn MediaStrategy>>,
}

impl MediaExtractor {
    /// Builds the default strategy list for statically fetched pages
    pub fn new(config: &MediaConfig) -> Result<Self, ConfigError> {
        Self::with_matcher(MediaMatcher::new(&config.extensions))
    }

    /// Builds the strategy list for browser-rendered pages, which also
    /// recognises the dynamic-only extensions (e.g. streaming playlists)
    pub fn for_rendered_pages(config: &MediaConfig) -> Result<Self, ConfigError> {
        Self::with_matcher(MediaMatcher::new(
            config.extensions.iter().chain(&config.dynamic_extensions),
        ))
    }

    fn with_matcher(matcher: MediaMatcher) -> Result<Self, ConfigError> {
        let strategies: Vec<Box<dyn MediaStrategy>> = vec![
            Box::new(ElementSourceStrategy),
            Box::new(ScriptPayloadStrategy::new(&matcher)?),
            Box::new(RawMarkupStrategy::new(&matcher)?),
        ];
        Ok(Self {
            matcher,
            strategies,
        })
    }

    /// Appends a custom strategy after the built-in ones
    pub fn push_strategy(&mut self, strategy: Box<dyn MediaStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn matcher(&self) -> &MediaMatcher {
        &self.matcher
    }

    /// Scans one page and returns every media reference on it
    pub fn extract(&self, document: &Html, markup: &str, page_url: &ResolvedUrl) -> MediaSet {
        let mut set = MediaSet::new();
        self.extract_into(document, markup, page_url, &mut set);
        set
    }

    /// Scans one page into an existing set; returns the number of new references
    pub fn extract_into(
        &self,
        document: &Html,
        markup: &str,
        page_url: &ResolvedUrl,
        set: &mut MediaSet,
    ) -> usize {
        let page = PageContext {
            document,
            markup,
            page_url,
        };
        let before = set.len();

        for strategy in &self.strategies {
            match strategy.candidates(&page) {
                Ok(candidates) => {
                    let added = self.admit(candidates, page_url, set);
                    tracing::debug!(
                        "Strategy {} found {} new media reference(s) on {}",
                        strategy.name(),
                        added,
                        page_url
                    );
                }
                Err(e) => {
                    tracing::warn!("Strategy {} failed on {}: {}", strategy.name(), page_url, e);
                }
            }
        }

        set.len() - before
    }

    /// Resolves, filters and inserts candidates; returns how many were new
    pub(crate) fn admit(
        &self,
        candidates: Vec<String>,
        page_url: &ResolvedUrl,
        set: &mut MediaSet,
    ) -> usize {
        let mut added = 0;
        for candidate in candidates {
            let Some(url) = resolve(&candidate, page_url.as_str()).into_resolved() else {
                continue;
            };
            if !self.matcher.is_media(url.as_str()) {
                continue;
            }
            if set.insert(MediaReference {
                url,
                source_page: page_url.clone(),
            }) {
                added += 1;
            }
        }
        added
    }
}

impl std::fmt::Debug for MediaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaExtractor")
            .field("matcher", &self.matcher)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
