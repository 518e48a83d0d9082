//! Link discovery for documentation pages
//!
//! Candidate links come from every `<a href>` on the page plus the links in
//! navigation containers. A candidate is admitted only if it passes the
//! filter below and has not been seen before in this run.

use crate::config::DiscoveryConfig;
use crate::extract::parse_selectors;
use crate::url::{has_http_scheme, resolve, HostAllowList, Resolution, ResolvedUrl, VisitedSet};
use crate::ConfigError;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// Finds same-site document links on a page
#[derive(Debug)]
pub struct LinkDiscoverer {
    allowed_hosts: HostAllowList,
    deny_substrings: Vec<String>,
    nav_selectors: Vec<Selector>,
}

impl LinkDiscoverer {
    /// Builds a discoverer for a run starting at a site with host `seed_host`
    ///
    /// The seed host is always allowed in addition to the configured hosts.
    pub fn new(config: &DiscoveryConfig, seed_host: &str) -> Result<Self, ConfigError> {
        let mut allowed_hosts = HostAllowList::new(config.allowed_hosts.iter().cloned());
        allowed_hosts.allow(seed_host.to_lowercase());

        Ok(Self {
            allowed_hosts,
            deny_substrings: config
                .deny_substrings
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            nav_selectors: parse_selectors(&config.nav_selectors)?,
        })
    }

    /// Collects the new links on a page
    ///
    /// # Admission Rules
    ///
    /// A candidate `href` is kept only if all of these hold:
    /// - it is non-empty and not a `#fragment` link
    /// - it is not a `javascript:`, `mailto:`, `tel:` or `data:` link
    /// - it contains none of the deny-list substrings
    /// - it resolves against `page_url`, and the resolved host is allowed
    /// - it is not the page itself and was not already in `visited`
    ///
    /// Admitted links are inserted into `visited` before they are returned,
    /// so a URL is handed out at most once per run.
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed page
    /// * `page_url` - The URL the page was loaded from
    /// * `visited` - The run's visited set
    ///
    /// # Returns
    ///
    /// Newly admitted links in document order
    pub fn discover(
        &self,
        document: &Html,
        page_url: &ResolvedUrl,
        visited: &mut VisitedSet,
    ) -> Vec<ResolvedUrl> {
        let page_key = page_url.without_fragment();
        let anchors = document.select(&LINK_SELECTOR);
        let nav_links = self
            .nav_selectors
            .iter()
            .flat_map(|selector| document.select(selector));

        let mut admitted = Vec::new();
        for element in anchors.chain(nav_links) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = self.admit(href, page_url) else {
                continue;
            };
            if url.without_fragment() == page_key {
                continue;
            }
            if visited.insert(&url) {
                tracing::debug!("Discovered {}", url);
                admitted.push(url);
            }
        }

        admitted
    }

    /// Applies the filter to one candidate and resolves it
    fn admit(&self, href: &str, page_url: &ResolvedUrl) -> Option<ResolvedUrl> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        if has_foreign_scheme(href) {
            return None;
        }

        let lower = href.to_lowercase();
        if self.deny_substrings.iter().any(|d| lower.contains(d.as_str())) {
            tracing::debug!("Skipping denied link {}", href);
            return None;
        }

        let url = match resolve(href, page_url.as_str()) {
            Resolution::Resolved(url) => url,
            Resolution::Passthrough { raw, reason } => {
                tracing::debug!("Skipping unresolvable link {}: {}", raw, reason);
                return None;
            }
        };

        match url.host() {
            Some(host) if self.allowed_hosts.is_allowed(&host) => Some(url),
            _ => {
                tracing::debug!("Skipping off-site link {}", url);
                None
            }
        }
    }
}

/// Returns true if `href` carries a scheme other than http(s),
/// such as `mailto:` or `javascript:`
fn has_foreign_scheme(href: &str) -> bool {
    if has_http_scheme(href) {
        return false;
    }
    let head_end = href.find(['/', '?', '#']).unwrap_or(href.len());
    match href[..head_end].split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
