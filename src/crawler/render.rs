//! Browser-rendered page source for the dynamic media mode
//!
//! A [`RenderBackend`] loads a page with script execution, hands back the
//! rendered markup (fed to the same extractors as fetched pages) and can run
//! small read-only queries against the live document.

use crate::extract::{MediaExtractor, MediaReference, MediaSet};
use crate::url::{resolve, ResolvedUrl};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by a rendering backend
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start browser session: {0}")]
    Session(String),

    #[error("Failed to load {url}: {message}")]
    Load { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Element lookup for '{selector}' failed: {message}")]
    Elements { selector: String, message: String },
}

/// A page after the browser finished rendering it
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the browser ended up on
    pub url: ResolvedUrl,

    /// Serialized DOM
    pub markup: String,
}

/// A page source that executes scripts before handing out markup
///
/// Queries always run against the page most recently loaded with
/// [`RenderBackend::load_and_render`].
#[allow(async_fn_in_trait)]
pub trait RenderBackend {
    /// Navigates to `url` and returns the rendered document
    async fn load_and_render(&self, url: &ResolvedUrl) -> Result<RenderedPage, RenderError>;

    /// Evaluates a read-only script in the current page and returns its value
    async fn query(&self, script: &str) -> Result<serde_json::Value, RenderError>;

    /// Returns the requested attributes of every element matching `selector`
    ///
    /// Attributes an element does not carry are left out of its map.
    async fn find_elements(
        &self,
        selector: &str,
        attributes: &[&str],
    ) -> Result<Vec<HashMap<String, String>>, RenderError>;
}

/// Scripts that read media sources from the live document
pub const MEDIA_QUERIES: [&str; 3] = [
    "return Array.from(document.querySelectorAll('audio')).map(el => el.src || (el.querySelector('source') || {}).src).filter(s => s)",
    "return Array.from(document.querySelectorAll('video')).map(el => el.src || (el.querySelector('source') || {}).src).filter(s => s)",
    "return Array.from(document.querySelectorAll('source')).map(el => el.src).filter(s => s)",
];

const DATA_VIDEO_SELECTOR: &str = "[data-video]";
const DATA_VIDEO_ATTR: &str = "data-video";

/// Collects media references by querying the current rendered page
///
/// Every query runs on its own; a failing query is logged and the rest
/// still run. Values of `data-video` attributes are taken as media without
/// an extension check, since players often point them at extensionless
/// stream endpoints.
///
/// # Returns
///
/// The number of references that were new to `set`
pub async fn extract_media_dynamic<B: RenderBackend>(
    backend: &B,
    page_url: &ResolvedUrl,
    extractor: &MediaExtractor,
    set: &mut MediaSet,
) -> usize {
    let mut added = 0;

    for script in MEDIA_QUERIES {
        match backend.query(script).await {
            Ok(value) => {
                added += extractor.admit(string_values(&value), page_url, set);
            }
            Err(e) => tracing::warn!("Media query failed on {}: {}", page_url, e),
        }
    }

    match backend
        .find_elements(DATA_VIDEO_SELECTOR, &[DATA_VIDEO_ATTR])
        .await
    {
        Ok(elements) => {
            for element in elements {
                let Some(raw) = element.get(DATA_VIDEO_ATTR) else {
                    continue;
                };
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                let Some(url) = resolve(raw, page_url.as_str()).into_resolved() else {
                    continue;
                };
                if set.insert(MediaReference {
                    url,
                    source_page: page_url.clone(),
                }) {
                    added += 1;
                }
            }
        }
        Err(e) => tracing::warn!("data-video lookup failed on {}: {}", page_url, e),
    }

    added
}

/// Flattens a script result into the strings it contains
fn string_values(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items.iter().flat_map(string_values).collect(),
        _ => Vec::new(),
    }
}

#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverBackend;

#[cfg(feature = "webdriver")]
mod webdriver {
    use super::{RenderBackend, RenderError, RenderedPage};
    use crate::url::{resolve, ResolvedUrl};
    use fantoccini::{Client, ClientBuilder, Locator};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Rendering backend driving a browser through a WebDriver server
    #[derive(Debug)]
    pub struct WebDriverBackend {
        client: Client,
        settle: Duration,
    }

    impl WebDriverBackend {
        /// Opens a browser session on the WebDriver server at `webdriver_url`
        ///
        /// `settle` is how long to wait after navigation for scripts to
        /// populate the page.
        pub async fn connect(webdriver_url: &str, settle: Duration) -> Result<Self, RenderError> {
            let client = ClientBuilder::native()
                .connect(webdriver_url)
                .await
                .map_err(|e| RenderError::Session(e.to_string()))?;
            tracing::info!("Connected to WebDriver at {}", webdriver_url);
            Ok(Self { client, settle })
        }

        /// Ends the browser session
        pub async fn close(self) -> Result<(), RenderError> {
            self.client
                .close()
                .await
                .map_err(|e| RenderError::Session(e.to_string()))
        }
    }

    impl RenderBackend for WebDriverBackend {
        async fn load_and_render(&self, url: &ResolvedUrl) -> Result<RenderedPage, RenderError> {
            let load_err = |e: fantoccini::error::CmdError| RenderError::Load {
                url: url.to_string(),
                message: e.to_string(),
            };

            self.client.goto(url.as_str()).await.map_err(load_err)?;
            tokio::time::sleep(self.settle).await;

            let markup = self.client.source().await.map_err(load_err)?;
            let current = self.client.current_url().await.map_err(load_err)?;
            let url = resolve(current.as_str(), url.as_str())
                .into_resolved()
                .unwrap_or_else(|| url.clone());

            Ok(RenderedPage { url, markup })
        }

        async fn query(&self, script: &str) -> Result<serde_json::Value, RenderError> {
            self.client
                .execute(script, Vec::new())
                .await
                .map_err(|e| RenderError::Script(e.to_string()))
        }

        async fn find_elements(
            &self,
            selector: &str,
            attributes: &[&str],
        ) -> Result<Vec<HashMap<String, String>>, RenderError> {
            let lookup_err = |e: fantoccini::error::CmdError| RenderError::Elements {
                selector: selector.to_string(),
                message: e.to_string(),
            };

            let elements = self
                .client
                .find_all(Locator::Css(selector))
                .await
                .map_err(lookup_err)?;

            let mut result = Vec::with_capacity(elements.len());
            for element in elements {
                let mut attrs = HashMap::new();
                for name in attributes {
                    if let Some(value) = element.attr(name).await.map_err(lookup_err)? {
                        attrs.insert(name.to_string(), value);
                    }
                }
                result.push(attrs);
            }
            Ok(result)
        }
    }
}
