//! Crawler module for fetching pages and driving a harvest run
//!
//! This module contains the network-facing side of the harvester:
//! - HTTP fetching of pages and streaming media downloads
//! - Same-site link discovery
//! - The browser rendering backend abstraction for the dynamic media mode
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod links;
mod render;

pub use coordinator::Harvester;
pub use fetcher::{build_http_client, Download, HttpFetcher, Page};
pub use links::LinkDiscoverer;
pub use render::{extract_media_dynamic, RenderBackend, RenderError, RenderedPage, MEDIA_QUERIES};

#[cfg(feature = "webdriver")]
pub use render::WebDriverBackend;
