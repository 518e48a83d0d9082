//! URL handling module for Doc-Harvest
//!
//! This module provides best-effort resolution of relative references,
//! same-site host matching, and the per-run visited set.

mod matcher;
mod resolve;
mod visited;

// Re-export main types and functions
pub use matcher::{matches_wildcard, HostAllowList};
pub use resolve::{has_http_scheme, resolve, Resolution, ResolvedUrl};
pub use visited::VisitedSet;
