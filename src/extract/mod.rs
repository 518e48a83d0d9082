//! Page extraction for Doc-Harvest
//!
//! Turns parsed pages into plain text documents and collects the media
//! files they reference.

mod content;
mod media;
mod title;

pub use content::ContentExtractor;
pub use media::{
    ElementSourceStrategy, MediaExtractor, MediaMatcher, MediaReference, MediaSet,
    MediaStrategy, PageContext, RawMarkupStrategy, ScriptPayloadStrategy,
};
pub use title::{extract_title, UNTITLED};

pub(crate) use content::parse_selectors;
