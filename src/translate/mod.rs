//! Translation of harvested text
//!
//! The translation service itself is supplied by the caller through the
//! [`Translator`] trait. This module adds pacing, retries with exponential
//! backoff, chunking of long texts and a pass over a whole output tree.

mod chunk;
mod directory;
mod retry;

pub use chunk::split_for_translation;
pub use directory::{translate_text, translate_tree};
pub use retry::RetryingTranslator;

use crate::TranslateError;

/// A service that translates a piece of text
#[allow(async_fn_in_trait)]
pub trait Translator {
    /// Translates `text`, or reports why it could not
    async fn translate(&self, text: &str) -> Result<String, TranslateError>;
}
