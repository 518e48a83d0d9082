use crate::config::TranslationConfig;
use crate::translate::Translator;
use crate::TranslateError;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Wraps a [`Translator`] with pacing, retries and a fallback
///
/// - Calls to the inner service are at least `min-interval-ms` apart
/// - A failed call is retried up to `max-retries` attempts in total, waiting
///   `initial-backoff-ms * 2^(attempt-1)` before each retry
/// - When every attempt fails the original text is returned unchanged
pub struct RetryingTranslator<T> {
    inner: T,
    max_attempts: u32,
    initial_backoff: Duration,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<T: Translator> RetryingTranslator<T> {
    pub fn new(inner: T, config: &TranslationConfig) -> Self {
        Self {
            inner,
            max_attempts: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            min_interval: Duration::from_millis(config.min_interval_ms),
            last_call: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Translates `text`, falling back to `text` itself on persistent failure
    ///
    /// Blank text is returned as is without calling the service.
    pub async fn translate_or_original(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        for attempt in 1..=self.max_attempts {
            self.pace().await;

            match self.inner.translate(text).await {
                Ok(translated) => return translated,
                Err(e) => {
                    tracing::warn!(
                        "Translation attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    if attempt < self.max_attempts {
                        let delay = self.backoff(attempt);
                        tracing::debug!("Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        tracing::warn!(
            "Giving up after {} attempts, keeping original text",
            self.max_attempts
        );
        text.to_string()
    }

    /// Delay before the retry that follows `attempt`
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Waits until the minimum interval since the previous call has passed
    async fn pace(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let since = previous.elapsed();
            if since < self.min_interval {
                tokio::time::sleep(self.min_interval - since).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

impl<T: Translator> Translator for RetryingTranslator<T> {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        Ok(self.translate_or_original(text).await)
    }
}
