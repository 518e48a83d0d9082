//! Translation pass over a directory of harvested text files

use crate::config::TranslationConfig;
use crate::output::{RunRecorder, RunReport};
use crate::translate::{split_for_translation, RetryingTranslator, Translator};
use crate::{HarvestError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

/// Translates a whole text, chunk by chunk
///
/// Chunks are rejoined with a space inside a paragraph and a blank line
/// between paragraphs. Chunks that cannot be translated stay in the
/// original language.
pub async fn translate_text<T: Translator>(
    translator: &RetryingTranslator<T>,
    text: &str,
    max_chunk_chars: usize,
) -> String {
    let mut paragraphs = Vec::new();
    for chunks in split_for_translation(text, max_chunk_chars) {
        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(translator.translate_or_original(chunk).await);
        }
        paragraphs.push(translated.join(" "));
    }
    paragraphs.join("\n\n")
}

/// Translates every matching file below `source` into the same relative
/// path below `target`
///
/// Files are picked by extension (`translation.extensions`). A file whose
/// target already exists is left untouched and counted as skipped; read or
/// write failures are recorded and the pass moves on.
///
/// # Arguments
///
/// * `translator` - The paced, retrying translation service
/// * `source` - Directory holding the harvested files
/// * `target` - Directory receiving the translations
/// * `config` - Translation settings
///
/// # Returns
///
/// * `Ok(RunReport)` - Statistics for the pass
/// * `Err(HarvestError)` - `source` is missing or `target` cannot be created
pub async fn translate_tree<T: Translator>(
    translator: &RetryingTranslator<T>,
    source: &Path,
    target: &Path,
    config: &TranslationConfig,
) -> Result<RunReport> {
    if !source.is_dir() {
        return Err(HarvestError::MissingSource(source.display().to_string()));
    }
    tokio::fs::create_dir_all(target)
        .await
        .map_err(|e| HarvestError::OutputUnwritable {
            path: target.display().to_string(),
            source: e,
        })?;

    let mut recorder = RunRecorder::new();
    let files = collect_files(source, &config.extensions, &mut recorder);
    recorder.add_total(files.len());
    tracing::info!("Translating {} file(s) from {}", files.len(), source.display());

    let total = files.len();
    for (i, file) in files.iter().enumerate() {
        let relative = file.strip_prefix(source).unwrap_or(file);
        println!("[{}/{}] {}", i + 1, total, relative.display());

        let destination = target.join(relative);
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            tracing::debug!("{} already translated", destination.display());
            recorder.record_skipped();
            continue;
        }

        match translate_file(translator, file, &destination, config.max_chunk_chars).await {
            Ok(bytes) => recorder.record_success(bytes),
            Err(e) => {
                tracing::warn!("Failed to translate {}: {}", file.display(), e);
                recorder.record_failure(file.display().to_string(), e.to_string());
            }
        }

        if config.file_delay_ms > 0 && i + 1 < total {
            tokio::time::sleep(Duration::from_millis(config.file_delay_ms)).await;
        }
    }

    Ok(recorder.finish())
}

/// Lists the files to translate, sorted by path
fn collect_files(source: &Path, extensions: &[String], recorder: &mut RunRecorder) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read directory entry: {}", e);
                let identifier = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| source.display().to_string());
                recorder.record_failure(identifier, e.to_string());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(entry.into_path());
        }
    }

    files
}

async fn translate_file<T: Translator>(
    translator: &RetryingTranslator<T>,
    source: &Path,
    destination: &Path,
    max_chunk_chars: usize,
) -> std::io::Result<u64> {
    let text = tokio::fs::read_to_string(source).await?;
    let translated = translate_text(translator, &text, max_chunk_chars).await;

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await?;
    file.write_all(translated.as_bytes()).await?;
    file.flush().await?;

    Ok(translated.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranslateError;
    use tempfile::TempDir;

    struct Upper;

    impl Translator for Upper {
        async fn translate(&self, text: &str) -> std::result::Result<String, TranslateError> {
            Ok(text.to_uppercase())
        }
    }

    struct Down;

    impl Translator for Down {
        async fn translate(&self, _text: &str) -> std::result::Result<String, TranslateError> {
            Err(TranslateError::Service("unavailable".to_string()))
        }
    }

    fn config() -> TranslationConfig {
        TranslationConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            min_interval_ms: 0,
            max_chunk_chars: 12,
            ..TranslationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_translate_text_rejoins_chunks() {
        let translator = RetryingTranslator::new(Upper, &config());
        let out = translate_text(&translator, "One two. Three four.\n\nFive.", 12).await;
        assert_eq!(out, "ONE TWO. THREE FOUR.\n\nFIVE.");
    }

    #[tokio::test]
    async fn test_translate_tree_mirrors_layout() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        std::fs::create_dir_all(source.path().join("docs/editor")).unwrap();
        std::fs::write(source.path().join("docs/editor/setup.txt"), "setup").unwrap();
        std::fs::write(source.path().join("intro.md"), "intro").unwrap();
        std::fs::write(source.path().join("clip.mp4"), "binary").unwrap();

        let translator = RetryingTranslator::new(Upper, &config());
        let report = translate_tree(&translator, source.path(), target.path(), &config())
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(
            std::fs::read_to_string(target.path().join("docs/editor/setup.txt")).unwrap(),
            "SETUP"
        );
        assert!(!target.path().join("clip.mp4").exists());
    }

    #[tokio::test]
    async fn test_existing_targets_skipped() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        std::fs::write(source.path().join("a.txt"), "new").unwrap();
        std::fs::write(target.path().join("a.txt"), "kept").unwrap();

        let translator = RetryingTranslator::new(Upper, &config());
        let report = translate_tree(&translator, source.path(), target.path(), &config())
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.succeeded, 0);
        assert_eq!(std::fs::read_to_string(target.path().join("a.txt")).unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_service_outage_keeps_original_text() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        std::fs::write(source.path().join("a.txt"), "original").unwrap();

        let translator = RetryingTranslator::new(Down, &config());
        let report = translate_tree(&translator, source.path(), target.path(), &config())
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(std::fs::read_to_string(target.path().join("a.txt")).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_missing_source() {
        let target = TempDir::new().unwrap();
        let translator = RetryingTranslator::new(Upper, &config());
        let result = translate_tree(
            &translator,
            &target.path().join("nope"),
            target.path(),
            &config(),
        )
        .await;
        assert!(matches!(result, Err(HarvestError::MissingSource(_))));
    }
}
