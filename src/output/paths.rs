//! Local file layout for harvested resources
//!
//! Remote URL paths are mirrored as directories under the output root.
//! Planning is pure; claiming a path on disk goes through
//! [`create_unique`], which uses exclusive creation so concurrent writers
//! never end up with the same file.

use crate::config::{DiscoveryConfig, MediaConfig};
use crate::extract::MediaMatcher;
use crate::url::ResolvedUrl;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Longest file or directory name produced, in characters
pub const MAX_NAME_CHARS: usize = 200;

/// Placeholder for document names that sanitize to nothing
pub const DOCUMENT_PLACEHOLDER: &str = "document";

const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes `name` safe to use as a single path component
///
/// Forbidden characters become `_`, surrounding whitespace is trimmed and
/// the result is cut to [`MAX_NAME_CHARS`]. Empty results, `.` and `..`
/// become `placeholder`.
pub fn sanitize_filename(name: &str, placeholder: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let truncated: String = replaced.trim().chars().take(MAX_NAME_CHARS).collect();

    match truncated.as_str() {
        "" | "." | ".." => placeholder.chars().take(MAX_NAME_CHARS).collect(),
        _ => truncated,
    }
}

/// A planned output location: directory, file stem and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub dir: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl FileTarget {
    /// The path without any collision suffix
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, self.extension))
    }

    /// The path with `_n` inserted before the extension
    pub fn with_suffix(&self, n: u32) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.stem, n, self.extension))
    }
}

/// Maps URLs to [`FileTarget`]s below an output root
#[derive(Debug, Clone)]
pub struct PathPlanner {
    root: PathBuf,
    index_segments: Vec<String>,
    media_dir_fallback: String,
    enforced_extension: String,
    media: MediaMatcher,
}

impl PathPlanner {
    pub fn new(root: impl Into<PathBuf>, discovery: &DiscoveryConfig, media: &MediaConfig) -> Self {
        Self {
            root: root.into(),
            index_segments: discovery
                .index_segments
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            media_dir_fallback: media.directory_fallback.clone(),
            enforced_extension: media.enforced_extension.trim_start_matches('.').to_string(),
            media: MediaMatcher::new(media.extensions.iter().chain(&media.dynamic_extensions)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Plans the text file for a documentation page
    ///
    /// The URL path becomes nested directories; its last segment becomes
    /// the file name, unless it is empty or an index segment (e.g. `docs`),
    /// in which case `title` is used. A URL that cannot be parsed falls
    /// back to `<root>/<title>.txt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_harvest::config::Config;
    /// use doc_harvest::output::PathPlanner;
    /// use doc_harvest::url::resolve;
    ///
    /// let config = Config::default();
    /// let planner = PathPlanner::new("out", &config.discovery, &config.media);
    /// let url = resolve("https://x.com/docs/editor/setup", "https://x.com/").into_resolved().unwrap();
    /// let target = planner.plan_document_path(&url, "Setup");
    /// assert_eq!(target.path(), std::path::Path::new("out/docs/editor/setup.txt"));
    /// ```
    pub fn plan_document_path(&self, url: &ResolvedUrl, title: &str) -> FileTarget {
        let title_stem = sanitize_filename(title, DOCUMENT_PLACEHOLDER);

        let Some(parsed) = url.to_url() else {
            tracing::debug!("Cannot derive a path from {}, using title", url);
            return FileTarget {
                dir: self.root.clone(),
                stem: title_stem,
                extension: "txt".to_string(),
            };
        };

        let mut segments = decoded_segments(parsed.path());
        let last = segments.pop();

        let mut dir = self.root.clone();
        for segment in &segments {
            dir.push(sanitize_filename(segment, DOCUMENT_PLACEHOLDER));
        }

        let stem = match last {
            Some(last) if !self.is_index_segment(&last) => {
                sanitize_filename(&last, DOCUMENT_PLACEHOLDER)
            }
            _ => title_stem,
        };

        FileTarget {
            dir,
            stem,
            extension: "txt".to_string(),
        }
    }

    /// Plans the file for a media download
    ///
    /// The directory mirrors the path of the page the media was found on,
    /// minus any trailing file-like segment; when nothing meaningful is
    /// left the configured fallback directory is used. The file name comes
    /// from the media URL, with the enforced extension. `index` numbers the
    /// download and names files whose URL yields no usable name.
    pub fn plan_media_path(
        &self,
        media_url: &ResolvedUrl,
        source_page: &ResolvedUrl,
        index: usize,
    ) -> FileTarget {
        let mut page_segments = source_page
            .to_url()
            .map(|u| decoded_segments(u.path()))
            .unwrap_or_default();
        if page_segments.last().is_some_and(|s| s.contains('.')) {
            page_segments.pop();
        }

        let mut dir = self.root.clone();
        if page_segments.iter().all(|s| self.is_index_segment(s)) {
            dir.push(sanitize_filename(&self.media_dir_fallback, "videos"));
        } else {
            for segment in &page_segments {
                dir.push(sanitize_filename(segment, DOCUMENT_PLACEHOLDER));
            }
        }

        let placeholder = format!("media_{}", index);
        let raw_name = media_url
            .to_url()
            .and_then(|u| decoded_segments(u.path()).pop())
            .unwrap_or_default();
        let name = sanitize_filename(&raw_name, &placeholder);

        let stem = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && self.media.is_media_extension(ext) => {
                stem.to_string()
            }
            _ => name,
        };

        FileTarget {
            dir,
            stem,
            extension: self.enforced_extension.clone(),
        }
    }

    fn is_index_segment(&self, segment: &str) -> bool {
        let lower = segment.to_lowercase();
        lower == "index" || self.index_segments.contains(&lower)
    }
}

/// Splits a URL path into percent-decoded, non-empty segments
fn decoded_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect()
}

/// Creates the file for `target` without ever replacing an existing one
///
/// Tries `p`, then `p_1`, `p_2`, ... using exclusive creation until a
/// name is free. Parent directories are created as needed.
///
/// # Returns
///
/// * `Ok((path, file))` - The claimed path and the open, empty file
/// * `Err(io::Error)` - The directory or file could not be created
pub async fn create_unique(target: &FileTarget) -> io::Result<(PathBuf, tokio::fs::File)> {
    tokio::fs::create_dir_all(&target.dir).await?;

    let mut suffix = 0u32;
    loop {
        let candidate = match suffix {
            0 => target.path(),
            n => target.with_suffix(n),
        };

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!("{} exists, trying next suffix", candidate.display());
                suffix += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Writes `contents` to a fresh file for `target`; returns the path used
pub async fn write_unique(target: &FileTarget, contents: &[u8]) -> io::Result<PathBuf> {
    let (path, mut file) = create_unique(target).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::url::resolve;
    use tempfile::TempDir;

    fn planner(root: &str) -> PathPlanner {
        let config = Config::default();
        PathPlanner::new(root, &config.discovery, &config.media)
    }

    fn url(s: &str) -> ResolvedUrl {
        resolve(s, "https://x.com/").into_resolved().unwrap()
    }

    #[test]
    fn test_sanitize_forbidden_chars() {
        let out = sanitize_filename(r#" a<b>c:d"e/f\g|h?i*j "#, "x");
        assert_eq!(out, "a_b_c_d_e_f_g_h_i_j");
        assert!(!out.chars().any(|c| FORBIDDEN.contains(&c)));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "é".repeat(500);
        assert_eq!(sanitize_filename(&long, "x").chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_sanitize_placeholder() {
        assert_eq!(sanitize_filename("   ", "document"), "document");
        assert_eq!(sanitize_filename("..", "media_3"), "media_3");
    }

    #[test]
    fn test_document_mirrors_url_path() {
        let target = planner("out").plan_document_path(&url("/docs/editor/setup/"), "Setup");
        assert_eq!(target.path(), PathBuf::from("out/docs/editor/setup.txt"));
    }

    #[test]
    fn test_document_index_segment_uses_title() {
        let target = planner("out").plan_document_path(&url("/docs"), "Introduction");
        assert_eq!(target.path(), PathBuf::from("out/Introduction.txt"));

        let target = planner("out").plan_document_path(&url("/"), "Home: Page");
        assert_eq!(target.path(), PathBuf::from("out/Home_ Page.txt"));
    }

    #[test]
    fn test_document_path_is_decoded_and_sanitized() {
        let target = planner("out").plan_document_path(&url("/guide/a%3Fb/c%20d"), "T");
        assert_eq!(target.path(), PathBuf::from("out/guide/a_b/c d.txt"));
    }

    #[test]
    fn test_media_directory_from_source_page() {
        let target = planner("out").plan_media_path(
            &url("https://cdn.x.com/files/intro%20talk.mp3?sig=1"),
            &url("/learn/videos/page.html"),
            0,
        );
        assert_eq!(target.path(), PathBuf::from("out/learn/videos/intro talk.mp4"));
    }

    #[test]
    fn test_media_directory_fallback() {
        let p = planner("out");
        let media = url("/a/clip.webm");
        assert_eq!(
            p.plan_media_path(&media, &url("/"), 0).path(),
            PathBuf::from("out/videos/clip.mp4")
        );
        assert_eq!(
            p.plan_media_path(&media, &url("/docs/index.html"), 0).path(),
            PathBuf::from("out/videos/clip.mp4")
        );
    }

    #[test]
    fn test_media_extension_appended_when_unknown() {
        let target = planner("out").plan_media_path(&url("/stream/chunk.bin"), &url("/talks"), 4);
        assert_eq!(target.path(), PathBuf::from("out/talks/chunk.bin.mp4"));
    }

    #[test]
    fn test_media_placeholder_name() {
        let target = planner("out").plan_media_path(&url("/"), &url("/talks"), 7);
        assert_eq!(target.path(), PathBuf::from("out/talks/media_7.mp4"));
    }

    #[tokio::test]
    async fn test_create_unique_appends_suffix() {
        let dir = TempDir::new().unwrap();
        let target = FileTarget {
            dir: dir.path().join("nested"),
            stem: "Introduction".to_string(),
            extension: "txt".to_string(),
        };

        let first = write_unique(&target, b"one").await.unwrap();
        let second = write_unique(&target, b"two").await.unwrap();
        let third = write_unique(&target, b"three").await.unwrap();

        assert_eq!(first, dir.path().join("nested/Introduction.txt"));
        assert_eq!(second, dir.path().join("nested/Introduction_1.txt"));
        assert_eq!(third, dir.path().join("nested/Introduction_2.txt"));
        assert_eq!(std::fs::read_to_string(first).unwrap(), "one");
    }

    #[tokio::test]
    async fn test_create_unique_concurrent_claims_are_distinct() {
        let dir = TempDir::new().unwrap();
        let target = FileTarget {
            dir: dir.path().to_path_buf(),
            stem: "clip".to_string(),
            extension: "mp4".to_string(),
        };

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let target = target.clone();
            tasks.spawn(async move { create_unique(&target).await.unwrap().0 });
        }

        let mut paths = std::collections::HashSet::new();
        while let Some(path) = tasks.join_next().await {
            assert!(paths.insert(path.unwrap()));
        }
        assert_eq!(paths.len(), 8);
    }
}
