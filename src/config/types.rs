use serde::Deserialize;

/// Main configuration structure for Doc-Harvest
///
/// Every section is optional; missing sections and keys take the defaults
/// below, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub discovery: DiscoveryConfig,
    pub content: ContentConfig,
    pub media: MediaConfig,
    pub pipeline: PipelineConfig,
    pub translation: TranslationConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Time allowed to establish a connection (seconds)
    pub connect_timeout_secs: u64,

    /// Longest wait for any single read of a response (seconds)
    ///
    /// Restarts on every chunk, so a slow but steady transfer never times out.
    pub read_timeout_secs: u64,

    /// Time allowed to send a request, added to the read timeout while
    /// waiting for the response headers (seconds)
    pub write_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            connect_timeout_secs: 30,
            read_timeout_secs: 60,
            write_timeout_secs: 60,
        }
    }
}

/// Link discovery rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Host patterns links may point at (e.g. "example.com", "*.example.com").
    /// The seed host is always allowed.
    pub allowed_hosts: Vec<String>,

    /// Links whose href contains any of these substrings are skipped
    pub deny_substrings: Vec<String>,

    /// Extra selectors for navigation menus whose links are also collected
    pub nav_selectors: Vec<String>,

    /// Last path segments that stand for an index page rather than a document name
    pub index_segments: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            deny_substrings: vec![
                "download".to_string(),
                "api".to_string(),
                "release-notes".to_string(),
            ],
            nav_selectors: vec![
                ".docs-nav a[href]".to_string(),
                "nav a[href]".to_string(),
                ".sidebar a[href]".to_string(),
            ],
            index_segments: vec!["docs".to_string()],
        }
    }
}

/// Text rendering rules for documentation pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContentConfig {
    /// Main content containers, tried in order
    pub container_selectors: Vec<String>,

    /// Subtrees removed before rendering
    pub strip_selectors: Vec<String>,

    /// Line written before a code block
    pub code_open_marker: String,

    /// Line written after a code block
    pub code_close_marker: String,

    /// Prefix for list items
    pub bullet: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            container_selectors: [
                "article",
                ".content",
                ".docs-content",
                ".main-content",
                "main",
                "#content",
                ".documentation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            strip_selectors: [
                "script",
                "style",
                "nav",
                "footer",
                ".sidebar",
                ".toc",
                "button",
                ".advertisement",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            code_open_marker: "[code]".to_string(),
            code_close_marker: "[/code]".to_string(),
            bullet: "• ".to_string(),
        }
    }
}

/// Media detection and naming rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MediaConfig {
    /// File extensions recognised as media (without the dot)
    pub extensions: Vec<String>,

    /// Additional extensions recognised when pages are rendered by a browser
    pub dynamic_extensions: Vec<String>,

    /// Directory used when the source page path yields no usable directory
    pub directory_fallback: String,

    /// Extension every downloaded media file is saved with
    pub enforced_extension: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "mp4", "m4a", "wav", "ogg", "webm", "aac", "flac"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dynamic_extensions: vec!["m3u8".to_string()],
            directory_fallback: "videos".to_string(),
            enforced_extension: "mp4".to_string(),
        }
    }
}

/// Run-level pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Items fetched and persisted at the same time (1 = sequential)
    pub max_concurrent_items: u32,

    /// Settle time after a rendered page loads (milliseconds)
    pub render_wait_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: 1,
            render_wait_ms: 5000,
        }
    }
}

/// Retry and pacing settings for the translation pass
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TranslationConfig {
    /// Attempts per chunk before falling back to the original text
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further attempt (milliseconds)
    pub initial_backoff_ms: u64,

    /// Minimum gap between two calls to the translation service (milliseconds)
    pub min_interval_ms: u64,

    /// Longest chunk handed to the service in one call (characters)
    pub max_chunk_chars: usize,

    /// Pause after each translated file (milliseconds)
    pub file_delay_ms: u64,

    /// File extensions picked up by the directory pass
    pub extensions: Vec<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 5000,
            min_interval_ms: 3000,
            max_chunk_chars: 500,
            file_delay_ms: 0,
            extensions: vec!["txt".to_string(), "md".to_string()],
        }
    }
}
