/// Checks if a host matches a wildcard pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches "example.com" itself and any
///    subdomain at any depth
///
/// Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use doc_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "EXAMPLE.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let candidate = candidate.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Same-site policy: the set of hosts discovered links may point at
#[derive(Debug, Clone, Default)]
pub struct HostAllowList {
    patterns: Vec<String>,
}

impl HostAllowList {
    /// Builds an allow-list from host patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds one more allowed host pattern
    pub fn allow(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Returns true if `host` matches any allowed pattern
    pub fn is_allowed(&self, host: &str) -> bool {
        self.patterns.iter().any(|p| matches_wildcard(p, host))
    }

    /// Returns true if no host is allowed
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
