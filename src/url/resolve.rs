use std::fmt;
use url::Url;

/// An absolute, scheme-qualified URL
///
/// Only [`resolve`] produces values of this type, so anything holding a
/// `ResolvedUrl` never carries a relative reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedUrl(String);

impl ResolvedUrl {
    /// Returns the URL as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the URL into its components
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }

    /// Returns the same URL without its `#fragment`
    pub fn without_fragment(&self) -> ResolvedUrl {
        match self.0.split_once('#') {
            Some((head, _)) => ResolvedUrl(head.to_string()),
            None => self.clone(),
        }
    }

    /// Returns the path component, without query string or fragment
    pub fn path(&self) -> String {
        match self.to_url() {
            Some(url) => url.path().to_string(),
            None => String::new(),
        }
    }

    /// Returns the lowercase host, if any
    pub fn host(&self) -> Option<String> {
        self.to_url()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of resolving a reference against a base URL
///
/// Resolution never fails outright: when the base is unusable the raw
/// reference is handed back as [`Resolution::Passthrough`] so callers can
/// tell it apart from a real absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The reference resolved to an absolute URL
    Resolved(ResolvedUrl),

    /// The reference could not be resolved and is returned unchanged
    Passthrough {
        /// The input reference
        raw: String,
        /// Why resolution was not possible
        reason: &'static str,
    },
}

impl Resolution {
    /// Returns true if an absolute URL was produced
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns the best-effort string form (absolute or raw)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(url) => url.as_str(),
            Self::Passthrough { raw, .. } => raw,
        }
    }

    /// Converts into the resolved URL, dropping passthrough values
    pub fn into_resolved(self) -> Option<ResolvedUrl> {
        match self {
            Self::Resolved(url) => Some(url),
            Self::Passthrough { .. } => None,
        }
    }
}

/// Resolves a possibly relative reference against a base URL
///
/// # Resolution Rules
///
/// Applied in order:
///
/// 1. `http://` / `https://` references are returned unchanged
/// 2. Protocol-relative `//host/path` takes the scheme of the base
/// 3. Root-relative `/path` is joined to the scheme, host and port of the base
/// 4. Anything else is appended to the directory of the base path (the base
///    path up to and including its last `/`)
///
/// Dot segments (`.` and `..`) in the joined path are collapsed for rules 3
/// and 4. A malformed base yields [`Resolution::Passthrough`].
///
/// # Examples
///
/// ```
/// use doc_harvest::url::resolve;
///
/// let r = resolve("../intro", "https://x.com/docs/editor/");
/// assert_eq!(r.as_str(), "https://x.com/docs/intro");
///
/// let r = resolve("//cdn.x.com/a.mp3", "https://x.com/page");
/// assert_eq!(r.as_str(), "https://cdn.x.com/a.mp3");
/// ```
pub fn resolve(reference: &str, base_url: &str) -> Resolution {
    let reference = reference.trim();

    if has_http_scheme(reference) {
        return Resolution::Resolved(ResolvedUrl(reference.to_string()));
    }

    let base = match Url::parse(base_url.trim()) {
        Ok(base) => base,
        Err(_) => return passthrough(reference, "malformed base URL"),
    };

    let host = match base.host_str() {
        Some(host) => host,
        None => return passthrough(reference, "base URL has no host"),
    };

    if let Some(rest) = reference.strip_prefix("//") {
        return Resolution::Resolved(ResolvedUrl(format!("{}://{}", base.scheme(), rest)));
    }

    let authority = match base.port() {
        Some(port) => format!("{}://{}:{}", base.scheme(), host, port),
        None => format!("{}://{}", base.scheme(), host),
    };

    let joined = if reference.starts_with('/') {
        reference.to_string()
    } else {
        let base_path = base.path();
        let directory = match base_path.rfind('/') {
            Some(idx) => &base_path[..=idx],
            None => "/",
        };
        format!("{}{}", directory, reference)
    };

    Resolution::Resolved(ResolvedUrl(format!(
        "{}{}",
        authority,
        collapse_dot_segments(&joined)
    )))
}

/// Returns true for references that already carry an http(s) scheme
pub fn has_http_scheme(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn passthrough(reference: &str, reason: &'static str) -> Resolution {
    tracing::debug!("Could not resolve '{}': {}", reference, reason);
    Resolution::Passthrough {
        raw: reference.to_string(),
        reason,
    }
}

/// Collapses `.` and `..` segments in the path part of a reference,
/// leaving any query string or fragment untouched
fn collapse_dot_segments(reference: &str) -> String {
    let split_at = reference.find(['?', '#']).unwrap_or(reference.len());
    let (path, tail) = reference.split_at(split_at);

    let mut segments: Vec<&str> = Vec::new();
    let raw_segments: Vec<&str> = path.split('/').collect();
    let last = raw_segments.len().saturating_sub(1);
    let mut trailing_slash = path.ends_with('/');

    for (i, segment) in raw_segments.iter().enumerate() {
        match *segment {
            "" => continue,
            "." => {
                if i == last {
                    trailing_slash = true;
                }
            }
            ".." => {
                segments.pop();
                if i == last {
                    trailing_slash = true;
                }
            }
            other => segments.push(other),
        }
    }

    let mut result = format!("/{}", segments.join("/"));
    if trailing_slash && !result.ends_with('/') {
        result.push('/');
    }
    result.push_str(tail);
    result
}
