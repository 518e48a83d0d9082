//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building one HTTP client per run from the `[http]` configuration
//! - GET requests for page markup
//! - Streaming binary downloads into collision-free files
//! - Error classification (status, timeout, connection)

use crate::config::HttpConfig;
use crate::output::{create_unique, FileTarget};
use crate::url::{resolve, ResolvedUrl};
use crate::{FetchError, FetchResult};
use reqwest::{Client, Response};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// A fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub final_url: ResolvedUrl,

    /// HTTP status code
    pub status: u16,

    /// Page body
    pub body: String,
}

/// A completed download
#[derive(Debug, Clone)]
pub struct Download {
    /// Where the file was written
    pub path: PathBuf,

    /// Bytes written
    pub bytes: u64,
}

/// Builds an HTTP client with proper configuration
///
/// Only the connect timeout is set on the client. Read and write deadlines
/// are enforced per operation by [`HttpFetcher`], since a client-wide
/// timeout would cut off long transfers that are still making progress.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetch source for pages and media
///
/// The response headers must arrive within the write plus read timeout.
/// After that every body read gets the read timeout on its own.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> FetchResult<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            write_timeout: Duration::from_secs(config.write_timeout_secs),
        })
    }

    /// Fetches a page as text
    ///
    /// The body is decoded as UTF-8, replacing invalid sequences.
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - 2xx response with its body
    /// * `Err(FetchError::Status)` - Non-2xx response
    /// * `Err(FetchError)` - Timeout, connection or body read failure
    pub async fn fetch_page(&self, url: &ResolvedUrl) -> FetchResult<Page> {
        tracing::debug!("GET {}", url);
        let mut response = self.send(url, None).await?;

        let final_url = resolve(response.url().as_str(), url.as_str())
            .into_resolved()
            .unwrap_or_else(|| url.clone());
        if final_url != *url {
            tracing::debug!("{} redirected to {}", url, final_url);
        }
        let status = response.status().as_u16();

        let mut body = Vec::new();
        while let Some(chunk) = within(self.read_timeout, url, response.chunk()).await? {
            body.extend_from_slice(&chunk);
        }

        Ok(Page {
            final_url,
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    /// Downloads `url` into a fresh file planned by `target`
    ///
    /// The file is only created once a 2xx response has arrived. The body
    /// is streamed chunk by chunk; if the transfer fails the partial file
    /// is removed. `referer` is sent when set, since some media hosts
    /// refuse hot-linked requests.
    pub async fn download(
        &self,
        url: &ResolvedUrl,
        target: &FileTarget,
        referer: Option<&ResolvedUrl>,
    ) -> FetchResult<Download> {
        tracing::debug!("Downloading {}", url);
        let mut response = self.send(url, referer).await?;

        let (path, mut file) = create_unique(target)
            .await
            .map_err(|source| FetchError::Write {
                path: target.path().display().to_string(),
                source,
            })?;

        match self.stream_body(url, &mut response, &mut file, &path).await {
            Ok(bytes) => Ok(Download { path, bytes }),
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        "Failed to remove partial file {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn send(&self, url: &ResolvedUrl, referer: Option<&ResolvedUrl>) -> FetchResult<Response> {
        let mut request = self.client.get(url.as_str());
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer.as_str());
        }

        let response = within(self.write_timeout + self.read_timeout, url, request.send()).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn stream_body(
        &self,
        url: &ResolvedUrl,
        response: &mut Response,
        file: &mut tokio::fs::File,
        path: &std::path::Path,
    ) -> FetchResult<u64> {
        let write_err = |source| FetchError::Write {
            path: path.display().to_string(),
            source,
        };

        let mut bytes = 0u64;
        while let Some(chunk) = within(self.read_timeout, url, response.chunk()).await? {
            file.write_all(&chunk).await.map_err(write_err)?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        Ok(bytes)
    }
}

/// Runs one network operation under `limit`
///
/// Body reads go through here one chunk at a time, so the read timeout
/// restarts whenever data arrives.
async fn within<T>(
    limit: Duration,
    url: &ResolvedUrl,
    operation: impl Future<Output = Result<T, reqwest::Error>>,
) -> FetchResult<T> {
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result.map_err(|e| classify(url.as_str(), e)),
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
        }),
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
