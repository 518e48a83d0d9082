//! Harvest coordinator - main run orchestration logic
//!
//! A run fetches the seed page, discovers the same-site links on it and then
//! processes every discovered item: documentation pages are rendered to
//! text, media references are downloaded. Per-item failures are recorded in
//! the [`RunReport`] and never stop the run; only startup failures (bad
//! seed, unreachable seed, unwritable output root) are returned as errors.

use crate::config::{validate, Config};
use crate::crawler::fetcher::{Download, HttpFetcher};
use crate::crawler::links::LinkDiscoverer;
use crate::crawler::render::{extract_media_dynamic, RenderBackend};
use crate::extract::{extract_title, ContentExtractor, MediaExtractor, MediaReference, MediaSet};
use crate::output::{write_unique, PathPlanner, RunRecorder, RunReport};
use crate::url::{has_http_scheme, resolve, ResolvedUrl, VisitedSet};
use crate::{FetchError, FetchResult, HarvestError, Result};
use scraper::Html;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of one item: its identifier and what happened to it
type ItemOutcome = (String, FetchResult<Download>);

/// Main harvest coordinator
///
/// Owns the run's [`VisitedSet`]; nothing else writes to it.
pub struct Harvester {
    config: Arc<Config>,
    seed: ResolvedUrl,
    fetcher: HttpFetcher,
    links: LinkDiscoverer,
    content: Arc<ContentExtractor>,
    planner: Arc<PathPlanner>,
    visited: VisitedSet,
}

impl Harvester {
    /// Creates a harvester for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration (validated here)
    /// * `seed_url` - Absolute http(s) URL of the starting page
    /// * `output_root` - Directory the results are written below
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Invalid seed URL or configuration
    pub fn new(config: Config, seed_url: &str, output_root: impl Into<PathBuf>) -> Result<Self> {
        validate(&config)?;

        let seed_url = seed_url.trim();
        if !has_http_scheme(seed_url) {
            return Err(HarvestError::InvalidSeed(seed_url.to_string()));
        }
        let seed = resolve(seed_url, seed_url)
            .into_resolved()
            .ok_or_else(|| HarvestError::InvalidSeed(seed_url.to_string()))?;
        let seed_host = seed
            .host()
            .ok_or_else(|| HarvestError::InvalidSeed(seed_url.to_string()))?;

        let fetcher = HttpFetcher::new(&config.http)?;
        let links = LinkDiscoverer::new(&config.discovery, &seed_host)?;
        let content = ContentExtractor::new(&config.content)?;
        let planner = PathPlanner::new(output_root, &config.discovery, &config.media);

        Ok(Self {
            config: Arc::new(config),
            seed,
            fetcher,
            links,
            content: Arc::new(content),
            planner: Arc::new(planner),
            visited: VisitedSet::new(),
        })
    }

    pub fn seed(&self) -> &ResolvedUrl {
        &self.seed
    }

    pub fn output_root(&self) -> &Path {
        self.planner.root()
    }

    /// URLs admitted so far in this run
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Harvests the documentation pages linked from the seed page
    ///
    /// Links are resolved against the URL the seed finally redirected to.
    /// Each discovered page is fetched, rendered to text and written to a
    /// collision-free `.txt` file mirroring its URL path.
    pub async fn run_documents(&mut self) -> Result<RunReport> {
        tracing::info!("Starting document harvest from {}", self.seed);
        self.prepare_output().await?;

        let seed_page = self.fetch_seed().await?;
        self.visited.insert(&self.seed);
        self.visited.insert(&seed_page.final_url);
        let targets = {
            let document = Html::parse_document(&seed_page.body);
            self.links
                .discover(&document, &seed_page.final_url, &mut self.visited)
        };
        tracing::info!("Discovered {} document link(s)", targets.len());

        let mut recorder = RunRecorder::new();
        recorder.add_total(targets.len());

        let total = targets.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency()));
        let mut tasks = JoinSet::new();

        for (i, url) in targets.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            println!("[{}/{}] {}", i + 1, total, url);

            let fetcher = self.fetcher.clone();
            let content = Arc::clone(&self.content);
            let planner = Arc::clone(&self.planner);
            tasks.spawn(async move {
                let outcome = harvest_document(&fetcher, &content, &planner, &url).await;
                drop(permit);
                (url.to_string(), outcome)
            });
        }

        collect_outcomes(&mut tasks, &mut recorder).await;
        Ok(recorder.finish())
    }

    /// Downloads the media referenced by the seed page and the pages it links to
    ///
    /// Runs in two passes: first every page is scanned and references are
    /// merged by absolute URL, then each distinct reference is downloaded.
    pub async fn run_media(&mut self) -> Result<RunReport> {
        tracing::info!("Starting media harvest from {}", self.seed);
        self.prepare_output().await?;

        let extractor = MediaExtractor::new(&self.config.media)?;
        let mut media = MediaSet::new();

        let seed_page = self.fetch_seed().await?;
        let seed_url = seed_page.final_url.clone();
        self.visited.insert(&self.seed);
        self.visited.insert(&seed_url);
        let pages = {
            let document = Html::parse_document(&seed_page.body);
            extractor.extract_into(&document, &seed_page.body, &seed_url, &mut media);
            self.links
                .discover(&document, &seed_url, &mut self.visited)
        };

        let total_pages = pages.len();
        for (i, page_url) in pages.iter().enumerate() {
            println!("Scanning [{}/{}] {}", i + 1, total_pages, page_url);
            match self.fetcher.fetch_page(page_url).await {
                Ok(page) => {
                    let document = Html::parse_document(&page.body);
                    let added =
                        extractor.extract_into(&document, &page.body, &page.final_url, &mut media);
                    tracing::debug!("{} new media reference(s) on {}", added, page.final_url);
                }
                Err(e) => tracing::warn!("Skipping scan of {}: {}", page_url, e),
            }
        }

        tracing::info!(
            "Found {} distinct media reference(s) on {} page(s)",
            media.len(),
            total_pages + 1
        );
        Ok(self.download_all(media.into_vec()).await)
    }

    /// Media harvest with pages loaded through a script-executing backend
    ///
    /// Same two passes as [`Harvester::run_media`]. Rendered markup goes
    /// through the regular strategies and the live page is additionally
    /// queried for media sources. Downloads use the plain HTTP fetcher.
    pub async fn run_media_dynamic<B: RenderBackend>(&mut self, backend: &B) -> Result<RunReport> {
        tracing::info!("Starting rendered media harvest from {}", self.seed);
        self.prepare_output().await?;

        let extractor = MediaExtractor::for_rendered_pages(&self.config.media)?;
        let mut media = MediaSet::new();

        let seed_page = backend.load_and_render(&self.seed).await?;
        let seed_url = seed_page.url.clone();
        self.visited.insert(&self.seed);
        self.visited.insert(&seed_url);
        let pages = {
            let document = Html::parse_document(&seed_page.markup);
            extractor.extract_into(&document, &seed_page.markup, &seed_url, &mut media);
            self.links
                .discover(&document, &seed_url, &mut self.visited)
        };
        extract_media_dynamic(backend, &seed_url, &extractor, &mut media).await;

        let total_pages = pages.len();
        for (i, page_url) in pages.iter().enumerate() {
            println!("Scanning [{}/{}] {}", i + 1, total_pages, page_url);
            match backend.load_and_render(page_url).await {
                Ok(page) => {
                    {
                        let document = Html::parse_document(&page.markup);
                        extractor.extract_into(&document, &page.markup, &page.url, &mut media);
                    }
                    extract_media_dynamic(backend, &page.url, &extractor, &mut media).await;
                }
                Err(e) => tracing::warn!("Skipping scan of {}: {}", page_url, e),
            }
        }

        tracing::info!(
            "Found {} distinct media reference(s) on {} page(s)",
            media.len(),
            total_pages + 1
        );
        Ok(self.download_all(media.into_vec()).await)
    }

    /// Second pass of the media modes: download every reference
    async fn download_all(&self, references: Vec<MediaReference>) -> RunReport {
        let mut recorder = RunRecorder::new();
        recorder.add_total(references.len());

        let total = references.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency()));
        let mut tasks = JoinSet::new();

        for (i, reference) in references.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            println!("[{}/{}] {}", i + 1, total, reference.url);

            let target = self
                .planner
                .plan_media_path(&reference.url, &reference.source_page, i + 1);
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move {
                let outcome = fetcher
                    .download(&reference.url, &target, Some(&reference.source_page))
                    .await;
                drop(permit);
                (reference.url.to_string(), outcome)
            });
        }

        collect_outcomes(&mut tasks, &mut recorder).await;
        recorder.finish()
    }

    async fn fetch_seed(&self) -> Result<crate::crawler::Page> {
        self.fetcher
            .fetch_page(&self.seed)
            .await
            .map_err(|source| HarvestError::SeedUnreachable {
                url: self.seed.to_string(),
                source,
            })
    }

    /// Makes sure the output root exists before any work starts
    async fn prepare_output(&self) -> Result<()> {
        let root = self.planner.root();
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|source| HarvestError::OutputUnwritable {
                path: root.display().to_string(),
                source,
            })
    }

    fn concurrency(&self) -> usize {
        self.config.pipeline.max_concurrent_items.max(1) as usize
    }
}

/// Fetches one documentation page, renders it and writes it to disk
async fn harvest_document(
    fetcher: &HttpFetcher,
    content: &ContentExtractor,
    planner: &PathPlanner,
    url: &ResolvedUrl,
) -> FetchResult<Download> {
    let page = fetcher.fetch_page(url).await?;

    let (title, text) = {
        let document = Html::parse_document(&page.body);
        (extract_title(&document, url), content.extract(&document))
    };

    let target = planner.plan_document_path(url, &title);
    let path = write_unique(&target, text.as_bytes())
        .await
        .map_err(|source| FetchError::Write {
            path: target.path().display().to_string(),
            source,
        })?;

    Ok(Download {
        path,
        bytes: text.len() as u64,
    })
}

/// Drains finished items into the recorder
async fn collect_outcomes(tasks: &mut JoinSet<ItemOutcome>, recorder: &mut RunRecorder) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(download))) => {
                tracing::info!("Saved {} -> {}", id, download.path.display());
                recorder.record_success(download.bytes);
            }
            Ok((id, Err(e))) => {
                tracing::warn!("Failed {}: {}", id, e);
                recorder.record_failure(id, e.to_string());
            }
            Err(e) => {
                tracing::error!("Item task aborted: {}", e);
                recorder.record_failure("<aborted task>", e.to_string());
            }
        }
    }
}
