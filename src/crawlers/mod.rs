pub mod cancel;
pub mod frontier;
pub mod renderer;
pub mod webdriver;

mod concurrent;
mod sequential;


use crate::config::{ConfigError, CrawlConfig, ScheduleMode};
use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::filter::{self, UrlFilter};
use crate::output::mirror::HtmlMirror;
use crate::parsers::{DomExtractor, Extractor};
use crate::results::{CrawlOutcome, ErrorRecord, PageRecord};
use cancel::CancelSignal;
use futures::FutureExt;
use renderer::{FetchError, FetchTimeouts, RenderedPage, Renderer, RendererLauncher};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failures that prevent a crawl from starting
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed URL {url:?}: {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("seed URL {0} must use http or https")]
    UnsupportedSeed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("could not start a renderer session: {0}")]
    Launch(#[source] FetchError),
}

/// The crawl controller.
///
/// Owns the traversal rules and drives fetch, extract and enqueue cycles
/// over renderer sessions obtained from a [`RendererLauncher`].
#[derive(Clone)]
pub struct Crawler {
    seed: String,
    mode: ScheduleMode,
    workers: usize,
    budget: Option<usize>,
    delay: Duration,
    timeouts: FetchTimeouts,
    filter: Arc<UrlFilter>,
    extractor: Arc<dyn Extractor>,
    diagnostics: Arc<dyn Diagnostics>,
    mirror: Option<Arc<HtmlMirror>>,
    cancel: CancelSignal,
}

/// How a single claimed URL ended
pub(crate) enum Visit {
    Scraped(PageRecord),
    Failed(ErrorRecord),
    /// The page failed and the crawl cannot go on
    Fatal { record: ErrorRecord, reason: String },
}

enum PageFailure {
    Recoverable(FetchError),
    Fatal(String),
}

impl Crawler {
    /// Validates `config` and builds a crawler with the standard extractor and log diagnostics
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        config.validate()?;

        let seed_str = config.seed_url.trim();
        let seed = Url::parse(seed_str).map_err(|source| CrawlError::InvalidSeed {
            url: seed_str.to_string(),
            source,
        })?;
        if !matches!(seed.scheme(), "http" | "https") {
            return Err(CrawlError::UnsupportedSeed(seed_str.to_string()));
        }

        Ok(Self {
            seed: filter::canonicalize(seed).into(),
            mode: config.mode,
            workers: config.workers()?,
            budget: config.max_pages,
            delay: config.delay()?,
            timeouts: config.fetch_timeouts()?,
            filter: Arc::new(UrlFilter::new(&config.filter)?),
            extractor: Arc::new(DomExtractor),
            diagnostics: Arc::new(LogDiagnostics),
            mirror: None,
            cancel: CancelSignal::never(),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Save every rendered page below the mirror's root directory
    pub fn with_mirror(mut self, mirror: HtmlMirror) -> Self {
        self.mirror = Some(Arc::new(mirror));
        self
    }

    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Canonical form of the seed URL
    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Crawls from the seed until the frontier is exhausted, the page budget is
    /// reached, the crawl is cancelled or an unrecoverable failure occurs.
    ///
    /// Per-page failures end up in the outcome's error list. Only a failure to
    /// start the first renderer session is returned as an error; every session
    /// opened is closed before this returns.
    pub async fn crawl(
        &self,
        launcher: Arc<dyn RendererLauncher>,
    ) -> Result<CrawlOutcome, CrawlError> {
        self.diagnostics.crawl_started(&self.seed, self.mode);
        let session = launcher.launch().await.map_err(CrawlError::Launch)?;

        let outcome = match self.mode {
            ScheduleMode::Sequential => sequential::run(self, session, launcher.as_ref()).await,
            ScheduleMode::Concurrent => concurrent::run(self, session, launcher).await,
        };

        if let Some(reason) = &outcome.aborted {
            self.diagnostics.crawl_aborted(reason);
        }
        self.diagnostics.crawl_finished(&outcome);
        Ok(outcome)
    }

    /// Fetches and extracts one claimed URL.
    ///
    /// A panic anywhere in the page pipeline is contained here and turned into
    /// a fatal visit, so the caller still owns the session and can close it.
    pub(crate) async fn visit(
        &self,
        session: &mut Option<Box<dyn Renderer>>,
        launcher: &dyn RendererLauncher,
        url: &str,
    ) -> Visit {
        let visited = AssertUnwindSafe(self.visit_page(session, launcher, url))
            .catch_unwind()
            .await;
        match visited {
            Ok(visit) => visit,
            Err(panic) => {
                let reason = format!(
                    "internal failure while processing {}: {}",
                    url,
                    panic_message(panic.as_ref())
                );
                let record = ErrorRecord::new(url, format!("Error scraping {}: {}", url, reason));
                self.diagnostics.page_failed(&record);
                Visit::Fatal { record, reason }
            }
        }
    }

    async fn visit_page(
        &self,
        session: &mut Option<Box<dyn Renderer>>,
        launcher: &dyn RendererLauncher,
        url: &str,
    ) -> Visit {
        match self.fetch(session, launcher, url).await {
            Ok(page) => {
                if let Some(mirror) = &self.mirror {
                    if let Err(e) = mirror.save(url, &page.html) {
                        ::log::error!("Failed to mirror {}: {}", url, e);
                    }
                }
                match self.scrape(url, page) {
                    Ok(record) => {
                        self.diagnostics.page_scraped(&record);
                        Visit::Scraped(record)
                    }
                    Err(record) => {
                        self.diagnostics.page_failed(&record);
                        Visit::Failed(record)
                    }
                }
            }
            Err(PageFailure::Recoverable(error)) => {
                let record = ErrorRecord::new(url, error.to_string());
                self.diagnostics.page_failed(&record);
                Visit::Failed(record)
            }
            Err(PageFailure::Fatal(reason)) => {
                let record = ErrorRecord::new(url, format!("Error scraping {}: {}", url, reason));
                self.diagnostics.page_failed(&record);
                Visit::Fatal { record, reason }
            }
        }
    }

    /// Renders `url`, replacing the session once if it turns out to be dead
    async fn fetch(
        &self,
        session: &mut Option<Box<dyn Renderer>>,
        launcher: &dyn RendererLauncher,
        url: &str,
    ) -> Result<RenderedPage, PageFailure> {
        let Some(renderer) = session.as_mut() else {
            return Err(PageFailure::Fatal("no renderer session".to_string()));
        };

        match renderer.render(url, &self.timeouts).await {
            Err(error) if error.is_session_lost() => {
                ::log::warn!("Renderer session lost on {}, reconnecting", url);
                if let Some(dead) = session.take() {
                    dead.close().await;
                }
                match launcher.launch().await {
                    Ok(fresh) => {
                        ::log::info!("Reconnected renderer session, retrying {}", url);
                        let renderer = session.insert(fresh);
                        renderer
                            .render(url, &self.timeouts)
                            .await
                            .map_err(PageFailure::Recoverable)
                    }
                    Err(e) => Err(PageFailure::Fatal(format!(
                        "could not replace lost renderer session: {}",
                        e
                    ))),
                }
            }
            result => result.map_err(PageFailure::Recoverable),
        }
    }

    /// Extracts a rendered page. Links resolve against the post-redirect URL;
    /// the record keeps the claimed `url`.
    fn scrape(&self, url: &str, page: RenderedPage) -> Result<PageRecord, ErrorRecord> {
        let document_url = page.final_url.as_deref().unwrap_or(url);
        match self.extractor.extract(&page.html, document_url) {
            Ok(extraction) => {
                for warning in &extraction.warnings {
                    self.diagnostics.extraction_warning(url, warning);
                }
                Ok(extraction.into_record(url, page.title.as_deref()))
            }
            Err(e) => Err(ErrorRecord::new(
                url,
                format!("Error scraping {}: {}", url, e),
            )),
        }
    }

    /// Internal links of a scraped page that should be queued, in page order
    pub(crate) fn links_to_follow(&self, record: &PageRecord) -> Vec<String> {
        record
            .internal_links
            .iter()
            .filter(|link| filter::is_in_scope(link, &record.url))
            .filter(|link| {
                let follow = self.filter.should_follow(link);
                if !follow {
                    ::log::debug!("URL filter rejected: {}", link);
                }
                follow
            })
            .cloned()
            .collect()
    }

    /// Waits out the inter-request delay. Returns false if cancelled meanwhile.
    pub(crate) async fn pause(&self, cancel: &mut CancelSignal) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => !cancel.is_cancelled(),
            _ = cancel.cancelled() => false,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
