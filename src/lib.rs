pub mod config;
pub mod crawlers;
pub mod diagnostics;
pub mod filter;
pub mod output;
pub mod parsers;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{CrawlConfig, ExportConfig, HarvestConfig, ScheduleMode};
pub use crawlers::cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use crawlers::webdriver::WebDriverLauncher;
pub use crawlers::{CrawlError, Crawler};
pub use results::{CrawlOutcome, ElementInfo, ErrorRecord, PageRecord};

use crawlers::renderer::RendererLauncher;
use diagnostics::Diagnostics;
use output::mirror::HtmlMirror;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a finished run produced
#[derive(Debug)]
pub struct HarvestReport {
    pub outcome: CrawlOutcome,

    /// Number of output sinks that could not be written
    pub failed_sinks: usize,

    pub duration: Duration,
}

/// Main builder: crawl a site, then write every configured export
pub struct Harvest {
    config: HarvestConfig,
    cancel: CancelSignal,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl Harvest {
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            cancel: CancelSignal::never(),
            diagnostics: None,
        }
    }

    /// Load configuration from a file
    pub fn from_config_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, config::ConfigError> {
        Ok(Self::new(HarvestConfig::from_file(path)?))
    }

    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Builds the crawl controller described by the configuration
    pub fn crawler(&self) -> Result<Crawler, CrawlError> {
        let mut crawler = Crawler::new(&self.config.crawl)?.with_cancel_signal(self.cancel.clone());
        if let Some(diagnostics) = &self.diagnostics {
            crawler = crawler.with_diagnostics(Arc::clone(diagnostics));
        }
        if let Some(root) = &self.config.export.mirror {
            crawler = crawler.with_mirror(HtmlMirror::new(root));
        }
        Ok(crawler)
    }

    /// The WebDriver launcher for the configured endpoint
    pub fn webdriver_launcher(&self) -> WebDriverLauncher {
        WebDriverLauncher::new(&self.config.crawl.webdriver_url, self.config.crawl.headless)
    }

    /// Crawls and exports. Only startup failures are returned as errors;
    /// an aborted crawl still has its results exported.
    pub async fn run(
        &self,
        launcher: Arc<dyn RendererLauncher>,
    ) -> Result<HarvestReport, CrawlError> {
        let crawler = self.crawler()?;
        let started = Instant::now();

        let outcome = crawler.crawl(launcher).await?;
        let failed_sinks = output::export(&outcome, &self.config.export);

        Ok(HarvestReport {
            outcome,
            failed_sinks,
            duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlers::renderer::{FetchError, FetchTimeouts, RenderedPage, Renderer};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct OnePageSite;

    struct OnePageRenderer;

    #[async_trait]
    impl RendererLauncher for OnePageSite {
        async fn launch(&self) -> Result<Box<dyn Renderer>, FetchError> {
            Ok(Box::new(OnePageRenderer))
        }
    }

    #[async_trait]
    impl Renderer for OnePageRenderer {
        async fn render(
            &mut self,
            url: &str,
            _timeouts: &FetchTimeouts,
        ) -> Result<RenderedPage, FetchError> {
            Ok(RenderedPage {
                html: format!(
                    "<html><head><title>Only</title></head><body><p>{}</p></body></html>",
                    url
                ),
                title: None,
                final_url: Some(url.to_string()),
            })
        }

        async fn close(self: Box<Self>) {}
    }

    fn harvest_config(dir: &TempDir) -> HarvestConfig {
        let mut crawl = CrawlConfig::new("http://a.test/");
        crawl.delay = 0.0;
        HarvestConfig {
            crawl,
            export: ExportConfig {
                xlsx: dir.path().join("content.xlsx"),
                json: dir.path().join("data.json"),
                errors: dir.path().join("errors.json"),
                records: None,
                mirror: Some(dir.path().join("mirror")),
            },
        }
    }

    #[tokio::test]
    async fn test_run_crawls_and_exports() {
        let dir = TempDir::new().unwrap();
        let harvest = Harvest::new(harvest_config(&dir));

        let report = harvest.run(Arc::new(OnePageSite)).await.unwrap();

        assert_eq!(report.outcome.pages.len(), 1);
        assert_eq!(report.outcome.pages[0].title, "Only");
        assert_eq!(report.failed_sinks, 0);
        assert!(dir.path().join("content.xlsx").exists());
        assert!(dir.path().join("data.json").exists());
        assert!(!dir.path().join("errors.json").exists());
        assert!(
            dir.path()
                .join("mirror")
                .join("a.test")
                .join("index.html")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_before_crawling() {
        let dir = TempDir::new().unwrap();
        let mut config = harvest_config(&dir);
        config.crawl.seed_url = "::not a url::".to_string();

        let result = Harvest::new(config).run(Arc::new(OnePageSite)).await;
        assert!(matches!(result, Err(CrawlError::InvalidSeed { .. })));
    }
}
