use crate::config::ScheduleMode;
use crate::results::{CrawlOutcome, ErrorRecord, PageRecord};

/// Receives crawl progress events.
///
/// The crawler is handed one of these at construction instead of logging
/// outcome events itself. Every method has a no-op default.
pub trait Diagnostics: Send + Sync {
    fn crawl_started(&self, _seed: &str, _mode: ScheduleMode) {}

    fn page_scraped(&self, _record: &PageRecord) {}

    fn page_failed(&self, _record: &ErrorRecord) {}

    /// A page was kept, but part of it could not be extracted
    fn extraction_warning(&self, _url: &str, _warning: &str) {}

    fn crawl_aborted(&self, _reason: &str) {}

    fn crawl_finished(&self, _outcome: &CrawlOutcome) {}
}

/// Forwards every event to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn crawl_started(&self, seed: &str, mode: ScheduleMode) {
        ::log::info!("Starting {:?} crawl from {}", mode, seed);
    }

    fn page_scraped(&self, record: &PageRecord) {
        ::log::info!(
            "Successfully scraped {} ({} chars, {} links)",
            record.url,
            record.text.chars().count(),
            record.internal_links.len()
        );
    }

    fn page_failed(&self, record: &ErrorRecord) {
        ::log::error!("{}", record.error_message);
    }

    fn extraction_warning(&self, url: &str, warning: &str) {
        ::log::warn!("Extraction issue on {}: {}", url, warning);
    }

    fn crawl_aborted(&self, reason: &str) {
        ::log::error!("Crawl aborted due to error: {}", reason);
    }

    fn crawl_finished(&self, outcome: &CrawlOutcome) {
        ::log::info!(
            "Crawl complete. Scraped {} pages, {} errors",
            outcome.pages.len(),
            outcome.errors.len()
        );
    }
}

