use crate::crawlers::renderer::FetchTimeouts;
use crate::filter::UrlFilterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration problems detected before any crawling starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("concurrency must be at least 1")]
    NoWorkers,
}

/// How pages are scheduled onto renderer sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// One fetch in flight; exact breadth-first order
    #[default]
    Sequential,
    /// Several workers, each with its own renderer session
    Concurrent,
}

/// Settings that shape the crawl itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from
    #[serde(default)]
    pub seed_url: String,

    /// Stop once this many pages were scraped; unbounded when absent
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Pause between pages, in seconds
    #[serde(default = "default_delay")]
    pub delay: f64,

    /// Navigation timeout per page, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// How long to wait for network quiescence, in seconds
    #[serde(default = "default_quiescence_timeout")]
    pub quiescence_timeout: f64,

    /// Pause after quiescence for late rendering, in seconds
    #[serde(default = "default_settle")]
    pub settle: f64,

    /// Stop issuing new fetches after this many seconds
    #[serde(default)]
    pub total_timeout: Option<f64>,

    #[serde(default)]
    pub mode: ScheduleMode,

    /// Number of workers in concurrent mode
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Extra include/exclude rules for links to follow
    #[serde(default)]
    pub filter: UrlFilterConfig,
}

/// Where results are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Two-column URL/content workbook
    #[serde(default = "default_xlsx_path")]
    pub xlsx: PathBuf,

    /// Structured JSON export
    #[serde(default = "default_json_path")]
    pub json: PathBuf,

    /// Per-URL failures, written only when there are any
    #[serde(default = "default_errors_path")]
    pub errors: PathBuf,

    /// Every page record with all fields
    #[serde(default)]
    pub records: Option<PathBuf>,

    /// Directory receiving a copy of every rendered page
    #[serde(default)]
    pub mirror: Option<PathBuf>,
}

/// A complete configuration file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

fn default_delay() -> f64 {
    1.0
}

fn default_timeout() -> f64 {
    30.0
}

fn default_quiescence_timeout() -> f64 {
    5.0
}

fn default_settle() -> f64 {
    1.0
}

fn default_concurrency() -> usize {
    4
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_xlsx_path() -> PathBuf {
    PathBuf::from("scraped_content.xlsx")
}

fn default_json_path() -> PathBuf {
    PathBuf::from("scraped_data.json")
}

fn default_errors_path() -> PathBuf {
    PathBuf::from("scraper_errors.json")
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            xlsx: default_xlsx_path(),
            json: default_json_path(),
            errors: default_errors_path(),
            records: None,
            mirror: None,
        }
    }
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(seed_url: &str) -> Self {
        Self {
            seed_url: seed_url.to_string(),
            max_pages: None,
            delay: default_delay(),
            timeout: default_timeout(),
            quiescence_timeout: default_quiescence_timeout(),
            settle: default_settle(),
            total_timeout: None,
            mode: ScheduleMode::default(),
            concurrency: default_concurrency(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            filter: UrlFilterConfig::default(),
        }
    }

    pub fn delay(&self) -> Result<Duration, ConfigError> {
        seconds("delay", self.delay)
    }

    pub fn total_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.total_timeout
            .map(|value| seconds("total_timeout", value))
            .transpose()
    }

    pub fn fetch_timeouts(&self) -> Result<FetchTimeouts, ConfigError> {
        Ok(FetchTimeouts {
            navigation: seconds("timeout", self.timeout)?,
            quiescence: seconds("quiescence_timeout", self.quiescence_timeout)?,
            settle: seconds("settle", self.settle)?,
        })
    }

    /// Number of workers to run; always 1 in sequential mode
    pub fn workers(&self) -> Result<usize, ConfigError> {
        match self.mode {
            ScheduleMode::Sequential => Ok(1),
            ScheduleMode::Concurrent if self.concurrency == 0 => Err(ConfigError::NoWorkers),
            ScheduleMode::Concurrent => Ok(self.concurrency),
        }
    }

    /// Checks every derived value once so later accessors cannot fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delay()?;
        self.total_timeout()?;
        self.fetch_timeouts()?;
        self.workers()?;
        Ok(())
    }

    /// Replaces the WebDriver URL with `WEBDRIVER_URL` when that is set and non-empty
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}
