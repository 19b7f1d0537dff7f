use clap::{Parser, Subcommand, ValueEnum};
use page_harvest::{HarvestConfig, ScheduleMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(about = "Crawls one website and exports its text, links and element inventory")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a site starting from a seed URL
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// URL to start crawling from; only its host is crawled
    pub seed_url: String,

    /// JSON config file; flags given here override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Two-column URL/content workbook
    #[arg(long)]
    pub xlsx: Option<PathBuf>,

    /// Structured JSON export
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Per-URL error export
    #[arg(long)]
    pub errors: Option<PathBuf>,

    /// Export every page record with all fields
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Save each rendered page below this directory
    #[arg(long)]
    pub mirror: Option<PathBuf>,

    /// Stop after this many scraped pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Seconds to wait between pages
    #[arg(long)]
    pub delay: Option<f64>,

    /// Navigation timeout per page, in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// How long to wait for the network to go idle, in seconds
    #[arg(long)]
    pub quiescence_timeout: Option<f64>,

    /// Scheduling model
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Number of workers in concurrent mode
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Stop issuing new fetches after this many seconds
    #[arg(long)]
    pub total_timeout: Option<f64>,

    /// WebDriver endpoint (also read from WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Sequential,
    Concurrent,
}

impl From<ModeArg> for ScheduleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => ScheduleMode::Sequential,
            ModeArg::Concurrent => ScheduleMode::Concurrent,
        }
    }
}

impl RunArgs {
    /// Overrides `config` with every flag that was given
    pub fn apply_to(&self, config: &mut HarvestConfig) {
        let crawl = &mut config.crawl;
        crawl.seed_url = self.seed_url.clone();
        if let Some(max_pages) = self.max_pages {
            crawl.max_pages = Some(max_pages);
        }
        if let Some(delay) = self.delay {
            crawl.delay = delay;
        }
        if let Some(timeout) = self.timeout {
            crawl.timeout = timeout;
        }
        if let Some(quiescence_timeout) = self.quiescence_timeout {
            crawl.quiescence_timeout = quiescence_timeout;
        }
        if let Some(mode) = self.mode {
            crawl.mode = mode.into();
        }
        if let Some(concurrency) = self.concurrency {
            crawl.concurrency = concurrency;
        }
        if let Some(total_timeout) = self.total_timeout {
            crawl.total_timeout = Some(total_timeout);
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            crawl.webdriver_url = webdriver_url.clone();
        }
        if self.headed {
            crawl.headless = false;
        }

        let export = &mut config.export;
        if let Some(xlsx) = &self.xlsx {
            export.xlsx = xlsx.clone();
        }
        if let Some(json) = &self.json {
            export.json = json.clone();
        }
        if let Some(errors) = &self.errors {
            export.errors = errors.clone();
        }
        if let Some(records) = &self.records {
            export.records = Some(records.clone());
        }
        if let Some(mirror) = &self.mirror {
            export.mirror = Some(mirror.clone());
        }
    }
}
