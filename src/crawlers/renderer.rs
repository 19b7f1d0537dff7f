use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Time limits applied to a single page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    /// Hard limit for the main document to become available
    pub navigation: Duration,

    /// Soft limit for waiting on network quiescence; running out is not an error
    pub quiescence: Duration,

    /// Fixed pause after quiescence for late script-driven rendering
    pub settle: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            quiescence: Duration::from_secs(5),
            settle: Duration::from_secs(1),
        }
    }
}

/// What the renderer hands back for a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Serialized DOM after rendering
    pub html: String,

    /// Title as reported by the renderer, if it reported one
    pub title: Option<String>,

    /// Where the document ended up after redirects, if the renderer knows
    pub final_url: Option<String>,
}

/// Why a fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// DNS failure, refused connection, bad response and the like
    Navigation,
    /// The navigation timeout ran out
    Timeout,
    /// The renderer session is gone and must be replaced
    Session,
    /// No renderer session could be started
    Launch,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::Navigation => "navigation failed",
            FetchErrorKind::Timeout => "navigation timed out",
            FetchErrorKind::Session => "renderer session lost",
            FetchErrorKind::Launch => "renderer launch failed",
        };
        f.write_str(name)
    }
}

/// A failed fetch. Recoverable: the crawl records it and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Error scraping {url}: {kind}: {message}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn is_session_lost(&self) -> bool {
        self.kind == FetchErrorKind::Session
    }
}

/// One renderer session, e.g. a browser window driven over WebDriver.
///
/// A session renders one page at a time and is reused across pages.
#[async_trait]
pub trait Renderer: Send {
    /// Navigates to `url` and returns the rendered document
    async fn render(&mut self, url: &str, timeouts: &FetchTimeouts)
    -> Result<RenderedPage, FetchError>;

    /// Releases the session. Failures are logged, not returned.
    async fn close(self: Box<Self>);
}

/// Starts renderer sessions
#[async_trait]
pub trait RendererLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Renderer>, FetchError>;
}
