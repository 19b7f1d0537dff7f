use crate::crawlers::renderer::{
    FetchError, FetchErrorKind, FetchTimeouts, RenderedPage, Renderer, RendererLauncher,
};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

/// Well-known local WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444",
];

/// How often the quiescence check samples the page
const QUIESCENCE_POLL: Duration = Duration::from_millis(250);

/// Number of consecutive unchanged samples that count as "network idle"
const QUIET_SAMPLES: usize = 2;

const QUIESCENCE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Launches WebDriver sessions (ChromeDriver, geckodriver, Selenium...)
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
        }
    }

    fn capabilities(&self) -> serde_json::Map<String, Value> {
        let mut browser_args = vec!["--window-size=1920,1080", "--disable-gpu"];
        if self.headless {
            browser_args.push("--headless=new");
        }

        let mut caps = serde_json::Map::new();
        // Navigation returns at DOMContentLoaded; quiescence is awaited separately.
        caps.insert("pageLoadStrategy".to_string(), json!("eager"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": browser_args }),
        );
        if self.headless {
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    async fn connect(&self, webdriver_url: &str) -> Result<Client, String> {
        ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(webdriver_url)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl RendererLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>, FetchError> {
        let first_error = match self.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(Box::new(WebDriverRenderer { client }));
            }
            Err(e) => {
                ::log::warn!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                e
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS {
            if *url == self.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::info!("Connected to fallback WebDriver at {}", url);
                return Ok(Box::new(WebDriverRenderer { client }));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(FetchError::new(
            &self.webdriver_url,
            FetchErrorKind::Launch,
            first_error,
        ))
    }
}

/// A single browser session driven over WebDriver
pub struct WebDriverRenderer {
    client: Client,
}

impl WebDriverRenderer {
    /// Waits until the document is complete and no new resources have loaded for a while.
    ///
    /// Returns false when `limit` ran out first.
    async fn wait_for_quiescence(&self, limit: Duration) -> bool {
        let settled = async {
            let mut last_count = None;
            let mut quiet = 0;
            loop {
                let sample = self.client.execute(QUIESCENCE_SCRIPT, Vec::new()).await;
                let Ok(Value::Array(values)) = sample else {
                    // Pages that refuse scripts are rendered as-is.
                    return;
                };
                let complete = values.first().and_then(Value::as_str) == Some("complete");
                let count = values.get(1).and_then(Value::as_u64);

                if complete && count.is_some() && count == last_count {
                    quiet += 1;
                    if quiet >= QUIET_SAMPLES {
                        return;
                    }
                } else {
                    quiet = 0;
                }
                last_count = count;
                sleep(QUIESCENCE_POLL).await;
            }
        };
        timeout(limit, settled).await.is_ok()
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(
        &mut self,
        url: &str,
        timeouts: &FetchTimeouts,
    ) -> Result<RenderedPage, FetchError> {
        let started = Instant::now();
        ::log::info!("Navigating to: {}", url);

        match timeout(timeouts.navigation, self.client.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(command_error(url, "navigating to", e)),
            Err(_) => {
                return Err(FetchError::new(
                    url,
                    FetchErrorKind::Timeout,
                    format!("no response within {:?}", timeouts.navigation),
                ));
            }
        }

        if !self.wait_for_quiescence(timeouts.quiescence).await {
            ::log::warn!(
                "Timeout waiting for network idle on {}, proceeding with current content",
                url
            );
        }
        sleep(timeouts.settle).await;

        let html = self
            .client
            .source()
            .await
            .map_err(|e| command_error(url, "getting source for", e))?;
        let title = self.client.title().await.ok();
        let final_url = match self.client.current_url().await {
            Ok(current) => Some(String::from(current)),
            Err(e) => {
                ::log::debug!("Could not read final URL of {}: {}", url, e);
                None
            }
        };
        if let Some(final_url) = final_url.as_deref().filter(|final_url| *final_url != url) {
            ::log::debug!("{} was redirected to {}", url, final_url);
        }

        ::log::debug!(
            "Rendered {} in {:.2} seconds",
            url,
            started.elapsed().as_secs_f64()
        );
        Ok(RenderedPage {
            html,
            title,
            final_url,
        })
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

/// Maps a WebDriver command failure onto the fetch error taxonomy
fn command_error(url: &str, context: &str, error: CmdError) -> FetchError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    let kind = if lowered.contains("unable to find session")
        || lowered.contains("invalid session id")
        || lowered.contains("session not created")
        || lowered.contains("no such window")
    {
        FetchErrorKind::Session
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        FetchErrorKind::Timeout
    } else {
        FetchErrorKind::Navigation
    };

    if kind == FetchErrorKind::Session {
        ::log::warn!("Lost session while {} {}", context, url);
    }
    FetchError::new(url, kind, format!("failed {} page: {}", context, message))
}
