use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// A successfully scraped page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical URL of the page
    pub url: String,

    /// Document title, empty when the page has none
    pub title: String,

    /// Content of `<meta name="description">`, empty when absent
    #[serde(default)]
    pub meta_description: String,

    /// Visible text, one text run per line
    pub text: String,

    /// Same-host links, sorted and deduplicated
    pub internal_links: Vec<String>,

    /// Links to other hosts, sorted and deduplicated
    #[serde(default)]
    pub external_links: Vec<String>,

    /// Element inventory in document order
    #[serde(default)]
    pub elements: Vec<ElementInfo>,

    #[serde(default)]
    pub emails: Vec<String>,

    #[serde(default)]
    pub phones: Vec<String>,
}

/// One entry of a page's element inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub tag: String,

    /// Root-to-element selector path, e.g. `body > ul > li:nth-of-type(2)`
    pub path: String,

    /// Attribute values, multi-valued ones joined with single spaces
    pub attributes: BTreeMap<String, String>,

    /// First 200 characters of the element's flattened text
    pub text_preview: Option<String>,
}

/// A page that could not be fetched or extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub url: String,

    #[serde(rename = "error")]
    pub error_message: String,
}

impl ErrorRecord {
    pub fn new(url: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error_message: error_message.into(),
        }
    }
}

/// Everything a crawl produced, in the order it was produced
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub pages: Vec<PageRecord>,
    pub errors: Vec<ErrorRecord>,

    /// Every URL that was claimed for fetching, in claim order
    pub visited: Vec<String>,

    /// Set when the crawl loop was cut short by an unexpected failure
    pub aborted: Option<String>,

    /// Set when the crawl stopped because it was cancelled
    pub cancelled: bool,
}

impl CrawlOutcome {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Prints crawl statistics to stderr
    pub fn write_summary_to_stderr(&self, duration: Duration) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        let _ = self.write_summary(&mut handle, duration);
    }

    pub fn write_summary<W: Write>(&self, out: &mut W, duration: Duration) -> io::Result<()> {
        writeln!(out, "\n=== Crawl Summary ===")?;
        writeln!(out, "Pages scraped: {}", self.pages.len())?;
        writeln!(out, "Pages failed: {}", self.errors.len())?;
        writeln!(out, "URLs visited: {}", self.visited.len())?;
        writeln!(out, "Duration: {:.2}s", duration.as_secs_f64())?;
        if self.cancelled {
            writeln!(out, "Stopped early: cancelled")?;
        }
        if let Some(reason) = &self.aborted {
            writeln!(out, "Aborted: {}", reason)?;
        }
        writeln!(out, "=====================\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_serializes_error_field() {
        let record = ErrorRecord::new("http://a.test/broken", "timed out");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["url"], "http://a.test/broken");
        assert_eq!(json["error"], "timed out");
        assert!(json.get("error_message").is_none());
    }

    #[test]
    fn test_summary_mentions_counts_and_abort() {
        let outcome = CrawlOutcome {
            errors: vec![ErrorRecord::new("http://a.test/x", "boom")],
            visited: vec!["http://a.test/".to_string(), "http://a.test/x".to_string()],
            aborted: Some("renderer gone".to_string()),
            ..CrawlOutcome::default()
        };
        let mut out = Vec::new();
        outcome
            .write_summary(&mut out, Duration::from_millis(1500))
            .unwrap();
        let summary = String::from_utf8(out).unwrap();

        assert!(summary.contains("Pages scraped: 0"));
        assert!(summary.contains("Pages failed: 1"));
        assert!(summary.contains("URLs visited: 2"));
        assert!(summary.contains("Duration: 1.50s"));
        assert!(summary.contains("Aborted: renderer gone"));
    }

    #[test]
    fn test_element_info_keeps_null_preview() {
        let info = ElementInfo {
            tag: "br".to_string(),
            path: "body > br".to_string(),
            attributes: BTreeMap::new(),
            text_preview: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json["text_preview"].is_null());
    }
}
