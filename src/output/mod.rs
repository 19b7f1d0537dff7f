pub mod json;
pub mod mirror;
pub mod xlsx;

use crate::config::ExportConfig;
use crate::results::CrawlOutcome;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A failed export. Reported by the caller, never fatal to the run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write spreadsheet {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

impl SinkError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Logs the result of one sink. Returns false if it failed.
pub fn report(sink: &str, path: &Path, result: Result<usize, SinkError>) -> bool {
    match result {
        Ok(0) => {
            ::log::info!("No {} to write, skipping {}", sink, path.display());
            true
        }
        Ok(count) => {
            ::log::info!("Saved {} {} to {}", count, sink, path.display());
            true
        }
        Err(e) => {
            ::log::error!("Error saving {}: {}", sink, e);
            false
        }
    }
}

/// Runs every configured sink over `outcome`.
///
/// A failing sink does not stop the others. Returns the number of sinks that failed.
pub fn export(outcome: &CrawlOutcome, config: &ExportConfig) -> usize {
    let mut results = vec![
        report(
            "page contents",
            &config.xlsx,
            xlsx::write_contents(&outcome.pages, &config.xlsx),
        ),
        report(
            "structured pages",
            &config.json,
            json::write_structured(&outcome.pages, &config.json),
        ),
        report(
            "error records",
            &config.errors,
            json::write_errors(&outcome.errors, &config.errors),
        ),
    ];
    if let Some(path) = &config.records {
        results.push(report(
            "page records",
            path,
            json::write_records(&outcome.pages, path),
        ));
    }

    results.into_iter().filter(|ok| !ok).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ErrorRecord, PageRecord};
    use tempfile::TempDir;

    fn page(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: "Home".to_string(),
            meta_description: String::new(),
            text: "Hello".to_string(),
            internal_links: vec![],
            external_links: vec![],
            elements: vec![],
            emails: vec![],
            phones: vec![],
        }
    }

    fn export_config(dir: &TempDir) -> ExportConfig {
        ExportConfig {
            xlsx: dir.path().join("content.xlsx"),
            json: dir.path().join("data.json"),
            errors: dir.path().join("errors.json"),
            records: Some(dir.path().join("records.json")),
            mirror: None,
        }
    }

    #[test]
    fn test_export_writes_every_sink() {
        let dir = TempDir::new().unwrap();
        let config = export_config(&dir);
        let outcome = CrawlOutcome {
            pages: vec![page("http://a.test/")],
            errors: vec![ErrorRecord::new("http://a.test/x", "timed out")],
            ..CrawlOutcome::default()
        };

        assert_eq!(export(&outcome, &config), 0);
        assert!(config.xlsx.exists());
        assert!(config.json.exists());
        assert!(config.errors.exists());
        assert!(config.records.as_ref().unwrap().exists());
    }

    #[test]
    fn test_export_with_nothing_creates_no_files() {
        let dir = TempDir::new().unwrap();
        let config = export_config(&dir);

        assert_eq!(export(&CrawlOutcome::default(), &config), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_sink_does_not_stop_the_others() {
        let dir = TempDir::new().unwrap();
        let mut config = export_config(&dir);
        config.xlsx = dir.path().join("missing").join("content.xlsx");
        let outcome = CrawlOutcome {
            pages: vec![page("http://a.test/")],
            ..CrawlOutcome::default()
        };

        assert_eq!(export(&outcome, &config), 1);
        assert!(config.json.exists());
        assert!(config.records.as_ref().unwrap().exists());
    }
}
