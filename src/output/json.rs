use crate::output::SinkError;
use crate::results::{ElementInfo, ErrorRecord, PageRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One entry of the structured export
#[derive(Debug, Serialize)]
struct StructuredPage<'a> {
    url: &'a str,
    title: &'a str,
    internal_links: &'a [String],
    dom_properties: &'a [ElementInfo],
}

/// One entry of the full-record export
#[derive(Debug, Serialize)]
struct FullRecord<'a> {
    url: &'a str,
    title: &'a str,
    meta_description: &'a str,
    text: &'a str,
    internal_links: &'a [String],
    external_links: &'a [String],
    emails: &'a [String],
    phones: &'a [String],
}

impl<'a> From<&'a PageRecord> for StructuredPage<'a> {
    fn from(page: &'a PageRecord) -> Self {
        Self {
            url: &page.url,
            title: &page.title,
            internal_links: &page.internal_links,
            dom_properties: &page.elements,
        }
    }
}

impl<'a> From<&'a PageRecord> for FullRecord<'a> {
    fn from(page: &'a PageRecord) -> Self {
        Self {
            url: &page.url,
            title: &page.title,
            meta_description: &page.meta_description,
            text: &page.text,
            internal_links: &page.internal_links,
            external_links: &page.external_links,
            emails: &page.emails,
            phones: &page.phones,
        }
    }
}

/// Writes `{url, title, internal_links, dom_properties}` per page. Nothing is written for zero pages.
pub fn write_structured(pages: &[PageRecord], path: &Path) -> Result<usize, SinkError> {
    let entries: Vec<StructuredPage<'_>> = pages.iter().map(StructuredPage::from).collect();
    write_array(&entries, path)
}

/// Writes `{url, error}` per failure. Nothing is written when there were none.
pub fn write_errors(errors: &[ErrorRecord], path: &Path) -> Result<usize, SinkError> {
    write_array(errors, path)
}

/// Writes every scalar and list field of each page record
pub fn write_records(pages: &[PageRecord], path: &Path) -> Result<usize, SinkError> {
    let entries: Vec<FullRecord<'_>> = pages.iter().map(FullRecord::from).collect();
    write_array(&entries, path)
}

/// Pretty-printed JSON array; an empty slice leaves the filesystem untouched
fn write_array<T: Serialize>(items: &[T], path: &Path) -> Result<usize, SinkError> {
    if items.is_empty() {
        return Ok(0);
    }

    let file = File::create(path).map_err(|e| SinkError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, items).map_err(|source| SinkError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| SinkError::io(path, e))?;
    Ok(items.len())
}
