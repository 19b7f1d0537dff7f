pub mod contacts;
pub mod elements;
pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::results::{ElementInfo, PageRecord};
use scraper::Html;
use thiserror::Error;
use url::Url;

/// Extraction failures that make a whole page unusable
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid page URL {url}: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Everything derived from one rendered document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub text: String,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub elements: Vec<ElementInfo>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,

    /// Recoverable problems found while extracting; the page is still usable
    pub warnings: Vec<String>,
}

impl Extraction {
    /// Turns the extraction into a page record, falling back to the renderer's title
    pub fn into_record(self, url: &str, renderer_title: Option<&str>) -> PageRecord {
        let title = self
            .title
            .or_else(|| {
                renderer_title
                    .map(str::trim)
                    .filter(|title| !title.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        PageRecord {
            url: url.to_string(),
            title,
            meta_description: self.meta_description.unwrap_or_default(),
            text: self.text,
            internal_links: self.internal_links,
            external_links: self.external_links,
            elements: self.elements,
            emails: self.emails,
            phones: self.phones,
        }
    }
}

/// Turns rendered HTML into page data.
///
/// `page_url` is the document's own location, used as the base for its links.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, page_url: &str) -> Result<Extraction, ExtractError>;
}

/// The standard extractor: one full-document parse with `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct DomExtractor;

impl Extractor for DomExtractor {
    fn extract(&self, html: &str, page_url: &str) -> Result<Extraction, ExtractError> {
        extract_page(html, page_url)
    }
}

/// Parses `html` and derives title, text, links, element inventory and contacts.
///
/// `page_url` is where the document was actually loaded from, after redirects.
/// Links are resolved against it (or the document's `<base href>`) and scoped
/// by its host.
pub fn extract_page(html: &str, page_url: &str) -> Result<Extraction, ExtractError> {
    Url::parse(page_url).map_err(|source| ExtractError::InvalidPageUrl {
        url: page_url.to_string(),
        source,
    })?;

    let doc = Html::parse_document(html);

    if !doc.errors.is_empty() {
        ::log::debug!(
            "Recovered from {} HTML parse errors on {}",
            doc.errors.len(),
            page_url
        );
    }

    let base_url = html::base_url(&doc, page_url);
    let links = html::links(&doc, &base_url, page_url);
    let warnings = links
        .unresolved
        .iter()
        .map(|href| format!("could not resolve link {:?}", href))
        .collect();

    let text = html::visible_text(&doc);
    let emails = contacts::emails(&text);
    let phones = contacts::phones(&text);

    Ok(Extraction {
        title: html::title(&doc),
        meta_description: html::meta_description(&doc),
        elements: elements::inventory(&doc),
        internal_links: links.internal,
        external_links: links.external,
        text,
        emails,
        phones,
        warnings,
    })
}
