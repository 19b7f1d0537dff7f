use crate::filter::{self, is_non_navigable};
use crate::parsers::text;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name][content]").expect("valid meta selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("valid base selector"));

/// Outbound links of a page, split by host
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Links {
    pub internal: Vec<String>,
    pub external: Vec<String>,

    /// Hrefs that could not be resolved against the page URL
    pub unresolved: Vec<String>,
}

/// Text of the first `<title>` element that has any
pub fn title(doc: &Html) -> Option<String> {
    doc.select(&TITLE_SELECTOR)
        .map(|element| text::normalize_whitespace_in_segment(&element.text().collect::<String>()))
        .find(|title| !title.is_empty())
}

/// Content of `<meta name="description">`, matched case-insensitively
pub fn meta_description(doc: &Html) -> Option<String> {
    doc.select(&META_SELECTOR)
        .filter(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

/// All visible text of the document, one text run per line
pub fn visible_text(doc: &Html) -> String {
    text::join_lines(&text::visible_strings(doc.root_element()))
}

/// Raw href values of every anchor, in document order
pub fn raw_links(doc: &Html) -> Vec<&str> {
    doc.select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .collect()
}

/// URL that relative links in the document resolve against.
///
/// That is the first `<base href>` resolved against `document_url`, or
/// `document_url` itself when there is no usable one.
pub fn base_url(doc: &Html, document_url: &str) -> String {
    doc.select(&BASE_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .next()
        .and_then(|href| Url::parse(document_url).ok()?.join(href.trim()).ok())
        .map(String::from)
        .unwrap_or_else(|| document_url.to_string())
}

/// Resolves every anchor against `base_url` and partitions the results by
/// whether they share `page_url`'s host.
///
/// `mailto:`, `tel:` and `javascript:` hrefs are dropped before resolution, as
/// are resolved links that are not `http`/`https`. Both lists come back sorted
/// and deduplicated.
pub fn links(doc: &Html, base_url: &str, page_url: &str) -> Links {
    let mut internal = BTreeSet::new();
    let mut external = BTreeSet::new();
    let mut unresolved = Vec::new();

    for href in raw_links(doc) {
        if href.is_empty() || is_non_navigable(href) {
            continue;
        }
        let Some(resolved) = filter::try_normalize(base_url, href) else {
            unresolved.push(href.to_string());
            continue;
        };
        if !is_web_url(&resolved) {
            ::log::trace!("Ignoring non-web link {}", resolved);
            continue;
        }
        if filter::is_in_scope(&resolved, page_url) {
            internal.insert(resolved);
        } else {
            external.insert(resolved);
        }
    }

    ::log::debug!(
        "HTML parser found {} internal and {} external links on {}",
        internal.len(),
        external.len(),
        page_url
    );

    Links {
        internal: internal.into_iter().collect(),
        external: external.into_iter().collect(),
        unresolved,
    }
}

fn is_web_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
