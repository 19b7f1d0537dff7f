use crate::parsers::text;
use crate::results::ElementInfo;
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;

/// Attributes that hold whitespace-separated token lists
const MULTI_VALUED_ATTRIBUTES: &[&str] = &[
    "class",
    "rel",
    "rev",
    "accept-charset",
    "headers",
    "accesskey",
    "dropzone",
];

/// Separator between path segments
pub const PATH_SEPARATOR: &str = " > ";

/// Builds the element inventory of a document, in document order.
///
/// `script` and `style` elements are left out; everything else, including the
/// synthesized `html`/`head`/`body` wrappers, gets an entry.
pub fn inventory(doc: &Html) -> Vec<ElementInfo> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| !text::is_hidden_content(element.value()))
        .map(describe)
        .collect()
}

/// Describes a single element
pub fn describe(element: ElementRef<'_>) -> ElementInfo {
    ElementInfo {
        tag: element.value().name().to_string(),
        path: structural_path(element),
        attributes: flatten_attributes(element),
        text_preview: text::preview(&text::visible_strings(element)),
    }
}

/// Root-to-element path such as `body > ul > li:nth-of-type(2)`.
///
/// The walk stops below the document's root element, so `html` never appears
/// and the root element's own path is empty. A segment carries a 1-based
/// `:nth-of-type` index only when its parent has more than one child element
/// with the same tag.
pub fn structural_path(element: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = element;

    while let Some(parent) = current.parent().and_then(ElementRef::wrap) {
        let name = current.value().name();
        let same_tag: Vec<_> = parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == name)
            .collect();

        let segment = match same_tag.iter().position(|sibling| *sibling == current) {
            Some(index) if same_tag.len() > 1 => format!("{}:nth-of-type({})", name, index + 1),
            _ => name.to_string(),
        };
        segments.push(segment);
        current = parent;
    }

    segments.reverse();
    segments.join(PATH_SEPARATOR)
}

/// Attribute map with token-list attributes collapsed to single-space-joined strings
pub fn flatten_attributes(element: ElementRef<'_>) -> BTreeMap<String, String> {
    element
        .value()
        .attrs()
        .map(|(name, value)| {
            let value = if MULTI_VALUED_ATTRIBUTES.contains(&name) {
                text::normalize_whitespace_in_segment(value)
            } else {
                value.to_string()
            };
            (name.to_string(), value)
        })
        .collect()
}
