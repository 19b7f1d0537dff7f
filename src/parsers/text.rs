use scraper::ElementRef;
use scraper::node::Element;

/// Elements whose text content is never shown to a reader
const HIDDEN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Maximum number of characters kept in an element's text preview
pub const PREVIEW_LIMIT: usize = 200;

/// Returns true for elements whose content is excluded from text and inventory
pub fn is_hidden_content(element: &Element) -> bool {
    HIDDEN_CONTENT_TAGS.contains(&element.name())
}

/// Collects the trimmed, non-empty text runs below `element`, skipping script and style content
pub fn visible_strings(element: ElementRef<'_>) -> Vec<&str> {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| is_hidden_content(ancestor.value()));
            (!hidden).then_some(trimmed)
        })
        .collect()
}

/// Joins text runs one per line, the shape used for the full page text
pub fn join_lines(strings: &[&str]) -> String {
    strings.join("\n")
}

/// Builds an element's preview: text runs glued together, cut to [`PREVIEW_LIMIT`] characters
pub fn preview(strings: &[&str]) -> Option<String> {
    let flattened = strings.concat();
    if flattened.is_empty() {
        return None;
    }
    Some(truncate_chars(&flattened, PREVIEW_LIMIT))
}

/// Truncates on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Collapses runs of whitespace into single spaces
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}
